pub mod driver;
pub mod executor;

pub use driver::{DriverError, InputDriver, NullDriver};
pub use executor::{ExecutionReport, Executor};
