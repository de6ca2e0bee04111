//! Input-injection seam.
//!
//! The executor never touches the OS itself; every side effect goes
//! through exactly one `InputDriver` call per step. Production drivers
//! wrap the external injection tool; tests use [`NullDriver`].

use async_trait::async_trait;
use stagehand_core::{ClickMode, MouseButton};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("injection failed: {0}")]
    Injection(String),
}

/// One method per injection primitive. All calls are fire-and-forget:
/// pass/fail status, no payload.
#[async_trait]
pub trait InputDriver: Send + Sync {
    async fn move_pointer(&self, x: i32, y: i32) -> Result<(), DriverError>;

    async fn click(
        &self,
        button: MouseButton,
        mode: ClickMode,
        location: Option<[i32; 2]>,
    ) -> Result<(), DriverError>;

    async fn type_text(&self, text: &str) -> Result<(), DriverError>;

    async fn press_key(&self, key: &str) -> Result<(), DriverError>;

    async fn key_combo(&self, combo: &str) -> Result<(), DriverError>;

    async fn drag(
        &self,
        start: [i32; 2],
        end: [i32; 2],
        duration: f64,
    ) -> Result<(), DriverError>;

    async fn scroll(&self, x: i32, y: i32, amount: i32) -> Result<(), DriverError>;

    async fn swipe(
        &self,
        start: [i32; 2],
        end: [i32; 2],
        duration: f64,
    ) -> Result<(), DriverError>;

    async fn multi_click(
        &self,
        x: i32,
        y: i32,
        count: u32,
        delay: f64,
    ) -> Result<(), DriverError>;

    async fn wait_for_window(&self, window: &str, timeout_secs: u64) -> Result<(), DriverError>;

    async fn screenshot(&self, filename: &str) -> Result<(), DriverError>;
}

/// Driver that records what it was asked to do and injects nothing.
#[derive(Default)]
pub struct NullDriver {
    invocations: parking_lot::Mutex<Vec<String>>,
}

impl NullDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invocations(&self) -> Vec<String> {
        self.invocations.lock().clone()
    }

    fn record(&self, call: String) -> Result<(), DriverError> {
        self.invocations.lock().push(call);
        Ok(())
    }
}

#[async_trait]
impl InputDriver for NullDriver {
    async fn move_pointer(&self, x: i32, y: i32) -> Result<(), DriverError> {
        self.record(format!("move_pointer {} {}", x, y))
    }

    async fn click(
        &self,
        button: MouseButton,
        mode: ClickMode,
        location: Option<[i32; 2]>,
    ) -> Result<(), DriverError> {
        self.record(format!("click {:?} {:?} {:?}", button, mode, location))
    }

    async fn type_text(&self, text: &str) -> Result<(), DriverError> {
        self.record(format!("type_text {}", text))
    }

    async fn press_key(&self, key: &str) -> Result<(), DriverError> {
        self.record(format!("press_key {}", key))
    }

    async fn key_combo(&self, combo: &str) -> Result<(), DriverError> {
        self.record(format!("key_combo {}", combo))
    }

    async fn drag(&self, start: [i32; 2], end: [i32; 2], duration: f64) -> Result<(), DriverError> {
        self.record(format!("drag {:?} {:?} {}", start, end, duration))
    }

    async fn scroll(&self, x: i32, y: i32, amount: i32) -> Result<(), DriverError> {
        self.record(format!("scroll {} {} {}", x, y, amount))
    }

    async fn swipe(&self, start: [i32; 2], end: [i32; 2], duration: f64) -> Result<(), DriverError> {
        self.record(format!("swipe {:?} {:?} {}", start, end, duration))
    }

    async fn multi_click(&self, x: i32, y: i32, count: u32, delay: f64) -> Result<(), DriverError> {
        self.record(format!("multi_click {} {} {} {}", x, y, count, delay))
    }

    async fn wait_for_window(&self, window: &str, timeout_secs: u64) -> Result<(), DriverError> {
        self.record(format!("wait_for_window {} {}", window, timeout_secs))
    }

    async fn screenshot(&self, filename: &str) -> Result<(), DriverError> {
        self.record(format!("screenshot {}", filename))
    }
}
