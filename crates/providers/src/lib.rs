pub mod gateway;
pub mod transport;

pub use gateway::{
    Attempt, ChatReply, FailureKind, GatewayConfig, GatewayError, GatewayStatus, InferenceGateway,
    ProviderConfig, ProviderStatus,
};
pub use transport::{ChatRequest, ChatTransport, ReqwestTransport, TransportResult};
