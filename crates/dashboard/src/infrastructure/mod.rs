//! Infrastructure adapters for the outbound ports.

pub mod auth;
pub mod http_client;
pub mod navigation;
pub mod telemetry;
pub mod websocket;

pub use auth::{from_id_token, SessionTokenSource, StaticTokenSource};
pub use http_client::HttpGateway;
pub use navigation::{LoggingNavigator, MemoryRedirectStore};
pub use telemetry::{LogNotifier, TracingTelemetry};
pub use websocket::WsConnector;
