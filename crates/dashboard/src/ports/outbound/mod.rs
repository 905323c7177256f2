//! Outbound ports - Interfaces for external services
//!
//! These ports define the contracts that infrastructure adapters must implement,
//! allowing the streaming client, collection sync and page controllers to
//! interact with external systems without depending on concrete implementations.

pub mod navigation_port;
pub mod notifier;
pub mod request_gateway;
pub mod telemetry;
pub mod testing;
pub mod token_source;
pub mod transport;

pub use navigation_port::{NavigationState, Navigator, RedirectStore};
pub use notifier::{Notification, NotificationLevel, Notifier};
pub use request_gateway::{GatewayError, HttpMethod, RequestGateway};
pub use telemetry::{Properties, Telemetry};
pub use token_source::{TokenError, TokenSource};
pub use transport::{
    TransportChannel, TransportConnector, TransportError, TransportEvent, TransportSink,
};
