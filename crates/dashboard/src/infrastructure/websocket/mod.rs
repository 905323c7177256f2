//! WebSocket transport adapter.

mod connector;
#[cfg(test)]
mod loopback_tests;

pub use connector::WsConnector;
