//! Page controllers: everything a screen does except drawing itself.

pub mod catalog;
mod chat_panel;
mod collection_page;
mod context;
mod error;
mod worldline_monitor;

pub use chat_panel::{ChatLine, ChatPanel, CHAT_CHANNEL, CHAT_ROUTE};
pub use collection_page::{CollectionPage, PageDefinition};
pub use context::{MountOutcome, PageContext};
pub use error::PageError;
pub use worldline_monitor::{
    MonitorSettings, ReadingSeries, WorldlineMonitor, MONITOR_CHANNEL, MONITOR_ROUTE, READINGS_PATH,
};
