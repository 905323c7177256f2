//! Worldline Dashboard live client core.
//!
//! Keeps dashboard views in sync with the backend: one streaming client per
//! channel, collection sync that folds create/update/delete frames into local
//! lists, and access gating for routes and links. Rendering is left to the
//! embedding UI; `pages` exposes the controllers it drives.

pub mod application;
pub mod config;
pub mod infrastructure;
pub mod pages;
pub mod ports;

pub use application::access::{link_guard, IdentityTracker, RouteGuard};
pub use application::streaming::{
    ConnectionStatus, LiveBinding, StatusBadge, StreamingClient, StreamingSettings, Subscription,
};
pub use application::sync::{CollectionSync, EditBuffer, SyncChange, TrackedCollection};
pub use config::{ConfigError, DashboardConfig};
pub use pages::{ChatPanel, CollectionPage, MountOutcome, PageContext, WorldlineMonitor};
