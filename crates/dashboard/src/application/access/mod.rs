//! Access gating for routes, links and identity changes.

mod identity_tracker;
mod link_guard;
pub mod navigation;
mod route_guard;

pub use identity_tracker::IdentityTracker;
pub use link_guard::link_guard;
pub use navigation::{roles, visible_links, NavLink, MENU};
pub use route_guard::{RouteGuard, ACCESS_DENIED_EVENT, UNAUTHORIZED_ROUTE};
