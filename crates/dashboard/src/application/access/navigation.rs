//! Application menu and its role requirements.

use worldline_domain::Identity;

use super::link_guard::link_guard;

pub mod roles {
    pub const ADMIN: &str = "Admin";
    pub const RESEARCHER: &str = "Researcher";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavLink {
    pub label: &'static str,
    pub route: &'static str,
    pub required_roles: &'static [&'static str],
    pub show_when_unauthenticated: bool,
}

pub const MENU: &[NavLink] = &[
    NavLink {
        label: "Home",
        route: "/",
        required_roles: &[],
        show_when_unauthenticated: true,
    },
    NavLink {
        label: "Customers",
        route: "/customers",
        required_roles: &[],
        show_when_unauthenticated: false,
    },
    NavLink {
        label: "Experiments",
        route: "/experiments",
        required_roles: &[roles::RESEARCHER],
        show_when_unauthenticated: false,
    },
    NavLink {
        label: "D-Mail",
        route: "/dmails",
        required_roles: &[roles::ADMIN, roles::RESEARCHER],
        show_when_unauthenticated: false,
    },
    NavLink {
        label: "Chat",
        route: "/chat",
        required_roles: &[],
        show_when_unauthenticated: false,
    },
    NavLink {
        label: "Worldline Monitor",
        route: "/monitor",
        required_roles: &[],
        show_when_unauthenticated: false,
    },
];

/// Menu entries the link guard lets through for `identity`.
pub fn visible_links(identity: Option<&Identity>) -> Vec<&'static NavLink> {
    MENU.iter()
        .filter_map(|link| {
            link_guard(
                identity,
                link.required_roles,
                link.show_when_unauthenticated,
                || link,
            )
        })
        .collect()
}
