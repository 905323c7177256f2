//! The dashboard's entity pages.

use worldline_domain::{Customer, DMail, Experiment};

use super::collection_page::{CollectionPage, PageDefinition};
use super::context::PageContext;
use crate::application::access::roles;

pub const CUSTOMERS: PageDefinition = PageDefinition {
    route: "/customers",
    api_path: "/customers",
    channel: "customers",
    required_roles: &[],
};

pub const EXPERIMENTS: PageDefinition = PageDefinition {
    route: "/experiments",
    api_path: "/experiments",
    channel: "experiments",
    required_roles: &[roles::RESEARCHER],
};

pub const DMAILS: PageDefinition = PageDefinition {
    route: "/dmails",
    api_path: "/dmails",
    channel: "dmail",
    required_roles: &[roles::ADMIN, roles::RESEARCHER],
};

pub fn customers_page(ctx: &PageContext) -> CollectionPage<Customer> {
    CollectionPage::new(CUSTOMERS, ctx)
}

pub fn experiments_page(ctx: &PageContext) -> CollectionPage<Experiment> {
    CollectionPage::new(EXPERIMENTS, ctx)
}

pub fn dmails_page(ctx: &PageContext) -> CollectionPage<DMail> {
    CollectionPage::new(DMAILS, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::access::MENU;

    #[test]
    fn test_pages_match_menu_requirements() {
        for page in [CUSTOMERS, EXPERIMENTS, DMAILS] {
            let link = MENU
                .iter()
                .find(|link| link.route == page.route)
                .unwrap();
            assert_eq!(link.required_roles, page.required_roles, "{}", page.route);
        }
    }
}
