//! Detects identity switches that invalidate gated views.

use worldline_domain::{Identity, IdentityFingerprint};

/// Remembers the last observed identity fingerprint.
#[derive(Debug, Clone, Default)]
pub struct IdentityTracker {
    last: Option<IdentityFingerprint>,
}

impl IdentityTracker {
    pub fn new(identity: Option<&Identity>) -> Self {
        Self {
            last: identity.map(Identity::fingerprint),
        }
    }

    /// Record `identity`; returns `true` when its id or role set differs
    /// from the previous observation (including sign-in and sign-out).
    pub fn observe(&mut self, identity: Option<&Identity>) -> bool {
        let next = identity.map(Identity::fingerprint);
        if next == self.last {
            return false;
        }
        self.last = next;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_change_is_detected_but_name_change_is_not() {
        let okabe = Identity::new("u-1", "Okabe").with_roles(["Admin"]);
        let mut tracker = IdentityTracker::new(Some(&okabe));

        let renamed = Identity::new("u-1", "Hououin Kyouma").with_roles(["admin"]);
        assert!(!tracker.observe(Some(&renamed)));

        let promoted = okabe.clone().with_roles(["Researcher"]);
        assert!(tracker.observe(Some(&promoted)));
        assert!(!tracker.observe(Some(&promoted)));
    }

    #[test]
    fn test_sign_out_and_account_switch_are_detected() {
        let mut tracker = IdentityTracker::default();
        let okabe = Identity::new("u-1", "Okabe");
        let kurisu = Identity::new("u-2", "Kurisu");

        assert!(tracker.observe(Some(&okabe)));
        assert!(tracker.observe(Some(&kurisu)));
        assert!(tracker.observe(None));
        assert!(!tracker.observe(None));
    }
}
