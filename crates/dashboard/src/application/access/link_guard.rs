//! Fragment-level guard for links and other optional UI.

use worldline_domain::{decide, AccessReason, Identity};

/// Yield `content` when the identity satisfies `required_roles`.
///
/// With no identity at all, `show_when_unauthenticated` lets public links
/// (home, sign-in) stay visible. A signed-in identity missing a role never
/// sees the fragment.
pub fn link_guard<R, T>(
    identity: Option<&Identity>,
    required_roles: &[R],
    show_when_unauthenticated: bool,
    content: impl FnOnce() -> T,
) -> Option<T>
where
    R: AsRef<str>,
{
    let decision = decide(identity, required_roles);
    let visible = decision.allowed
        || (show_when_unauthenticated && decision.reason == AccessReason::NoIdentity);
    visible.then(content)
}
