//! Path classification table.
//!
//! Ordered prefix/exact patterns mapped to a route class. Public entries are
//! checked first and short-circuit everything else, so public pages stay
//! reachable even with malformed cookies. First match wins within a class
//! list; a path matching nothing falls through to `Default`.

/// Authorization class of a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Always reachable, regardless of auth state.
    Public,
    /// Login/register style pages; authenticated users are bounced home.
    AuthRedirect,
    /// Requires an access token with an `ADMIN` role claim.
    Admin,
    /// Requires some session evidence; anonymous users go to login.
    AccountProtected,
    /// No special handling.
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Pattern {
    Exact(&'static str),
    Prefix(&'static str),
}

impl Pattern {
    fn matches(&self, path: &str) -> bool {
        match self {
            Self::Exact(pattern) => path == *pattern,
            Self::Prefix(pattern) => path.starts_with(pattern),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RouteTable {
    public: Vec<Pattern>,
    auth_redirect: Vec<Pattern>,
    admin: Vec<Pattern>,
    account_protected: Vec<Pattern>,
}

impl Default for RouteTable {
    /// Route map of the finance app this gateway fronts.
    fn default() -> Self {
        Self {
            public: vec![
                Pattern::Exact("/"),
                Pattern::Prefix("/about"),
                Pattern::Prefix("/health"),
                Pattern::Prefix("/assets/"),
            ],
            auth_redirect: vec![
                Pattern::Prefix("/login"),
                Pattern::Prefix("/register"),
                Pattern::Prefix("/forgot-password"),
            ],
            admin: vec![Pattern::Prefix("/admin")],
            account_protected: vec![Pattern::Prefix("/account/")],
        }
    }
}

impl RouteTable {
    #[must_use]
    pub fn classify(&self, path: &str) -> RouteClass {
        // Public short-circuits every other class.
        if self.public.iter().any(|p| p.matches(path)) {
            return RouteClass::Public;
        }
        if self.auth_redirect.iter().any(|p| p.matches(path)) {
            return RouteClass::AuthRedirect;
        }
        if self.admin.iter().any(|p| p.matches(path)) {
            return RouteClass::Admin;
        }
        if self.account_protected.iter().any(|p| p.matches(path)) {
            return RouteClass::AccountProtected;
        }
        RouteClass::Default
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn home_is_public_but_not_as_prefix() {
        let table = RouteTable::default();
        assert_eq!(table.classify("/"), RouteClass::Public);
        // "/" is exact; it must not swallow every path.
        assert_eq!(table.classify("/admin"), RouteClass::Admin);
        assert_eq!(table.classify("/anything-else"), RouteClass::Default);
    }

    #[test]
    fn classifies_each_route_family() {
        let table = RouteTable::default();
        assert_eq!(table.classify("/about"), RouteClass::Public);
        assert_eq!(table.classify("/assets/app.css"), RouteClass::Public);
        assert_eq!(table.classify("/login"), RouteClass::AuthRedirect);
        assert_eq!(table.classify("/register"), RouteClass::AuthRedirect);
        assert_eq!(table.classify("/admin/asset-classes"), RouteClass::Admin);
        assert_eq!(
            table.classify("/account/net-worth"),
            RouteClass::AccountProtected
        );
        assert_eq!(table.classify("/api/quotes"), RouteClass::Default);
    }

    #[test]
    fn prefix_matching_covers_nested_paths() {
        let table = RouteTable::default();
        assert_eq!(
            table.classify("/admin/risk-profiles/3/edit"),
            RouteClass::Admin
        );
        assert_eq!(
            table.classify("/account/debts/12"),
            RouteClass::AccountProtected
        );
    }
}
