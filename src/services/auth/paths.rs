use std::collections::HashSet;

/// Which request paths need authentication and/or licence authorization.
///
/// Exact string membership only: no prefixes, no wildcards.
#[derive(Debug, Clone, Default)]
pub struct PathPolicy {
    unprotected: HashSet<String>,
    unlicensed: HashSet<String>,
}

impl PathPolicy {
    pub fn new<U, L>(unprotected: U, unlicensed: L) -> Self
    where
        U: IntoIterator,
        U::Item: Into<String>,
        L: IntoIterator,
        L::Item: Into<String>,
    {
        Self {
            unprotected: unprotected.into_iter().map(Into::into).collect(),
            unlicensed: unlicensed.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_protected(&self, path: &str) -> bool {
        !self.unprotected.contains(path)
    }

    /// Only meaningful for protected paths.
    pub fn is_licensed(&self, path: &str) -> bool {
        !self.unlicensed.contains(path)
    }

    pub fn requires_licence(&self, path: &str) -> bool {
        self.is_protected(path) && self.is_licensed(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> PathPolicy {
        PathPolicy::new(
            ["/favicon.ico", "/docs", "/credential/openapi.json"],
            ["/credential/v1/whoami"],
        )
    }

    #[test]
    fn unprotected_paths_skip_everything() {
        let p = policy();
        assert!(!p.is_protected("/docs"));
        assert!(!p.requires_licence("/docs"));
    }

    #[test]
    fn unlicensed_paths_still_need_a_token() {
        let p = policy();
        assert!(p.is_protected("/credential/v1/whoami"));
        assert!(!p.is_licensed("/credential/v1/whoami"));
        assert!(!p.requires_licence("/credential/v1/whoami"));
    }

    #[test]
    fn everything_else_is_protected_and_licensed() {
        let p = policy();
        assert!(p.is_protected("/some-random-path"));
        assert!(p.requires_licence("/credential/v1/db"));
    }

    #[test]
    fn matching_is_exact() {
        let p = policy();
        assert!(p.is_protected("/docs/"));
        assert!(p.is_protected("/docs/index.html"));
        assert!(p.is_protected("/DOCS"));
    }
}
