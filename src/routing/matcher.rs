//! Route matching logic.
//!
//! # Responsibilities
//! - Match path prefix on segment boundaries (case-sensitive)
//! - Report the unmatched remainder of the path
//!
//! # Design Decisions
//! - `/user` matches `/user` and `/user/...`, never `/users`
//! - `/` is a catch-all that matches every absolute path
//! - No regex to guarantee O(n) matching

/// Matches the request path against a segment-aligned prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Number of bytes matched; used for longest-prefix ordering.
    pub fn specificity(&self) -> usize {
        if self.is_catch_all() {
            0
        } else {
            self.prefix.len()
        }
    }

    pub fn is_catch_all(&self) -> bool {
        self.prefix == "/"
    }

    /// Returns true if the path falls under this prefix.
    pub fn matches(&self, path: &str) -> bool {
        self.remainder(path).is_some()
    }

    /// The part of `path` after the prefix, or `None` when it does not match.
    ///
    /// The remainder is empty or starts with `/`. For the catch-all prefix
    /// the whole path is returned.
    pub fn remainder<'a>(&self, path: &'a str) -> Option<&'a str> {
        if self.is_catch_all() {
            return path.starts_with('/').then_some(path);
        }
        let rest = path.strip_prefix(self.prefix.as_str())?;
        (rest.is_empty() || rest.starts_with('/')).then_some(rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_aligned_match() {
        let matcher = PathPrefixMatcher::new("/user");

        assert!(matcher.matches("/user"));
        assert!(matcher.matches("/user/"));
        assert!(matcher.matches("/user/horse"));
        assert!(matcher.matches("/user/horse/saddle"));

        assert!(!matcher.matches("/users"));
        assert!(!matcher.matches("/use"));
        assert!(!matcher.matches("/admin/user"));
        assert!(!matcher.matches("/User"));
    }

    #[test]
    fn test_remainder() {
        let matcher = PathPrefixMatcher::new("/user");

        assert_eq!(matcher.remainder("/user"), Some(""));
        assert_eq!(matcher.remainder("/user/"), Some("/"));
        assert_eq!(matcher.remainder("/user/horse"), Some("/horse"));
        assert_eq!(matcher.remainder("/users"), None);
    }

    #[test]
    fn test_multi_segment_prefix() {
        let matcher = PathPrefixMatcher::new("/api/v1");

        assert_eq!(matcher.remainder("/api/v1/items"), Some("/items"));
        assert_eq!(matcher.remainder("/api/v10"), None);
        assert_eq!(matcher.remainder("/api"), None);
        assert_eq!(matcher.specificity(), 7);
    }

    #[test]
    fn test_catch_all() {
        let matcher = PathPrefixMatcher::new("/");

        assert_eq!(matcher.remainder("/"), Some("/"));
        assert_eq!(matcher.remainder("/anything/else"), Some("/anything/else"));
        assert_eq!(matcher.specificity(), 0);
    }
}
