//! Key layout: `{namespace}:recommendations:user:{id}`

use wtd_core::UserId;

/// Namespaced key builder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKeys {
    namespace: String,
}

impl CacheKeys {
    #[inline]
    #[must_use]
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    #[inline]
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Key of one user's recommendation set
    #[must_use]
    pub fn user(&self, user: UserId) -> String {
        format!("{}{}", self.recommendations_prefix(), user)
    }

    /// Prefix shared by every recommendation set
    #[must_use]
    pub fn recommendations_prefix(&self) -> String {
        format!("{}:recommendations:user:", self.namespace)
    }

    /// Parse the user back out of a recommendation key
    #[must_use]
    pub fn user_of(&self, key: &str) -> Option<UserId> {
        key.strip_prefix(&self.recommendations_prefix())?.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout() {
        let keys = CacheKeys::new("what_to_do");
        assert_eq!(keys.user(UserId(51)), "what_to_do:recommendations:user:51");
        assert_eq!(keys.user_of("what_to_do:recommendations:user:51"), Some(UserId(51)));
        assert_eq!(keys.user_of("other:recommendations:user:51"), None);
    }
}
