//! Trace id generation.

use uuid::Uuid;

/// An opaque correlation token attached to all work done on behalf of one
/// external request.
///
/// Generated ids are 128-bit random values rendered as 32 lowercase hex
/// characters with no separators. Ids received from the wire are carried
/// verbatim; no internal structure is ever interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TraceId(String);

impl TraceId {
    /// Mint a new globally-unique trace id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// View the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the id, returning the underlying string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TraceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for TraceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for TraceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_format() {
        let id = TraceId::generate();
        assert_eq!(id.as_str().len(), 32);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert!(!id.as_str().contains('-'));
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let ids: HashSet<String> = (0..10_000)
            .map(|_| TraceId::generate().into_string())
            .collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn test_wire_ids_are_carried_verbatim() {
        let id = TraceId::from("not-a-uuid-at-all");
        assert_eq!(id.as_str(), "not-a-uuid-at-all");
    }
}
