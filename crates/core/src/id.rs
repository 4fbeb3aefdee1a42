//! Record identifiers
//!
//! A `RecordId` is the owning record's primary key, treated as opaque
//! by the index subsystem. It only needs to be comparable and hashable
//! so it can serve as graph vertex identity and as a storage key suffix.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque primary key of an indexed record
///
/// Ordering is lexicographic over the underlying string. The index
/// relies on this ordering only for deterministic tie-breaking, never
/// for semantics.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(String);

impl RecordId {
    /// Create a RecordId from any string-like key
    pub fn new(id: impl Into<String>) -> Self {
        RecordId(id.into())
    }

    /// View the underlying key
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Byte representation used for storage key construction
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        RecordId(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_id_ordering() {
        let a = RecordId::new("a");
        let b = RecordId::new("b");
        assert!(a < b);
        assert_eq!(RecordId::new("x"), RecordId::new("x"));
    }

    #[test]
    fn test_record_id_display() {
        assert_eq!(format!("{}", RecordId::new("rec-42")), "rec-42");
    }

    #[test]
    fn test_record_id_hash() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(RecordId::new("a"));
        set.insert(RecordId::new("a"));
        set.insert(RecordId::new("b"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_record_id_serde_roundtrip() {
        let id = RecordId::new("rec-7");
        let bytes = bincode::serialize(&id).unwrap();
        let restored: RecordId = bincode::deserialize(&bytes).unwrap();
        assert_eq!(id, restored);
    }
}
