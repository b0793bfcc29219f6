//! Content store for file blobs.
//!
//! Every distinct file content is stored exactly once. Interning the same
//! text twice hands back the same shared [`BlobRef`], which is what lets the
//! merge engine compare file versions by identity instead of by value.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// an immutable file payload
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct Blob {
    content: String,
}

impl Blob {
    /// get the content
    pub fn as_str(&self) -> &str {
        &self.content
    }

    /// size of the content in bytes
    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

impl fmt::Display for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.content)
    }
}

/// Shared, read-only handle to a blob.
///
/// A blob lives as long as its longest holder: the store, a commit or the
/// staging area.
pub type BlobRef = Arc<Blob>;

/// check whether two handles point at the same stored blob
pub fn same_blob(a: &BlobRef, b: &BlobRef) -> bool {
    Arc::ptr_eq(a, b)
}

/// identity comparison for possibly-absent file versions
///
/// two absent versions are equal; an absent version never equals a present one
pub fn same_version(a: Option<&BlobRef>, b: Option<&BlobRef>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => same_blob(a, b),
        (None, None) => true,
        _ => false,
    }
}

/// Deduplicating blob store.
///
/// Grows monotonically; there is no removal.
#[derive(Debug, Default)]
pub struct ContentStore {
    blobs: HashMap<String, BlobRef>,
}

impl ContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// return the stored blob for `content`, creating it on first sight
    pub fn intern(&mut self, content: &str) -> BlobRef {
        if let Some(existing) = self.blobs.get(content) {
            return Arc::clone(existing);
        }

        let blob = Arc::new(Blob {
            content: content.to_string(),
        });
        self.blobs.insert(content.to_string(), Arc::clone(&blob));
        blob
    }

    /// check if the content has been interned
    pub fn contains(&self, content: &str) -> bool {
        self.blobs.contains_key(content)
    }

    /// number of distinct blobs
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_intern_deduplicates() {
        let mut store = ContentStore::new();
        let a = store.intern("hello");
        let b = store.intern("hello");

        assert!(same_blob(&a, &b));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_distinct_content_distinct_blobs() {
        let mut store = ContentStore::new();
        let a = store.intern("v1");
        let b = store.intern("v2");

        assert!(!same_blob(&a, &b));
        assert_eq!(a.as_str(), "v1");
        assert_eq!(b.as_str(), "v2");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_empty_content_is_a_blob() {
        let mut store = ContentStore::new();
        let blob = store.intern("");
        assert!(blob.is_empty());
        assert!(store.contains(""));
    }

    #[test]
    fn test_blob_outlives_handles() {
        let mut store = ContentStore::new();
        let first = store.intern("kept");
        drop(first);

        // the store still holds it, so a later intern finds the same blob
        let again = store.intern("kept");
        let third = store.intern("kept");
        assert!(same_blob(&again, &third));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_same_version() {
        let mut store = ContentStore::new();
        let a = store.intern("a");
        let a2 = store.intern("a");
        let b = store.intern("b");

        assert!(same_version(None, None));
        assert!(same_version(Some(&a), Some(&a2)));
        assert!(!same_version(Some(&a), Some(&b)));
        assert!(!same_version(Some(&a), None));
        assert!(!same_version(None, Some(&b)));
    }

    proptest! {
        #[test]
        fn prop_intern_is_idempotent(content in ".*") {
            let mut store = ContentStore::new();
            let first = store.intern(&content);
            let second = store.intern(&content);
            prop_assert!(same_blob(&first, &second));
            prop_assert_eq!(first.as_str(), content.as_str());
            prop_assert_eq!(store.len(), 1);
        }
    }
}
