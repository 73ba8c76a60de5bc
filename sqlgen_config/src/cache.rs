//! Per-resolution memoization of parsed resources.

use crate::document::Document;
use crate::error::Result;
use std::collections::HashMap;
use std::sync::Arc;

/// Identifies one parse: which formatter read which resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentsCacheKey {
    /// Position of the formatter in the finder's formatter list.
    pub formatter: usize,
    /// Canonical identity of the resource.
    pub resource: String,
}

impl DocumentsCacheKey {
    pub fn new(formatter: usize, resource: impl Into<String>) -> Self {
        Self {
            formatter,
            resource: resource.into(),
        }
    }
}

/// Parsed documents keyed by formatter and resource.
#[derive(Debug, Default)]
pub struct DocumentsCache {
    entries: HashMap<DocumentsCacheKey, Arc<[Document]>>,
}

impl DocumentsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached documents for `key`, running `load` on a miss.
    ///
    /// A failed load is not cached.
    pub fn get_or_load<F>(&mut self, key: DocumentsCacheKey, load: F) -> Result<Arc<[Document]>>
    where
        F: FnOnce() -> Result<Vec<Document>>,
    {
        if let Some(documents) = self.entries.get(&key) {
            tracing::trace!(resource = %key.resource, "Documents cache hit");
            return Ok(Arc::clone(documents));
        }
        let documents: Arc<[Document]> = load()?.into();
        self.entries.insert(key, Arc::clone(&documents));
        Ok(documents)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convention::Convention;
    use crate::error::Error;
    use crate::source::PropertySource;
    use std::cell::Cell;

    fn documents() -> Vec<Document> {
        vec![Document::new(
            PropertySource::from_pairs("a", [("k", "v")]),
            &Convention::db(),
        )]
    }

    #[test]
    fn test_loads_once_per_key() {
        let mut cache = DocumentsCache::new();
        let calls = Cell::new(0);
        for _ in 0..3 {
            let loaded = cache
                .get_or_load(DocumentsCacheKey::new(0, "/tmp/db.properties"), || {
                    calls.set(calls.get() + 1);
                    Ok(documents())
                })
                .unwrap();
            assert_eq!(loaded.len(), 1);
        }
        assert_eq!(calls.get(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_key_is_structural() {
        let mut cache = DocumentsCache::new();
        cache
            .get_or_load(DocumentsCacheKey::new(0, "r"), || Ok(documents()))
            .unwrap();
        cache
            .get_or_load(DocumentsCacheKey::new(1, "r"), || Ok(Vec::new()))
            .unwrap();
        let again = cache
            .get_or_load(DocumentsCacheKey::new(0, String::from("r")), || Ok(Vec::new()))
            .unwrap();
        assert_eq!(again.len(), 1);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_errors_not_cached() {
        let mut cache = DocumentsCache::new();
        let key = DocumentsCacheKey::new(0, "bad");
        let result = cache.get_or_load(key.clone(), || {
            Err(Error::InvalidConfigName("x".into()))
        });
        assert!(result.is_err());
        assert!(cache.is_empty());
        assert!(cache.get_or_load(key, || Ok(documents())).is_ok());
    }
}
