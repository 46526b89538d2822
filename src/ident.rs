//! Identifier generation for lifted nodes.

use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};

use crate::node::NodeId;

/// URI-like identifier of a lifted node: `<namespace>:<name>` or
/// `<namespace>:hash-<hex>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(String);

impl Identifier {
    /// Identifier derived from a logical name.
    pub fn named(namespace: &str, name: &str) -> Self {
        Identifier(format!("{}:{}", namespace, name))
    }

    /// Identifier derived from canonical content.
    pub fn from_content(namespace: &str, canonical: &str) -> Self {
        Identifier(format!("{}:hash-{:x}", namespace, content_hash(canonical)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 32-bit rolling hash (`h = h * 31 + unit`, seed 0) over UTF-16 code
/// units, returned as its absolute value.
pub fn content_hash(canonical: &str) -> u32 {
    let hash = canonical
        .encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)));
    hash.unsigned_abs()
}

/// Identifier cache keyed by node identity, namespace and logical name.
///
/// The name is part of the key, so a node lifted under its content hash in
/// one call and under a caller-supplied name in another keeps both entries.
/// Entries are only ever inserted, and a racing insert for the same key
/// always carries an equal value, so concurrent resolutions may share it.
#[derive(Debug, Default)]
pub struct IdentifierCache {
    entries: RwLock<HashMap<CacheKey, Identifier>>,
}

type CacheKey = (NodeId, String, Option<String>);

fn cache_key(node: NodeId, namespace: &str, name: Option<&str>) -> CacheKey {
    (node, namespace.to_string(), name.map(String::from))
}

impl IdentifierCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, node: NodeId, namespace: &str, name: Option<&str>) -> Option<Identifier> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(&cache_key(node, namespace, name)).cloned()
    }

    /// Return the cached identifier for `node`, or derive one from `name`
    /// (when given) or from `canonical` content and cache it.
    pub fn identify(
        &self,
        node: NodeId,
        namespace: &str,
        name: Option<&str>,
        canonical: &str,
    ) -> Identifier {
        if let Some(existing) = self.get(node, namespace, name) {
            return existing;
        }

        let identifier = match name {
            Some(name) => Identifier::named(namespace, name),
            None => Identifier::from_content(namespace, canonical),
        };

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries
            .entry(cache_key(node, namespace, name))
            .or_insert(identifier)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
