//! The catalog — the closed, ordered set of message types both peers know.

use std::collections::HashMap;

use crate::descriptor::Descriptor;
use crate::tag::{tag_key, TAG_LEN_MAX, TAG_LEN_MIN};

/// Immutable, ordered collection of descriptors with name lookup.
///
/// Names are validated unique at construction. The truncated-tag index is a
/// per-session artifact: it can only be built once the tag length has been
/// negotiated, so it lives with the session, not here.
#[derive(Debug)]
pub struct Catalog {
    descriptors: Vec<Descriptor>,
    by_name: HashMap<String, usize>,
}

impl Catalog {
    pub fn new(descriptors: Vec<Descriptor>) -> Result<Self, CatalogError> {
        if descriptors.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut by_name = HashMap::with_capacity(descriptors.len());
        for (index, descriptor) in descriptors.iter().enumerate() {
            if by_name.insert(descriptor.name.clone(), index).is_some() {
                return Err(CatalogError::NameCollision(descriptor.name.clone()));
            }
        }

        Ok(Self {
            descriptors,
            by_name,
        })
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Descriptor at a catalog index. Indices come from this catalog's own
    /// lookups, so out-of-range is a bug, not an error.
    pub fn get(&self, index: usize) -> &Descriptor {
        &self.descriptors[index]
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    /// Largest body any descriptor admits.
    pub fn max_payload(&self) -> u32 {
        self.descriptors
            .iter()
            .map(|d| d.size.max_payload())
            .max()
            .unwrap_or(0)
    }

    /// Build the truncated-tag index for a negotiated tag length.
    ///
    /// Two hashes agreeing on their first `tag_len` bytes would alias on the
    /// wire; that is refused here rather than silently overwritten.
    pub fn tag_index(&self, tag_len: usize) -> Result<HashMap<u32, usize>, TagCollision> {
        debug_assert!((TAG_LEN_MIN..=TAG_LEN_MAX).contains(&tag_len));

        let mut by_tag = HashMap::with_capacity(self.descriptors.len());
        for (index, descriptor) in self.descriptors.iter().enumerate() {
            let key = tag_key(&descriptor.hash[..tag_len]);
            if let Some(prev) = by_tag.insert(key, index) {
                return Err(TagCollision {
                    first: self.descriptors[prev].name.clone(),
                    second: descriptor.name.clone(),
                    tag_len,
                });
            }
        }
        Ok(by_tag)
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog holds no descriptors")]
    Empty,
    #[error("duplicate descriptor name: {0:?}")]
    NameCollision(String),
}

/// Two descriptors that would share one on-wire tag at the negotiated length.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("descriptors {first:?} and {second:?} share a {tag_len}-byte tag")]
pub struct TagCollision {
    pub first: String,
    pub second: String,
    pub tag_len: usize,
}
