//! Message descriptors — the wire-stable identity of every message type.
//!
//! A descriptor's hash IS part of the protocol: its leading bytes travel on
//! the wire as the type tag. Renaming a type or changing its size policy is
//! harmless; changing its hash after peers have shipped is a breaking change.

/// Length of a full descriptor hash in bytes. Only the negotiated prefix is
/// ever transmitted.
pub const HASH_LEN: usize = 20;

/// Size policy of a message type.
///
/// Fixed messages carry no length field on the wire; variable messages are
/// preceded by a 4-byte little-endian length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizePolicy {
    /// Every message of this type is exactly `total` bytes.
    Fixed { total: u32 },
    /// Messages carry up to `max` bytes; the actual length travels on the wire.
    Variable { max: u32 },
}

impl SizePolicy {
    /// Largest body this policy admits.
    pub fn max_payload(&self) -> u32 {
        match *self {
            SizePolicy::Fixed { total } => total,
            SizePolicy::Variable { max } => max,
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, SizePolicy::Variable { .. })
    }
}

/// One catalog entry: a named, sized, hash-identified message type.
///
/// Descriptors are normally emitted by the catalog generator; the core treats
/// both the name (an opaque key) and the hash (opaque bytes) as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    /// Unique within the catalog.
    pub name: String,
    pub size: SizePolicy,
    /// Content-derived hash of the type definition.
    pub hash: [u8; HASH_LEN],
}

impl Descriptor {
    pub fn new(name: impl Into<String>, size: SizePolicy, hash: [u8; HASH_LEN]) -> Self {
        Self {
            name: name.into(),
            size,
            hash,
        }
    }
}

/// Compute a type hash from a canonical definition.
///
/// The input byte string is the protocol-level identity of the type and must
/// never change once peers depend on it.
pub fn type_hash(definition: &[u8]) -> [u8; HASH_LEN] {
    let mut out = [0u8; HASH_LEN];
    out.copy_from_slice(&blake3::hash(definition).as_bytes()[..HASH_LEN]);
    out
}
