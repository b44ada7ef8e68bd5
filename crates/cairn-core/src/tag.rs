//! Tag truncation — how a 20-byte hash becomes a small on-wire key.

/// Shortest negotiable tag, in bytes.
pub const TAG_LEN_MIN: usize = 1;

/// Longest negotiable tag. Four bytes keep the truncated tag inside a u32
/// map key.
/// TODO extend to 8-byte tags with u64 keys.
pub const TAG_LEN_MAX: usize = 4;

/// Width of the length field preceding variable-size bodies.
pub const LEN_FIELD: usize = 4;

/// Interpret tag bytes as a little-endian u32, zero-extended.
///
/// Both peers apply the same truncation to the same hashes, which is what
/// makes their tag indices agree after the handshake.
pub fn tag_key(tag: &[u8]) -> u32 {
    debug_assert!((TAG_LEN_MIN..=TAG_LEN_MAX).contains(&tag.len()));
    let mut word = [0u8; 4];
    word[..tag.len()].copy_from_slice(tag);
    u32::from_le_bytes(word)
}
