//! The message set both demo peers share.
//!
//! Both processes must build byte-identical descriptors or their tags will
//! not match on the wire; everything is derived from the names below.

use cairn_core::{type_hash, Catalog, CatalogError, Descriptor, SizePolicy};

pub const PING: &str = "PING";
pub const PONG: &str = "PONG";
/// Sent by peer A before it disconnects. Peer B installs no handler for it,
/// so it is drained and dropped — the default for unbound types.
pub const STATUS: &str = "STATUS";

pub const TEXT_MAX: u32 = 64;
pub const STATUS_LEN: u32 = 8;

pub fn build() -> Result<Catalog, CatalogError> {
    Catalog::new(vec![
        Descriptor::new(
            PING,
            SizePolicy::Variable { max: TEXT_MAX },
            type_hash(b"cairn.peers.PING"),
        ),
        Descriptor::new(
            PONG,
            SizePolicy::Variable { max: TEXT_MAX },
            type_hash(b"cairn.peers.PONG"),
        ),
        Descriptor::new(
            STATUS,
            SizePolicy::Fixed { total: STATUS_LEN },
            type_hash(b"cairn.peers.STATUS"),
        ),
    ])
}
