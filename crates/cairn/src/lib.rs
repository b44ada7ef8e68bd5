//! cairn — named, typed message framing and dispatch over any reliable,
//! ordered, bidirectional byte stream.
//!
//! Two peers share an identical [`Catalog`] of message types. Each type's
//! hash prefix is the on-wire tag; a one-byte handshake negotiates the prefix
//! length. A [`Session`] owns the transmit half of the transport and a
//! dedicated receiver thread that dispatches every inbound message to the
//! handler installed for its type.

mod binding;
mod framer;
mod receiver;
mod session;

pub use binding::{BindError, Handler};
pub use framer::SendError;
pub use receiver::RecvFault;
pub use session::{InitError, InitiateError, Session};

pub use cairn_core::{
    type_hash, Catalog, CatalogError, Descriptor, SizePolicy, TagCollision, HASH_LEN,
};
