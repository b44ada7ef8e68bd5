//! Send path — serializes one message onto the transport.

use std::io::{self, Write};

use cairn_core::{Descriptor, SizePolicy};

/// Emit one frame: tag bytes, length field for variable types, body.
///
/// Each field is a separate all-or-nothing write. Nothing is buffered: a
/// failure mid-frame leaves the wire indeterminate and the session unusable.
pub(crate) fn send_frame(
    tx: &mut dyn Write,
    descriptor: &Descriptor,
    tag_len: usize,
    body: &[u8],
) -> Result<(), SendError> {
    match descriptor.size {
        SizePolicy::Fixed { total } => {
            if body.len() != total as usize {
                return Err(SendError::SizeMismatch {
                    name: descriptor.name.clone(),
                    len: body.len(),
                    total,
                });
            }
            tx.write_all(&descriptor.hash[..tag_len])?;
            tx.write_all(body)?;
        }
        SizePolicy::Variable { max } => {
            if body.len() > max as usize {
                return Err(SendError::TooLarge {
                    name: descriptor.name.clone(),
                    len: body.len(),
                    max,
                });
            }
            tx.write_all(&descriptor.hash[..tag_len])?;
            tx.write_all(&(body.len() as u32).to_le_bytes())?;
            tx.write_all(body)?;
        }
    }

    tracing::trace!(name = %descriptor.name, len = body.len(), "frame sent");
    Ok(())
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("unknown message name: {0:?}")]
    UnknownName(String),
    #[error("{name:?} takes at most {max} bytes, got {len}")]
    TooLarge { name: String, len: usize, max: u32 },
    #[error("{name:?} is fixed at {total} bytes, got {len}")]
    SizeMismatch {
        name: String,
        len: usize,
        total: u32,
    },
    #[error("session has not been initiated")]
    NotInitiated,
    #[error("transport send failed")]
    Transport(#[from] io::Error),
}
