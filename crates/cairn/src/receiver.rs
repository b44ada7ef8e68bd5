//! Receive worker — reads frames and dispatches them until stopped or the
//! stream dies.

use std::collections::HashMap;
use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use cairn_core::tag::{tag_key, LEN_FIELD, TAG_LEN_MAX};
use cairn_core::{Catalog, Descriptor, SizePolicy};

use crate::binding::{lock_slot, Binding, DispatchTable, RecvBuffer};

/// Faults reported through the error sink.
///
/// After any of these the receiver has terminated. The position of the next
/// tag in the stream is unknown, so the connection cannot be resumed; the
/// embedder should close the transport and call [`crate::Session::stop`].
#[derive(Debug, thiserror::Error)]
pub enum RecvFault {
    #[error("transport recv failed")]
    Transport(#[source] io::Error),
    #[error("unknown tag on wire: {}", hex::encode(tag))]
    UnknownTag { tag: Vec<u8> },
    #[error("{name:?} length field {len} exceeds max {max}")]
    OversizeFrame { name: String, len: u32, max: u32 },
}

pub(crate) struct Receiver<R> {
    rx: R,
    catalog: Arc<Catalog>,
    table: Arc<DispatchTable>,
    by_tag: HashMap<u32, usize>,
    tag_len: usize,
    stop: Arc<AtomicBool>,
    /// Shared destination for bindings without their own buffer. Sized one
    /// past the largest payload so a handler can terminate bytes in place
    /// when bridging to C APIs.
    common: Vec<u8>,
}

impl<R: Read> Receiver<R> {
    pub(crate) fn new(
        rx: R,
        catalog: Arc<Catalog>,
        table: Arc<DispatchTable>,
        by_tag: HashMap<u32, usize>,
        tag_len: usize,
        stop: Arc<AtomicBool>,
    ) -> Self {
        let common = vec![0u8; catalog.max_payload() as usize + 1];
        Self {
            rx,
            catalog,
            table,
            by_tag,
            tag_len,
            stop,
            common,
        }
    }

    /// Run until stop is requested or a fault occurs. Faults observed after a
    /// stop request are the embedder tearing down the transport, not news.
    pub(crate) fn run(mut self, mut on_error: impl FnMut(RecvFault)) {
        if let Err(fault) = self.recv_loop() {
            if self.stop.load(Ordering::Acquire) {
                tracing::debug!(%fault, "receiver exiting after stop request");
                return;
            }
            tracing::warn!(%fault, "receiver terminating");
            on_error(fault);
        }
    }

    fn recv_loop(&mut self) -> Result<(), RecvFault> {
        let catalog = Arc::clone(&self.catalog);
        let table = Arc::clone(&self.table);
        let mut tag = [0u8; TAG_LEN_MAX];

        loop {
            if self.stop.load(Ordering::Acquire) {
                tracing::debug!("receiver stopping");
                return Ok(());
            }

            let tag = &mut tag[..self.tag_len];
            self.rx.read_exact(tag).map_err(RecvFault::Transport)?;

            let index = self
                .by_tag
                .get(&tag_key(tag))
                .copied()
                .ok_or_else(|| RecvFault::UnknownTag { tag: tag.to_vec() })?;
            let descriptor = catalog.get(index);

            let size = self.read_size(descriptor)? as usize;

            // The slot stays locked through the body read and the handler
            // call; a concurrent install waits for the frame to finish.
            let mut binding = lock_slot(table.slot(index));
            match &mut *binding {
                Binding::NoOp => {
                    self.rx
                        .read_exact(&mut self.common[..size])
                        .map_err(RecvFault::Transport)?;
                    tracing::debug!(name = %descriptor.name, size, "message dropped, no handler");
                }
                Binding::Installed {
                    handler,
                    buffer,
                    start_flag,
                } => {
                    if let Some(flag) = start_flag {
                        flag.store(true, Ordering::Release);
                    }
                    match buffer {
                        RecvBuffer::Common => {
                            self.rx
                                .read_exact(&mut self.common[..size])
                                .map_err(RecvFault::Transport)?;
                            handler(&self.common[..size], descriptor);
                        }
                        RecvBuffer::Owned(shared) => {
                            let mut owned = lock_slot(shared);
                            self.rx
                                .read_exact(&mut owned[..size])
                                .map_err(RecvFault::Transport)?;
                            handler(&owned[..size], descriptor);
                        }
                    }
                    tracing::trace!(name = %descriptor.name, size, "message dispatched");
                }
            }
        }
    }

    /// Body size of the next frame: fixed from the descriptor, variable from
    /// the little-endian length field following the tag.
    fn read_size(&mut self, descriptor: &Descriptor) -> Result<u32, RecvFault> {
        match descriptor.size {
            SizePolicy::Fixed { total } => Ok(total),
            SizePolicy::Variable { max } => {
                let mut len = [0u8; LEN_FIELD];
                self.rx.read_exact(&mut len).map_err(RecvFault::Transport)?;
                let len = u32::from_le_bytes(len);
                if len > max {
                    return Err(RecvFault::OversizeFrame {
                        name: descriptor.name.clone(),
                        len,
                        max,
                    });
                }
                Ok(len)
            }
        }
    }
}
