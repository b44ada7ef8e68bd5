//! Session lifecycle — handshake, handler installs, send path, receiver
//! control.

use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use dashmap::DashMap;

use cairn_core::tag::{TAG_LEN_MAX, TAG_LEN_MIN};
use cairn_core::{Catalog, Descriptor, TagCollision};

use crate::binding::{lock_slot, BindError, Binding, DispatchTable, RecvBuffer};
use crate::framer::{send_frame, SendError};
use crate::receiver::{Receiver, RecvFault};

/// One peer's end of a message stream.
///
/// Construction installs the catalog; [`initiate`](Session::initiate)
/// performs the handshake and spawns the receiver; [`send`](Session::send) is
/// valid until [`stop`](Session::stop). Reconfiguration is dropping the
/// session and building a new one — there is no shared module state to race
/// on.
///
/// The transmit path is not locked: `send` takes `&mut self`, making the
/// single-writer model a compile-time fact.
pub struct Session {
    catalog: Arc<Catalog>,
    table: Arc<DispatchTable>,
    min_tag_len: usize,
    tag_len: Option<usize>,
    tx: Option<Box<dyn Write + Send>>,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    /// Pointer-identity cache for `send_with_immutable_name`.
    name_cache: DashMap<usize, usize>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("min_tag_len", &self.min_tag_len)
            .field("tag_len", &self.tag_len)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Install a catalog and the locally proposed minimum tag length.
    pub fn new(catalog: Catalog, min_tag_len: usize) -> Result<Self, InitError> {
        if !(TAG_LEN_MIN..=TAG_LEN_MAX).contains(&min_tag_len) {
            return Err(InitError::MinTagLen(min_tag_len));
        }

        let table = Arc::new(DispatchTable::new(catalog.len()));
        Ok(Self {
            catalog: Arc::new(catalog),
            table,
            min_tag_len,
            tag_len: None,
            tx: None,
            stop: Arc::new(AtomicBool::new(false)),
            worker: None,
            name_cache: DashMap::new(),
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Negotiated tag length, once a handshake has completed.
    pub fn tag_len(&self) -> Option<usize> {
        self.tag_len
    }

    /// Bind a handler receiving into the shared buffer.
    ///
    /// Valid before or after `initiate`. Installing a handler for a type
    /// whose messages may already be arriving delays that frame's dispatch
    /// until the install completes, and vice versa.
    pub fn set_handler(
        &self,
        name: &str,
        handler: impl FnMut(&[u8], &Descriptor) + Send + 'static,
    ) -> Result<(), BindError> {
        let index = self.bind_index(name)?;
        self.table.install(
            index,
            Binding::Installed {
                handler: Box::new(handler),
                buffer: RecvBuffer::Common,
                start_flag: None,
            },
        );
        Ok(())
    }

    /// Bind a handler receiving into a caller-owned buffer.
    ///
    /// The buffer must already hold as many bytes as the type's largest
    /// payload. If given, `start_flag` is stored true immediately before each
    /// body read begins.
    pub fn set_handler_with_buffer(
        &self,
        name: &str,
        handler: impl FnMut(&[u8], &Descriptor) + Send + 'static,
        buffer: Arc<Mutex<Vec<u8>>>,
        start_flag: Option<Arc<AtomicBool>>,
    ) -> Result<(), BindError> {
        let index = self.bind_index(name)?;

        let needed = self.catalog.get(index).size.max_payload() as usize;
        let got = lock_slot(&buffer).len();
        if got < needed {
            return Err(BindError::BufferTooSmall {
                name: name.into(),
                needed,
                got,
            });
        }

        self.table.install(
            index,
            Binding::Installed {
                handler: Box::new(handler),
                buffer: RecvBuffer::Owned(buffer),
                start_flag,
            },
        );
        Ok(())
    }

    /// Reset a type to the default: messages are drained and dropped.
    pub fn clear_handler(&self, name: &str) -> Result<(), BindError> {
        let index = self.bind_index(name)?;
        self.table.clear(index);
        Ok(())
    }

    /// Handshake on the calling thread, then spawn the receiver.
    ///
    /// Each side sends its minimum tag length as one byte and reads the
    /// peer's; both end up with the maximum of the two proposals. Any prior
    /// receiver is stopped first.
    pub fn initiate(
        &mut self,
        mut tx: impl Write + Send + 'static,
        mut rx: impl Read + Send + 'static,
        on_error: impl FnMut(RecvFault) + Send + 'static,
    ) -> Result<(), InitiateError> {
        self.stop();

        tx.write_all(&[self.min_tag_len as u8])
            .map_err(InitiateError::HandshakeSend)?;

        let mut peer = [0u8; 1];
        rx.read_exact(&mut peer)
            .map_err(InitiateError::HandshakeRecv)?;
        let peer = peer[0] as usize;
        if peer > TAG_LEN_MAX {
            return Err(InitiateError::PeerTagLen(peer as u8));
        }

        let tag_len = self.min_tag_len.max(peer);
        let by_tag = self.catalog.tag_index(tag_len)?;

        self.stop = Arc::new(AtomicBool::new(false));
        let receiver = Receiver::new(
            rx,
            Arc::clone(&self.catalog),
            Arc::clone(&self.table),
            by_tag,
            tag_len,
            Arc::clone(&self.stop),
        );
        let mut on_error = on_error;
        self.worker = Some(
            thread::Builder::new()
                .name("cairn-recv".into())
                .spawn(move || receiver.run(&mut on_error))
                .map_err(InitiateError::Spawn)?,
        );

        self.tag_len = Some(tag_len);
        self.tx = Some(Box::new(tx));

        tracing::info!(
            proposed = self.min_tag_len,
            peer,
            tag_len,
            "handshake complete, receiver running"
        );
        Ok(())
    }

    /// Frame and transmit one message.
    ///
    /// For fixed-size types the body must be exactly the declared total; for
    /// variable types at most the declared max.
    pub fn send(&mut self, name: &str, body: &[u8]) -> Result<(), SendError> {
        let index = self
            .catalog
            .index_of(name)
            .ok_or_else(|| SendError::UnknownName(name.into()))?;
        self.send_index(index, body)
    }

    /// [`send`](Session::send), caching the name lookup.
    ///
    /// The `'static` bound is the caller's promise that the name bytes never
    /// move, which is what makes pointer identity a valid cache key.
    pub fn send_with_immutable_name(
        &mut self,
        name: &'static str,
        body: &[u8],
    ) -> Result<(), SendError> {
        let key = name.as_ptr() as usize;
        let index = match self.name_cache.get(&key) {
            Some(index) => *index,
            None => {
                let index = self
                    .catalog
                    .index_of(name)
                    .ok_or_else(|| SendError::UnknownName(name.into()))?;
                self.name_cache.insert(key, index);
                index
            }
        };
        self.send_index(index, body)
    }

    fn send_index(&mut self, index: usize, body: &[u8]) -> Result<(), SendError> {
        let tag_len = self.tag_len.ok_or(SendError::NotInitiated)?;
        let tx = self.tx.as_mut().ok_or(SendError::NotInitiated)?;
        send_frame(tx.as_mut(), self.catalog.get(index), tag_len, body)
    }

    /// Stop receiving and release the transmit half.
    ///
    /// Cancellation is cooperative: the receiver notices at its next frame
    /// boundary, so this may block until one more byte arrives or the peer
    /// closes its end. Dropping the transmit half here signals EOF to a peer
    /// blocked the same way. Safe to call with no receiver running; after it
    /// returns the session is back in the configured-but-unconnected state.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Release);
        self.tx = None;
        self.tag_len = None;

        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::warn!("receiver thread panicked");
            }
        }
    }

    fn bind_index(&self, name: &str) -> Result<usize, BindError> {
        self.catalog
            .index_of(name)
            .ok_or_else(|| BindError::UnknownName(name.into()))
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.stop();
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InitError {
    #[error("minimum tag length {0} outside 1..=4")]
    MinTagLen(usize),
}

#[derive(Debug, thiserror::Error)]
pub enum InitiateError {
    #[error("handshake send failed")]
    HandshakeSend(#[source] io::Error),
    #[error("handshake recv failed")]
    HandshakeRecv(#[source] io::Error),
    #[error("peer proposed tag length {0}, max is 4")]
    PeerTagLen(u8),
    #[error(transparent)]
    TagCollision(#[from] TagCollision),
    #[error("failed to spawn receiver thread")]
    Spawn(#[source] io::Error),
}
