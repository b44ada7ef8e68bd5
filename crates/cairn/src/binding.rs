//! Handler bindings — what the receiver does with each message type.

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

use cairn_core::Descriptor;

/// Receive handler. Runs on the receiver thread; the payload slice is only
/// valid for the duration of the call.
pub type Handler = Box<dyn FnMut(&[u8], &Descriptor) + Send>;

/// Where the receiver writes a type's body bytes.
pub(crate) enum RecvBuffer {
    /// The receiver's shared buffer, sized to the largest payload in the
    /// catalog. Overwritten by the next common-buffered message of any type.
    Common,
    /// A caller-owned buffer, locked for the body read plus the handler call.
    Owned(Arc<Mutex<Vec<u8>>>),
}

/// Per-slot binding. A buffer and start flag exist only when a handler does;
/// `NoOp` drains the body into the common buffer and drops it.
pub(crate) enum Binding {
    NoOp,
    Installed {
        handler: Handler,
        buffer: RecvBuffer,
        /// Stored true immediately before the body read, so the embedder can
        /// observe that bytes for this type have started landing.
        start_flag: Option<Arc<AtomicBool>>,
    },
}

/// One mutex-guarded binding per catalog slot, shared between the session
/// (installs) and the receiver (dispatch). A slot stays locked for the whole
/// frame, so an install can never tear a binding mid-dispatch.
pub(crate) struct DispatchTable {
    slots: Vec<Mutex<Binding>>,
}

impl DispatchTable {
    pub(crate) fn new(len: usize) -> Self {
        Self {
            slots: (0..len).map(|_| Mutex::new(Binding::NoOp)).collect(),
        }
    }

    pub(crate) fn install(&self, index: usize, binding: Binding) {
        *lock_slot(&self.slots[index]) = binding;
    }

    pub(crate) fn clear(&self, index: usize) {
        self.install(index, Binding::NoOp);
    }

    pub(crate) fn slot(&self, index: usize) -> &Mutex<Binding> {
        &self.slots[index]
    }
}

/// A panicking handler poisons its slot; recover the guard so the slot stays
/// usable instead of wedging every later message of that type.
pub(crate) fn lock_slot<T>(slot: &Mutex<T>) -> MutexGuard<'_, T> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindError {
    #[error("unknown message name: {0:?}")]
    UnknownName(String),
    #[error("receive buffer for {name:?} holds {got} bytes, needs {needed}")]
    BufferTooSmall {
        name: String,
        needed: usize,
        got: usize,
    },
}
