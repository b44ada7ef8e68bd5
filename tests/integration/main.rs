//! cairn integration harness.
//!
//! Each test drives one or two live sessions over Unix socket pairs. The
//! write half is wrapped so dropping it half-closes the socket — that is how
//! a peer's receiver learns the stream ended, and what keeps cooperative
//! stops from blocking forever.

mod faults;
mod handshake;

use std::io::{self, Write};
use std::net::Shutdown;
use std::os::unix::net::UnixStream;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use cairn::{Catalog, Descriptor, RecvFault, Session, SizePolicy};
use cairn_core::HASH_LEN;

/// Generous bound for cross-thread delivery; real latency is microseconds.
pub const DELIVERY: Duration = Duration::from_secs(5);

pub fn descriptor(name: &str, size: SizePolicy, tag: &[u8]) -> Descriptor {
    let mut hash = [0u8; HASH_LEN];
    hash[..tag.len()].copy_from_slice(tag);
    Descriptor::new(name, size, hash)
}

/// The catalog both ends of every test share.
pub fn test_catalog() -> Catalog {
    Catalog::new(vec![
        descriptor("ping", SizePolicy::Fixed { total: 5 }, b"ping"),
        descriptor("msg", SizePolicy::Variable { max: 8 }, b"Capr"),
        descriptor("note", SizePolicy::Variable { max: 32 }, b"Note"),
    ])
    .expect("test catalog")
}

/// Write half of a socket. Dropping it half-closes the stream, so the peer's
/// receiver sees EOF instead of blocking on a dead connection.
pub struct SockTx(pub UnixStream);

impl Write for SockTx {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

impl Drop for SockTx {
    fn drop(&mut self) {
        self.0.shutdown(Shutdown::Write).ok();
    }
}

/// Split one stream into the (tx, rx) halves a session consumes.
pub fn split(stream: UnixStream) -> (SockTx, UnixStream) {
    let tx = SockTx(stream.try_clone().expect("clone socket"));
    (tx, stream)
}

/// Error sink backed by a channel the test can assert on.
pub fn fault_sink() -> (
    mpsc::Receiver<RecvFault>,
    impl FnMut(RecvFault) + Send + 'static,
) {
    let (tx, rx) = mpsc::channel();
    (rx, move |fault| {
        tx.send(fault).ok();
    })
}

/// Stop two connected sessions.
///
/// Each stop releases its own transmit half before joining, but the join
/// still needs the *peer's* half released; stopping the two concurrently
/// lets the pair unwind no matter which receiver notices first.
pub fn stop_both(mut a: Session, b: Session) {
    let peer = thread::spawn(move || drop(b));
    a.stop();
    drop(a);
    peer.join().expect("peer shutdown");
}
