use crate::*;

use std::io::Read;

/// One live session against a hand-driven raw peer.
///
/// The peer's handshake byte is buffered before `initiate`, so the whole
/// setup runs on the test thread.
fn session_with_raw_peer() -> (Session, UnixStream, mpsc::Receiver<RecvFault>) {
    let (a, mut raw) = UnixStream::pair().unwrap();
    raw.write_all(&[4]).unwrap();

    let mut session = Session::new(test_catalog(), 4).unwrap();
    let (faults, sink) = fault_sink();
    let (tx, rx) = split(a);
    session.initiate(tx, rx, sink).unwrap();

    // Drain the session's own proposal.
    let mut proposal = [0u8; 1];
    raw.read_exact(&mut proposal).unwrap();
    assert_eq!(proposal, [4]);

    (session, raw, faults)
}

#[test]
fn raw_bytes_are_dispatched_by_tag() {
    let (session, mut raw, _faults) = session_with_raw_peer();

    let (got_tx, got_rx) = mpsc::channel();
    session
        .set_handler("ping", move |body, d| {
            got_tx.send((d.name.clone(), body.to_vec())).ok();
        })
        .unwrap();

    raw.write_all(b"pingHello").unwrap();

    let (name, body) = got_rx.recv_timeout(DELIVERY).unwrap();
    assert_eq!((name.as_str(), body.as_slice()), ("ping", &b"Hello"[..]));

    drop(raw);
    drop(session);
}

#[test]
fn unknown_tag_faults_and_terminates() {
    let (mut session, mut raw, faults) = session_with_raw_peer();

    raw.write_all(&[0x00, 0x00, 0x00, 0x00]).unwrap();

    let fault = faults.recv_timeout(DELIVERY).unwrap();
    assert!(matches!(&fault, RecvFault::UnknownTag { tag } if tag == &vec![0u8; 4]));

    // The receiver is gone; stop just joins the exited thread.
    session.stop();
    assert!(faults.try_recv().is_err(), "fault sink is called once");
}

#[test]
fn oversize_length_field_faults_before_dispatch() {
    let (mut session, mut raw, faults) = session_with_raw_peer();

    let (got_tx, got_rx) = mpsc::channel();
    session
        .set_handler("msg", move |body, _| {
            got_tx.send(body.to_vec()).ok();
        })
        .unwrap();

    // "msg" caps at 8 bytes; claim 9.
    raw.write_all(b"Capr\x09\x00\x00\x00").unwrap();

    let fault = faults.recv_timeout(DELIVERY).unwrap();
    assert!(matches!(
        fault,
        RecvFault::OversizeFrame { len: 9, max: 8, .. }
    ));
    assert!(got_rx.try_recv().is_err(), "handler must not run");

    session.stop();
}

#[test]
fn stream_end_faults_as_transport_failure() {
    let (mut session, raw, faults) = session_with_raw_peer();

    drop(raw);

    let fault = faults.recv_timeout(DELIVERY).unwrap();
    assert!(matches!(fault, RecvFault::Transport(_)));

    session.stop();
}

#[test]
fn truncated_frame_faults_as_transport_failure() {
    let (mut session, mut raw, faults) = session_with_raw_peer();

    // Tag promises a 5-byte body; deliver 3 and hang up.
    raw.write_all(b"ping123").unwrap();
    drop(raw);

    let fault = faults.recv_timeout(DELIVERY).unwrap();
    assert!(matches!(fault, RecvFault::Transport(_)));

    session.stop();
}
