use crate::*;

/// Asymmetric proposals: both ends must settle on the larger length, and the
/// settled length must actually frame traffic both directions.
#[test]
fn both_sides_negotiate_the_larger_proposal() {
    let (a, b) = UnixStream::pair().unwrap();

    // The peer initiates on its own thread; each side's handshake read
    // blocks until the other side's write.
    let peer = thread::spawn(move || {
        let mut session = Session::new(test_catalog(), 3).unwrap();
        let (_faults, sink) = fault_sink();
        let (tx, rx) = split(b);
        session.initiate(tx, rx, sink).unwrap();
        session
    });

    let mut session = Session::new(test_catalog(), 2).unwrap();
    let (_faults, sink) = fault_sink();
    let (tx, rx) = split(a);
    session.initiate(tx, rx, sink).unwrap();

    let peer_session = peer.join().unwrap();
    assert_eq!(session.tag_len(), Some(3));
    assert_eq!(peer_session.tag_len(), Some(3));

    stop_both(session, peer_session);
}

/// Equal proposals keep the proposed length, and traffic framed at that
/// length is understood by both tag indices.
#[test]
fn negotiated_tags_agree_across_the_wire() {
    let (a, b) = UnixStream::pair().unwrap();

    let (got_tx, got_rx) = mpsc::channel();
    let peer = thread::spawn(move || {
        let mut session = Session::new(test_catalog(), 2).unwrap();
        session
            .set_handler("msg", move |body, d| {
                got_tx.send((d.name.clone(), body.to_vec())).ok();
            })
            .unwrap();
        let (_faults, sink) = fault_sink();
        let (tx, rx) = split(b);
        session.initiate(tx, rx, sink).unwrap();
        session
    });

    let mut session = Session::new(test_catalog(), 2).unwrap();
    let (_faults, sink) = fault_sink();
    let (tx, rx) = split(a);
    session.initiate(tx, rx, sink).unwrap();
    assert_eq!(session.tag_len(), Some(2));

    let peer_session = peer.join().unwrap();

    // A frames with 2-byte tags; the peer must resolve them.
    session.send("msg", b"short").unwrap();
    let (name, body) = got_rx.recv_timeout(DELIVERY).unwrap();
    assert_eq!(name, "msg");
    assert_eq!(body, b"short");

    stop_both(session, peer_session);
}
