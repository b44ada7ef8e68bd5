//! peer-a — initiator half of the demo pair.
//!
//! Creates the FIFOs, handshakes, sends a PING, prints the PONG, then sends
//! a STATUS frame peer B has no handler for and disconnects.

use std::sync::mpsc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use cairn::Session;
use cairn_peers::{catalog, config::PeersConfig, fifo::FifoPair};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = PeersConfig::load().context("loading config")?;
    let fifos = FifoPair::new(&config.fifo_dir);
    fifos.create().context("creating FIFOs")?;

    println!("a: waiting for peer-b on {}", config.fifo_dir.display());
    let (tx, rx) = fifos.open_a().context("opening FIFOs")?;

    let mut session = Session::new(catalog::build()?, config.min_tag_len)?;

    let (pong_tx, pong_rx) = mpsc::channel();
    session.set_handler(catalog::PONG, move |body, _| {
        pong_tx.send(String::from_utf8_lossy(body).into_owned()).ok();
    })?;

    session.initiate(tx, rx, |fault| {
        tracing::info!(%fault, "receive loop ended");
    })?;
    println!("a: handshake complete, tag length {:?}", session.tag_len());

    let ping = "the quick brown fox";
    println!("a: sending PING {ping:?}");
    session.send(catalog::PING, ping.as_bytes())?;

    let pong = pong_rx
        .recv_timeout(Duration::from_secs(5))
        .context("no PONG within 5s")?;
    println!("a: received PONG {pong:?}");

    session.send_with_immutable_name(catalog::STATUS, b"all done")?;

    session.stop();
    fifos.remove();
    Ok(())
}
