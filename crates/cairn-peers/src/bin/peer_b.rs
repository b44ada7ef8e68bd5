//! peer-b — responder half of the demo pair.
//!
//! Handshakes, echoes the first PING back as a PONG, then disconnects.
//! Handlers run on the receiver thread, so the echo is routed through a
//! channel back to the main thread that owns the transmit path.

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

    println!("b: waiting for peer-a on {}", config.fifo_dir.display());
    let (tx, rx) = fifos.open_b().context("opening FIFOs")?;

    let mut session = Session::new(catalog::build()?, config.min_tag_len)?;

    let (ping_tx, ping_rx) = mpsc::channel();
    session.set_handler(catalog::PING, move |body, _| {
        ping_tx.send(body.to_vec()).ok();
    })?;

    session.initiate(tx, rx, |fault| {
        tracing::info!(%fault, "receive loop ended");
    })?;
    println!("b: handshake complete, tag length {:?}", session.tag_len());

    let ping = ping_rx
        .recv_timeout(Duration::from_secs(10))
        .context("no PING within 10s")?;
    println!("b: received PING {:?}", String::from_utf8_lossy(&ping));

    println!("b: answering with PONG");
    session.send(catalog::PONG, &ping)?;

    session.stop();
    Ok(())
}
