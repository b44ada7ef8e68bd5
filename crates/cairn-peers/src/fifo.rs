//! FIFO transport for the demo pair.
//!
//! Two FIFOs, one per direction. Both processes open the a→b pipe first, so
//! the opens pair up instead of deadlocking. `File`'s `write_all` and
//! `read_exact` supply the all-or-nothing byte primitives the session needs.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use nix::sys::stat::Mode;
use nix::unistd::mkfifo;

pub struct FifoPair {
    a_to_b: PathBuf,
    b_to_a: PathBuf,
}

impl FifoPair {
    pub fn new(dir: &Path) -> Self {
        Self {
            a_to_b: dir.join("cairn_aobi"),
            b_to_a: dir.join("cairn_aibo"),
        }
    }

    /// Create both FIFOs; a leftover pair from an earlier run is reused.
    pub fn create(&self) -> io::Result<()> {
        if let Some(dir) = self.a_to_b.parent() {
            std::fs::create_dir_all(dir)?;
        }
        for path in [&self.a_to_b, &self.b_to_a] {
            match mkfifo(path.as_path(), Mode::from_bits_truncate(0o666)) {
                Ok(()) | Err(nix::errno::Errno::EEXIST) => {}
                Err(errno) => return Err(io::Error::from_raw_os_error(errno as i32)),
            }
        }
        Ok(())
    }

    /// Remove both FIFOs. Best effort.
    pub fn remove(&self) {
        std::fs::remove_file(&self.a_to_b).ok();
        std::fs::remove_file(&self.b_to_a).ok();
    }

    /// Peer A writes a→b and reads b→a. Blocks until peer B opens its ends.
    pub fn open_a(&self) -> io::Result<(File, File)> {
        let tx = OpenOptions::new().write(true).open(&self.a_to_b)?;
        let rx = File::open(&self.b_to_a)?;
        Ok((tx, rx))
    }

    /// Peer B reads a→b and writes b→a. Blocks until peer A opens its ends.
    pub fn open_b(&self) -> io::Result<(File, File)> {
        let rx = File::open(&self.a_to_b)?;
        let tx = OpenOptions::new().write(true).open(&self.b_to_a)?;
        Ok((tx, rx))
    }
}
