//! cairn-peers — a demonstration pair of processes exchanging typed messages
//! over two FIFOs. `peer-a` initiates and pings; `peer-b` answers.

pub mod catalog;
pub mod config;
pub mod fifo;
