//! Driver tests against a simulated card

mod recv_tests;
mod sim;

use alloc::vec::Vec;

use crate::config::Ne2000Config;
use crate::nic::Ne2000;
use sim::SimCard;

pub const BASE: u16 = 0x300;
pub const MAC: [u8; 6] = [0x52, 0x54, 0x00, 0x12, 0x34, 0x56];

/// Short poll limits so timeouts fail fast
pub fn fast_config() -> Ne2000Config {
    Ne2000Config::new().with_poll_limits(64, 64)
}

pub fn detached(card: &SimCard) -> Ne2000<SimCard> {
    Ne2000::new("eth0", BASE, 9, card.clone(), fast_config())
}

/// Probe and initialize a context for `card`
pub fn running(card: &SimCard) -> Ne2000<SimCard> {
    let mut nic = detached(card);
    nic.probe().unwrap();
    nic.init().unwrap();
    nic
}

/// Deterministic frame contents
pub fn frame(len: usize, seed: u8) -> Vec<u8> {
    (0..len).map(|i| seed.wrapping_add(i as u8)).collect()
}
