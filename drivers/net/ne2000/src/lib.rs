//! NE2000 Network Driver
//!
//! Driver for NE1000/NE2000-compatible ISA Ethernet cards built around the
//! National Semiconductor DP8390 core. All access goes through port I/O:
//! the card's RAM is reached with the chip's Remote DMA engine through a
//! single data port.
//!
//! Layout of the card RAM (16-bit card):
//!
//! ```text
//! 0x4000            0x4C00                                   0x8000
//! | send slot 0 | 1 |  receive ring (PSTART .. PSTOP)          |
//! ```
//!
//! Page references in comments point at the DP8390D datasheet.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod config;
pub mod device;
pub mod dma;
pub mod error;
pub mod interrupt;
pub mod io;
pub mod layout;
pub mod nic;
pub mod probe;
pub mod recv;
pub mod regs;
pub mod sendq;

#[cfg(test)]
mod tests;

pub use config::Ne2000Config;
pub use device::{scan, DeviceSlot, EthIoctl, InterruptController};
pub use error::{NicError, PollTarget, ProbeFailure, Result};
pub use interrupt::InterruptSummary;
pub use io::PortIo;
pub use layout::RingLayout;
pub use nic::{MacAddress, Ne2000, NicState, NicStats};
pub use recv::{PacketHeader, RecvStatus};

#[cfg(target_arch = "x86_64")]
pub use device::ETH0;
#[cfg(target_arch = "x86_64")]
pub use io::X86PortIo;
