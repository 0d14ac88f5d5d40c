//! Driver configuration
//!
//! Card constants come from the NE1000/NE2000 reference designs; the rest
//! is bring-up policy the kernel may override.

use static_assertions::const_assert;

/// Size of one card RAM page in bytes
pub const PAGE_SIZE: usize = 256;

/// NE1000 (8-bit) on-board RAM
pub const NE1000_START: u16 = 0x2000;
pub const NE1000_SIZE: usize = 0x2000;

/// NE2000 (16-bit) on-board RAM
pub const NE2000_START: u16 = 0x4000;
pub const NE2000_SIZE: usize = 0x4000;

/// Number of transmit slots
pub const SENDQ_LEN: usize = 2;

/// Pages per transmit slot
pub const SENDQ_PAGES: usize = 6;

/// Frame bounds (destination, source, type and payload; no CRC)
pub const ETH_MIN_SIZE: usize = 46;
pub const ETH_MAX_SIZE: usize = 1514;

/// Bytes read from the station address PROM
pub const PROM_SIZE: usize = 32;

/// Bytes 14 and 15 of every NE-family PROM
pub const PROM_SIGNATURE: u8 = 0x57;

/// Ports tried in order during bring-up
pub const DEFAULT_PORTS: [u16; 7] = [0x300, 0xC100, 0x240, 0x280, 0x320, 0x340, 0x360];

/// ISA line wired to the card by default
pub const DEFAULT_IRQ: u8 = 9;

// A maximum-size frame must fit in its slot.
const_assert!(SENDQ_PAGES * PAGE_SIZE >= ETH_MAX_SIZE);
// The send queue leaves room for a receive ring on the smaller card.
const_assert!(SENDQ_PAGES * SENDQ_LEN < NE1000_SIZE / PAGE_SIZE);
// Page numbers are 8-bit registers.
const_assert!((NE2000_START as usize + NE2000_SIZE) / PAGE_SIZE <= 0x100);

/// Bring-up parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ne2000Config {
    /// Candidate base ports, probed in order
    pub ports: &'static [u16],
    /// Interrupt line of the card
    pub irq: u8,
    /// Device names are this prefix plus the candidate index
    pub name_prefix: &'static str,
    /// Iterations to wait for the reset bit
    pub reset_poll_limit: u32,
    /// Iterations to wait for remote DMA handshakes
    pub dma_poll_limit: u32,
}

impl Ne2000Config {
    pub const fn new() -> Self {
        Self {
            ports: &DEFAULT_PORTS,
            irq: DEFAULT_IRQ,
            name_prefix: "eth",
            reset_poll_limit: 10_000,
            dma_poll_limit: 100_000,
        }
    }

    pub const fn with_ports(mut self, ports: &'static [u16]) -> Self {
        self.ports = ports;
        self
    }

    pub const fn with_irq(mut self, irq: u8) -> Self {
        self.irq = irq;
        self
    }

    pub const fn with_poll_limits(mut self, reset: u32, dma: u32) -> Self {
        self.reset_poll_limit = reset;
        self.dma_poll_limit = dma;
        self
    }
}

impl Default for Ne2000Config {
    fn default() -> Self {
        Self::new()
    }
}
