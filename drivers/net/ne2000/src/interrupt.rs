//! Interrupt dispatch
//!
//! Drains ISR until the chip has nothing left to report. Transmit
//! completions free send slots here; arrivals are only reported, the
//! frames stay in the ring until the next `receive`.

use crate::io::PortIo;
use crate::nic::Ne2000;
use crate::regs::{InterruptStatus, Page0Read};

/// Rounds of ISR draining before giving up on a stuck status bit
const MAX_DISPATCH_ROUNDS: usize = 32;

/// What one interrupt reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterruptSummary {
    /// Send slots released
    pub transmitted: u32,
    /// At least one frame waits in the receive ring
    pub packet_available: bool,
    /// Bits the driver has no handling for
    pub unhandled: InterruptStatus,
}

impl InterruptSummary {
    const fn new() -> Self {
        Self {
            transmitted: 0,
            packet_available: false,
            unhandled: InterruptStatus::empty(),
        }
    }
}

impl<P: PortIo> Ne2000<P> {
    /// Service the card's interrupt line
    pub fn on_interrupt(&mut self) -> InterruptSummary {
        let mut summary = InterruptSummary::new();
        if self.ensure_running().is_err() {
            return summary;
        }

        self.select_page0();

        for _ in 0..MAX_DISPATCH_ROUNDS {
            let isr = self.interrupt_status();
            if isr.is_empty() {
                return summary;
            }
            self.acknowledge(isr);

            if isr.contains(InterruptStatus::PTX) {
                if self.sendq.retire() {
                    summary.transmitted += 1;
                    log::trace!("{}: packet transmitted with no error", self.name());
                } else {
                    log::warn!("{}: transmit completion with empty send queue", self.name());
                }
            }
            if isr.contains(InterruptStatus::PRX) {
                summary.packet_available = true;
                log::trace!("{}: packet received with no error", self.name());
            }
            if isr.contains(InterruptStatus::TXE) {
                self.stats.tx_errors += 1;
                log::warn!("{}: transmit error", self.name());
            }
            if isr.contains(InterruptStatus::RXE) {
                self.stats.rx_errors += 1;
                log::warn!("{}: receive error", self.name());
            }
            if isr.contains(InterruptStatus::OVW) {
                self.stats.overwrites += 1;
                log::warn!("{}: receive ring overwrite warning", self.name());
            }
            if isr.contains(InterruptStatus::CNT) {
                self.drain_tally_counters();
            }

            let known = InterruptStatus::PTX
                | InterruptStatus::PRX
                | InterruptStatus::TXE
                | InterruptStatus::RXE
                | InterruptStatus::OVW
                | InterruptStatus::CNT
                | InterruptStatus::RDC;
            let other = isr - known;
            if !other.is_empty() {
                summary.unhandled |= other;
                log::debug!(
                    "{}: interrupt event 0x{:02x} is not handled",
                    self.name(),
                    other.bits()
                );
            }
        }

        log::warn!(
            "{}: interrupt status still pending after {} rounds",
            self.name(),
            MAX_DISPATCH_ROUNDS
        );
        summary
    }

    /// Tally counters clear on read; CNT stays asserted until they do [29]
    fn drain_tally_counters(&mut self) {
        self.stats.frame_alignment_errors += self.read_reg(Page0Read::Cntr0) as u64;
        self.stats.crc_errors += self.read_reg(Page0Read::Cntr1) as u64;
        self.stats.missed_packets += self.read_reg(Page0Read::Cntr2) as u64;
    }
}
