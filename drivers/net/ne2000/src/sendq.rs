//! Transmit path
//!
//! Card RAM below the receive ring is split into `SENDQ_LEN` slots. `head`
//! counts frames handed to the chip, `tail` counts completions plus
//! `SENDQ_LEN - 1`; both only grow, the slot is the counter modulo the
//! slot count. `send` is the only writer of `head`, the interrupt handler
//! the only writer of `tail`.

use crate::config::{ETH_MAX_SIZE, ETH_MIN_SIZE, SENDQ_LEN};
use crate::error::{NicError, PollTarget, Result};
use crate::io::PortIo;
use crate::layout::RingLayout;
use crate::nic::Ne2000;
use crate::regs::{Command, InterruptStatus, Page0Write};

/// One page-aligned transmit buffer in card RAM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SendSlot {
    pub page: u8,
    pub filled: bool,
}

/// Circular queue of transmit slots
#[derive(Debug, Clone)]
pub struct SendQueue {
    slots: [SendSlot; SENDQ_LEN],
    head: u64,
    tail: u64,
}

impl SendQueue {
    pub const fn new() -> Self {
        Self {
            slots: [SendSlot { page: 0, filled: false }; SENDQ_LEN],
            head: 0,
            tail: SENDQ_LEN as u64 - 1,
        }
    }

    /// Assign slot pages from `layout` and mark every slot free
    pub fn reset(&mut self, layout: &RingLayout) {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            slot.page = layout.slot_page(i);
            slot.filled = false;
        }
        self.head = 0;
        self.tail = SENDQ_LEN as u64 - 1;
    }

    pub fn head(&self) -> u64 {
        self.head
    }

    pub fn tail(&self) -> u64 {
        self.tail
    }

    pub fn slots(&self) -> &[SendSlot] {
        &self.slots
    }

    /// Frames handed to the chip and not yet reported transmitted
    pub fn in_flight(&self) -> usize {
        (self.head + SENDQ_LEN as u64 - 1 - self.tail) as usize
    }

    /// Slot the next frame goes to, if it is free
    pub fn next_free(&self) -> Option<usize> {
        let index = (self.head % SENDQ_LEN as u64) as usize;
        if self.slots[index].filled || self.head > self.tail {
            None
        } else {
            Some(index)
        }
    }

    /// Mark the head slot filled and advance `head`
    pub(crate) fn commit(&mut self, index: usize) {
        self.slots[index].filled = true;
        self.head += 1;
    }

    /// Release the oldest in-flight slot; false if nothing was in flight
    pub(crate) fn retire(&mut self) -> bool {
        if self.in_flight() == 0 {
            return false;
        }
        self.tail += 1;
        self.slots[(self.tail % SENDQ_LEN as u64) as usize].filled = false;
        true
    }
}

impl Default for SendQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: PortIo> Ne2000<P> {
    /// Copy `frame` into the next free slot and start transmitting it
    ///
    /// Returns the number of bytes accepted. [`NicError::Busy`] means every
    /// slot is still waiting for its transmit-complete interrupt.
    pub fn send(&mut self, frame: &[u8]) -> Result<usize> {
        self.ensure_running()?;

        let size = frame.len();
        if !(ETH_MIN_SIZE..=ETH_MAX_SIZE).contains(&size) {
            return Err(NicError::InvalidFrameLength(size));
        }

        let index = match self.sendq.next_free() {
            Some(index) => index,
            None => {
                self.stats.tx_busy += 1;
                log::debug!("{}: all transmitting buffers in NIC are busy", self.name());
                return Err(NicError::Busy);
            }
        };
        let page = self.sendq.slots[index].page;

        self.put_block(RingLayout::page_address(page), frame)?;

        // The bytes must be in card RAM before TXP points the chip at them.
        self.wait_remote_dma_complete()?;

        self.sendq.commit(index);
        self.start_transmit(page, size);
        self.stats.tx_packets += 1;

        log::trace!(
            "{}: queued {} bytes in slot {} (page 0x{:02x})",
            self.name(),
            size,
            index,
            page
        );
        Ok(size)
    }

    fn wait_remote_dma_complete(&mut self) -> Result<()> {
        for _ in 0..self.config.dma_poll_limit {
            if self.interrupt_status().contains(InterruptStatus::RDC) {
                self.acknowledge(InterruptStatus::RDC);
                return Ok(());
            }
            core::hint::spin_loop();
        }
        log::warn!("{}: remote DMA write did not complete", self.name());
        Err(NicError::Timeout(PollTarget::RemoteDmaComplete))
    }

    /// TPSR and TBCR must be set before TXP [12, 19]
    fn start_transmit(&mut self, page: u8, size: usize) {
        self.write_reg(Page0Write::Tpsr, page);
        self.write_reg(Page0Write::Tbcr0, (size & 0xFF) as u8);
        self.write_reg(Page0Write::Tbcr1, ((size >> 8) & 0xFF) as u8);
        self.command(Command::PAGE_0 | Command::NO_DMA | Command::STA | Command::TXP);
    }
}
