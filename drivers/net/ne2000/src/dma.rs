//! Remote DMA
//!
//! Card RAM is only reachable through the Remote DMA engine: program a
//! start address and byte count, start a read or write, then stream the
//! bytes through the data port. Each byte moved decrements RBCR and
//! increments RSAR; ISR.RDC is raised when the count reaches zero [13].

use crate::error::{NicError, PollTarget, Result};
use crate::io::PortIo;
use crate::nic::Ne2000;
use crate::regs::{Command, InterruptStatus, Page0Read, Page0Write};

/// Direction of a remote DMA transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteDma {
    Read,
    Write,
}

impl RemoteDma {
    fn command(self) -> Command {
        match self {
            RemoteDma::Read => Command::REMOTE_READ,
            RemoteDma::Write => Command::REMOTE_WRITE,
        }
    }
}

/// Bytes read by the write handshake
const DUMMY_READ_SIZE: usize = 4;

impl<P: PortIo> Ne2000<P> {
    /// Program RSAR/RBCR and start a remote DMA transfer
    ///
    /// Writes first need a Port ReQuest [13-14]: a short dummy read is
    /// issued and the current remote DMA address polled until it moves.
    pub(crate) fn setup_remote_dma(
        &mut self,
        mode: RemoteDma,
        addr: u16,
        size: usize,
    ) -> Result<()> {
        self.select_page0();

        if mode == RemoteDma::Write {
            let before = self.current_remote_address();
            let mut dummy = [0u8; DUMMY_READ_SIZE];
            let scratch = self.layout.start_address - DUMMY_READ_SIZE as u16;
            self.get_block(scratch, &mut dummy)?;

            let mut moved = false;
            for _ in 0..self.config.dma_poll_limit {
                if self.current_remote_address() != before {
                    moved = true;
                    break;
                }
                core::hint::spin_loop();
            }
            if !moved {
                log::warn!("{}: remote DMA address stuck at 0x{:04x}", self.name(), before);
                return Err(NicError::Timeout(PollTarget::RemoteDmaAddress));
            }

            // The dummy read raised RDC; the completion gate must only see the write.
            self.acknowledge(InterruptStatus::RDC);
        }

        let count = self.dma_count(size);
        self.write_reg(Page0Write::Rsar0, (addr & 0xFF) as u8);
        self.write_reg(Page0Write::Rsar1, (addr >> 8) as u8);
        self.write_reg(Page0Write::Rbcr0, (count & 0xFF) as u8);
        self.write_reg(Page0Write::Rbcr1, ((count >> 8) & 0xFF) as u8);
        self.command(mode.command() | Command::PAGE_0 | Command::STA);
        Ok(())
    }

    /// Read `buf.len()` bytes of card RAM starting at `addr`
    pub(crate) fn get_block(&mut self, addr: u16, buf: &mut [u8]) -> Result<()> {
        self.setup_remote_dma(RemoteDma::Read, addr, buf.len())?;

        if self.wide_bus {
            let mut words = buf.chunks_exact_mut(2);
            for pair in &mut words {
                pair.copy_from_slice(&self.read_data_u16().to_le_bytes());
            }
            if let [last] = words.into_remainder() {
                *last = self.read_data_u16().to_le_bytes()[0];
            }
        } else {
            for byte in buf.iter_mut() {
                *byte = self.read_data_u8();
            }
        }
        Ok(())
    }

    /// Write `data` into card RAM starting at `addr`
    pub(crate) fn put_block(&mut self, addr: u16, data: &[u8]) -> Result<()> {
        self.setup_remote_dma(RemoteDma::Write, addr, data.len())?;

        if self.wide_bus {
            let mut words = data.chunks_exact(2);
            for pair in &mut words {
                self.write_data_u16(u16::from_le_bytes([pair[0], pair[1]]));
            }
            if let [last] = words.remainder() {
                self.write_data_u16(*last as u16);
            }
        } else {
            for &byte in data {
                self.write_data_u8(byte);
            }
        }
        Ok(())
    }

    /// CRDA1:CRDA0
    fn current_remote_address(&mut self) -> u16 {
        let low = self.read_reg(Page0Read::Crda0) as u16;
        let high = self.read_reg(Page0Read::Crda1) as u16;
        (high << 8) | low
    }

    /// Word transfers move whole words, so the count is rounded up
    fn dma_count(&self, size: usize) -> usize {
        if self.wide_bus {
            (size + 1) & !1
        } else {
            size
        }
    }
}
