//! Receive path
//!
//! The chip stores incoming frames in the ring between PSTART and PSTOP,
//! each prefixed by a 4-byte header [11]. CURR is the next page the chip
//! writes, BNRY the page before the next one the host reads; the ring is
//! empty when BNRY + 1 (wrapped) equals CURR. Both live only in the chip,
//! so every receive re-reads them.

use zerocopy::{AsBytes, FromBytes, FromZeroes, Unaligned};

use crate::config::{ETH_MAX_SIZE, ETH_MIN_SIZE, PAGE_SIZE};
use crate::error::{NicError, Result};
use crate::io::PortIo;
use crate::layout::RingLayout;
use crate::nic::Ne2000;
use crate::regs::{Command, Page0Read, Page0Write, Page1, ReceiveStatus};

/// Header the chip writes in front of every received frame
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, FromZeroes, FromBytes, AsBytes, Unaligned)]
pub struct PacketHeader {
    /// Receive status (RSR at the time the frame was stored)
    pub status: u8,
    /// Page of the frame that follows
    pub next: u8,
    pub rbc0: u8,
    pub rbc1: u8,
}

impl PacketHeader {
    pub const SIZE: usize = core::mem::size_of::<PacketHeader>();

    pub fn new(status: ReceiveStatus, next: u8, byte_count: u16) -> Self {
        let [rbc0, rbc1] = byte_count.to_le_bytes();
        Self { status: status.bits(), next, rbc0, rbc1 }
    }

    /// Stored length, header included
    pub fn byte_count(&self) -> u16 {
        u16::from_le_bytes([self.rbc0, self.rbc1])
    }

    /// Frame length without the header
    pub fn payload_size(&self) -> usize {
        (self.byte_count() as usize).saturating_sub(Self::SIZE)
    }

    pub fn receive_status(&self) -> ReceiveStatus {
        ReceiveStatus::from_bits_retain(self.status)
    }

    pub fn is_intact(&self) -> bool {
        self.receive_status().contains(ReceiveStatus::PRX)
    }
}

static_assertions::const_assert_eq!(PacketHeader::SIZE, 4);

/// Outcome of a successful `receive`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecvStatus {
    /// Frame copied into the buffer and released to the chip
    Received(usize),
    /// Buffer too small for the pending frame; nothing was consumed
    NeedsBuffer(usize),
}

impl<P: PortIo> Ne2000<P> {
    /// Copy the oldest unread frame into `buf`
    pub fn receive(&mut self, buf: &mut [u8]) -> Result<RecvStatus> {
        self.ensure_running()?;
        let layout = self.layout;

        self.command(Command::PAGE_1 | Command::NO_DMA | Command::STA);
        let curr = self.read_reg(Page1::Curr);
        self.command(Command::PAGE_0 | Command::NO_DMA | Command::STA);
        let bnry = self.read_reg(Page0Read::Bnry);

        let page = layout.next_recv_page(bnry);
        if page == curr {
            log::trace!("{}: no packet to read", self.name());
            return Err(NicError::Empty);
        }

        let header = self.read_header(page)?;
        let size = header.payload_size();

        if !(ETH_MIN_SIZE..=ETH_MAX_SIZE).contains(&size) || !header.is_intact() {
            self.stats.rx_malformed += 1;
            log::warn!(
                "{}: bad packet at page 0x{:02x}: status 0x{:02x}, next 0x{:02x}, length {}",
                self.name(),
                page,
                header.status,
                header.next,
                size
            );
            return Err(NicError::Malformed {
                status: header.status,
                next: header.next,
                length: size,
            });
        }

        if buf.len() < size {
            return Ok(RecvStatus::NeedsBuffer(size));
        }

        let data = RingLayout::page_address(page) + PacketHeader::SIZE as u16;
        let to_end = (layout.recv_stop_page - page) as usize * PAGE_SIZE - PacketHeader::SIZE;
        if size > to_end {
            self.get_block(data, &mut buf[..to_end])?;
            self.get_block(
                RingLayout::page_address(layout.recv_start_page),
                &mut buf[to_end..size],
            )?;
        } else {
            self.get_block(data, &mut buf[..size])?;
        }

        self.release_to(&header);
        self.stats.rx_packets += 1;

        log::trace!("{}: received {} bytes from page 0x{:02x}", self.name(), size, page);
        Ok(RecvStatus::Received(size))
    }

    fn read_header(&mut self, page: u8) -> Result<PacketHeader> {
        let mut header = PacketHeader::new_zeroed();
        self.get_block(RingLayout::page_address(page), header.as_bytes_mut())?;
        Ok(header)
    }

    /// Move BNRY to the page before `header.next`
    fn release_to(&mut self, header: &PacketHeader) {
        let layout = self.layout;
        let bnry = header.next.wrapping_sub(1);
        let bnry = if bnry < layout.recv_start_page || bnry >= layout.recv_stop_page {
            layout.recv_stop_page - 1
        } else {
            bnry
        };
        self.write_reg(Page0Write::Bnry, bnry);
    }
}
