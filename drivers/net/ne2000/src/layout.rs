//! Card RAM layout
//!
//! The on-board RAM is split in whole pages: `SENDQ_LEN` transmit slots of
//! `SENDQ_PAGES` pages each at the bottom, the receive ring above them up
//! to the end of RAM.

use crate::config::{
    NE1000_SIZE, NE1000_START, NE2000_SIZE, NE2000_START, PAGE_SIZE, SENDQ_LEN, SENDQ_PAGES,
};

/// Page-granular layout derived from the bus width
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingLayout {
    pub ram_size: usize,
    pub start_address: u16,
    pub total_pages: usize,
    pub send_start_page: u8,
    pub send_stop_page: u8,
    /// PSTART
    pub recv_start_page: u8,
    /// PSTOP, one past the last ring page
    pub recv_stop_page: u8,
}

impl RingLayout {
    pub const fn for_bus(wide: bool) -> Self {
        let (ram_size, start_address) = if wide {
            (NE2000_SIZE, NE2000_START)
        } else {
            (NE1000_SIZE, NE1000_START)
        };

        let total_pages = ram_size / PAGE_SIZE;
        let send_start_page = start_address as usize / PAGE_SIZE;
        let send_stop_page = send_start_page + SENDQ_PAGES * SENDQ_LEN - 1;

        Self {
            ram_size,
            start_address,
            total_pages,
            send_start_page: send_start_page as u8,
            send_stop_page: send_stop_page as u8,
            recv_start_page: (send_stop_page + 1) as u8,
            recv_stop_page: (send_start_page + total_pages) as u8,
        }
    }

    /// First page of transmit slot `index`
    pub fn slot_page(&self, index: usize) -> u8 {
        self.send_start_page + (index * SENDQ_PAGES) as u8
    }

    /// Number of pages in the receive ring
    pub fn recv_pages(&self) -> usize {
        (self.recv_stop_page - self.recv_start_page) as usize
    }

    /// Card address of the first byte of `page`
    pub fn page_address(page: u8) -> u16 {
        page as u16 * PAGE_SIZE as u16
    }

    /// Ring page following `page`, wrapping at PSTOP
    pub fn next_recv_page(&self, page: u8) -> u8 {
        let next = page.wrapping_add(1);
        if next >= self.recv_stop_page || next < self.recv_start_page {
            self.recv_start_page
        } else {
            next
        }
    }
}
