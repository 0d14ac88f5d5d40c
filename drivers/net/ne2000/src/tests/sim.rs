//! Simulated NE2000 card
//!
//! Models the parts of the DP8390 the driver talks to: paged registers,
//! remote DMA through the data port, the station PROM at card address 0,
//! the receive ring, tally counters and the ASIC reset port. Ports outside
//! the card's 32-byte window read as a floating bus.

use alloc::rc::Rc;
use alloc::vec;
use alloc::vec::Vec;
use core::cell::RefCell;

use crate::io::PortIo;

const CARD_MEMORY: usize = 0x10000;

const ISR_PRX: u8 = 0x01;
const ISR_PTX: u8 = 0x02;
const ISR_RDC: u8 = 0x40;
const ISR_RST: u8 = 0x80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dma {
    Read,
    Write,
}

/// A register write as seen on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusWrite {
    pub page: u8,
    pub offset: u16,
    pub value: u8,
}

pub struct SimState {
    base: u16,
    pub mem: Vec<u8>,
    pub cr: u8,
    pub pstart: u8,
    pub pstop: u8,
    pub bnry: u8,
    pub tpsr: u8,
    pub tbcr: u16,
    pub rsar: u16,
    pub rbcr: u16,
    pub rcr: u8,
    pub tcr: u8,
    pub dcr: u8,
    pub imr: u8,
    pub isr: u8,
    pub curr: u8,
    pub par: [u8; 6],
    pub mar: [u8; 8],
    pub cntr: [u8; 3],
    crda: u16,
    remaining: u16,
    dma: Option<Dma>,
    /// Reset bit shows up after a reset pulse
    pub reset_completes: bool,
    /// CNTR0 reads back whatever was written to its offset
    pub not_dp8390: bool,
    /// CRDA reads return this instead of the live address
    pub frozen_crda: Option<u16>,
    /// Remote DMA never raises RDC
    pub suppress_rdc: bool,
    pub writes: Vec<BusWrite>,
    pub transmitted: Vec<Vec<u8>>,
    pub resets: usize,
}

impl SimState {
    fn new(base: u16) -> Self {
        Self {
            base,
            mem: vec![0; CARD_MEMORY],
            cr: 0x21,
            pstart: 0,
            pstop: 0,
            bnry: 0,
            tpsr: 0,
            tbcr: 0,
            rsar: 0,
            rbcr: 0,
            rcr: 0,
            tcr: 0,
            dcr: 0,
            imr: 0,
            isr: 0,
            curr: 0,
            par: [0; 6],
            mar: [0; 8],
            cntr: [0; 3],
            crda: 0,
            remaining: 0,
            dma: None,
            reset_completes: true,
            not_dp8390: false,
            frozen_crda: None,
            suppress_rdc: false,
            writes: Vec::new(),
            transmitted: Vec::new(),
            resets: 0,
        }
    }

    fn page(&self) -> u8 {
        self.cr >> 6
    }

    fn reset(&mut self) {
        self.resets += 1;
        self.cr = 0x21;
        self.dma = None;
        if self.reset_completes {
            self.isr |= ISR_RST;
        }
    }

    fn dma_step(&mut self) {
        self.crda = self.crda.wrapping_add(1);
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.dma = None;
            if !self.suppress_rdc {
                self.isr |= ISR_RDC;
            }
        }
    }

    fn read_data(&mut self) -> u8 {
        let value = self.mem[self.crda as usize];
        if self.dma == Some(Dma::Read) {
            self.dma_step();
        }
        value
    }

    fn write_data(&mut self, value: u8) {
        if self.dma == Some(Dma::Write) {
            self.mem[self.crda as usize] = value;
            self.dma_step();
        }
    }

    fn write_command(&mut self, value: u8) {
        if value & 0x04 != 0 {
            let start = self.tpsr as usize * 256;
            self.transmitted
                .push(self.mem[start..start + self.tbcr as usize].to_vec());
        }
        match value & 0x38 {
            0x08 => self.start_dma(Dma::Read),
            0x10 => self.start_dma(Dma::Write),
            _ => self.dma = None,
        }
        self.cr = value & !0x04;
    }

    fn start_dma(&mut self, mode: Dma) {
        self.crda = self.rsar;
        self.remaining = self.rbcr;
        self.dma = Some(mode);
    }

    fn read_register(&mut self, offset: u16) -> u8 {
        if offset == 0 {
            return self.cr;
        }
        match (self.page(), offset) {
            (0, 0x03) => self.bnry,
            (0, 0x07) => self.isr,
            (0, 0x08) => (self.frozen_crda.unwrap_or(self.crda) & 0xFF) as u8,
            (0, 0x09) => (self.frozen_crda.unwrap_or(self.crda) >> 8) as u8,
            (0, 0x0D) if self.not_dp8390 => self.mar[5],
            (0, 0x0D..=0x0F) => {
                let i = (offset - 0x0D) as usize;
                core::mem::take(&mut self.cntr[i])
            }
            (1, 0x01..=0x06) => self.par[offset as usize - 1],
            (1, 0x07) => self.curr,
            (1, 0x08..=0x0F) => self.mar[offset as usize - 8],
            _ => 0,
        }
    }

    fn write_register(&mut self, offset: u16, value: u8) {
        self.writes.push(BusWrite { page: self.page(), offset, value });
        if offset == 0 {
            self.write_command(value);
            return;
        }
        match (self.page(), offset) {
            (0, 0x01) => self.pstart = value,
            (0, 0x02) => self.pstop = value,
            (0, 0x03) => self.bnry = value,
            (0, 0x04) => self.tpsr = value,
            (0, 0x05) => self.tbcr = (self.tbcr & 0xFF00) | value as u16,
            (0, 0x06) => self.tbcr = (self.tbcr & 0x00FF) | ((value as u16) << 8),
            (0, 0x07) => self.isr &= !value,
            (0, 0x08) => self.rsar = (self.rsar & 0xFF00) | value as u16,
            (0, 0x09) => self.rsar = (self.rsar & 0x00FF) | ((value as u16) << 8),
            (0, 0x0A) => self.rbcr = (self.rbcr & 0xFF00) | value as u16,
            (0, 0x0B) => self.rbcr = (self.rbcr & 0x00FF) | ((value as u16) << 8),
            (0, 0x0C) => self.rcr = value,
            (0, 0x0D) => self.tcr = value,
            (0, 0x0E) => self.dcr = value,
            (0, 0x0F) => self.imr = value,
            (1, 0x01..=0x06) => self.par[offset as usize - 1] = value,
            (1, 0x07) => self.curr = value,
            (1, 0x08..=0x0F) => self.mar[offset as usize - 8] = value,
            _ => {}
        }
    }

    fn window(&self, port: u16) -> Option<u16> {
        port.checked_sub(self.base).filter(|offset| *offset < 0x20)
    }

    fn ring_write(&mut self, mut addr: usize, bytes: &[u8]) {
        let start = self.pstart as usize * 256;
        let stop = self.pstop as usize * 256;
        for &b in bytes {
            self.mem[addr] = b;
            addr += 1;
            if addr == stop {
                addr = start;
            }
        }
    }
}

/// Shared handle to a simulated card
#[derive(Clone)]
pub struct SimCard {
    state: Rc<RefCell<SimState>>,
}

impl SimCard {
    /// 16-bit card: every PROM byte stored twice
    pub fn ne2000(base: u16, mac: [u8; 6]) -> Self {
        let card = Self::blank(base);
        {
            let mut s = card.state.borrow_mut();
            let prom = prom_bytes(mac);
            for (i, &b) in prom.iter().enumerate() {
                s.mem[i * 2] = b;
                s.mem[i * 2 + 1] = b;
            }
        }
        card
    }

    /// 8-bit card: PROM bytes stored once
    pub fn ne1000(base: u16, mac: [u8; 6]) -> Self {
        let card = Self::blank(base);
        card.state.borrow_mut().mem[..16].copy_from_slice(&prom_bytes(mac));
        card
    }

    /// A card whose PROM lacks the 0x57 0x57 signature
    pub fn unsigned(base: u16, mac: [u8; 6]) -> Self {
        let card = Self::ne2000(base, mac);
        card.state.borrow_mut().mem[30] = 0x00;
        card.state.borrow_mut().mem[31] = 0x00;
        card
    }

    /// Nothing on the bus at all
    pub fn absent() -> Self {
        Self::blank(0)
    }

    fn blank(base: u16) -> Self {
        let mut state = SimState::new(base);
        if base == 0 {
            state.base = u16::MAX;
        }
        Self { state: Rc::new(RefCell::new(state)) }
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut SimState) -> R) -> R {
        f(&mut self.state.borrow_mut())
    }

    /// Raise the packet-transmitted interrupt
    pub fn complete_transmit(&self) {
        self.with(|s| s.isr |= ISR_PTX);
    }

    /// Store a received frame at CURR, as the chip would
    pub fn inject_frame(&self, payload: &[u8]) -> u8 {
        self.inject_raw(0x01, (payload.len() + 4) as u16, payload)
    }

    /// Store a frame with an arbitrary header; returns its page
    pub fn inject_raw(&self, status: u8, byte_count: u16, payload: &[u8]) -> u8 {
        self.with(|s| {
            let page = s.curr;
            let pages = (payload.len() + 4 + 255) / 256;
            let mut next = page as usize + pages;
            if next >= s.pstop as usize {
                next = next - s.pstop as usize + s.pstart as usize;
            }
            let [lo, hi] = byte_count.to_le_bytes();
            let addr = page as usize * 256;
            s.ring_write(addr, &[status, next as u8, lo, hi]);
            let start = s.pstart as usize * 256;
            let data = if addr + 4 == s.pstop as usize * 256 { start } else { addr + 4 };
            s.ring_write(data, payload);
            s.curr = next as u8;
            s.isr |= ISR_PRX;
            page
        })
    }

    /// Place the empty ring so the next frame lands at `page`
    pub fn set_ring_position(&self, page: u8) {
        self.with(|s| {
            s.curr = page;
            s.bnry = if page == s.pstart { s.pstop - 1 } else { page - 1 };
        });
    }

    pub fn bnry(&self) -> u8 {
        self.with(|s| s.bnry)
    }

    pub fn curr(&self) -> u8 {
        self.with(|s| s.curr)
    }

    pub fn transmitted(&self) -> Vec<Vec<u8>> {
        self.with(|s| s.transmitted.clone())
    }

    pub fn writes(&self) -> Vec<BusWrite> {
        self.with(|s| s.writes.clone())
    }

    pub fn clear_writes(&self) {
        self.with(|s| s.writes.clear());
    }

    pub fn memory(&self, addr: usize, len: usize) -> Vec<u8> {
        self.with(|s| s.mem[addr..addr + len].to_vec())
    }
}

impl PortIo for SimCard {
    fn read_u8(&mut self, port: u16) -> u8 {
        let mut s = self.state.borrow_mut();
        match s.window(port) {
            None => 0xFF,
            Some(offset @ 0x00..=0x0F) => s.read_register(offset),
            Some(0x10..=0x17) => s.read_data(),
            Some(_) => 0x00,
        }
    }

    fn write_u8(&mut self, port: u16, value: u8) {
        let mut s = self.state.borrow_mut();
        match s.window(port) {
            None => {}
            Some(offset @ 0x00..=0x0F) => s.write_register(offset, value),
            Some(0x10..=0x17) => s.write_data(value),
            Some(_) => s.reset(),
        }
    }

    fn read_u16(&mut self, port: u16) -> u16 {
        let low = self.read_u8(port) as u16;
        let high = self.read_u8(port) as u16;
        (high << 8) | low
    }

    fn write_u16(&mut self, port: u16, value: u16) {
        let [low, high] = value.to_le_bytes();
        self.write_u8(port, low);
        self.write_u8(port, high);
    }
}

fn prom_bytes(mac: [u8; 6]) -> [u8; 16] {
    let mut prom = [0u8; 16];
    prom[..6].copy_from_slice(&mac);
    prom[14] = 0x57;
    prom[15] = 0x57;
    prom
}
