//! NIC context and register protocol
//!
//! [`Ne2000`] owns everything the driver knows about one card: addressing,
//! the layout chosen for its RAM, the transmit slot bookkeeping and the
//! port I/O backend. Every register access goes through the helpers here,
//! which keep track of the page last selected in CR.

use alloc::string::String;
use core::fmt;

use crate::config::Ne2000Config;
use crate::error::{NicError, Result};
use crate::io::PortIo;
use crate::layout::RingLayout;
use crate::regs::{
    Command, DataConfig, InterruptMask, InterruptStatus, Page0Read, Page0Write, Page1,
    Readable, ReceiveConfig, RegisterPage, TransmitConfig, Writable, CR, NE_DATA, NE_RESET,
};
use crate::sendq::SendQueue;

/// 48-bit station address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            m[0], m[1], m[2], m[3], m[4], m[5]
        )
    }
}

/// Bring-up state of a card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NicState {
    /// Not probed, or probe failed
    Detached,
    /// PROM read, width known, chip still in loopback
    Probed,
    /// Rings programmed, transmitter and receiver enabled
    Running,
}

/// Driver counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NicStats {
    pub tx_packets: u64,
    pub rx_packets: u64,
    pub tx_busy: u64,
    pub tx_errors: u64,
    pub rx_errors: u64,
    pub rx_malformed: u64,
    pub overwrites: u64,
    pub frame_alignment_errors: u64,
    pub crc_errors: u64,
    pub missed_packets: u64,
}

/// One step of a fixed register programming sequence
#[derive(Debug, Clone, Copy)]
pub(crate) enum RegWrite {
    Cmd(Command),
    P0(Page0Write, u8),
    P1(Page1, u8),
}

/// NE2000 driver state for one card
pub struct Ne2000<P: PortIo> {
    name: String,
    base: u16,
    irq: u8,
    pub(crate) io: P,
    pub(crate) config: Ne2000Config,
    pub(crate) state: NicState,
    /// Page selected by the last CR write
    page: RegisterPage,
    pub(crate) wide_bus: bool,
    pub(crate) mac: MacAddress,
    pub(crate) layout: RingLayout,
    pub(crate) sendq: SendQueue,
    pub(crate) stats: NicStats,
}

impl<P: PortIo> Ne2000<P> {
    /// Create an undetected context for the card expected at `base`
    pub fn new(name: &str, base: u16, irq: u8, io: P, config: Ne2000Config) -> Self {
        Self {
            name: String::from(name),
            base,
            irq,
            io,
            config,
            state: NicState::Detached,
            page: RegisterPage::Page0,
            wide_bus: false,
            mac: MacAddress::default(),
            layout: RingLayout::for_bus(false),
            sendq: SendQueue::new(),
            stats: NicStats::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_port(&self) -> u16 {
        self.base
    }

    pub fn irq(&self) -> u8 {
        self.irq
    }

    pub fn state(&self) -> NicState {
        self.state
    }

    pub fn is_wide_bus(&self) -> bool {
        self.wide_bus
    }

    pub fn mac_address(&self) -> MacAddress {
        self.mac
    }

    pub fn layout(&self) -> &RingLayout {
        &self.layout
    }

    pub fn stats(&self) -> &NicStats {
        &self.stats
    }

    pub fn send_queue(&self) -> &SendQueue {
        &self.sendq
    }

    /// Port I/O backend
    pub fn io(&self) -> &P {
        &self.io
    }

    pub fn io_mut(&mut self) -> &mut P {
        &mut self.io
    }

    pub(crate) fn ensure_running(&self) -> Result<()> {
        if self.state == NicState::Running {
            Ok(())
        } else {
            Err(NicError::NotReady)
        }
    }

    // ---------------------------------------------------------------------
    // Register protocol
    // ---------------------------------------------------------------------

    /// Write CR and remember which page it selects
    #[inline]
    pub(crate) fn command(&mut self, cmd: Command) {
        self.io.write_u8(self.base + CR, cmd.bits());
        self.page = RegisterPage::from_command(cmd);
    }

    /// Raw CR read
    #[inline]
    pub(crate) fn read_command(&mut self) -> u8 {
        self.io.read_u8(self.base + CR)
    }

    #[inline]
    pub(crate) fn read_reg<R: Readable>(&mut self, reg: R) -> u8 {
        debug_assert_eq!(R::PAGE, self.page, "register read on the wrong page");
        self.io.read_u8(self.base + reg.offset())
    }

    #[inline]
    pub(crate) fn write_reg<R: Writable>(&mut self, reg: R, value: u8) {
        debug_assert_eq!(R::PAGE, self.page, "register write on the wrong page");
        self.io.write_u8(self.base + reg.offset(), value);
    }

    pub(crate) fn interrupt_status(&mut self) -> InterruptStatus {
        InterruptStatus::from_bits_retain(self.read_reg(Page0Read::Isr))
    }

    /// Clear ISR bits by writing them back
    pub(crate) fn acknowledge(&mut self, bits: InterruptStatus) {
        self.write_reg(Page0Write::Isr, bits.bits());
    }

    #[inline]
    pub(crate) fn read_data_u8(&mut self) -> u8 {
        self.io.read_u8(self.base + NE_DATA)
    }

    #[inline]
    pub(crate) fn read_data_u16(&mut self) -> u16 {
        self.io.read_u16(self.base + NE_DATA)
    }

    #[inline]
    pub(crate) fn write_data_u8(&mut self, value: u8) {
        self.io.write_u8(self.base + NE_DATA, value);
    }

    #[inline]
    pub(crate) fn write_data_u16(&mut self, value: u16) {
        self.io.write_u16(self.base + NE_DATA, value);
    }

    /// Pulse the ASIC reset line
    pub(crate) fn pulse_reset(&mut self) {
        let value = self.io.read_u8(self.base + NE_RESET);
        self.io.write_u8(self.base + NE_RESET, value);
        // The chip comes out of reset stopped, on page 0.
        self.page = RegisterPage::Page0;
    }

    /// Select page 0 with the chip running, if another page is active
    pub(crate) fn select_page0(&mut self) {
        if self.page != RegisterPage::Page0 {
            self.command(Command::PAGE_0 | Command::NO_DMA | Command::STA);
        }
    }

    /// Apply a fixed programming sequence in order
    pub(crate) fn run_sequence(&mut self, steps: &[RegWrite]) {
        for step in steps {
            match *step {
                RegWrite::Cmd(cmd) => self.command(cmd),
                RegWrite::P0(reg, value) => self.write_reg(reg, value),
                RegWrite::P1(reg, value) => self.write_reg(reg, value),
            }
        }
    }

    // ---------------------------------------------------------------------
    // Initialization
    // ---------------------------------------------------------------------

    /// Lay out card RAM and bring the chip online [29]
    pub fn init(&mut self) -> Result<()> {
        if self.state == NicState::Detached {
            return Err(NicError::NotReady);
        }

        self.layout = RingLayout::for_bus(self.wide_bus);
        self.sendq.reset(&self.layout);

        log::info!(
            "{}: NE{}000 ({}kB RAM) at 0x{:x}:{} - {}",
            self.name,
            if self.wide_bus { 2 } else { 1 },
            self.layout.ram_size / 1024,
            self.base,
            self.irq,
            self.mac
        );

        let layout = self.layout;
        let width = if self.wide_bus { DataConfig::WTS } else { DataConfig::BYTE_WIDE };
        let dcr = width | DataConfig::LITTLE_ENDIAN | DataConfig::FIFO_8_BYTES | DataConfig::LS;
        let imr = InterruptMask::PRXE
            | InterruptMask::PTXE
            | InterruptMask::RXEE
            | InterruptMask::TXEE
            | InterruptMask::OVWE
            | InterruptMask::CNTE;
        let mac = self.mac.0;

        let sequence = [
            // 1. Stop the chip, page 0, abort remote DMA
            RegWrite::Cmd(Command::PAGE_0 | Command::STP | Command::NO_DMA),
            // 2. Bus width and FIFO threshold
            RegWrite::P0(Page0Write::Dcr, dcr.bits()),
            // 3. Drop everything while the rings are set up
            RegWrite::P0(Page0Write::Rcr, ReceiveConfig::MON.bits()),
            // 4. No remote DMA in progress
            RegWrite::P0(Page0Write::Rbcr0, 0),
            RegWrite::P0(Page0Write::Rbcr1, 0),
            // 5. Internal loopback until started
            RegWrite::P0(Page0Write::Tcr, TransmitConfig::INTERNAL_LOOPBACK.bits()),
            // 6. Receive ring [10], BNRY one page behind CURR
            RegWrite::P0(Page0Write::Pstart, layout.recv_start_page),
            RegWrite::P0(Page0Write::Pstop, layout.recv_stop_page),
            RegWrite::P0(Page0Write::Bnry, layout.recv_start_page),
            // 7. Clear pending status, 8. unmask
            RegWrite::P0(Page0Write::Isr, 0xFF),
            RegWrite::P0(Page0Write::Imr, imr.bits()),
            // 9. Station address, accept all multicast, CURR
            RegWrite::Cmd(Command::PAGE_1 | Command::NO_DMA),
            RegWrite::P1(Page1::Par0, mac[0]),
            RegWrite::P1(Page1::Par1, mac[1]),
            RegWrite::P1(Page1::Par2, mac[2]),
            RegWrite::P1(Page1::Par3, mac[3]),
            RegWrite::P1(Page1::Par4, mac[4]),
            RegWrite::P1(Page1::Par5, mac[5]),
            RegWrite::P1(Page1::Mar0, 0xFF),
            RegWrite::P1(Page1::Mar1, 0xFF),
            RegWrite::P1(Page1::Mar2, 0xFF),
            RegWrite::P1(Page1::Mar3, 0xFF),
            RegWrite::P1(Page1::Mar4, 0xFF),
            RegWrite::P1(Page1::Mar5, 0xFF),
            RegWrite::P1(Page1::Mar6, 0xFF),
            RegWrite::P1(Page1::Mar7, 0xFF),
            RegWrite::P1(Page1::Curr, layout.recv_start_page + 1),
            // 10. Start, remote DMA idle
            RegWrite::Cmd(Command::PAGE_0 | Command::STA | Command::NO_DMA),
            // 11. Only once started: leave loopback, accept everything
            RegWrite::P0(Page0Write::Tcr, TransmitConfig::NORMAL.bits()),
            RegWrite::P0(Page0Write::Rcr, ReceiveConfig::PRO.bits()),
        ];
        self.run_sequence(&sequence);

        self.state = NicState::Running;
        Ok(())
    }
}

impl<P: PortIo> fmt::Debug for Ne2000<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ne2000")
            .field("name", &self.name)
            .field("base", &format_args!("0x{:x}", self.base))
            .field("irq", &self.irq)
            .field("state", &self.state)
            .field("wide_bus", &self.wide_bus)
            .field("mac", &self.mac)
            .finish()
    }
}
