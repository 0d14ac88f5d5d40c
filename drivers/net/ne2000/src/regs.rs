//! DP8390 register map
//!
//! The sixteen offsets above the base port name different registers
//! depending on the page selected in CR bits PS0/PS1, and page 0 maps a
//! different register for reads than for writes at most offsets. Each set
//! gets its own enum so a page-0 write register can never be read and a
//! page-1 register can never be written while page 0 is selected.

use bitflags::bitflags;

/// Register page selected through CR.PS1..PS0 [17]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterPage {
    Page0,
    Page1,
    Page2,
}

impl RegisterPage {
    /// Page encoded in a command register value
    pub fn from_command(cmd: Command) -> Self {
        match (cmd & Command::PAGE_MASK).bits() {
            0x00 => RegisterPage::Page0,
            0x40 => RegisterPage::Page1,
            _ => RegisterPage::Page2,
        }
    }
}

/// Identifies a paged register
pub trait Register: Copy {
    const PAGE: RegisterPage;

    fn offset(self) -> u16;
}

/// Registers that can be read
pub trait Readable: Register {}

/// Registers that can be written
pub trait Writable: Register {}

/// Page 0 read registers [18]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page0Read {
    Clda0 = 0x01,   // Current Local DMA Address 0
    Clda1 = 0x02,   // Current Local DMA Address 1
    Bnry = 0x03,    // Boundary Pointer
    Tsr = 0x04,     // Transmit Status
    Ncr = 0x05,     // Number of Collisions
    Fifo = 0x06,
    Isr = 0x07,     // Interrupt Status
    Crda0 = 0x08,   // Current Remote DMA Address 0
    Crda1 = 0x09,   // Current Remote DMA Address 1
    Rsr = 0x0C,     // Receive Status
    Cntr0 = 0x0D,   // Tally: frame alignment errors
    Cntr1 = 0x0E,   // Tally: CRC errors
    Cntr2 = 0x0F,   // Tally: missed packets
}

/// Page 0 write registers [18]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page0Write {
    Pstart = 0x01,  // Page Start
    Pstop = 0x02,   // Page Stop
    Bnry = 0x03,    // Boundary Pointer
    Tpsr = 0x04,    // Transmit Page Start
    Tbcr0 = 0x05,   // Transmit Byte Count 0
    Tbcr1 = 0x06,   // Transmit Byte Count 1
    Isr = 0x07,     // Interrupt Status (write 1 to clear)
    Rsar0 = 0x08,   // Remote Start Address 0
    Rsar1 = 0x09,   // Remote Start Address 1
    Rbcr0 = 0x0A,   // Remote Byte Count 0
    Rbcr1 = 0x0B,   // Remote Byte Count 1
    Rcr = 0x0C,     // Receive Configuration
    Tcr = 0x0D,     // Transmit Configuration
    Dcr = 0x0E,     // Data Configuration
    Imr = 0x0F,     // Interrupt Mask
}

/// Page 1 registers, read and write [18]
///
/// MAR5 shares its offset with CNTR0 on page 0, which the probe relies on.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page1 {
    Par0 = 0x01,
    Par1 = 0x02,
    Par2 = 0x03,
    Par3 = 0x04,
    Par4 = 0x05,
    Par5 = 0x06,
    Curr = 0x07,    // Current Page
    Mar0 = 0x08,
    Mar1 = 0x09,
    Mar2 = 0x0A,
    Mar3 = 0x0B,
    Mar4 = 0x0C,
    Mar5 = 0x0D,
    Mar6 = 0x0E,
    Mar7 = 0x0F,
}

macro_rules! register {
    ($ty:ty, $page:expr) => {
        impl Register for $ty {
            const PAGE: RegisterPage = $page;

            #[inline]
            fn offset(self) -> u16 {
                self as u16
            }
        }
    };
}

register!(Page0Read, RegisterPage::Page0);
register!(Page0Write, RegisterPage::Page0);
register!(Page1, RegisterPage::Page1);

impl Readable for Page0Read {}
impl Writable for Page0Write {}
impl Readable for Page1 {}
impl Writable for Page1 {}

/// Command register, present on every page
pub const CR: u16 = 0x00;

/// NE2000 ASIC data port (remote DMA window)
pub const NE_DATA: u16 = 0x10;

/// NE2000 ASIC reset port
pub const NE_RESET: u16 = 0x1F;

bitflags! {
    /// Command Register [19]
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Command: u8 {
        const STP = 0x01;           // Stop
        const STA = 0x02;           // Start
        const TXP = 0x04;           // Transmit packet
        const REMOTE_READ = 0x08;
        const REMOTE_WRITE = 0x10;
        const SEND_PACKET = 0x18;
        const NO_DMA = 0x20;        // Abort/complete remote DMA
        const PAGE_1 = 0x40;
        const PAGE_2 = 0x80;

        const PAGE_MASK = 0xC0;
    }
}

impl Command {
    /// Page 0 has no bits of its own
    pub const PAGE_0: Command = Command::empty();
}

bitflags! {
    /// Interrupt Status Register [20]
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct InterruptStatus: u8 {
        const PRX = 0x01;   // Packet received
        const PTX = 0x02;   // Packet transmitted
        const RXE = 0x04;   // Receive error
        const TXE = 0x08;   // Transmit error
        const OVW = 0x10;   // Overwrite warning
        const CNT = 0x20;   // Counter overflow
        const RDC = 0x40;   // Remote DMA complete
        const RST = 0x80;   // Reset status
    }
}

bitflags! {
    /// Interrupt Mask Register [21]
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct InterruptMask: u8 {
        const PRXE = 0x01;
        const PTXE = 0x02;
        const RXEE = 0x04;
        const TXEE = 0x08;
        const OVWE = 0x10;
        const CNTE = 0x20;
        const RDCE = 0x40;
    }
}

bitflags! {
    /// Data Configuration Register [22]
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DataConfig: u8 {
        const WTS = 0x01;       // Word-wide transfers
        const BOS = 0x02;       // Big-endian byte order
        const LAS = 0x04;       // Long address select
        const LS = 0x08;        // Normal operation (loopback select off)
        const AR = 0x10;        // Auto-initialize remote
        const FT0 = 0x20;
        const FT1 = 0x40;

        const FIFO_8_BYTES = 0x40;
    }
}

impl DataConfig {
    pub const BYTE_WIDE: DataConfig = DataConfig::empty();
    pub const LITTLE_ENDIAN: DataConfig = DataConfig::empty();
}

bitflags! {
    /// Transmit Configuration Register [23]
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TransmitConfig: u8 {
        const CRC = 0x01;       // Inhibit CRC
        const LB0 = 0x02;
        const LB1 = 0x04;
        const ATD = 0x08;       // Auto transmit disable
        const OFST = 0x10;      // Collision offset enable

        const INTERNAL_LOOPBACK = 0x02;
    }
}

impl TransmitConfig {
    pub const NORMAL: TransmitConfig = TransmitConfig::empty();
}

bitflags! {
    /// Receive Configuration Register [25]
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ReceiveConfig: u8 {
        const SEP = 0x01;       // Save error packets
        const AR = 0x02;        // Accept runts
        const AB = 0x04;        // Accept broadcast
        const AM = 0x08;        // Accept multicast
        const PRO = 0x10;       // Promiscuous physical
        const MON = 0x20;       // Monitor mode
    }
}

bitflags! {
    /// Receive Status Register, also the first byte of every ring header [26]
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ReceiveStatus: u8 {
        const PRX = 0x01;       // Packet received intact
        const CRC = 0x02;
        const FAE = 0x04;       // Frame alignment error
        const FO = 0x08;        // FIFO overrun
        const MPA = 0x10;       // Missed packet
        const PHY = 0x20;       // Multicast/broadcast address
        const DIS = 0x40;       // Receiver disabled
        const DFR = 0x80;       // Deferring
    }
}
