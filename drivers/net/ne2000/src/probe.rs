//! Card detection
//!
//! A probe checks that something answers at the base port, that it
//! behaves like a DP8390, resets it, and reads the station address PROM.
//! The PROM read also tells NE1000 (8-bit) from NE2000 (16-bit) cards:
//! 16-bit boards store every PROM byte twice.

use crate::config::{PROM_SIGNATURE, PROM_SIZE};
use crate::error::{NicError, ProbeFailure, Result};
use crate::io::PortIo;
use crate::nic::{MacAddress, Ne2000, NicState, RegWrite};
use crate::regs::{
    Command, DataConfig, InterruptStatus, Page0Read, Page0Write, Page1, ReceiveConfig,
    TransmitConfig,
};

/// Station address PROM after width normalisation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromImage {
    pub bytes: [u8; PROM_SIZE],
    pub wide: bool,
}

impl PromImage {
    /// Decode the raw 32-byte read
    ///
    /// If every even/odd pair matches the card duplicates bytes and is
    /// 16-bit wide; the image is then compacted into the first 16 bytes.
    pub fn decode(raw: [u8; PROM_SIZE]) -> Self {
        let wide = raw.chunks_exact(2).all(|pair| pair[0] == pair[1]);
        let mut bytes = raw;
        if wide {
            for i in 0..PROM_SIZE / 2 {
                bytes[i] = raw[i * 2];
            }
        }
        Self { bytes, wide }
    }

    pub fn has_signature(&self) -> bool {
        self.bytes[14] == PROM_SIGNATURE && self.bytes[15] == PROM_SIGNATURE
    }

    pub fn mac_address(&self) -> MacAddress {
        let mut mac = [0u8; 6];
        mac.copy_from_slice(&self.bytes[..6]);
        MacAddress(mac)
    }
}

impl<P: PortIo> Ne2000<P> {
    /// Detect a card at the base port and read its MAC address
    ///
    /// A running context keeps its card; bringing a card up again takes a
    /// fresh context from [`crate::scan`].
    pub fn probe(&mut self) -> Result<()> {
        if self.state == NicState::Running {
            return Err(NicError::NotReady);
        }
        self.state = NicState::Detached;

        match self.detect() {
            Ok(()) => {
                self.state = NicState::Probed;
                Ok(())
            }
            Err(reason) => {
                log::debug!("{}: no card at 0x{:x}: {}", self.name(), self.base_port(), reason);
                Err(NicError::NotFound(reason))
            }
        }
    }

    fn detect(&mut self) -> core::result::Result<(), ProbeFailure> {
        let cr = self.read_command();
        if cr == 0xFF {
            return Err(ProbeFailure::FloatingBus);
        }

        self.check_controller(cr)?;
        self.reset()?;

        let prom = self.read_prom();
        if !prom.has_signature() {
            return Err(ProbeFailure::BadSignature);
        }

        self.wide_bus = prom.wide;
        self.mac = prom.mac_address();
        Ok(())
    }

    /// MAR5 on page 1 shares its offset with CNTR0 on page 0 [17]. CNTR0
    /// clears on read [29], so after writing 0xFF through MAR5 the second
    /// read of CNTR0 must return zero on a real DP8390.
    fn check_controller(&mut self, cr: u8) -> core::result::Result<(), ProbeFailure> {
        self.command(Command::STP | Command::NO_DMA | Command::PAGE_1);
        let mar5 = self.read_reg(Page1::Mar5);
        self.write_reg(Page1::Mar5, 0xFF);

        self.command(Command::NO_DMA | Command::PAGE_0);
        self.read_reg(Page0Read::Cntr0);
        if self.read_reg(Page0Read::Cntr0) != 0 {
            // Put back what was there before; TCR sits at the same offset.
            self.write_reg(Page0Write::Tcr, mar5);
            self.command(Command::from_bits_retain(cr));
            log::debug!("{}: this is not NEx000", self.name());
            return Err(ProbeFailure::NoController);
        }
        Ok(())
    }

    fn reset(&mut self) -> core::result::Result<(), ProbeFailure> {
        self.pulse_reset();

        let mut done = false;
        for _ in 0..self.config.reset_poll_limit {
            if self.interrupt_status().contains(InterruptStatus::RST) {
                done = true;
                break;
            }
            core::hint::spin_loop();
        }
        if !done {
            log::warn!("{}: NIC reset failure", self.name());
            return Err(ProbeFailure::ResetTimeout);
        }

        // Interrupts are not wired up yet, clear everything by hand.
        self.acknowledge(InterruptStatus::all());
        Ok(())
    }

    /// Read the 32-byte PROM window at card address 0 [29]
    fn read_prom(&mut self) -> PromImage {
        let sequence = [
            // 1. Page 0, no DMA, chip offline
            RegWrite::Cmd(Command::PAGE_0 | Command::NO_DMA | Command::STP),
            // 2. Byte-wide transfers
            RegWrite::P0(Page0Write::Dcr, (DataConfig::LS | DataConfig::FIFO_8_BYTES).bits()),
            // 3. Clear byte count
            RegWrite::P0(Page0Write::Rbcr0, 0x00),
            RegWrite::P0(Page0Write::Rbcr1, 0x00),
            // 4. Monitor mode: received frames are discarded
            RegWrite::P0(Page0Write::Rcr, ReceiveConfig::MON.bits()),
            // 5. Internal loopback
            RegWrite::P0(Page0Write::Tcr, TransmitConfig::INTERNAL_LOOPBACK.bits()),
            // 6. Clear and mask interrupts
            RegWrite::P0(Page0Write::Isr, 0xFF),
            RegWrite::P0(Page0Write::Imr, 0x00),
            // 7. 32 bytes from address 0
            RegWrite::P0(Page0Write::Rbcr0, PROM_SIZE as u8),
            RegWrite::P0(Page0Write::Rbcr1, 0),
            RegWrite::P0(Page0Write::Rsar0, 0x00),
            RegWrite::P0(Page0Write::Rsar1, 0x00),
            // 8. Remote read; loopback keeps the receiver quiet
            RegWrite::Cmd(Command::PAGE_0 | Command::REMOTE_READ | Command::STA),
        ];
        self.run_sequence(&sequence);

        let mut raw = [0u8; PROM_SIZE];
        for pair in raw.chunks_exact_mut(2) {
            pair[0] = self.read_data_u8();
            pair[1] = self.read_data_u8();
        }
        PromImage::decode(raw)
    }
}
