//! Kernel-facing device glue
//!
//! Finds the card among the usual ISA ports and exposes the device-file
//! operations (read, write, ioctl) plus the interrupt entry point. The
//! context lives in a [`DeviceSlot`]; the interrupt path never spins on
//! the slot lock: when a read or write holds it, the interrupt is recorded
//! and serviced by the holder before it lets go.

use alloc::format;
use alloc::string::String;
use core::sync::atomic::{AtomicBool, Ordering};
use spin::Mutex;

use crate::config::Ne2000Config;
use crate::error::{NicError, Result};
use crate::interrupt::InterruptSummary;
use crate::io::PortIo;
use crate::nic::Ne2000;
use crate::recv::RecvStatus;

/// ioctl requests understood by the device file
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EthIoctl {
    /// Prepare the device for inter-process communication (not available yet)
    IpcSetup = 1,
}

impl EthIoctl {
    pub fn from_request(request: u32) -> Option<Self> {
        match request {
            1 => Some(EthIoctl::IpcSetup),
            _ => None,
        }
    }
}

/// Interrupt controller operations the driver needs from the kernel
pub trait InterruptController {
    /// Unmask `irq` on the PIC/IOAPIC
    fn enable_irq(&mut self, irq: u8);
}

/// Probe every candidate port in order and bring up the first card found
///
/// `make_io` supplies the port I/O backend for each attempt.
pub fn scan<P, F>(config: &Ne2000Config, mut make_io: F) -> Option<Ne2000<P>>
where
    P: PortIo,
    F: FnMut() -> P,
{
    for (index, &port) in config.ports.iter().enumerate() {
        log::info!("Ethernet: Probing port 0x{:x}", port);

        let name = format!("{}{}", config.name_prefix, index);
        let mut nic = Ne2000::new(&name, port, config.irq, make_io(), *config);

        if nic.probe().is_ok() {
            log::info!("Ethernet: Found card at port 0x{:x}, initializing...", port);
            match nic.init() {
                Ok(()) => return Some(nic),
                Err(e) => log::error!("{}: {}", nic.name(), e),
            }
        }
    }

    log::debug!("Ethernet: No NE2000 found");
    None
}

/// Home of the single NE2000 context
pub struct DeviceSlot<P: PortIo> {
    nic: Mutex<Option<Ne2000<P>>>,
    irq_pending: AtomicBool,
    packet_available: AtomicBool,
}

impl<P: PortIo> DeviceSlot<P> {
    pub const fn new() -> Self {
        Self {
            nic: Mutex::new(None),
            irq_pending: AtomicBool::new(false),
            packet_available: AtomicBool::new(false),
        }
    }

    /// Scan for a card, install it and unmask its interrupt line
    pub fn attach<F, C>(&self, config: &Ne2000Config, make_io: F, pic: &mut C) -> bool
    where
        F: FnMut() -> P,
        C: InterruptController,
    {
        match scan(config, make_io) {
            Some(nic) => {
                let irq = nic.irq();
                *self.nic.lock() = Some(nic);
                pic.enable_irq(irq);
                true
            }
            None => false,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.nic.lock().is_some()
    }

    /// Run `f` on the context
    ///
    /// Interrupts deferred before the lock was taken are serviced before
    /// `f`, those that arrive while it runs right after. One landing after
    /// the last check is picked up once the lock is released.
    pub fn with_nic<R>(&self, f: impl FnOnce(&mut Ne2000<P>) -> R) -> Option<R> {
        let result = {
            let mut guard = self.nic.lock();
            let nic = guard.as_mut()?;
            self.service_deferred(nic);
            let result = f(nic);
            self.service_deferred(nic);
            result
        };
        self.drain_deferred();
        Some(result)
    }

    /// Device-file write: transmit one frame
    pub fn write(&self, frame: &[u8]) -> Result<usize> {
        self.with_nic(|nic| nic.send(frame)).unwrap_or(Err(NicError::NotReady))
    }

    /// Device-file read: fetch one frame
    pub fn read(&self, buf: &mut [u8]) -> Result<RecvStatus> {
        let result = self
            .with_nic(|nic| nic.receive(buf))
            .unwrap_or(Err(NicError::NotReady));
        if result == Err(NicError::Empty) {
            self.packet_available.store(false, Ordering::Release);
        }
        result
    }

    /// Device-file ioctl
    pub fn ioctl(&self, request: u32) -> Result<()> {
        let name = self
            .with_nic(|nic| String::from(nic.name()))
            .unwrap_or_else(|| String::from("eth?"));

        match EthIoctl::from_request(request) {
            Some(EthIoctl::IpcSetup) => {
                log::error!("{}: ETH_IPC_SETUP is unimplemented (no IPC support)", name);
            }
            None => {
                log::warn!("{}: Received unrecognized ioctl request {}", name, request);
            }
        }
        Err(NicError::Unsupported(request))
    }

    /// Interrupt vector entry point
    pub fn handle_interrupt(&self) -> Option<InterruptSummary> {
        match self.nic.try_lock() {
            Some(mut guard) => {
                let nic = guard.as_mut()?;
                self.irq_pending.store(false, Ordering::Release);
                let summary = nic.on_interrupt();
                self.note(&summary);
                Some(summary)
            }
            None => {
                self.defer_interrupt();
                None
            }
        }
    }

    /// Set by receive interrupts, cleared once a read finds the ring empty
    pub fn packet_available(&self) -> bool {
        self.packet_available.load(Ordering::Acquire)
    }

    /// Record an interrupt for whoever holds the context
    pub(crate) fn defer_interrupt(&self) {
        self.irq_pending.store(true, Ordering::Release);
    }

    /// Service interrupts deferred after the holder's last check
    fn drain_deferred(&self) {
        while self.irq_pending.load(Ordering::Acquire) {
            // A new holder services it before letting go.
            let Some(mut guard) = self.nic.try_lock() else {
                return;
            };
            match guard.as_mut() {
                Some(nic) => self.service_deferred(nic),
                None => {
                    self.irq_pending.store(false, Ordering::Release);
                    return;
                }
            }
        }
    }

    fn service_deferred(&self, nic: &mut Ne2000<P>) {
        if self.irq_pending.swap(false, Ordering::AcqRel) {
            let summary = nic.on_interrupt();
            self.note(&summary);
        }
    }

    fn note(&self, summary: &InterruptSummary) {
        if summary.packet_available {
            self.packet_available.store(true, Ordering::Release);
        }
    }
}

impl<P: PortIo> Default for DeviceSlot<P> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_arch = "x86_64")]
pub use self::x86::{attach_eth0, ETH0};

#[cfg(target_arch = "x86_64")]
mod x86 {
    use super::{DeviceSlot, InterruptController};
    use crate::config::Ne2000Config;
    use crate::io::X86PortIo;

    /// The machine's NE2000, once found
    pub static ETH0: DeviceSlot<X86PortIo> = DeviceSlot::new();

    /// Bring up `ETH0` with the default candidate ports
    ///
    /// # Safety
    ///
    /// Probing writes to every candidate port; nothing else may own them.
    pub unsafe fn attach_eth0<C: InterruptController>(pic: &mut C) -> bool {
        ETH0.attach(&Ne2000Config::default(), || unsafe { X86PortIo::new() }, pic)
    }
}
