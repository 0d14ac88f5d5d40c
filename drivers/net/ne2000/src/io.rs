//! Port I/O access
//!
//! The driver never touches `in`/`out` directly: everything goes through
//! [`PortIo`], so the register protocol can run against real hardware
//! ([`X86PortIo`]) or against a simulated card in tests.

/// Byte and word access to absolute I/O ports
pub trait PortIo {
    /// Read a byte from a port
    fn read_u8(&mut self, port: u16) -> u8;

    /// Write a byte to a port
    fn write_u8(&mut self, port: u16, value: u8);

    /// Read a word from a port
    fn read_u16(&mut self, port: u16) -> u16;

    /// Write a word to a port
    fn write_u16(&mut self, port: u16, value: u16);
}

#[cfg(target_arch = "x86_64")]
pub use self::x86::{Port, X86PortIo};

#[cfg(target_arch = "x86_64")]
mod x86 {
    use super::PortIo;
    use core::arch::asm;
    use core::marker::PhantomData;

    /// A port I/O wrapper.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Port<T> {
        port: u16,
        phantom: PhantomData<T>,
    }

    impl<T> Port<T> {
        /// Creates a new I/O port with the given port number.
        pub const fn new(port: u16) -> Port<T> {
            Port {
                port,
                phantom: PhantomData,
            }
        }
    }

    impl Port<u8> {
        /// Reads a byte from the port.
        ///
        /// # Safety
        ///
        /// This function is unsafe because the I/O port could have side effects that violate memory
        /// safety.
        pub unsafe fn read(&mut self) -> u8 {
            let value: u8;
            asm!(
                "in al, dx",
                out("al") value,
                in("dx") self.port,
                options(nomem, nostack, preserves_flags),
            );
            value
        }

        /// Writes a byte to the port.
        ///
        /// # Safety
        ///
        /// This function is unsafe because the I/O port could have side effects that violate memory
        /// safety.
        pub unsafe fn write(&mut self, value: u8) {
            asm!(
                "out dx, al",
                in("dx") self.port,
                in("al") value,
                options(nomem, nostack, preserves_flags),
            );
        }
    }

    impl Port<u16> {
        /// Reads a word from the port.
        ///
        /// # Safety
        ///
        /// See [`Port::<u8>::read`].
        pub unsafe fn read(&mut self) -> u16 {
            let value: u16;
            asm!(
                "in ax, dx",
                out("ax") value,
                in("dx") self.port,
                options(nomem, nostack, preserves_flags),
            );
            value
        }

        /// Writes a word to the port.
        ///
        /// # Safety
        ///
        /// See [`Port::<u8>::write`].
        pub unsafe fn write(&mut self, value: u16) {
            asm!(
                "out dx, ax",
                in("dx") self.port,
                in("ax") value,
                options(nomem, nostack, preserves_flags),
            );
        }
    }

    /// Real port I/O through `in`/`out` instructions
    #[derive(Debug)]
    pub struct X86PortIo {
        _private: (),
    }

    impl X86PortIo {
        /// # Safety
        ///
        /// The caller must run at an I/O privilege level that allows port access
        /// and must guarantee that only the NE2000 driver drives the ports it probes.
        pub const unsafe fn new() -> Self {
            Self { _private: () }
        }
    }

    impl PortIo for X86PortIo {
        #[inline]
        fn read_u8(&mut self, port: u16) -> u8 {
            unsafe { Port::<u8>::new(port).read() }
        }

        #[inline]
        fn write_u8(&mut self, port: u16, value: u8) {
            unsafe { Port::<u8>::new(port).write(value) }
        }

        #[inline]
        fn read_u16(&mut self, port: u16) -> u16 {
            unsafe { Port::<u16>::new(port).read() }
        }

        #[inline]
        fn write_u16(&mut self, port: u16, value: u16) {
            unsafe { Port::<u16>::new(port).write(value) }
        }
    }
}
