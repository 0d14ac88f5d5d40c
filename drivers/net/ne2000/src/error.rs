// drivers/net/ne2000/src/error.rs
use core::fmt;

/// Result type used by every driver entry point
pub type Result<T> = core::result::Result<T, NicError>;

/// Why a probe at a given port did not find a usable card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeFailure {
    /// Base register reads 0xFF: nothing drives the bus
    FloatingBus,
    /// Tally counter did not clear on read: not a DP8390
    NoController,
    /// Reset bit never showed up in ISR
    ResetTimeout,
    /// PROM bytes 14/15 are not 0x57 0x57
    BadSignature,
}

/// Busy-poll that ran out of iterations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollTarget {
    /// Current remote DMA address never moved after the dummy read
    RemoteDmaAddress,
    /// ISR never reported remote DMA complete after a block write
    RemoteDmaComplete,
}

/// Driver error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NicError {
    /// No card at the probed port; try the next candidate
    NotFound(ProbeFailure),

    /// Card was not probed and initialized yet
    NotReady,

    /// Every transmit slot is in flight
    Busy,

    /// Receive ring holds no unread frame
    Empty,

    /// Receive header carries an impossible length or a bad status
    Malformed {
        status: u8,
        next: u8,
        length: usize,
    },

    /// Frame handed to `send` is outside Ethernet bounds
    InvalidFrameLength(usize),

    /// A bounded busy-poll expired
    Timeout(PollTarget),

    /// Control request not supported by this driver
    Unsupported(u32),
}

impl NicError {
    /// Busy and Empty are expected under normal operation
    pub fn is_transient(&self) -> bool {
        matches!(self, NicError::Busy | NicError::Empty)
    }
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeFailure::FloatingBus => write!(f, "floating bus"),
            ProbeFailure::NoController => write!(f, "no DP8390 controller"),
            ProbeFailure::ResetTimeout => write!(f, "reset did not complete"),
            ProbeFailure::BadSignature => write!(f, "PROM signature mismatch"),
        }
    }
}

impl fmt::Display for PollTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollTarget::RemoteDmaAddress => write!(f, "remote DMA address change"),
            PollTarget::RemoteDmaComplete => write!(f, "remote DMA completion"),
        }
    }
}

impl fmt::Display for NicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NicError::NotFound(reason) => write!(f, "NE2000 not found: {}", reason),
            NicError::NotReady => write!(f, "NE2000 not initialized"),
            NicError::Busy => write!(f, "all transmit buffers are busy"),
            NicError::Empty => write!(f, "no packet to read"),
            NicError::Malformed { status, next, length } => write!(
                f,
                "malformed packet (status 0x{:02X}, next 0x{:02X}, length {})",
                status, next, length
            ),
            NicError::InvalidFrameLength(len) => write!(f, "invalid frame length {}", len),
            NicError::Timeout(target) => write!(f, "timed out waiting for {}", target),
            NicError::Unsupported(request) => write!(f, "unsupported request {}", request),
        }
    }
}
