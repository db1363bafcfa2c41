use std::io;
use thiserror::Error;

/// Errors produced by the sector channel and page protocol.
///
/// None of these are fatal to the process; retry policy belongs to the
/// caller. The framing commands around a page transfer never report their
/// failures, so only data-step errors surface here.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The device path could not be opened for direct transfer.
    #[error("failed to open device {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },

    /// A caller buffer does not satisfy the protocol's size requirement.
    #[error("buffer of {actual} bytes does not satisfy the required {required} bytes")]
    Size { actual: usize, required: usize },

    /// The underlying read or write failed. Carries the OS error.
    #[error("device transfer failed: {0}")]
    Io(#[source] io::Error),

    /// An aligned transfer buffer could not be obtained.
    #[error("aligned allocation of {size} bytes failed")]
    Allocation { size: usize },
}

impl DeviceError {
    /// Error used for operations on a handle that has been closed.
    pub(crate) fn closed() -> Self {
        DeviceError::Io(io::Error::new(
            io::ErrorKind::NotConnected,
            "device handle is closed",
        ))
    }
}
