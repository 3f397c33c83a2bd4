use std::io;
use thiserror::Error;

/// The primary error type for the `carmen-lib` library.
#[derive(Error, Debug)]
pub enum CarmenError {
    #[error("cannot open serial port {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },

    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("short write: {written} of {expected} bytes written")]
    ShortWrite { written: usize, expected: usize },

    #[error("read timeout: received {received} of {expected} bytes")]
    ReadTimeout { received: usize, expected: usize },

    #[error("frame too short: {0} bytes")]
    FrameTooShort(usize),

    #[error("checksum mismatch: computed {computed:#06x}, frame carries {received:#06x}")]
    ChecksumMismatch { computed: u16, received: u16 },

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("invalid typeplate: {0}")]
    InvalidTypeplate(String),
}
