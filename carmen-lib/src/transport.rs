//! Byte-stream link to the transmitter.

use std::io::{self, Read, Write};
use std::time::Duration;

use tracing::info;

use crate::constants::DEFAULT_BAUD_RATE;
use crate::error::CarmenError;

/// Default read timeout of the link.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// A synchronous byte-stream link the protocol runs over.
///
/// `read` blocks until `len` bytes arrive or the link's timeout elapses
/// and returns whatever was received, possibly fewer bytes than asked for.
/// The caller decides whether a short read is an error.
pub trait Transport {
    fn write(&mut self, data: &[u8]) -> Result<usize, CarmenError>;
    fn read(&mut self, len: usize) -> Result<Vec<u8>, CarmenError>;
}

/// [`Transport`] over a local serial port (RS-232/RS-485/USB-serial).
pub struct SerialTransport {
    port: Box<dyn serialport::SerialPort>,
}

impl SerialTransport {
    /// Open and configure `path` at the factory baud rate.
    pub fn open(path: &str) -> Result<Self, CarmenError> {
        Self::open_with_config(path, DEFAULT_BAUD_RATE, DEFAULT_TIMEOUT)
    }

    /// Open and configure `path`, failing fast if the link cannot be set up.
    pub fn open_with_config(
        path: &str,
        baud_rate: u32,
        timeout: Duration,
    ) -> Result<Self, CarmenError> {
        let port = serialport::new(path, baud_rate)
            .timeout(timeout)
            .open()
            .map_err(|source| CarmenError::Open {
                port: path.to_string(),
                source,
            })?;
        info!(port = path, baud_rate, "serial port opened");
        Ok(Self { port })
    }

    /// Change the read timeout of the open link.
    pub fn set_timeout(&mut self, timeout: Duration) -> Result<(), CarmenError> {
        self.port.set_timeout(timeout)?;
        Ok(())
    }
}

impl Transport for SerialTransport {
    fn write(&mut self, data: &[u8]) -> Result<usize, CarmenError> {
        let written = self.port.write(data)?;
        self.port.flush()?;
        Ok(written)
    }

    fn read(&mut self, len: usize) -> Result<Vec<u8>, CarmenError> {
        let mut buf = vec![0u8; len];
        let mut filled = 0;
        while filled < len {
            match self.port.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::TimedOut => break,
                Err(e) => return Err(e.into()),
            }
        }
        buf.truncate(filled);
        Ok(buf)
    }
}
