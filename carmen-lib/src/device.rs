use bytes::Bytes;
use tracing::{debug, error, warn};

use crate::command::Command;
use crate::constants::{
    CHECKSUM_SIZE, EEPROM_HEADER_SIZE, MEASUREMENT_FRAME_LEN, SERIAL_NUMBER_BLOCKS,
    TYPEPLATE_ADDRESS, TYPEPLATE_BLOCKS,
};
use crate::error::CarmenError;
use crate::frame;
use crate::measurement::{Measurement, MeasurementFrameRaw};
use crate::transport::{SerialTransport, Transport};
use crate::typeplate::{self, Typeplate};
use zerocopy::FromBytes;

/// Driver for one Carmen transmitter on a byte-stream link.
///
/// Owns the link exclusively for the session and holds the device's
/// typeplate once read; the cache is dropped on reset so stale
/// calibration data is never applied.
pub struct Carmen<T = SerialTransport> {
    transport: T,
    typeplate: Option<Typeplate>,
}

impl Carmen<SerialTransport> {
    /// Connect to the transmitter on `path` at the factory baud rate.
    pub fn open(path: &str) -> Result<Self, CarmenError> {
        Ok(Self::new(SerialTransport::open(path)?))
    }
}

impl<T: Transport> Carmen<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            typeplate: None,
        }
    }

    fn send(&mut self, opcode: u8, payload: &[u8]) -> Result<(), CarmenError> {
        let frame = frame::encode(opcode, payload);
        debug!(hex = hex::encode(&frame), "send");
        let written = self.transport.write(&frame)?;
        if written != frame.len() {
            return Err(CarmenError::ShortWrite {
                written,
                expected: frame.len(),
            });
        }
        Ok(())
    }

    fn receive(&mut self, expected: usize) -> Result<Bytes, CarmenError> {
        let raw = self.transport.read(expected)?;
        debug!(hex = hex::encode(&raw), "read");
        if raw.len() != expected {
            error!(received = raw.len(), expected, "read timeout");
            return Err(CarmenError::ReadTimeout {
                received: raw.len(),
                expected,
            });
        }
        if let Err(e) = frame::decode(&raw) {
            error!("invalid frame: {e}");
            return Err(e);
        }
        Ok(Bytes::from(raw))
    }

    /// Run one request/response exchange and validate the response shape.
    ///
    /// A response echoing the wrong opcode, or an EEPROM response
    /// declaring a block count other than the requested one, is discarded
    /// in full.
    fn execute(&mut self, command: Command) -> Result<Bytes, CarmenError> {
        self.send(command.opcode(), &command.payload())?;
        let response = self.receive(command.response_len())?;
        if response[0] != command.opcode() {
            error!(
                sent = command.opcode(),
                echoed = response[0],
                "invalid answer"
            );
            return Err(CarmenError::UnexpectedResponse(format!(
                "command {:#04x} echoed as {:#04x}",
                command.opcode(),
                response[0]
            )));
        }
        if let Command::ReadEeprom { blocks, .. } = command {
            if response[2] != blocks {
                error!(requested = blocks, declared = response[2], "invalid answer");
                return Err(CarmenError::UnexpectedResponse(format!(
                    "requested {} EEPROM blocks, response declares {}",
                    blocks, response[2]
                )));
            }
        }
        Ok(response)
    }

    /// Halt the device's internal DSP loop.
    pub fn stop_dsp(&mut self) -> Result<(), CarmenError> {
        self.execute(Command::StopDsp).map(|_| ())
    }

    /// Restart the device's internal DSP loop.
    pub fn continue_dsp(&mut self) -> Result<(), CarmenError> {
        self.execute(Command::ContinueDsp).map(|_| ())
    }

    /// Soft-reset the device. The cached typeplate is dropped; it must be
    /// re-read before the next calibrated measurement.
    pub fn soft_reset(&mut self) -> Result<(), CarmenError> {
        self.execute(Command::SoftReset)?;
        self.typeplate = None;
        Ok(())
    }

    /// Read `blocks` EEPROM blocks at `address`, returning the block
    /// payload with the response header and checksum stripped.
    ///
    /// The DSP loop must be halted first; EEPROM access is unsafe while
    /// it runs.
    pub fn read_eeprom(&mut self, address: u16, blocks: u8) -> Result<Bytes, CarmenError> {
        let response = self.execute(Command::ReadEeprom { address, blocks })?;
        Ok(response.slice(EEPROM_HEADER_SIZE..response.len() - CHECKSUM_SIZE))
    }

    /// Read and decode the factory typeplate.
    ///
    /// Runs the stop → read → resume sequence. The resume is attempted
    /// even when the stop or the read failed; its own failure is logged
    /// and never masks the primary result.
    pub fn read_typeplate(&mut self) -> Result<Typeplate, CarmenError> {
        let result = self
            .stop_dsp()
            .and_then(|()| self.read_eeprom(TYPEPLATE_ADDRESS, TYPEPLATE_BLOCKS));
        if let Err(e) = self.continue_dsp() {
            warn!("cannot restart processing: {e}");
        }
        let typeplate = Typeplate::try_from(result?.as_ref())?;
        self.typeplate = Some(typeplate.clone());
        Ok(typeplate)
    }

    /// Read just the device serial number.
    ///
    /// Lighter than [`read_typeplate`](Self::read_typeplate): only the
    /// first three EEPROM blocks are fetched. Same stop/resume discipline.
    pub fn read_serial_number(&mut self) -> Result<String, CarmenError> {
        let result = self
            .stop_dsp()
            .and_then(|()| self.read_eeprom(TYPEPLATE_ADDRESS, SERIAL_NUMBER_BLOCKS));
        if let Err(e) = self.continue_dsp() {
            warn!("cannot restart processing: {e}");
        }
        Ok(typeplate::decode_serial_number(result?.as_ref()))
    }

    /// Read one calibrated measurement.
    ///
    /// Uses the cached typeplate for calibration, reading it first if
    /// this session has none yet.
    pub fn read_measurement(&mut self) -> Result<Measurement, CarmenError> {
        let typeplate = match &self.typeplate {
            Some(typeplate) => typeplate.clone(),
            None => self.read_typeplate()?,
        };
        let response = self.execute(Command::ReadMeasurementFrame1)?;
        let raw =
            MeasurementFrameRaw::ref_from_bytes(&response[..MEASUREMENT_FRAME_LEN - CHECKSUM_SIZE])
                .map_err(|_| {
                    CarmenError::UnexpectedResponse("measurement frame layout".to_string())
                })?;
        Ok(Measurement::from_raw(raw, &typeplate))
    }

    /// The typeplate cached by this session, if one has been read.
    pub fn typeplate(&self) -> Option<&Typeplate> {
        self.typeplate.as_ref()
    }

    /// Access the underlying transport, e.g. to adjust its timeout.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}
