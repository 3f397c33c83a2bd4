//! Decoder for the factory typeplate record stored in device EEPROM.
//!
//! The typeplate is read as 12 EEPROM blocks (48 bytes once the response
//! header and checksum are stripped) and describes one device's
//! calibration: output ranges with units, working-pressure limits, the
//! sampling rate and the modification date.

use std::fmt;

use chrono::NaiveDate;
use modular_bitfield::prelude::*;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::Serialize;
use strum_macros::Display;

use crate::constants::TYPEPLATE_MIN_LEN;
use crate::error::CarmenError;

/// Physical unit codes used by the typeplate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, TryFromPrimitive, IntoPrimitive,
)]
#[repr(u8)]
pub enum Unit {
    #[strum(to_string = "")]
    None = 0,
    #[strum(to_string = "mbar")]
    Mbar = 1,
    #[strum(to_string = "bar")]
    Bar = 2,
    #[strum(to_string = "psi")]
    Psi = 3,
    #[strum(to_string = "Pa")]
    Pa = 4,
    #[strum(to_string = "kPa")]
    KPa = 5,
    #[strum(to_string = "MPa")]
    MPa = 6,
    #[strum(to_string = "mmH2O")]
    MmH2O = 7,
    #[strum(to_string = "mH2O")]
    MH2O = 8,
    #[strum(to_string = "ftH2O")]
    FtH2O = 9,
    #[strum(to_string = "inH2O")]
    InH2O = 10,
    #[strum(to_string = "mmHg")]
    MmHg = 11,
    #[strum(to_string = "°C")]
    DegC = 32,
    #[strum(to_string = "K")]
    Kelvin = 64,
    #[strum(to_string = "°F")]
    DegF = 96,
}

/// Sampling interval of the device's internal processing loop.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, TryFromPrimitive, IntoPrimitive,
)]
#[repr(u8)]
pub enum SystemRate {
    #[strum(to_string = "1.25 ms")]
    Ms1_25 = 0,
    #[strum(to_string = "2.5 ms")]
    Ms2_5 = 1,
    #[strum(to_string = "5 ms")]
    Ms5 = 2,
    #[strum(to_string = "10 ms")]
    Ms10 = 3,
    #[strum(to_string = "20 ms")]
    Ms20 = 4,
    #[strum(to_string = "40 ms")]
    Ms40 = 5,
    #[strum(to_string = "80 ms")]
    Ms80 = 6,
    #[strum(to_string = "160 ms")]
    Ms160 = 7,
}

impl SystemRate {
    /// Sampling interval in microseconds.
    pub fn as_micros(&self) -> u32 {
        1250u32 << (*self as u8)
    }
}

/// One digital output's calibrated range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OutputRange {
    pub lrv: f32,
    pub urv: f32,
    pub unit: Unit,
}

/// A pressure limit (MWP/OPL) with its unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PressureLimit {
    pub value: f32,
    pub unit: Unit,
}

/// Factory calibration record of one device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Typeplate {
    pub typeplate_type: u8,
    pub serial_number: String,
    /// Ranges of digital outputs 1-3. Output 1 carries pressure,
    /// output 2 temperature.
    pub output_ranges: [OutputRange; 3],
    /// Maximum working pressure.
    pub mwp: PressureLimit,
    /// Overpressure limit.
    pub opl: PressureLimit,
    pub system_rate: SystemRate,
    pub date_modified: NaiveDate,
}

/// Modification date packed into one 16-bit word.
#[bitfield(bytes = 2)]
struct PackedDate {
    day: B5,
    month: B4,
    year: B7,
}

/// Decode a 3-byte short-IEEE value: the bytes form the top 24 bits of an
/// IEEE-754 single, assembled little-endian.
fn short_ieee(data: &[u8]) -> f32 {
    let bits = u32::from(data[0]) | u32::from(data[1]) << 8 | u32::from(data[2]) << 16;
    f32::from_bits(bits << 8)
}

fn unit(byte: u8) -> Result<Unit, CarmenError> {
    Unit::try_from(byte)
        .map_err(|_| CarmenError::InvalidTypeplate(format!("unknown unit code {byte:#04x}")))
}

/// Byte order restoring the serial number from its EEPROM storage layout:
/// a 3-byte little-endian group followed by two 4-byte little-endian groups.
const SERIAL_NUMBER_ORDER: [usize; 11] = [3, 2, 1, 7, 6, 5, 4, 11, 10, 9, 8];

/// Reassemble the serial number characters from a typeplate buffer.
///
/// Bytes map to characters by raw code point, so values above 127 survive
/// as single Latin-1 code points.
pub(crate) fn decode_serial_number(buffer: &[u8]) -> String {
    SERIAL_NUMBER_ORDER
        .iter()
        .map(|&i| char::from(buffer[i]))
        .collect()
}

impl TryFrom<&[u8]> for Typeplate {
    type Error = CarmenError;

    /// Decode the EEPROM payload, response header and checksum already
    /// stripped by the caller. No partial record is ever returned.
    fn try_from(buffer: &[u8]) -> Result<Self, Self::Error> {
        if buffer.len() < TYPEPLATE_MIN_LEN {
            return Err(CarmenError::InvalidTypeplate(format!(
                "buffer too short: {} bytes",
                buffer.len()
            )));
        }

        let typeplate_type = buffer[0];
        let serial_number = decode_serial_number(buffer);

        // Each output occupies an 8-byte slot: unit, LRV, gap byte, URV.
        let mut output_ranges = [OutputRange {
            lrv: 0.0,
            urv: 0.0,
            unit: Unit::None,
        }; 3];
        for (i, range) in output_ranges.iter_mut().enumerate() {
            let base = 12 + 8 * i;
            *range = OutputRange {
                unit: unit(buffer[base])?,
                lrv: short_ieee(&buffer[base + 1..base + 4]),
                urv: short_ieee(&buffer[base + 5..base + 8]),
            };
        }

        let mwp = PressureLimit {
            unit: unit(buffer[36])?,
            value: short_ieee(&buffer[37..40]),
        };
        let opl = PressureLimit {
            unit: unit(buffer[40])?,
            value: short_ieee(&buffer[41..44]),
        };

        // The rate shares byte 32 with output 3's gap byte.
        let system_rate = SystemRate::try_from(buffer[32] & 0x07)
            .map_err(|_| CarmenError::InvalidTypeplate("system rate".into()))?;

        let date = PackedDate::from_bytes([buffer[44], buffer[45]]);
        let date_modified = NaiveDate::from_ymd_opt(
            2000 + i32::from(date.year()),
            u32::from(date.month()),
            u32::from(date.day()),
        )
        .ok_or_else(|| {
            CarmenError::InvalidTypeplate(format!(
                "date out of range: year {} month {} day {}",
                2000 + i32::from(date.year()),
                date.month(),
                date.day()
            ))
        })?;

        Ok(Typeplate {
            typeplate_type,
            serial_number,
            output_ranges,
            mwp,
            opl,
            system_rate,
            date_modified,
        })
    }
}

impl fmt::Display for Typeplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "---------- Typeplate Information ----------")?;
        writeln!(f, "TypeplateType: {}", self.typeplate_type)?;
        writeln!(f, " SerialNumber: {}", self.serial_number)?;
        for (i, range) in self.output_ranges.iter().enumerate() {
            writeln!(
                f,
                "      DigOut{}: {: >6.2} ... {: >6.2} {}",
                i + 1,
                range.lrv,
                range.urv,
                range.unit
            )?;
        }
        writeln!(f, "          MWP: {: >6.2} {}", self.mwp.value, self.mwp.unit)?;
        writeln!(f, "          OPL: {: >6.2} {}", self.opl.value, self.opl.unit)?;
        writeln!(f, "   SystemRate: {}", self.system_rate)?;
        write!(f, " DateModified: {}", self.date_modified)
    }
}
