// Protocol constants for the Carmen transmitter

/// Trailing CRC-16 size on every frame.
pub const CHECKSUM_SIZE: usize = 2;

/// Response length of the simple commands: echoed opcode, status byte, CRC.
pub const SIMPLE_RESPONSE_LEN: usize = 4;

/// Full measurement frame length on the wire, CRC included.
pub const MEASUREMENT_FRAME_LEN: usize = 13;

/// EEPROM response header: echoed opcode, 0x80 marker, block count.
pub const EEPROM_HEADER_SIZE: usize = 3;

/// Bytes delivered per EEPROM block.
pub const EEPROM_BLOCK_SIZE: usize = 4;

/// EEPROM address of the typeplate record.
pub const TYPEPLATE_ADDRESS: u16 = 0x0190;

/// Number of EEPROM blocks covering the full typeplate.
pub const TYPEPLATE_BLOCKS: u8 = 12;

/// Number of EEPROM blocks covering just the serial number.
pub const SERIAL_NUMBER_BLOCKS: u8 = 3;

/// Minimum typeplate payload the decoder accepts (through the date word).
pub const TYPEPLATE_MIN_LEN: usize = 46;

/// Zero offset of the temperature digital output, in range-2 units.
pub const TEMPERATURE_OFFSET: f64 = 25.0;

/// Factory baud rate of the transmitter's service interface.
pub const DEFAULT_BAUD_RATE: u32 = 57600;
