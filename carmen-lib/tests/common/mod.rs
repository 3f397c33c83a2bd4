//! Common test utilities and shared fixtures

use std::collections::VecDeque;

use carmen_lib::error::CarmenError;
use carmen_lib::frame;
use carmen_lib::transport::Transport;

/// Scripted in-memory transport. Every write is recorded; reads are
/// served from a queue of canned responses, truncated to the requested
/// length so short-read behavior can be simulated by queueing short
/// responses.
#[derive(Default)]
pub struct MockTransport {
    pub written: Vec<Vec<u8>>,
    pub responses: VecDeque<Vec<u8>>,
}

#[allow(dead_code)]
impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&mut self, response: Vec<u8>) {
        self.responses.push_back(response);
    }
}

impl Transport for MockTransport {
    fn write(&mut self, data: &[u8]) -> Result<usize, CarmenError> {
        self.written.push(data.to_vec());
        Ok(data.len())
    }

    fn read(&mut self, len: usize) -> Result<Vec<u8>, CarmenError> {
        let mut response = self.responses.pop_front().unwrap_or_default();
        response.truncate(len);
        Ok(response)
    }
}

/// Well-formed 4-byte response to a simple command.
#[allow(dead_code)]
pub fn simple_response(opcode: u8) -> Vec<u8> {
    frame::encode(opcode, &[0x00]).to_vec()
}

/// Well-formed EEPROM read response declaring `blocks` blocks.
#[allow(dead_code)]
pub fn eeprom_response(blocks: u8, payload: &[u8]) -> Vec<u8> {
    let mut body = vec![0x80, blocks];
    body.extend_from_slice(payload);
    frame::encode(0x03, &body).to_vec()
}

/// Measurement frame captured from a live device (pressure 0x000C85,
/// temperature 0xFDCE, status 0x800000).
#[allow(dead_code)]
pub const MEASUREMENT_RESPONSE: &[u8] = &[
    0x35, 0x85, 0x0C, 0x00, 0xCE, 0xFD, 0xCF, 0xF2, 0x00, 0x00, 0x80, 0x9F, 0xCD,
];

/// Serial number carried by [`typeplate_fixture`].
#[allow(dead_code)]
pub const FIXTURE_SERIAL: &str = "SN-0042-AB1";

/// Encode an f32 into the 3-byte short-IEEE wire form (top 24 bits,
/// little-endian byte order).
#[allow(dead_code)]
pub fn short_ieee_bytes(value: f32) -> [u8; 3] {
    let bits = value.to_bits();
    [(bits >> 8) as u8, (bits >> 16) as u8, (bits >> 24) as u8]
}

/// 48-byte typeplate payload as delivered by a 12-block EEPROM read,
/// header and checksum already stripped.
#[allow(dead_code)]
pub fn typeplate_fixture() -> Vec<u8> {
    let mut buffer = vec![0u8; 48];
    buffer[0] = 0x17;
    // serial number in its permuted storage order
    let order = [3usize, 2, 1, 7, 6, 5, 4, 11, 10, 9, 8];
    for (&storage, &ch) in order.iter().zip(FIXTURE_SERIAL.as_bytes()) {
        buffer[storage] = ch;
    }
    // output 1: -1.0 ... 2.0 bar
    buffer[12] = 2;
    buffer[13..16].copy_from_slice(&short_ieee_bytes(-1.0));
    buffer[17..20].copy_from_slice(&short_ieee_bytes(2.0));
    // output 2: -20.0 ... 80.0 degC
    buffer[20] = 32;
    buffer[21..24].copy_from_slice(&short_ieee_bytes(-20.0));
    buffer[25..28].copy_from_slice(&short_ieee_bytes(80.0));
    // output 3: 0.0 ... 1.0, no unit
    buffer[28] = 0;
    buffer[29..32].copy_from_slice(&short_ieee_bytes(0.0));
    buffer[33..36].copy_from_slice(&short_ieee_bytes(1.0));
    // system rate 10 ms, sharing output 3's gap byte
    buffer[32] = 0x03;
    // MWP 10.0 bar, OPL 25.0 bar
    buffer[36] = 2;
    buffer[37..40].copy_from_slice(&short_ieee_bytes(10.0));
    buffer[40] = 2;
    buffer[41..44].copy_from_slice(&short_ieee_bytes(25.0));
    // modified 2017-03-14
    let date: u16 = (17 << 9) | (3 << 5) | 14;
    buffer[44..46].copy_from_slice(&date.to_le_bytes());
    buffer
}
