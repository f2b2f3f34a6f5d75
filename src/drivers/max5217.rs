//! MAX5217 16-bit I2C DAC.
//!
//! Single write transaction per code load: command byte `0x01` followed by
//! the 16-bit code, big-endian. The part powers up at zero scale, so the
//! boot sequence must park it at mid-scale before enabling the cell.

use embedded_hal::i2c::I2c;

/// 7-bit bus address with ADDR strapped low.
pub const DEFAULT_ADDR: u8 = 0x1C;

const CMD_CODE_LOAD: u8 = 0x01;

pub struct Max5217<I2C> {
    i2c: I2C,
    addr: u8,
}

impl<I2C: I2c> Max5217<I2C> {
    pub fn new(i2c: I2C, addr: u8) -> Self {
        Self { i2c, addr }
    }

    /// Latch a 16-bit output code.
    pub fn write_code(&mut self, code: u16) -> Result<(), I2C::Error> {
        let be = code.to_be_bytes();
        self.i2c.write(self.addr, &[CMD_CODE_LOAD, be[0], be[1]])
    }
}
