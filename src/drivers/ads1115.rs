//! ADS1115 16-bit I2C ADC, differential AIN0-AIN1.
//!
//! Configured once for continuous conversion at 860 SPS with the ±1.024 V
//! range (0.03125 mV per LSB), then each read is a single fetch of the
//! conversion register. Continuous mode keeps the read path fast enough for
//! the synchronized sampling windows.

use embedded_hal::i2c::I2c;

/// 7-bit bus address with ADDR strapped to SCL.
pub const DEFAULT_ADDR: u8 = 0x4B;

/// ADC step size for the ±1.024 V range (mV).
pub const MV_PER_LSB: f32 = 0.03125;

const REG_CONVERSION: u8 = 0x00;
const REG_CONFIG: u8 = 0x01;

// MUX=AIN0-AIN1, PGA=±1.024 V, continuous, 860 SPS, comparator disabled.
const CONFIG_DIFF_0_1: u16 = 0x06E3;

pub struct Ads1115<I2C> {
    i2c: I2C,
    addr: u8,
}

impl<I2C: I2c> Ads1115<I2C> {
    pub fn new(i2c: I2C, addr: u8) -> Self {
        Self { i2c, addr }
    }

    /// Program the config register and enter continuous conversion.
    pub fn start_continuous(&mut self) -> Result<(), I2C::Error> {
        let be = CONFIG_DIFF_0_1.to_be_bytes();
        self.i2c.write(self.addr, &[REG_CONFIG, be[0], be[1]])
    }

    /// Latest conversion result, raw signed code.
    pub fn read_raw(&mut self) -> Result<i16, I2C::Error> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(self.addr, &[REG_CONVERSION], &mut buf)?;
        Ok(i16::from_be_bytes(buf))
    }
}
