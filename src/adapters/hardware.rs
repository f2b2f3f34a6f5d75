//! Hardware adapter — bridges the real shield to the port traits.
//!
//! Owns the I2C bus, the gain mux pins, and the tick timers; the only
//! module besides `main` that touches actual peripherals. The DAC and ADC
//! share the bus, so the converter drivers borrow it per transaction.

use esp_idf_hal::gpio::{AnyOutputPin, Output, PinDriver};
use esp_idf_hal::i2c::I2cDriver;

use crate::app::ports::{AnalogInPort, AnalogOutPort, GainPort, TickTimerPort};
use crate::drivers::hw_timer::EspTickTimers;
use crate::drivers::{ads1115, gain, max5217};
use crate::drivers::{ads1115::Ads1115, max5217::Max5217};
use crate::error::Error;

pub struct HardwareAdapter {
    i2c: I2cDriver<'static>,
    mux_a: PinDriver<'static, AnyOutputPin, Output>,
    mux_b: PinDriver<'static, AnyOutputPin, Output>,
    boost: PinDriver<'static, AnyOutputPin, Output>,
    timers: EspTickTimers,
}

impl HardwareAdapter {
    /// Take ownership of the configured peripherals and put the analog
    /// front end in its boot state: ADC converting continuously, DAC at
    /// mid-scale, gain mux at the 10 kOhm range.
    pub fn new(
        i2c: I2cDriver<'static>,
        mux_a: PinDriver<'static, AnyOutputPin, Output>,
        mux_b: PinDriver<'static, AnyOutputPin, Output>,
        boost: PinDriver<'static, AnyOutputPin, Output>,
        idle_code: u16,
        boot_gain: u8,
    ) -> Result<Self, Error> {
        let timers = EspTickTimers::new()?;
        let mut hw = Self {
            i2c,
            mux_a,
            mux_b,
            boost,
            timers,
        };
        Ads1115::new(&mut hw.i2c, ads1115::DEFAULT_ADDR)
            .start_continuous()
            .map_err(|_| Error::Hardware("ADC configure"))?;
        hw.write_code(idle_code)?;
        hw.select(boot_gain)?;
        Ok(hw)
    }
}

impl AnalogOutPort for HardwareAdapter {
    fn write_code(&mut self, code: u16) -> Result<(), Error> {
        Max5217::new(&mut self.i2c, max5217::DEFAULT_ADDR)
            .write_code(code)
            .map_err(|_| Error::Hardware("DAC write"))
    }
}

impl AnalogInPort for HardwareAdapter {
    fn read_differential(&mut self) -> Result<i16, Error> {
        Ads1115::new(&mut self.i2c, ads1115::DEFAULT_ADDR)
            .read_raw()
            .map_err(|_| Error::AdcRead)
    }
}

impl GainPort for HardwareAdapter {
    fn select(&mut self, code: u8) -> Result<f32, Error> {
        let kohm = gain::effective_kohm(code).ok_or(Error::Hardware("gain code"))?;
        let (a, b) = gain::mux_bits(code);
        self.mux_a
            .set_level(a.into())
            .map_err(|_| Error::Hardware("gain mux"))?;
        self.mux_b
            .set_level(b.into())
            .map_err(|_| Error::Hardware("gain mux"))?;
        self.boost
            .set_level(gain::boost_enabled(code).into())
            .map_err(|_| Error::Hardware("gain boost"))?;
        Ok(kohm)
    }
}

impl TickTimerPort for HardwareAdapter {
    fn start_output(&mut self, period_us: u64) -> Result<(), Error> {
        self.timers.start_output(period_us)
    }

    fn start_sample(&mut self, period_us: u64) -> Result<(), Error> {
        self.timers.start_sample(period_us)
    }

    fn stop_all(&mut self) {
        self.timers.stop_all();
    }
}
