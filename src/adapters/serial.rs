//! UART serial adapter.
//!
//! Non-blocking byte polling for the command path and blocking writes for
//! telemetry. Frame pacing and timeouts live in the command reader, not
//! here.

use esp_idf_hal::uart::UartDriver;

use crate::app::ports::SerialPort;

pub struct UartSerial {
    uart: UartDriver<'static>,
}

impl UartSerial {
    pub fn new(uart: UartDriver<'static>) -> Self {
        Self { uart }
    }
}

impl SerialPort for UartSerial {
    fn poll_byte(&mut self) -> Option<u8> {
        let mut buf = [0u8; 1];
        match self.uart.read(&mut buf, 0) {
            Ok(1) => Some(buf[0]),
            _ => None,
        }
    }

    fn write_all(&mut self, bytes: &[u8]) {
        let mut rest = bytes;
        while !rest.is_empty() {
            match self.uart.write(rest) {
                Ok(0) | Err(_) => {
                    // Telemetry is best effort: drop the remainder rather
                    // than stall the control loop on a wedged link.
                    log::warn!("serial: dropped {} telemetry bytes", rest.len());
                    return;
                }
                Ok(n) => rest = &rest[n..],
            }
        }
    }
}
