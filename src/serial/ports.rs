//! Serial port enumeration and the common baud rate table.

use log::warn;

/// Baud rates offered by the front end.
pub const COMMON_BAUD_RATES: &[u32] = &[
    4800, 9600, 19200, 38400, 57600, 115200, 230400, 460800, 500000, 576000, 921600, 1000000,
    1500000, 2000000,
];

/// Names of the serial ports currently present on the system.
///
/// Enumeration failures are logged and yield an empty list.
pub fn list_ports() -> Vec<String> {
    match tokio_serial::available_ports() {
        Ok(ports) => ports.into_iter().map(|p| p.port_name).collect(),
        Err(e) => {
            warn!("Error listing ports: {e}");
            Vec::new()
        }
    }
}
