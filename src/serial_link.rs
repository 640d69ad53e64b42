use anyhow::Result;
use serialport::SerialPort;
use std::io::Write;
use std::time::Duration;

pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Line commands understood by the turn-table motor controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MotorCommand {
    Cw,
    Ccw,
    Stop,
    /// Advance one sweep position.
    Step,
}

impl MotorCommand {
    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            MotorCommand::Cw => b":CW\n",
            MotorCommand::Ccw => b":CCW\n",
            MotorCommand::Stop => b":STOP\n",
            MotorCommand::Step => b"STEP\n",
        }
    }
}

/// Anything the engine can push motor commands into.
pub trait CommandSink: Send {
    fn send(&mut self, cmd: MotorCommand) -> Result<()>;

    fn name(&self) -> &str;
}

/// Lists serial devices on this machine, sorted by name. Enumeration failures
/// are treated as "no ports" so the UI can still offer simulation.
pub fn available_ports() -> Vec<String> {
    let mut ports: Vec<String> = match serialport::available_ports() {
        Ok(list) => list.into_iter().map(|p| p.port_name).collect(),
        Err(e) => {
            log::warn!("serial port enumeration failed: {e}");
            Vec::new()
        }
    };
    ports.sort();
    ports
}

/// Serial session with the turn-table controller.
///
/// Writes are fire-and-forget: every command is a single ASCII line and the
/// controller sends nothing back that the dashboard needs.
pub struct MotorLink {
    port_name: String,
    port: Box<dyn SerialPort>,
}

impl MotorLink {
    pub fn connect(port_name: &str, baud_rate: u32) -> Result<Self> {
        let port = serialport::new(port_name, baud_rate)
            .timeout(Duration::from_millis(200))
            .open()?;
        log::info!("opened {port_name} at {baud_rate} baud");

        Ok(Self {
            port_name: port_name.to_string(),
            port,
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

impl CommandSink for MotorLink {
    fn send(&mut self, cmd: MotorCommand) -> Result<()> {
        self.port.write_all(cmd.as_bytes())?;
        self.port.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        self.port_name()
    }
}

impl Drop for MotorLink {
    fn drop(&mut self) {
        log::info!("closing {}", self.port_name);
        let _ = self.port.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_bytes_match_controller_protocol() {
        assert_eq!(MotorCommand::Cw.as_bytes(), b":CW\n");
        assert_eq!(MotorCommand::Ccw.as_bytes(), b":CCW\n");
        assert_eq!(MotorCommand::Stop.as_bytes(), b":STOP\n");
        assert_eq!(MotorCommand::Step.as_bytes(), b"STEP\n");
    }

    #[test]
    fn opening_missing_port_fails() {
        assert!(MotorLink::connect("/dev/does-not-exist-rf-lab", DEFAULT_BAUD_RATE).is_err());
    }

    #[test]
    fn port_list_is_sorted() {
        let ports = available_ports();
        let mut sorted = ports.clone();
        sorted.sort();
        assert_eq!(ports, sorted);
    }
}
