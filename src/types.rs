// src/types.rs
use crate::pattern::PatternPoint;
use crate::serial_link::MotorCommand;
use crate::spectrum::SpectrumTrace;
use std::path::PathBuf;

#[derive(PartialEq, Clone, Copy, Debug)]
pub enum ConnectionMode {
    Simulation,
    Hardware,
}

#[derive(Clone, Debug)]
pub enum GuiCommand {
    /// (mode, port name). The port is ignored in simulation mode.
    Connect(ConnectionMode, String),
    Disconnect,
    StartSweep,
    StopSweep,
    ResetSweep,
    FrequencyUp,
    FrequencyDown,
    /// Move the analyzer window onto the current generator frequency ("Auto").
    Recenter,
    Motor(MotorCommand),
    LoadPattern(PathBuf),
    /// (display name, raw CSV bytes) for drops that carry no path.
    LoadPatternBytes(String, Vec<u8>),
}

#[derive(Clone, Debug)]
pub enum BenchMessage {
    Log(String),
    SerialStatus(String),
    UploadStatus(String),
    Snapshot(BenchSnapshot),
}

/// Everything the GUI needs to draw one frame.
#[derive(Clone, Debug)]
pub struct BenchSnapshot {
    pub mode: ConnectionMode,
    pub port: Option<String>,
    pub running: bool,
    pub cursor: usize,
    pub table_len: usize,
    pub trace: Vec<PatternPoint>,
    pub current_angle_deg: f64,
    pub last_signal_dbm: f64,
    pub vsg_ghz: f64,
    pub vsg_display: String,
    pub axis_center_hz: f64,
    pub spectrum: SpectrumTrace,
}
