// src/engine.rs
use crate::config::DashboardConfig;
use crate::frequency::{SpectrumAxis, VsgFrequency};
use crate::pattern::{PatternError, PatternTable};
use crate::serial_link::{CommandSink, MotorCommand, MotorLink};
use crate::spectrum::{SpectrumGenerator, SpectrumTrace};
use crate::sweep::SweepController;
use crate::types::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;
use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// All mutable bench state. Commands and ticks are applied strictly in order
/// by the engine thread, so nothing here needs locking.
pub struct Bench {
    sweep: SweepController,
    frequency: VsgFrequency,
    axis: SpectrumAxis,
    generator: SpectrumGenerator,
    spectrum: SpectrumTrace,
    mode: ConnectionMode,
    link: Option<Box<dyn CommandSink>>,
    baud_rate: u32,
}

impl Bench {
    pub fn new(table: PatternTable, config: &DashboardConfig) -> Self {
        let frequency = VsgFrequency::new(config.initial_frequency_ghz);
        let mut axis = SpectrumAxis::default();
        axis.recenter(&frequency);
        Self {
            sweep: SweepController::new(table),
            frequency,
            axis,
            generator: SpectrumGenerator::default(),
            spectrum: SpectrumTrace::default(),
            mode: ConnectionMode::Simulation,
            link: None,
            baud_rate: config.baud_rate,
        }
    }

    /// Loads the configured pattern, falling back to the built-in one.
    pub fn from_config(config: &DashboardConfig) -> (Self, String) {
        let (table, note) = initial_pattern(&config.pattern_path);
        (Self::new(table, config), note)
    }

    /// Puts the bench in hardware mode on an already opened link.
    pub fn attach_link(&mut self, link: Box<dyn CommandSink>) {
        self.link = Some(link);
        self.mode = ConnectionMode::Hardware;
    }

    fn enter_simulation(&mut self) {
        // Dropping the link closes the port.
        self.link = None;
        self.mode = ConnectionMode::Simulation;
    }

    /// Best-effort write; never interrupts the sweep.
    fn send_motor(&mut self, cmd: MotorCommand) {
        if self.mode != ConnectionMode::Hardware {
            return;
        }
        if let Some(link) = self.link.as_mut() {
            if let Err(e) = link.send(cmd) {
                log::warn!("{:?} to {} failed: {e}", cmd, link.name());
            }
        }
    }

    pub fn handle(&mut self, cmd: GuiCommand) -> Vec<BenchMessage> {
        let mut out = Vec::new();
        match cmd {
            GuiCommand::Connect(ConnectionMode::Simulation, _) | GuiCommand::Disconnect => {
                self.enter_simulation();
                out.push(BenchMessage::SerialStatus("Simulation".to_owned()));
                out.push(BenchMessage::Log("Simulation mode".to_owned()));
            }
            GuiCommand::Connect(ConnectionMode::Hardware, port) => {
                // Close the old port before opening, it may be the same device.
                self.enter_simulation();
                match MotorLink::connect(&port, self.baud_rate) {
                    Ok(link) => {
                        self.attach_link(Box::new(link));
                        out.push(BenchMessage::SerialStatus(format!("Connected {port}")));
                        out.push(BenchMessage::Log(format!(
                            "Motor controller on {port} ({} baud)",
                            self.baud_rate
                        )));
                    }
                    Err(e) => {
                        log::warn!("opening {port} failed: {e}");
                        out.push(BenchMessage::SerialStatus(format!("Error {e}")));
                        out.push(BenchMessage::Log(format!(
                            "Failed to open {port}, staying in simulation"
                        )));
                    }
                }
            }
            GuiCommand::StartSweep => {
                self.sweep.start();
                out.push(BenchMessage::Log("Sweep started".to_owned()));
            }
            GuiCommand::StopSweep => {
                self.sweep.stop();
                out.push(BenchMessage::Log("Sweep stopped".to_owned()));
            }
            GuiCommand::ResetSweep => {
                self.sweep.reset();
                out.push(BenchMessage::Log("Sweep reset".to_owned()));
            }
            GuiCommand::FrequencyUp => self.frequency.increment(),
            GuiCommand::FrequencyDown => self.frequency.decrement(),
            GuiCommand::Recenter => {
                self.axis.recenter(&self.frequency);
                log::debug!("analyzer recentered at {} Hz", self.axis.center_hz());
            }
            GuiCommand::Motor(cmd) => self.send_motor(cmd),
            GuiCommand::LoadPattern(path) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                let result = PatternTable::load(&path);
                out.push(self.apply_upload(&name, result));
            }
            GuiCommand::LoadPatternBytes(name, bytes) => {
                let result = PatternTable::parse(bytes.as_slice());
                out.push(self.apply_upload(&name, result));
            }
        }
        out
    }

    fn apply_upload(&mut self, name: &str, result: Result<PatternTable, PatternError>) -> BenchMessage {
        match result {
            Ok(table) => {
                log::info!("loaded pattern '{name}' ({} points)", table.len());
                self.sweep.replace_table(table);
                BenchMessage::UploadStatus(format!("File '{name}' uploaded successfully."))
            }
            Err(e) => {
                log::warn!("pattern '{name}' rejected: {e}");
                BenchMessage::UploadStatus(format!("Error processing file: {e}"))
            }
        }
    }

    /// One timer tick: advance the sweep, then redraw the spectrum.
    pub fn tick<R: Rng>(&mut self, rng: &mut R) -> BenchSnapshot {
        if self.sweep.tick().is_some() {
            self.send_motor(MotorCommand::Step);
        }
        self.spectrum = self.generator.generate(
            self.axis.center_hz(),
            self.frequency.hz(),
            self.sweep.last_signal_dbm(),
            rng,
        );
        self.snapshot()
    }

    pub fn snapshot(&self) -> BenchSnapshot {
        BenchSnapshot {
            mode: self.mode,
            port: self.link.as_ref().map(|l| l.name().to_owned()),
            running: self.sweep.is_running(),
            cursor: self.sweep.cursor(),
            table_len: self.sweep.table().len(),
            trace: self.sweep.trace().to_vec(),
            current_angle_deg: self.sweep.current_angle_deg(),
            last_signal_dbm: self.sweep.last_signal_dbm(),
            vsg_ghz: self.frequency.ghz(),
            vsg_display: self.frequency.display(),
            axis_center_hz: self.axis.center_hz(),
            spectrum: self.spectrum.clone(),
        }
    }

    pub fn sweep(&self) -> &SweepController {
        &self.sweep
    }

    pub fn mode(&self) -> ConnectionMode {
        self.mode
    }
}

fn initial_pattern(path: &Path) -> (PatternTable, String) {
    match PatternTable::load(path) {
        Ok(table) => {
            let note = format!("Pattern {} ({} points)", path.display(), table.len());
            (table, note)
        }
        Err(e) => {
            log::warn!("{}: {e}; using built-in pattern", path.display());
            (
                PatternTable::builtin(),
                format!("{} unavailable, using built-in pattern", path.display()),
            )
        }
    }
}

pub fn spawn_thread(
    config: DashboardConfig,
    tx: Sender<BenchMessage>,
    rx_cmd: Receiver<GuiCommand>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let (mut bench, note) = Bench::from_config(&config);
        let mut rng = StdRng::from_entropy();
        let tick = Duration::from_millis(config.tick_ms.max(10));

        tx.send(BenchMessage::Log("Bench engine ready".to_owned())).ok();
        tx.send(BenchMessage::Log(note)).ok();
        tx.send(BenchMessage::SerialStatus("Simulation".to_owned())).ok();

        loop {
            // 1. 处理 GUI 命令 (非阻塞)
            loop {
                match rx_cmd.try_recv() {
                    Ok(cmd) => {
                        for msg in bench.handle(cmd) {
                            tx.send(msg).ok();
                        }
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        log::info!("GUI closed, engine exiting");
                        return;
                    }
                }
            }

            // 2. 定时推进扫描并刷新频谱
            let snapshot = bench.tick(&mut rng);
            if tx.send(BenchMessage::Snapshot(snapshot)).is_err() {
                return;
            }

            thread::sleep(tick);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::PatternPoint;
    use std::sync::mpsc::channel;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingSink {
        sent: Arc<Mutex<Vec<MotorCommand>>>,
    }

    impl CommandSink for RecordingSink {
        fn send(&mut self, cmd: MotorCommand) -> anyhow::Result<()> {
            self.sent.lock().unwrap().push(cmd);
            Ok(())
        }

        fn name(&self) -> &str {
            "fake0"
        }
    }

    struct FailingSink;

    impl CommandSink for FailingSink {
        fn send(&mut self, _cmd: MotorCommand) -> anyhow::Result<()> {
            anyhow::bail!("cable unplugged")
        }

        fn name(&self) -> &str {
            "broken0"
        }
    }

    fn table(rows: &[(f64, f64)]) -> PatternTable {
        PatternTable::new(
            rows.iter()
                .map(|&(angle_deg, signal_dbm)| PatternPoint {
                    angle_deg,
                    signal_dbm,
                })
                .collect(),
        )
        .unwrap()
    }

    fn bench() -> Bench {
        Bench::new(
            table(&[(0.0, -30.0), (10.0, -35.0), (20.0, -40.0)]),
            &DashboardConfig::default(),
        )
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(11)
    }

    fn upload_status(msgs: &[BenchMessage]) -> Option<&str> {
        msgs.iter().find_map(|m| match m {
            BenchMessage::UploadStatus(s) => Some(s.as_str()),
            _ => None,
        })
    }

    #[test]
    fn sweep_runs_to_completion_and_stops() {
        let mut bench = bench();
        let mut rng = rng();
        bench.handle(GuiCommand::StartSweep);
        for _ in 0..3 {
            assert!(bench.tick(&mut rng).running);
        }
        let snap = bench.tick(&mut rng);
        assert!(!snap.running);
        assert_eq!(snap.trace.len(), 3);
        assert_eq!(snap.current_angle_deg, 20.0);
        assert_eq!(snap.last_signal_dbm, -40.0);
    }

    #[test]
    fn reset_clears_trace_and_cursor() {
        let mut bench = bench();
        let mut rng = rng();
        bench.handle(GuiCommand::StartSweep);
        bench.tick(&mut rng);
        bench.tick(&mut rng);
        bench.handle(GuiCommand::ResetSweep);
        let snap = bench.snapshot();
        assert_eq!(snap.cursor, 0);
        assert!(snap.trace.is_empty());
        assert!(!snap.running);
        assert_eq!(snap.current_angle_deg, 0.0);
    }

    #[test]
    fn upload_replaces_table_and_applies_after_reset() {
        let mut bench = bench();
        let mut rng = rng();
        bench.handle(GuiCommand::StartSweep);
        bench.tick(&mut rng);

        let csv = b"Angle,Signal\n0,-12\n45,-18\n".to_vec();
        let msgs = bench.handle(GuiCommand::LoadPatternBytes("horn.csv".to_owned(), csv));
        assert_eq!(upload_status(&msgs), Some("File 'horn.csv' uploaded successfully."));
        assert_eq!(bench.sweep().cursor(), 1);
        assert_eq!(bench.snapshot().table_len, 2);
        assert_eq!(bench.snapshot().last_signal_dbm, -12.0);

        bench.handle(GuiCommand::ResetSweep);
        bench.handle(GuiCommand::StartSweep);
        let snap = bench.tick(&mut rng);
        assert_eq!(snap.trace, vec![PatternPoint { angle_deg: 0.0, signal_dbm: -12.0 }]);
    }

    #[test]
    fn failed_upload_keeps_previous_table() {
        let mut bench = bench();
        let msgs = bench.handle(GuiCommand::LoadPatternBytes(
            "bad.csv".to_owned(),
            b"Angle,Signal\n0,abc\n".to_vec(),
        ));
        let status = upload_status(&msgs).unwrap();
        assert!(status.starts_with("Error processing file:"), "{status}");
        assert_eq!(bench.snapshot().table_len, 3);
        assert_eq!(bench.snapshot().last_signal_dbm, -30.0);
    }

    #[test]
    fn upload_from_path_uses_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dipole.csv");
        std::fs::write(&path, "Angle,Signal\n0,-20\n").unwrap();
        let mut bench = bench();
        let msgs = bench.handle(GuiCommand::LoadPattern(path));
        assert_eq!(upload_status(&msgs), Some("File 'dipole.csv' uploaded successfully."));
        assert_eq!(bench.snapshot().table_len, 1);
    }

    #[test]
    fn frequency_commands_stay_in_band() {
        let mut bench = bench();
        for _ in 0..40 {
            bench.handle(GuiCommand::FrequencyUp);
        }
        assert_eq!(bench.snapshot().vsg_ghz, 6.0);
        for _ in 0..40 {
            bench.handle(GuiCommand::FrequencyDown);
        }
        assert_eq!(bench.snapshot().vsg_ghz, 5.8);
        assert_eq!(bench.snapshot().vsg_display, "5.800 000 000 000");
    }

    #[test]
    fn axis_follows_generator_only_on_recenter() {
        let mut bench = bench();
        let mut rng = rng();
        bench.handle(GuiCommand::FrequencyUp);
        let snap = bench.tick(&mut rng);
        assert_eq!(snap.axis_center_hz, 5.9e9);
        assert!((snap.spectrum.window().0 - (5.9e9 - 25e6)).abs() < 1.0);

        bench.handle(GuiCommand::Recenter);
        let snap = bench.tick(&mut rng);
        assert!((snap.axis_center_hz - 5.91e9).abs() < 1.0);
    }

    #[test]
    fn spectrum_peak_tracks_last_signal() {
        let mut bench = bench();
        let mut rng = rng();
        let snap = bench.tick(&mut rng);
        let center = snap.spectrum.power_dbm[snap.spectrum.power_dbm.len() / 2];
        assert!(center > -80.0);
        assert!(center <= -30.0);
    }

    #[test]
    fn each_emitted_point_steps_motor_once() {
        let sink = RecordingSink::default();
        let mut bench = bench();
        let mut rng = rng();
        bench.attach_link(Box::new(sink.clone()));
        bench.handle(GuiCommand::StartSweep);
        for _ in 0..5 {
            bench.tick(&mut rng);
        }
        assert_eq!(*sink.sent.lock().unwrap(), vec![MotorCommand::Step; 3]);
    }

    #[test]
    fn motor_buttons_forward_to_link() {
        let sink = RecordingSink::default();
        let mut bench = bench();
        bench.attach_link(Box::new(sink.clone()));
        bench.handle(GuiCommand::Motor(MotorCommand::Cw));
        bench.handle(GuiCommand::Motor(MotorCommand::Stop));
        assert_eq!(
            *sink.sent.lock().unwrap(),
            vec![MotorCommand::Cw, MotorCommand::Stop]
        );
        assert_eq!(bench.snapshot().port.as_deref(), Some("fake0"));
    }

    #[test]
    fn simulation_drops_motor_commands() {
        let sink = RecordingSink::default();
        let mut bench = bench();
        let mut rng = rng();
        bench.attach_link(Box::new(sink.clone()));
        let msgs = bench.handle(GuiCommand::Connect(ConnectionMode::Simulation, String::new()));
        assert!(matches!(&msgs[0], BenchMessage::SerialStatus(s) if s == "Simulation"));
        assert_eq!(bench.mode(), ConnectionMode::Simulation);

        bench.handle(GuiCommand::Motor(MotorCommand::Ccw));
        bench.handle(GuiCommand::StartSweep);
        bench.tick(&mut rng);
        assert!(sink.sent.lock().unwrap().is_empty());
        assert_eq!(bench.snapshot().trace.len(), 1);
    }

    #[test]
    fn write_failure_does_not_stop_sweep() {
        let mut bench = bench();
        let mut rng = rng();
        bench.attach_link(Box::new(FailingSink));
        bench.handle(GuiCommand::StartSweep);
        bench.tick(&mut rng);
        let snap = bench.tick(&mut rng);
        assert!(snap.running);
        assert_eq!(snap.trace.len(), 2);
    }

    #[test]
    fn failed_open_falls_back_to_simulation() {
        let sink = RecordingSink::default();
        let mut bench = bench();
        bench.attach_link(Box::new(sink));
        let msgs = bench.handle(GuiCommand::Connect(
            ConnectionMode::Hardware,
            "/dev/does-not-exist-rf-lab".to_owned(),
        ));
        assert!(matches!(&msgs[0], BenchMessage::SerialStatus(s) if s.starts_with("Error")));
        assert_eq!(bench.mode(), ConnectionMode::Simulation);
        assert!(bench.snapshot().port.is_none());
    }

    #[test]
    fn missing_default_pattern_uses_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let config = DashboardConfig {
            pattern_path: dir.path().join("Molex.csv"),
            ..Default::default()
        };
        let (bench, note) = Bench::from_config(&config);
        assert_eq!(bench.snapshot().table_len, PatternTable::builtin().len());
        assert!(note.contains("built-in"));
    }

    #[test]
    fn engine_thread_publishes_snapshots_and_exits() {
        let dir = tempfile::tempdir().unwrap();
        let config = DashboardConfig {
            pattern_path: dir.path().join("missing.csv"),
            tick_ms: 10,
            ..Default::default()
        };
        let (tx, rx) = channel();
        let (tx_cmd, rx_cmd) = channel();
        let handle = spawn_thread(config, tx, rx_cmd);

        tx_cmd.send(GuiCommand::StartSweep).unwrap();
        let mut saw_progress = false;
        for _ in 0..200 {
            match rx.recv_timeout(Duration::from_secs(2)) {
                Ok(BenchMessage::Snapshot(snap)) if !snap.trace.is_empty() => {
                    saw_progress = true;
                    break;
                }
                Ok(_) => continue,
                Err(e) => panic!("engine went silent: {e}"),
            }
        }
        assert!(saw_progress);

        drop(tx_cmd);
        handle.join().unwrap();
    }
}
