// src/sweep.rs
use crate::pattern::{PatternPoint, PatternTable};

/// Highest turn-table angle the sweep will emit.
pub const MAX_SWEEP_ANGLE_DEG: f64 = 360.0;

/// Cursor over the pattern table, advanced once per timer tick while running.
#[derive(Clone, Debug)]
pub struct SweepController {
    table: PatternTable,
    cursor: usize,
    running: bool,
    trace: Vec<PatternPoint>,
    last_signal_dbm: f64,
}

impl SweepController {
    pub fn new(table: PatternTable) -> Self {
        let last_signal_dbm = table.first_signal_dbm();
        Self {
            table,
            cursor: 0,
            running: false,
            trace: Vec::new(),
            last_signal_dbm,
        }
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
        self.trace.clear();
        self.running = false;
    }

    /// Swaps in a freshly loaded table. The cursor is left where it is and
    /// only returns to the start on the next `reset`.
    pub fn replace_table(&mut self, table: PatternTable) {
        self.last_signal_dbm = table.first_signal_dbm();
        self.table = table;
    }

    /// Emits the point under the cursor if the sweep is running and the point
    /// is in range. Running past the table end or beyond 360 deg stops the sweep.
    pub fn tick(&mut self) -> Option<PatternPoint> {
        let next = self
            .table
            .get(self.cursor)
            .filter(|p| p.angle_deg <= MAX_SWEEP_ANGLE_DEG);

        match next {
            Some(point) if self.running => {
                self.trace.push(point);
                self.last_signal_dbm = point.signal_dbm;
                self.cursor += 1;
                Some(point)
            }
            Some(_) => None,
            None => {
                self.running = false;
                None
            }
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn trace(&self) -> &[PatternPoint] {
        &self.trace
    }

    pub fn last_signal_dbm(&self) -> f64 {
        self.last_signal_dbm
    }

    pub fn table(&self) -> &PatternTable {
        &self.table
    }

    /// Angle shown on the turn-table LCD.
    pub fn current_angle_deg(&self) -> f64 {
        self.trace.last().map(|p| p.angle_deg).unwrap_or(0.0)
    }
}
