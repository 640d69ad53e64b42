// src/pattern.rs
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use thiserror::Error;

/// One sample of the antenna pattern: turn-table azimuth and received level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PatternPoint {
    pub angle_deg: f64,
    pub signal_dbm: f64,
}

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("failed to read pattern: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: expected two columns (angle, signal)")]
    MissingColumn { line: usize },
    #[error("line {line}: '{value}' is not a number")]
    InvalidNumber { line: usize, value: String },
    #[error("pattern table has no data rows")]
    Empty,
}

/// Angle/signal table read by the sweep cursor. Never empty.
#[derive(Clone, Debug, PartialEq)]
pub struct PatternTable {
    points: Vec<PatternPoint>,
}

impl PatternTable {
    pub fn new(points: Vec<PatternPoint>) -> Result<Self, PatternError> {
        if points.is_empty() {
            return Err(PatternError::Empty);
        }
        Ok(Self { points })
    }

    /// Parses a two-column CSV export. The first row is always treated as a
    /// header; blank rows are skipped and any columns after the signal are ignored.
    pub fn parse<R: Read>(reader: R) -> Result<Self, PatternError> {
        let reader = BufReader::new(reader);
        let mut points = Vec::new();

        for (idx, line) in reader.lines().enumerate().skip(1) {
            let line = line?;
            let line_no = idx + 1;
            let cleaned = line.trim().trim_start_matches('\u{feff}');
            if cleaned.is_empty() {
                continue;
            }
            let mut fields = cleaned.split(',').map(str::trim);
            let angle = parse_field(fields.next(), line_no)?;
            let signal = parse_field(fields.next(), line_no)?;
            points.push(PatternPoint {
                angle_deg: angle,
                signal_dbm: signal,
            });
        }

        Self::new(points)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, PatternError> {
        let file = File::open(path.as_ref())?;
        Self::parse(file)
    }

    /// Synthetic directional pattern (0..=360 deg, 5 deg steps) used when no
    /// measurement file is available.
    pub fn builtin() -> Self {
        let points = (0..=72)
            .map(|i| {
                let angle_deg = i as f64 * 5.0;
                let theta = angle_deg.to_radians();
                // Main lobe at 0 deg, shallow back lobe at 180 deg.
                let gain = 0.5 * (1.0 + theta.cos());
                let signal_dbm = (-75.0 + 50.0 * gain.powf(1.5)).max(-95.0);
                PatternPoint {
                    angle_deg,
                    signal_dbm,
                }
            })
            .collect();
        Self { points }
    }

    pub fn points(&self) -> &[PatternPoint] {
        &self.points
    }

    pub fn get(&self, idx: usize) -> Option<PatternPoint> {
        self.points.get(idx).copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn first_signal_dbm(&self) -> f64 {
        self.points[0].signal_dbm
    }
}

fn parse_field(field: Option<&str>, line: usize) -> Result<f64, PatternError> {
    let raw = match field {
        Some(s) if !s.is_empty() => s,
        _ => return Err(PatternError::MissingColumn { line }),
    };
    raw.trim_matches('"')
        .parse()
        .map_err(|_| PatternError::InvalidNumber {
            line,
            value: raw.to_owned(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parse_skips_header_and_blank_rows() {
        let csv = "Angle,Signal\n0,-40.5\n\n10,-42\n20, -45.25 \n";
        let table = PatternTable::parse(csv.as_bytes()).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(
            table.get(2),
            Some(PatternPoint {
                angle_deg: 20.0,
                signal_dbm: -45.25
            })
        );
        assert_eq!(table.first_signal_dbm(), -40.5);
    }

    #[test]
    fn first_row_is_dropped_even_if_numeric() {
        let csv = "0,-10\n5,-20\n";
        let table = PatternTable::parse(csv.as_bytes()).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(0).unwrap().angle_deg, 5.0);
    }

    #[test]
    fn extra_columns_are_ignored() {
        let csv = "Angle,Signal,Note\n0,-30,peak\n";
        let table = PatternTable::parse(csv.as_bytes()).unwrap();
        assert_eq!(table.get(0).unwrap().signal_dbm, -30.0);
    }

    #[test]
    fn missing_signal_column_reports_line() {
        let csv = "Angle,Signal\n0,-30\n10\n";
        match PatternTable::parse(csv.as_bytes()) {
            Err(PatternError::MissingColumn { line }) => assert_eq!(line, 3),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn non_numeric_value_is_rejected() {
        let csv = "Angle,Signal\nten,-30\n";
        match PatternTable::parse(csv.as_bytes()) {
            Err(PatternError::InvalidNumber { line, value }) => {
                assert_eq!(line, 2);
                assert_eq!(value, "ten");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn header_only_is_empty() {
        assert!(matches!(
            PatternTable::parse("Angle,Signal\n".as_bytes()),
            Err(PatternError::Empty)
        ));
    }

    #[test]
    fn load_reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Angle,Signal").unwrap();
        writeln!(file, "0,-35").unwrap();
        writeln!(file, "90,-60").unwrap();
        let table = PatternTable::load(file.path()).unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = PatternTable::load(dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, PatternError::Io(_)));
    }

    #[test]
    fn builtin_covers_full_turn() {
        let table = PatternTable::builtin();
        assert_eq!(table.get(0).unwrap().angle_deg, 0.0);
        assert_eq!(table.points().last().unwrap().angle_deg, 360.0);
        assert!(table
            .points()
            .iter()
            .all(|p| (-100.0..=0.0).contains(&p.signal_dbm)));
    }
}
