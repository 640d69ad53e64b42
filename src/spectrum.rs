// src/spectrum.rs
use rand::Rng;
use rand_distr::StandardNormal;

pub const SPECTRUM_POINTS: usize = 1001;
pub const SPAN_HZ: f64 = 50e6;
/// Gaussian sigma of the simulated carrier.
pub const SIGNAL_WIDTH_HZ: f64 = 500e3;
/// The carrier is drawn slightly below the generator frequency.
pub const SIGNAL_OFFSET_HZ: f64 = 150e3;
pub const BASELINE_DBM: f64 = -100.0;
pub const NOISE_MEAN_DBM: f64 = -90.0;
pub const NOISE_STD_DB: f64 = 5.5;
pub const NOISE_CEILING_DBM: f64 = -80.0;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpectrumTrace {
    pub frequencies_hz: Vec<f64>,
    pub power_dbm: Vec<f64>,
}

impl SpectrumTrace {
    /// (lowest, highest) frequency of the window.
    pub fn window(&self) -> (f64, f64) {
        match (self.frequencies_hz.first(), self.frequencies_hz.last()) {
            (Some(lo), Some(hi)) => (*lo, *hi),
            _ => (0.0, 0.0),
        }
    }
}

/// Builds the analyzer trace: a clipped Gaussian noise floor with a single
/// carrier bump whose height follows the last measured pattern level.
#[derive(Clone, Copy, Debug)]
pub struct SpectrumGenerator {
    pub points: usize,
    pub span_hz: f64,
    pub signal_width_hz: f64,
}

impl Default for SpectrumGenerator {
    fn default() -> Self {
        Self {
            points: SPECTRUM_POINTS,
            span_hz: SPAN_HZ,
            signal_width_hz: SIGNAL_WIDTH_HZ,
        }
    }
}

impl SpectrumGenerator {
    pub fn frequencies(&self, center_hz: f64) -> Vec<f64> {
        let start = center_hz - self.span_hz / 2.0;
        if self.points < 2 {
            return vec![center_hz; self.points];
        }
        let step = self.span_hz / (self.points - 1) as f64;
        (0..self.points).map(|i| start + i as f64 * step).collect()
    }

    pub fn signal_at(&self, freq_hz: f64, vsg_hz: f64, last_signal_dbm: f64) -> f64 {
        let amplitude = last_signal_dbm - BASELINE_DBM;
        let delta = freq_hz - vsg_hz + SIGNAL_OFFSET_HZ;
        BASELINE_DBM
            + amplitude * (-(delta * delta) / (2.0 * self.signal_width_hz * self.signal_width_hz)).exp()
    }

    pub fn generate<R: Rng>(
        &self,
        center_hz: f64,
        vsg_hz: f64,
        last_signal_dbm: f64,
        rng: &mut R,
    ) -> SpectrumTrace {
        let frequencies_hz = self.frequencies(center_hz);
        let power_dbm = frequencies_hz
            .iter()
            .map(|&f| {
                let z: f64 = rng.sample(StandardNormal);
                let floor = (NOISE_MEAN_DBM + NOISE_STD_DB * z).min(NOISE_CEILING_DBM);
                floor.max(self.signal_at(f, vsg_hz, last_signal_dbm))
            })
            .collect();
        SpectrumTrace {
            frequencies_hz,
            power_dbm,
        }
    }
}
