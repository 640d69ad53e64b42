// src/frequency.rs

pub const VSG_MIN_GHZ: f64 = 5.8;
pub const VSG_MAX_GHZ: f64 = 6.0;
pub const VSG_STEP_GHZ: f64 = 0.01;
pub const DEFAULT_VSG_GHZ: f64 = 5.9;

/// Output frequency of the simulated vector signal generator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VsgFrequency {
    ghz: f64,
}

impl Default for VsgFrequency {
    fn default() -> Self {
        Self::new(DEFAULT_VSG_GHZ)
    }
}

impl VsgFrequency {
    pub fn new(ghz: f64) -> Self {
        let ghz = if ghz.is_finite() { ghz } else { DEFAULT_VSG_GHZ };
        Self {
            ghz: ghz.clamp(VSG_MIN_GHZ, VSG_MAX_GHZ),
        }
    }

    pub fn increment(&mut self) {
        *self = Self::new(self.ghz + VSG_STEP_GHZ);
    }

    pub fn decrement(&mut self) {
        *self = Self::new(self.ghz - VSG_STEP_GHZ);
    }

    pub fn ghz(&self) -> f64 {
        self.ghz
    }

    pub fn hz(&self) -> f64 {
        self.ghz * 1e9
    }

    /// Front-panel readout, e.g. `5.900 000 000 000`.
    pub fn display(&self) -> String {
        format!("{:.3} 000 000 000", self.ghz)
    }
}

/// Center of the analyzer window. Only moves when the operator presses Auto.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpectrumAxis {
    center_hz: f64,
}

impl Default for SpectrumAxis {
    fn default() -> Self {
        Self {
            center_hz: DEFAULT_VSG_GHZ * 1e9,
        }
    }
}

impl SpectrumAxis {
    pub fn center_hz(&self) -> f64 {
        self.center_hz
    }

    pub fn recenter(&mut self, vsg: &VsgFrequency) {
        self.center_hz = vsg.hz();
    }
}
