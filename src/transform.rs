/// How raw stream values turn into plotted samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Absolute,
    /// Difference between consecutive values.
    Incremental,
    /// Running sum of the values.
    Differential,
}

impl InputMode {
    pub fn from_flag(flag: char) -> Option<Self> {
        match flag {
            'a' => Some(InputMode::Absolute),
            'i' => Some(InputMode::Incremental),
            'd' => Some(InputMode::Differential),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            InputMode::Absolute => "absolute",
            InputMode::Incremental => "incremental",
            InputMode::Differential => "differential",
        }
    }

    /// Whether a baseline value must be read before the first sample.
    pub fn needs_seed(self) -> bool {
        self == InputMode::Incremental
    }
}

/// Per-channel transform state.
#[derive(Clone, Debug)]
pub struct Transform {
    mode: InputMode,
    old: f64,
}

impl Transform {
    pub fn new(mode: InputMode) -> Self {
        Self { mode, old: 0.0 }
    }

    pub fn seed(&mut self, value: f64) {
        self.old = value;
    }

    pub fn apply(&mut self, x: f64) -> f64 {
        match self.mode {
            InputMode::Absolute => x,
            InputMode::Incremental => {
                let out = x - self.old;
                self.old = x;
                out
            }
            InputMode::Differential => {
                self.old += x;
                self.old
            }
        }
    }
}
