use crate::geometry::{DisplayMode, Geometry};

/// Default number of candidates kept by a probe.
pub const DEFAULT_CANDIDATES: usize = 3;

/// A probe of the trace at a fractional column and target value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Probe {
    pub x: f64,
    pub y: f64,
    /// Only look at the most recent wrap cycle.
    pub foreground: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Intersection {
    /// Interpolated trace value at the probe column.
    pub value: f64,
    /// Raw sample nearest to the probe column and its display column.
    pub near: f64,
    pub column: usize,
    pub distance: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Intersections {
    /// Closest first.
    pub hits: Vec<Intersection>,
    pub mean: f64,
}

impl Intersections {
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn nearest(&self) -> Option<&Intersection> {
        self.hits.first()
    }
}

/// Find where every wrap cycle of the trace crosses the probe column, keeping
/// the `max` values closest to the probe's target.
pub fn intersect(
    geometry: &Geometry,
    mode: DisplayMode,
    values: &[f64],
    push_count: u64,
    probe: Probe,
    max: usize,
) -> Intersections {
    let divisions = geometry.divisions();
    let history = values.len();
    if history < 2 || max == 0 {
        return Intersections::default();
    }

    let x = if probe.x.is_finite() && (0.0..=divisions as f64).contains(&probe.x) {
        probe.x
    } else {
        0.0
    };
    let column = (x.floor() as usize).min(divisions - 1);
    let mul = x - column as f64;

    let first_column = geometry.column(mode, push_count, 0);
    let mut slot = (column + divisions - first_column) % divisions;
    if probe.foreground && slot + 1 < history {
        slot += (history - 2 - slot) / divisions * divisions;
    }

    let mut hits = Vec::new();
    while slot + 1 < history {
        let left = values[slot];
        let right = values[slot + 1];
        if left.is_finite() && right.is_finite() {
            let (near, near_slot) = if mul < 0.5 {
                (left, slot)
            } else {
                (right, slot + 1)
            };
            let value = left + mul * (right - left);
            hits.push(Intersection {
                value,
                near,
                column: geometry.column(mode, push_count, near_slot),
                distance: (value - probe.y).abs(),
            });
        }
        slot += divisions;
    }

    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    hits.truncate(max);
    if hits.is_empty() {
        return Intersections::default();
    }
    let mean = hits.iter().map(|hit| hit.value).sum::<f64>() / hits.len() as f64;
    Intersections { hits, mean }
}
