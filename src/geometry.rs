//! Mapping from snapshot slots to display columns.
//!
//! A snapshot always holds `history` samples, oldest first. The x axis is
//! `divisions` columns wide and every sample is placed on a column in
//! `[0, divisions)`. Column 0 is drawn at both edges: a trace reaching it is
//! closed at `x = divisions` and restarted at `x = 0`.

/// How columns advance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DisplayMode {
    /// The newest sample always sits at the right edge.
    Scroll,
    /// Columns follow the stream position, overdrawing older cycles.
    #[default]
    Wrap,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Geometry {
    history: usize,
    divisions: usize,
    offset: usize,
}

impl Geometry {
    pub fn new(history: usize, divisions: usize) -> Self {
        assert!(history >= 2, "history must be at least 2");
        assert!(divisions >= 1, "divisions must be at least 1");
        Self {
            history,
            divisions,
            offset: divisions - (history % divisions) + 1,
        }
    }

    pub fn history(&self) -> usize {
        self.history
    }

    pub fn divisions(&self) -> usize {
        self.divisions
    }

    /// Phase correction aligning slot 0 with the display cycle.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Stream position of the sample in `slot`. Negative positions belong to
    /// slots that have never been written.
    pub fn sample_count(&self, push_count: u64, slot: usize) -> i64 {
        push_count as i64 - (self.history - slot) as i64
    }

    pub fn column(&self, mode: DisplayMode, push_count: u64, slot: usize) -> usize {
        let divisions = self.divisions as i64;
        let position = match mode {
            DisplayMode::Scroll => (slot + self.offset) as i64,
            DisplayMode::Wrap => self.sample_count(push_count, slot),
        };
        position.rem_euclid(divisions) as usize
    }

    /// Opacity of the sample in `slot`. Dimmed shading shows the last cycle
    /// at full strength and everything older at half.
    pub fn shade(&self, slot: usize, dimmed: bool) -> f32 {
        if dimmed {
            if slot + self.divisions >= self.history {
                1.0
            } else {
                0.5
            }
        } else {
            slot as f32 / self.history as f32
        }
    }

    /// Break a snapshot into drawable pieces.
    pub fn trace(&self, values: &[f64], push_count: u64, mode: DisplayMode) -> Vec<TraceSegment> {
        let mut segments = Vec::new();
        let mut strip: Option<Vec<TracePoint>> = None;
        let right_edge = self.divisions as f64;

        for (slot, &value) in values.iter().enumerate() {
            let next_defined = values.get(slot + 1).is_none_or(|next| next.is_finite());
            if strip.is_none() && value.is_finite() && next_defined {
                strip = Some(Vec::new());
            }

            let column = self.column(mode, push_count, slot);
            match strip.as_mut() {
                Some(points) => {
                    if column == 0 {
                        points.push(TracePoint::new(right_edge, value, slot));
                        segments.push(TraceSegment::Strip(std::mem::take(points)));
                        points.push(TracePoint::new(0.0, value, slot));
                    } else {
                        points.push(TracePoint::new(column as f64, value, slot));
                    }
                }
                None if value.is_finite() => {
                    segments.push(TraceSegment::Dot(TracePoint::new(column as f64, value, slot)));
                }
                None => {}
            }

            let last = slot + 1 == values.len();
            if strip.is_some() && (last || !values[slot + 1].is_finite()) {
                if let Some(points) = strip.take() {
                    segments.push(TraceSegment::Strip(points));
                }
            }
        }

        segments.retain(|segment| match segment {
            TraceSegment::Strip(points) => points.len() >= 2,
            TraceSegment::Dot(_) => true,
        });
        segments
    }

    /// First slot of the last display cycle, including the sample that
    /// closes it.
    fn last_cycle(&self, len: usize) -> usize {
        len - len.min(self.divisions + 1)
    }

    /// Filled bands for the last cycle: down to zero, or with dimmed shading
    /// and enough history, between this cycle and the one before.
    pub fn fill(
        &self,
        values: &[f64],
        push_count: u64,
        mode: DisplayMode,
        dimmed: bool,
    ) -> Vec<FillBand> {
        if dimmed && values.len() >= self.divisions + 2 {
            self.fill_delta(values, push_count, mode)
        } else {
            self.fill_zero(values, push_count, mode)
        }
    }

    fn fill_zero(&self, values: &[f64], push_count: u64, mode: DisplayMode) -> Vec<FillBand> {
        let right_edge = self.divisions as f64;
        let mut bands = Vec::new();
        let mut band: Option<FillBand> = None;
        let mut last = f64::NAN;

        for slot in self.last_cycle(values.len())..values.len() {
            let value = values[slot];
            let next = values.get(slot + 1).copied();
            if band.is_none() && value.is_finite() && next.is_none_or(f64::is_finite) {
                last = value;
                band = Some(Vec::new());
            }
            let Some(spans) = band.as_mut() else {
                continue;
            };

            let column = self.column(mode, push_count, slot);
            let x = if column == 0 { right_edge } else { column as f64 };
            if (last < 0.0) != (value < 0.0) {
                // Pinch the band where the trace crosses zero.
                let crossing = x - value / (value - last);
                spans.push(FillSpan::new(crossing, 0.0, 0.0));
            }
            last = value;
            push_span(&mut bands, spans, column, FillSpan::new(x, value, 0.0));

            if next.is_none_or(|next| !next.is_finite()) {
                bands.extend(band.take());
            }
        }

        bands.retain(|band| band.len() >= 2);
        bands
    }

    fn fill_delta(&self, values: &[f64], push_count: u64, mode: DisplayMode) -> Vec<FillBand> {
        let divisions = self.divisions;
        let right_edge = divisions as f64;
        let len = values.len();
        let start = len - (len - divisions).min(divisions + 1);
        let mut bands = Vec::new();
        let mut band: Option<FillBand> = None;
        let (mut l1, mut l2) = (f64::NAN, f64::NAN);

        for slot in start..len {
            let (v1, v2) = (values[slot], values[slot - divisions]);
            let next_defined = values.get(slot + 1).is_none_or(|next| next.is_finite())
                && values[slot + 1 - divisions].is_finite();
            if band.is_none() && v1.is_finite() && v2.is_finite() && next_defined {
                (l1, l2) = (v1, v2);
                band = Some(Vec::new());
            }
            let Some(spans) = band.as_mut() else {
                continue;
            };

            let column = self.column(mode, push_count, slot);
            let x = if column == 0 { right_edge } else { column as f64 };
            if (v1 < v2) != (l1 < l2) {
                // Pinch the band where the two cycles cross.
                let r = (l1 - l2) / (l1 - v1 - l2 + v2);
                let y = l1 + (v1 - l1) * r;
                spans.push(FillSpan::new(x - 1.0 + r, y, y));
            }
            (l1, l2) = (v1, v2);
            push_span(&mut bands, spans, column, FillSpan::new(x, v1, v2));

            if slot + 1 == len || !next_defined {
                bands.extend(band.take());
            }
        }

        bands.retain(|band| band.len() >= 2);
        bands
    }

    /// Column ranges of the last cycle touching an undefined sample.
    pub fn undefined_runs(
        &self,
        values: &[f64],
        push_count: u64,
        mode: DisplayMode,
    ) -> Vec<(f64, f64)> {
        let right_edge = self.divisions as f64;
        let mut runs = Vec::new();
        let mut run: Option<f64> = None;

        for slot in self.last_cycle(values.len())..values.len() {
            let value = values[slot];
            let next = values.get(slot + 1).copied();
            let opens = match next {
                Some(next) => !next.is_finite(),
                None => !value.is_finite(),
            };

            let column = self.column(mode, push_count, slot);
            if run.is_none() && opens {
                run = Some(if column == 0 { right_edge } else { column as f64 });
            }
            let Some(begin) = run else {
                continue;
            };

            if column == 0 {
                runs.push((begin, right_edge));
                run = Some(0.0);
            }
            if next.is_none_or(|next| value.is_finite() && next.is_finite()) {
                if column != 0 {
                    runs.push((begin, column as f64));
                }
                run = None;
            }
        }

        runs.retain(|&(begin, end)| begin < end);
        runs
    }

    /// Vertical grid line positions.
    pub fn grid_x(&self, step: f64, mode: DisplayMode) -> Vec<f64> {
        let divisions = self.divisions as f64;
        if !(step > 0.0) {
            return Vec::new();
        }
        match mode {
            DisplayMode::Scroll => {
                let count = (divisions / step).ceil() as usize;
                (0..count).map(|i| divisions - i as f64 * step).collect()
            }
            DisplayMode::Wrap => {
                let count = (divisions / step).floor() as usize;
                (1..=count).map(|i| i as f64 * step).collect()
            }
        }
    }
}

/// Horizontal grid line positions strictly inside `(lo, hi)`.
pub fn grid_y(lo: f64, hi: f64, step: f64) -> Vec<f64> {
    if !(step > 0.0) || !lo.is_finite() || !hi.is_finite() {
        return Vec::new();
    }
    let mut y = lo - lo % step;
    if y <= lo {
        y += step;
    }
    let mut lines = Vec::new();
    while y < hi {
        lines.push(y);
        y += step;
    }
    lines
}

/// One column of a filled band: the area between `a` and `b` at `x`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FillSpan {
    pub x: f64,
    pub a: f64,
    pub b: f64,
}

impl FillSpan {
    fn new(x: f64, a: f64, b: f64) -> Self {
        Self { x, a, b }
    }
}

/// Consecutive spans; each neighbouring pair bounds one quad.
pub type FillBand = Vec<FillSpan>;

/// Append `span`, splitting the band when it reaches column 0.
fn push_span(bands: &mut Vec<FillBand>, spans: &mut FillBand, column: usize, span: FillSpan) {
    spans.push(span);
    if column == 0 {
        bands.push(std::mem::take(spans));
        spans.push(FillSpan { x: 0.0, ..span });
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TracePoint {
    pub x: f64,
    pub y: f64,
    pub slot: usize,
}

impl TracePoint {
    fn new(x: f64, y: f64, slot: usize) -> Self {
        Self { x, y, slot }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TraceSegment {
    /// Connected run of defined samples.
    Strip(Vec<TracePoint>),
    /// Defined sample with undefined neighbours on both sides.
    Dot(TracePoint),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_aligns_uneven_history() {
        let geometry = Geometry::new(10, 4);
        assert_eq!(geometry.offset(), 3);
        assert_eq!(Geometry::new(8, 4).offset(), 5);
        assert_eq!(Geometry::new(5, 1).offset(), 2);
    }

    #[test]
    fn wrap_columns_follow_stream_position() {
        let geometry = Geometry::new(10, 4);
        // After ten pushes the oldest slot holds sample 0.
        assert_eq!(geometry.column(DisplayMode::Wrap, 10, 0), 0);
        assert_eq!(geometry.column(DisplayMode::Wrap, 10, 9), 1);
        // Three more pushes shift the phase by three.
        assert_eq!(geometry.column(DisplayMode::Wrap, 13, 0), 3);
        assert_eq!(geometry.column(DisplayMode::Wrap, 13, 9), 0);
    }

    #[test]
    fn wrap_columns_of_unwritten_slots_stay_in_phase() {
        let geometry = Geometry::new(10, 4);
        // Two pushes: slots 8 and 9 hold samples 0 and 1.
        assert_eq!(geometry.column(DisplayMode::Wrap, 2, 8), 0);
        assert_eq!(geometry.column(DisplayMode::Wrap, 2, 9), 1);
        assert_eq!(geometry.column(DisplayMode::Wrap, 2, 7), 3);
        assert_eq!(geometry.sample_count(2, 0), -8);
    }

    #[test]
    fn scroll_puts_newest_sample_on_the_edge() {
        for (history, divisions) in [(10, 4), (8, 4), (7, 3), (2, 5)] {
            let geometry = Geometry::new(history, divisions);
            for push_count in [0, 3, 1000] {
                assert_eq!(geometry.column(DisplayMode::Scroll, push_count, history - 1), 0);
            }
        }
        let geometry = Geometry::new(10, 4);
        assert_eq!(geometry.column(DisplayMode::Scroll, 0, 0), 3);
        assert_eq!(geometry.column(DisplayMode::Scroll, 0, 8), 3);
    }

    #[test]
    fn exact_multiple_keeps_plain_modulo() {
        let geometry = Geometry::new(8, 4);
        for slot in 0..8 {
            assert_eq!(geometry.column(DisplayMode::Wrap, 8, slot), slot % 4);
        }
    }

    #[test]
    fn shading() {
        let geometry = Geometry::new(10, 4);
        assert_eq!(geometry.shade(0, false), 0.0);
        assert_eq!(geometry.shade(5, false), 0.5);
        assert_eq!(geometry.shade(5, true), 0.5);
        assert_eq!(geometry.shade(6, true), 1.0);
        assert_eq!(geometry.shade(9, true), 1.0);
    }

    #[test]
    fn trace_breaks_at_column_zero() {
        let geometry = Geometry::new(6, 4);
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        // Sample positions 0..6, so slots 0 and 4 land on column 0.
        let segments = geometry.trace(&values, 6, DisplayMode::Wrap);
        let xs: Vec<Vec<f64>> = segments
            .iter()
            .map(|s| match s {
                TraceSegment::Strip(points) => points.iter().map(|p| p.x).collect(),
                TraceSegment::Dot(p) => vec![p.x],
            })
            .collect();
        assert_eq!(xs, vec![vec![0.0, 1.0, 2.0, 3.0, 4.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn trace_skips_undefined_gaps() {
        let geometry = Geometry::new(6, 10);
        let values = [f64::NAN, 1.0, 2.0, f64::NAN, 3.0, f64::NAN];
        let segments = geometry.trace(&values, 100, DisplayMode::Wrap);
        assert_eq!(segments.len(), 2);
        match &segments[0] {
            TraceSegment::Strip(points) => {
                assert_eq!(points.iter().map(|p| p.y).collect::<Vec<_>>(), vec![1.0, 2.0]);
                assert_eq!(points[0].slot, 1);
            }
            other => panic!("expected strip, got {other:?}"),
        }
        match &segments[1] {
            TraceSegment::Dot(point) => assert_eq!((point.y, point.slot), (3.0, 4)),
            other => panic!("expected dot, got {other:?}"),
        }
    }

    #[test]
    fn trace_of_empty_snapshot_is_empty() {
        let geometry = Geometry::new(4, 2);
        assert!(geometry.trace(&[f64::NAN; 4], 0, DisplayMode::Wrap).is_empty());
    }

    fn xs(band: &FillBand) -> Vec<f64> {
        band.iter().map(|span| span.x).collect()
    }

    #[test]
    fn fill_to_zero_covers_last_cycle() {
        // Five slots of the last cycle land on columns 1, 2, 3, 0, 1.
        let geometry = Geometry::new(6, 4);
        let values = [9.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let bands = geometry.fill(&values, 6, DisplayMode::Wrap, false);
        assert_eq!(bands.len(), 2);
        assert_eq!(xs(&bands[0]), vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(xs(&bands[1]), vec![0.0, 1.0]);
        assert_eq!(bands[1][0], FillSpan::new(0.0, 4.0, 0.0));
        assert!(bands.iter().flatten().all(|span| span.b == 0.0));
    }

    #[test]
    fn fill_to_zero_pinches_at_crossings() {
        let geometry = Geometry::new(6, 4);
        let values = [0.0, 2.0, -2.0, 1.0, f64::NAN, f64::NAN];
        let bands = geometry.fill(&values, 6, DisplayMode::Wrap, false);
        assert_eq!(bands.len(), 1);
        let band = &bands[0];
        assert_eq!(band[1], FillSpan::new(1.5, 0.0, 0.0));
        assert_eq!(band[2], FillSpan::new(2.0, -2.0, 0.0));
        assert!((band[3].x - (3.0 - 1.0 / 3.0)).abs() < 1e-12);
        assert_eq!(band.last(), Some(&FillSpan::new(3.0, 1.0, 0.0)));
    }

    #[test]
    fn dimmed_fill_spans_two_cycles() {
        // Slots 5..10 on columns 1, 2, 3, 0, 1 against slots 1..6.
        let geometry = Geometry::new(10, 4);
        let values = [0.0, 1.0, 2.0, 3.0, 4.0, 10.0, 11.0, 12.0, 13.0, 14.0];
        let bands = geometry.fill(&values, 10, DisplayMode::Wrap, true);
        assert_eq!(bands.len(), 2);
        assert_eq!(
            bands[0],
            vec![
                FillSpan::new(1.0, 10.0, 1.0),
                FillSpan::new(2.0, 11.0, 2.0),
                FillSpan::new(3.0, 12.0, 3.0),
                FillSpan::new(4.0, 13.0, 4.0),
            ]
        );
        assert_eq!(
            bands[1],
            vec![FillSpan::new(0.0, 13.0, 4.0), FillSpan::new(1.0, 14.0, 10.0)]
        );

        let mut crossing = values;
        crossing[7] = 2.0;
        let bands = geometry.fill(&crossing, 10, DisplayMode::Wrap, true);
        let pinch = bands[0][2];
        assert!((pinch.x - 2.9).abs() < 1e-12);
        assert!((pinch.a - 2.9).abs() < 1e-12 && pinch.a == pinch.b);

        // Without a full previous cycle the fill falls back to zero.
        let short = Geometry::new(5, 4);
        let bands = short.fill(&[1.0; 5], 5, DisplayMode::Wrap, true);
        assert!(bands.iter().flatten().all(|span| span.b == 0.0));
    }

    #[test]
    fn undefined_runs_bracket_gaps() {
        // Columns 4..10 for all six slots.
        let geometry = Geometry::new(6, 10);
        let values = [1.0, f64::NAN, f64::NAN, 2.0, 3.0, f64::NAN];
        let runs = geometry.undefined_runs(&values, 100, DisplayMode::Wrap);
        assert_eq!(runs, vec![(4.0, 7.0), (8.0, 9.0)]);
        assert!(geometry.undefined_runs(&[1.0; 6], 100, DisplayMode::Wrap).is_empty());
    }

    #[test]
    fn undefined_runs_split_at_column_zero() {
        // Columns 1, 2, 3, 0, 1 as in the fill case.
        let geometry = Geometry::new(6, 4);
        let values = [f64::NAN; 6];
        let runs = geometry.undefined_runs(&values, 6, DisplayMode::Wrap);
        assert_eq!(runs, vec![(1.0, 4.0), (0.0, 1.0)]);
    }

    #[test]
    fn grid_lines() {
        let geometry = Geometry::new(10, 4);
        assert_eq!(geometry.grid_x(1.0, DisplayMode::Wrap), vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(geometry.grid_x(1.5, DisplayMode::Scroll), vec![4.0, 2.5, 1.0]);
        assert!(geometry.grid_x(0.0, DisplayMode::Wrap).is_empty());
        assert_eq!(grid_y(-1.0, 2.0, 1.0), vec![0.0, 1.0]);
        assert_eq!(grid_y(0.5, 2.5, 1.0), vec![1.0, 2.0]);
        assert!(grid_y(f64::NAN, 2.0, 1.0).is_empty());
    }
}
