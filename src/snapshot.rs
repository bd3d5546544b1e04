use std::time::Duration;

use log::trace;

use crate::config::ChannelSpec;
use crate::pipeline::PipelineState;
use crate::timer::AveragingTimer;

const LATENCY_WINDOW: Duration = Duration::from_secs(5);

/// Linear copy of one ring buffer, oldest sample first.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub values: Vec<f64>,
    pub push_count: u64,
}

impl Snapshot {
    fn undefined(history: usize) -> Self {
        Self {
            values: vec![f64::NAN; history],
            push_count: 0,
        }
    }

    /// Most recent sample.
    pub fn last(&self) -> f64 {
        self.values.last().copied().unwrap_or(f64::NAN)
    }
}

/// One channel as seen by the render loop.
#[derive(Clone, Debug)]
pub struct Graph {
    pub label: String,
    pub color: [u8; 3],
    zero: f64,
    snapshot: Snapshot,
}

impl Graph {
    fn new(spec: &ChannelSpec, history: usize) -> Self {
        Self {
            label: spec.label.clone(),
            color: spec.color,
            zero: spec.zero,
            snapshot: Snapshot::undefined(history),
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn zero(&self) -> f64 {
        self.zero
    }

    fn shift(&mut self, by: f64) {
        if by != 0.0 {
            for value in &mut self.snapshot.values {
                *value -= by;
            }
        }
    }
}

/// Which channels are drawn besides the active one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Normal,
    /// Others drawn faintly.
    Dim,
    /// Others hidden and excluded from autoscaling.
    Hide,
}

impl ViewMode {
    pub fn next(self) -> Self {
        match self {
            ViewMode::Normal => ViewMode::Dim,
            ViewMode::Dim => ViewMode::Hide,
            ViewMode::Hide => ViewMode::Normal,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ViewMode::Normal => "normal",
            ViewMode::Dim => "dim others",
            ViewMode::Hide => "hide others",
        }
    }
}

/// Vertical extent of the plot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Limits {
    pub lo: f64,
    pub hi: f64,
}

impl Default for Limits {
    fn default() -> Self {
        Self { lo: -1.0, hi: 1.0 }
    }
}

impl Limits {
    pub fn center(&self) -> f64 {
        self.lo + (self.hi - self.lo) / 2.0
    }

    pub fn amplitude(&self) -> f64 {
        self.hi - self.lo
    }

    pub fn around(center: f64, amplitude: f64) -> Self {
        let half = amplitude / 2.0;
        Self {
            lo: center - half,
            hi: center + half,
        }
    }
}

/// Min/max of every defined sample in the graphs selected by `view`,
/// widened by `margin` on both sides.
pub fn autoscale(graphs: &[Graph], active: usize, view: ViewMode, margin: f64) -> Option<Limits> {
    let selected: Box<dyn Iterator<Item = &Graph>> = match view {
        ViewMode::Hide => Box::new(graphs.get(active).into_iter()),
        ViewMode::Normal | ViewMode::Dim => Box::new(graphs.iter()),
    };
    let (lo, hi) = selected
        .flat_map(|graph| graph.snapshot.values.iter().copied())
        .filter(|value| value.is_finite())
        .fold(None, |acc: Option<(f64, f64)>, value| match acc {
            None => Some((value, value)),
            Some((lo, hi)) => Some((lo.min(value), hi.max(value))),
        })?;
    Some(Limits {
        lo: lo - margin,
        hi: hi + margin,
    })
}

/// Consumer side of the pipeline, run once per display tick.
pub struct Snapshotter {
    graphs: Vec<Graph>,
    active: usize,
    view: ViewMode,
    auto_limit: bool,
    limits: Limits,
    margin: f64,
    buffer_latency: AveragingTimer,
}

impl Snapshotter {
    /// Fixed `limits` disable autoscaling.
    pub fn new(channels: &[ChannelSpec], history: usize, limits: Option<Limits>, margin: f64) -> Self {
        Self {
            graphs: channels
                .iter()
                .map(|spec| Graph::new(spec, history))
                .collect(),
            active: 0,
            view: ViewMode::Normal,
            auto_limit: limits.is_none(),
            limits: limits.unwrap_or_default(),
            margin,
            buffer_latency: AveragingTimer::new(LATENCY_WINDOW),
        }
    }

    /// Copy fresh data if the producer signalled any. Returns whether a
    /// redraw is due.
    pub fn tick(&mut self, state: &PipelineState) -> bool {
        let Some(since) = state.take_damage() else {
            return false;
        };
        self.buffer_latency.record(since.elapsed());

        for (graph, ring) in self.graphs.iter_mut().zip(state.channels()) {
            graph.snapshot.push_count = ring.snapshot(&mut graph.snapshot.values);
            let zero = graph.zero;
            graph.shift(zero);
        }

        if self.auto_limit {
            self.reset_limits();
        }
        true
    }

    pub fn graphs(&self) -> &[Graph] {
        &self.graphs
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn active_graph(&self) -> &Graph {
        &self.graphs[self.active]
    }

    pub fn next_graph(&mut self) {
        self.active = (self.active + 1) % self.graphs.len();
        if self.auto_limit && self.view == ViewMode::Hide {
            self.reset_limits();
        }
    }

    pub fn view(&self) -> ViewMode {
        self.view
    }

    pub fn cycle_view(&mut self) -> ViewMode {
        self.view = self.view.next();
        if self.auto_limit {
            self.reset_limits();
        }
        self.view
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Fix the limits by hand, turning autoscaling off.
    pub fn set_limits(&mut self, limits: Limits) {
        self.auto_limit = false;
        self.limits = limits;
    }

    /// Recompute the limits from the current snapshots. Keeps the old ones
    /// when nothing is defined yet.
    pub fn reset_limits(&mut self) {
        if let Some(limits) = autoscale(&self.graphs, self.active, self.view, self.margin) {
            trace!("limits now {} .. {}", limits.lo, limits.hi);
            self.limits = limits;
        }
    }

    pub fn auto_limit(&self) -> bool {
        self.auto_limit
    }

    pub fn set_auto_limit(&mut self, auto_limit: bool) {
        self.auto_limit = auto_limit;
    }

    pub fn set_margin(&mut self, margin: f64) {
        self.margin = margin;
    }

    /// Move the baseline of the active graph.
    pub fn set_zero(&mut self, zero: f64) {
        let graph = &mut self.graphs[self.active];
        if zero == graph.zero {
            return;
        }
        graph.shift(zero - graph.zero);
        graph.zero = zero;
        if self.auto_limit {
            self.reset_limits();
        }
    }

    /// Mean delay between new data arriving and it being snapshotted.
    pub fn buffer_latency(&self) -> Duration {
        self.buffer_latency.average()
    }
}
