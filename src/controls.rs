use std::collections::VecDeque;
use std::time::{Duration, Instant};

use log::debug;

use crate::config::{self, Config, GridSpec, Toggles};
use crate::intersect::Probe;
use crate::snapshot::{Limits, Snapshotter};

/// How long a notification stays on screen.
pub const MESSAGE_PERSIST: Duration = Duration::from_secs(2);
pub const MAX_MESSAGES: usize = 5;
/// Longest text accepted by an edit prompt.
pub const MAX_EDIT_LEN: usize = 127;

/// Short-lived on-screen notifications, oldest first.
#[derive(Debug, Default)]
pub struct Messages {
    queue: VecDeque<(Instant, String)>,
}

impl Messages {
    pub fn push(&mut self, text: impl Into<String>) {
        self.push_at(Instant::now(), text);
    }

    pub fn push_at(&mut self, at: Instant, text: impl Into<String>) {
        self.queue.push_back((at, text.into()));
        while self.queue.len() > MAX_MESSAGES {
            self.queue.pop_front();
        }
    }

    /// Drop expired messages.
    pub fn purge(&mut self, now: Instant) {
        while let Some((at, _)) = self.queue.front() {
            if now.duration_since(*at) < MESSAGE_PERSIST {
                break;
            }
            self.queue.pop_front();
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.queue.iter().map(|(_, text)| text.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }
}

/// Hotkey bindings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Quit,
    ToggleAutoLimit,
    ResetLimits,
    EditLimits,
    EditCenterAmplitude,
    ToggleDimmed,
    ToggleDistrib,
    ToggleFill,
    ToggleUndefined,
    ToggleSmooth,
    ToggleScroll,
    ToggleValues,
    ToggleMarker,
    ToggleGrid,
    EditGrid,
    EditZero,
    ToggleLatency,
    EditPollRate,
    TogglePause,
    NextGraph,
    ToggleGraphKey,
    CycleView,
}

impl Action {
    pub fn from_char(key: char) -> Option<Self> {
        Some(match key {
            '\u{1b}' => Action::Quit,
            'a' => Action::ToggleAutoLimit,
            'A' => Action::ResetLimits,
            'L' => Action::EditLimits,
            'Z' => Action::EditCenterAmplitude,
            'd' => Action::ToggleDimmed,
            'D' => Action::ToggleDistrib,
            'f' => Action::ToggleFill,
            'u' => Action::ToggleUndefined,
            'S' => Action::ToggleSmooth,
            's' => Action::ToggleScroll,
            'v' => Action::ToggleValues,
            'm' => Action::ToggleMarker,
            'g' => Action::ToggleGrid,
            'G' => Action::EditGrid,
            'z' => Action::EditZero,
            'l' => Action::ToggleLatency,
            'p' => Action::EditPollRate,
            ' ' => Action::TogglePause,
            '\t' => Action::NextGraph,
            'k' => Action::ToggleGraphKey,
            'K' => Action::CycleView,
            _ => return None,
        })
    }
}

/// Value asked for by an edit prompt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditField {
    LowLimit,
    HighLimit,
    Center,
    Amplitude,
    Grid,
    Zero,
    PollRate,
}

impl EditField {
    pub fn label(self) -> &'static str {
        match self {
            EditField::LowLimit => "-y",
            EditField::HighLimit => "+y",
            EditField::Center => "center",
            EditField::Amplitude => "amplitude",
            EditField::Grid => "grid-spec",
            EditField::Zero => "zero",
            EditField::PollRate => "poll rate",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditPrompt {
    field: EditField,
    text: String,
}

impl EditPrompt {
    fn new(field: EditField) -> Self {
        Self {
            field,
            text: String::new(),
        }
    }

    pub fn field(&self) -> EditField {
        self.field
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditKey {
    Char(char),
    Backspace,
    Enter,
    Escape,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Runtime display state driven by the keyboard and mouse.
#[derive(Debug)]
pub struct Controls {
    pub toggles: Toggles,
    pub grid: GridSpec,
    pub poll: Duration,
    pub paused: bool,
    pub probe: Option<Probe>,
    messages: Messages,
    prompt: Option<EditPrompt>,
}

impl Controls {
    pub fn new(config: &Config) -> Self {
        Self {
            toggles: config.toggles,
            grid: config.grid,
            poll: config.poll,
            paused: false,
            probe: None,
            messages: Messages::default(),
            prompt: None,
        }
    }

    pub fn messages(&self) -> &Messages {
        &self.messages
    }

    pub fn messages_mut(&mut self) -> &mut Messages {
        &mut self.messages
    }

    pub fn prompt(&self) -> Option<&EditPrompt> {
        self.prompt.as_ref()
    }

    fn toggle(&mut self, name: &str, pick: fn(&mut Self) -> &mut bool) -> bool {
        let flag = pick(self);
        *flag = !*flag;
        let state = *flag;
        debug!("{name}: {state}");
        self.messages
            .push(format!("{name}: {}", if state { "enabled" } else { "disabled" }));
        state
    }

    pub fn apply(&mut self, action: Action, snapshotter: &mut Snapshotter) -> Flow {
        match action {
            Action::Quit => return Flow::Quit,
            Action::ToggleAutoLimit => {
                let on = !snapshotter.auto_limit();
                snapshotter.set_auto_limit(on);
                if on {
                    snapshotter.reset_limits();
                }
                debug!("autolimit: {on}");
                self.messages
                    .push(format!("autolimit: {}", if on { "enabled" } else { "disabled" }));
            }
            Action::ResetLimits => {
                snapshotter.reset_limits();
                self.messages.push("limits reset");
            }
            Action::EditLimits => self.prompt = Some(EditPrompt::new(EditField::LowLimit)),
            Action::EditCenterAmplitude => self.prompt = Some(EditPrompt::new(EditField::Center)),
            Action::ToggleDimmed => {
                self.toggle("dimmed", |c| &mut c.toggles.dimmed);
            }
            Action::ToggleDistrib => {
                self.toggle("distribution", |c| &mut c.toggles.distrib);
            }
            Action::ToggleFill => {
                self.toggle("fill", |c| &mut c.toggles.fill);
            }
            Action::ToggleUndefined => {
                self.toggle("show undefined", |c| &mut c.toggles.undefined);
            }
            Action::ToggleSmooth => {
                self.toggle("smoothing", |c| &mut c.toggles.smooth);
            }
            Action::ToggleScroll => {
                self.toggle("scrolling", |c| &mut c.toggles.scroll);
            }
            Action::ToggleValues => {
                self.toggle("values", |c| &mut c.toggles.values);
            }
            Action::ToggleMarker => {
                self.toggle("marker", |c| &mut c.toggles.marker);
            }
            Action::ToggleGrid => {
                self.toggle("grid", |c| &mut c.toggles.grid);
            }
            Action::EditGrid => self.prompt = Some(EditPrompt::new(EditField::Grid)),
            Action::EditZero => self.prompt = Some(EditPrompt::new(EditField::Zero)),
            Action::ToggleLatency => {
                self.toggle("latency", |c| &mut c.toggles.latency);
            }
            Action::EditPollRate => self.prompt = Some(EditPrompt::new(EditField::PollRate)),
            Action::TogglePause => {
                self.toggle("paused", |c| &mut c.paused);
            }
            Action::NextGraph => {
                snapshotter.next_graph();
                if !self.toggles.graph_key && !self.toggles.values {
                    let label = &snapshotter.active_graph().label;
                    self.messages.push(format!("current graph: {label}"));
                }
            }
            Action::ToggleGraphKey => {
                self.toggle("graph key", |c| &mut c.toggles.graph_key);
            }
            Action::CycleView => {
                let view = snapshotter.cycle_view();
                debug!("view mode: {view:?}");
                self.messages.push(format!("view mode: {}", view.label()));
            }
        }
        Flow::Continue
    }

    /// Feed a key to the open edit prompt.
    pub fn edit(&mut self, key: EditKey, snapshotter: &mut Snapshotter) {
        let Some(prompt) = self.prompt.as_mut() else {
            return;
        };
        match key {
            EditKey::Char(c) => {
                if !c.is_control() && prompt.text.len() + c.len_utf8() <= MAX_EDIT_LEN {
                    prompt.text.push(c);
                }
            }
            EditKey::Backspace => {
                prompt.text.pop();
            }
            EditKey::Escape => self.prompt = None,
            EditKey::Enter => {
                let Some(prompt) = self.prompt.take() else {
                    return;
                };
                if prompt.text.is_empty() {
                    return;
                }
                match self.commit(prompt.field, &prompt.text, snapshotter) {
                    Ok(next) => self.prompt = next.map(EditPrompt::new),
                    Err(err) => self.messages.push(err.to_string()),
                }
            }
        }
    }

    /// Apply an entered value, returning the follow-up prompt if any.
    fn commit(
        &mut self,
        field: EditField,
        text: &str,
        snapshotter: &mut Snapshotter,
    ) -> Result<Option<EditField>, config::ConfigError> {
        match field {
            EditField::LowLimit => {
                let lo = config::parse_number(text)?;
                let hi = snapshotter.limits().hi;
                let limits = config::check_limits(Limits { lo, hi })?;
                self.fix_limits(snapshotter);
                snapshotter.set_limits(limits);
                Ok(Some(EditField::HighLimit))
            }
            EditField::HighLimit => {
                let hi = config::parse_number(text)?;
                let lo = snapshotter.limits().lo;
                snapshotter.set_limits(config::check_limits(Limits { lo, hi })?);
                Ok(None)
            }
            EditField::Center => {
                let center = config::parse_number(text)?;
                let amplitude = snapshotter.limits().amplitude();
                let limits = config::check_limits(Limits::around(center, amplitude))?;
                self.fix_limits(snapshotter);
                snapshotter.set_limits(limits);
                Ok(Some(EditField::Amplitude))
            }
            EditField::Amplitude => {
                let amplitude = config::parse_number(text)?;
                let center = snapshotter.limits().center();
                snapshotter.set_limits(config::check_limits(Limits::around(center, amplitude))?);
                Ok(None)
            }
            EditField::Grid => {
                self.grid.apply(text)?;
                snapshotter.set_margin(self.grid.y.res);
                if !self.toggles.grid {
                    self.toggle("grid", |c| &mut c.toggles.grid);
                }
                Ok(None)
            }
            EditField::Zero => {
                snapshotter.set_zero(config::parse_number(text)?);
                Ok(None)
            }
            EditField::PollRate => {
                self.poll = config::parse_poll_rate(text)?;
                debug!("poll interval now {:?}", self.poll);
                Ok(None)
            }
        }
    }

    fn fix_limits(&mut self, snapshotter: &mut Snapshotter) {
        if snapshotter.auto_limit() {
            snapshotter.set_auto_limit(false);
            self.messages.push("autolimit: disabled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Command, parse_args};
    use crate::pipeline::PipelineState;
    use crate::snapshot::ViewMode;

    fn setup(args: &[&str]) -> (Controls, Snapshotter) {
        let config = match parse_args(args.iter().copied()) {
            Ok(Command::Run(config)) => config,
            other => panic!("unexpected {other:?}"),
        };
        let snapshotter = Snapshotter::new(
            &config.channels,
            config.history,
            config.limits,
            config.grid.y.res,
        );
        (Controls::new(&config), snapshotter)
    }

    fn type_line(controls: &mut Controls, snapshotter: &mut Snapshotter, line: &str) {
        for c in line.chars() {
            controls.edit(EditKey::Char(c), snapshotter);
        }
        controls.edit(EditKey::Enter, snapshotter);
    }

    #[test]
    fn messages_expire_and_are_capped() {
        let mut messages = Messages::default();
        let start = Instant::now();
        for i in 0..7 {
            messages.push_at(start, format!("m{i}"));
        }
        assert_eq!(messages.len(), MAX_MESSAGES);
        assert_eq!(messages.iter().next(), Some("m2"));

        messages.push_at(start + Duration::from_secs(1), "late");
        messages.purge(start + MESSAGE_PERSIST);
        assert_eq!(messages.iter().collect::<Vec<_>>(), vec!["late"]);
        messages.purge(start + Duration::from_secs(10));
        assert!(messages.is_empty());
    }

    #[test]
    fn hotkeys_map_to_actions() {
        assert_eq!(Action::from_char('\u{1b}'), Some(Action::Quit));
        assert_eq!(Action::from_char('\t'), Some(Action::NextGraph));
        assert_eq!(Action::from_char(' '), Some(Action::TogglePause));
        assert_eq!(Action::from_char('K'), Some(Action::CycleView));
        assert_eq!(Action::from_char('x'), None);
    }

    #[test]
    fn toggles_report_their_state() {
        let (mut controls, mut snapshotter) = setup(&["-", "10"]);
        assert_eq!(controls.apply(Action::ToggleScroll, &mut snapshotter), Flow::Continue);
        assert!(controls.toggles.scroll);
        controls.apply(Action::ToggleMarker, &mut snapshotter);
        assert!(!controls.toggles.marker);
        controls.apply(Action::TogglePause, &mut snapshotter);
        assert!(controls.paused);
        let shown: Vec<&str> = controls.messages().iter().collect();
        assert_eq!(shown, vec!["scrolling: enabled", "marker: disabled", "paused: enabled"]);
        assert_eq!(controls.apply(Action::Quit, &mut snapshotter), Flow::Quit);
    }

    #[test]
    fn limits_prompt_chains_low_then_high() {
        let (mut controls, mut snapshotter) = setup(&["-", "10"]);
        controls.apply(Action::EditLimits, &mut snapshotter);
        assert_eq!(controls.prompt().map(EditPrompt::field), Some(EditField::LowLimit));

        type_line(&mut controls, &mut snapshotter, "-4");
        assert!(!snapshotter.auto_limit());
        assert_eq!(controls.prompt().map(EditPrompt::field), Some(EditField::HighLimit));

        type_line(&mut controls, &mut snapshotter, "12");
        assert!(controls.prompt().is_none());
        assert_eq!(snapshotter.limits(), Limits { lo: -4.0, hi: 12.0 });
    }

    #[test]
    fn center_and_amplitude() {
        let (mut controls, mut snapshotter) = setup(&["-", "10", "0", "4"]);
        controls.apply(Action::EditCenterAmplitude, &mut snapshotter);
        type_line(&mut controls, &mut snapshotter, "10");
        assert_eq!(snapshotter.limits(), Limits { lo: 8.0, hi: 12.0 });
        type_line(&mut controls, &mut snapshotter, "10");
        assert_eq!(snapshotter.limits(), Limits { lo: 5.0, hi: 15.0 });
    }

    #[test]
    fn empty_ranges_are_refused() {
        let (mut controls, mut snapshotter) = setup(&["-", "10", "-2", "2"]);
        controls.apply(Action::EditCenterAmplitude, &mut snapshotter);
        type_line(&mut controls, &mut snapshotter, "1");
        type_line(&mut controls, &mut snapshotter, "0");
        assert!(controls.prompt().is_none());
        assert_eq!(snapshotter.limits(), Limits { lo: -1.0, hi: 3.0 });
        assert_eq!(controls.messages().iter().last(), Some("-y and +y can't be equal"));

        controls.apply(Action::EditLimits, &mut snapshotter);
        type_line(&mut controls, &mut snapshotter, "3");
        assert!(controls.prompt().is_none());
        controls.apply(Action::EditLimits, &mut snapshotter);
        type_line(&mut controls, &mut snapshotter, "0");
        type_line(&mut controls, &mut snapshotter, "0");
        assert_eq!(snapshotter.limits(), Limits { lo: 0.0, hi: 3.0 });
        assert!(snapshotter.limits().amplitude() != 0.0);
    }

    #[test]
    fn fill_and_undefined_toggle() {
        let (mut controls, mut snapshotter) = setup(&["-", "10"]);
        assert_eq!(Action::from_char('f'), Some(Action::ToggleFill));
        assert_eq!(Action::from_char('u'), Some(Action::ToggleUndefined));
        controls.apply(Action::ToggleFill, &mut snapshotter);
        controls.apply(Action::ToggleUndefined, &mut snapshotter);
        assert!(controls.toggles.fill && controls.toggles.undefined);
        let shown: Vec<&str> = controls.messages().iter().collect();
        assert_eq!(shown, vec!["fill: enabled", "show undefined: enabled"]);
    }

    #[test]
    fn prompt_editing_keys() {
        let (mut controls, mut snapshotter) = setup(&["-", "10"]);
        controls.apply(Action::EditZero, &mut snapshotter);
        controls.edit(EditKey::Char('4'), &mut snapshotter);
        controls.edit(EditKey::Char('\u{7}'), &mut snapshotter);
        controls.edit(EditKey::Char('2'), &mut snapshotter);
        controls.edit(EditKey::Backspace, &mut snapshotter);
        assert_eq!(controls.prompt().map(EditPrompt::text), Some("4"));
        controls.edit(EditKey::Escape, &mut snapshotter);
        assert!(controls.prompt().is_none());

        // Empty input closes the prompt without effect.
        controls.apply(Action::EditZero, &mut snapshotter);
        controls.edit(EditKey::Enter, &mut snapshotter);
        assert!(controls.prompt().is_none());
        assert_eq!(snapshotter.active_graph().zero(), 0.0);

        controls.apply(Action::EditZero, &mut snapshotter);
        for _ in 0..200 {
            controls.edit(EditKey::Char('9'), &mut snapshotter);
        }
        assert_eq!(controls.prompt().map(|p| p.text().len()), Some(MAX_EDIT_LEN));
    }

    #[test]
    fn zero_and_poll_rate_prompts() {
        let (mut controls, mut snapshotter) = setup(&["-", "10"]);
        controls.apply(Action::EditZero, &mut snapshotter);
        type_line(&mut controls, &mut snapshotter, "2.5");
        assert_eq!(snapshotter.active_graph().zero(), 2.5);

        controls.apply(Action::EditPollRate, &mut snapshotter);
        type_line(&mut controls, &mut snapshotter, "100");
        assert_eq!(controls.poll, Duration::from_millis(10));

        controls.apply(Action::EditPollRate, &mut snapshotter);
        type_line(&mut controls, &mut snapshotter, "-1");
        assert_eq!(controls.poll, Duration::from_millis(10));
        assert!(controls.messages().iter().any(|m| m.contains("polling rate")));
    }

    #[test]
    fn grid_prompt_enables_grid_and_margin() {
        let (mut controls, mut snapshotter) = setup(&["-", "4"]);
        let state = PipelineState::new(1, 5);
        state.channels()[0].push(1.0);
        state.channels()[0].push(3.0);
        state.mark_damaged();
        snapshotter.tick(&state);
        assert_eq!(snapshotter.limits(), Limits { lo: 0.0, hi: 4.0 });

        controls.apply(Action::EditGrid, &mut snapshotter);
        type_line(&mut controls, &mut snapshotter, "0.5+2x2");
        assert!(controls.toggles.grid);
        assert_eq!(controls.grid.y.res, 0.5);
        assert_eq!(controls.grid.x.res, 2.0);
        snapshotter.reset_limits();
        assert_eq!(snapshotter.limits(), Limits { lo: 0.5, hi: 3.5 });
    }

    #[test]
    fn next_graph_announces_without_key() {
        let (mut controls, mut snapshotter) = setup(&["-c", "2a", "-", "10"]);
        controls.apply(Action::NextGraph, &mut snapshotter);
        assert_eq!(snapshotter.active(), 1);
        assert_eq!(controls.messages().iter().last(), Some("current graph: 2"));

        controls.apply(Action::CycleView, &mut snapshotter);
        assert_eq!(snapshotter.view(), ViewMode::Dim);
        assert_eq!(controls.messages().iter().last(), Some("view mode: dim others"));
    }
}
