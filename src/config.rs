use std::time::Duration;

use thiserror::Error;

use crate::color::{self, Rgb};
use crate::decoder::Format;
use crate::geometry::{DisplayMode, Geometry};
use crate::snapshot::Limits;
use crate::source::Source;
use crate::transform::InputMode;

pub const USAGE: &str = "\
usage: trend [options] <fifo|-> <hist-spec|hist-sz x-sz> [-y +y]

hist-spec:
  N      N divisions, history N+1
  H/n    history H, n wraps
  DxN    D divisions, N wraps

options:
  -c [n]a|i|d   channels and input mode (absolute, incremental, differential)
  -f a|f|d|s|i|l
                input format (ascii, float, double, short, int, long)
  -e            skip escape markers in the stream
  -s            scroll instead of wrap
  -d            dim older cycles
  -D            distribution bar
  -F            fill the last cycle
  -u            shade undefined samples
  -S            smoothing
  -v            show values
  -l            show latency
  -m            toggle the position marker
  -g            toggle the grid
  -G grid-spec  [yres[+ymajor]][x[xres[+xmajor]]]
  -z zeros      comma separated zero offsets
  -L labels     comma separated channel labels
  -I colors     comma separated channel colors
  -A color      background color
  -E color      text color
  -R color      grid color
  -M color      marker color
  -N color      intersection color
  -T color      edit color
  -p rate       poll rate in Hz
  -t title      window title
  -h            this help

colors are hexadecimal: [[#]0x]RRGGBB
";

const DEFAULT_POLL: Duration = Duration::from_millis(1);
const DEFAULT_GRID_RES: f64 = 1.0;
const DEFAULT_GRID_MAJOR: u32 = 10;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("bad hist-spec: {0}")]
    BadHistSpec(String),
    #[error("x-sz can't be zero")]
    ZeroDivisions,
    #[error("history must be at least 2 (got {0})")]
    ShortHistory(usize),
    #[error("bad format type: {0}")]
    BadFormat(String),
    #[error("bad input mode: {0}")]
    BadInputMode(String),
    #[error("bad polling rate: {0}")]
    BadPollRate(String),
    #[error("bad color: {0}")]
    BadColor(String),
    #[error("bad number: {0}")]
    BadNumber(String),
    #[error("bad grid-spec: {0}")]
    BadGridSpec(String),
    #[error("-y and +y can't be equal")]
    EmptyRange,
    #[error("bad number of parameters ({0})")]
    ArgumentCount(usize),
    #[error("unknown option: -{0}")]
    UnknownOption(char),
    #[error("option -{0} requires a value")]
    MissingValue(char),
}

/// Spacing of one grid axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridAxis {
    pub res: f64,
    /// Every `major` minor lines one is drawn at full strength.
    pub major: u32,
}

impl Default for GridAxis {
    fn default() -> Self {
        Self {
            res: DEFAULT_GRID_RES,
            major: DEFAULT_GRID_MAJOR,
        }
    }
}

impl GridAxis {
    fn apply(&mut self, spec: &str) -> Result<(), ConfigError> {
        let bad = || ConfigError::BadGridSpec(spec.to_string());
        let (res, major) = match spec.split_once('+') {
            Some((res, major)) => (res, Some(major)),
            None => (spec, None),
        };
        if let Some(major) = major.filter(|m| !m.is_empty()) {
            self.major = major.parse().map_err(|_| bad())?;
        }
        if !res.is_empty() {
            let res: f64 = res.parse().map_err(|_| bad())?;
            if !res.is_finite() || res == 0.0 {
                return Err(bad());
            }
            self.res = res.abs();
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GridSpec {
    pub x: GridAxis,
    pub y: GridAxis,
}

impl GridSpec {
    /// Update from `[yres[+ymajor]][x[xres[+xmajor]]]`. Omitted parts keep
    /// their current value.
    pub fn apply(&mut self, spec: &str) -> Result<(), ConfigError> {
        let (y, x) = match spec.split_once('x') {
            Some((y, x)) => (y, Some(x)),
            None => (spec, None),
        };
        let mut updated = *self;
        if let Some(x) = x.filter(|x| !x.is_empty()) {
            updated.x.apply(x)?;
        }
        if !y.is_empty() {
            updated.y.apply(y)?;
        }
        *self = updated;
        Ok(())
    }
}

/// Per channel presentation.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelSpec {
    pub label: String,
    pub color: Rgb,
    pub zero: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Colors {
    pub background: Rgb,
    pub text: Rgb,
    pub grid: Rgb,
    pub marker: Rgb,
    pub intersection: Rgb,
    pub edit: Rgb,
}

impl Default for Colors {
    fn default() -> Self {
        Self {
            background: color::BACKGROUND,
            text: color::TEXT,
            grid: color::GRID,
            marker: color::MARKER,
            intersection: color::INTERSECTION,
            edit: color::EDIT,
        }
    }
}

/// Display switches, each flipped by its command line flag and hotkey.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Toggles {
    pub dimmed: bool,
    pub distrib: bool,
    pub fill: bool,
    pub undefined: bool,
    pub smooth: bool,
    pub scroll: bool,
    pub values: bool,
    pub latency: bool,
    pub marker: bool,
    pub grid: bool,
    pub graph_key: bool,
}

impl Default for Toggles {
    fn default() -> Self {
        Self {
            dimmed: false,
            distrib: false,
            fill: false,
            undefined: false,
            smooth: false,
            scroll: false,
            values: false,
            latency: false,
            marker: true,
            grid: false,
            graph_key: false,
        }
    }
}

impl Toggles {
    pub fn display_mode(&self) -> DisplayMode {
        if self.scroll {
            DisplayMode::Scroll
        } else {
            DisplayMode::Wrap
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub source: Source,
    pub history: usize,
    pub divisions: usize,
    /// Fixed y limits; autoscaling when absent.
    pub limits: Option<Limits>,
    pub input: InputMode,
    pub format: Format,
    pub escapes: bool,
    pub channels: Vec<ChannelSpec>,
    pub poll: Duration,
    pub grid: GridSpec,
    pub colors: Colors,
    pub toggles: Toggles,
    pub title: Option<String>,
}

impl Config {
    pub fn geometry(&self) -> Geometry {
        Geometry::new(self.history, self.divisions)
    }

    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or("trend")
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Run(Box<Config>),
    Help,
}

/// Options that consume a value.
const VALUE_OPTIONS: &str = "GzILAERMNTcfpt";

/// Parse the arguments following the program name.
pub fn parse_args<I, S>(args: I) -> Result<Command, ConfigError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut args = args.into_iter().map(Into::<String>::into).peekable();
    let mut toggles = Toggles::default();
    let mut grid = GridSpec::default();
    let mut colors = Colors::default();
    let mut zeros: Vec<f64> = Vec::new();
    let mut labels: Vec<String> = Vec::new();
    let mut line_colors: Vec<Option<Rgb>> = Vec::new();
    let mut channel_count = 1;
    let mut input = InputMode::default();
    let mut format = Format::Ascii;
    let mut escapes = false;
    let mut poll = DEFAULT_POLL;
    let mut title = None;

    // Options end at the first positional argument so that negative
    // limits are not taken for flags.
    while let Some(arg) = args.next_if(|arg| arg.starts_with('-') && arg.len() > 1) {
        if arg == "--" {
            break;
        }
        let flags: Vec<char> = arg[1..].chars().collect();
        let mut i = 0;
        while i < flags.len() {
            let flag = flags[i];
            i += 1;

            if VALUE_OPTIONS.contains(flag) {
                let value = if i < flags.len() {
                    let attached: String = flags[i..].iter().collect();
                    i = flags.len();
                    attached
                } else {
                    args.next().ok_or(ConfigError::MissingValue(flag))?
                };
                match flag {
                    'G' => grid.apply(&value)?,
                    'z' => zeros = parse_numbers(&value)?,
                    'L' => labels = value.split(',').map(str::to_string).collect(),
                    'I' => line_colors = parse_color_list(&value)?,
                    'A' => colors.background = parse_one_color(&value)?,
                    'E' => colors.text = parse_one_color(&value)?,
                    'R' => colors.grid = parse_one_color(&value)?,
                    'M' => colors.marker = parse_one_color(&value)?,
                    'N' => colors.intersection = parse_one_color(&value)?,
                    'T' => colors.edit = parse_one_color(&value)?,
                    'c' => (channel_count, input) = parse_input(&value)?,
                    'f' => {
                        format = Format::from_flag(&value).ok_or(ConfigError::BadFormat(value))?
                    }
                    'p' => poll = parse_poll_rate(&value)?,
                    't' => title = Some(value),
                    _ => return Err(ConfigError::UnknownOption(flag)),
                }
                continue;
            }

            match flag {
                'd' => toggles.dimmed = !toggles.dimmed,
                'D' => toggles.distrib = !toggles.distrib,
                'F' => toggles.fill = !toggles.fill,
                'u' => toggles.undefined = !toggles.undefined,
                'S' => toggles.smooth = !toggles.smooth,
                's' => toggles.scroll = !toggles.scroll,
                'v' => toggles.values = !toggles.values,
                'l' => toggles.latency = !toggles.latency,
                'm' => toggles.marker = !toggles.marker,
                'g' => toggles.grid = !toggles.grid,
                'e' => escapes = !escapes,
                'h' => return Ok(Command::Help),
                other => return Err(ConfigError::UnknownOption(other)),
            }
        }
    }

    let positional: Vec<String> = args.collect();
    if !(2..=5).contains(&positional.len()) {
        return Err(ConfigError::ArgumentCount(positional.len()));
    }

    let source = Source::from_arg(&positional[0]);
    let (history, divisions, rest) = match positional.len() {
        2 | 4 => {
            let (history, divisions) = parse_hist_spec(&positional[1])?;
            (history, divisions, &positional[2..])
        }
        _ => (
            parse_count(&positional[1])?,
            parse_count(&positional[2])?,
            &positional[3..],
        ),
    };
    if divisions == 0 {
        return Err(ConfigError::ZeroDivisions);
    }
    if history < 2 {
        return Err(ConfigError::ShortHistory(history));
    }

    let limits = match rest {
        [lo, hi] => Some(parse_limits(lo, hi)?),
        _ => None,
    };

    toggles.graph_key = !labels.is_empty();
    let channels = (0..channel_count)
        .map(|n| ChannelSpec {
            label: labels
                .get(n)
                .cloned()
                .unwrap_or_else(|| (n + 1).to_string()),
            color: line_colors
                .get(n)
                .copied()
                .flatten()
                .unwrap_or_else(|| color::palette(n)),
            zero: zeros.get(n).copied().unwrap_or(0.0),
        })
        .collect();

    Ok(Command::Run(Box::new(Config {
        source,
        history,
        divisions,
        limits,
        input,
        format,
        escapes,
        channels,
        poll,
        grid,
        colors,
        toggles,
        title,
    })))
}

/// A fixed `-y +y` pair; the range must not be empty.
pub fn parse_limits(lo: &str, hi: &str) -> Result<Limits, ConfigError> {
    let limits = Limits {
        lo: parse_number(lo)?,
        hi: parse_number(hi)?,
    };
    check_limits(limits)
}

pub fn check_limits(limits: Limits) -> Result<Limits, ConfigError> {
    if limits.lo == limits.hi {
        return Err(ConfigError::EmptyRange);
    }
    Ok(limits)
}

/// `N`, `H/n` or `DxN`, returning `(history, divisions)`.
pub fn parse_hist_spec(spec: &str) -> Result<(usize, usize), ConfigError> {
    let bad = || ConfigError::BadHistSpec(spec.to_string());
    let Some(at) = spec.find(['/', 'x', '*']) else {
        let divisions = parse_count(spec).map_err(|_| bad())?;
        let history = divisions.checked_add(1).ok_or_else(bad)?;
        return Ok((history, divisions));
    };
    let (head, tail) = (&spec[..at], &spec[at + 1..]);
    if head.is_empty() || tail.is_empty() {
        return Err(bad());
    }
    let head = parse_count(head).map_err(|_| bad())?;
    let tail = parse_count(tail).map_err(|_| bad())?;
    if spec.as_bytes()[at] == b'/' {
        if tail == 0 {
            return Err(bad());
        }
        Ok((head, head / tail))
    } else {
        let history = head.checked_mul(tail).ok_or_else(bad)?;
        Ok((history, head))
    }
}

/// `[n]a|i|d`, returning the channel count and input mode.
fn parse_input(spec: &str) -> Result<(usize, InputMode), ConfigError> {
    let bad = || ConfigError::BadInputMode(spec.to_string());
    let digits = spec.bytes().take_while(u8::is_ascii_digit).count();
    let count = if digits == 0 {
        1
    } else {
        spec[..digits].parse().map_err(|_| bad())?
    };
    let mut mode = spec[digits..].chars();
    let input = mode.next().and_then(InputMode::from_flag).ok_or_else(bad)?;
    if count == 0 || mode.next().is_some() {
        return Err(bad());
    }
    Ok((count, input))
}

/// Poll interval for a rate in Hz.
pub fn parse_poll_rate(raw: &str) -> Result<Duration, ConfigError> {
    match raw.trim().parse::<f64>() {
        Ok(rate) if rate.is_finite() && rate > 0.0 => Ok(Duration::from_secs_f64(1.0 / rate)),
        _ => Err(ConfigError::BadPollRate(raw.to_string())),
    }
}

pub fn parse_number(raw: &str) -> Result<f64, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::BadNumber(raw.to_string()))
}

fn parse_count(raw: &str) -> Result<usize, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::BadNumber(raw.to_string()))
}

fn parse_numbers(raw: &str) -> Result<Vec<f64>, ConfigError> {
    raw.split(',').map(parse_number).collect()
}

fn parse_one_color(raw: &str) -> Result<Rgb, ConfigError> {
    color::parse_color(raw).ok_or_else(|| ConfigError::BadColor(raw.to_string()))
}

/// Empty entries keep the palette color for that channel.
fn parse_color_list(raw: &str) -> Result<Vec<Option<Rgb>>, ConfigError> {
    raw.split(',')
        .map(|entry| {
            if entry.is_empty() {
                Ok(None)
            } else {
                parse_one_color(entry).map(Some)
            }
        })
        .collect()
}
