use std::sync::Arc;
use std::time::{Duration, Instant};

use egui::{self, Align2, Color32, FontId, Painter, PointerButton, Pos2, Rect, Rounding, Stroke};
use log::debug;

use crate::color::Rgb;
use crate::config::{Colors, Config, GridAxis};
use crate::controls::{Action, Controls, EditKey, Flow};
use crate::distrib::distribution;
use crate::geometry::{DisplayMode, FillBand, Geometry, TraceSegment, grid_y};
use crate::intersect::{DEFAULT_CANDIDATES, Probe, intersect};
use crate::pipeline::PipelineState;
use crate::snapshot::{Graph, Limits, Snapshotter, ViewMode};
use crate::timer::AveragingTimer;

const DISTRIB_WIDTH: f32 = 30.0;
const FONT_SIZE: f32 = 13.0;
const LINE_HEIGHT: f32 = 15.0;
const SPACING: f32 = 2.0;
const MARK_RADIUS: f32 = 4.0;
/// Minimum pixels between grid lines.
const MAX_GRID_DENSITY: f32 = 4.0;
const OTHERS_ALPHA: f32 = 0.3;
const FILL_ALPHA: f32 = 0.25;
const UNDEFINED_ALPHA: f32 = 0.125;
const KEY_SWATCH_ALPHA: f32 = 0.25;
const PANEL_ALPHA: f32 = 0.9;
const LATENCY_WINDOW: Duration = Duration::from_secs(5);

/// Maps data coordinates (column, value) into the plot rectangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    pub plot: Rect,
    pub divisions: f64,
    pub limits: Limits,
}

impl Projection {
    pub fn to_screen(&self, x: f64, y: f64) -> Pos2 {
        let span = self.limits.hi - self.limits.lo;
        let fx = (x / self.divisions) as f32;
        let fy = ((y - self.limits.lo) / span) as f32;
        Pos2::new(
            self.plot.left() + fx * self.plot.width(),
            self.plot.bottom() - fy * self.plot.height(),
        )
    }

    pub fn to_data(&self, pos: Pos2) -> (f64, f64) {
        let fx = ((pos.x - self.plot.left()) / self.plot.width()) as f64;
        let fy = ((pos.y - self.plot.top()) / self.plot.height()) as f64;
        (
            fx * self.divisions,
            self.limits.hi - fy * (self.limits.hi - self.limits.lo),
        )
    }
}

pub struct TrendApp {
    state: Arc<PipelineState>,
    geometry: Geometry,
    snapshotter: Snapshotter,
    controls: Controls,
    colors: Colors,
    visual_latency: AveragingTimer,
    smoothing: Option<bool>,
}

impl TrendApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: &Config, state: Arc<PipelineState>) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());
        Self {
            geometry: config.geometry(),
            snapshotter: Snapshotter::new(
                &config.channels,
                config.history,
                config.limits,
                config.grid.y.res,
            ),
            controls: Controls::new(config),
            colors: config.colors,
            visual_latency: AveragingTimer::new(LATENCY_WINDOW),
            smoothing: None,
            state,
        }
    }

    fn mode(&self) -> DisplayMode {
        self.controls.toggles.display_mode()
    }

    fn apply_smoothing(&mut self, ctx: &egui::Context) {
        let smooth = self.controls.toggles.smooth;
        if self.smoothing != Some(smooth) {
            ctx.tessellation_options_mut(|options| options.feathering = smooth);
            self.smoothing = Some(smooth);
        }
    }

    fn handle_keys(&mut self, ctx: &egui::Context) -> Flow {
        for input in collect_key_input(ctx) {
            if self.controls.prompt().is_some() {
                let key = match input {
                    KeyInput::Char(c) => EditKey::Char(c),
                    KeyInput::Enter => EditKey::Enter,
                    KeyInput::Backspace => EditKey::Backspace,
                    KeyInput::Escape => EditKey::Escape,
                    KeyInput::Tab => continue,
                };
                self.controls.edit(key, &mut self.snapshotter);
                continue;
            }

            let action = match input {
                KeyInput::Char(c) => Action::from_char(c),
                KeyInput::Tab => Some(Action::NextGraph),
                KeyInput::Escape => Some(Action::Quit),
                KeyInput::Enter | KeyInput::Backspace => None,
            };
            if let Some(action) = action {
                debug!("key action {action:?}");
                if self.controls.apply(action, &mut self.snapshotter) == Flow::Quit {
                    return Flow::Quit;
                }
            }
        }
        Flow::Continue
    }

    fn handle_pointer(&mut self, ctx: &egui::Context, response: &egui::Response, projection: &Projection) {
        if self.controls.prompt().is_some() {
            return;
        }
        if response.secondary_clicked() {
            self.controls.probe = None;
            return;
        }
        let pressed = response.clicked_by(PointerButton::Primary)
            || response.dragged_by(PointerButton::Primary);
        if let (true, Some(pos)) = (pressed, response.interact_pointer_pos()) {
            let (x, y) = projection.to_data(pos);
            self.controls.probe = Some(Probe {
                x,
                y,
                foreground: ctx.input(|i| i.modifiers.ctrl),
            });
        }
    }

    fn paint(&self, painter: &Painter, rect: Rect) {
        let toggles = self.controls.toggles;
        let projection = self.projection(rect);
        let mode = self.mode();

        if toggles.grid {
            self.draw_grid(painter, &projection);
        }
        if toggles.fill || toggles.undefined {
            self.draw_fill(painter, &projection);
        }

        let view = self.snapshotter.view();
        let active = self.snapshotter.active();
        if view != ViewMode::Hide {
            let alpha = if view == ViewMode::Dim { OTHERS_ALPHA } else { 1.0 };
            for (index, graph) in self.snapshotter.graphs().iter().enumerate() {
                if index != active {
                    self.draw_trace(painter, &projection, graph, alpha);
                }
            }
        }
        let graph = self.snapshotter.active_graph();
        self.draw_trace(painter, &projection, graph, 1.0);

        let bins = if toggles.distrib {
            let bins = distribution(
                &graph.snapshot().values,
                projection.limits,
                rect.height().max(0.0) as usize,
            );
            draw_distribution(painter, rect, &bins);
            bins
        } else {
            Vec::new()
        };

        if toggles.marker && mode == DisplayMode::Wrap {
            let snapshot = graph.snapshot();
            let column = self.geometry.column(
                mode,
                snapshot.push_count,
                snapshot.values.len().saturating_sub(1),
            );
            self.draw_marker(painter, &projection, column as f64);
        }

        if let Some(probe) = self.controls.probe {
            if toggles.distrib && probe.x < 0.0 {
                self.draw_distribution_probe(painter, rect, &projection, probe, &bins);
            } else {
                self.draw_intersections(painter, rect, &projection, probe);
            }
        }

        let mut corner = LowerLeft::new(rect);
        if toggles.values {
            self.draw_values(painter, rect, &mut corner);
        }
        if toggles.graph_key {
            self.draw_graph_key(painter, rect);
        }
        if toggles.latency {
            let text = format!(
                "lat: {}/{}",
                general(self.visual_latency_ms()),
                general(self.buffer_latency_ms()),
            );
            corner.text(painter, text, rgb(self.colors.text));
        }

        if let Some(prompt) = self.controls.prompt() {
            draw_edit(
                painter,
                rect,
                &format!("{}: {}", prompt.field().label(), prompt.text()),
                rgb(self.colors.edit),
            );
        }
        if !self.controls.messages().is_empty() {
            let lines: Vec<&str> = self.controls.messages().iter().collect();
            draw_messages(painter, rect, &lines, rgb(self.colors.edit));
        }
    }

    fn projection(&self, rect: Rect) -> Projection {
        let mut plot = rect;
        if self.controls.toggles.distrib {
            plot.min.x = (rect.left() + DISTRIB_WIDTH).min(rect.right() - 1.0);
        }
        Projection {
            plot,
            divisions: self.geometry.divisions() as f64,
            limits: self.snapshotter.limits(),
        }
    }

    fn draw_grid(&self, painter: &Painter, projection: &Projection) {
        let limits = projection.limits;
        let mode = self.mode();
        let divisions = projection.divisions;
        let color = self.colors.grid;

        let x_lines = |step: f64| self.geometry.grid_x(step, mode);
        for (step, alpha) in grid_steps(self.controls.grid.x, divisions, projection.plot.width()) {
            let stroke = Stroke::new(1.0, rgba(color, alpha));
            for x in x_lines(step) {
                painter.line_segment(
                    [projection.to_screen(x, limits.lo), projection.to_screen(x, limits.hi)],
                    stroke,
                );
            }
        }

        let span = limits.hi - limits.lo;
        for (step, alpha) in grid_steps(self.controls.grid.y, span, projection.plot.height()) {
            let stroke = Stroke::new(1.0, rgba(color, alpha));
            for y in grid_y(limits.lo, limits.hi, step) {
                painter.line_segment(
                    [projection.to_screen(0.0, y), projection.to_screen(divisions, y)],
                    stroke,
                );
            }
        }
    }

    fn draw_trace(&self, painter: &Painter, projection: &Projection, graph: &Graph, alpha: f32) {
        let snapshot = graph.snapshot();
        let dimmed = self.controls.toggles.dimmed;
        let shade = |slot: usize| rgba(graph.color, self.geometry.shade(slot, dimmed) * alpha);

        for segment in self.geometry.trace(&snapshot.values, snapshot.push_count, self.mode()) {
            match segment {
                TraceSegment::Strip(points) => {
                    for pair in points.windows(2) {
                        let (a, b) = (pair[0], pair[1]);
                        painter.line_segment(
                            [projection.to_screen(a.x, a.y), projection.to_screen(b.x, b.y)],
                            Stroke::new(1.0, shade(b.slot)),
                        );
                    }
                }
                TraceSegment::Dot(point) => {
                    let stroke = Stroke::new(1.0, shade(point.slot));
                    let ticks = if point.x == 0.0 {
                        vec![(0.0, 0.5), (projection.divisions - 0.5, projection.divisions)]
                    } else {
                        vec![(point.x - 0.5, point.x + 0.5)]
                    };
                    for (from, to) in ticks {
                        painter.line_segment(
                            [
                                projection.to_screen(from, point.y),
                                projection.to_screen(to, point.y),
                            ],
                            stroke,
                        );
                    }
                }
            }
        }
    }

    /// Shade the active graph's last cycle.
    fn draw_fill(&self, painter: &Painter, projection: &Projection) {
        let toggles = self.controls.toggles;
        let graph = self.snapshotter.active_graph();
        let snapshot = graph.snapshot();
        let mode = self.mode();

        if toggles.fill {
            let color = rgba(graph.color, FILL_ALPHA);
            let bands = self.geometry.fill(
                &snapshot.values,
                snapshot.push_count,
                mode,
                toggles.dimmed,
            );
            for band in &bands {
                fill_band(painter, projection, band, color);
            }
        }
        if toggles.undefined {
            let color = rgba(graph.color, UNDEFINED_ALPHA);
            let limits = projection.limits;
            let runs = self.geometry.undefined_runs(&snapshot.values, snapshot.push_count, mode);
            for (begin, end) in runs {
                let area = Rect::from_two_pos(
                    projection.to_screen(begin, limits.hi),
                    projection.to_screen(end, limits.lo),
                );
                painter.rect_filled(area, Rounding::ZERO, color);
            }
        }
    }

    fn draw_marker(&self, painter: &Painter, projection: &Projection, x: f64) {
        let limits = projection.limits;
        painter.line_segment(
            [projection.to_screen(x, limits.lo), projection.to_screen(x, limits.hi)],
            Stroke::new(1.0, rgb(self.colors.marker)),
        );
    }

    fn draw_intersections(&self, painter: &Painter, rect: Rect, projection: &Projection, probe: Probe) {
        let limits = projection.limits;
        let divisions = projection.divisions;
        let color = rgb(self.colors.intersection);
        let stroke = Stroke::new(1.0, color);

        let x = if (0.0..=divisions).contains(&probe.x) { probe.x } else { 0.0 };
        painter.line_segment(
            [projection.to_screen(x, limits.lo), projection.to_screen(x, limits.hi)],
            stroke,
        );

        let snapshot = self.snapshotter.active_graph().snapshot();
        let found = intersect(
            &self.geometry,
            self.mode(),
            &snapshot.values,
            snapshot.push_count,
            probe,
            DEFAULT_CANDIDATES,
        );
        let Some(nearest) = found.nearest() else {
            return;
        };

        for hit in &found.hits {
            painter.line_segment(
                [projection.to_screen(0.0, hit.value), projection.to_screen(divisions, hit.value)],
                stroke,
            );
        }

        let mark = projection.to_screen(nearest.column as f64, nearest.near);
        draw_diamond(painter, mark, stroke);
        if nearest.column == 0 {
            draw_diamond(painter, Pos2::new(projection.plot.right(), mark.y), stroke);
        }

        let text_color = rgb(self.colors.text);
        let font = FontId::monospace(FONT_SIZE);
        let mut y = rect.top() + SPACING;
        let left = projection.plot.left() + SPACING;
        painter.text(
            Pos2::new(left, y),
            Align2::LEFT_TOP,
            format!("nearest: {}, mean: {}", general(nearest.near), general(found.mean)),
            font.clone(),
            text_color,
        );
        for (index, hit) in found.hits.iter().enumerate() {
            y += LINE_HEIGHT;
            painter.text(
                Pos2::new(left, y),
                Align2::LEFT_TOP,
                format!("{}: {}", index + 1, general(hit.value)),
                font.clone(),
                text_color,
            );
        }
    }

    fn draw_distribution_probe(
        &self,
        painter: &Painter,
        rect: Rect,
        projection: &Projection,
        probe: Probe,
        bins: &[f64],
    ) {
        let y = projection.to_screen(0.0, probe.y).y;
        painter.line_segment(
            [Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)],
            Stroke::new(1.0, rgb(self.colors.intersection)),
        );
        // Bins count upwards from the bottom edge.
        let from_bottom = rect.bottom() - y;
        let density = if from_bottom >= 0.0 && (from_bottom as usize) < bins.len() {
            bins[from_bottom as usize]
        } else {
            f64::NAN
        };
        painter.text(
            Pos2::new(rect.left() + SPACING, rect.top() + SPACING),
            Align2::LEFT_TOP,
            format!("{}: {}", general(probe.y), general(density)),
            FontId::monospace(FONT_SIZE),
            rgb(self.colors.text),
        );
    }

    fn draw_values(&self, painter: &Painter, rect: Rect, corner: &mut LowerLeft) {
        let color = rgb(self.colors.text);
        let font = FontId::monospace(FONT_SIZE);
        let limits = self.snapshotter.limits();
        painter.text(
            Pos2::new(rect.right() - SPACING, rect.bottom() - SPACING),
            Align2::RIGHT_BOTTOM,
            general(limits.lo),
            font.clone(),
            color,
        );
        painter.text(
            Pos2::new(rect.right() - SPACING, rect.top() + SPACING),
            Align2::RIGHT_TOP,
            general(limits.hi),
            font,
            color,
        );

        let graph = self.snapshotter.active_graph();
        let last = general(graph.snapshot().last());
        let text = if self.controls.toggles.graph_key {
            last
        } else {
            format!("{}: {last}", graph.label)
        };
        corner.text(painter, text, color);
    }

    fn draw_graph_key(&self, painter: &Painter, rect: Rect) {
        let font = FontId::monospace(FONT_SIZE);
        let text_color = rgb(self.colors.text);
        let graphs = self.snapshotter.graphs();
        let active = self.snapshotter.active();
        let lines: Vec<String> = graphs
            .iter()
            .map(|graph| {
                if self.controls.toggles.values {
                    format!("{}: {}", graph.label, general(graph.snapshot().last()))
                } else {
                    graph.label.clone()
                }
            })
            .collect();
        let text_width = lines
            .iter()
            .map(|line| {
                painter
                    .layout_no_wrap(line.clone(), font.clone(), text_color)
                    .size()
                    .x
            })
            .fold(0.0, f32::max);

        let swatch = LINE_HEIGHT * 1.5;
        let top = rect.top() + LINE_HEIGHT * 2.0;
        let right = rect.right();
        let text_left = right - swatch - text_width - SPACING * 2.0;
        let panel = Rect::from_min_max(
            Pos2::new(text_left - SPACING, top - SPACING),
            Pos2::new(right, top + LINE_HEIGHT * graphs.len() as f32 + SPACING),
        );
        painter.rect_filled(panel, Rounding::ZERO, Color32::from_black_alpha(alpha_byte(PANEL_ALPHA)));

        for (index, (graph, line)) in graphs.iter().zip(&lines).enumerate() {
            let y = top + LINE_HEIGHT * index as f32;
            let is_active = index == active;
            let swatch_rect = Rect::from_min_max(
                Pos2::new(right - swatch, y),
                Pos2::new(right, y + LINE_HEIGHT),
            );
            let swatch_alpha = if is_active { 1.0 } else { KEY_SWATCH_ALPHA };
            painter.rect_filled(swatch_rect, Rounding::ZERO, rgba(graph.color, swatch_alpha));
            if is_active {
                let highlight = Rect::from_min_max(
                    Pos2::new(text_left - SPACING, y),
                    Pos2::new(right - swatch, y + LINE_HEIGHT),
                );
                painter.rect_filled(highlight, Rounding::ZERO, rgba(graph.color, KEY_SWATCH_ALPHA));
            }
            painter.text(
                Pos2::new(right - swatch - SPACING, y + LINE_HEIGHT / 2.0),
                Align2::RIGHT_CENTER,
                line,
                font.clone(),
                text_color,
            );
        }
    }

    fn visual_latency_ms(&self) -> f64 {
        self.visual_latency.average().as_secs_f64() * 1000.0
    }

    fn buffer_latency_ms(&self) -> f64 {
        self.snapshotter.buffer_latency().as_secs_f64() * 1000.0
    }
}

impl eframe::App for TrendApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.request_repaint_after(self.controls.poll);

        let fresh = !self.controls.paused && self.snapshotter.tick(&self.state);
        if fresh {
            self.visual_latency.start();
        }
        self.apply_smoothing(ctx);

        if self.handle_keys(ctx) == Flow::Quit {
            debug!("quit requested");
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
        self.controls.messages_mut().purge(Instant::now());

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(rgb(self.colors.background)))
            .show(ctx, |ui| {
                let (rect, response) =
                    ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());
                let projection = self.projection(rect);
                self.handle_pointer(ctx, &response, &projection);
                let painter = ui.painter_at(rect);
                self.paint(&painter, rect);
            });

        if fresh {
            self.visual_latency.stop();
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum KeyInput {
    Char(char),
    Tab,
    Enter,
    Backspace,
    Escape,
}

fn collect_key_input(ctx: &egui::Context) -> Vec<KeyInput> {
    let mut keys = Vec::new();
    ctx.input(|input| {
        for event in &input.events {
            match event {
                egui::Event::Text(text) => keys.extend(text.chars().map(KeyInput::Char)),
                egui::Event::Key {
                    key, pressed: true, ..
                } => match key {
                    egui::Key::Tab => keys.push(KeyInput::Tab),
                    egui::Key::Enter => keys.push(KeyInput::Enter),
                    egui::Key::Backspace => keys.push(KeyInput::Backspace),
                    egui::Key::Escape => keys.push(KeyInput::Escape),
                    _ => {}
                },
                _ => {}
            }
        }
    });
    keys
}

/// Minor and major line steps for one axis, with their opacity. Lines denser
/// than one every few pixels are left out.
fn grid_steps(axis: GridAxis, range: f64, pixels: f32) -> Vec<(f64, f32)> {
    let mut steps = Vec::new();
    if !(axis.res > 0.0) || !(range > 0.0) {
        return steps;
    }
    let lines = range / axis.res;
    let room = (pixels / MAX_GRID_DENSITY) as f64;
    let major = axis.major as f64;
    if lines >= room * major {
        return steps;
    }
    if axis.major != 1 && lines < room {
        steps.push((axis.res, 0.5));
    }
    if axis.major != 0 {
        steps.push((axis.res * major, 1.0));
    }
    steps
}

fn draw_distribution(painter: &Painter, rect: Rect, bins: &[f64]) {
    let width = DISTRIB_WIDTH.min(rect.width());
    let mut start = 0;
    while start < bins.len() {
        let level = bins[start];
        let mut end = start + 1;
        while end < bins.len() && bins[end] == level {
            end += 1;
        }
        let gray = (level.clamp(0.0, 1.0) * 255.0).round() as u8;
        let band = Rect::from_min_max(
            Pos2::new(rect.left(), rect.bottom() - end as f32),
            Pos2::new(rect.left() + width, rect.bottom() - start as f32),
        );
        painter.rect_filled(band, Rounding::ZERO, Color32::from_gray(gray));
        start = end;
    }
}

fn draw_diamond(painter: &Painter, center: Pos2, stroke: Stroke) {
    let points = vec![
        Pos2::new(center.x - MARK_RADIUS, center.y),
        Pos2::new(center.x, center.y - MARK_RADIUS),
        Pos2::new(center.x + MARK_RADIUS, center.y),
        Pos2::new(center.x, center.y + MARK_RADIUS),
    ];
    painter.add(egui::Shape::closed_line(points, stroke));
}

fn draw_edit(painter: &Painter, rect: Rect, text: &str, color: Color32) {
    let middle = rect.center().y;
    let block = LINE_HEIGHT * 2.0;
    let border = LINE_HEIGHT / 2.0;
    let band = |top: f32, bottom: f32| {
        Rect::from_min_max(Pos2::new(rect.left(), top), Pos2::new(rect.right(), bottom))
    };
    painter.rect_filled(
        band(middle - block, middle + block),
        Rounding::ZERO,
        Color32::from_black_alpha(alpha_byte(PANEL_ALPHA)),
    );
    painter.rect_filled(band(middle - block - border, middle - block), Rounding::ZERO, color);
    painter.rect_filled(band(middle + block, middle + block + border), Rounding::ZERO, color);
    painter.text(
        rect.center(),
        Align2::CENTER_CENTER,
        text,
        FontId::monospace(FONT_SIZE),
        color,
    );
}

fn draw_messages(painter: &Painter, rect: Rect, lines: &[&str], color: Color32) {
    let height = LINE_HEIGHT * lines.len() as f32 + SPACING * 4.0;
    painter.rect_filled(
        Rect::from_min_max(rect.min, Pos2::new(rect.right(), rect.top() + height)),
        Rounding::ZERO,
        Color32::from_black_alpha(alpha_byte(PANEL_ALPHA)),
    );
    let mut y = rect.top() + SPACING * 2.0;
    for line in lines {
        painter.text(
            Pos2::new(rect.center().x, y),
            Align2::CENTER_TOP,
            line,
            FontId::monospace(FONT_SIZE),
            color,
        );
        y += LINE_HEIGHT;
    }
}

/// Text lines stacked upwards from the lower-left corner.
struct LowerLeft {
    origin: Pos2,
    lines: usize,
}

impl LowerLeft {
    fn new(rect: Rect) -> Self {
        Self {
            origin: Pos2::new(rect.left() + SPACING, rect.bottom() - SPACING),
            lines: 0,
        }
    }

    fn text(&mut self, painter: &Painter, text: String, color: Color32) {
        let pos = Pos2::new(self.origin.x, self.origin.y - LINE_HEIGHT * self.lines as f32);
        painter.text(pos, Align2::LEFT_BOTTOM, text, FontId::monospace(FONT_SIZE), color);
        self.lines += 1;
    }
}

fn fill_band(painter: &Painter, projection: &Projection, band: &FillBand, color: Color32) {
    for pair in band.windows(2) {
        let (l, r) = (pair[0], pair[1]);
        let quad = vec![
            projection.to_screen(l.x, l.a),
            projection.to_screen(r.x, r.a),
            projection.to_screen(r.x, r.b),
            projection.to_screen(l.x, l.b),
        ];
        painter.add(egui::Shape::convex_polygon(quad, color, Stroke::NONE));
    }
}

fn rgb(color: Rgb) -> Color32 {
    Color32::from_rgb(color[0], color[1], color[2])
}

fn rgba(color: Rgb, alpha: f32) -> Color32 {
    Color32::from_rgba_unmultiplied(color[0], color[1], color[2], alpha_byte(alpha))
}

fn alpha_byte(alpha: f32) -> u8 {
    (alpha.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Shortest readable form of a value, six significant digits at most.
pub fn general(value: f64) -> String {
    if !value.is_finite() {
        return format!("{value}");
    }
    if value == 0.0 {
        return "0".to_string();
    }
    let exponent = value.abs().log10().floor() as i32;
    if !(-4..6).contains(&exponent) {
        let formatted = format!("{value:.5e}");
        return match formatted.split_once('e') {
            Some((mantissa, exp)) => format!("{}e{exp}", trim_fraction(mantissa)),
            None => formatted,
        };
    }
    let decimals = (5 - exponent).max(0) as usize;
    trim_fraction(&format!("{value:.decimals$}")).to_string()
}

fn trim_fraction(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn projection() -> Projection {
        Projection {
            plot: Rect::from_min_max(Pos2::new(10.0, 0.0), Pos2::new(110.0, 50.0)),
            divisions: 10.0,
            limits: Limits { lo: -1.0, hi: 1.0 },
        }
    }

    #[test]
    fn projection_maps_corners() {
        let projection = projection();
        assert_eq!(projection.to_screen(0.0, -1.0), Pos2::new(10.0, 50.0));
        assert_eq!(projection.to_screen(10.0, 1.0), Pos2::new(110.0, 0.0));
        assert_eq!(projection.to_screen(5.0, 0.0), Pos2::new(60.0, 25.0));
    }

    #[test]
    fn projection_round_trips_pointer() {
        let projection = projection();
        let (x, y) = projection.to_data(Pos2::new(35.0, 12.5));
        assert!((x - 2.5).abs() < 1e-6);
        assert!((y - 0.5).abs() < 1e-6);
        // Left of the plot maps to negative columns.
        assert!(projection.to_data(Pos2::new(0.0, 0.0)).0 < 0.0);
    }

    #[test]
    fn grid_density_limits() {
        let axis = GridAxis { res: 1.0, major: 10 };
        // 10 lines over 400 px: both minor and major.
        assert_eq!(grid_steps(axis, 10.0, 400.0), vec![(1.0, 0.5), (10.0, 1.0)]);
        // 500 lines over 400 px: only majors fit.
        assert_eq!(grid_steps(axis, 500.0, 400.0), vec![(10.0, 1.0)]);
        // No majors means no grid at all.
        assert!(grid_steps(GridAxis { res: 1.0, major: 0 }, 10.0, 400.0).is_empty());
        // Far too dense for anything.
        assert!(grid_steps(axis, 100_000.0, 400.0).is_empty());
        // major 1 draws a single full-strength set.
        let single = GridAxis { res: 2.0, major: 1 };
        assert_eq!(grid_steps(single, 10.0, 400.0), vec![(2.0, 1.0)]);
        assert!(grid_steps(axis, 0.0, 400.0).is_empty());
    }

    #[test]
    fn general_number_format() {
        assert_eq!(general(0.0), "0");
        assert_eq!(general(0.1 + 0.2), "0.3");
        assert_eq!(general(-2.5), "-2.5");
        assert_eq!(general(100.0), "100");
        assert_eq!(general(123456.0), "123456");
        assert_eq!(general(1234567.0), "1.23457e6");
        assert_eq!(general(0.00001), "1e-5");
        assert_eq!(general(f64::NAN), "NaN");
        assert_eq!(general(f64::INFINITY), "inf");
    }
}
