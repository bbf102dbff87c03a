#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for Join Circuit.
//!
//! Macroquad's optional audio stack depends on native ALSA development
//! libraries, which are unavailable in the containerised CI environment.
//! To keep `cargo test` usable everywhere we depend on macroquad without its
//! default `audio` feature.
//!
//! The adapter uses Macroquad's immediate-mode UI module for the guide panel
//! and the terminal overlay. All UI-specific calls live inside the local `ui`
//! module to avoid leaking Macroquad UI types throughout the renderer.
//! Macroquad draws straight lines only, so connection curves are flattened
//! into short segment chains before stroking.

mod ui;

use self::ui::{draw_guide_panel_ui, draw_overlay_ui, GuidePanelUiContext, OverlayUiContext};
use anyhow::Result;
use glam::Vec2;
use macroquad::input::{
    is_key_down, is_key_pressed, is_mouse_button_down, is_mouse_button_pressed,
    is_mouse_button_released, mouse_position, KeyCode, MouseButton,
};
use macroquad::math::Vec2 as MacroquadVec2;
use join_circuit_core::TableId;
use join_circuit_rendering::{
    palette, Color, FrameInput, Presentation, RenderingBackend, Scene, SceneConnection, SceneNode,
    SceneParticle, StabilityBand, StatusOverlayView,
};
use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

/// Number of straight segments used to flatten a connection curve.
const CURVE_SEGMENTS: u32 = 24;

/// Stroke width of connection curves.
const CONNECTION_STROKE: f32 = 3.0;

/// Dash and gap length of dashed strokes, in screen units.
const DASH_LENGTH: f32 = 5.0;

/// Particle dot radius.
const PARTICLE_RADIUS: f32 = 3.0;

/// Translucent layers used to approximate a node's radial glow.
const GLOW_LAYERS: u32 = 6;

/// Screen rectangle in top-left/size form.
#[derive(Clone, Copy, Debug, PartialEq)]
struct PanelRect {
    origin: Vec2,
    size: Vec2,
}

impl PanelRect {
    fn contains(&self, point: Vec2) -> bool {
        point.x >= self.origin.x
            && point.x < self.origin.x + self.size.x
            && point.y >= self.origin.y
            && point.y < self.origin.y + self.size.y
    }
}

/// Tracks UI-sourced interactions so they can be merged with pointer input on
/// the next frame.
#[derive(Clone, Debug, Default)]
struct PanelInputState {
    spawn_latched: Option<TableId>,
    retry_latched: bool,
    advance_latched: bool,
}

impl PanelInputState {
    /// Returns the latched spawn request, clearing it so the action fires
    /// only once.
    fn take_spawn(&mut self) -> Option<TableId> {
        self.spawn_latched.take()
    }

    fn register_spawn(&mut self, id: TableId) {
        self.spawn_latched = Some(id);
    }

    fn take_retry(&mut self) -> bool {
        let latched = self.retry_latched;
        self.retry_latched = false;
        latched
    }

    fn register_retry(&mut self) {
        self.retry_latched = true;
    }

    fn take_advance(&mut self) -> bool {
        let latched = self.advance_latched;
        self.advance_latched = false;
        latched
    }

    fn register_advance(&mut self) {
        self.advance_latched = true;
    }
}

/// Snapshot of edge-triggered keyboard shortcuts observed during a frame.
#[derive(Clone, Copy, Debug, Default)]
struct KeyboardShortcuts {
    /// `Q` or `Escape` to quit the frame loop.
    quit_requested: bool,
    /// `Enter` triggers the terminal overlay's action.
    overlay_action: bool,
}

impl KeyboardShortcuts {
    fn poll() -> Self {
        Self {
            quit_requested: is_key_pressed(KeyCode::Escape) || is_key_pressed(KeyCode::Q),
            overlay_action: is_key_pressed(KeyCode::Enter),
        }
    }
}

/// Tracks the average frames-per-second produced by the render loop.
#[derive(Debug, Default)]
struct FpsCounter {
    elapsed: Duration,
    frames: u32,
    frame_times: VecDeque<Duration>,
    window_duration: Duration,
}

impl FpsCounter {
    /// Records a rendered frame and returns the per-second and trailing
    /// ten-second averages once one second has elapsed.
    fn record_frame(&mut self, frame: Duration) -> Option<(f32, f32)> {
        self.elapsed += frame;
        self.frames = self.frames.saturating_add(1);
        self.frame_times.push_back(frame);
        self.window_duration += frame;

        let trailing_window = Duration::from_secs(10);
        while self.window_duration > trailing_window {
            if let Some(removed) = self.frame_times.pop_front() {
                self.window_duration = self.window_duration.saturating_sub(removed);
            } else {
                break;
            }
        }

        if self.elapsed < Duration::from_secs(1) {
            return None;
        }

        let seconds = self.elapsed.as_secs_f32();
        if seconds <= f32::EPSILON {
            self.elapsed = Duration::ZERO;
            self.frames = 0;
            return None;
        }

        let per_second = self.frames as f32 / seconds;
        let window_seconds = self.window_duration.as_secs_f32();
        let trailing = if window_seconds <= f32::EPSILON {
            per_second
        } else {
            self.frame_times.len() as f32 / window_seconds
        };
        self.elapsed = Duration::ZERO;
        self.frames = 0;
        Some((per_second, trailing))
    }
}

/// Rendering backend implemented on top of macroquad.
#[derive(Debug)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    show_fps: bool,
}

impl Default for MacroquadBackend {
    fn default() -> Self {
        Self {
            swap_interval: None,
            show_fps: false,
        }
    }
}

impl MacroquadBackend {
    /// Returns a backend that requests the platform's default swap interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to request a specific swap interval.
    #[must_use]
    pub fn with_swap_interval(mut self, swap_interval: Option<i32>) -> Self {
        self.swap_interval = swap_interval;
        self
    }

    /// Configures the backend to either synchronise presentation with the
    /// display refresh rate or render as fast as possible.
    #[must_use]
    pub fn with_vsync(self, enabled: bool) -> Self {
        let swap_interval = if enabled { Some(1) } else { Some(0) };
        self.with_swap_interval(swap_interval)
    }

    /// Configures whether the backend prints frame timing metrics once per
    /// second.
    #[must_use]
    pub fn with_show_fps(mut self, show: bool) -> Self {
        self.show_fps = show;
        self
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static,
    {
        let Self {
            swap_interval,
            show_fps,
        } = self;

        let Presentation {
            window_title,
            clear_color,
            scene,
        } = presentation;

        let mut config = macroquad::window::Conf {
            window_title,
            window_width: 1280,
            window_height: 720,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        macroquad::Window::from_config(config, async move {
            let mut scene = scene;
            let background = to_macroquad_color(clear_color);
            let mut fps_counter = FpsCounter::default();
            let mut panel_input = PanelInputState::default();

            loop {
                let keyboard = KeyboardShortcuts::poll();
                if keyboard.quit_requested {
                    break;
                }

                macroquad::window::clear_background(background);

                let screen_width = macroquad::window::screen_width();
                let screen_height = macroquad::window::screen_height();

                let dt_seconds = macroquad::time::get_frame_time();
                let frame_dt = Duration::from_secs_f32(dt_seconds.max(0.0));

                let panel_rect = guide_panel_rect(&scene);
                let meter_region = meter_rect(screen_width);
                let frame_input =
                    gather_frame_input(&scene, &mut panel_input, &[panel_rect, meter_region]);

                update_scene(frame_dt, frame_input, &mut scene);

                let render_start = Instant::now();
                draw_grid(&scene, screen_width, screen_height);
                for connection in &scene.connections {
                    draw_connection(connection);
                }
                if let Some(preview) = scene.preview {
                    draw_dashed_line(
                        preview.from,
                        preview.to,
                        2.0,
                        to_macroquad_color(palette::PREVIEW_LINE),
                    );
                }
                for particle in &scene.particles {
                    draw_particle(particle);
                }
                let pulse = scene.pulse_amplitude();
                for node in &scene.nodes {
                    draw_node(node, pulse);
                }
                draw_meter(&scene, meter_region);

                let panel_context = GuidePanelUiContext {
                    origin: MacroquadVec2::new(panel_rect.origin.x, panel_rect.origin.y),
                    size: MacroquadVec2::new(panel_rect.size.x, panel_rect.size.y),
                    panel: &scene.panel,
                };
                let panel_result = {
                    let mut root_ui = macroquad::ui::root_ui();
                    draw_guide_panel_ui(&mut root_ui, panel_context)
                };
                if let Some(id) = panel_result.spawn {
                    panel_input.register_spawn(id);
                }

                if let Some(overlay) = scene.overlay {
                    draw_overlay_backdrop(overlay, screen_width, screen_height);
                    let overlay_result = {
                        let mut root_ui = macroquad::ui::root_ui();
                        draw_overlay_ui(
                            &mut root_ui,
                            OverlayUiContext {
                                overlay,
                                screen_width,
                                screen_height,
                            },
                        )
                    };
                    let action = overlay_result.action || keyboard.overlay_action;
                    if action {
                        match overlay {
                            StatusOverlayView::Won => panel_input.register_advance(),
                            StatusOverlayView::Overflow => panel_input.register_retry(),
                        }
                    }
                }

                let render_duration = render_start.elapsed();
                if let Some((per_second, trailing)) = fps_counter.record_frame(frame_dt) {
                    if show_fps {
                        println!(
                            "FPS: {:.2} (10s avg: {:.2}) | render: {:>6.2}ms",
                            per_second,
                            trailing,
                            render_duration.as_secs_f64() * 1_000.0,
                        );
                    }
                }

                macroquad::window::next_frame().await;
            }
        });

        Ok(())
    }
}

/// Fixed screen region occupied by the guide panel.
fn guide_panel_rect(scene: &Scene) -> PanelRect {
    let source_rows = scene.panel.sources.len() as f32;
    PanelRect {
        origin: Vec2::new(16.0, 16.0),
        size: Vec2::new(300.0, 240.0 + source_rows * 34.0),
    }
}

/// Fixed screen region occupied by the chaos meter.
fn meter_rect(screen_width: f32) -> PanelRect {
    PanelRect {
        origin: Vec2::new(screen_width - 16.0 - 260.0, 16.0),
        size: Vec2::new(260.0, 86.0),
    }
}

fn gather_frame_input(
    scene: &Scene,
    panel_input: &mut PanelInputState,
    blocked_regions: &[PanelRect],
) -> FrameInput {
    let (cursor_x, cursor_y) = mouse_position();
    let cursor = Vec2::new(cursor_x, cursor_y);

    let mut input = FrameInput {
        canvas: Vec2::new(
            macroquad::window::screen_width(),
            macroquad::window::screen_height(),
        ),
        cursor: Some(cursor),
        spawn_request: panel_input.take_spawn(),
        retry: panel_input.take_retry(),
        advance: panel_input.take_advance(),
        ..FrameInput::default()
    };

    // The panel, the meter, and the terminal overlay sit on top of the
    // canvas; pointer presses there must not reach the graph.
    let overlay_blocks = scene.overlay.is_some();
    let pointer_blocked =
        overlay_blocks || blocked_regions.iter().any(|region| region.contains(cursor));

    if !pointer_blocked {
        input.pressed = is_mouse_button_pressed(MouseButton::Left)
            || is_mouse_button_pressed(MouseButton::Right);
        input.connect_modifier = is_key_down(KeyCode::LeftShift)
            || is_key_down(KeyCode::RightShift)
            || is_mouse_button_down(MouseButton::Right);
    }
    // Releases always pass through so an in-flight gesture can complete even
    // when the pointer ends on a blocked region.
    input.released = is_mouse_button_released(MouseButton::Left)
        || is_mouse_button_released(MouseButton::Right);

    input
}

fn draw_grid(scene: &Scene, screen_width: f32, screen_height: f32) {
    let cell = scene.grid.cell_length;
    if cell <= f32::EPSILON {
        return;
    }
    let color = to_macroquad_color(scene.grid.line_color);

    let mut x = 0.0;
    while x < screen_width {
        macroquad::shapes::draw_line(x, 0.0, x, screen_height, 1.0, color);
        x += cell;
    }
    let mut y = 0.0;
    while y < screen_height {
        macroquad::shapes::draw_line(0.0, y, screen_width, y, 1.0, color);
        y += cell;
    }
}

fn draw_connection(connection: &SceneConnection) {
    let stroke = to_macroquad_color(palette::join_stroke(connection.join_type));
    let dashed = palette::join_dashed(connection.join_type);

    let mut previous = connection.point_at(0.0);
    for segment in 1..=CURVE_SEGMENTS {
        let t = segment as f32 / CURVE_SEGMENTS as f32;
        let next = connection.point_at(t);
        // Dashed strokes drop every other flattened segment.
        if !dashed || segment % 2 == 1 {
            macroquad::shapes::draw_line(
                previous.x,
                previous.y,
                next.x,
                next.y,
                CONNECTION_STROKE,
                stroke,
            );
        }
        previous = next;
    }

    draw_join_chip(connection, stroke);
}

fn draw_join_chip(connection: &SceneConnection, stroke: macroquad::color::Color) {
    let label = connection.join_type.label();
    let control = connection.control();
    let font_size = 12u16;
    let dimensions = macroquad::text::measure_text(label, None, font_size, 1.0);

    macroquad::shapes::draw_rectangle(
        control.x - dimensions.width * 0.5 - 4.0,
        control.y - 20.0,
        dimensions.width + 8.0,
        16.0,
        to_macroquad_color(palette::CHIP_BACKGROUND),
    );
    macroquad::text::draw_text(
        label,
        control.x - dimensions.width * 0.5,
        control.y - 8.0,
        font_size as f32,
        stroke,
    );
}

fn draw_dashed_line(from: Vec2, to: Vec2, thickness: f32, color: macroquad::color::Color) {
    let delta = to - from;
    let length = delta.length();
    if length <= f32::EPSILON {
        return;
    }
    let direction = delta / length;

    let mut travelled = 0.0;
    while travelled < length {
        let dash_end = (travelled + DASH_LENGTH).min(length);
        let start = from + direction * travelled;
        let end = from + direction * dash_end;
        macroquad::shapes::draw_line(start.x, start.y, end.x, end.y, thickness, color);
        travelled += DASH_LENGTH * 2.0;
    }
}

fn draw_particle(particle: &SceneParticle) {
    let halo = to_macroquad_color(particle.color.with_alpha(0.35));
    let core = to_macroquad_color(particle.color);
    macroquad::shapes::draw_circle(
        particle.position.x,
        particle.position.y,
        PARTICLE_RADIUS * 1.8,
        halo,
    );
    macroquad::shapes::draw_circle(particle.position.x, particle.position.y, PARTICLE_RADIUS, core);
}

fn draw_node(node: &SceneNode, pulse: f32) {
    let center = node.position;

    // Layered translucent circles stand in for the canvas radial gradient.
    let glow_radius = node.radius * 2.0 + pulse;
    for layer in 0..GLOW_LAYERS {
        let t = layer as f32 / GLOW_LAYERS as f32;
        let radius = glow_radius - (glow_radius - node.radius * 0.5) * t;
        let alpha = 0.05 + 0.04 * t;
        macroquad::shapes::draw_circle(
            center.x,
            center.y,
            radius,
            to_macroquad_color(node.color.with_alpha(alpha)),
        );
    }

    macroquad::shapes::draw_circle(
        center.x,
        center.y,
        node.radius,
        to_macroquad_color(palette::NODE_CORE),
    );
    macroquad::shapes::draw_circle_lines(
        center.x,
        center.y,
        node.radius,
        2.0,
        to_macroquad_color(node.color),
    );
    macroquad::shapes::draw_circle_lines(
        center.x,
        center.y,
        node.radius * 0.8,
        1.0,
        to_macroquad_color(node.color.with_alpha(0.33)),
    );
    if node.hovered {
        macroquad::shapes::draw_circle_lines(
            center.x,
            center.y,
            node.radius + 4.0,
            1.0,
            to_macroquad_color(Color::new(1.0, 1.0, 1.0, 0.6)),
        );
    }

    let font_size = 14u16;
    let dimensions = macroquad::text::measure_text(&node.label, None, font_size, 1.0);
    macroquad::text::draw_text(
        &node.label,
        center.x - dimensions.width * 0.5,
        center.y + dimensions.height * 0.5,
        font_size as f32,
        to_macroquad_color(palette::NODE_LABEL),
    );
}

fn draw_meter(scene: &Scene, rect: PanelRect) {
    let meter = scene.meter;
    let origin = rect.origin;
    let size = rect.size;

    macroquad::shapes::draw_rectangle(
        origin.x,
        origin.y,
        size.x,
        size.y,
        to_macroquad_color(Color::new(0.06, 0.09, 0.16, 0.9)),
    );

    macroquad::text::draw_text(
        "DATA STABILITY",
        origin.x + 12.0,
        origin.y + 24.0,
        14.0,
        to_macroquad_color(Color::from_rgb_u8(0x94, 0xa3, 0xb8)),
    );

    let band_color = match meter.band() {
        StabilityBand::Stable => Color::from_rgb_u8(0x10, 0xb9, 0x81),
        StabilityBand::Unstable => Color::from_rgb_u8(0xea, 0xb3, 0x08),
        StabilityBand::Critical => Color::from_rgb_u8(0xef, 0x44, 0x44),
    };
    let status = meter.status_text();
    let status_dimensions = macroquad::text::measure_text(status, None, 14, 1.0);
    macroquad::text::draw_text(
        status,
        origin.x + size.x - 12.0 - status_dimensions.width,
        origin.y + 24.0,
        14.0,
        to_macroquad_color(band_color),
    );

    let bar_origin = Vec2::new(origin.x + 12.0, origin.y + 36.0);
    let bar_width = size.x - 24.0;
    macroquad::shapes::draw_rectangle(
        bar_origin.x,
        bar_origin.y,
        bar_width,
        8.0,
        to_macroquad_color(Color::from_rgb_u8(0x1e, 0x29, 0x3b)),
    );
    macroquad::shapes::draw_rectangle(
        bar_origin.x,
        bar_origin.y,
        bar_width * meter.fraction(),
        8.0,
        to_macroquad_color(band_color),
    );

    if meter.chaos > 0.0 {
        macroquad::text::draw_text(
            "Warning: Incorrect JOIN logic detected.",
            origin.x + 12.0,
            origin.y + 66.0,
            12.0,
            to_macroquad_color(Color::from_rgb_u8(0xf8, 0x71, 0x71)),
        );
    }
}

fn draw_overlay_backdrop(overlay: StatusOverlayView, screen_width: f32, screen_height: f32) {
    let backdrop = match overlay {
        StatusOverlayView::Won => Color::new(0.0, 0.0, 0.0, 0.6),
        StatusOverlayView::Overflow => Color::new(0.5, 0.11, 0.11, 0.35),
    };
    macroquad::shapes::draw_rectangle(
        0.0,
        0.0,
        screen_width,
        screen_height,
        to_macroquad_color(backdrop),
    );
}

pub(crate) fn to_macroquad_color(color: Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}
