#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Join Circuit adapters.
//!
//! Backends consume a [`Presentation`] plus a per-frame scene-update closure
//! and stay agnostic of the simulation: everything they draw arrives as plain
//! descriptor structs populated by the session controller.

use anyhow::Result as AnyResult;
use glam::Vec2;
use join_circuit_core::{ConnectionId, GameStatus, JoinType, NodeColor, TableId, CURVE_LIFT};
use std::{error::Error, fmt, time::Duration};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns the same color with the provided alpha channel.
    #[must_use]
    pub const fn with_alpha(self, alpha: f32) -> Self {
        Self {
            red: self.red,
            green: self.green,
            blue: self.blue,
            alpha,
        }
    }
}

impl From<NodeColor> for Color {
    fn from(color: NodeColor) -> Self {
        Self::from_rgb_u8(color.red(), color.green(), color.blue())
    }
}

/// Fixed palette shared by every backend.
pub mod palette {
    use super::Color;
    use join_circuit_core::JoinType;

    /// Solid color used to clear each frame.
    pub const BACKGROUND: Color = Color::from_rgb_u8(0x0f, 0x17, 0x2a);

    /// Subtle line color of the background grid.
    pub const GRID_LINE: Color = Color::new(30.0 / 255.0, 41.0 / 255.0, 59.0 / 255.0, 0.5);

    /// Dark fill of a node's core circle.
    pub const NODE_CORE: Color = Color::from_rgb_u8(0x0f, 0x17, 0x2a);

    /// Text color of node labels.
    pub const NODE_LABEL: Color = Color::from_rgb_u8(0xff, 0xff, 0xff);

    /// Background chip behind a connection's join label.
    pub const CHIP_BACKGROUND: Color = Color::new(15.0 / 255.0, 23.0 / 255.0, 42.0 / 255.0, 0.8);

    /// Dashed preview line drawn during a connect gesture.
    pub const PREVIEW_LINE: Color = Color::new(1.0, 1.0, 1.0, 0.5);

    /// Particle color for good-flow emissions.
    pub const PARTICLE_GOOD: Color = Color::from_rgb_u8(0x4a, 0xde, 0x80);

    /// Particle color for bad-flow emissions.
    pub const PARTICLE_BAD: Color = Color::from_rgb_u8(0xef, 0x44, 0x44);

    /// Stroke color keyed by a connection's join type.
    #[must_use]
    pub const fn join_stroke(join_type: JoinType) -> Color {
        match join_type {
            JoinType::Inner => Color::from_rgb_u8(0xff, 0xff, 0xff),
            JoinType::Left => Color::from_rgb_u8(0xa8, 0x55, 0xf7),
            JoinType::Right => Color::from_rgb_u8(0xec, 0x48, 0x99),
            JoinType::Full => Color::from_rgb_u8(0xef, 0x44, 0x44),
        }
    }

    /// Reports whether the join type is stroked with a dashed line.
    #[must_use]
    pub const fn join_dashed(join_type: JoinType) -> bool {
        matches!(join_type, JoinType::Left | JoinType::Right)
    }
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct FrameInput {
    /// Canvas dimensions in canvas units, used to center spawned nodes.
    pub canvas: Vec2,
    /// Pointer position in canvas-local space, if over the canvas.
    pub cursor: Option<Vec2>,
    /// Whether the primary press started on this frame.
    pub pressed: bool,
    /// Whether the press ended on this frame.
    pub released: bool,
    /// Whether the connect modifier (shift or secondary button) is held.
    pub connect_modifier: bool,
    /// Panel request to spawn the named table source.
    pub spawn_request: Option<TableId>,
    /// Overlay request to reset the current level.
    pub retry: bool,
    /// Overlay request to advance to the next level.
    pub advance: bool,
}

/// Describes the fixed background grid drawn behind the graph.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridPresentation {
    /// Side length of a square grid cell in canvas units.
    pub cell_length: f32,
    /// Color used when drawing grid lines.
    pub line_color: Color,
}

impl GridPresentation {
    /// Default cell size of the background grid.
    pub const DEFAULT_CELL_LENGTH: f32 = 40.0;

    /// Creates a new grid descriptor.
    ///
    /// Returns an error when `cell_length` is not positive.
    pub fn new(cell_length: f32, line_color: Color) -> Result<Self, RenderingError> {
        if cell_length <= 0.0 {
            return Err(RenderingError::InvalidCellLength { cell_length });
        }
        Ok(Self {
            cell_length,
            line_color,
        })
    }
}

impl Default for GridPresentation {
    fn default() -> Self {
        Self {
            cell_length: Self::DEFAULT_CELL_LENGTH,
            line_color: palette::GRID_LINE,
        }
    }
}

/// Table node rendered as a glowing orb with a centered label.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneNode {
    /// Catalog identifier of the node.
    pub id: TableId,
    /// Label drawn at the node's center.
    pub label: String,
    /// Accent color of the glow and rings.
    pub color: Color,
    /// Center of the node in canvas units.
    pub position: Vec2,
    /// Radius of the core circle in canvas units.
    pub radius: f32,
    /// Whether the pointer currently rests on the node.
    pub hovered: bool,
}

/// Connection rendered as a quadratic curve with a join-type chip.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneConnection {
    /// Identifier of the underlying connection.
    pub id: ConnectionId,
    /// Center of the source node.
    pub from: Vec2,
    /// Center of the target node.
    pub to: Vec2,
    /// Join semantics selecting stroke color, dash pattern, and chip text.
    pub join_type: JoinType,
}

impl SceneConnection {
    /// Control point of the curve, lifted above the straight midpoint.
    ///
    /// The join-type chip is centered here as well.
    #[must_use]
    pub fn control(&self) -> Vec2 {
        Vec2::new(
            (self.from.x + self.to.x) * 0.5,
            (self.from.y + self.to.y) * 0.5 - CURVE_LIFT,
        )
    }

    /// Point along the curve at parameter `t` in `0.0..=1.0`.
    #[must_use]
    pub fn point_at(&self, t: f32) -> Vec2 {
        let control = self.control();
        let u = 1.0 - t;
        u * u * self.from + 2.0 * u * t * control + t * t * self.to
    }
}

/// Glowing dot travelling along a connection's curve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneParticle {
    /// Current canvas position of the particle.
    pub position: Vec2,
    /// Fill and glow color chosen from its flow verdict.
    pub color: Color,
}

/// Dashed line from a connect gesture's source to the live pointer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PreviewLine {
    /// Center of the source node.
    pub from: Vec2,
    /// Live pointer position.
    pub to: Vec2,
}

/// Spawn button presented for one of the level's table sources.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceButton {
    /// Catalog identifier submitted when the button is pressed.
    pub id: TableId,
    /// Label shown on the button.
    pub label: String,
    /// Accent dot color matching the node the button spawns.
    pub color: Color,
    /// Whether the source is already placed, disabling the button.
    pub placed: bool,
}

/// Guide panel describing the active level and its data sources.
#[derive(Clone, Debug, PartialEq)]
pub struct GuidePanelView {
    /// Level number shown next to the title.
    pub level_number: u32,
    /// Level title.
    pub title: String,
    /// Teaching text describing the target query.
    pub description: String,
    /// Spawn buttons for the level's table sources.
    pub sources: Vec<SourceButton>,
}

/// Stability meter bands derived from the chaos score.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StabilityBand {
    /// Chaos below 50.
    Stable,
    /// Chaos in `50.0..80.0`.
    Unstable,
    /// Chaos at or above 80.
    Critical,
}

/// Chaos meter shown while the session runs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChaosMeterView {
    /// Chaos score in `0.0..=100.0`.
    pub chaos: f32,
}

impl ChaosMeterView {
    /// Filled fraction of the meter bar.
    #[must_use]
    pub fn fraction(&self) -> f32 {
        (self.chaos / 100.0).clamp(0.0, 1.0)
    }

    /// Band used to pick the meter's accent color and status text.
    #[must_use]
    pub fn band(&self) -> StabilityBand {
        if self.chaos >= 80.0 {
            StabilityBand::Critical
        } else if self.chaos >= 50.0 {
            StabilityBand::Unstable
        } else {
            StabilityBand::Stable
        }
    }

    /// Status text shown next to the meter label.
    #[must_use]
    pub fn status_text(&self) -> &'static str {
        match self.band() {
            StabilityBand::Stable => "STABLE",
            StabilityBand::Unstable => "UNSTABLE",
            StabilityBand::Critical => "CRITICAL",
        }
    }
}

/// Full-screen overlay shown once the session reaches a terminal status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusOverlayView {
    /// The level was solved; offers advancing to the next level.
    Won,
    /// Chaos overflowed; offers retrying the level.
    Overflow,
}

impl StatusOverlayView {
    /// Builds the overlay for a terminal status, if the status is terminal.
    #[must_use]
    pub fn for_status(status: GameStatus) -> Option<Self> {
        match status {
            GameStatus::Won => Some(Self::Won),
            GameStatus::Overflow => Some(Self::Overflow),
            GameStatus::Playing => None,
        }
    }

    /// Headline shown at the top of the overlay.
    #[must_use]
    pub const fn headline(self) -> &'static str {
        match self {
            Self::Won => "Query Optimized!",
            Self::Overflow => "Data Overflow!",
        }
    }

    /// Body text explaining the outcome.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Won => "The data is flowing perfectly. Excellent work architect.",
            Self::Overflow => {
                "Your join logic created an infinite loop or Cartesian explosion. \
                 The system crashed."
            }
        }
    }

    /// Label of the overlay's action button.
    #[must_use]
    pub const fn action_label(self) -> &'static str {
        match self {
            Self::Won => "Next Level",
            Self::Overflow => "Reset System",
        }
    }
}

/// Scene description rendered once per frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Background grid drawn behind everything else.
    pub grid: GridPresentation,
    /// Live connections with their join styling.
    pub connections: Vec<SceneConnection>,
    /// Preview line while a connect gesture is in progress.
    pub preview: Option<PreviewLine>,
    /// Particles travelling along connections.
    pub particles: Vec<SceneParticle>,
    /// Placed table nodes, in draw order (last on top).
    pub nodes: Vec<SceneNode>,
    /// Guide panel content for the active level.
    pub panel: GuidePanelView,
    /// Chaos meter state.
    pub meter: ChaosMeterView,
    /// Terminal overlay, present only after win or overflow.
    pub overlay: Option<StatusOverlayView>,
    /// Simulation clock driving the node glow pulse.
    pub pulse_clock: Duration,
}

impl Scene {
    /// Creates an empty scene for the provided level panel.
    #[must_use]
    pub fn new(panel: GuidePanelView) -> Self {
        Self {
            grid: GridPresentation::default(),
            connections: Vec::new(),
            preview: None,
            particles: Vec::new(),
            nodes: Vec::new(),
            panel,
            meter: ChaosMeterView { chaos: 0.0 },
            overlay: None,
            pulse_clock: Duration::ZERO,
        }
    }

    /// Glow pulse amplitude in canvas units for the current clock.
    #[must_use]
    pub fn pulse_amplitude(&self) -> f32 {
        (self.pulse_clock.as_secs_f32() * 1_000.0 / 200.0).sin() * 5.0
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Rendering backend capable of presenting Join Circuit scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the frame delta and the
    /// input captured by the adapter, and may mutate the scene before it is
    /// rendered. The backend must release its frame loop when the player
    /// requests to quit.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq)]
pub enum RenderingError {
    /// Grid cells must have positive area.
    InvalidCellLength {
        /// Provided cell length that failed validation.
        cell_length: f32,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCellLength { cell_length } => {
                write!(f, "cell_length must be positive (received {cell_length})")
            }
        }
    }
}

impl Error for RenderingError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_strokes_match_the_fixed_palette() {
        assert_eq!(
            palette::join_stroke(JoinType::Inner),
            Color::from_rgb_u8(0xff, 0xff, 0xff)
        );
        assert_eq!(
            palette::join_stroke(JoinType::Left),
            Color::from_rgb_u8(0xa8, 0x55, 0xf7)
        );
        assert_eq!(
            palette::join_stroke(JoinType::Right),
            Color::from_rgb_u8(0xec, 0x48, 0x99)
        );
        assert_eq!(
            palette::join_stroke(JoinType::Full),
            Color::from_rgb_u8(0xef, 0x44, 0x44)
        );
    }

    #[test]
    fn only_directional_joins_are_dashed() {
        assert!(palette::join_dashed(JoinType::Left));
        assert!(palette::join_dashed(JoinType::Right));
        assert!(!palette::join_dashed(JoinType::Inner));
        assert!(!palette::join_dashed(JoinType::Full));
    }

    #[test]
    fn connection_control_point_is_lifted_above_the_midpoint() {
        let connection = SceneConnection {
            id: ConnectionId::new(0),
            from: Vec2::new(100.0, 300.0),
            to: Vec2::new(300.0, 300.0),
            join_type: JoinType::Inner,
        };

        assert_eq!(connection.control(), Vec2::new(200.0, 250.0));
        assert_eq!(connection.point_at(0.0), connection.from);
        assert_eq!(connection.point_at(1.0), connection.to);
    }

    #[test]
    fn grid_creation_rejects_non_positive_cells() {
        assert!(GridPresentation::new(40.0, palette::GRID_LINE).is_ok());
        assert!(matches!(
            GridPresentation::new(0.0, palette::GRID_LINE),
            Err(RenderingError::InvalidCellLength { .. })
        ));
    }

    #[test]
    fn meter_bands_follow_the_stability_thresholds() {
        assert_eq!(ChaosMeterView { chaos: 0.0 }.band(), StabilityBand::Stable);
        assert_eq!(ChaosMeterView { chaos: 49.9 }.band(), StabilityBand::Stable);
        assert_eq!(ChaosMeterView { chaos: 50.0 }.band(), StabilityBand::Unstable);
        assert_eq!(ChaosMeterView { chaos: 80.0 }.band(), StabilityBand::Critical);
        assert_eq!(ChaosMeterView { chaos: 100.0 }.fraction(), 1.0);
    }

    #[test]
    fn overlay_exists_only_for_terminal_statuses() {
        assert_eq!(StatusOverlayView::for_status(GameStatus::Playing), None);
        assert_eq!(
            StatusOverlayView::for_status(GameStatus::Won),
            Some(StatusOverlayView::Won)
        );
        assert_eq!(
            StatusOverlayView::for_status(GameStatus::Overflow),
            Some(StatusOverlayView::Overflow)
        );
        assert_eq!(StatusOverlayView::Won.action_label(), "Next Level");
    }
}
