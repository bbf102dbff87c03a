#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pointer gesture system that translates canvas input into graph commands.
//!
//! The system owns a small state machine chosen at press time: a plain press
//! on a node starts a drag, a modified press starts a connect gesture, and a
//! press near a connection's label chip cycles its join type before any node
//! hit testing runs. All graph mutations leave through command batches; the
//! system never touches the world directly.

use std::mem;

use join_circuit_core::{
    Command, ConnectionView, Event, GameStatus, Position, TableId, TableSnapshot, TableView,
};

/// Extra hit-test tolerance added to a node's radius, in canvas units.
const NODE_HIT_TOLERANCE: f32 = 10.0;

/// Hit-test radius of the join-type chip at a connection's control point.
const CHIP_HIT_RADIUS: f32 = 25.0;

/// Per-frame pointer snapshot gathered by the rendering adapter.
///
/// `pressed` and `released` are edge flags for this frame; `position` is
/// already mapped into canvas-local space.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct PointerInput {
    /// Pointer position, if the pointer is over the canvas.
    pub position: Option<Position>,
    /// Whether the primary press started on this frame.
    pub pressed: bool,
    /// Whether the press ended on this frame.
    pub released: bool,
    /// Whether the connect modifier (shift or secondary button) was active
    /// at press time.
    pub connect_modifier: bool,
}

/// Gesture state chosen at press time; the modes are mutually exclusive.
#[derive(Clone, Debug, PartialEq)]
pub enum GestureMode {
    /// No gesture in progress.
    Idle,
    /// A node follows the pointer, offset by the recorded grab point.
    Dragging {
        /// Node being dragged.
        table: TableId,
        /// Pointer-to-center offset recorded at press time.
        grab_offset: (f32, f32),
    },
    /// A connection preview tracks the pointer from its source node.
    Connecting {
        /// Node the gesture started from.
        source: TableId,
        /// Live pointer position used as the preview endpoint.
        cursor: Position,
    },
}

/// Pointer affordance the adapter should present for the current state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CursorFeedback {
    /// Nothing interactive under the pointer.
    Default,
    /// A node is under the pointer and can be grabbed.
    Grab,
    /// A drag is in progress.
    Grabbing,
}

/// Dashed preview line drawn while a connect gesture is live.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConnectPreview {
    /// Center of the source node.
    pub from: Position,
    /// Live pointer position.
    pub cursor: Position,
}

/// Pointer gesture system that reacts to per-frame input snapshots.
#[derive(Debug)]
pub struct Interaction {
    mode: GestureMode,
    hovered: Option<TableId>,
    status: GameStatus,
}

impl Interaction {
    /// Creates a new gesture system in the idle state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            mode: GestureMode::Idle,
            hovered: None,
            status: GameStatus::Playing,
        }
    }

    /// Consumes world events and a pointer snapshot to emit graph commands.
    ///
    /// Gesture starts require an active session, but a gesture that is
    /// already in flight when the session ends keeps running: the drag keeps
    /// emitting `MoveTable` and the connect release still attempts its
    /// `Connect`.
    pub fn handle(
        &mut self,
        events: &[Event],
        input: PointerInput,
        tables: &TableView,
        connections: &ConnectionView,
        out: &mut Vec<Command>,
    ) {
        for event in events {
            match event {
                Event::StatusChanged { status } => self.status = *status,
                Event::LevelLoaded { .. } => {
                    self.status = GameStatus::Playing;
                    self.mode = GestureMode::Idle;
                    self.hovered = None;
                }
                _ => {}
            }
        }

        let Some(position) = input.position else {
            if input.released {
                self.mode = GestureMode::Idle;
            }
            self.hovered = None;
            return;
        };

        self.hovered = hover_target(tables, position).map(|node| node.id.clone());

        if input.pressed {
            self.on_press(position, input.connect_modifier, tables, connections, out);
        } else if !input.released {
            self.on_move(position, out);
        }

        if input.released {
            self.on_release(position, tables, connections, out);
        }
    }

    /// Current gesture state.
    #[must_use]
    pub fn mode(&self) -> &GestureMode {
        &self.mode
    }

    /// Node currently under the pointer, if any.
    #[must_use]
    pub fn hovered(&self) -> Option<&TableId> {
        self.hovered.as_ref()
    }

    /// Pointer affordance for the current state.
    #[must_use]
    pub fn cursor_feedback(&self) -> CursorFeedback {
        match &self.mode {
            GestureMode::Dragging { .. } => CursorFeedback::Grabbing,
            _ if self.hovered.is_some() => CursorFeedback::Grab,
            _ => CursorFeedback::Default,
        }
    }

    /// Preview line endpoints while a connect gesture is live.
    #[must_use]
    pub fn connect_preview(&self, tables: &TableView) -> Option<ConnectPreview> {
        let GestureMode::Connecting { source, cursor } = &self.mode else {
            return None;
        };
        let node = tables.get(source)?;
        Some(ConnectPreview {
            from: node.position,
            cursor: *cursor,
        })
    }

    fn on_press(
        &mut self,
        position: Position,
        connect_modifier: bool,
        tables: &TableView,
        connections: &ConnectionView,
        out: &mut Vec<Command>,
    ) {
        if self.status != GameStatus::Playing {
            return;
        }

        // Chip hit testing runs first and short-circuits everything else.
        for connection in connections.iter() {
            let Some(source) = tables.get(&connection.source) else {
                continue;
            };
            let Some(target) = tables.get(&connection.target) else {
                continue;
            };
            let chip = Position::curve_control(source.position, target.position);
            if position.distance_to(chip) < CHIP_HIT_RADIUS {
                out.push(Command::CycleJoin {
                    connection: connection.id,
                });
                return;
            }
        }

        let Some(node) = grab_target(tables, position) else {
            return;
        };

        self.mode = if connect_modifier {
            GestureMode::Connecting {
                source: node.id.clone(),
                cursor: position,
            }
        } else {
            GestureMode::Dragging {
                table: node.id.clone(),
                grab_offset: (
                    position.x() - node.position.x(),
                    position.y() - node.position.y(),
                ),
            }
        };
    }

    fn on_move(&mut self, position: Position, out: &mut Vec<Command>) {
        match &mut self.mode {
            GestureMode::Dragging { table, grab_offset } => {
                out.push(Command::MoveTable {
                    id: table.clone(),
                    position: position.offset_by(-grab_offset.0, -grab_offset.1),
                });
            }
            GestureMode::Connecting { cursor, .. } => *cursor = position,
            GestureMode::Idle => {}
        }
    }

    fn on_release(
        &mut self,
        position: Position,
        tables: &TableView,
        connections: &ConnectionView,
        out: &mut Vec<Command>,
    ) {
        match mem::replace(&mut self.mode, GestureMode::Idle) {
            GestureMode::Connecting { source, .. } => {
                let Some(target) = grab_target(tables, position) else {
                    return;
                };
                if target.id == source {
                    return;
                }
                if connections
                    .iter()
                    .any(|connection| connection.links_pair(&source, &target.id))
                {
                    return;
                }
                out.push(Command::Connect {
                    source,
                    target: target.id.clone(),
                });
            }
            GestureMode::Dragging { .. } | GestureMode::Idle => {}
        }
    }
}

impl Default for Interaction {
    fn default() -> Self {
        Self::new()
    }
}

/// Topmost node within grab distance of the pointer.
///
/// Placement order doubles as draw order, so the last matching snapshot is
/// the one rendered on top.
fn grab_target(tables: &TableView, position: Position) -> Option<&TableSnapshot> {
    tables
        .iter()
        .filter(|node| position.distance_to(node.position) < node.radius + NODE_HIT_TOLERANCE)
        .last()
}

/// Node under the pointer for hover feedback; no grab tolerance here.
fn hover_target(tables: &TableView, position: Position) -> Option<&TableSnapshot> {
    tables
        .iter()
        .filter(|node| position.distance_to(node.position) < node.radius)
        .last()
}

#[cfg(test)]
mod tests {
    use super::*;
    use join_circuit_core::{ConnectionId, ConnectionSnapshot, JoinType, NodeColor};

    const RADIUS: f32 = 40.0;

    fn node(id: &str, x: f32, y: f32) -> TableSnapshot {
        TableSnapshot {
            id: TableId::new(id),
            label: id.to_uppercase(),
            color: NodeColor::from_rgb(0x0e, 0xa5, 0xe9),
            position: Position::new(x, y),
            radius: RADIUS,
        }
    }

    fn tables(snapshots: Vec<TableSnapshot>) -> TableView {
        TableView::from_snapshots(snapshots)
    }

    fn connection(id: u32, source: &str, target: &str) -> ConnectionSnapshot {
        ConnectionSnapshot {
            id: ConnectionId::new(id),
            source: TableId::new(source),
            target: TableId::new(target),
            join_type: JoinType::Inner,
        }
    }

    fn press_at(x: f32, y: f32) -> PointerInput {
        PointerInput {
            position: Some(Position::new(x, y)),
            pressed: true,
            ..PointerInput::default()
        }
    }

    fn connect_press_at(x: f32, y: f32) -> PointerInput {
        PointerInput {
            connect_modifier: true,
            ..press_at(x, y)
        }
    }

    fn move_to(x: f32, y: f32) -> PointerInput {
        PointerInput {
            position: Some(Position::new(x, y)),
            ..PointerInput::default()
        }
    }

    fn release_at(x: f32, y: f32) -> PointerInput {
        PointerInput {
            position: Some(Position::new(x, y)),
            released: true,
            ..PointerInput::default()
        }
    }

    #[test]
    fn chip_press_cycles_join_and_short_circuits_node_hits() {
        let tables = tables(vec![node("users", 100.0, 150.0), node("orders", 200.0, 150.0)]);
        let connections =
            ConnectionView::from_snapshots(vec![connection(7, "users", "orders")]);
        let mut interaction = Interaction::new();
        let mut out = Vec::new();

        // The chip sits at (150, 100), lifted above the segment midpoint.
        interaction.handle(&[], press_at(145.0, 105.0), &tables, &connections, &mut out);

        assert_eq!(
            out,
            vec![Command::CycleJoin {
                connection: ConnectionId::new(7),
            }]
        );
        assert_eq!(interaction.mode(), &GestureMode::Idle);
    }

    #[test]
    fn plain_press_starts_drag_and_moves_with_recorded_offset() {
        let tables = tables(vec![node("users", 100.0, 100.0)]);
        let connections = ConnectionView::default();
        let mut interaction = Interaction::new();
        let mut out = Vec::new();

        interaction.handle(&[], press_at(110.0, 95.0), &tables, &connections, &mut out);
        assert!(out.is_empty());
        assert_eq!(
            interaction.mode(),
            &GestureMode::Dragging {
                table: TableId::new("users"),
                grab_offset: (10.0, -5.0),
            }
        );
        assert_eq!(interaction.cursor_feedback(), CursorFeedback::Grabbing);

        interaction.handle(&[], move_to(200.0, 200.0), &tables, &connections, &mut out);
        assert_eq!(
            out,
            vec![Command::MoveTable {
                id: TableId::new("users"),
                position: Position::new(190.0, 205.0),
            }]
        );

        out.clear();
        interaction.handle(&[], release_at(200.0, 200.0), &tables, &connections, &mut out);
        assert!(out.is_empty());
        assert_eq!(interaction.mode(), &GestureMode::Idle);
    }

    #[test]
    fn modifier_press_connects_to_a_distinct_target() {
        let tables = tables(vec![node("users", 100.0, 100.0), node("orders", 400.0, 100.0)]);
        let connections = ConnectionView::default();
        let mut interaction = Interaction::new();
        let mut out = Vec::new();

        interaction.handle(&[], connect_press_at(100.0, 100.0), &tables, &connections, &mut out);
        assert!(matches!(interaction.mode(), GestureMode::Connecting { .. }));

        interaction.handle(&[], move_to(250.0, 120.0), &tables, &connections, &mut out);
        let preview = interaction
            .connect_preview(&tables)
            .expect("live connect gesture has a preview");
        assert_eq!(preview.from, Position::new(100.0, 100.0));
        assert_eq!(preview.cursor, Position::new(250.0, 120.0));

        interaction.handle(&[], release_at(405.0, 95.0), &tables, &connections, &mut out);
        assert_eq!(
            out,
            vec![Command::Connect {
                source: TableId::new("users"),
                target: TableId::new("orders"),
            }]
        );
        assert_eq!(interaction.mode(), &GestureMode::Idle);
    }

    #[test]
    fn connect_release_over_empty_space_is_a_no_op() {
        let tables = tables(vec![node("users", 100.0, 100.0)]);
        let connections = ConnectionView::default();
        let mut interaction = Interaction::new();
        let mut out = Vec::new();

        interaction.handle(&[], connect_press_at(100.0, 100.0), &tables, &connections, &mut out);
        interaction.handle(&[], release_at(600.0, 600.0), &tables, &connections, &mut out);

        assert!(out.is_empty());
        assert_eq!(interaction.mode(), &GestureMode::Idle);
    }

    #[test]
    fn connect_release_on_source_node_is_a_no_op() {
        let tables = tables(vec![node("users", 100.0, 100.0)]);
        let connections = ConnectionView::default();
        let mut interaction = Interaction::new();
        let mut out = Vec::new();

        interaction.handle(&[], connect_press_at(100.0, 100.0), &tables, &connections, &mut out);
        interaction.handle(&[], release_at(105.0, 102.0), &tables, &connections, &mut out);

        assert!(out.is_empty());
    }

    #[test]
    fn connect_release_skips_already_linked_pairs() {
        let tables = tables(vec![node("users", 100.0, 100.0), node("orders", 400.0, 100.0)]);
        let connections =
            ConnectionView::from_snapshots(vec![connection(0, "orders", "users")]);
        let mut interaction = Interaction::new();
        let mut out = Vec::new();

        interaction.handle(&[], connect_press_at(100.0, 100.0), &tables, &connections, &mut out);
        interaction.handle(&[], release_at(400.0, 100.0), &tables, &connections, &mut out);

        assert!(out.is_empty(), "reversed duplicate must not reconnect");
    }

    #[test]
    fn press_resolves_overlap_in_favor_of_topmost_node() {
        let tables = tables(vec![node("users", 100.0, 100.0), node("orders", 120.0, 100.0)]);
        let connections = ConnectionView::default();
        let mut interaction = Interaction::new();
        let mut out = Vec::new();

        interaction.handle(&[], press_at(110.0, 100.0), &tables, &connections, &mut out);

        assert!(matches!(
            interaction.mode(),
            GestureMode::Dragging { table, .. } if table == &TableId::new("orders")
        ));
    }

    #[test]
    fn press_on_empty_space_leaves_the_system_idle() {
        let tables = tables(vec![node("users", 100.0, 100.0)]);
        let connections = ConnectionView::default();
        let mut interaction = Interaction::new();
        let mut out = Vec::new();

        interaction.handle(&[], press_at(500.0, 500.0), &tables, &connections, &mut out);

        assert!(out.is_empty());
        assert_eq!(interaction.mode(), &GestureMode::Idle);
    }

    #[test]
    fn gesture_starts_are_gated_after_terminal_status() {
        let tables = tables(vec![node("users", 100.0, 100.0)]);
        let connections = ConnectionView::default();
        let mut interaction = Interaction::new();
        let mut out = Vec::new();

        interaction.handle(
            &[Event::StatusChanged {
                status: GameStatus::Overflow,
            }],
            press_at(100.0, 100.0),
            &tables,
            &connections,
            &mut out,
        );

        assert!(out.is_empty());
        assert_eq!(interaction.mode(), &GestureMode::Idle);
    }

    #[test]
    fn in_flight_drag_survives_terminal_transition() {
        let tables = tables(vec![node("users", 100.0, 100.0)]);
        let connections = ConnectionView::default();
        let mut interaction = Interaction::new();
        let mut out = Vec::new();

        interaction.handle(&[], press_at(100.0, 100.0), &tables, &connections, &mut out);
        interaction.handle(
            &[Event::StatusChanged {
                status: GameStatus::Won,
            }],
            move_to(180.0, 140.0),
            &tables,
            &connections,
            &mut out,
        );

        assert_eq!(
            out,
            vec![Command::MoveTable {
                id: TableId::new("users"),
                position: Position::new(180.0, 140.0),
            }]
        );
    }

    #[test]
    fn hover_uses_the_exact_radius_without_grab_tolerance() {
        let tables = tables(vec![node("users", 100.0, 100.0)]);
        let connections = ConnectionView::default();
        let mut interaction = Interaction::new();
        let mut out = Vec::new();

        interaction.handle(&[], move_to(100.0, 100.0 + RADIUS - 1.0), &tables, &connections, &mut out);
        assert_eq!(interaction.hovered(), Some(&TableId::new("users")));
        assert_eq!(interaction.cursor_feedback(), CursorFeedback::Grab);

        interaction.handle(&[], move_to(100.0, 100.0 + RADIUS + 5.0), &tables, &connections, &mut out);
        assert_eq!(interaction.hovered(), None);
        assert_eq!(interaction.cursor_feedback(), CursorFeedback::Default);
    }

    #[test]
    fn level_reset_clears_a_live_gesture() {
        let tables = tables(vec![node("users", 100.0, 100.0)]);
        let connections = ConnectionView::default();
        let mut interaction = Interaction::new();
        let mut out = Vec::new();

        interaction.handle(&[], connect_press_at(100.0, 100.0), &tables, &connections, &mut out);
        interaction.handle(
            &[Event::LevelLoaded { level_index: 1 }],
            move_to(150.0, 150.0),
            &TableView::default(),
            &ConnectionView::default(),
            &mut out,
        );

        assert!(out.is_empty());
        assert_eq!(interaction.mode(), &GestureMode::Idle);
    }
}
