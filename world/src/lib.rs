#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative session state management for Join Circuit.
//!
//! The world is the exclusive owner of the mutable game state: placed table
//! nodes, live connections, the chaos score, and the session status. Every
//! mutation funnels through [`apply`]; adapters and systems observe state
//! only through the read-only [`query`] module.

use std::time::Duration;

use join_circuit_core::{
    Command, ConnectError, ConnectionId, Event, GameStatus, JoinType, NodeColor, Position,
    SpawnError, TableId,
};

/// Hit-test and drawing radius assigned to every spawned node.
const NODE_RADIUS: f32 = 40.0;

const CHAOS_FLOOR: f32 = 0.0;
const CHAOS_CEILING: f32 = 100.0;

/// Represents the authoritative Join Circuit session state.
#[derive(Debug)]
pub struct World {
    level_index: usize,
    nodes: Vec<TableNode>,
    connections: Vec<Connection>,
    status: GameStatus,
    chaos: f32,
    elapsed: Duration,
    next_connection_id: u32,
}

impl World {
    /// Creates a new world holding an empty session for the first level.
    #[must_use]
    pub fn new() -> Self {
        Self {
            level_index: 0,
            nodes: Vec::new(),
            connections: Vec::new(),
            status: GameStatus::Playing,
            chaos: 0.0,
            elapsed: Duration::ZERO,
            next_connection_id: 0,
        }
    }

    fn reset(&mut self, level_index: usize) {
        self.level_index = level_index;
        self.nodes.clear();
        self.connections.clear();
        self.status = GameStatus::Playing;
        self.chaos = 0.0;
    }

    fn has_node(&self, id: &TableId) -> bool {
        self.nodes.iter().any(|node| &node.id == id)
    }

    fn node_mut(&mut self, id: &TableId) -> Option<&mut TableNode> {
        self.nodes.iter_mut().find(|node| &node.id == id)
    }

    fn connection_mut(&mut self, id: ConnectionId) -> Option<&mut Connection> {
        self.connections
            .iter_mut()
            .find(|connection| connection.id == id)
    }

    fn pair_connected(&self, a: &TableId, b: &TableId) -> bool {
        self.connections.iter().any(|connection| {
            (&connection.source == a && &connection.target == b)
                || (&connection.source == b && &connection.target == a)
        })
    }

    fn allocate_connection_id(&mut self) -> ConnectionId {
        let id = ConnectionId::new(self.next_connection_id);
        self.next_connection_id = self.next_connection_id.wrapping_add(1);
        id
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Gesture starts are gated by the interaction system, so the world accepts
/// `MoveTable`, `Connect`, and `CycleJoin` even in terminal states: a drag or
/// connect gesture that was already in flight when the session ended is
/// allowed to complete silently. `SpawnTable`, `AdjustChaos`, and
/// `FinishLevel` require an active session.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::LoadLevel { level_index } => {
            world.reset(level_index);
            out_events.push(Event::LevelLoaded { level_index });
        }
        Command::Tick { dt } => {
            world.elapsed = world.elapsed.saturating_add(dt);
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::SpawnTable {
            id,
            label,
            color,
            position,
        } => {
            if world.status.is_terminal() {
                out_events.push(Event::SpawnRejected {
                    id,
                    reason: SpawnError::LevelOver,
                });
                return;
            }
            if world.has_node(&id) {
                out_events.push(Event::SpawnRejected {
                    id,
                    reason: SpawnError::AlreadyPlaced,
                });
                return;
            }

            world.nodes.push(TableNode {
                id: id.clone(),
                label,
                color,
                position,
                radius: NODE_RADIUS,
            });
            out_events.push(Event::TableSpawned { id, position });
        }
        Command::MoveTable { id, position } => {
            if let Some(node) = world.node_mut(&id) {
                node.position = position;
                out_events.push(Event::TableMoved { id, position });
            }
        }
        Command::Connect { source, target } => {
            let reason = if source == target {
                Some(ConnectError::SelfConnection)
            } else if !world.has_node(&source) || !world.has_node(&target) {
                Some(ConnectError::UnknownTable)
            } else if world.pair_connected(&source, &target) {
                Some(ConnectError::DuplicatePair)
            } else {
                None
            };

            if let Some(reason) = reason {
                out_events.push(Event::ConnectionRejected {
                    source,
                    target,
                    reason,
                });
                return;
            }

            let id = world.allocate_connection_id();
            world.connections.push(Connection {
                id,
                source: source.clone(),
                target: target.clone(),
                join_type: JoinType::Inner,
            });
            out_events.push(Event::ConnectionCreated {
                connection: id,
                source,
                target,
                join_type: JoinType::Inner,
            });
        }
        Command::CycleJoin { connection } => {
            if let Some(entry) = world.connection_mut(connection) {
                entry.join_type = entry.join_type.next();
                out_events.push(Event::JoinCycled {
                    connection,
                    join_type: entry.join_type,
                });
            }
        }
        Command::AdjustChaos { delta } => {
            if world.status != GameStatus::Playing {
                return;
            }
            world.chaos = (world.chaos + delta).clamp(CHAOS_FLOOR, CHAOS_CEILING);
            out_events.push(Event::ChaosChanged { chaos: world.chaos });
        }
        Command::FinishLevel { outcome } => {
            if world.status != GameStatus::Playing {
                return;
            }
            world.status = outcome.status();
            out_events.push(Event::StatusChanged {
                status: world.status,
            });
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::World;
    use join_circuit_core::{
        ConnectionSnapshot, ConnectionView, GameStatus, TableSnapshot, TableView,
    };

    /// Zero-based index of the level the current session belongs to.
    #[must_use]
    pub fn level_index(world: &World) -> usize {
        world.level_index
    }

    /// Current lifecycle status of the session.
    #[must_use]
    pub fn status(world: &World) -> GameStatus {
        world.status
    }

    /// Current chaos score in the range `0.0..=100.0`.
    #[must_use]
    pub fn chaos(world: &World) -> f32 {
        world.chaos
    }

    /// Total simulated time accumulated across the session.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.elapsed
    }

    /// Captures a read-only view of the placed table nodes.
    ///
    /// Snapshots retain placement order so hit testing can resolve overlaps
    /// in favor of the last-placed node.
    #[must_use]
    pub fn table_view(world: &World) -> TableView {
        let snapshots: Vec<TableSnapshot> = world
            .nodes
            .iter()
            .map(|node| TableSnapshot {
                id: node.id.clone(),
                label: node.label.clone(),
                color: node.color,
                position: node.position,
                radius: node.radius,
            })
            .collect();
        TableView::from_snapshots(snapshots)
    }

    /// Captures a read-only view of the live connections.
    #[must_use]
    pub fn connection_view(world: &World) -> ConnectionView {
        let snapshots: Vec<ConnectionSnapshot> = world
            .connections
            .iter()
            .map(|connection| ConnectionSnapshot {
                id: connection.id,
                source: connection.source.clone(),
                target: connection.target.clone(),
                join_type: connection.join_type,
            })
            .collect();
        ConnectionView::from_snapshots(snapshots)
    }
}

#[derive(Clone, Debug)]
struct TableNode {
    id: TableId,
    label: String,
    color: NodeColor,
    position: Position,
    radius: f32,
}

#[derive(Clone, Debug)]
struct Connection {
    id: ConnectionId,
    source: TableId,
    target: TableId,
    join_type: JoinType,
}
