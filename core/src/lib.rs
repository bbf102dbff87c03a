#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Join Circuit engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

/// Vertical lift applied to a connection's curve control point, measured in
/// canvas units above the straight midpoint between its endpoints.
pub const CURVE_LIFT: f32 = 50.0;

/// Relational join semantics carried by a connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JoinType {
    /// Rows present in both tables.
    Inner,
    /// Every row of the source table, matched rows of the target.
    Left,
    /// Every row of the target table, matched rows of the source.
    Right,
    /// Every row of either table.
    Full,
}

impl JoinType {
    /// Fixed cycle order used when the player retargets a connection.
    pub const CYCLE: [JoinType; 4] = [Self::Inner, Self::Left, Self::Right, Self::Full];

    /// Returns the join type that follows this one in the cycle order.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Inner => Self::Left,
            Self::Left => Self::Right,
            Self::Right => Self::Full,
            Self::Full => Self::Inner,
        }
    }

    /// Uppercase label rendered on connection chips.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Inner => "INNER",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
            Self::Full => "FULL",
        }
    }

    /// Reports whether the join treats its endpoints symmetrically.
    ///
    /// `Inner` and `Full` joins produce the same result regardless of which
    /// table is the source; `Left` and `Right` do not.
    #[must_use]
    pub const fn is_symmetric(self) -> bool {
        matches!(self, Self::Inner | Self::Full)
    }
}

/// Identifier of a table source, drawn from the level catalog.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableId(String);

impl TableId {
    /// Creates a new table identifier from the catalog's string key.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Retrieves the string representation of the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier assigned to a connection by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(u32);

impl ConnectionId {
    /// Creates a new connection identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location on the canvas expressed in canvas-local units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    x: f32,
    y: f32,
}

impl Position {
    /// Creates a new canvas position.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Horizontal coordinate in canvas units.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical coordinate in canvas units.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Euclidean distance between two positions.
    #[must_use]
    pub fn distance_to(self, other: Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Returns the position translated by the provided deltas.
    #[must_use]
    pub fn offset_by(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Control point of the quadratic curve drawn between two endpoints.
    ///
    /// The control point sits [`CURVE_LIFT`] units above the straight
    /// midpoint, which is also where the connection's label chip is hit
    /// tested.
    #[must_use]
    pub fn curve_control(from: Position, to: Position) -> Position {
        Position::new(
            (from.x + to.x) * 0.5,
            (from.y + to.y) * 0.5 - CURVE_LIFT,
        )
    }

    /// Point of the quadratic curve between two endpoints at parameter `t`.
    ///
    /// `t = 0.0` yields `from` and `t = 1.0` yields `to`; the curve bends
    /// through the [`curve_control`](Self::curve_control) point.
    #[must_use]
    pub fn along_curve(from: Position, to: Position, t: f32) -> Position {
        let control = Self::curve_control(from, to);
        let u = 1.0 - t;
        Position::new(
            u * u * from.x + 2.0 * u * t * control.x + t * t * to.x,
            u * u * from.y + 2.0 * u * t * control.y + t * t * to.y,
        )
    }
}

/// Visual appearance applied to a table node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeColor {
    red: u8,
    green: u8,
    blue: u8,
}

impl NodeColor {
    /// Creates a new node color from byte RGB components.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Parses a `#rrggbb` hex string as used by the level catalog.
    #[must_use]
    pub fn from_hex(value: &str) -> Option<Self> {
        let digits = value.strip_prefix('#')?;
        if digits.len() != 6 {
            return None;
        }
        let red = u8::from_str_radix(&digits[0..2], 16).ok()?;
        let green = u8::from_str_radix(&digits[2..4], 16).ok()?;
        let blue = u8::from_str_radix(&digits[4..6], 16).ok()?;
        Some(Self { red, green, blue })
    }

    /// Red component of the color.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green component of the color.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue component of the color.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }
}

impl TryFrom<String> for NodeColor {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value).ok_or_else(|| format!("invalid hex color `{value}`"))
    }
}

impl From<NodeColor> for String {
    fn from(color: NodeColor) -> Self {
        format!(
            "#{:02x}{:02x}{:02x}",
            color.red, color.green, color.blue
        )
    }
}

/// Lifecycle status of a level session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameStatus {
    /// The level is live and accepting graph mutations.
    Playing,
    /// The player reproduced the required solution.
    Won,
    /// Chaos reached its ceiling before the solution was found.
    Overflow,
}

impl GameStatus {
    /// Reports whether the status is terminal until an explicit reset.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Won | Self::Overflow)
    }
}

/// Terminal outcome proposed by the evaluation system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LevelOutcome {
    /// The live graph matches the level's required solution.
    Won,
    /// Chaos reached its ceiling while the solution was unmatched.
    Overflow,
}

impl LevelOutcome {
    /// Status the world transitions to when the outcome is accepted.
    #[must_use]
    pub const fn status(self) -> GameStatus {
        match self {
            Self::Won => GameStatus::Won,
            Self::Overflow => GameStatus::Overflow,
        }
    }
}

/// Reasons a spawn request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpawnError {
    /// A node with the requested table identifier is already placed.
    AlreadyPlaced,
    /// The level is no longer accepting spawns.
    LevelOver,
}

/// Reasons a connection request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConnectError {
    /// Source and target refer to the same node.
    SelfConnection,
    /// A connection between the unordered pair already exists.
    DuplicatePair,
    /// One of the endpoints does not name a placed node.
    UnknownTable,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Discards the current graph and starts a fresh session for a level.
    LoadLevel {
        /// Zero-based index of the level within the catalog.
        level_index: usize,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous frame.
        dt: Duration,
    },
    /// Requests placement of a table node on the canvas.
    SpawnTable {
        /// Catalog identifier of the table to place.
        id: TableId,
        /// Display label rendered at the node's center.
        label: String,
        /// Appearance assigned to the node.
        color: NodeColor,
        /// Initial canvas position, jittered around the view center.
        position: Position,
    },
    /// Moves a placed node to a new canvas position.
    MoveTable {
        /// Identifier of the node being dragged.
        id: TableId,
        /// Position the node should occupy.
        position: Position,
    },
    /// Requests creation of a connection between two distinct nodes.
    Connect {
        /// Node the connect gesture started from.
        source: TableId,
        /// Node the gesture was released onto.
        target: TableId,
    },
    /// Advances a connection's join type to the next value in cycle order.
    CycleJoin {
        /// Identifier of the connection being retyped.
        connection: ConnectionId,
    },
    /// Nudges the chaos score by a signed delta, clamped to its bounds.
    AdjustChaos {
        /// Signed chaos delta produced by a particle emission.
        delta: f32,
    },
    /// Requests a terminal status transition proposed by the evaluator.
    FinishLevel {
        /// Outcome the session should settle on.
        outcome: LevelOutcome,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that a fresh level session replaced the previous graph.
    LevelLoaded {
        /// Zero-based index of the loaded level.
        level_index: usize,
    },
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the frame.
        dt: Duration,
    },
    /// Confirms that a table node was placed on the canvas.
    TableSpawned {
        /// Identifier of the placed node.
        id: TableId,
        /// Canvas position the node occupies.
        position: Position,
    },
    /// Reports that a spawn request was rejected.
    SpawnRejected {
        /// Identifier provided in the spawn request.
        id: TableId,
        /// Specific reason the spawn failed.
        reason: SpawnError,
    },
    /// Confirms that a node moved to a new position.
    TableMoved {
        /// Identifier of the moved node.
        id: TableId,
        /// Position the node now occupies.
        position: Position,
    },
    /// Confirms that a connection was created between two nodes.
    ConnectionCreated {
        /// Identifier allocated to the connection by the world.
        connection: ConnectionId,
        /// Source endpoint recorded for the connection.
        source: TableId,
        /// Target endpoint recorded for the connection.
        target: TableId,
        /// Join type the connection starts with.
        join_type: JoinType,
    },
    /// Reports that a connection request was rejected.
    ConnectionRejected {
        /// Source endpoint provided in the request.
        source: TableId,
        /// Target endpoint provided in the request.
        target: TableId,
        /// Specific reason the connection failed.
        reason: ConnectError,
    },
    /// Confirms that a connection's join type advanced in cycle order.
    JoinCycled {
        /// Identifier of the retyped connection.
        connection: ConnectionId,
        /// Join type the connection now carries.
        join_type: JoinType,
    },
    /// Reports the chaos score after a clamp-and-apply pass.
    ChaosChanged {
        /// Chaos value in the range `0.0..=100.0`.
        chaos: f32,
    },
    /// Announces that the session entered a new status.
    StatusChanged {
        /// Status that became active after processing commands.
        status: GameStatus,
    },
}

/// Immutable representation of a single table node used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct TableSnapshot {
    /// Catalog identifier of the node.
    pub id: TableId,
    /// Display label rendered at the node's center.
    pub label: String,
    /// Appearance assigned to the node.
    pub color: NodeColor,
    /// Canvas position the node occupies.
    pub position: Position,
    /// Hit-test and drawing radius in canvas units.
    pub radius: f32,
}

/// Read-only snapshot describing all placed table nodes.
#[derive(Clone, Debug, Default)]
pub struct TableView {
    snapshots: Vec<TableSnapshot>,
}

impl TableView {
    /// Creates a new table view preserving the world's placement order.
    ///
    /// Placement order matters: hit testing resolves overlaps in favor of the
    /// last-placed (topmost) node.
    #[must_use]
    pub fn from_snapshots(snapshots: Vec<TableSnapshot>) -> Self {
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in placement order.
    pub fn iter(&self) -> impl Iterator<Item = &TableSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up a node snapshot by its identifier.
    #[must_use]
    pub fn get(&self, id: &TableId) -> Option<&TableSnapshot> {
        self.snapshots.iter().find(|snapshot| &snapshot.id == id)
    }

    /// Number of nodes currently placed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether no nodes are placed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TableSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single connection used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct ConnectionSnapshot {
    /// Identifier allocated to the connection by the world.
    pub id: ConnectionId,
    /// Source endpoint of the connection.
    pub source: TableId,
    /// Target endpoint of the connection.
    pub target: TableId,
    /// Join semantics the connection currently carries.
    pub join_type: JoinType,
}

impl ConnectionSnapshot {
    /// Reports whether the connection links the provided unordered pair.
    #[must_use]
    pub fn links_pair(&self, a: &TableId, b: &TableId) -> bool {
        (&self.source == a && &self.target == b) || (&self.source == b && &self.target == a)
    }
}

/// Read-only snapshot describing all live connections.
#[derive(Clone, Debug, Default)]
pub struct ConnectionView {
    snapshots: Vec<ConnectionSnapshot>,
}

impl ConnectionView {
    /// Creates a new connection view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<ConnectionSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &ConnectionSnapshot> {
        self.snapshots.iter()
    }

    /// Number of live connections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether no connections exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<ConnectionSnapshot> {
        self.snapshots
    }
}

/// Entry in a level's target solution the player's graph must reproduce.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequiredConnection {
    /// Source endpoint of the required connection.
    pub source: TableId,
    /// Target endpoint of the required connection.
    pub target: TableId,
    /// Join type the player must select.
    pub join_type: JoinType,
}

impl RequiredConnection {
    /// Win-rule matching: reports whether a live connection satisfies this
    /// requirement.
    ///
    /// Join types must be equal. Symmetric joins (`Inner`/`Full`) accept
    /// swapped endpoints unless `strict_direction` is set; asymmetric joins
    /// (`Left`/`Right`) require the exact direction regardless of the flag.
    #[must_use]
    pub fn satisfied_by(&self, connection: &ConnectionSnapshot, strict_direction: bool) -> bool {
        if connection.join_type != self.join_type {
            return false;
        }
        let direct = connection.source == self.source && connection.target == self.target;
        if self.join_type.is_symmetric() {
            direct || (!strict_direction && self.reversed_by(connection))
        } else {
            direct
        }
    }

    /// Flow-rule matching used to classify particle emissions.
    ///
    /// Looser than the win rule: swapped endpoints are accepted for every
    /// join type whenever `strict_direction` is unset, so a reversed `Left`
    /// connection still carries good-looking flow even though it can never
    /// win the level.
    #[must_use]
    pub fn admits_flow(&self, connection: &ConnectionSnapshot, strict_direction: bool) -> bool {
        if connection.join_type != self.join_type {
            return false;
        }
        let direct = connection.source == self.source && connection.target == self.target;
        direct || (!strict_direction && self.reversed_by(connection))
    }

    fn reversed_by(&self, connection: &ConnectionSnapshot) -> bool {
        connection.source == self.target && connection.target == self.source
    }
}
