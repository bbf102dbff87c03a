#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Win/overflow evaluation system.
//!
//! The predicates here are pure functions over connection snapshots so the
//! win rule can be tested without a world or a frame loop. The [`Evaluation`]
//! system wraps them in event plumbing: it watches for connection and chaos
//! changes while the session is live and proposes exactly one terminal
//! transition through `FinishLevel`, which the world accepts at most once.

use join_circuit_core::{
    Command, ConnectionView, Event, GameStatus, LevelOutcome, RequiredConnection,
};

/// Chaos score at which an unsolved session overflows.
pub const OVERFLOW_THRESHOLD: f32 = 100.0;

/// Reports whether any live connection satisfies the requirement.
#[must_use]
pub fn requirement_matched(
    requirement: &RequiredConnection,
    connections: &ConnectionView,
    strict_direction: bool,
) -> bool {
    connections
        .iter()
        .any(|connection| requirement.satisfied_by(connection, strict_direction))
}

/// Reports whether the live graph reproduces the level's solution.
///
/// The connection count must equal the requirement count and every
/// requirement must be satisfied by some connection. Order of either list is
/// irrelevant.
#[must_use]
pub fn solution_matched(
    connections: &ConnectionView,
    requirements: &[RequiredConnection],
    strict_direction: bool,
) -> bool {
    connections.len() == requirements.len()
        && requirements
            .iter()
            .all(|requirement| requirement_matched(requirement, connections, strict_direction))
}

/// Evaluates the terminal outcome for the current graph and chaos score.
///
/// A matched solution wins even when chaos sits at the ceiling; overflow is
/// only reported for unsolved graphs.
#[must_use]
pub fn evaluate(
    connections: &ConnectionView,
    chaos: f32,
    requirements: &[RequiredConnection],
    strict_direction: bool,
) -> Option<LevelOutcome> {
    if solution_matched(connections, requirements, strict_direction) {
        Some(LevelOutcome::Won)
    } else if chaos >= OVERFLOW_THRESHOLD {
        Some(LevelOutcome::Overflow)
    } else {
        None
    }
}

/// Event-driven system that proposes terminal status transitions.
#[derive(Debug)]
pub struct Evaluation {
    status: GameStatus,
}

impl Evaluation {
    /// Creates a new evaluation system assuming a live session.
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: GameStatus::Playing,
        }
    }

    /// Consumes world events and snapshot state to emit finish commands.
    ///
    /// Re-evaluation happens only when the connection set or the chaos score
    /// changed this batch, and only while the session is live.
    pub fn handle(
        &mut self,
        events: &[Event],
        connections: &ConnectionView,
        chaos: f32,
        requirements: &[RequiredConnection],
        strict_direction: bool,
        out: &mut Vec<Command>,
    ) {
        let mut relevant = false;
        for event in events {
            match event {
                Event::StatusChanged { status } => self.status = *status,
                Event::LevelLoaded { .. } => {
                    self.status = GameStatus::Playing;
                    relevant = true;
                }
                Event::ConnectionCreated { .. }
                | Event::JoinCycled { .. }
                | Event::ChaosChanged { .. } => relevant = true,
                _ => {}
            }
        }

        if self.status != GameStatus::Playing || !relevant {
            return;
        }

        if let Some(outcome) = evaluate(connections, chaos, requirements, strict_direction) {
            out.push(Command::FinishLevel { outcome });
        }
    }
}

impl Default for Evaluation {
    fn default() -> Self {
        Self::new()
    }
}
