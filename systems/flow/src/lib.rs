#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Stochastic data-flow system: particle emission, advancement, and chaos
//! scoring.
//!
//! Correctness classification and the random emission sampler are kept
//! separate on purpose: [`flow_verdict`] is a pure function over snapshots,
//! while [`Flow`] owns the seeded generator and the particle pool. The system
//! emits one `AdjustChaos` command per particle emission; the world clamps
//! and gates the actual score.

use join_circuit_core::{
    Command, ConnectionSnapshot, ConnectionView, Event, Position, RequiredConnection, TableId,
    TableView,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Correctness verdict assigned to a particle at emission time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowVerdict {
    /// The connection matches a required entry under the flow rule.
    Good,
    /// No required entry matches the connection.
    Bad,
}

/// Classifies the flow along a connection against the level's solution.
///
/// Uses the loose flow-matching rule: swapped endpoints are accepted for
/// every join type unless `strict_direction` is set, so a reversed `Left`
/// connection still reads as good flow even though it can never win.
#[must_use]
pub fn flow_verdict(
    connection: &ConnectionSnapshot,
    requirements: &[RequiredConnection],
    strict_direction: bool,
) -> FlowVerdict {
    if requirements
        .iter()
        .any(|requirement| requirement.admits_flow(connection, strict_direction))
    {
        FlowVerdict::Good
    } else {
        FlowVerdict::Bad
    }
}

/// Tuning knobs for the emission sampler and chaos coupling.
#[derive(Clone, Copy, Debug)]
pub struct FlowTuning {
    /// Per-connection, per-frame probability of emitting a particle.
    pub emission_probability: f64,
    /// Life drained from every particle each frame.
    pub life_decay: f32,
    /// Chaos added for each bad emission.
    pub chaos_surge: f32,
    /// Chaos removed for each good emission.
    pub chaos_soothe: f32,
}

impl Default for FlowTuning {
    fn default() -> Self {
        Self {
            emission_probability: 0.10,
            life_decay: 0.01,
            chaos_surge: 0.05,
            chaos_soothe: 0.02,
        }
    }
}

/// Ephemeral render-only entity travelling along a connection's curve.
#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    /// Current canvas position along the curve.
    pub position: Position,
    /// Remaining life in `0.0..=1.0`; the curve parameter is `1 - life`.
    pub life: f32,
    /// Verdict frozen at emission time; selects the particle's color.
    pub verdict: FlowVerdict,
    /// Connection source the particle departed from.
    pub source: TableId,
    /// Connection target the particle travels toward.
    pub target: TableId,
}

/// Particle system driven once per animation frame.
#[derive(Debug)]
pub struct Flow {
    tuning: FlowTuning,
    rng: ChaCha8Rng,
    particles: Vec<Particle>,
}

impl Flow {
    /// Creates a new flow system with default tuning and the provided seed.
    #[must_use]
    pub fn new(rng_seed: u64) -> Self {
        Self::with_tuning(FlowTuning::default(), rng_seed)
    }

    /// Creates a new flow system with explicit tuning.
    #[must_use]
    pub fn with_tuning(tuning: FlowTuning, rng_seed: u64) -> Self {
        Self {
            tuning,
            rng: ChaCha8Rng::seed_from_u64(rng_seed),
            particles: Vec::new(),
        }
    }

    /// Advances the particle field by one frame and emits chaos commands.
    ///
    /// Emission happens first so a fresh particle is advanced (and drawn) on
    /// the frame it appears; the advancement pass then drops particles whose
    /// life ran out or whose endpoints vanished. Particles keep flowing after
    /// a terminal status — the world simply ignores the chaos deltas then.
    pub fn step(
        &mut self,
        events: &[Event],
        tables: &TableView,
        connections: &ConnectionView,
        requirements: &[RequiredConnection],
        strict_direction: bool,
        out: &mut Vec<Command>,
    ) {
        if events
            .iter()
            .any(|event| matches!(event, Event::LevelLoaded { .. }))
        {
            self.particles.clear();
        }

        for connection in connections.iter() {
            if !self.rng.gen_bool(self.tuning.emission_probability) {
                continue;
            }
            let Some(source) = tables.get(&connection.source) else {
                continue;
            };

            let verdict = flow_verdict(connection, requirements, strict_direction);
            self.particles.push(Particle {
                position: source.position,
                life: 1.0,
                verdict,
                source: connection.source.clone(),
                target: connection.target.clone(),
            });

            let delta = match verdict {
                FlowVerdict::Bad => self.tuning.chaos_surge,
                FlowVerdict::Good => -self.tuning.chaos_soothe,
            };
            out.push(Command::AdjustChaos { delta });
        }

        let life_decay = self.tuning.life_decay;
        self.particles.retain_mut(|particle| {
            let (Some(source), Some(target)) = (
                tables.get(&particle.source),
                tables.get(&particle.target),
            ) else {
                return false;
            };

            let t = 1.0 - particle.life;
            particle.position = Position::along_curve(source.position, target.position, t);
            particle.life -= life_decay;
            particle.life > 0.0
        });
    }

    /// Live particles in emission order, for scene population.
    #[must_use]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }
}
