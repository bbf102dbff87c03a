//! Session controller owning the world, the systems, and the level catalog.
//!
//! All game-state mutation funnels through this module's frame pump: view
//! and pointer input become commands, the world applies them and broadcasts
//! events, and the systems answer with further command batches. Snapshot
//! views are recaptured between stages so every system observes the latest
//! committed state. Events produced after the last system ran are carried
//! into the next frame's batch so status transitions are never lost.

use std::{mem, time::Duration};

use glam::Vec2;
use log::{debug, info, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use join_circuit_core::{Command, Event, Position, TableId, TableView};
use join_circuit_levels::{Catalog, LevelConfig};
use join_circuit_rendering::{
    palette, ChaosMeterView, Color, FrameInput, GuidePanelView, PreviewLine, Scene,
    SceneConnection, SceneNode, SceneParticle, SourceButton, StatusOverlayView,
};
use join_circuit_system_evaluation::Evaluation;
use join_circuit_system_flow::{Flow, FlowVerdict};
use join_circuit_system_interaction::{Interaction, PointerInput};
use join_circuit_world::{self as world, query, World};

/// Maximum offset of a freshly spawned node from the view center, per axis.
const SPAWN_JITTER: f32 = 100.0;

/// Fallback canvas center used before the backend reports a real size.
const FALLBACK_CENTER: Vec2 = Vec2::new(640.0, 360.0);

const JITTER_SEED_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

pub(crate) struct Session {
    world: World,
    catalog: Catalog,
    level_index: usize,
    current_level: LevelConfig,
    interaction: Interaction,
    flow: Flow,
    evaluation: Evaluation,
    rng: ChaCha8Rng,
    pending_events: Vec<Event>,
}

impl Session {
    /// Creates a session with the first level already loaded.
    ///
    /// `level_index` must be valid for the catalog; `main` validates it.
    pub(crate) fn new(catalog: Catalog, level_index: usize, seed: u64) -> Self {
        let current_level = catalog
            .get(level_index)
            .or_else(|| catalog.get(0))
            .cloned()
            .unwrap_or_else(placeholder_level);

        let mut session = Self {
            world: World::new(),
            catalog,
            level_index,
            current_level,
            interaction: Interaction::new(),
            flow: Flow::new(seed),
            evaluation: Evaluation::new(),
            rng: ChaCha8Rng::seed_from_u64(seed ^ JITTER_SEED_SALT),
            pending_events: Vec::new(),
        };

        let mut events = Vec::new();
        world::apply(
            &mut session.world,
            Command::LoadLevel { level_index },
            &mut events,
        );
        session.pending_events = events;
        session
    }

    /// Scene shown before the first frame runs.
    pub(crate) fn initial_scene(&self) -> Scene {
        Scene::new(panel_view(
            &self.current_level,
            &query::table_view(&self.world),
        ))
    }

    /// Advances the session by one frame and repopulates the scene.
    pub(crate) fn frame(&mut self, dt: Duration, input: FrameInput, scene: &mut Scene) {
        let mut events = mem::take(&mut self.pending_events);

        // View-sourced commands: clock, overlay actions, panel spawns.
        let mut commands = vec![Command::Tick { dt }];
        if input.retry {
            commands.push(Command::LoadLevel {
                level_index: self.level_index,
            });
        }
        if input.advance {
            commands.push(Command::LoadLevel {
                level_index: self.catalog.next_index(self.level_index),
            });
        }
        if let Some(id) = input.spawn_request {
            match self.spawn_command(&id, input.canvas) {
                Some(command) => commands.push(command),
                None => warn!("ignoring spawn request for unknown table `{id}`"),
            }
        }
        for command in commands {
            self.track_level(&command);
            world::apply(&mut self.world, command, &mut events);
        }

        // Pointer gestures.
        let pointer = PointerInput {
            position: input.cursor.map(|cursor| Position::new(cursor.x, cursor.y)),
            pressed: input.pressed,
            released: input.released,
            connect_modifier: input.connect_modifier,
        };
        let mut out = Vec::new();
        {
            let tables = query::table_view(&self.world);
            let connections = query::connection_view(&self.world);
            self.interaction
                .handle(&events, pointer, &tables, &connections, &mut out);
        }
        for command in out.drain(..) {
            world::apply(&mut self.world, command, &mut events);
        }

        // Data flow and chaos scoring.
        {
            let tables = query::table_view(&self.world);
            let connections = query::connection_view(&self.world);
            self.flow.step(
                &events,
                &tables,
                &connections,
                &self.current_level.required_connections,
                self.current_level.strict_direction,
                &mut out,
            );
        }
        for command in out.drain(..) {
            world::apply(&mut self.world, command, &mut events);
        }

        // Win/overflow evaluation. Its status transition lands after every
        // system already ran, so those events carry into the next frame.
        {
            let connections = query::connection_view(&self.world);
            self.evaluation.handle(
                &events,
                &connections,
                query::chaos(&self.world),
                &self.current_level.required_connections,
                self.current_level.strict_direction,
                &mut out,
            );
        }
        let mut late = Vec::new();
        for command in out.drain(..) {
            world::apply(&mut self.world, command, &mut late);
        }

        log_events(&events);
        log_events(&late);
        self.pending_events = late;

        self.populate_scene(scene);
    }

    fn track_level(&mut self, command: &Command) {
        let Command::LoadLevel { level_index } = command else {
            return;
        };
        match self.catalog.get(*level_index) {
            Some(level) => {
                self.level_index = *level_index;
                self.current_level = level.clone();
            }
            None => warn!("level index {level_index} missing from catalog; keeping current level"),
        }
    }

    fn spawn_command(&mut self, id: &TableId, canvas: Vec2) -> Option<Command> {
        let source = self.current_level.source(id)?;
        let center = if canvas.length_squared() > 0.0 {
            canvas * 0.5
        } else {
            FALLBACK_CENTER
        };
        let position = Position::new(
            center.x + self.rng.gen_range(-SPAWN_JITTER..=SPAWN_JITTER),
            center.y + self.rng.gen_range(-SPAWN_JITTER..=SPAWN_JITTER),
        );
        Some(Command::SpawnTable {
            id: source.id.clone(),
            label: source.label.clone(),
            color: source.color,
            position,
        })
    }

    fn populate_scene(&self, scene: &mut Scene) {
        let tables = query::table_view(&self.world);
        let connections = query::connection_view(&self.world);

        scene.connections = connections
            .iter()
            .filter_map(|connection| {
                let source = tables.get(&connection.source)?;
                let target = tables.get(&connection.target)?;
                Some(SceneConnection {
                    id: connection.id,
                    from: to_screen(source.position),
                    to: to_screen(target.position),
                    join_type: connection.join_type,
                })
            })
            .collect();

        scene.preview = self
            .interaction
            .connect_preview(&tables)
            .map(|preview| PreviewLine {
                from: to_screen(preview.from),
                to: to_screen(preview.cursor),
            });

        scene.particles = self
            .flow
            .particles()
            .iter()
            .map(|particle| SceneParticle {
                position: to_screen(particle.position),
                color: match particle.verdict {
                    FlowVerdict::Good => palette::PARTICLE_GOOD,
                    FlowVerdict::Bad => palette::PARTICLE_BAD,
                },
            })
            .collect();

        scene.nodes = tables
            .iter()
            .map(|node| SceneNode {
                id: node.id.clone(),
                label: node.label.clone(),
                color: Color::from(node.color),
                position: to_screen(node.position),
                radius: node.radius,
                hovered: self.interaction.hovered() == Some(&node.id),
            })
            .collect();

        scene.panel = panel_view(&self.current_level, &tables);
        scene.meter = ChaosMeterView {
            chaos: query::chaos(&self.world),
        };
        scene.overlay = StatusOverlayView::for_status(query::status(&self.world));
        scene.pulse_clock = query::elapsed(&self.world);
    }
}

fn to_screen(position: Position) -> Vec2 {
    Vec2::new(position.x(), position.y())
}

fn panel_view(level: &LevelConfig, tables: &TableView) -> GuidePanelView {
    GuidePanelView {
        level_number: level.id,
        title: level.title.clone(),
        description: level.description.clone(),
        sources: level
            .available_tables
            .iter()
            .map(|source| SourceButton {
                id: source.id.clone(),
                label: source.label.clone(),
                color: Color::from(source.color),
                placed: tables.get(&source.id).is_some(),
            })
            .collect(),
    }
}

fn log_events(events: &[Event]) {
    for event in events {
        match event {
            Event::LevelLoaded { level_index } => info!("level {level_index} loaded"),
            Event::StatusChanged { status } => info!("session status changed to {status:?}"),
            Event::ConnectionCreated {
                source, target, ..
            } => debug!("connected {source} -> {target}"),
            Event::ConnectionRejected {
                source,
                target,
                reason,
            } => debug!("rejected connection {source} -> {target}: {reason:?}"),
            Event::SpawnRejected { id, reason } => debug!("rejected spawn of `{id}`: {reason:?}"),
            _ => {}
        }
    }
}

fn placeholder_level() -> LevelConfig {
    LevelConfig {
        id: 0,
        title: "Empty Catalog".to_owned(),
        description: "No levels are available.".to_owned(),
        available_tables: Vec::new(),
        required_connections: Vec::new(),
        strict_direction: false,
    }
}
