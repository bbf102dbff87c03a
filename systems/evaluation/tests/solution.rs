use join_circuit_core::{Command, Event, GameStatus, Position, TableId};
use join_circuit_levels::{Catalog, LevelConfig};
use join_circuit_system_evaluation::Evaluation;
use join_circuit_world::{self as world, query, World};

/// Applies a command, then lets the evaluation system react to the produced
/// events exactly the way the session controller pumps it.
fn play(
    world: &mut World,
    evaluation: &mut Evaluation,
    level: &LevelConfig,
    command: Command,
) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, command, &mut events);

    let connections = query::connection_view(world);
    let chaos = query::chaos(world);
    let mut commands = Vec::new();
    evaluation.handle(
        &events,
        &connections,
        chaos,
        &level.required_connections,
        level.strict_direction,
        &mut commands,
    );
    for command in commands {
        world::apply(world, command, &mut events);
    }
    events
}

fn spawn_command(level: &LevelConfig, id: &str, x: f32, y: f32) -> Command {
    let table = level
        .source(&TableId::new(id))
        .unwrap_or_else(|| panic!("table `{id}` available in `{}`", level.title));
    Command::SpawnTable {
        id: table.id.clone(),
        label: table.label.clone(),
        color: table.color,
        position: Position::new(x, y),
    }
}

fn connect_command(source: &str, target: &str) -> Command {
    Command::Connect {
        source: TableId::new(source),
        target: TableId::new(target),
    }
}

#[test]
fn the_intersection_wins_on_a_direct_inner_connection() {
    let catalog = Catalog::built_in();
    let level = catalog.get(0).expect("first level");
    let mut world = World::new();
    let mut evaluation = Evaluation::new();

    let _ = play(&mut world, &mut evaluation, level, Command::LoadLevel { level_index: 0 });
    let _ = play(&mut world, &mut evaluation, level, spawn_command(level, "users", 200.0, 300.0));
    let _ = play(&mut world, &mut evaluation, level, spawn_command(level, "orders", 500.0, 300.0));
    let events = play(
        &mut world,
        &mut evaluation,
        level,
        connect_command("users", "orders"),
    );

    assert!(events.contains(&Event::StatusChanged {
        status: GameStatus::Won,
    }));
    assert_eq!(query::status(&world), GameStatus::Won);
}

#[test]
fn the_intersection_accepts_the_reversed_direction() {
    let catalog = Catalog::built_in();
    let level = catalog.get(0).expect("first level");
    let mut world = World::new();
    let mut evaluation = Evaluation::new();

    let _ = play(&mut world, &mut evaluation, level, Command::LoadLevel { level_index: 0 });
    let _ = play(&mut world, &mut evaluation, level, spawn_command(level, "users", 200.0, 300.0));
    let _ = play(&mut world, &mut evaluation, level, spawn_command(level, "orders", 500.0, 300.0));
    let _ = play(
        &mut world,
        &mut evaluation,
        level,
        connect_command("orders", "users"),
    );

    assert_eq!(query::status(&world), GameStatus::Won);
}

#[test]
fn no_order_left_behind_enforces_strict_direction() {
    let catalog = Catalog::built_in();
    let level = catalog.get(1).expect("second level");
    assert!(level.strict_direction);

    let mut world = World::new();
    let mut evaluation = Evaluation::new();

    let _ = play(&mut world, &mut evaluation, level, Command::LoadLevel { level_index: 1 });
    let _ = play(&mut world, &mut evaluation, level, spawn_command(level, "users", 200.0, 300.0));
    let _ = play(&mut world, &mut evaluation, level, spawn_command(level, "orders", 500.0, 300.0));

    // Reversed direction with the right join type must not win.
    let _ = play(
        &mut world,
        &mut evaluation,
        level,
        connect_command("orders", "users"),
    );
    let connection = query::connection_view(&world).into_vec()[0].id;
    let _ = play(&mut world, &mut evaluation, level, Command::CycleJoin { connection });
    assert_eq!(query::status(&world), GameStatus::Playing);

    // Retry and connect the required direction.
    let _ = play(&mut world, &mut evaluation, level, Command::LoadLevel { level_index: 1 });
    let _ = play(&mut world, &mut evaluation, level, spawn_command(level, "users", 200.0, 300.0));
    let _ = play(&mut world, &mut evaluation, level, spawn_command(level, "orders", 500.0, 300.0));
    let _ = play(
        &mut world,
        &mut evaluation,
        level,
        connect_command("users", "orders"),
    );
    let connection = query::connection_view(&world).into_vec()[0].id;
    let events = play(&mut world, &mut evaluation, level, Command::CycleJoin { connection });

    assert!(events.contains(&Event::StatusChanged {
        status: GameStatus::Won,
    }));
    assert_eq!(query::status(&world), GameStatus::Won);
}

#[test]
fn sustained_bad_flow_overflows_instead_of_winning() {
    let catalog = Catalog::built_in();
    // The strict LEFT level: a default inner connection never satisfies it,
    // so the graph keeps feeding bad flow.
    let level = catalog.get(1).expect("second level");
    let mut world = World::new();
    let mut evaluation = Evaluation::new();

    let _ = play(&mut world, &mut evaluation, level, Command::LoadLevel { level_index: 1 });
    let _ = play(&mut world, &mut evaluation, level, spawn_command(level, "users", 200.0, 300.0));
    let _ = play(&mut world, &mut evaluation, level, spawn_command(level, "orders", 500.0, 300.0));
    let _ = play(
        &mut world,
        &mut evaluation,
        level,
        connect_command("users", "orders"),
    );
    assert_eq!(query::status(&world), GameStatus::Playing);

    // Each bad emission surges chaos by 0.05; the session must settle on
    // overflow, never on won.
    for _ in 0..2_100 {
        let _ = play(
            &mut world,
            &mut evaluation,
            level,
            Command::AdjustChaos { delta: 0.05 },
        );
        if query::status(&world) != GameStatus::Playing {
            break;
        }
    }

    assert_eq!(query::status(&world), GameStatus::Overflow);
    assert_eq!(query::chaos(&world), 100.0);
}

#[test]
fn retry_resets_the_session_regardless_of_prior_state() {
    let catalog = Catalog::built_in();
    let level = catalog.get(0).expect("first level");
    let mut world = World::new();
    let mut evaluation = Evaluation::new();

    let _ = play(&mut world, &mut evaluation, level, Command::LoadLevel { level_index: 0 });
    let _ = play(&mut world, &mut evaluation, level, spawn_command(level, "users", 200.0, 300.0));
    let _ = play(&mut world, &mut evaluation, level, spawn_command(level, "orders", 500.0, 300.0));
    let _ = play(
        &mut world,
        &mut evaluation,
        level,
        connect_command("users", "orders"),
    );
    assert_eq!(query::status(&world), GameStatus::Won);

    let _ = play(&mut world, &mut evaluation, level, Command::LoadLevel { level_index: 0 });

    assert_eq!(query::status(&world), GameStatus::Playing);
    assert_eq!(query::chaos(&world), 0.0);
    assert!(query::table_view(&world).is_empty());
    assert!(query::connection_view(&world).is_empty());
}
