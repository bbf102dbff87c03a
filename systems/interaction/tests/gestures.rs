use join_circuit_core::{
    Command, Event, JoinType, NodeColor, Position, TableId,
};
use join_circuit_system_interaction::{Interaction, PointerInput};
use join_circuit_world::{self as world, query, World};

fn spawn(world: &mut World, id: &str, x: f32, y: f32) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::SpawnTable {
            id: TableId::new(id),
            label: id.to_uppercase(),
            color: NodeColor::from_rgb(0x0e, 0xa5, 0xe9),
            position: Position::new(x, y),
        },
        &mut events,
    );
    events
}

fn pump(
    world: &mut World,
    interaction: &mut Interaction,
    events: &[Event],
    input: PointerInput,
) -> Vec<Event> {
    let tables = query::table_view(world);
    let connections = query::connection_view(world);
    let mut commands = Vec::new();
    interaction.handle(events, input, &tables, &connections, &mut commands);

    let mut produced = Vec::new();
    for command in commands {
        world::apply(world, command, &mut produced);
    }
    produced
}

fn press(x: f32, y: f32, connect_modifier: bool) -> PointerInput {
    PointerInput {
        position: Some(Position::new(x, y)),
        pressed: true,
        released: false,
        connect_modifier,
    }
}

fn drag(x: f32, y: f32) -> PointerInput {
    PointerInput {
        position: Some(Position::new(x, y)),
        pressed: false,
        released: false,
        connect_modifier: false,
    }
}

fn release(x: f32, y: f32) -> PointerInput {
    PointerInput {
        position: Some(Position::new(x, y)),
        pressed: false,
        released: true,
        connect_modifier: false,
    }
}

#[test]
fn drag_gesture_commits_positions_through_the_world() {
    let mut world = World::new();
    let mut interaction = Interaction::new();

    let events = spawn(&mut world, "users", 300.0, 300.0);

    let _ = pump(&mut world, &mut interaction, &events, press(310.0, 290.0, false));
    let moved = pump(&mut world, &mut interaction, &[], drag(500.0, 420.0));
    let _ = pump(&mut world, &mut interaction, &[], release(500.0, 420.0));

    assert_eq!(
        moved,
        vec![Event::TableMoved {
            id: TableId::new("users"),
            position: Position::new(490.0, 430.0),
        }]
    );
    let view = query::table_view(&world);
    let node = view.get(&TableId::new("users")).expect("node placed");
    assert_eq!(node.position, Position::new(490.0, 430.0));
}

#[test]
fn connect_gesture_creates_a_single_inner_connection() {
    let mut world = World::new();
    let mut interaction = Interaction::new();

    let mut events = spawn(&mut world, "users", 200.0, 300.0);
    events.extend(spawn(&mut world, "orders", 600.0, 300.0));

    let _ = pump(&mut world, &mut interaction, &events, press(200.0, 300.0, true));
    let _ = pump(&mut world, &mut interaction, &[], drag(400.0, 250.0));
    let produced = pump(&mut world, &mut interaction, &[], release(600.0, 300.0));

    assert!(matches!(
        produced.as_slice(),
        [Event::ConnectionCreated { join_type: JoinType::Inner, .. }]
    ));
    assert_eq!(query::connection_view(&world).len(), 1);

    // Repeating the gesture in the opposite direction must not duplicate the
    // unordered pair.
    let _ = pump(&mut world, &mut interaction, &[], press(600.0, 300.0, true));
    let produced = pump(&mut world, &mut interaction, &[], release(200.0, 300.0));
    assert!(produced.is_empty());
    assert_eq!(query::connection_view(&world).len(), 1);
}

#[test]
fn chip_press_cycles_the_join_type_in_place() {
    let mut world = World::new();
    let mut interaction = Interaction::new();

    let mut events = spawn(&mut world, "users", 200.0, 300.0);
    events.extend(spawn(&mut world, "orders", 600.0, 300.0));

    let _ = pump(&mut world, &mut interaction, &events, press(200.0, 300.0, true));
    let _ = pump(&mut world, &mut interaction, &[], release(600.0, 300.0));

    // Chip control point: midpoint (400, 300) lifted to (400, 250).
    let produced = pump(&mut world, &mut interaction, &[], press(400.0, 250.0, false));

    assert!(matches!(
        produced.as_slice(),
        [Event::JoinCycled { join_type: JoinType::Left, .. }]
    ));
    let connections = query::connection_view(&world).into_vec();
    assert_eq!(connections[0].join_type, JoinType::Left);
}
