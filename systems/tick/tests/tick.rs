use shamble_core::{Area, Character, CharacterId, LifeState, NullTracer, Point};
use shamble_system_tick::advance;
use shamble_world::{Barriers, Roster};

fn area(width: i32, height: i32) -> Area {
    Area::new(Point::new(0, 0), Point::new(width, height))
}

fn roster(entries: Vec<(Point, Character)>, area: Area) -> Roster {
    Roster::for_mapping(entries, area).expect("valid starting roster")
}

fn tick(roster: &Roster, barriers: &Barriers) -> Roster {
    advance(roster, barriers, &mut NullTracer).expect("tick succeeds")
}

#[test]
fn undead_approach_the_living() {
    let zombie = Character::zombie(CharacterId::new(0));
    let human = Character::human(CharacterId::new(1));
    let world = roster(
        vec![(Point::new(0, 0), zombie), (Point::new(2, 2), human)],
        area(3, 3),
    );

    let next = tick(&world, &Barriers::none());

    assert_eq!(next.character_at(Point::new(1, 1)), Some(&zombie));
    // The cornered human has nowhere that ends further from the zombie, and
    // ties break toward not moving.
    assert_eq!(next.character_at(Point::new(2, 2)), Some(&human));
}

#[test]
fn walled_in_characters_stay_put() {
    let human = Character::human(CharacterId::new(0));
    let zombie = Character::zombie(CharacterId::new(1));
    let ring = Barriers::new(vec![
        Area::new(Point::new(1, 1), Point::new(4, 2)),
        Area::new(Point::new(1, 3), Point::new(4, 4)),
        Area::new(Point::new(1, 2), Point::new(2, 3)),
        Area::new(Point::new(3, 2), Point::new(4, 3)),
    ]);
    let world = roster(
        vec![(Point::new(2, 2), human), (Point::new(4, 2), zombie)],
        area(5, 5),
    );

    let next = tick(&world, &ring);

    assert_eq!(next.character_at(Point::new(2, 2)), Some(&human));
    assert_eq!(next.character_at(Point::new(4, 2)), Some(&zombie));
    assert_eq!(next, world, "a fully blocked world is a fixed point");
}

#[test]
fn the_dead_rise_again() {
    let corpse = Character::new(CharacterId::new(0), LifeState::Dead { age: 19 });
    let mut world = roster(vec![(Point::new(1, 1), corpse)], area(3, 3));

    world = tick(&world, &Barriers::none());
    assert_eq!(
        world.character_at(Point::new(1, 1)).map(Character::state),
        Some(LifeState::Dead { age: 20 })
    );

    world = tick(&world, &Barriers::none());
    assert_eq!(
        world.character_at(Point::new(1, 1)).map(Character::state),
        Some(LifeState::Undead)
    );
}

#[test]
fn attacks_fell_the_living() {
    let zombie = Character::zombie(CharacterId::new(0));
    let human = Character::human(CharacterId::new(1));
    let bystander = Character::human(CharacterId::new(2));
    let world = roster(
        vec![
            (Point::new(0, 0), zombie),
            (Point::new(1, 0), human),
            (Point::new(7, 7), bystander),
        ],
        area(8, 8),
    );

    let next = tick(&world, &Barriers::none());

    assert_eq!(next.character_at(Point::new(0, 0)), Some(&zombie));
    // The victim falls, then ages once later in the same tick.
    let felled = next.character_at(Point::new(1, 0)).expect("victim stays");
    assert_eq!(felled.id(), human.id());
    assert_eq!(felled.state(), LifeState::Dead { age: 1 });
    // The bystander was out of everyone's reach and merely repositioned or
    // stayed; it is still alive somewhere.
    assert!(next.contains_character(bystander.id()));
    assert_eq!(next.len(), 3);
}

#[test]
fn a_tick_leaves_the_population_size_unchanged() {
    let mut entries = Vec::new();
    for (index, point) in [
        Point::new(0, 0),
        Point::new(3, 1),
        Point::new(5, 5),
        Point::new(2, 4),
        Point::new(7, 2),
    ]
    .into_iter()
    .enumerate()
    {
        let id = CharacterId::new(index as u32);
        let character = if index % 2 == 0 {
            Character::human(id)
        } else {
            Character::zombie(id)
        };
        entries.push((point, character));
    }
    let world = roster(entries, area(8, 8));

    let mut current = world.clone();
    for _ in 0..5 {
        current = tick(&current, &Barriers::none());
        assert_eq!(current.len(), 5);
    }
}
