use std::f32::consts::TAU;

use chunks::{Catalog, DoorSlot, Footprint};
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_wyrand::WyRand;
use simple_logger::SimpleLogger;

use dungeon::{
    assembly::Door,
    host::{Ledger, Route},
    separation::count_overlaps,
    Config, Error, Generator, Rect,
};

fn init_logging() {
    // several tests race to install the logger
    let _ = SimpleLogger::new()
        .without_timestamps()
        .with_level(log::LevelFilter::Warn)
        .env()
        .init();
}

/// Round rooms with `doors` doors evenly spread on their border
fn round_room(doors: usize, radius: f32) -> Footprint {
    Footprint {
        name: format!("round-{doors}-{radius}"),
        size: [2. * radius; 2],
        doors: (0..doors)
            .map(|i| {
                let facing = Vec2::from_angle(TAU * i as f32 / doors as f32);
                DoorSlot {
                    position: (facing * radius).into(),
                    facing: facing.into(),
                }
            })
            .collect(),
    }
}

fn catalog() -> Catalog {
    Catalog::new((0..=10).flat_map(|doors| [round_room(doors, 3.), round_room(doors, 5.)]))
}

fn random_config(rng: &mut impl Rng) -> Config {
    let rooms_count = rng.gen_range(1..=20);
    Config {
        seed: rng.gen(),
        rooms_count,
        crit_path_length: rng.gen_range(1..=rooms_count),
        max_doors: rng.gen_range(3..=10),
        distribution: rng.gen_range(0.05..=1.),
        spacing: rng.gen_range(0.5..2.),
        show_side_rooms: rng.gen(),
        separate_rooms: true,
        ..Default::default()
    }
}

#[test]
fn same_seed_same_level() {
    init_logging();
    let catalog = catalog();
    let mut rng = WyRand::seed_from_u64(1234);
    for _ in 0..20 {
        let config = random_config(&mut rng);
        let a = Generator::new(config, Ledger::default())
            .generate(&catalog)
            .unwrap();
        let b = Generator::new(config, Ledger::default())
            .generate(&catalog)
            .unwrap();
        assert_eq!(a.graph, b.graph, "{config:?}");
        assert_eq!(a.layout, b.layout, "{config:?}");
        assert_eq!(a.separation, b.separation, "{config:?}");
    }
}

#[test]
fn separated_levels() {
    init_logging();
    let catalog = catalog();
    let mut rng = WyRand::seed_from_u64(99);
    for _ in 0..20 {
        let config = random_config(&mut rng);
        let mut generator = Generator::new(config, Ledger::default());
        let level = generator.generate(&catalog).unwrap();
        let report = level.separation.unwrap();
        assert_eq!(
            report.residual_overlaps,
            count_overlaps(&level.layout.rects()),
            "{config:?}"
        );

        // instances were moved to their final place
        for room in level.layout.rooms.iter() {
            let spawned = generator.instantiator().get(room.chunk).unwrap();
            assert_eq!(spawned.position, room.rect.center);
            assert_eq!(spawned.tag.node, room.node);
        }
        // and door positions follow
        for room in level.layout.rooms.iter() {
            for door in room.doors.iter() {
                assert_eq!(door.position(), room.rect.center + door.relative);
            }
        }
    }
}

#[test]
fn regenerating_clears_previous_rooms() {
    init_logging();
    let catalog = catalog();
    let config = Config {
        rooms_count: 8,
        crit_path_length: 4,
        ..Default::default()
    };
    let mut generator = Generator::new(config, Ledger::default());
    let first = generator.generate(&catalog).unwrap();
    assert_eq!(generator.instantiator().live().count(), first.layout.rooms.len());

    generator.set_config(Config { seed: 1, ..config });
    let second = generator.generate(&catalog).unwrap();
    assert_eq!(generator.instantiator().live().count(), second.layout.rooms.len());
    assert_eq!(
        generator.instantiator().spawned(),
        first.layout.rooms.len() + second.layout.rooms.len()
    );

    generator.clear();
    assert_eq!(generator.instantiator().live().count(), 0);
    let ledger = generator.into_instantiator();
    assert_eq!(ledger.spawned(), first.layout.rooms.len() + second.layout.rooms.len());
}

#[test]
fn long_critical_path() {
    init_logging();
    let config = Config {
        rooms_count: 5_000,
        crit_path_length: 5_000,
        separate_rooms: false,
        ..Default::default()
    };
    let level = Generator::new(config, Ledger::default())
        .generate(&catalog())
        .unwrap();
    assert_eq!(level.layout.rooms.len(), 5_000);
    assert_eq!(level.layout.hallways.len(), 4_999);
    assert_eq!(level.separation, None);
}

#[test]
fn single_room() {
    init_logging();
    let config = Config {
        rooms_count: 1,
        crit_path_length: 1,
        ..Default::default()
    };
    let level = Generator::new(config, Ledger::default())
        .generate(&catalog())
        .unwrap();
    assert_eq!(level.graph.len(), 1);
    assert_eq!(level.graph[level.graph.root()].required_door_count(), 0);
    let [room] = &level.layout.rooms[..] else {
        panic!("expected a single room")
    };
    assert_eq!(room.rect.center, Vec2::ZERO);
    assert!(level.layout.hallways.is_empty());
}

#[test]
fn critical_path_only() {
    init_logging();
    let config = Config {
        rooms_count: 5,
        crit_path_length: 5,
        max_doors: 10,
        ..Default::default()
    };
    let level = Generator::new(config, Ledger::default())
        .generate(&catalog())
        .unwrap();
    assert!(level.graph.nodes().iter().all(|n| n.is_critical_path()));
    assert_eq!(level.layout.rooms.len(), 5);
    assert_eq!(level.layout.hallways.len(), 4);
}

#[test]
fn hallways_join_their_doors() {
    init_logging();
    let config = Config {
        rooms_count: 12,
        crit_path_length: 4,
        ..Default::default()
    };
    let mut level = Generator::new(config, Ledger::default())
        .generate(&catalog())
        .unwrap();
    let mut seen = 0;
    let routes = level.route_hallways(&mut |rooms: &[Rect], start: &Door, end: &Door| {
        seen = rooms.len();
        Route {
            path: vec![start.position(), end.position()],
            available_space: 0.,
        }
    });
    assert_eq!(seen, level.layout.rooms.len());
    assert_eq!(routes.len(), level.layout.hallways.len());
    for (route, hallway) in routes.iter().zip(level.layout.hallways.iter()) {
        let (start, end) = level.layout.endpoints(hallway);
        assert_eq!(route.path, [start.position(), end.position()]);
        // doors sit on the border of their rooms
        let start_room = &level.layout.rooms[hallway.start.room];
        let end_room = &level.layout.rooms[hallway.end.room];
        assert!(start_room.footprint_rect().contains(start.position()));
        assert!(end_room.footprint_rect().contains(end.position()));
        assert_eq!(level.layout.room_of(end_room.node), Some(hallway.end.room));
        // every hallway joins a room to one of its children
        let parent = level.layout.rooms[hallway.start.room].node;
        let child = level.layout.rooms[hallway.end.room].node;
        assert_eq!(level.graph.parent(child), Some(parent));
    }
}

#[test]
fn invalid_config_is_rejected() {
    let config = Config {
        rooms_count: 2,
        crit_path_length: 3,
        ..Default::default()
    };
    let mut generator = Generator::new(config, Ledger::default());
    assert!(matches!(
        generator.generate(&catalog()),
        Err(Error::InvalidConfig(_))
    ));
    assert_eq!(generator.instantiator().spawned(), 0);
}
