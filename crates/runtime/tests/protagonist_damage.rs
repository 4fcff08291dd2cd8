use getaway_core::{FlagGrid, HitCause, SceneEvent, Vec2};
use runtime::Scene;

/// A pursuer contact costs one hit, then the invulnerability window
/// blocks further damage until it expires.
#[test]
fn stun_window_blocks_repeat_hits() {
    let mut scene = Scene::builder(FlagGrid::new(10, 10))
        .seed(31)
        .protagonist_at(Vec2::new(5.5, 5.5))
        .build()
        .unwrap();
    scene.spawn_pursuer(Vec2::new(5.5, 5.5));
    let start_health = scene.protagonist().health();

    scene.tick(0.016);
    let first = scene.drain_events();
    assert!(first.iter().any(|e| matches!(
        e,
        SceneEvent::ProtagonistHit {
            cause: HitCause::Pursuer,
            ..
        }
    )));
    assert_eq!(
        scene.protagonist().health(),
        start_health - scene.config().pursuer_damage
    );

    // A second pursuer dropped onto the same tile during the window
    // cannot connect.
    scene.spawn_pursuer(Vec2::new(5.5, 5.5));
    scene.tick(0.016);
    let second = scene.drain_events();
    assert!(
        second
            .iter()
            .all(|e| !matches!(e, SceneEvent::ProtagonistHit { .. })),
        "hit landed inside the stun window"
    );
    assert_eq!(
        scene.protagonist().health(),
        start_health - scene.config().pursuer_damage
    );
}

/// Damage from one contact lands exactly once even when nothing drains
/// the event queue between ticks.
#[test]
fn undrained_hit_events_apply_only_once() {
    let mut scene = Scene::builder(FlagGrid::new(10, 10))
        .seed(7)
        .protagonist_at(Vec2::new(5.5, 5.5))
        .build()
        .unwrap();
    scene.spawn_pursuer(Vec2::new(5.5, 5.5));
    let start_health = scene.protagonist().health();

    scene.tick(0.016);
    scene.tick(0.016);
    scene.tick(0.016);

    assert_eq!(
        scene.protagonist().health(),
        start_health - scene.config().pursuer_damage
    );
    // The backlog is still intact for a late drain.
    let hits = scene
        .drain_events()
        .iter()
        .filter(|e| matches!(e, SceneEvent::ProtagonistHit { .. }))
        .count();
    assert_eq!(hits, 1);
}

/// A vehicle overlap applies the full vehicle damage.
#[test]
fn vehicle_contact_flattens() {
    let grid = FlagGrid::parse(&["rrrrrrrr"]).unwrap();
    let mut scene = Scene::builder(grid)
        .seed(2)
        .protagonist_at(Vec2::new(4.5, 0.5))
        .build()
        .unwrap();
    scene.spawn_vehicle(Vec2::new(4.5, 0.5));

    scene.tick(0.016);
    let events = scene.drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        SceneEvent::ProtagonistHit {
            cause: HitCause::Vehicle,
            ..
        }
    )));
    assert!(!scene.protagonist().present(), "999 damage should despawn");
}

/// Pursuers that cannot reach or see the protagonist settle into the
/// patrol cycle instead of chasing forever.
#[test]
fn unreachable_protagonist_ends_in_patrol() {
    // A wall splits the map; protagonist and pursuer on opposite sides.
    let grid = FlagGrid::parse(&[
        "....#....", //
        "....#....", //
        "....#....", //
        "....#....", //
        "....#....",
    ])
    .unwrap();
    let mut scene = Scene::builder(grid)
        .seed(17)
        .protagonist_at(Vec2::new(7.5, 2.5))
        .build()
        .unwrap();
    scene.spawn_pursuer(Vec2::new(1.5, 2.5));

    // Give-up (2s) plus a capped retreat (4s) fits well inside 10s.
    for _ in 0..500 {
        scene.tick(0.02);
    }
    let pursuer = &scene.pursuers()[0];
    assert!(
        !matches!(
            pursuer.state(),
            getaway_core::PursuerState::Pursuing
        ),
        "pursuer is still chasing an unreachable protagonist"
    );
    assert!(
        pursuer.tile().x < 4,
        "pursuer crossed a solid wall to {:?}",
        pursuer.tile()
    );
}
