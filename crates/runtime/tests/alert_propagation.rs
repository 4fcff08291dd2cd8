use getaway_core::{FlagGrid, SceneEvent, Vec2};
use runtime::Scene;

/// Contact with one pursuer sends every pursuer in the scene into
/// retreat, at most one tick after the contact.
#[test]
fn contact_retreats_every_pursuer() {
    let mut scene = Scene::builder(FlagGrid::new(16, 16))
        .seed(101)
        .pursuers(3)
        .protagonist_at(Vec2::new(8.5, 8.5))
        .build()
        .unwrap();

    // Walk the protagonist onto the first pursuer's tile.
    let target = scene.pursuers()[0].position();
    scene.set_protagonist_position(target);

    scene.tick(0.016);
    let events = scene.drain_events();
    assert!(
        events
            .iter()
            .any(|e| matches!(e, SceneEvent::AlertRaised { .. })),
        "contact should raise the alert"
    );
    assert!(events.contains(&SceneEvent::SirenCue));
    assert_eq!(scene.alert_epoch(), 1);

    // Every pursuer observes the new epoch within one more tick.
    scene.tick(0.016);
    for pursuer in scene.pursuers() {
        assert!(
            pursuer.state().is_retreating(),
            "pursuer at {:?} did not retreat",
            pursuer.tile()
        );
    }
}

/// An alert raised before a pursuer exists must not retreat it.
#[test]
fn late_spawns_ignore_past_alerts() {
    let mut scene = Scene::builder(FlagGrid::new(12, 12))
        .seed(5)
        .pursuers(1)
        .protagonist_at(Vec2::new(6.5, 6.5))
        .build()
        .unwrap();

    let target = scene.pursuers()[0].position();
    scene.set_protagonist_position(target);
    scene.tick(0.016);
    assert_eq!(scene.alert_epoch(), 1);

    scene.spawn_pursuer(Vec2::new(1.5, 1.5));
    scene.set_protagonist_position(Vec2::new(6.5, 6.5));
    scene.tick(0.016);
    let late = scene.pursuers().last().unwrap();
    assert!(
        !late.state().is_retreating(),
        "a fresh spawn reacted to an alert from before it existed"
    );
}
