use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use survival::game::config::InitialConfig;
use survival::game::simulation::{InputEvent, MoveKey, Stage};
use survival::game::GamePlugin;

fn headless_app() -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.add_plugins(AssetPlugin::default());
    app.add_plugins(GamePlugin);
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(50)));
    app
}

#[test]
fn test_plugin_builds_stage_at_startup() {
    let mut app = headless_app();
    app.update();

    assert!(app.world().contains_resource::<InitialConfig>());
    let stage = app.world().get_resource::<Stage>().expect("stage is built on startup");
    assert_eq!(stage.roster().len(), 1, "Only the player exists before the first frame");
}

#[test]
fn test_fixed_update_steps_stage() {
    let mut app = headless_app();
    for _ in 0..10 {
        app.update();
    }

    let stage = app.world().resource::<Stage>();
    assert!(stage.tick() > 0, "Fixed timestep should have run");
    assert!(stage.gametime() > 0.0);
}

#[test]
fn test_input_messages_reach_the_player() {
    let mut app = headless_app();
    app.update();

    let player = app.world().resource::<Stage>().player();
    let start = app.world().resource::<Stage>().actor(player).unwrap().center().unwrap();

    app.world_mut().write_message(InputEvent::KeyDown(MoveKey::Down));
    for _ in 0..10 {
        app.update();
    }

    let now = app.world().resource::<Stage>().actor(player).unwrap().center().unwrap();
    assert!(now.y > start.y, "Player should walk down: {:?} -> {:?}", start, now);
}
