//! Host side of scene loading for runs without a real scene graph.

use bevy::prelude::*;

use crate::shared::*;

/// Activates every requested scene on the frame it is asked for.
pub struct InstantSceneLoaderPlugin;

impl Plugin for InstantSceneLoaderPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<SceneLoadRequested>()
            .add_event::<SceneActivated>()
            .add_systems(Update, activate_requested_scenes);
    }
}

fn activate_requested_scenes(
    mut requests: EventReader<SceneLoadRequested>,
    mut activated: EventWriter<SceneActivated>,
) {
    for req in requests.read() {
        debug!("[Host] Activating {}", req.scene);
        activated.send(SceneActivated {
            scene: req.scene.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_is_answered_once() {
        let mut app = App::new();
        app.add_plugins(InstantSceneLoaderPlugin);
        app.world_mut().send_event(SceneLoadRequested {
            scene: PLAY_SCENE.into(),
        });
        app.update();

        let events = app.world().resource::<Events<SceneActivated>>();
        let mut reader = events.get_cursor();
        let scenes: Vec<_> = reader.read(events).map(|e| e.scene.clone()).collect();
        assert_eq!(scenes, vec![PLAY_SCENE.to_string()]);
    }
}
