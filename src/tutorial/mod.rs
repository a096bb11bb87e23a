//! Tutorial domain: practice mode.
//!
//! A first-time player is sent into practice: the play scene without the
//! upgrade and calendar phases, on a day that never runs out of time. Leaving
//! for the title scene ends practice.

use bevy::prelude::*;

use crate::daytime::DayClock;
use crate::flow::{Flow, FlowCommandsExt};
use crate::shared::*;

/// Play pressed on the main menu. `practice` is the dedicated practice button.
#[derive(Event, Debug, Clone, Copy, Default)]
pub struct PlayRequested {
    pub practice: bool,
}

pub struct TutorialPlugin;

impl Plugin for TutorialPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PracticeMode>()
            .init_resource::<Preferences>()
            .add_event::<PlayRequested>()
            .subscribe(rewind_practice_hour)
            .subscribe(leave_practice_on_menu)
            .add_systems(Update, handle_play_request);
    }
}

pub fn handle_play_request(
    mut requests: EventReader<PlayRequested>,
    mut practice: ResMut<PracticeMode>,
    mut prefs: ResMut<Preferences>,
    flow: Res<Flow>,
    mut commands: Commands,
) {
    for req in requests.read() {
        if flow.current_state() != GameState::MainMenu || flow.is_transitioning() {
            debug!("[Tutorial] Play ignored outside the main menu");
            continue;
        }
        if req.practice || !prefs.tutorial_done {
            practice.active = true;
            if !prefs.tutorial_done {
                prefs.tutorial_done = true;
            }
            info!("[Tutorial] Starting practice");
        }
        commands.load_scene(PLAY_SCENE);
        // One scene load per frame is plenty.
        break;
    }
    requests.clear();
}

/// The practice day never reaches opening time: every hour winds the clock
/// back to midnight.
fn rewind_practice_hour(
    In(_): In<HourTick>,
    practice: Res<PracticeMode>,
    mut clock: ResMut<DayClock>,
) {
    if practice.active {
        clock.set_time(0, 0);
    }
}

fn leave_practice_on_menu(In(StateStart(state)): In<StateStart>, mut practice: ResMut<PracticeMode>) {
    if state == GameState::MainMenu && practice.active {
        practice.active = false;
        info!("[Tutorial] Practice over");
    }
}
