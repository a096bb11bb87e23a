//! Flow domain: which phase of the day the game is in, and how it moves on.
//!
//! The phases form a ring (MainMenu → Baking → Results → Upgrades → Calendar →
//! Baking …). Moving along it is always the same dance:
//! 1. `StateEnd(old)` is emitted and the screen starts fading to black
//! 2. after the fade and a short hold, wait for the target scene if one was
//!    requested (the host answers `SceneLoadRequested` with `SceneActivated`)
//! 3. the ring advances, `StateStart(new)` is emitted and the screen fades in
//!
//! The main menu drops out of the ring the first time it is left, and comes
//! back only when the title scene is loaded again.
//!
//! A transition that is cancelled, or whose scene never arrives, puts the ring
//! back as it was and emits `StateStart` for the phase that was left.

pub mod fade;
pub mod ring;
pub mod transition;

use bevy::prelude::*;

use crate::shared::*;
pub use fade::ScreenFade;
pub use ring::StateRing;
pub use transition::{Phase, Transition, TransitionStep};

#[derive(Resource, Debug, Clone)]
pub struct Flow {
    ring: StateRing,
    transition: Transition,
    fade_time: f32,
    target_scene: Option<String>,
    active_scene: Option<String>,
    /// A scene load goes out once the current fade out completes.
    pending_load: bool,
    /// The ring as it was when the running transition began.
    ring_before: Option<StateRing>,
    paused: bool,
}

impl Flow {
    pub fn new(fade_time: f32, fade_delay: f32, scene_wait_timeout: Option<f32>) -> Self {
        Self {
            ring: StateRing::default(),
            transition: Transition::new(fade_time, fade_delay, scene_wait_timeout),
            fade_time,
            target_scene: None,
            active_scene: Some(MAIN_MENU_SCENE.to_string()),
            pending_load: false,
            ring_before: None,
            paused: false,
        }
    }

    pub fn current_state(&self) -> GameState {
        self.ring.current()
    }

    pub fn ring(&self) -> &StateRing {
        &self.ring
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_busy()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn active_scene(&self) -> Option<&str> {
        self.active_scene.as_deref()
    }

    pub fn in_target_scene(&self) -> bool {
        match &self.target_scene {
            None => true,
            Some(target) => self.active_scene.as_ref() == Some(target),
        }
    }
}

/// Handle of the one-shot listener that drops the main menu from the ring.
#[derive(Resource, Debug, Default)]
pub struct MenuExitHook {
    listener: Option<ListenerId>,
}

pub struct FlowPlugin;

impl Plugin for FlowPlugin {
    fn build(&self, app: &mut App) {
        let config = crate::data::config(app);
        app.insert_resource(Flow::new(
            config.fade_time,
            config.fade_delay,
            config.scene_wait_timeout,
        ))
        .init_resource::<ScreenFade>()
        .init_resource::<MenuExitHook>()
        .init_resource::<PracticeMode>()
        .add_event::<SceneLoadRequested>()
        .add_event::<SceneActivated>()
        .add_signal::<StateStart>()
        .add_signal::<StateEnd>()
        .add_signal::<GamePaused>()
        .add_signal::<GameResumed>()
        .subscribe(rearm_menu_exit_hook)
        .subscribe(end_day_on_overtime)
        .add_systems(
            Update,
            (track_active_scene, drive_transition, fade::update_fade).chain(),
        );

        arm_menu_exit_hook(app.world_mut());
    }
}

// ─── Transition control ──────────────────────────────────────────────────────

/// Move to the next phase. Ignored (with a warning) while another transition
/// is still fading out or waiting.
pub fn progress(world: &mut World) -> bool {
    let ring = world.resource::<Flow>().ring.clone();
    progress_from(world, ring)
}

/// `ring_before` is the ring before any change made for this transition.
fn progress_from(world: &mut World, ring_before: StateRing) -> bool {
    let leaving = ring_before.current();
    let fade_time = {
        let mut flow = world.resource_mut::<Flow>();
        if !flow.transition.begin() {
            warn!(
                "[Flow] Progress from {:?} ignored: a transition is already running",
                leaving
            );
            return false;
        }
        flow.ring_before = Some(ring_before);
        flow.fade_time
    };

    info!("[Flow] Leaving {:?}", leaving);
    emit(world, StateEnd(leaving));
    world.resource_mut::<ScreenFade>().fade_to(1.0, fade_time);
    true
}

/// Switch to `scene` and progress. Loading the title scene brings the whole
/// ring back (next stop: the main menu); loading the play scene in practice
/// mode skips the upgrade and calendar phases.
pub fn load_scene(world: &mut World, scene: &str) -> bool {
    let practice = world
        .get_resource::<PracticeMode>()
        .is_some_and(|mode| mode.active);

    let ring_before = {
        let mut flow = world.resource_mut::<Flow>();
        if flow.transition.is_busy() {
            warn!("[Flow] Load of {} ignored: a transition is already running", scene);
            return false;
        }
        let ring_before = flow.ring.clone();
        flow.target_scene = Some(scene.to_string());
        if scene == MAIN_MENU_SCENE {
            flow.ring.rebuild();
        } else if scene == PLAY_SCENE && practice {
            flow.ring.remove(GameState::Calendar);
            flow.ring.remove(GameState::Upgrades);
        }
        flow.pending_load = true;
        ring_before
    };

    info!("[Flow] Loading scene {}", scene);
    progress_from(world, ring_before)
}

/// Give up on the running transition: no scene is loaded, the ring goes back
/// to how it was and the phase that was left starts again. Returns false if
/// nothing was running.
pub fn cancel_transition(world: &mut World) -> bool {
    {
        let mut flow = world.resource_mut::<Flow>();
        if !flow.transition.is_busy() {
            return false;
        }
        flow.transition.cancel();
    }
    info!("[Flow] Transition cancelled");
    abandon_transition(world);
    true
}

fn abandon_transition(world: &mut World) {
    let (state, fade_time) = {
        let mut flow = world.resource_mut::<Flow>();
        if let Some(ring) = flow.ring_before.take() {
            flow.ring = ring;
        } else {
            warn!("[Flow] No ring saved for the abandoned transition");
        }
        // A late answer for the abandoned scene must not hold up later moves.
        flow.target_scene = None;
        flow.pending_load = false;
        (flow.current_state(), flow.fade_time)
    };
    info!("[Flow] Back in {:?}", state);
    emit(world, StateStart(state));
    world.resource_mut::<ScreenFade>().fade_to(0.0, fade_time);
}

pub fn pause_game(world: &mut World) {
    let state = {
        let mut flow = world.resource_mut::<Flow>();
        if flow.paused {
            return;
        }
        flow.paused = true;
        flow.current_state()
    };
    world.resource_mut::<Time<Virtual>>().pause();
    info!("[Flow] Paused in {:?}", state);
    emit(world, GamePaused(state));
}

pub fn resume_game(world: &mut World) {
    let state = {
        let mut flow = world.resource_mut::<Flow>();
        if !flow.paused {
            return;
        }
        flow.paused = false;
        flow.current_state()
    };
    world.resource_mut::<Time<Virtual>>().unpause();
    info!("[Flow] Resumed in {:?}", state);
    emit(world, GameResumed(state));
}

/// Flow control from systems that only hold `Commands`.
pub trait FlowCommandsExt {
    fn progress_flow(&mut self);
    fn load_scene(&mut self, scene: impl Into<String>);
    fn cancel_transition(&mut self);
    fn pause_game(&mut self);
    fn resume_game(&mut self);
}

impl FlowCommandsExt for Commands<'_, '_> {
    fn progress_flow(&mut self) {
        self.queue(|world: &mut World| {
            progress(world);
        });
    }

    fn load_scene(&mut self, scene: impl Into<String>) {
        let scene = scene.into();
        self.queue(move |world: &mut World| {
            load_scene(world, &scene);
        });
    }

    fn cancel_transition(&mut self) {
        self.queue(|world: &mut World| {
            cancel_transition(world);
        });
    }

    fn pause_game(&mut self) {
        self.queue(pause_game);
    }

    fn resume_game(&mut self) {
        self.queue(resume_game);
    }
}

// ─── Systems ─────────────────────────────────────────────────────────────────

fn track_active_scene(mut events: EventReader<SceneActivated>, mut flow: ResMut<Flow>) {
    for ev in events.read() {
        debug!("[Flow] Active scene is now {}", ev.scene);
        flow.active_scene = Some(ev.scene.clone());
    }
}

/// Polls the running transition with real time, so fades and waits continue
/// while the game is paused.
pub fn drive_transition(world: &mut World) {
    let dt = world.resource::<Time<Real>>().delta_secs();
    let steps = {
        let mut flow = world.resource_mut::<Flow>();
        let in_target = flow.in_target_scene();
        flow.transition.poll(dt, in_target)
    };

    for step in steps {
        match step {
            TransitionStep::FadeOutComplete => {
                let request = {
                    let mut flow = world.resource_mut::<Flow>();
                    if flow.pending_load {
                        flow.pending_load = false;
                        flow.target_scene.clone()
                    } else {
                        None
                    }
                };
                if let Some(scene) = request {
                    world.send_event(SceneLoadRequested { scene });
                }
            }
            TransitionStep::Advance => {
                let (state, fade_time) = {
                    let mut flow = world.resource_mut::<Flow>();
                    flow.ring_before = None;
                    (flow.ring.advance(), flow.fade_time)
                };
                info!("[Flow] Entering {:?}", state);
                emit(world, StateStart(state));
                world.resource_mut::<ScreenFade>().fade_to(0.0, fade_time);
            }
            TransitionStep::TimedOut => {
                warn!(
                    "[Flow] Scene {:?} never became active",
                    world.resource::<Flow>().target_scene
                );
                abandon_transition(world);
            }
            TransitionStep::FadeInComplete => {
                debug!("[Flow] Fade in complete");
            }
        }
    }
}

// ─── Listeners ───────────────────────────────────────────────────────────────

fn arm_menu_exit_hook(world: &mut World) {
    if world.resource::<MenuExitHook>().listener.is_some() {
        return;
    }
    let id = subscribe(world, drop_menu_on_exit);
    world.resource_mut::<MenuExitHook>().listener = Some(id);
}

/// The menu is not part of the daily loop: drop it once it is left, then
/// stop listening until the menu is entered again.
fn drop_menu_on_exit(
    In(StateEnd(state)): In<StateEnd>,
    mut flow: ResMut<Flow>,
    mut hook: ResMut<MenuExitHook>,
    mut commands: Commands,
) {
    if state != GameState::MainMenu {
        return;
    }
    flow.ring.remove(GameState::MainMenu);
    if let Some(id) = hook.listener.take() {
        commands.queue(move |world: &mut World| unsubscribe::<StateEnd>(world, id));
    }
}

fn rearm_menu_exit_hook(In(StateStart(state)): In<StateStart>, mut commands: Commands) {
    if state == GameState::MainMenu {
        commands.queue(arm_menu_exit_hook);
    }
}

fn end_day_on_overtime(In(_): In<OvertimeEnded>, mut commands: Commands) {
    commands.progress_flow();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_flow_starts_in_menu_scene() {
        let flow = Flow::new(0.5, 0.0, None);
        assert_eq!(flow.current_state(), GameState::MainMenu);
        assert_eq!(flow.active_scene(), Some(MAIN_MENU_SCENE));
        assert!(flow.in_target_scene());
        assert!(!flow.is_transitioning());
        assert!(!flow.is_paused());
    }

    #[test]
    fn test_in_target_scene_tracks_request() {
        let mut flow = Flow::new(0.5, 0.0, None);
        flow.target_scene = Some(PLAY_SCENE.into());
        assert!(!flow.in_target_scene());
        flow.active_scene = Some(PLAY_SCENE.into());
        assert!(flow.in_target_scene());
    }

    fn app() -> App {
        let mut app = App::new();
        app.insert_resource(crate::data::BakeryConfig::default())
            .add_plugins(FlowPlugin);
        app
    }

    #[test]
    fn test_cancel_restores_ring_and_menu_hook() {
        let mut app = app();
        let world = app.world_mut();

        assert!(progress(world));
        assert!(!world.resource::<Flow>().ring().contains(GameState::MainMenu));
        assert!(world.resource::<MenuExitHook>().listener.is_none());

        assert!(cancel_transition(world));
        let flow = world.resource::<Flow>();
        assert!(!flow.is_transitioning());
        assert_eq!(flow.current_state(), GameState::MainMenu);
        assert_eq!(flow.ring().states(), &GameState::ALL);
        // Re-entering the menu armed the hook again.
        assert!(world.resource::<MenuExitHook>().listener.is_some());
        assert!(!cancel_transition(world));
    }

    #[test]
    fn test_cancelled_load_sends_no_scene() {
        let mut app = app();
        let world = app.world_mut();
        world.resource_mut::<PracticeMode>().active = true;

        assert!(load_scene(world, PLAY_SCENE));
        assert!(!world.resource::<Flow>().ring().contains(GameState::Calendar));
        assert!(cancel_transition(world));

        let flow = world.resource::<Flow>();
        assert!(flow.ring().contains(GameState::Calendar));
        assert!(flow.ring().contains(GameState::Upgrades));
        assert!(flow.in_target_scene());
        assert!(!flow.pending_load);
        assert!(world.resource::<Events<SceneLoadRequested>>().is_empty());
    }
}
