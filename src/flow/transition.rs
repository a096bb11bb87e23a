//! Polled phase transition: fade out, hold, wait for the scene, fade in.
//!
//! Nothing here touches the world. The owner feeds elapsed real seconds and
//! whether the target scene is active into [`Transition::poll`] and acts on
//! the steps it returns.

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Phase {
    #[default]
    Idle,
    FadingOut {
        remaining: f32,
    },
    Delaying {
        remaining: f32,
    },
    AwaitingScene {
        waited: f32,
    },
    FadingIn {
        remaining: f32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionStep {
    /// The screen is fully covered; a scene swap may happen now.
    FadeOutComplete,
    /// Move the ring forward and announce the new state.
    Advance,
    /// The scene never arrived. The transition gave up without advancing.
    TimedOut,
    FadeInComplete,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Transition {
    phase: Phase,
    fade_time: f32,
    fade_delay: f32,
    scene_wait_timeout: Option<f32>,
}

impl Transition {
    pub fn new(fade_time: f32, fade_delay: f32, scene_wait_timeout: Option<f32>) -> Self {
        Self {
            phase: Phase::Idle,
            fade_time: fade_time.max(0.0),
            fade_delay: fade_delay.max(0.0),
            scene_wait_timeout,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// True from the start of the fade out until the new state is announced.
    /// The trailing fade in does not count.
    pub fn is_busy(&self) -> bool {
        matches!(
            self.phase,
            Phase::FadingOut { .. } | Phase::Delaying { .. } | Phase::AwaitingScene { .. }
        )
    }

    /// Begin fading out. Returns false if a transition is already under way.
    pub fn begin(&mut self) -> bool {
        if self.is_busy() {
            return false;
        }
        self.phase = Phase::FadingOut {
            remaining: self.fade_time,
        };
        true
    }

    /// Abandon any pending wait and fade back in without advancing.
    pub fn cancel(&mut self) {
        if self.is_busy() {
            self.phase = Phase::FadingIn {
                remaining: self.fade_time,
            };
        }
    }

    pub fn poll(&mut self, dt: f32, in_target_scene: bool) -> Vec<TransitionStep> {
        let mut steps = Vec::new();
        let mut dt = dt.max(0.0);

        loop {
            match self.phase {
                Phase::Idle => break,
                Phase::FadingOut { remaining } => {
                    if remaining > dt {
                        self.phase = Phase::FadingOut {
                            remaining: remaining - dt,
                        };
                        break;
                    }
                    dt -= remaining;
                    steps.push(TransitionStep::FadeOutComplete);
                    self.phase = Phase::Delaying {
                        remaining: self.fade_delay,
                    };
                }
                Phase::Delaying { remaining } => {
                    if remaining > dt {
                        self.phase = Phase::Delaying {
                            remaining: remaining - dt,
                        };
                        break;
                    }
                    dt -= remaining;
                    self.phase = Phase::AwaitingScene { waited: 0.0 };
                }
                Phase::AwaitingScene { waited } => {
                    if in_target_scene {
                        steps.push(TransitionStep::Advance);
                        self.phase = Phase::FadingIn {
                            remaining: self.fade_time,
                        };
                        continue;
                    }
                    let waited = waited + dt;
                    if self.scene_wait_timeout.is_some_and(|limit| waited >= limit) {
                        steps.push(TransitionStep::TimedOut);
                        self.phase = Phase::FadingIn {
                            remaining: self.fade_time,
                        };
                    } else {
                        self.phase = Phase::AwaitingScene { waited };
                    }
                    break;
                }
                Phase::FadingIn { remaining } => {
                    if remaining > dt {
                        self.phase = Phase::FadingIn {
                            remaining: remaining - dt,
                        };
                    } else {
                        self.phase = Phase::Idle;
                        steps.push(TransitionStep::FadeInComplete);
                    }
                    break;
                }
            }
        }
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TransitionStep::*;

    #[test]
    fn test_idle_polls_nothing() {
        let mut t = Transition::new(1.0, 0.5, None);
        assert!(t.poll(10.0, true).is_empty());
        assert_eq!(t.phase(), Phase::Idle);
    }

    #[test]
    fn test_full_sequence_in_small_steps() {
        let mut t = Transition::new(1.0, 0.5, None);
        assert!(t.begin());

        assert!(t.poll(0.5, true).is_empty());
        assert_eq!(t.poll(0.5, true), vec![FadeOutComplete]);
        assert!(matches!(t.phase(), Phase::Delaying { .. }));
        assert_eq!(t.poll(0.5, true), vec![Advance]);
        assert!(!t.is_busy());
        assert!(t.poll(0.5, true).is_empty());
        assert_eq!(t.poll(0.5, true), vec![FadeInComplete]);
        assert_eq!(t.phase(), Phase::Idle);
    }

    #[test]
    fn test_zero_durations_fall_through() {
        let mut t = Transition::new(0.0, 0.0, None);
        t.begin();
        assert_eq!(
            t.poll(0.0, true),
            vec![FadeOutComplete, Advance, FadeInComplete]
        );
        assert_eq!(t.phase(), Phase::Idle);
    }

    #[test]
    fn test_waits_for_scene_without_timeout() {
        let mut t = Transition::new(0.0, 0.0, None);
        t.begin();
        assert_eq!(t.poll(0.0, false), vec![FadeOutComplete]);
        for _ in 0..100 {
            assert!(t.poll(10.0, false).is_empty());
        }
        assert!(t.is_busy());
        assert_eq!(t.poll(0.0, true), vec![Advance, FadeInComplete]);
    }

    #[test]
    fn test_scene_wait_times_out() {
        let mut t = Transition::new(0.0, 0.0, Some(2.0));
        t.begin();
        assert_eq!(t.poll(0.0, false), vec![FadeOutComplete]);
        assert!(t.poll(1.5, false).is_empty());
        assert_eq!(t.poll(0.5, false), vec![TimedOut]);
        assert!(!t.is_busy());
    }

    #[test]
    fn test_begin_rejected_while_busy() {
        let mut t = Transition::new(1.0, 0.0, None);
        assert!(t.begin());
        assert!(!t.begin());
        t.poll(1.0, true);
        // Fading back in: a new transition may start.
        assert!(t.begin());
    }

    #[test]
    fn test_cancel_fades_back_without_advancing() {
        let mut t = Transition::new(0.0, 1.0, None);
        t.begin();
        t.poll(0.5, false);
        t.cancel();
        assert!(!t.is_busy());
        assert_eq!(t.poll(0.0, true), vec![FadeInComplete]);
    }
}
