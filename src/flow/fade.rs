use bevy::prelude::*;

/// Full-screen fade level the host draws over everything. Purely visual: the
/// flow's timing comes from its transition, not from this value.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct ScreenFade {
    /// Current opacity 0.0 (transparent) to 1.0 (opaque black)
    pub alpha: f32,
    pub target_alpha: f32,
    /// Alpha units per second
    pub speed: f32,
    pub active: bool,
}

impl Default for ScreenFade {
    fn default() -> Self {
        Self {
            alpha: 0.0,
            target_alpha: 0.0,
            speed: 2.0,
            active: false,
        }
    }
}

impl ScreenFade {
    /// Reach `target` over `duration` seconds; zero snaps immediately.
    pub fn fade_to(&mut self, target: f32, duration: f32) {
        self.target_alpha = target.clamp(0.0, 1.0);
        if duration <= 0.0 {
            self.alpha = self.target_alpha;
            self.active = false;
            return;
        }
        self.speed = ((self.target_alpha - self.alpha).abs() / duration).max(f32::EPSILON);
        self.active = true;
    }

    pub fn step(&mut self, dt: f32) {
        if !self.active {
            return;
        }

        let diff = self.target_alpha - self.alpha;
        let step = self.speed * dt;
        if diff.abs() <= step {
            self.alpha = self.target_alpha;
            self.active = false;
        } else {
            self.alpha = (self.alpha + diff.signum() * step).clamp(0.0, 1.0);
        }
    }

    pub fn is_opaque(&self) -> bool {
        self.alpha >= 1.0
    }
}

/// Fades run on real time so they keep going while the game is paused.
pub fn update_fade(time: Res<Time<Real>>, mut fade: ResMut<ScreenFade>) {
    fade.step(time.delta_secs());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fade_reaches_target_in_duration() {
        let mut fade = ScreenFade::default();
        fade.fade_to(1.0, 0.5);
        fade.step(0.25);
        assert!((fade.alpha - 0.5).abs() < 1e-5);
        fade.step(0.25);
        assert!(fade.is_opaque());
        assert!(!fade.active);
    }

    #[test]
    fn test_zero_duration_snaps() {
        let mut fade = ScreenFade::default();
        fade.fade_to(1.0, 0.0);
        assert_eq!(fade.alpha, 1.0);
        fade.fade_to(0.0, 0.0);
        assert_eq!(fade.alpha, 0.0);
    }

    #[test]
    fn test_inactive_fade_does_not_move() {
        let mut fade = ScreenFade::default();
        fade.step(10.0);
        assert_eq!(fade.alpha, 0.0);
    }
}
