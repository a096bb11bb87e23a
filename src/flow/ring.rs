use crate::shared::GameState;

/// The cyclic phase sequence. Advancing past the last state wraps to the
/// first; states can be dropped from the loop while the game runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateRing {
    states: Vec<GameState>,
    current: GameState,
}

impl Default for StateRing {
    fn default() -> Self {
        Self {
            states: GameState::ALL.to_vec(),
            current: GameState::MainMenu,
        }
    }
}

impl StateRing {
    pub fn current(&self) -> GameState {
        self.current
    }

    pub fn states(&self) -> &[GameState] {
        &self.states
    }

    pub fn contains(&self, state: GameState) -> bool {
        self.states.contains(&state)
    }

    /// The state `advance` would move to.
    pub fn peek_next(&self) -> GameState {
        match self.states.iter().position(|&s| s == self.current) {
            Some(i) if i + 1 < self.states.len() => self.states[i + 1],
            // Past the tail, or the current state was dropped from the ring.
            _ => self.states.first().copied().unwrap_or(self.current),
        }
    }

    pub fn advance(&mut self) -> GameState {
        self.current = self.peek_next();
        self.current
    }

    /// Drop `state` from the loop. The current state may be removed; the next
    /// advance then lands on the first remaining state.
    pub fn remove(&mut self, state: GameState) -> bool {
        let before = self.states.len();
        self.states.retain(|&s| s != state);
        self.states.len() != before
    }

    /// Restore every state and park on the last, so the next advance lands on
    /// the first (the main menu).
    pub fn rebuild(&mut self) {
        self.states = GameState::ALL.to_vec();
        self.current = GameState::ALL[GameState::ALL.len() - 1];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_main_menu() {
        let ring = StateRing::default();
        assert_eq!(ring.current(), GameState::MainMenu);
        assert_eq!(ring.states().len(), 5);
    }

    #[test]
    fn test_full_ring_wraps() {
        let mut ring = StateRing::default();
        let visited: Vec<_> = (0..6).map(|_| ring.advance()).collect();
        assert_eq!(
            visited,
            vec![
                GameState::Baking,
                GameState::Results,
                GameState::Upgrades,
                GameState::Calendar,
                GameState::MainMenu,
                GameState::Baking,
            ]
        );
    }

    #[test]
    fn test_removed_menu_is_never_revisited() {
        let mut ring = StateRing::default();
        assert!(ring.remove(GameState::MainMenu));
        assert_eq!(ring.advance(), GameState::Baking);
        for _ in 0..3 {
            assert_eq!(ring.advance(), GameState::Results);
            assert_eq!(ring.advance(), GameState::Upgrades);
            assert_eq!(ring.advance(), GameState::Calendar);
            assert_eq!(ring.advance(), GameState::Baking);
        }
    }

    #[test]
    fn test_practice_loop() {
        let mut ring = StateRing::default();
        ring.remove(GameState::MainMenu);
        ring.remove(GameState::Calendar);
        ring.remove(GameState::Upgrades);
        assert_eq!(ring.advance(), GameState::Baking);
        assert_eq!(ring.advance(), GameState::Results);
        assert_eq!(ring.advance(), GameState::Baking);
    }

    #[test]
    fn test_remove_missing_state_is_noop() {
        let mut ring = StateRing::default();
        ring.remove(GameState::Calendar);
        assert!(!ring.remove(GameState::Calendar));
        assert_eq!(ring.states().len(), 4);
    }

    #[test]
    fn test_rebuild_returns_to_menu() {
        let mut ring = StateRing::default();
        ring.remove(GameState::MainMenu);
        ring.remove(GameState::Upgrades);
        ring.advance();
        ring.rebuild();
        assert_eq!(ring.current(), GameState::Calendar);
        assert_eq!(ring.peek_next(), GameState::MainMenu);
        assert_eq!(ring.advance(), GameState::MainMenu);
    }
}
