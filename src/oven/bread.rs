//! A single loaf and how it is judged once it comes out of the oven.

use std::collections::BTreeMap;

use crate::shared::BreadType;

/// Highest rolling stage a dough can reach.
pub const MAX_ROLLING_STAGE: f32 = 3.0;
pub const IDEAL_ROLLING_STAGE: f32 = 2.0;
pub const IDEAL_SLASH_COUNT: u32 = 3;
pub const QUALITY_PENALTY: f32 = 1.0;
/// Overcook minutes beyond which a loaf is burnt.
pub const OVERCOOK_THRESHOLD: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreadEvaluation {
    pub bread: BreadType,
    pub quality: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bread {
    rolling_stage: f32,
    slashes: u32,
    ingredients: BTreeMap<BreadType, u32>,
    overcook: u32,
}

impl Bread {
    pub fn rolling_stage(&self) -> f32 {
        self.rolling_stage
    }

    pub fn slashes(&self) -> u32 {
        self.slashes
    }

    pub fn overcook(&self) -> u32 {
        self.overcook
    }

    pub fn is_burnt(&self) -> bool {
        self.overcook > OVERCOOK_THRESHOLD
    }

    pub fn roll(&mut self, amount: f32) {
        self.rolling_stage = (self.rolling_stage + amount).min(MAX_ROLLING_STAGE);
    }

    pub fn slash(&mut self) {
        self.slashes += 1;
    }

    /// Plain dough is not an ingredient and is ignored.
    pub fn add_ingredient(&mut self, ingredient: BreadType) {
        if ingredient == BreadType::Normal {
            return;
        }
        *self.ingredients.entry(ingredient).or_default() += 1;
    }

    pub fn ingredient_count(&self, ingredient: BreadType) -> u32 {
        self.ingredients.get(&ingredient).copied().unwrap_or(0)
    }

    pub fn set_overcook(&mut self, minutes: u32) {
        self.overcook = minutes;
    }

    pub fn evaluate(&self) -> BreadEvaluation {
        let quality = if self.is_burnt() {
            -QUALITY_PENALTY
        } else {
            let rolling = inaccuracy(IDEAL_ROLLING_STAGE, self.rolling_stage.trunc(), 1.0);
            let slashes = inaccuracy(IDEAL_SLASH_COUNT as f32, self.slashes as f32, 1.5);
            1.0 - rolling - slashes * QUALITY_PENALTY
        };

        // Ties keep the earlier type.
        let mut bread = BreadType::Normal;
        let mut highest = 0;
        for ingredient in BreadType::INGREDIENTS {
            let count = self.ingredient_count(ingredient);
            if count > highest {
                highest = count;
                bread = ingredient;
            }
        }

        BreadEvaluation { bread, quality }
    }
}

fn inaccuracy(goal: f32, value: f32, cap: f32) -> f32 {
    ((goal - value).abs() / goal).clamp(0.0, cap)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bread(rolling: f32, slashes: u32) -> Bread {
        let mut bread = Bread::default();
        bread.roll(rolling);
        for _ in 0..slashes {
            bread.slash();
        }
        bread
    }

    #[test]
    fn test_ideal_bread_scores_one() {
        let eval = bread(2.0, 3).evaluate();
        assert_eq!(eval.quality, 1.0);
        assert_eq!(eval.bread, BreadType::Normal);
    }

    #[test]
    fn test_rolling_is_truncated_and_capped() {
        // 2.9 truncates to 2.
        assert_eq!(bread(2.9, 3).evaluate().quality, 1.0);
        let mut over = Bread::default();
        over.roll(10.0);
        assert_eq!(over.rolling_stage(), MAX_ROLLING_STAGE);
        assert_eq!(bread(1.0, 3).evaluate().quality, 0.5);
    }

    #[test]
    fn test_untouched_dough() {
        // Rolling off by 1.0 (capped), slashes off by 1.0.
        assert_eq!(Bread::default().evaluate().quality, -1.0);
    }

    #[test]
    fn test_slash_penalty_caps() {
        // |3 - 9| / 3 = 2, capped at 1.5.
        assert_eq!(bread(2.0, 9).evaluate().quality, -0.5);
    }

    #[test]
    fn test_burnt_bread() {
        let mut loaf = bread(2.0, 3);
        loaf.set_overcook(20);
        assert_eq!(loaf.evaluate().quality, 1.0);
        loaf.set_overcook(21);
        assert!(loaf.is_burnt());
        assert_eq!(loaf.evaluate().quality, -QUALITY_PENALTY);
    }

    #[test]
    fn test_bread_type_from_ingredients() {
        let mut loaf = Bread::default();
        loaf.add_ingredient(BreadType::Normal);
        assert_eq!(loaf.evaluate().bread, BreadType::Normal);

        loaf.add_ingredient(BreadType::Sesame);
        loaf.add_ingredient(BreadType::Chocolate);
        // Tie: the earlier type wins.
        assert_eq!(loaf.evaluate().bread, BreadType::Sesame);

        loaf.add_ingredient(BreadType::Chocolate);
        assert_eq!(loaf.evaluate().bread, BreadType::Chocolate);
        assert_eq!(loaf.ingredient_count(BreadType::Normal), 0);
    }
}
