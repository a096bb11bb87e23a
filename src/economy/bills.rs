use crate::shared::*;
use crate::stats::PlayerStats;

/// Put everything in the till towards the debt. Nothing happens with less
/// than one coin. Returns the amount paid.
pub fn pay_bills(stats: &mut PlayerStats) -> Option<f32> {
    let money = stats.get(PlayerTracking::Money);
    if money < 1.0 {
        return None;
    }
    stats.modify(PlayerTracking::Debt, -money);
    stats.set(PlayerTracking::Money, 0.0);
    Some(money)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(money: f32, debt: f32) -> PlayerStats {
        PlayerStats::with_stats([(PlayerTracking::Money, money), (PlayerTracking::Debt, debt)])
    }

    #[test]
    fn test_pays_everything() {
        let mut s = stats(120.5, 1000.0);
        assert_eq!(pay_bills(&mut s), Some(120.5));
        assert_eq!(s.get(PlayerTracking::Money), 0.0);
        assert_eq!(s.get(PlayerTracking::Debt), 879.5);
    }

    #[test]
    fn test_under_one_coin_pays_nothing() {
        let mut s = stats(0.5, 1000.0);
        assert_eq!(pay_bills(&mut s), None);
        assert_eq!(s.get(PlayerTracking::Money), 0.5);
        assert_eq!(s.get(PlayerTracking::Debt), 1000.0);
    }

    #[test]
    fn test_debt_can_go_negative() {
        let mut s = stats(50.0, 20.0);
        pay_bills(&mut s);
        assert_eq!(s.get(PlayerTracking::Debt), -30.0);
    }
}
