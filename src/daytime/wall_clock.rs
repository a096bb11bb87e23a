//! Display-only wall time ("7:00 AM") that the in-game day is drawn against.

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Minutes past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct WallClock {
    minutes: u32,
}

impl WallClock {
    pub fn from_hm(hour: u32, minute: u32) -> Self {
        Self {
            minutes: (hour * 60 + minute) % MINUTES_PER_DAY,
        }
    }

    /// Accepts "7:00 AM", "07:00 pm", "19:30" and "7 AM".
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let upper = text.to_ascii_uppercase();
        let (clock, meridiem) = if let Some(rest) = upper.strip_suffix("AM") {
            (rest.trim_end(), Some(false))
        } else if let Some(rest) = upper.strip_suffix("PM") {
            (rest.trim_end(), Some(true))
        } else {
            (upper.as_str(), None)
        };

        let (hour, minute) = match clock.split_once(':') {
            Some((h, m)) => (h.trim().parse::<u32>().ok()?, m.trim().parse::<u32>().ok()?),
            None => (clock.trim().parse::<u32>().ok()?, 0),
        };
        if minute >= 60 {
            return None;
        }

        let hour = match meridiem {
            Some(pm) => {
                if hour == 0 || hour > 12 {
                    return None;
                }
                (hour % 12) + if pm { 12 } else { 0 }
            }
            None if hour < 24 => hour,
            None => return None,
        };
        Some(Self::from_hm(hour, minute))
    }

    pub fn hour(&self) -> u32 {
        self.minutes / 60
    }

    pub fn minute(&self) -> u32 {
        self.minutes % 60
    }

    /// Wraps past midnight.
    pub fn add_minutes(&self, minutes: u32) -> Self {
        Self {
            minutes: (self.minutes + minutes % MINUTES_PER_DAY) % MINUTES_PER_DAY,
        }
    }

    /// "19:05"
    pub fn format_24h(&self) -> String {
        format!("{:02}:{:02}", self.hour(), self.minute())
    }

    /// "07:05 PM"
    pub fn format_12h(&self) -> String {
        let hour = match self.hour() % 12 {
            0 => 12,
            h => h,
        };
        let meridiem = if self.hour() < 12 { "AM" } else { "PM" };
        format!("{:02}:{:02} {}", hour, self.minute(), meridiem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_meridiem() {
        assert_eq!(WallClock::parse("7:00 AM"), Some(WallClock::from_hm(7, 0)));
        assert_eq!(WallClock::parse("12:15 am"), Some(WallClock::from_hm(0, 15)));
        assert_eq!(WallClock::parse("12:00 PM"), Some(WallClock::from_hm(12, 0)));
        assert_eq!(WallClock::parse("7 pm"), Some(WallClock::from_hm(19, 0)));
    }

    #[test]
    fn test_parse_24h() {
        assert_eq!(WallClock::parse("19:30"), Some(WallClock::from_hm(19, 30)));
        assert_eq!(WallClock::parse(" 0:05 "), Some(WallClock::from_hm(0, 5)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(WallClock::parse(""), None);
        assert_eq!(WallClock::parse("noon"), None);
        assert_eq!(WallClock::parse("13:00 PM"), None);
        assert_eq!(WallClock::parse("24:00"), None);
        assert_eq!(WallClock::parse("7:60"), None);
    }

    #[test]
    fn test_formatting() {
        let t = WallClock::from_hm(19, 5);
        assert_eq!(t.format_24h(), "19:05");
        assert_eq!(t.format_12h(), "07:05 PM");
        assert_eq!(WallClock::from_hm(0, 0).format_12h(), "12:00 AM");
    }

    #[test]
    fn test_add_minutes_wraps() {
        let t = WallClock::from_hm(23, 30).add_minutes(45);
        assert_eq!((t.hour(), t.minute()), (0, 15));
    }
}
