//! Weekday recurrence set.
//!
//! # Responsibility
//! - Represent the subset of weekdays on which a reminder repeats.
//! - Convert to and from the comma-joined tag list (`"Mon,Wed"`) used in
//!   storage and on the wire.
//!
//! # Invariants
//! - Insertion order is irrelevant; iteration always runs Sun..Sat.
//! - Unknown tags are dropped while parsing, never rejected.

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

const WEEKDAYS_FROM_SUNDAY: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

/// Set of weekdays a reminder repeats on. Empty means one-shot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct RecurrenceDays {
    mask: u8,
}

impl RecurrenceDays {
    /// Returns the empty (one-shot) set.
    pub const fn none() -> Self {
        Self { mask: 0 }
    }

    /// Returns a set containing all seven weekdays.
    pub const fn every_day() -> Self {
        Self { mask: 0b0111_1111 }
    }

    /// Builds a set from any iterator of weekdays; duplicates collapse.
    pub fn from_days(days: impl IntoIterator<Item = Weekday>) -> Self {
        let mut set = Self::none();
        for day in days {
            set.insert(day);
        }
        set
    }

    /// Parses a comma-joined tag list such as `"Sun,Wed"`.
    ///
    /// Tags are matched case-insensitively after trimming. Unrecognized
    /// tags are skipped, so a fully malformed list yields the empty set.
    pub fn parse_tags(value: &str) -> Self {
        Self::from_days(value.split(',').filter_map(parse_day_tag))
    }

    pub fn insert(&mut self, day: Weekday) {
        self.mask |= bit(day);
    }

    pub fn remove(&mut self, day: Weekday) {
        self.mask &= !bit(day);
    }

    /// Adds `day` when absent, removes it when present. Mirrors day-chip
    /// selection in editors.
    pub fn toggle(&mut self, day: Weekday) {
        self.mask ^= bit(day);
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.mask & bit(day) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.mask == 0
    }

    pub fn len(&self) -> usize {
        self.mask.count_ones() as usize
    }

    /// Iterates members in Sun..Sat order.
    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        WEEKDAYS_FROM_SUNDAY
            .into_iter()
            .filter(move |day| self.contains(*day))
    }

    /// Renders the comma-joined tag list (`""` for the empty set).
    pub fn to_tags(&self) -> String {
        self.iter().map(day_tag).collect::<Vec<_>>().join(",")
    }
}

impl Display for RecurrenceDays {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_tags())
    }
}

impl From<String> for RecurrenceDays {
    fn from(value: String) -> Self {
        Self::parse_tags(&value)
    }
}

impl From<RecurrenceDays> for String {
    fn from(value: RecurrenceDays) -> Self {
        value.to_tags()
    }
}

impl FromIterator<Weekday> for RecurrenceDays {
    fn from_iter<T: IntoIterator<Item = Weekday>>(iter: T) -> Self {
        Self::from_days(iter)
    }
}

/// Short English tag for a weekday (`Sun`..`Sat`).
pub fn day_tag(day: Weekday) -> &'static str {
    match day {
        Weekday::Sun => "Sun",
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
    }
}

fn parse_day_tag(value: &str) -> Option<Weekday> {
    match value.trim().to_ascii_lowercase().as_str() {
        "sun" => Some(Weekday::Sun),
        "mon" => Some(Weekday::Mon),
        "tue" => Some(Weekday::Tue),
        "wed" => Some(Weekday::Wed),
        "thu" => Some(Weekday::Thu),
        "fri" => Some(Weekday::Fri),
        "sat" => Some(Weekday::Sat),
        _ => None,
    }
}

fn bit(day: Weekday) -> u8 {
    1 << day.num_days_from_sunday()
}

#[cfg(test)]
mod tests {
    use super::RecurrenceDays;
    use chrono::Weekday;

    #[test]
    fn parse_tags_ignores_order_case_and_unknown_values() {
        let days = RecurrenceDays::parse_tags("wed, Mon,Funday,,MON");
        assert_eq!(days.len(), 2);
        assert!(days.contains(Weekday::Mon));
        assert!(days.contains(Weekday::Wed));
        assert_eq!(days.to_tags(), "Mon,Wed");
    }

    #[test]
    fn malformed_list_is_empty() {
        assert!(RecurrenceDays::parse_tags("").is_empty());
        assert!(RecurrenceDays::parse_tags("Someday,Never").is_empty());
    }

    #[test]
    fn toggle_adds_then_removes() {
        let mut days = RecurrenceDays::none();
        days.toggle(Weekday::Fri);
        assert!(days.contains(Weekday::Fri));
        days.toggle(Weekday::Fri);
        assert!(days.is_empty());
    }

    #[test]
    fn every_day_iterates_from_sunday() {
        let tags = RecurrenceDays::every_day().to_tags();
        assert_eq!(tags, "Sun,Mon,Tue,Wed,Thu,Fri,Sat");
    }

    #[test]
    fn serializes_as_tag_string() {
        let days = RecurrenceDays::from_days([Weekday::Sat, Weekday::Sun]);
        let json = serde_json::to_value(days).unwrap();
        assert_eq!(json, "Sun,Sat");

        let decoded: RecurrenceDays = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, days);
    }
}
