//! Month grid projection.

use std::collections::BTreeMap;

use chrono::{Datelike, Days, NaiveDate};

use crate::availability::AvailabilityCache;
use crate::constants::GRID_CELLS;
use crate::month::{DayStamp, MonthKey};
use crate::namespace::{NamespaceKey, NamespaceSet};
use crate::settings::WeekStart;

/// One cell of the month grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayCell {
    pub day: DayStamp,
    pub day_number: u32,
    pub is_current_month: bool,
    pub is_today: bool,
    /// The day is in the union set. Always false outside the current month.
    pub has_data: bool,
    /// Per named namespace. Empty outside the current month.
    pub has_data_per_namespace: BTreeMap<NamespaceKey, bool>,
}

impl DayCell {
    /// Whether selecting this cell should reach the consumer.
    pub fn is_selectable(&self) -> bool {
        self.is_current_month && self.has_data
    }

    pub fn has_data_in(&self, namespace: &NamespaceKey) -> bool {
        self.has_data_per_namespace
            .get(namespace)
            .copied()
            .unwrap_or(false)
    }
}

/// Turns a month and the availability cache into 42 day cells.
#[derive(Debug, Clone)]
pub struct CalendarGridProjector {
    namespaces: NamespaceSet,
    week_start: WeekStart,
}

impl CalendarGridProjector {
    pub fn new(namespaces: NamespaceSet, week_start: WeekStart) -> Self {
        CalendarGridProjector {
            namespaces,
            week_start,
        }
    }

    pub fn week_start(&self) -> WeekStart {
        self.week_start
    }

    /// Always returns [`GRID_CELLS`] cells; an empty cache simply yields no
    /// data flags.
    pub fn project(&self, month: MonthKey, cache: &AvailabilityCache, today: NaiveDate) -> Vec<DayCell> {
        let snapshot = cache.get(month);
        let first = month.first_day();
        let lead = match self.week_start {
            WeekStart::Sunday => first.weekday().num_days_from_sunday(),
            WeekStart::Monday => first.weekday().num_days_from_monday(),
        };
        let start = first
            .checked_sub_days(Days::new(u64::from(lead)))
            .unwrap_or(first);

        (0..GRID_CELLS as u64)
            .map(|offset| {
                let date = start
                    .checked_add_days(Days::new(offset))
                    .unwrap_or(NaiveDate::MAX);
                let day = DayStamp::from_date(date);
                let is_current_month = month.contains(date);

                let (has_data, has_data_per_namespace) = match (&snapshot, is_current_month) {
                    (Some(snapshot), true) => (
                        snapshot.has_data(&NamespaceKey::union(), &day),
                        self.namespaces
                            .named()
                            .iter()
                            .map(|ns| (ns.clone(), snapshot.has_data(ns, &day)))
                            .collect(),
                    ),
                    (None, true) => (
                        false,
                        self.namespaces
                            .named()
                            .iter()
                            .map(|ns| (ns.clone(), false))
                            .collect(),
                    ),
                    (_, false) => (false, BTreeMap::new()),
                };

                DayCell {
                    day,
                    day_number: date.day(),
                    is_current_month,
                    is_today: date == today,
                    has_data,
                    has_data_per_namespace,
                }
            })
            .collect()
    }
}

/// Column headers for a grid starting on `week_start`.
pub fn weekday_labels(week_start: WeekStart) -> [&'static str; 7] {
    match week_start {
        WeekStart::Sunday => ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"],
        WeekStart::Monday => ["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{month, page};

    fn projector(week_start: WeekStart) -> CalendarGridProjector {
        CalendarGridProjector::new(NamespaceSet::new(["news", "social"]), week_start)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_empty_cache_projects_42_cells_for_every_month() {
        let cache = AvailabilityCache::new();
        let today = date(2025, 8, 15);
        for week_start in [WeekStart::Sunday, WeekStart::Monday] {
            for year in [1970, 2024, 2025, 2100] {
                for m in 1..=12 {
                    let key = month(year, m);
                    let cells = projector(week_start).project(key, &cache, today);
                    assert_eq!(cells.len(), GRID_CELLS);
                    assert!(cells.iter().all(|c| !c.has_data));
                    let in_month = cells.iter().filter(|c| c.is_current_month).count();
                    assert_eq!(in_month as u32, key.days_in_month());
                }
            }
        }
    }

    #[test]
    fn test_august_2025_badges() {
        let cache = AvailabilityCache::new();
        let aug = month(2025, 8);
        cache.replace(
            aug,
            page(
                aug,
                &[("all", &["2025-08-01", "2025-08-03"]), ("news", &["2025-08-01"])],
            )
            .snapshot,
        );

        let cells = projector(WeekStart::Sunday).project(aug, &cache, date(2025, 8, 20));
        let cell = |s: &str| cells.iter().find(|c| c.day.as_str() == s).unwrap();
        let news = NamespaceKey::new("news");
        let social = NamespaceKey::new("social");

        let aug_1 = cell("2025-08-01");
        assert!(aug_1.has_data);
        assert!(aug_1.has_data_in(&news));
        assert!(!aug_1.has_data_in(&social));
        assert!(aug_1.is_selectable());

        assert!(!cell("2025-08-02").has_data);
        assert!(cell("2025-08-03").has_data);
        assert!(!cell("2025-08-03").has_data_in(&news));
        assert!(cell("2025-08-20").is_today);
    }

    #[test]
    fn test_leading_and_trailing_cells_carry_no_flags() {
        let cache = AvailabilityCache::new();
        let aug = month(2025, 8);
        cache.replace(aug, page(aug, &[("all", &["2025-08-01"])]).snapshot);

        // Aug 1 2025 is a Friday.
        let cells = projector(WeekStart::Sunday).project(aug, &cache, date(2025, 8, 1));
        assert_eq!(cells[0].day.as_str(), "2025-07-27");
        assert_eq!(cells[5].day.as_str(), "2025-08-01");
        for cell in cells.iter().filter(|c| !c.is_current_month) {
            assert!(!cell.has_data);
            assert!(cell.has_data_per_namespace.is_empty());
            assert!(!cell.is_selectable());
        }
        assert_eq!(cells[41].day.as_str(), "2025-09-06");
    }

    #[test]
    fn test_monday_start() {
        let cache = AvailabilityCache::new();
        let cells = projector(WeekStart::Monday).project(month(2025, 9), &cache, date(2025, 9, 1));
        // Sep 1 2025 is a Monday: no leading cells.
        assert_eq!(cells[0].day.as_str(), "2025-09-01");
        assert!(cells[0].is_today);
        assert_eq!(weekday_labels(WeekStart::Monday)[0], "Mo");
    }
}
