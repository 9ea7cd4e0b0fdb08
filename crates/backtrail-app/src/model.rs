// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use time::{Date, Duration, OffsetDateTime};

use crate::ids::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum QuickRange {
    #[default]
    All,
    Today,
    Yesterday,
    LastWeek,
    LastMonth,
    Older,
}

/// Inclusive calendar-day bounds; `None` means unbounded on that side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayBounds {
    pub first: Option<Date>,
    pub last: Option<Date>,
}

impl DayBounds {
    pub fn contains(self, day: Date) -> bool {
        self.first.is_none_or(|first| day >= first) && self.last.is_none_or(|last| day <= last)
    }
}

impl QuickRange {
    pub const ALL: [Self; 6] = [
        Self::All,
        Self::Today,
        Self::Yesterday,
        Self::LastWeek,
        Self::LastMonth,
        Self::Older,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Today => "today",
            Self::Yesterday => "yesterday",
            Self::LastWeek => "last-week",
            Self::LastMonth => "last-month",
            Self::Older => "older",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "all" => Some(Self::All),
            "today" => Some(Self::Today),
            "yesterday" => Some(Self::Yesterday),
            "last-week" => Some(Self::LastWeek),
            "last-month" => Some(Self::LastMonth),
            "older" => Some(Self::Older),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Today => "Today",
            Self::Yesterday => "Yesterday",
            Self::LastWeek => "Last week",
            Self::LastMonth => "Last month",
            Self::Older => "Older",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|range| range.label() == label)
    }

    pub fn bounds(self, today: Date) -> DayBounds {
        let days_ago = |days: i64| today.checked_sub(Duration::days(days));
        match self {
            Self::All => DayBounds {
                first: None,
                last: None,
            },
            Self::Today => DayBounds {
                first: Some(today),
                last: Some(today),
            },
            Self::Yesterday => DayBounds {
                first: days_ago(1),
                last: days_ago(1),
            },
            Self::LastWeek => DayBounds {
                first: days_ago(7),
                last: days_ago(2),
            },
            Self::LastMonth => DayBounds {
                first: days_ago(30),
                last: days_ago(8),
            },
            Self::Older => DayBounds {
                first: None,
                last: days_ago(31),
            },
        }
    }

    pub fn contains(self, day: Date, today: Date) -> bool {
        self.bounds(today).contains(day)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    pub const fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: HistoryEntryId,
    pub url: String,
    pub title: String,
    pub favicon: Option<String>,
    pub visited_at: OffsetDateTime,
}

impl HistoryEntry {
    pub fn day(&self) -> Date {
        self.visited_at.date()
    }

    /// Host part of the URL, or the raw URL when it does not parse.
    pub fn host(&self) -> String {
        match url::Url::parse(&self.url) {
            Ok(parsed) => parsed
                .host_str()
                .map(|host| host.trim_start_matches("www.").to_owned())
                .unwrap_or_else(|| self.url.clone()),
            Err(_) => self.url.clone(),
        }
    }

    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            &self.url
        } else {
            &self.title
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistorySection {
    pub date: Date,
    pub label: String,
    pub entries: Vec<HistoryEntry>,
}

#[cfg(test)]
mod tests {
    use super::{HistoryEntry, QuickRange, Theme};
    use crate::HistoryEntryId;
    use time::macros::{date, datetime};

    fn entry(url: &str, title: &str) -> HistoryEntry {
        HistoryEntry {
            id: HistoryEntryId::new(1),
            url: url.to_owned(),
            title: title.to_owned(),
            favicon: None,
            visited_at: datetime!(2026-03-10 09:15 UTC),
        }
    }

    #[test]
    fn quick_range_storage_strings_parse_back() {
        for range in QuickRange::ALL {
            assert_eq!(QuickRange::parse(range.as_str()), Some(range));
            assert_eq!(QuickRange::from_label(range.label()), Some(range));
        }
        assert_eq!(QuickRange::parse("last week"), None);
    }

    #[test]
    fn quick_range_boundaries_follow_day_offsets() {
        let today = date!(2026 - 03 - 31);
        let ago = |days: i64| today - time::Duration::days(days);

        assert!(QuickRange::Today.contains(today, today));
        assert!(!QuickRange::Today.contains(ago(1), today));

        assert!(QuickRange::Yesterday.contains(ago(1), today));
        assert!(!QuickRange::Yesterday.contains(ago(2), today));

        assert!(QuickRange::LastWeek.contains(ago(2), today));
        assert!(QuickRange::LastWeek.contains(ago(7), today));
        assert!(!QuickRange::LastWeek.contains(ago(8), today));

        assert!(QuickRange::LastMonth.contains(ago(8), today));
        assert!(QuickRange::LastMonth.contains(ago(30), today));
        assert!(!QuickRange::LastMonth.contains(ago(31), today));

        assert!(QuickRange::Older.contains(ago(31), today));
        assert!(!QuickRange::Older.contains(ago(30), today));

        assert!(QuickRange::All.contains(ago(400), today));
    }

    #[test]
    fn host_strips_www_and_falls_back_to_raw_url() {
        assert_eq!(
            entry("https://www.rust-lang.org/learn", "Learn").host(),
            "rust-lang.org"
        );
        assert_eq!(entry("not a url", "x").host(), "not a url");
    }

    #[test]
    fn display_title_falls_back_to_url() {
        assert_eq!(entry("https://a.example/", "  ").display_title(), "https://a.example/");
        assert_eq!(entry("https://a.example/", "A").display_title(), "A");
    }

    #[test]
    fn theme_toggles() {
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::parse("dark"), Some(Theme::Dark));
        assert_eq!(Theme::parse("neon"), None);
    }
}
