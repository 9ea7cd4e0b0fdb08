// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use backtrail_app::{HistoryEntry, HistoryEntryId};
use std::path::PathBuf;
use time::{Date, Duration, Month, OffsetDateTime, Time};

const DOMAINS: [&str; 14] = [
    "rust-lang.org",
    "docs.rs",
    "crates.io",
    "github.com",
    "wikipedia.org",
    "sqlite.org",
    "weather.gov",
    "openstreetmap.org",
    "archive.org",
    "seriouseats.com",
    "sweetmarias.com",
    "mozilla.org",
    "ycombinator.com",
    "reddit.com",
];

const TOPICS: [&str; 18] = [
    "coffee", "espresso", "ratatui", "borrowing", "lifetimes", "pizza", "sourdough", "weather",
    "maps", "sqlite", "indexes", "terminal", "history", "bicycles", "gardening", "tea", "async",
    "traits",
];

const PATH_PREFIXES: [&str; 6] = ["docs", "wiki", "r", "learn", "blog", "search"];

const TITLE_TEMPLATES: [&str; 5] = [
    "{topic} guide",
    "All about {topic}",
    "{topic} - Wikipedia",
    "Why {topic} matters",
    "{topic} notes",
];

const REFERENCE_YEAR: i32 = 2026;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeVisit {
    pub url: String,
    pub title: String,
    pub visited_at: OffsetDateTime,
}

impl FakeVisit {
    pub fn into_entry(self, id: i64) -> HistoryEntry {
        HistoryEntry {
            id: HistoryEntryId::new(id),
            url: self.url,
            title: self.title,
            favicon: None,
            visited_at: self.visited_at,
        }
    }
}

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

#[derive(Debug, Clone)]
pub struct HistoryFaker {
    rng: DeterministicRng,
}

impl HistoryFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    pub fn visit(&mut self) -> FakeVisit {
        let days_ago = self.rng.int_n(60) as i64;
        self.visit_days_ago(reference_now(), days_ago)
    }

    /// A visit on the calendar day `days_ago` days before `now`, at a random time of day.
    pub fn visit_days_ago(&mut self, now: OffsetDateTime, days_ago: i64) -> FakeVisit {
        let day_start = now.replace_time(Time::MIDNIGHT) - Duration::days(days_ago);
        let seconds = self.rng.int_n(24 * 60 * 60) as i64;
        let topic = self.pick(&TOPICS);
        FakeVisit {
            url: format!(
                "https://{}/{}/{}",
                self.pick(&DOMAINS),
                self.pick(&PATH_PREFIXES),
                topic
            ),
            title: self.pick(&TITLE_TEMPLATES).replace("{topic}", topic),
            visited_at: day_start + Duration::seconds(seconds),
        }
    }

    /// `count` entries with ids starting at 1, spread over the last `span_days` days.
    pub fn entries(
        &mut self,
        now: OffsetDateTime,
        count: usize,
        span_days: usize,
    ) -> Vec<HistoryEntry> {
        (0..count)
            .map(|index| {
                let days_ago = self.rng.int_n(span_days.max(1)) as i64;
                self.visit_days_ago(now, days_ago).into_entry(index as i64 + 1)
            })
            .collect()
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }
}

pub fn temp_db_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let db_path = dir.path().join("history.db");
    Ok((dir, db_path))
}

/// Noon UTC on 2026-03-10, the instant the fixtures treat as "now".
pub fn reference_now() -> OffsetDateTime {
    reference_today()
        .with_time(Time::from_hms(12, 0, 0).expect("valid noon"))
        .assume_utc()
}

pub fn reference_today() -> Date {
    Date::from_calendar_date(REFERENCE_YEAR, Month::March, 10).expect("valid calendar date")
}

pub fn domains() -> &'static [&'static str] {
    &DOMAINS
}

#[cfg(test)]
mod tests {
    use super::{HistoryFaker, domains, reference_now, reference_today};
    use std::collections::BTreeSet;

    #[test]
    fn new_deterministic_seed() {
        let mut left = HistoryFaker::new(42);
        let mut right = HistoryFaker::new(42);
        assert_eq!(left.visit(), right.visit());
    }

    #[test]
    fn visit_has_url_title_and_recent_timestamp() {
        let mut faker = HistoryFaker::new(7);
        let visit = faker.visit();

        assert!(visit.url.starts_with("https://"));
        assert!(!visit.title.is_empty());
        assert!(!visit.title.contains("{topic}"));
        assert!(visit.visited_at <= reference_now() + time::Duration::days(1));
        assert!(visit.visited_at >= reference_now() - time::Duration::days(61));
    }

    #[test]
    fn visit_days_ago_lands_on_requested_day() {
        let mut faker = HistoryFaker::new(3);
        for days_ago in [0_i64, 1, 7, 31] {
            let visit = faker.visit_days_ago(reference_now(), days_ago);
            assert_eq!(
                visit.visited_at.date(),
                reference_today() - time::Duration::days(days_ago),
                "days_ago {days_ago}"
            );
        }
    }

    #[test]
    fn entries_have_sequential_ids() {
        let mut faker = HistoryFaker::new(9);
        let entries = faker.entries(reference_now(), 5, 3);
        let ids = entries.iter().map(|entry| entry.id.get()).collect::<Vec<_>>();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert!(
            entries
                .iter()
                .all(|entry| entry.visited_at.date() > reference_today() - time::Duration::days(3))
        );
    }

    #[test]
    fn variety_across_seeds() {
        let mut urls = BTreeSet::new();
        for seed in 0_u64..20_u64 {
            let mut faker = HistoryFaker::new(seed);
            urls.insert(faker.visit().url);
        }
        assert!(urls.len() >= 10, "got {}", urls.len());
    }

    #[test]
    fn domain_list_is_non_empty() {
        assert!(!domains().is_empty());
    }
}
