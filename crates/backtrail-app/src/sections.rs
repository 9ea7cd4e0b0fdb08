// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::cmp::Reverse;
use time::Date;
use time::macros::format_description;

use crate::{HistoryEntry, HistorySection, QuickRange};

/// Case-insensitive substring match against title and URL. Blank queries match everything.
pub fn matches_query(entry: &HistoryEntry, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    entry.title.to_lowercase().contains(&needle) || entry.url.to_lowercase().contains(&needle)
}

/// Groups the entries visible under `range` and `query` into one section per
/// day, newest day first and newest visit first inside each day.
pub fn build_sections(
    entries: &[HistoryEntry],
    range: QuickRange,
    query: &str,
    today: Date,
) -> Vec<HistorySection> {
    let mut visible = entries
        .iter()
        .filter(|entry| range.contains(entry.day(), today) && matches_query(entry, query))
        .collect::<Vec<_>>();
    visible.sort_by_key(|entry| (Reverse(entry.visited_at), Reverse(entry.id)));

    let mut sections: Vec<HistorySection> = Vec::new();
    for entry in visible {
        let day = entry.day();
        match sections.last_mut() {
            Some(section) if section.date == day => section.entries.push(entry.clone()),
            _ => sections.push(HistorySection {
                date: day,
                label: section_label(day, today),
                entries: vec![entry.clone()],
            }),
        }
    }
    sections
}

pub fn section_label(day: Date, today: Date) -> String {
    let formatted = day
        .format(format_description!(
            "[weekday], [month repr:long] [day padding:none], [year]"
        ))
        .unwrap_or_else(|_| day.to_string());

    if day == today {
        format!("Today - {formatted}")
    } else if today.previous_day() == Some(day) {
        format!("Yesterday - {formatted}")
    } else {
        formatted
    }
}
