// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeSet;
use time::{Date, OffsetDateTime};

use crate::{HistoryEntry, HistoryEntryId, HistorySection, QuickRange, Theme, build_sections};

/// Observed fields of [`HistoryState`]. Every [`HistoryEvent`] names the
/// field it changed so views can re-evaluate only what they depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HistoryField {
    Range,
    Query,
    Sections,
    Selection,
    Theme,
    Status,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryState {
    entries: Vec<HistoryEntry>,
    selected_range: QuickRange,
    selected_items: BTreeSet<HistoryEntryId>,
    search_query: String,
    theme: Theme,
    today: Date,
    pub status_line: Option<String>,
}

impl Default for HistoryState {
    fn default() -> Self {
        Self::new(OffsetDateTime::now_utc().date())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryCommand {
    SetRange(QuickRange),
    Search(String),
    Select(HistoryEntryId),
    Deselect(HistoryEntryId),
    ToggleSelected(HistoryEntryId),
    ClearSelection,
    ReplaceEntries(Vec<HistoryEntry>),
    RemoveEntries(Vec<HistoryEntryId>),
    ClearEntries,
    SetTheme(Theme),
    SetToday(Date),
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryEvent {
    RangeChanged(QuickRange),
    QueryChanged(String),
    EntriesChanged { total: usize },
    SelectionChanged { count: usize },
    ThemeChanged(Theme),
    TodayChanged(Date),
    StatusUpdated(String),
    StatusCleared,
}

impl HistoryEvent {
    pub const fn field(&self) -> HistoryField {
        match self {
            Self::RangeChanged(_) => HistoryField::Range,
            Self::QueryChanged(_) => HistoryField::Query,
            Self::EntriesChanged { .. } | Self::TodayChanged(_) => HistoryField::Sections,
            Self::SelectionChanged { .. } => HistoryField::Selection,
            Self::ThemeChanged(_) => HistoryField::Theme,
            Self::StatusUpdated(_) | Self::StatusCleared => HistoryField::Status,
        }
    }
}

impl HistoryState {
    pub fn new(today: Date) -> Self {
        Self {
            entries: Vec::new(),
            selected_range: QuickRange::All,
            selected_items: BTreeSet::new(),
            search_query: String::new(),
            theme: Theme::Light,
            today,
            status_line: None,
        }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn selected_range(&self) -> QuickRange {
        self.selected_range
    }

    pub fn selected_items(&self) -> &BTreeSet<HistoryEntryId> {
        &self.selected_items
    }

    pub fn selected_count(&self) -> usize {
        self.selected_items.len()
    }

    pub fn is_selected(&self, id: HistoryEntryId) -> bool {
        self.selected_items.contains(&id)
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn today(&self) -> Date {
        self.today
    }

    pub fn sections(&self) -> Vec<HistorySection> {
        build_sections(
            &self.entries,
            self.selected_range,
            &self.search_query,
            self.today,
        )
    }

    /// Ids of the visits that fall inside `range`, ignoring the search query.
    pub fn ids_in_range(&self, range: QuickRange) -> Vec<HistoryEntryId> {
        self.entries
            .iter()
            .filter(|entry| range.contains(entry.day(), self.today))
            .map(|entry| entry.id)
            .collect()
    }

    pub fn dispatch(&mut self, command: HistoryCommand) -> Vec<HistoryEvent> {
        match command {
            HistoryCommand::SetRange(range) => {
                if self.selected_range == range {
                    return Vec::new();
                }
                self.selected_range = range;
                vec![HistoryEvent::RangeChanged(range)]
            }
            HistoryCommand::Search(query) => {
                if self.search_query == query {
                    return Vec::new();
                }
                self.search_query = query.clone();
                vec![HistoryEvent::QueryChanged(query)]
            }
            HistoryCommand::Select(id) => {
                if !self.entries.iter().any(|entry| entry.id == id) {
                    return Vec::new();
                }
                self.update_selection(|selection| selection.insert(id))
            }
            HistoryCommand::Deselect(id) => {
                self.update_selection(|selection| selection.remove(&id))
            }
            HistoryCommand::ToggleSelected(id) => {
                if self.is_selected(id) {
                    self.dispatch(HistoryCommand::Deselect(id))
                } else {
                    self.dispatch(HistoryCommand::Select(id))
                }
            }
            HistoryCommand::ClearSelection => self.update_selection(|selection| {
                let changed = !selection.is_empty();
                selection.clear();
                changed
            }),
            HistoryCommand::ReplaceEntries(entries) => {
                self.entries = entries;
                let mut events = vec![self.entries_changed()];
                events.extend(self.prune_selection());
                events
            }
            HistoryCommand::RemoveEntries(ids) => {
                let doomed = ids.into_iter().collect::<BTreeSet<_>>();
                let before = self.entries.len();
                self.entries.retain(|entry| !doomed.contains(&entry.id));
                if self.entries.len() == before {
                    return Vec::new();
                }
                log::debug!("removed {} history entries", before - self.entries.len());
                let mut events = vec![self.entries_changed()];
                events.extend(self.prune_selection());
                events
            }
            HistoryCommand::ClearEntries => {
                if self.entries.is_empty() && self.selected_items.is_empty() {
                    return Vec::new();
                }
                self.entries.clear();
                let mut events = vec![self.entries_changed()];
                events.extend(self.prune_selection());
                events
            }
            HistoryCommand::SetTheme(theme) => {
                if self.theme == theme {
                    return Vec::new();
                }
                self.theme = theme;
                vec![HistoryEvent::ThemeChanged(theme)]
            }
            HistoryCommand::SetToday(today) => {
                if self.today == today {
                    return Vec::new();
                }
                self.today = today;
                vec![HistoryEvent::TodayChanged(today)]
            }
            HistoryCommand::SetStatus(message) => {
                if self.status_line.as_deref() == Some(message.as_str()) {
                    return Vec::new();
                }
                self.status_line = Some(message.clone());
                vec![HistoryEvent::StatusUpdated(message)]
            }
            HistoryCommand::ClearStatus => {
                if self.status_line.take().is_none() {
                    return Vec::new();
                }
                vec![HistoryEvent::StatusCleared]
            }
        }
    }

    fn update_selection(
        &mut self,
        change: impl FnOnce(&mut BTreeSet<HistoryEntryId>) -> bool,
    ) -> Vec<HistoryEvent> {
        if change(&mut self.selected_items) {
            vec![HistoryEvent::SelectionChanged {
                count: self.selected_items.len(),
            }]
        } else {
            Vec::new()
        }
    }

    fn prune_selection(&mut self) -> Option<HistoryEvent> {
        let live = self
            .entries
            .iter()
            .map(|entry| entry.id)
            .collect::<BTreeSet<_>>();
        let before = self.selected_items.len();
        self.selected_items.retain(|id| live.contains(id));
        (self.selected_items.len() != before).then(|| HistoryEvent::SelectionChanged {
            count: self.selected_items.len(),
        })
    }

    fn entries_changed(&self) -> HistoryEvent {
        HistoryEvent::EntriesChanged {
            total: self.entries.len(),
        }
    }
}
