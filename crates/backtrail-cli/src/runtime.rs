// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use backtrail_app::{HistoryEntry, HistoryEntryId};
use backtrail_db::Store;

pub struct DbRuntime<'a> {
    store: &'a Store,
}

impl<'a> DbRuntime<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }
}

impl backtrail_tui::HistoryRuntime for DbRuntime<'_> {
    fn load_history(&mut self) -> Result<Vec<HistoryEntry>> {
        self.store.list_history()
    }

    fn delete_entries(&mut self, ids: &[HistoryEntryId]) -> Result<usize> {
        self.store.delete_visits(ids)
    }

    fn clear_history(&mut self) -> Result<usize> {
        self.store.clear_history()
    }
}
