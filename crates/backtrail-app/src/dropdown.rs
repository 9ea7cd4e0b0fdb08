// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use std::collections::BTreeSet;

use crate::WidgetId;

pub const DEFAULT_DROPDOWN_LABEL: &str = "Label";
pub const DEFAULT_ACCENT: &str = "#2196f3";
pub const ERROR_ACCENT: &str = "#f44336";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropdownConfig {
    pub label: String,
    pub color: String,
    pub default_value: Option<String>,
    pub items: Vec<String>,
}

impl Default for DropdownConfig {
    fn default() -> Self {
        Self {
            label: DEFAULT_DROPDOWN_LABEL.to_owned(),
            color: DEFAULT_ACCENT.to_owned(),
            default_value: None,
            items: Vec::new(),
        }
    }
}

impl DropdownConfig {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn with_items<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.items = items.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_default(mut self, value: Option<impl Into<String>>) -> Self {
        self.default_value = value.map(Into::into);
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for item in &self.items {
            if item.trim().is_empty() {
                bail!("dropdown `{}` has an empty item label", self.label);
            }
            if !seen.insert(item.as_str()) {
                bail!("dropdown `{}` lists item `{item}` twice", self.label);
            }
        }
        Ok(())
    }
}

/// Pointer event routed through the host. Handlers may consume it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickEvent {
    pub column: u16,
    pub row: u16,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl ClickEvent {
    pub const fn new(column: u16, row: u16) -> Self {
        Self {
            column,
            row,
            default_prevented: false,
            propagation_stopped: false,
        }
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub const fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub const fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

/// Outside-click registration owned by a single widget instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutsideClickListener {
    attached: bool,
    registrations: u64,
}

impl OutsideClickListener {
    /// Returns `false` when the slot was already attached.
    pub fn attach(&mut self) -> bool {
        if self.attached {
            return false;
        }
        self.attached = true;
        self.registrations += 1;
        true
    }

    pub fn release(&mut self) -> bool {
        std::mem::replace(&mut self.attached, false)
    }

    pub const fn is_attached(&self) -> bool {
        self.attached
    }

    /// Total successful attaches over the widget's lifetime.
    pub const fn registrations(&self) -> u64 {
        self.registrations
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeferredStep {
    AttachOutsideListener,
    Dismiss,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropdownAction {
    Open,
    Select(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropdownItemView {
    pub label: String,
    pub is_selected: bool,
    pub is_highlighted: bool,
    pub on_select: DropdownAction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropdownView {
    pub label: String,
    pub value: Option<String>,
    pub accent: String,
    pub is_open: bool,
    pub is_activated: bool,
    pub label_raised: bool,
    pub items: Vec<DropdownItemView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dropdown {
    id: WidgetId,
    config: DropdownConfig,
    is_open: bool,
    is_activated: bool,
    selected_value: Option<String>,
    has_error: bool,
    cursor: usize,
    listener: OutsideClickListener,
    deferred: Vec<DeferredStep>,
}

impl Dropdown {
    pub fn new(id: WidgetId, config: DropdownConfig) -> Self {
        Self {
            id,
            config,
            is_open: false,
            is_activated: false,
            selected_value: None,
            has_error: false,
            cursor: 0,
            listener: OutsideClickListener::default(),
            deferred: Vec::new(),
        }
    }

    pub const fn id(&self) -> WidgetId {
        self.id
    }

    pub fn config(&self) -> &DropdownConfig {
        &self.config
    }

    pub const fn is_open(&self) -> bool {
        self.is_open
    }

    pub const fn is_activated(&self) -> bool {
        self.is_activated
    }

    pub const fn has_error(&self) -> bool {
        self.has_error
    }

    pub fn selected_value(&self) -> Option<&str> {
        self.selected_value.as_deref()
    }

    pub const fn listener(&self) -> &OutsideClickListener {
        &self.listener
    }

    pub fn has_pending_steps(&self) -> bool {
        !self.deferred.is_empty()
    }

    pub fn open(&mut self) {
        self.is_open = true;
        self.is_activated = true;
        self.has_error = false;
        self.cursor = self
            .value()
            .and_then(|value| self.config.items.iter().position(|item| item == value))
            .unwrap_or(0);
        self.deferred.push(DeferredStep::AttachOutsideListener);
    }

    pub fn handle_outside_click(&mut self, event: &mut ClickEvent) {
        event.stop_propagation();
        event.prevent_default();
        self.close();
    }

    /// Schedules dismissal for the end of the current dispatch cycle.
    pub fn close(&mut self) {
        self.deferred.push(DeferredStep::Dismiss);
    }

    pub fn select_item(&mut self, label: Option<&str>) {
        let Some(label) = label else {
            return;
        };
        self.selected_value = Some(label.to_owned());
    }

    pub fn apply(&mut self, action: DropdownAction) {
        match action {
            DropdownAction::Open => self.open(),
            DropdownAction::Select(label) => self.select_item(Some(&label)),
        }
    }

    pub fn value(&self) -> Option<&str> {
        self.selected_value
            .as_deref()
            .or(self.config.default_value.as_deref())
    }

    pub fn validate(&mut self) -> bool {
        self.has_error = self.value().is_none();
        self.is_activated = self.has_error || self.is_open;
        !self.has_error
    }

    pub fn reset(&mut self) {
        self.is_open = false;
        self.is_activated = false;
        self.selected_value = None;
        self.has_error = false;
        self.cursor = 0;
        self.deferred.clear();
        self.listener.release();
    }

    pub fn teardown(&mut self) {
        self.deferred.clear();
        if self.listener.release() {
            log::debug!("dropdown {} released outside-click listener", self.id.get());
        }
    }

    /// Runs the steps scheduled during the dispatch cycle that just ended, in order.
    pub fn after_dispatch(&mut self) {
        for step in std::mem::take(&mut self.deferred) {
            match step {
                DeferredStep::AttachOutsideListener => {
                    if self.is_open {
                        self.listener.attach();
                    }
                }
                DeferredStep::Dismiss => {
                    self.is_open = false;
                    self.is_activated = self.has_error;
                    self.listener.release();
                }
            }
        }
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.config.items.len();
        if len == 0 {
            return;
        }
        let next = (self.cursor as isize + delta).clamp(0, len as isize - 1);
        self.cursor = next as usize;
    }

    pub fn select_highlighted(&mut self) {
        let label = self.config.items.get(self.cursor).cloned();
        self.select_item(label.as_deref());
        self.close();
    }

    pub fn view(&self) -> DropdownView {
        let value = self.value().map(str::to_owned);
        let items = self
            .config
            .items
            .iter()
            .enumerate()
            .map(|(index, label)| DropdownItemView {
                label: label.clone(),
                is_selected: value.as_deref() == Some(label.as_str()),
                is_highlighted: self.is_open && index == self.cursor,
                on_select: DropdownAction::Select(label.clone()),
            })
            .collect();

        DropdownView {
            label: self.config.label.clone(),
            accent: if self.has_error {
                ERROR_ACCENT.to_owned()
            } else {
                self.config.color.clone()
            },
            label_raised: value.is_some() || self.is_activated,
            value,
            is_open: self.is_open,
            is_activated: self.is_activated,
            items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ClickEvent, DEFAULT_ACCENT, Dropdown, DropdownAction, DropdownConfig, ERROR_ACCENT,
        OutsideClickListener,
    };
    use crate::WidgetId;

    fn abc(default_value: Option<&str>) -> Dropdown {
        Dropdown::new(
            WidgetId::new(1),
            DropdownConfig::new("Letter")
                .with_items(["A", "B", "C"])
                .with_default(default_value),
        )
    }

    fn assert_invariants(dropdown: &Dropdown) {
        if dropdown.is_open() {
            assert!(dropdown.is_activated(), "open implies activated");
        }
        if dropdown.has_error() {
            assert!(dropdown.is_activated(), "error implies activated");
        }
    }

    #[test]
    fn new_dropdown_is_closed_and_unselected() {
        let dropdown = abc(None);
        assert!(!dropdown.is_open());
        assert!(!dropdown.is_activated());
        assert!(!dropdown.has_error());
        assert_eq!(dropdown.selected_value(), None);
        assert!(!dropdown.listener().is_attached());
    }

    #[test]
    fn open_defers_listener_registration_to_after_dispatch() {
        let mut dropdown = abc(None);
        dropdown.open();
        assert!(dropdown.is_open());
        assert!(dropdown.is_activated());
        assert!(!dropdown.listener().is_attached());

        dropdown.after_dispatch();
        assert!(dropdown.listener().is_attached());
        assert_invariants(&dropdown);
    }

    #[test]
    fn open_clears_previous_error() {
        let mut dropdown = abc(None);
        assert!(!dropdown.validate());
        dropdown.open();
        assert!(!dropdown.has_error());
    }

    #[test]
    fn repeated_open_registers_listener_once() {
        let mut dropdown = abc(None);
        dropdown.open();
        dropdown.after_dispatch();
        dropdown.open();
        dropdown.open();
        dropdown.after_dispatch();

        assert!(dropdown.listener().is_attached());
        assert_eq!(dropdown.listener().registrations(), 1);
    }

    #[test]
    fn outside_click_consumes_event_and_dismisses_after_dispatch() {
        let mut dropdown = abc(None);
        dropdown.open();
        dropdown.after_dispatch();

        let mut event = ClickEvent::new(40, 12);
        dropdown.handle_outside_click(&mut event);
        assert!(event.is_default_prevented());
        assert!(event.is_propagation_stopped());
        assert!(dropdown.is_open(), "dismissal waits for the end of the cycle");

        dropdown.after_dispatch();
        assert!(!dropdown.is_open());
        assert!(!dropdown.is_activated());
        assert!(!dropdown.listener().is_attached());
    }

    #[test]
    fn open_select_then_outside_click_keeps_selection() {
        let mut dropdown = abc(None);
        dropdown.open();
        dropdown.after_dispatch();

        // One click cycle: the item handler runs before the outside listener.
        dropdown.select_item(Some("A"));
        let mut event = ClickEvent::new(3, 4);
        dropdown.handle_outside_click(&mut event);
        dropdown.after_dispatch();

        assert!(!dropdown.is_open());
        assert_eq!(dropdown.selected_value(), Some("A"));
        assert_eq!(dropdown.value(), Some("A"));
    }

    #[test]
    fn open_close_cycles_never_double_register() {
        let mut dropdown = abc(None);
        for cycle in 1..=5_u64 {
            dropdown.open();
            dropdown.after_dispatch();
            assert!(dropdown.listener().is_attached());

            let mut event = ClickEvent::new(0, 0);
            dropdown.handle_outside_click(&mut event);
            dropdown.after_dispatch();
            assert!(!dropdown.listener().is_attached());
            assert_eq!(dropdown.listener().registrations(), cycle);
        }
    }

    #[test]
    fn teardown_releases_listener_and_pending_steps() {
        let mut dropdown = abc(None);
        dropdown.open();
        dropdown.after_dispatch();
        dropdown.open();
        assert!(dropdown.has_pending_steps());

        dropdown.teardown();
        assert!(!dropdown.listener().is_attached());
        assert!(!dropdown.has_pending_steps());
    }

    #[test]
    fn teardown_before_registration_never_attaches() {
        let mut dropdown = abc(None);
        dropdown.open();
        dropdown.teardown();
        dropdown.after_dispatch();
        assert!(!dropdown.listener().is_attached());
        assert_eq!(dropdown.listener().registrations(), 0);
    }

    #[test]
    fn select_none_is_ignored() {
        let mut dropdown = abc(None);
        dropdown.select_item(Some("B"));
        dropdown.select_item(None);
        assert_eq!(dropdown.selected_value(), Some("B"));
    }

    #[test]
    fn selection_overrides_default_value() {
        let mut dropdown = abc(Some("B"));
        assert_eq!(dropdown.value(), Some("B"));
        dropdown.select_item(Some("X"));
        assert_eq!(dropdown.value(), Some("X"));
    }

    #[test]
    fn select_does_not_close_menu() {
        let mut dropdown = abc(None);
        dropdown.open();
        dropdown.after_dispatch();
        dropdown.apply(DropdownAction::Select("C".to_owned()));
        dropdown.after_dispatch();
        assert!(dropdown.is_open());
        assert_eq!(dropdown.value(), Some("C"));
    }

    #[test]
    fn default_value_validates_and_marks_item_selected() {
        let mut dropdown = abc(Some("B"));
        assert!(dropdown.validate());
        assert!(!dropdown.has_error());

        let view = dropdown.view();
        let selected = view
            .items
            .iter()
            .filter(|item| item.is_selected)
            .map(|item| item.label.as_str())
            .collect::<Vec<_>>();
        assert_eq!(selected, vec!["B"]);
    }

    #[test]
    fn missing_value_fails_validation_and_switches_accent() {
        let mut dropdown = abc(None);
        assert!(!dropdown.validate());
        assert!(dropdown.has_error());
        assert!(dropdown.is_activated());
        assert_invariants(&dropdown);

        let view = dropdown.view();
        assert_eq!(view.accent, ERROR_ACCENT);
        assert!(view.label_raised);
    }

    #[test]
    fn successful_validation_clears_error() {
        let mut dropdown = abc(None);
        assert!(!dropdown.validate());
        dropdown.select_item(Some("C"));
        assert!(dropdown.validate());
        assert!(!dropdown.has_error());
        assert!(!dropdown.is_activated());
        assert_eq!(dropdown.view().accent, DEFAULT_ACCENT);
    }

    #[test]
    fn validate_while_open_keeps_invariant() {
        let mut dropdown = abc(Some("A"));
        dropdown.open();
        assert!(dropdown.validate());
        assert_invariants(&dropdown);

        let mut missing = abc(None);
        missing.open();
        missing.after_dispatch();
        assert!(!missing.validate());
        let mut event = ClickEvent::new(0, 0);
        missing.handle_outside_click(&mut event);
        missing.after_dispatch();
        assert!(missing.has_error());
        assert_invariants(&missing);
    }

    #[test]
    fn reset_restores_default_value() {
        let mut dropdown = abc(Some("B"));
        dropdown.open();
        dropdown.after_dispatch();
        dropdown.select_item(Some("C"));
        dropdown.reset();

        assert_eq!(dropdown.value(), Some("B"));
        assert_eq!(dropdown.selected_value(), None);
        assert!(!dropdown.is_open());
        assert!(!dropdown.is_activated());
        assert!(!dropdown.has_error());
        assert!(!dropdown.listener().is_attached());
    }

    #[test]
    fn keyboard_selection_closes_after_dispatch() {
        let mut dropdown = abc(Some("B"));
        dropdown.open();
        dropdown.after_dispatch();
        dropdown.move_cursor(1);
        dropdown.move_cursor(5);
        dropdown.select_highlighted();
        dropdown.after_dispatch();

        assert_eq!(dropdown.value(), Some("C"));
        assert!(!dropdown.is_open());
        assert!(!dropdown.listener().is_attached());
    }

    #[test]
    fn item_views_carry_select_actions() {
        let mut dropdown = abc(None);
        dropdown.open();
        let view = dropdown.view();
        assert_eq!(
            view.items[2].on_select,
            DropdownAction::Select("C".to_owned())
        );
        assert!(view.items[0].is_highlighted);
        assert!(view.label_raised);
    }

    #[test]
    fn config_rejects_duplicate_items() {
        let config = DropdownConfig::new("Range").with_items(["A", "A"]);
        let error = config.validate().expect_err("duplicate items should fail");
        assert!(error.to_string().contains("twice"));
        assert!(DropdownConfig::new("Range").with_items(["A", "B"]).validate().is_ok());
    }

    #[test]
    fn listener_attach_is_idempotent() {
        let mut listener = OutsideClickListener::default();
        assert!(listener.attach());
        assert!(!listener.attach());
        assert!(listener.release());
        assert!(!listener.release());
        assert_eq!(listener.registrations(), 1);
    }
}
