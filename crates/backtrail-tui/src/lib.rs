// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use backtrail_app::{
    ClickEvent, DEFAULT_ACCENT, Dropdown, DropdownAction, DropdownConfig, DropdownView,
    HistoryCommand, HistoryEntry, HistoryEntryId, HistoryEvent, HistoryField, HistoryState,
    QuickRange, Theme, WidgetId,
};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyModifiers,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use std::io;
use std::str::FromStr;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use time::OffsetDateTime;

const VIEW_TITLE: &str = "History";
const CLEAR_DATA_LABEL: &str = "Clear browsing data";
const CLEAR_RANGE_LABEL: &str = "Time range";
const CLEAR_DIALOG_WIDGET: WidgetId = WidgetId::new(1);
const DRAWER_WIDTH: u16 = 26;
const DELETE_BUTTON: &str = "[ Delete ]";
const CANCEL_BUTTON: &str = "[ Cancel ]";
const CONFIRM_CLEAR_BUTTON: &str = "[ Clear data ]";
const SELECTED_MARK: &str = "✓";

/// Fields the cached projection is built from.
const PROJECTED_FIELDS: [HistoryField; 5] = [
    HistoryField::Range,
    HistoryField::Query,
    HistoryField::Sections,
    HistoryField::Selection,
    HistoryField::Theme,
];

/// Persistence behind the history view. Handlers write through here first and
/// only update [`HistoryState`] once the write succeeded.
pub trait HistoryRuntime {
    fn load_history(&mut self) -> Result<Vec<HistoryEntry>>;
    fn delete_entries(&mut self, ids: &[HistoryEntryId]) -> Result<usize>;
    fn clear_history(&mut self) -> Result<usize>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiOptions {
    pub accent: String,
    pub clear_default_range: Option<QuickRange>,
}

impl Default for UiOptions {
    fn default() -> Self {
        Self {
            accent: DEFAULT_ACCENT.to_owned(),
            clear_default_range: Some(QuickRange::All),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RangeItemView {
    range: QuickRange,
    label: &'static str,
    is_selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct EntryView {
    id: HistoryEntryId,
    title: String,
    host: String,
    time: String,
    is_selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SectionView {
    label: String,
    entries: Vec<EntryView>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct SelectionDialogView {
    visible: bool,
    amount: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct HistoryViewModel {
    title: &'static str,
    ranges: Vec<RangeItemView>,
    search_query: String,
    sections: Vec<SectionView>,
    selection_dialog: SelectionDialogView,
    theme: Theme,
}

impl HistoryViewModel {
    fn entries(&self) -> impl Iterator<Item = &EntryView> {
        self.sections.iter().flat_map(|section| section.entries.iter())
    }

    fn entry_count(&self) -> usize {
        self.sections
            .iter()
            .map(|section| section.entries.len())
            .sum()
    }

    fn entry_at(&self, index: usize) -> Option<&EntryView> {
        self.entries().nth(index)
    }

    fn position_of(&self, id: HistoryEntryId) -> Option<usize> {
        self.entries().position(|entry| entry.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ClearDialogState {
    visible: bool,
    dropdown: Dropdown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ClickTarget {
    Range(QuickRange),
    ClearData,
    Search,
    Entry(HistoryEntryId),
    DeleteSelected,
    CancelSelection,
    DropdownHeader,
    DropdownItem(DropdownAction),
    ConfirmClear,
    CancelClear,
}

/// Screen regions recorded during the last draw, used to route clicks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct HitMap {
    ranges: Vec<(Rect, QuickRange)>,
    clear_data: Option<Rect>,
    search: Option<Rect>,
    entries: Vec<(Rect, HistoryEntryId)>,
    delete_button: Option<Rect>,
    cancel_button: Option<Rect>,
    dropdown_header: Option<Rect>,
    dropdown_items: Vec<(Rect, DropdownAction)>,
    confirm_button: Option<Rect>,
    dismiss_button: Option<Rect>,
}

impl HitMap {
    fn target_at(&self, point: Position, modal: bool) -> Option<ClickTarget> {
        let hit = |rect: &Option<Rect>| rect.is_some_and(|rect| rect.contains(point));

        if modal {
            if let Some((_, action)) = self
                .dropdown_items
                .iter()
                .find(|(rect, _)| rect.contains(point))
            {
                return Some(ClickTarget::DropdownItem(action.clone()));
            }
            if hit(&self.dropdown_header) {
                return Some(ClickTarget::DropdownHeader);
            }
            if hit(&self.confirm_button) {
                return Some(ClickTarget::ConfirmClear);
            }
            if hit(&self.dismiss_button) {
                return Some(ClickTarget::CancelClear);
            }
            return None;
        }

        if hit(&self.delete_button) {
            return Some(ClickTarget::DeleteSelected);
        }
        if hit(&self.cancel_button) {
            return Some(ClickTarget::CancelSelection);
        }
        if let Some((_, range)) = self.ranges.iter().find(|(rect, _)| rect.contains(point)) {
            return Some(ClickTarget::Range(*range));
        }
        if hit(&self.clear_data) {
            return Some(ClickTarget::ClearData);
        }
        if hit(&self.search) {
            return Some(ClickTarget::Search);
        }
        self.entries
            .iter()
            .find(|(rect, _)| rect.contains(point))
            .map(|(_, id)| ClickTarget::Entry(*id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ViewData {
    model: HistoryViewModel,
    projection_builds: u64,
    cursor: usize,
    search_focused: bool,
    clear_dialog: ClearDialogState,
    hit_map: HitMap,
    status_token: u64,
}

impl ViewData {
    fn new(state: &HistoryState, options: &UiOptions) -> Result<Self> {
        let config = DropdownConfig::new(CLEAR_RANGE_LABEL)
            .with_items(QuickRange::ALL.iter().map(|range| range.label()))
            .with_default(options.clear_default_range.map(QuickRange::label))
            .with_color(options.accent.clone());
        config.validate().context("configure clear dialog")?;

        Ok(Self {
            model: project(state),
            projection_builds: 1,
            cursor: 0,
            search_focused: false,
            clear_dialog: ClearDialogState {
                visible: false,
                dropdown: Dropdown::new(CLEAR_DIALOG_WIDGET, config),
            },
            hit_map: HitMap::default(),
            status_token: 0,
        })
    }
}

pub fn run_app<R: HistoryRuntime>(
    state: &mut HistoryState,
    runtime: &mut R,
    options: &UiOptions,
) -> Result<()> {
    let mut view_data = ViewData::new(state, options)?;
    let (internal_tx, internal_rx) = mpsc::channel();

    if let Err(error) = reload_history(state, runtime, &mut view_data) {
        log::warn!("initial history load failed: {error:#}");
        emit_status(
            state,
            &mut view_data,
            &internal_tx,
            format!("load failed: {error}"),
        );
    }

    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen, EnableMouseCapture)
        .context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut result = Ok(());
    loop {
        process_internal_events(state, &mut view_data, &internal_rx);
        roll_today(state, &mut view_data);

        let mut hit_map = HitMap::default();
        if let Err(error) = terminal.draw(|frame| hit_map = render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }
        view_data.hit_map = hit_map;
        run_deferred_steps(&mut view_data);

        let has_event = match event::poll(Duration::from_millis(120)).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if !has_event {
            continue;
        }
        match event::read().context("read event") {
            Ok(Event::Key(key)) => {
                if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                    break;
                }
            }
            Ok(Event::Mouse(mouse)) => {
                handle_mouse_event(state, runtime, &mut view_data, &internal_tx, mouse);
            }
            Ok(_) => {}
            Err(error) => {
                result = Err(error);
                break;
            }
        }
    }

    view_data.clear_dialog.dropdown.teardown();
    disable_raw_mode().context("disable raw mode")?;
    execute!(
        io::stdout(),
        terminal::LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("leave alternate screen")?;
    result
}

fn reload_history<R: HistoryRuntime>(
    state: &mut HistoryState,
    runtime: &mut R,
    view_data: &mut ViewData,
) -> Result<()> {
    let entries = runtime.load_history().context("load history")?;
    log::debug!("loaded {} history entries", entries.len());
    dispatch(state, view_data, HistoryCommand::ReplaceEntries(entries));
    Ok(())
}

fn roll_today(state: &mut HistoryState, view_data: &mut ViewData) {
    let today = OffsetDateTime::now_utc().date();
    dispatch(state, view_data, HistoryCommand::SetToday(today));
}

/// End of a dispatch cycle: every widget runs the steps its handlers deferred.
fn run_deferred_steps(view_data: &mut ViewData) {
    view_data.clear_dialog.dropdown.after_dispatch();
}

fn process_internal_events(
    state: &mut HistoryState,
    view_data: &mut ViewData,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                dispatch(state, view_data, HistoryCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(4));
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut HistoryState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    dispatch(state, view_data, HistoryCommand::SetStatus(message.into()));
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn dispatch(state: &mut HistoryState, view_data: &mut ViewData, command: HistoryCommand) {
    let events = state.dispatch(command);
    apply_events(state, view_data, &events);
}

fn apply_events(state: &HistoryState, view_data: &mut ViewData, events: &[HistoryEvent]) {
    if !events
        .iter()
        .any(|event| PROJECTED_FIELDS.contains(&event.field()))
    {
        return;
    }
    view_data.model = project(state);
    view_data.projection_builds += 1;
    view_data.cursor = view_data
        .cursor
        .min(view_data.model.entry_count().saturating_sub(1));
}

fn project(state: &HistoryState) -> HistoryViewModel {
    let ranges = QuickRange::ALL
        .iter()
        .map(|range| RangeItemView {
            range: *range,
            label: range.label(),
            is_selected: *range == state.selected_range(),
        })
        .collect();

    let sections = state
        .sections()
        .into_iter()
        .map(|section| SectionView {
            label: section.label,
            entries: section
                .entries
                .iter()
                .map(|entry| EntryView {
                    id: entry.id,
                    title: entry.display_title().to_owned(),
                    host: entry.host(),
                    time: format!(
                        "{:02}:{:02}",
                        entry.visited_at.hour(),
                        entry.visited_at.minute()
                    ),
                    is_selected: state.is_selected(entry.id),
                })
                .collect(),
        })
        .collect();

    let amount = state.selected_count();
    HistoryViewModel {
        title: VIEW_TITLE,
        ranges,
        search_query: state.search_query().to_owned(),
        sections,
        selection_dialog: SelectionDialogView {
            visible: amount > 0,
            amount,
        },
        theme: state.theme(),
    }
}

fn on_range_click(state: &mut HistoryState, view_data: &mut ViewData, range: QuickRange) {
    dispatch(state, view_data, HistoryCommand::SetRange(range));
    view_data.cursor = 0;
}

fn on_search_input(state: &mut HistoryState, view_data: &mut ViewData, value: String) {
    dispatch(state, view_data, HistoryCommand::Search(value));
}

fn on_delete_click<R: HistoryRuntime>(
    state: &mut HistoryState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    event: &mut ClickEvent,
) {
    event.stop_propagation();
    let ids = state.selected_items().iter().copied().collect::<Vec<_>>();
    if ids.is_empty() {
        return;
    }

    match runtime.delete_entries(&ids) {
        Ok(removed) => {
            dispatch(state, view_data, HistoryCommand::RemoveEntries(ids));
            emit_status(
                state,
                view_data,
                internal_tx,
                format!("deleted {removed} {}", pluralize_visits(removed)),
            );
        }
        Err(error) => {
            log::warn!("delete of {} visits failed: {error:#}", ids.len());
            emit_status(
                state,
                view_data,
                internal_tx,
                format!("delete failed: {error}"),
            );
        }
    }
}

fn on_cancel_click(state: &mut HistoryState, view_data: &mut ViewData, event: &mut ClickEvent) {
    event.stop_propagation();
    dispatch(state, view_data, HistoryCommand::ClearSelection);
}

/// Drawer "Clear browsing data": bulk clear through the runtime, no dialog.
fn on_clear_click<R: HistoryRuntime>(
    state: &mut HistoryState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    view_data.search_focused = false;
    clear_range(state, runtime, view_data, internal_tx, QuickRange::All);
}

fn open_clear_dialog(view_data: &mut ViewData) {
    view_data.search_focused = false;
    view_data.clear_dialog.visible = true;
}

fn close_clear_dialog(view_data: &mut ViewData) {
    view_data.clear_dialog.visible = false;
    view_data.clear_dialog.dropdown.reset();
}

fn confirm_clear_dialog<R: HistoryRuntime>(
    state: &mut HistoryState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    if !view_data.clear_dialog.dropdown.validate() {
        emit_status(state, view_data, internal_tx, "choose a time range first");
        return;
    }
    let Some(range) = view_data
        .clear_dialog
        .dropdown
        .value()
        .and_then(QuickRange::from_label)
    else {
        emit_status(state, view_data, internal_tx, "unknown time range");
        return;
    };

    if clear_range(state, runtime, view_data, internal_tx, range) {
        close_clear_dialog(view_data);
    }
}

/// Clears the visits inside `range`. Returns `false` when persistence failed.
fn clear_range<R: HistoryRuntime>(
    state: &mut HistoryState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    range: QuickRange,
) -> bool {
    let outcome = if range == QuickRange::All {
        runtime
            .clear_history()
            .map(|removed| (removed, HistoryCommand::ClearEntries))
    } else {
        let ids = state.ids_in_range(range);
        runtime
            .delete_entries(&ids)
            .map(|removed| (removed, HistoryCommand::RemoveEntries(ids)))
    };

    match outcome {
        Ok((removed, command)) => {
            dispatch(state, view_data, command);
            emit_status(
                state,
                view_data,
                internal_tx,
                format!(
                    "cleared {removed} {} ({})",
                    pluralize_visits(removed),
                    range.label().to_lowercase()
                ),
            );
            true
        }
        Err(error) => {
            log::warn!("clearing {} failed: {error:#}", range.as_str());
            emit_status(
                state,
                view_data,
                internal_tx,
                format!("clear failed: {error}"),
            );
            false
        }
    }
}

fn pluralize_visits(count: usize) -> &'static str {
    if count == 1 { "visit" } else { "visits" }
}

fn handle_key_event<R: HistoryRuntime>(
    state: &mut HistoryState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if view_data.clear_dialog.visible {
        handle_clear_dialog_key(state, runtime, view_data, internal_tx, key);
        return false;
    }

    if view_data.search_focused {
        handle_search_key(state, view_data, key);
        return false;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return false;
    }

    match key.code {
        KeyCode::Char('/') => view_data.search_focused = true,
        KeyCode::Char(digit @ '1'..='6') => {
            let index = digit as usize - '1' as usize;
            if let Some(range) = QuickRange::ALL.get(index) {
                on_range_click(state, view_data, *range);
            }
        }
        KeyCode::Char('j') | KeyCode::Down => move_cursor(view_data, 1),
        KeyCode::Char('k') | KeyCode::Up => move_cursor(view_data, -1),
        KeyCode::Char(' ') => {
            if let Some(id) = view_data.model.entry_at(view_data.cursor).map(|entry| entry.id) {
                dispatch(state, view_data, HistoryCommand::ToggleSelected(id));
            }
        }
        KeyCode::Char('d') => {
            let mut click = ClickEvent::new(0, 0);
            on_delete_click(state, runtime, view_data, internal_tx, &mut click);
        }
        KeyCode::Esc => {
            let mut click = ClickEvent::new(0, 0);
            on_cancel_click(state, view_data, &mut click);
        }
        KeyCode::Char('C') => open_clear_dialog(view_data),
        KeyCode::Char('t') => {
            let theme = state.theme().toggled();
            dispatch(state, view_data, HistoryCommand::SetTheme(theme));
        }
        _ => {}
    }
    false
}

fn handle_search_key(state: &mut HistoryState, view_data: &mut ViewData, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Enter => view_data.search_focused = false,
        KeyCode::Backspace => {
            let mut value = state.search_query().to_owned();
            if value.pop().is_some() {
                on_search_input(state, view_data, value);
            }
        }
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            let mut value = state.search_query().to_owned();
            value.push(ch);
            on_search_input(state, view_data, value);
        }
        _ => {}
    }
}

fn handle_clear_dialog_key<R: HistoryRuntime>(
    state: &mut HistoryState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let dropdown = &mut view_data.clear_dialog.dropdown;
    if dropdown.is_open() {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => dropdown.move_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => dropdown.move_cursor(-1),
            KeyCode::Enter => dropdown.select_highlighted(),
            KeyCode::Esc => dropdown.close(),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Enter => dropdown.apply(DropdownAction::Open),
        KeyCode::Char('y') => confirm_clear_dialog(state, runtime, view_data, internal_tx),
        KeyCode::Char('n') | KeyCode::Esc => close_clear_dialog(view_data),
        _ => {}
    }
}

fn move_cursor(view_data: &mut ViewData, delta: isize) {
    let count = view_data.model.entry_count();
    if count == 0 {
        view_data.cursor = 0;
        return;
    }
    let next = (view_data.cursor as isize + delta).clamp(0, count as isize - 1);
    view_data.cursor = next as usize;
}

fn handle_mouse_event<R: HistoryRuntime>(
    state: &mut HistoryState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    mouse: MouseEvent,
) {
    if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
        return;
    }
    let mut click = ClickEvent::new(mouse.column, mouse.row);
    handle_click(state, runtime, view_data, internal_tx, &mut click);
}

/// Routes one click: target handlers first, outside-click listeners last.
fn handle_click<R: HistoryRuntime>(
    state: &mut HistoryState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    event: &mut ClickEvent,
) {
    let point = Position::new(event.column, event.row);
    let target = view_data
        .hit_map
        .target_at(point, view_data.clear_dialog.visible);

    match target {
        Some(ClickTarget::Range(range)) => on_range_click(state, view_data, range),
        Some(ClickTarget::ClearData) => on_clear_click(state, runtime, view_data, internal_tx),
        Some(ClickTarget::Search) => view_data.search_focused = true,
        Some(ClickTarget::Entry(id)) => {
            if let Some(position) = view_data.model.position_of(id) {
                view_data.cursor = position;
            }
            dispatch(state, view_data, HistoryCommand::ToggleSelected(id));
        }
        Some(ClickTarget::DeleteSelected) => {
            on_delete_click(state, runtime, view_data, internal_tx, event);
        }
        Some(ClickTarget::CancelSelection) => on_cancel_click(state, view_data, event),
        Some(ClickTarget::DropdownHeader) => {
            view_data.clear_dialog.dropdown.apply(DropdownAction::Open);
        }
        Some(ClickTarget::DropdownItem(action)) => view_data.clear_dialog.dropdown.apply(action),
        Some(ClickTarget::ConfirmClear) => {
            confirm_clear_dialog(state, runtime, view_data, internal_tx);
        }
        Some(ClickTarget::CancelClear) => close_clear_dialog(view_data),
        None => {}
    }

    let dropdown = &mut view_data.clear_dialog.dropdown;
    if dropdown.listener().is_attached() && !event.is_propagation_stopped() {
        dropdown.handle_outside_click(event);
    }
}

#[derive(Debug, Clone, Copy)]
struct Palette {
    fg: Color,
    bg: Color,
    muted: Color,
}

fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Light => Palette {
            fg: Color::Black,
            bg: Color::White,
            muted: Color::DarkGray,
        },
        Theme::Dark => Palette {
            fg: Color::White,
            bg: Color::Black,
            muted: Color::Gray,
        },
    }
}

fn accent_color(value: &str) -> Color {
    Color::from_str(value).unwrap_or(Color::Cyan)
}

fn render(frame: &mut ratatui::Frame<'_>, state: &HistoryState, view_data: &ViewData) -> HitMap {
    let model = &view_data.model;
    let colors = palette(model.theme);
    let accent = accent_color(&view_data.clear_dialog.dropdown.config().color);
    let mut hits = HitMap::default();
    let area = frame.area();

    frame.render_widget(
        Block::default().style(Style::default().fg(colors.fg).bg(colors.bg)),
        area,
    );

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(area);

    let header = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(DRAWER_WIDTH), Constraint::Min(10)])
        .split(layout[0]);
    let title = Paragraph::new(Line::styled(
        model.title,
        Style::default().add_modifier(Modifier::BOLD),
    ))
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(title, header[0]);
    render_search(frame, header[1], view_data, accent, colors, &mut hits);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(DRAWER_WIDTH), Constraint::Min(20)])
        .split(layout[1]);
    render_drawer(frame, body[0], model, accent, &mut hits);

    if model.selection_dialog.visible {
        let content = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(3)])
            .split(body[1]);
        render_sections(frame, content[0], model, view_data.cursor, colors, &mut hits);
        render_selection_dialog(frame, content[1], model.selection_dialog, accent, &mut hits);
    } else {
        render_sections(frame, body[1], model, view_data.cursor, colors, &mut hits);
    }

    let status = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(colors.muted))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[2]);

    if view_data.clear_dialog.visible {
        hits = HitMap::default();
        render_clear_dialog(
            frame,
            &view_data.clear_dialog.dropdown.view(),
            colors,
            &mut hits,
        );
    }

    hits
}

fn render_search(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    view_data: &ViewData,
    accent: Color,
    colors: Palette,
    hits: &mut HitMap,
) {
    let query = &view_data.model.search_query;
    let line = if view_data.search_focused {
        Line::from(format!("{query}_"))
    } else if query.is_empty() {
        Line::styled("Search history", Style::default().fg(colors.muted))
    } else {
        Line::from(query.clone())
    };
    let border = if view_data.search_focused {
        Style::default().fg(accent)
    } else {
        Style::default()
    };
    let search = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title("/ search"),
    );
    frame.render_widget(search, area);
    hits.search = Some(area);
}

fn render_drawer(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    model: &HistoryViewModel,
    accent: Color,
    hits: &mut HitMap,
) {
    let block = Block::default().borders(Borders::ALL).title("ranges");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = Vec::with_capacity(model.ranges.len() + 2);
    for (index, item) in model.ranges.iter().enumerate() {
        let (marker, style) = if item.is_selected {
            (
                "●",
                Style::default().fg(accent).add_modifier(Modifier::BOLD),
            )
        } else {
            ("○", Style::default())
        };
        lines.push(Line::styled(
            format!("{marker} {} {}", index + 1, item.label),
            style,
        ));
        if let Some(rect) = row_rect(inner, index) {
            hits.ranges.push((rect, item.range));
        }
    }
    lines.push(Line::default());
    lines.push(Line::from(CLEAR_DATA_LABEL));
    hits.clear_data = row_rect(inner, model.ranges.len() + 1);

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_sections(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    model: &HistoryViewModel,
    cursor: usize,
    colors: Palette,
    hits: &mut HitMap,
) {
    let block = Block::default().borders(Borders::ALL).title(model.title);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if model.sections.is_empty() {
        let empty = if model.search_query.is_empty() {
            "No history in this range".to_owned()
        } else {
            format!("No history matches \"{}\"", model.search_query)
        };
        frame.render_widget(
            Paragraph::new(Line::styled(empty, Style::default().fg(colors.muted))),
            inner,
        );
        return;
    }

    let mut lines = Vec::new();
    let mut line_entries = Vec::new();
    let mut cursor_line = 0usize;
    let mut flat = 0usize;
    for section in &model.sections {
        lines.push(Line::styled(
            section.label.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        line_entries.push(None);
        for entry in &section.entries {
            let mut style = Style::default();
            if flat == cursor {
                cursor_line = lines.len();
                style = style.add_modifier(Modifier::REVERSED);
            }
            let mark = if entry.is_selected { "[x]" } else { "[ ]" };
            lines.push(Line::from(vec![
                Span::styled(format!("{mark} {}  ", entry.time), style),
                Span::styled(entry.title.clone(), style),
                Span::styled(format!("  {}", entry.host), style.fg(colors.muted)),
            ]));
            line_entries.push(Some(entry.id));
            flat += 1;
        }
    }

    let height = usize::from(inner.height);
    let offset = cursor_line.saturating_sub(height.saturating_sub(1));
    for (row, id) in line_entries.iter().skip(offset).take(height).enumerate() {
        if let (Some(id), Some(rect)) = (id, row_rect(inner, row)) {
            hits.entries.push((rect, *id));
        }
    }
    let visible = lines
        .into_iter()
        .skip(offset)
        .take(height)
        .collect::<Vec<_>>();
    frame.render_widget(Paragraph::new(visible), inner);
}

fn render_selection_dialog(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    dialog: SelectionDialogView,
    accent: Color,
    hits: &mut HitMap,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent))
        .title(format!("{} selected", dialog.amount));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let line = Line::from(vec![
        Span::styled(DELETE_BUTTON, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        Span::raw(CANCEL_BUTTON),
    ]);
    frame.render_widget(Paragraph::new(line), inner);

    hits.delete_button = button_rect(inner, 0, DELETE_BUTTON);
    hits.cancel_button = button_rect(inner, text_width(DELETE_BUTTON) + 2, CANCEL_BUTTON);
}

fn render_clear_dialog(
    frame: &mut ratatui::Frame<'_>,
    dropdown: &DropdownView,
    colors: Palette,
    hits: &mut HitMap,
) {
    let area = centered_rect(60, 60, frame.area());
    frame.render_widget(Clear, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(CLEAR_DATA_LABEL)
        .style(Style::default().fg(colors.fg).bg(colors.bg));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(inner);

    frame.render_widget(
        Paragraph::new(Line::styled(
            "Remove visits from the chosen time range.",
            Style::default().fg(colors.muted),
        )),
        rows[0],
    );

    let accent = accent_color(&dropdown.accent);
    let border = if dropdown.is_activated {
        Style::default().fg(accent)
    } else {
        Style::default()
    };
    let mut header_block = Block::default().borders(Borders::ALL).border_style(border);
    if dropdown.label_raised {
        header_block = header_block.title(Span::styled(dropdown.label.clone(), border));
    }
    let header_line = match (&dropdown.value, dropdown.label_raised) {
        (Some(value), _) => Line::from(format!("{value} ▾")),
        (None, true) => Line::from("▾"),
        (None, false) => Line::styled(
            format!("{} ▾", dropdown.label),
            Style::default().fg(colors.muted),
        ),
    };
    frame.render_widget(Paragraph::new(header_line).block(header_block), rows[1]);
    hits.dropdown_header = Some(rows[1]);

    let buttons = Line::from(vec![
        Span::styled(
            CONFIRM_CLEAR_BUTTON,
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::raw(CANCEL_BUTTON),
    ]);
    frame.render_widget(Paragraph::new(buttons), rows[3]);
    hits.confirm_button = button_rect(rows[3], 0, CONFIRM_CLEAR_BUTTON);
    hits.dismiss_button = button_rect(
        rows[3],
        text_width(CONFIRM_CLEAR_BUTTON) + 2,
        CANCEL_BUTTON,
    );

    if !dropdown.is_open {
        return;
    }

    let menu_height = (dropdown.items.len() as u16 + 2).min(rows[2].height);
    let menu = Rect::new(rows[1].x, rows[2].y, rows[1].width, menu_height);
    frame.render_widget(Clear, menu);
    let menu_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent))
        .style(Style::default().fg(colors.fg).bg(colors.bg));
    let menu_inner = menu_block.inner(menu);
    frame.render_widget(menu_block, menu);

    let mut lines = Vec::with_capacity(dropdown.items.len());
    for (index, item) in dropdown.items.iter().enumerate() {
        let mut style = Style::default();
        if item.is_highlighted {
            style = style.add_modifier(Modifier::REVERSED);
        }
        if item.is_selected {
            style = style.fg(accent);
        }
        let mark = if item.is_selected { SELECTED_MARK } else { " " };
        lines.push(Line::styled(format!("{mark} {}", item.label), style));
        if let Some(rect) = row_rect(menu_inner, index) {
            hits.dropdown_items.push((rect, item.on_select.clone()));
        }
    }
    frame.render_widget(Paragraph::new(lines), menu_inner);
}

/// One-row rect at `row` inside `area`, or `None` when it falls outside.
fn row_rect(area: Rect, row: usize) -> Option<Rect> {
    let row = u16::try_from(row).ok()?;
    (row < area.height).then(|| Rect::new(area.x, area.y + row, area.width, 1))
}

fn button_rect(area: Rect, offset: u16, label: &str) -> Option<Rect> {
    if area.height == 0 || offset >= area.width {
        return None;
    }
    let width = text_width(label).min(area.width - offset);
    Some(Rect::new(area.x + offset, area.y, width, 1))
}

fn text_width(text: &str) -> u16 {
    u16::try_from(text.chars().count()).unwrap_or(u16::MAX)
}

fn status_text(state: &HistoryState, view_data: &ViewData) -> String {
    let hints = if view_data.clear_dialog.visible {
        if view_data.clear_dialog.dropdown.is_open() {
            "j/k move | enter pick | esc close menu"
        } else {
            "enter choose range | y clear | n/esc cancel"
        }
    } else if view_data.search_focused {
        "type to search | enter/esc done"
    } else {
        "/ search | 1-6 range | j/k move | space select | d delete | esc cancel | C clear | t theme | ctrl+q"
    };
    match &state.status_line {
        Some(status) => format!("{status} | {hints}"),
        None => hints.to_owned(),
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
