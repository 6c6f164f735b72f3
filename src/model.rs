use ratatui::crossterm::event::KeyEvent;
use std::sync::Arc;
use tracing::{debug, info, trace};

use crate::dataset::Dataset;
use crate::domain::{GridConfig, GridError, HELP_TEXT, InputMode, Message};
use crate::engine::{FilterValue, Grid, ViewState};
use crate::filter_widget::FilterKind;
use crate::inputter::{InputResult, Inputter};
use crate::schema::{ColumnSpec, Field, user_columns};
use crate::ui;

#[derive(Debug, PartialEq)]
pub enum Status {
    Ready,
    Quitting,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Modus {
    Table,
    Popup,
    CmdInput,
}

/// What an open input restores when it is canceled.
#[derive(Debug, Clone)]
enum EditOrigin {
    Filter {
        field: Field,
        kind: FilterKind,
        before: Option<FilterValue>,
    },
    Page {
        before: usize,
    },
}

/// Terminal size and the number of body rows the table can show in it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UILayout {
    pub width: usize,
    pub height: usize,
    pub body_height: usize,
}

impl UILayout {
    pub fn from_values(width: usize, height: usize) -> Self {
        let layout = UILayout {
            width,
            height,
            body_height: ui::body_height(height),
        };
        trace!("Build UILayout: {:?}", layout);
        layout
    }
}

pub struct Model {
    pub status: Status,
    modus: Modus,
    previous_modus: Modus,
    name: String,
    grid: Grid,
    focus: usize,
    input: Inputter,
    last_input: InputResult,
    edit: Option<EditOrigin>,
    status_message: String,
    layout: Option<UILayout>,
    row_offset: usize,
}

impl Model {
    pub fn new(dataset: Dataset, config: &GridConfig) -> Self {
        Self::with_columns(dataset, user_columns(), config)
    }

    pub fn with_columns(dataset: Dataset, columns: Vec<ColumnSpec>, config: &GridConfig) -> Self {
        let nrecords = dataset.records.len();
        let grid = Grid::new(
            Arc::new(dataset.records),
            columns,
            ViewState::with_page_size(config.page_size),
        );
        info!("Showing {} users from {}", nrecords, dataset.name);
        Self {
            status: Status::Ready,
            modus: Modus::Table,
            previous_modus: Modus::Table,
            name: dataset.name,
            grid,
            focus: 0,
            input: Inputter::default(),
            last_input: InputResult::default(),
            edit: None,
            status_message: format!("Loaded {nrecords} users"),
            layout: None,
            row_offset: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Index of the focused column.
    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn show_popup(&self) -> bool {
        self.modus == Modus::Popup
    }

    pub fn help_text(&self) -> &'static str {
        HELP_TEXT
    }

    /// The open input, if any.
    pub fn active_input(&self) -> Option<(InputMode, &InputResult)> {
        match self.edit {
            Some(EditOrigin::Filter { .. }) => Some((InputMode::Filter, &self.last_input)),
            Some(EditOrigin::Page { .. }) => Some((InputMode::GoToPage, &self.last_input)),
            None => None,
        }
    }

    /// Field whose filter is being edited.
    pub fn editing_field(&self) -> Option<Field> {
        match self.edit {
            Some(EditOrigin::Filter { field, .. }) => Some(field),
            _ => None,
        }
    }

    pub fn raw_keyevents(&self) -> bool {
        self.modus == Modus::CmdInput
    }

    pub fn size(&self) -> (usize, usize) {
        self.layout.map(|l| (l.width, l.height)).unwrap_or((0, 0))
    }

    /// First row of the current page that is drawn.
    pub fn row_offset(&self) -> usize {
        self.row_offset
    }

    /// Number of rows of the current page that fit on screen. Until the first resize the
    /// whole page is assumed to fit.
    pub fn visible_rows(&self) -> usize {
        match self.layout {
            Some(layout) => layout.body_height,
            None => self.grid.view().window.len(),
        }
    }

    pub fn quit(&mut self) {
        self.status = Status::Quitting;
    }

    pub fn update(&mut self, message: Option<Message>) -> Result<(), GridError> {
        let Some(msg) = message else {
            return Ok(());
        };
        trace!("Update: Modus {:?}, Message {:?}", self.modus, msg);
        let page = (self.grid.state().page_index, self.grid.state().page_size);

        match self.modus {
            Modus::Table => match msg {
                Message::Quit => self.quit(),
                Message::FocusLeft => self.focus = self.focus.saturating_sub(1),
                Message::FocusRight => {
                    self.focus = (self.focus + 1).min(self.grid.columns().len().saturating_sub(1))
                }
                Message::ScrollUp => self.row_offset = self.row_offset.saturating_sub(1),
                Message::ScrollDown => self.row_offset = self.row_offset.saturating_add(1),
                Message::ToggleSort => self.toggle_sort(),
                Message::EditFilter => self.edit_filter(),
                Message::ClearFilter => self.clear_filter(),
                Message::FirstPage => self.grid.first_page(),
                Message::PreviousPage => self.grid.previous_page(),
                Message::NextPage => self.grid.next_page(),
                Message::LastPage => self.grid.last_page(),
                Message::GoToPage => self.edit_page(),
                Message::CyclePageSize => self.cycle_page_size(),
                Message::Help => self.show_help(),
                Message::Resize(width, height) => self.ui_resize(width, height),
                _ => (),
            },
            Modus::Popup => match msg {
                Message::Quit => self.quit(),
                Message::Exit | Message::Help => self.close_popup(),
                Message::Resize(width, height) => self.ui_resize(width, height),
                _ => (),
            },
            Modus::CmdInput => match msg {
                Message::RawKey(key) => self.raw_input(key),
                Message::Resize(width, height) => self.ui_resize(width, height),
                Message::Quit => self.quit(),
                _ => (),
            },
        }

        if page != (self.grid.state().page_index, self.grid.state().page_size) {
            self.row_offset = 0;
        }
        self.clamp_row_offset();
        Ok(())
    }

    fn ui_resize(&mut self, width: usize, height: usize) {
        trace!("UI was resized! {:?} -> w:{}, h:{}", self.size(), width, height);
        self.layout = Some(UILayout::from_values(width, height));
    }

    /// Keeps the last row of the page at the bottom of the table at most.
    fn clamp_row_offset(&mut self) {
        let max_offset = self
            .grid
            .view()
            .window
            .len()
            .saturating_sub(self.visible_rows());
        self.row_offset = self.row_offset.min(max_offset);
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
    }

    fn focused_column(&self) -> Option<&ColumnSpec> {
        self.grid.columns().get(self.focus)
    }

    fn toggle_sort(&mut self) {
        let Some(column) = self.focused_column() else {
            return;
        };
        let (field, header, sortable) = (column.field, column.header.clone(), column.sortable);
        if !sortable {
            self.set_status_message(format!("{header} can not be sorted"));
            return;
        }
        self.grid.toggle_sort(field);
        let message = match self.grid.state().sort_direction(field) {
            Some(direction) => format!("Sorted by {header}{}", direction.glyph()),
            None => "Unsorted".to_string(),
        };
        self.set_status_message(message);
    }

    fn edit_filter(&mut self) {
        let Some(column) = self.focused_column() else {
            return;
        };
        let (field, header, filterable) = (column.field, column.header.clone(), column.filterable);
        if !filterable {
            self.set_status_message(format!("{header} can not be filtered"));
            return;
        }
        let kind = FilterKind::detect(self.grid.records(), field);
        let before = self.grid.filter(field).cloned();
        self.input.start(&kind.input_text(before.as_ref()), kind.is_numeric());
        self.edit = Some(EditOrigin::Filter {
            field,
            kind,
            before,
        });
        self.enter_cmd_mode();
    }

    fn clear_filter(&mut self) {
        let Some(field) = self.focused_column().filter(|c| c.filterable).map(|c| c.field) else {
            return;
        };
        self.grid.set_filter(field, None);
        self.report_rows();
    }

    fn edit_page(&mut self) {
        let view = self.grid.view();
        let before = view.page_index;
        self.input.start(&view.display_page().to_string(), true);
        self.edit = Some(EditOrigin::Page { before });
        self.enter_cmd_mode();
    }

    fn cycle_page_size(&mut self) {
        let next = self.grid.state().page_size.next();
        self.grid.set_page_size(next);
        self.set_status_message(format!("Showing {} rows per page", next.get()));
    }

    fn show_help(&mut self) {
        self.previous_modus = self.modus;
        self.modus = Modus::Popup;
    }

    fn close_popup(&mut self) {
        trace!("Close popup ...");
        self.modus = self.previous_modus;
        self.previous_modus = Modus::Popup;
    }

    fn enter_cmd_mode(&mut self) {
        trace!("Entering command mode for {:?}", self.edit);
        self.previous_modus = self.modus;
        self.modus = Modus::CmdInput;
        self.last_input = self.input.get();
    }

    fn leave_cmd_mode(&mut self) {
        self.modus = self.previous_modus;
        self.previous_modus = Modus::CmdInput;
        self.edit = None;
        self.input.clear();
        self.last_input = self.input.get();
    }

    /// Every keystroke is applied right away; Esc restores the value from before the edit.
    fn raw_input(&mut self, key: KeyEvent) {
        let Some(edit) = self.edit.clone() else {
            self.leave_cmd_mode();
            return;
        };
        self.last_input = self.input.read(key);
        let result = self.last_input.clone();

        match edit {
            EditOrigin::Filter { field, kind, before } => {
                if result.canceled {
                    self.grid.set_filter(field, before);
                } else {
                    let value = kind.to_filter(self.grid.filter(field), &result.input);
                    self.grid.set_filter(field, value);
                }
                self.report_rows();
            }
            EditOrigin::Page { before } => {
                if result.canceled {
                    self.grid.set_page_index(before);
                } else if result.input.is_empty() {
                    self.grid.set_page_index(0);
                } else if let Ok(page) = result.input.parse::<usize>() {
                    self.grid.set_page_index(page.saturating_sub(1));
                } else {
                    debug!("Ignoring page input {:?}", result.input);
                }
            }
        }

        if result.finished {
            self.leave_cmd_mode();
        }
    }

    fn report_rows(&mut self) {
        let view = self.grid.view();
        let message = format!(
            "{} of {} users match",
            view.filtered.len(),
            self.grid.records().len()
        );
        self.set_status_message(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::testing::users;
    use crate::engine::{PageSize, SortDirection};
    use ratatui::crossterm::event::{KeyCode, KeyModifiers};

    fn model(n: usize) -> Model {
        let dataset = Dataset {
            name: "test".to_string(),
            records: users(n),
        };
        Model::new(dataset, &GridConfig::default())
    }

    fn send(model: &mut Model, msg: Message) {
        model.update(Some(msg)).unwrap();
    }

    fn type_keys(model: &mut Model, s: &str) {
        for c in s.chars() {
            send(
                model,
                Message::RawKey(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)),
            );
        }
    }

    fn press(model: &mut Model, code: KeyCode) {
        send(model, Message::RawKey(KeyEvent::new(code, KeyModifiers::NONE)));
    }

    fn focus(model: &mut Model, column: usize) {
        for _ in 0..column {
            send(model, Message::FocusRight);
        }
    }

    #[test]
    fn sorting_the_focused_column() {
        let mut m = model(25);
        focus(&mut m, 3); // Age
        send(&mut m, Message::ToggleSort);
        assert_eq!(
            m.grid().state().sort_direction(Field::Age),
            Some(SortDirection::Ascending)
        );
        send(&mut m, Message::ToggleSort);
        send(&mut m, Message::ToggleSort);
        assert!(m.grid().state().sort.is_empty());
        assert_eq!(m.status_message(), "Unsorted");
    }

    #[test]
    fn unsortable_column_reports() {
        let mut m = model(5);
        focus(&mut m, 6); // Email
        send(&mut m, Message::ToggleSort);
        assert!(m.grid().state().sort.is_empty());
        assert_eq!(m.status_message(), "Email can not be sorted");
    }

    #[test]
    fn filter_applies_live_and_commits() {
        let mut m = model(25);
        focus(&mut m, 6);
        send(&mut m, Message::EditFilter);
        assert!(m.raw_keyevents());
        assert_eq!(m.editing_field(), Some(Field::Email));

        type_keys(&mut m, "mail.c");
        assert_eq!(m.grid().view().filtered.len(), 5);
        assert_eq!(m.active_input().map(|(_, r)| r.input.as_str()), Some("mail.c"));

        press(&mut m, KeyCode::Enter);
        assert!(!m.raw_keyevents());
        assert!(m.active_input().is_none());
        assert_eq!(
            m.grid().filter(Field::Email),
            Some(&FilterValue::Text("mail.c".into()))
        );
        assert_eq!(m.status_message(), "5 of 25 users match");
    }

    #[test]
    fn escape_restores_previous_filter() {
        let mut m = model(25);
        focus(&mut m, 6);
        send(&mut m, Message::EditFilter);
        type_keys(&mut m, "mail");
        press(&mut m, KeyCode::Enter);

        send(&mut m, Message::EditFilter);
        type_keys(&mut m, "zzz");
        assert!(m.grid().view().filtered.is_empty());
        press(&mut m, KeyCode::Esc);
        assert_eq!(
            m.grid().filter(Field::Email),
            Some(&FilterValue::Text("mail".into()))
        );
        assert_eq!(m.grid().view().filtered.len(), 5);
    }

    #[test]
    fn clearing_filter_restores_rows() {
        let mut m = model(25);
        focus(&mut m, 6);
        send(&mut m, Message::EditFilter);
        type_keys(&mut m, "mail.com");
        press(&mut m, KeyCode::Enter);
        send(&mut m, Message::ClearFilter);
        assert_eq!(m.grid().view().filtered.len(), 25);
    }

    #[test]
    fn unfilterable_column_does_not_open_input() {
        let mut m = model(5);
        send(&mut m, Message::EditFilter); // Avatar
        assert!(!m.raw_keyevents());
        assert_eq!(m.status_message(), "Avatar can not be filtered");
    }

    #[test]
    fn go_to_page_input() {
        let mut m = model(25);
        send(&mut m, Message::GoToPage);
        assert_eq!(m.active_input().map(|(mode, _)| mode), Some(InputMode::GoToPage));
        press(&mut m, KeyCode::Backspace);
        assert_eq!(m.grid().state().page_index, 0);
        type_keys(&mut m, "3");
        assert_eq!(m.grid().state().page_index, 2);
        press(&mut m, KeyCode::Backspace);
        type_keys(&mut m, "9");
        assert_eq!(m.grid().state().page_index, 2);
        press(&mut m, KeyCode::Enter);
        assert!(!m.raw_keyevents());

        send(&mut m, Message::GoToPage);
        press(&mut m, KeyCode::Backspace);
        type_keys(&mut m, "1");
        press(&mut m, KeyCode::Esc);
        assert_eq!(m.grid().state().page_index, 2);
    }

    #[test]
    fn page_navigation_and_size() {
        let mut m = model(25);
        send(&mut m, Message::LastPage);
        assert_eq!(m.grid().state().page_index, 2);
        send(&mut m, Message::PreviousPage);
        assert_eq!(m.grid().state().page_index, 1);
        send(&mut m, Message::CyclePageSize);
        assert_eq!(m.grid().state().page_size.get(), 30);
        assert_eq!(m.grid().view().page_count, 1);
        assert_eq!(m.grid().state().page_index, 0);
        send(&mut m, Message::NextPage);
        assert_eq!(m.grid().state().page_index, 0);
    }

    #[test]
    fn help_popup_and_quit() {
        let mut m = model(3);
        send(&mut m, Message::Help);
        assert!(m.show_popup());
        send(&mut m, Message::NextPage);
        assert_eq!(m.grid().state().page_index, 0);
        send(&mut m, Message::Exit);
        assert!(!m.show_popup());
        send(&mut m, Message::Quit);
        assert_eq!(m.status, Status::Quitting);
    }

    #[test]
    fn focus_stays_in_bounds() {
        let mut m = model(3);
        send(&mut m, Message::FocusLeft);
        assert_eq!(m.focus(), 0);
        focus(&mut m, 20);
        assert_eq!(m.focus(), 8);
    }

    #[test]
    fn numeric_filter_edits_upper_bound() {
        let columns = vec![
            ColumnSpec::new(Field::LastName, "Last Name"),
            ColumnSpec::new(Field::Age, "Age").with_sortable(false),
        ];
        let dataset = Dataset {
            name: "ages".to_string(),
            records: users(25),
        };
        let mut m = Model::with_columns(dataset, columns, &GridConfig::default());
        focus(&mut m, 1);
        send(&mut m, Message::EditFilter);

        type_keys(&mut m, "2x5");
        assert_eq!(
            m.grid().filter(Field::Age),
            Some(&FilterValue::Range { min: None, max: Some(25.0) })
        );
        let grid = m.grid();
        assert!(grid.view().filtered.iter().all(|&i| grid.records()[i].age <= 25));
        assert!(!grid.view().filtered.is_empty());

        press(&mut m, KeyCode::Backspace);
        press(&mut m, KeyCode::Backspace);
        assert!(m.grid().filter(Field::Age).is_none());
        assert_eq!(m.grid().view().filtered.len(), 25);
    }

    #[test]
    fn resize_is_recorded() {
        let mut m = model(3);
        assert_eq!(m.visible_rows(), 3);
        send(&mut m, Message::Resize(120, 40));
        assert_eq!(m.size(), (120, 40));
        assert_eq!(m.visible_rows(), ui::body_height(40));
    }

    #[test]
    fn scrolling_stays_inside_the_page() {
        let config = GridConfig {
            page_size: PageSize::try_from(50).unwrap(),
            ..GridConfig::default()
        };
        let dataset = Dataset {
            name: "test".to_string(),
            records: users(60),
        };
        let mut m = Model::new(dataset, &config);
        send(&mut m, Message::Resize(120, 30));
        assert_eq!(m.visible_rows(), 22);

        send(&mut m, Message::ScrollUp);
        assert_eq!(m.row_offset(), 0);
        for _ in 0..100 {
            send(&mut m, Message::ScrollDown);
        }
        assert_eq!(m.row_offset(), 28);

        // A taller terminal shows more rows, so less scrolling is possible.
        send(&mut m, Message::Resize(120, 40));
        assert_eq!(m.row_offset(), 18);

        send(&mut m, Message::NextPage);
        assert_eq!(m.row_offset(), 0);
        send(&mut m, Message::ScrollDown);
        assert_eq!(m.row_offset(), 0);

        send(&mut m, Message::PreviousPage);
        send(&mut m, Message::ScrollDown);
        assert_eq!(m.row_offset(), 1);
        send(&mut m, Message::CyclePageSize);
        assert_eq!(m.row_offset(), 0);
    }
}
