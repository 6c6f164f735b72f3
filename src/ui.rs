use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols::border,
    text::{Line, Span, Text},
    widgets::{Block, Cell, Clear, Paragraph, Row, Table},
};

use crate::domain::InputMode;
use crate::engine::{DerivedView, FilterValue, HeaderControl, HeaderModel};
use crate::filter_widget::{FilterKind, TEXT_PLACEHOLDER};
use crate::inputter::InputResult;
use crate::model::Model;
use crate::schema::CellContent;

pub const MAX_COLUMN_WIDTH: usize = 32;
pub const FILTER_INPUT_WIDTH: usize = 12;
pub const TABLE_HEADER_HEIGHT: u16 = 2;
pub const HEADER_MARGIN: u16 = 1;
pub const FOOTER_HEIGHT: u16 = 1;
pub const PAGER_HEIGHT: u16 = 1;
pub const STATUS_HEIGHT: u16 = 1;
const BORDER_HEIGHT: u16 = 2;
pub const CURSOR: &str = "▏";
pub const IMAGE_MARKER: &str = "◉";

const DISABLED: Style = Style::new().fg(Color::DarkGray);
const FOCUSED: Style = Style::new().add_modifier(Modifier::REVERSED);
const PLACEHOLDER: Style = Style::new().fg(Color::DarkGray).add_modifier(Modifier::ITALIC);

/// Body rows the table can show in a terminal of `height` lines.
pub fn body_height(height: usize) -> usize {
    let chrome = BORDER_HEIGHT
        + PAGER_HEIGHT
        + STATUS_HEIGHT
        + TABLE_HEADER_HEIGHT
        + HEADER_MARGIN
        + FOOTER_HEIGHT;
    height.saturating_sub(chrome as usize)
}

#[derive(Debug, Default)]
pub struct GridUI;

impl GridUI {
    pub fn draw(&self, model: &Model, frame: &mut Frame) {
        let title = Line::from(format!(" usergrid: {} ", model.name()).bold());
        let instructions = Line::from(vec![
            " Sort ".into(),
            "<Enter>".blue().bold(),
            " Filter ".into(),
            "</>".blue().bold(),
            " Pages ".into(),
            "<p/n>".blue().bold(),
            " Help ".into(),
            "<?>".blue().bold(),
            " Quit ".into(),
            "<q> ".blue().bold(),
        ]);
        let block = Block::bordered()
            .title(title.centered())
            .title_bottom(instructions.centered())
            .border_set(border::THICK);

        let inner = block.inner(frame.area());
        frame.render_widget(block, frame.area());

        let [table_area, pager_area, status_area] = Layout::vertical([
            Constraint::Min(TABLE_HEADER_HEIGHT + HEADER_MARGIN + FOOTER_HEIGHT),
            Constraint::Length(PAGER_HEIGHT),
            Constraint::Length(STATUS_HEIGHT),
        ])
        .areas(inner);

        self.draw_table(model, frame, table_area);
        frame.render_widget(Paragraph::new(pager_line(model)).centered(), pager_area);
        frame.render_widget(Paragraph::new(status_line(model)), status_area);

        if model.show_popup() {
            self.draw_popup(model, frame, inner);
        }
    }

    fn draw_table(&self, model: &Model, frame: &mut Frame, area: Rect) {
        let view = model.grid().view();
        let editing = model.editing_field().zip(model.active_input().map(|(_, r)| r));

        let widths: Vec<Constraint> = column_widths(view)
            .into_iter()
            .map(|w| Constraint::Length(w as u16))
            .collect();

        let header = Row::new(view.headers.iter().enumerate().map(|(idx, h)| {
            let input = editing.filter(|(field, _)| *field == h.field).map(|(_, r)| r);
            let cell = Cell::from(header_text(h, input));
            if idx == model.focus() {
                cell.style(FOCUSED)
            } else {
                cell
            }
        }))
        .style(Style::new().bold())
        .height(TABLE_HEADER_HEIGHT)
        .bottom_margin(HEADER_MARGIN);

        let rows = view
            .rows
            .iter()
            .skip(model.row_offset())
            .take(model.visible_rows())
            .map(|row| Row::new(row.cells.iter().map(body_cell)));

        let footer = Row::new(
            view.footers
                .iter()
                .map(|f| Cell::from(f.as_str()).style(DISABLED)),
        )
        .height(FOOTER_HEIGHT);

        let table = Table::new(rows, widths)
            .header(header)
            .footer(footer)
            .column_spacing(1);
        frame.render_widget(table, area);
    }

    fn draw_popup(&self, model: &Model, frame: &mut Frame, area: Rect) {
        let text = model.help_text();
        let height = text.lines().count() as u16 + 2;
        let width = text.lines().map(|l| l.chars().count()).max().unwrap_or(0) as u16 + 4;
        let [popup] = Layout::vertical([Constraint::Length(height)])
            .flex(Flex::Center)
            .areas(area);
        let [popup] = Layout::horizontal([Constraint::Length(width)])
            .flex(Flex::Center)
            .areas(popup);

        frame.render_widget(Clear, popup);
        frame.render_widget(
            Paragraph::new(text).block(Block::bordered().title(" Help ".bold())),
            popup,
        );
    }
}

fn column_widths(view: &DerivedView) -> Vec<usize> {
    view.headers
        .iter()
        .enumerate()
        .map(|(idx, h)| {
            let header = h.label.chars().count()
                + match h.control {
                    HeaderControl::Sort(_) => 2,
                    _ => 0,
                };
            let filter = match h.control {
                HeaderControl::Filter { .. } => FILTER_INPUT_WIDTH,
                _ => 0,
            };
            let cells = view
                .rows
                .iter()
                .map(|r| cell_text(&r.cells[idx]).chars().count())
                .max()
                .unwrap_or(0);
            let footer = view.footers.get(idx).map(|f| f.chars().count()).unwrap_or(0);
            header
                .max(filter)
                .max(cells)
                .max(footer)
                .min(MAX_COLUMN_WIDTH)
        })
        .collect()
}

fn cell_text(content: &CellContent) -> String {
    match content {
        CellContent::Text(s) => s.clone(),
        CellContent::Image { src, alt } => {
            let file = src.rsplit('/').next().filter(|s| !s.is_empty()).unwrap_or(alt.as_str());
            format!("{IMAGE_MARKER} {file}")
        }
    }
}

fn body_cell(content: &CellContent) -> Cell<'static> {
    let text = cell_text(content);
    match content {
        CellContent::Text(_) => Cell::from(text),
        CellContent::Image { .. } => Cell::from(text).style(Style::new().fg(Color::Cyan)),
    }
}

/// Input text with a cursor at the edit position.
fn input_spans(input: &InputResult) -> Vec<Span<'static>> {
    let before: String = input.input.chars().take(input.cursor_pos).collect();
    let after: String = input.input.chars().skip(input.cursor_pos).collect();
    vec![
        Span::raw("["),
        Span::raw(before),
        Span::raw(CURSOR).rapid_blink(),
        Span::raw(after),
        Span::raw("]"),
    ]
}

fn filter_spans(kind: FilterKind, value: Option<&FilterValue>) -> Vec<Span<'static>> {
    let text = kind.input_text(value);
    let content = match (kind, text.is_empty()) {
        (FilterKind::Text, true) => Span::styled(TEXT_PLACEHOLDER, PLACEHOLDER),
        (_, _) => Span::raw(text),
    };
    vec![Span::raw("["), content, Span::raw("]")]
}

fn header_text(header: &HeaderModel, input: Option<&InputResult>) -> Text<'static> {
    match &header.control {
        HeaderControl::Filter { kind, value } => {
            let control = match input {
                Some(input) => input_spans(input),
                None => filter_spans(*kind, value.as_ref()),
            };
            Text::from(vec![
                Line::from(header.label.clone()),
                Line::from(control).style(Style::new().not_bold()),
            ])
        }
        HeaderControl::Sort(direction) => {
            let glyph = direction.map(|d| d.glyph()).unwrap_or("");
            Text::from(Line::from(format!("{}{}", header.label, glyph)))
        }
        HeaderControl::None => Text::from(Line::from(header.label.clone())),
    }
}

fn button(label: &'static str, enabled: bool) -> Span<'static> {
    if enabled {
        Span::styled(label, Style::new().bold())
    } else {
        Span::styled(label, DISABLED)
    }
}

fn pager_line(model: &Model) -> Line<'static> {
    let view = model.grid().view();
    let (back, forward) = (view.can_previous_page(), view.can_next_page());

    let mut spans = vec![
        button("<<", back),
        Span::raw(" "),
        button("<", back),
        Span::raw(" "),
        button(">", forward),
        Span::raw(" "),
        button(">>", forward),
        Span::raw("  Page "),
        Span::styled(
            format!("{} of {}", view.display_page(), view.page_count),
            Style::new().bold(),
        ),
        Span::raw("  | Go to page: "),
    ];
    match model.active_input() {
        Some((InputMode::GoToPage, input)) => spans.extend(input_spans(input)),
        _ => spans.push(Span::raw(format!("[{}]", view.display_page()))),
    }
    spans.push(Span::raw("  "));
    spans.push(Span::styled(
        format!("Show {}", view.page_size),
        Style::new().underlined(),
    ));
    Line::from(spans)
}

fn status_line(model: &Model) -> Line<'static> {
    let grid = model.grid();
    let mut spans = vec![
        Span::raw(model.status_message().to_string()),
        Span::raw("  "),
        Span::styled(
            format!(
                "{}/{} rows",
                grid.view().filtered.len(),
                grid.records().len()
            ),
            DISABLED,
        ),
    ];
    // Part of the page is off screen.
    let page_rows = grid.view().window.len();
    if model.visible_rows() < page_rows {
        let first = model.row_offset() + 1;
        let last = (model.row_offset() + model.visible_rows()).min(page_rows);
        spans.push(Span::styled(
            format!("  showing {first}-{last} of {page_rows} on this page"),
            DISABLED,
        ));
    }
    Line::from(spans)
}
