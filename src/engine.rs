use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::dataset::UserRecord;
use crate::domain::GridError;
use crate::filter_widget::FilterKind;
use crate::schema::{CellContent, CellValue, ColumnSpec, Field};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn glyph(&self) -> &'static str {
        match self {
            SortDirection::Ascending => " ↑",
            SortDirection::Descending => " ↓",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: Field,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Range { min: Option<f64>, max: Option<f64> },
}

impl FilterValue {
    /// Empty text and unbounded ranges filter nothing.
    pub fn is_active(&self) -> bool {
        match self {
            FilterValue::Text(s) => !s.is_empty(),
            FilterValue::Range { min, max } => min.is_some() || max.is_some(),
        }
    }
}

/// A page size the grid accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSize(usize);

impl PageSize {
    pub const CHOICES: [usize; 3] = [10, 30, 50];

    pub fn get(&self) -> usize {
        self.0
    }

    /// The next choice, wrapping around after the largest.
    pub fn next(&self) -> PageSize {
        let pos = Self::CHOICES.iter().position(|&c| c == self.0).unwrap_or(0);
        PageSize(Self::CHOICES[(pos + 1) % Self::CHOICES.len()])
    }
}

impl Default for PageSize {
    fn default() -> Self {
        PageSize(Self::CHOICES[0])
    }
}

impl TryFrom<usize> for PageSize {
    type Error = GridError;

    fn try_from(size: usize) -> Result<Self, Self::Error> {
        if Self::CHOICES.contains(&size) {
            Ok(PageSize(size))
        } else {
            Err(GridError::InvalidPageSize(size))
        }
    }
}

/// UI owned state the derived view is computed from.
///
/// All setters leave `self` untouched and return the next state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub sort: Vec<SortKey>,
    pub filters: BTreeMap<Field, FilterValue>,
    pub page_index: usize,
    pub page_size: PageSize,
}

impl ViewState {
    pub fn with_page_size(page_size: PageSize) -> Self {
        Self {
            page_size,
            ..Self::default()
        }
    }

    pub fn set_sort(&self, sort: Vec<SortKey>) -> ViewState {
        ViewState {
            sort,
            ..self.clone()
        }
    }

    /// Cycles `field` through unsorted, ascending, descending and back, dropping any other key.
    pub fn toggle_sort(&self, field: Field) -> ViewState {
        let current = self
            .sort
            .iter()
            .find(|k| k.field == field)
            .map(|k| k.direction);
        let next = match current {
            None => Some(SortDirection::Ascending),
            Some(SortDirection::Ascending) => Some(SortDirection::Descending),
            Some(SortDirection::Descending) => None,
        };
        self.set_sort(
            next.map(|direction| SortKey { field, direction })
                .into_iter()
                .collect(),
        )
    }

    pub fn sort_direction(&self, field: Field) -> Option<SortDirection> {
        self.sort
            .iter()
            .find(|k| k.field == field)
            .map(|k| k.direction)
    }

    pub fn set_filter(&self, field: Field, value: Option<FilterValue>) -> ViewState {
        let mut next = self.clone();
        match value {
            Some(v) if v.is_active() => {
                next.filters.insert(field, v);
            }
            _ => {
                next.filters.remove(&field);
            }
        }
        next
    }

    pub fn set_page_index(&self, page_index: usize) -> ViewState {
        ViewState {
            page_index,
            ..self.clone()
        }
    }

    /// Changes the page size, keeping the first row of the current page visible.
    pub fn set_page_size(&self, page_size: PageSize) -> ViewState {
        let top_row = self.page_index.saturating_mul(self.page_size.get());
        ViewState {
            page_size,
            page_index: top_row / page_size.get(),
            ..self.clone()
        }
    }

    pub fn clamp_page_index(&self, page_count: usize) -> ViewState {
        self.set_page_index(clamp_page(self.page_index, page_count))
    }

    pub fn first_page(&self) -> ViewState {
        self.set_page_index(0)
    }

    pub fn previous_page(&self) -> ViewState {
        self.set_page_index(self.page_index.saturating_sub(1))
    }

    pub fn next_page(&self) -> ViewState {
        self.set_page_index(self.page_index.saturating_add(1))
    }

    /// Jumps past the end; the index is clamped on the next derivation.
    pub fn last_page(&self) -> ViewState {
        self.set_page_index(usize::MAX)
    }
}

fn clamp_page(page_index: usize, page_count: usize) -> usize {
    page_index.min(page_count.saturating_sub(1))
}

/// Header area control of a column. Filterable columns show their filter, all others the
/// sort state.
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderControl {
    Filter {
        kind: FilterKind,
        value: Option<FilterValue>,
    },
    Sort(Option<SortDirection>),
    None,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderModel {
    pub field: Field,
    pub label: String,
    pub control: HeaderControl,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowModel {
    pub record_idx: usize,
    pub cells: Vec<CellContent>,
}

/// Filtered, sorted and paginated projection of the records. Record indices point into the
/// slice the view was derived from.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedView {
    pub filtered: Vec<usize>,
    pub sorted: Vec<usize>,
    pub page_index: usize,
    pub page_size: usize,
    pub page_count: usize,
    pub window: Vec<usize>,
    pub headers: Vec<HeaderModel>,
    pub rows: Vec<RowModel>,
    pub footers: Vec<String>,
}

impl DerivedView {
    pub fn can_previous_page(&self) -> bool {
        self.page_index > 0
    }

    pub fn can_next_page(&self) -> bool {
        self.page_index + 1 < self.page_count
    }

    /// 1-based page shown to the user, 0 when there is nothing to show.
    pub fn display_page(&self) -> usize {
        if self.page_count == 0 {
            0
        } else {
            self.page_index + 1
        }
    }
}

/// Computes the view of `records` for `state`.
pub fn derive(records: &[UserRecord], columns: &[ColumnSpec], state: &ViewState) -> DerivedView {
    let filtered = filter_rows(records, &state.filters);
    let mut sorted = filtered.clone();
    sort_rows(records, &mut sorted, &state.sort);

    let page_size = state.page_size.get();
    let page_count = sorted.len().div_ceil(page_size);
    let page_index = clamp_page(state.page_index, page_count);
    let begin = std::cmp::min(page_index.saturating_mul(page_size), sorted.len());
    let end = std::cmp::min(begin + page_size, sorted.len());
    let window = sorted[begin..end].to_vec();

    let rows = window
        .iter()
        .map(|&record_idx| RowModel {
            record_idx,
            cells: columns
                .iter()
                .map(|c| c.render_cell(&records[record_idx]))
                .collect(),
        })
        .collect();

    trace!(
        "Derived view: {} of {} rows, page {}/{} ({} per page), sort {:?}",
        filtered.len(),
        records.len(),
        page_index,
        page_count,
        page_size,
        state.sort
    );

    DerivedView {
        filtered,
        sorted,
        page_index,
        page_size,
        page_count,
        window,
        headers: header_models(records, columns, state),
        rows,
        footers: columns.iter().map(|c| c.footer_label().to_string()).collect(),
    }
}

fn header_models(records: &[UserRecord], columns: &[ColumnSpec], state: &ViewState) -> Vec<HeaderModel> {
    columns
        .iter()
        .map(|c| {
            let control = if c.filterable {
                HeaderControl::Filter {
                    kind: FilterKind::detect(records, c.field),
                    value: state.filters.get(&c.field).cloned(),
                }
            } else if c.sortable {
                HeaderControl::Sort(state.sort_direction(c.field))
            } else {
                HeaderControl::None
            };
            HeaderModel {
                field: c.field,
                label: c.header.clone(),
                control,
            }
        })
        .collect()
}

/// A filter with its text term lower cased once.
enum Predicate<'a> {
    Contains(Field, String),
    Range(Field, &'a Option<f64>, &'a Option<f64>),
}

impl Predicate<'_> {
    fn matches(&self, record: &UserRecord) -> bool {
        match self {
            Predicate::Contains(field, term) => record
                .value(*field)
                .to_string()
                .to_lowercase()
                .contains(term.as_str()),
            Predicate::Range(field, min, max) => match record.value(*field).as_f64() {
                Some(v) => min.is_none_or(|m| v >= m) && max.is_none_or(|m| v <= m),
                None => false,
            },
        }
    }
}

/// Indices of the records satisfying every active filter, in insertion order.
pub fn filter_rows(records: &[UserRecord], filters: &BTreeMap<Field, FilterValue>) -> Vec<usize> {
    let predicates: Vec<Predicate> = filters
        .iter()
        .filter(|(_, value)| value.is_active())
        .map(|(&field, value)| match value {
            FilterValue::Text(term) => Predicate::Contains(field, term.to_lowercase()),
            FilterValue::Range { min, max } => Predicate::Range(field, min, max),
        })
        .collect();

    if predicates.is_empty() {
        return (0..records.len()).collect();
    }

    (0..records.len())
        .into_par_iter()
        .filter(|&idx| predicates.iter().all(|p| p.matches(&records[idx])))
        .collect()
}

fn compare_values(a: CellValue, b: CellValue) -> Ordering {
    match (a, b) {
        (CellValue::Integer(a), CellValue::Integer(b)) => a.cmp(&b),
        (a, b) => a.to_string().cmp(&b.to_string()),
    }
}

/// Stable sort of `rows` by the sort keys, first key first.
pub fn sort_rows(records: &[UserRecord], rows: &mut [usize], sort: &[SortKey]) {
    if sort.is_empty() {
        return;
    }
    rows.sort_by(|&a, &b| {
        sort.iter().fold(Ordering::Equal, |ord, key| {
            ord.then_with(|| {
                let o = compare_values(records[a].value(key.field), records[b].value(key.field));
                match key.direction {
                    SortDirection::Ascending => o,
                    SortDirection::Descending => o.reverse(),
                }
            })
        })
    });
}

/// Owns the records, columns and the current state and keeps the derived view in sync.
pub struct Grid {
    records: Arc<Vec<UserRecord>>,
    columns: Vec<ColumnSpec>,
    state: ViewState,
    view: DerivedView,
}

impl Grid {
    pub fn new(records: Arc<Vec<UserRecord>>, columns: Vec<ColumnSpec>, state: ViewState) -> Self {
        let view = derive(&records, &columns, &state);
        let state = state.clamp_page_index(view.page_count);
        Self {
            records,
            columns,
            state,
            view,
        }
    }

    pub fn records(&self) -> &[UserRecord] {
        &self.records
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn view(&self) -> &DerivedView {
        &self.view
    }

    pub fn column(&self, field: Field) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.field == field)
    }

    /// Replaces the state and recomputes the view.
    pub fn apply(&mut self, next: ViewState) {
        self.view = derive(&self.records, &self.columns, &next);
        self.state = next.clamp_page_index(self.view.page_count);
    }

    pub fn toggle_sort(&mut self, field: Field) {
        if !self.column(field).is_some_and(|c| c.sortable) {
            debug!("Ignoring sort on {}, column is not sortable", field.key());
            return;
        }
        let next = self.state.toggle_sort(field);
        self.apply(next);
    }

    /// Keys on columns that can not be sorted are dropped.
    pub fn set_sort(&mut self, sort: Vec<SortKey>) {
        let (sort, ignored): (Vec<SortKey>, Vec<SortKey>) = sort
            .into_iter()
            .partition(|key| self.column(key.field).is_some_and(|c| c.sortable));
        for key in ignored {
            debug!("Ignoring sort on {}, column is not sortable", key.field.key());
        }
        let next = self.state.set_sort(sort);
        self.apply(next);
    }

    pub fn set_filter(&mut self, field: Field, value: Option<FilterValue>) {
        if !self.column(field).is_some_and(|c| c.filterable) {
            debug!("Ignoring filter on {}, column is not filterable", field.key());
            return;
        }
        let next = self.state.set_filter(field, value);
        self.apply(next);
    }

    pub fn filter(&self, field: Field) -> Option<&FilterValue> {
        self.state.filters.get(&field)
    }

    pub fn set_page_index(&mut self, page_index: usize) {
        let next = self.state.set_page_index(page_index);
        self.apply(next);
    }

    pub fn set_page_size(&mut self, page_size: PageSize) {
        let next = self.state.set_page_size(page_size);
        self.apply(next);
    }

    pub fn first_page(&mut self) {
        let next = self.state.first_page();
        self.apply(next);
    }

    pub fn previous_page(&mut self) {
        let next = self.state.previous_page();
        self.apply(next);
    }

    pub fn next_page(&mut self) {
        let next = self.state.next_page();
        self.apply(next);
    }

    pub fn last_page(&mut self) {
        let next = self.state.last_page();
        self.apply(next);
    }
}
