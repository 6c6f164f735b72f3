use crate::dataset::UserRecord;
use crate::engine::FilterValue;
use crate::schema::Field;

pub const TEXT_PLACEHOLDER: &str = "Search...";

/// Which input a filterable column gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Text,
    /// Only the upper bound can be edited, the lower bound is carried over as is.
    Range,
}

impl FilterKind {
    /// Looks at the first unfiltered record to decide between a numeric and a text input.
    pub fn detect(records: &[UserRecord], field: Field) -> FilterKind {
        match records.first() {
            Some(r) if r.value(field).is_numeric() => FilterKind::Range,
            _ => FilterKind::Text,
        }
    }

    /// Whether the line editor should only accept number characters.
    pub fn is_numeric(&self) -> bool {
        matches!(self, FilterKind::Range)
    }

    /// Turns the raw input into the new filter value. `None` removes the filter.
    pub fn to_filter(&self, previous: Option<&FilterValue>, input: &str) -> Option<FilterValue> {
        let value = match self {
            FilterKind::Text => FilterValue::Text(input.to_string()),
            FilterKind::Range => {
                let min = match previous {
                    Some(FilterValue::Range { min, .. }) => *min,
                    _ => None,
                };
                // Anything that is not a number leaves the bound open.
                let max = input.trim().parse::<f64>().ok().filter(|v| v.is_finite());
                FilterValue::Range { min, max }
            }
        };
        value.is_active().then_some(value)
    }

    /// Text shown inside the input for the current value.
    pub fn input_text(&self, value: Option<&FilterValue>) -> String {
        match (self, value) {
            (FilterKind::Text, Some(FilterValue::Text(s))) => s.clone(),
            (FilterKind::Range, Some(FilterValue::Range { max: Some(max), .. })) => max.to_string(),
            _ => String::new(),
        }
    }
}
