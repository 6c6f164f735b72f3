use std::fmt;

use derive_setters::Setters;

use crate::dataset::UserRecord;

/// The displayable fields of a [`UserRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Avatar,
    LastName,
    FirstName,
    Age,
    Gender,
    Subscription,
    Email,
    Birthdate,
    CreatedAt,
}

impl Field {
    pub const ALL: [Field; 9] = [
        Field::Avatar,
        Field::LastName,
        Field::FirstName,
        Field::Age,
        Field::Gender,
        Field::Subscription,
        Field::Email,
        Field::Birthdate,
        Field::CreatedAt,
    ];

    /// Key of the field in the dataset files.
    pub fn key(&self) -> &'static str {
        match self {
            Field::Avatar => "avatar",
            Field::LastName => "lastName",
            Field::FirstName => "firstName",
            Field::Age => "age",
            Field::Gender => "gender",
            Field::Subscription => "subscription",
            Field::Email => "email",
            Field::Birthdate => "birthdate",
            Field::CreatedAt => "createdAt",
        }
    }

    pub fn from_key(key: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.key() == key)
    }
}

/// A raw field value as read from a record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellValue<'a> {
    Text(&'a str),
    Integer(i64),
}

impl CellValue<'_> {
    pub fn is_numeric(&self) -> bool {
        matches!(self, CellValue::Integer(_))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Integer(v) => Some(*v as f64),
            CellValue::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for CellValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => f.write_str(s),
            CellValue::Integer(v) => write!(f, "{v}"),
        }
    }
}

/// What a body cell shows.
#[derive(Debug, Clone, PartialEq)]
pub enum CellContent {
    Text(String),
    Image { src: String, alt: String },
}

pub type CellFormatter = fn(&UserRecord) -> CellContent;

#[derive(Debug, Clone, Setters)]
#[setters(prefix = "with_")]
pub struct ColumnSpec {
    #[setters(skip)]
    pub field: Field,
    #[setters(skip)]
    pub header: String,
    pub sortable: bool,
    pub filterable: bool,
    #[setters(strip_option)]
    pub cell: Option<CellFormatter>,
    #[setters(strip_option)]
    pub footer: Option<String>,
}

impl ColumnSpec {
    /// A sortable and filterable column showing the raw value.
    pub fn new(field: Field, header: impl Into<String>) -> Self {
        Self {
            field,
            header: header.into(),
            sortable: true,
            filterable: true,
            cell: None,
            footer: None,
        }
    }

    pub fn render_cell(&self, record: &UserRecord) -> CellContent {
        match self.cell {
            Some(format) => format(record),
            None => CellContent::Text(record.value(self.field).to_string()),
        }
    }

    pub fn footer_label(&self) -> &str {
        self.footer.as_deref().unwrap_or(self.field.key())
    }
}

fn avatar_cell(record: &UserRecord) -> CellContent {
    CellContent::Image {
        src: record.avatar.clone(),
        alt: "Avatar".to_string(),
    }
}

/// Columns of the user table.
///
/// Free text and category fields are searchable, numeric and date fields are orderable.
pub fn user_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::new(Field::Avatar, "Avatar")
            .with_sortable(false)
            .with_filterable(false)
            .with_cell(avatar_cell as CellFormatter),
        ColumnSpec::new(Field::LastName, "Last Name").with_sortable(false),
        ColumnSpec::new(Field::FirstName, "First Name").with_sortable(false),
        ColumnSpec::new(Field::Age, "Age").with_filterable(false),
        ColumnSpec::new(Field::Gender, "Gender").with_sortable(false),
        ColumnSpec::new(Field::Subscription, "Subscription").with_sortable(false),
        ColumnSpec::new(Field::Email, "Email").with_sortable(false),
        ColumnSpec::new(Field::Birthdate, "Birthdate").with_filterable(false),
        ColumnSpec::new(Field::CreatedAt, "Created At").with_filterable(false),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::testing::user;

    #[test]
    fn sortable_and_filterable_sets() {
        let columns = user_columns();
        let sortable: Vec<Field> = columns.iter().filter(|c| c.sortable).map(|c| c.field).collect();
        let filterable: Vec<Field> =
            columns.iter().filter(|c| c.filterable).map(|c| c.field).collect();

        assert_eq!(sortable, vec![Field::Age, Field::Birthdate, Field::CreatedAt]);
        assert_eq!(
            filterable,
            vec![
                Field::LastName,
                Field::FirstName,
                Field::Gender,
                Field::Subscription,
                Field::Email
            ]
        );
    }

    #[test]
    fn columns_follow_field_order() {
        let fields: Vec<Field> = user_columns().iter().map(|c| c.field).collect();
        assert_eq!(fields, Field::ALL.to_vec());
    }

    #[test]
    fn avatar_renders_as_image_others_as_text() {
        let record = user(3, "Lee", 41, "lee@mail.com");
        let columns = user_columns();

        assert_eq!(
            columns[0].render_cell(&record),
            CellContent::Image {
                src: record.avatar.clone(),
                alt: "Avatar".to_string()
            }
        );
        assert_eq!(columns[1].render_cell(&record), CellContent::Text("Lee".into()));
        assert_eq!(columns[3].render_cell(&record), CellContent::Text("41".into()));
    }

    #[test]
    fn footer_defaults_to_field_key() {
        let columns = user_columns();
        assert_eq!(columns[8].footer_label(), "createdAt");
        let custom = ColumnSpec::new(Field::Age, "Age").with_footer("years".to_string());
        assert_eq!(custom.footer_label(), "years");
    }

    #[test]
    fn field_keys_round_trip() {
        for field in Field::ALL {
            assert_eq!(Field::from_key(field.key()), Some(field));
        }
        assert_eq!(Field::from_key("_id"), None);
    }

    #[test]
    fn cell_value_numbers() {
        assert_eq!(CellValue::Integer(7).as_f64(), Some(7.0));
        assert_eq!(CellValue::Text(" 2.5").as_f64(), Some(2.5));
        assert_eq!(CellValue::Text("abc").as_f64(), None);
        assert!(!CellValue::Text("12").is_numeric());
    }
}
