use polars::prelude::*;
use rayon::prelude::*;
use std::fs;
use std::io::{Cursor, ErrorKind};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

use crate::domain::GridError;
use crate::schema::{CellValue, Field};

/// Users shipped with the binary.
pub const BUILTIN_USERS: &str = include_str!("../data/users.json");

const ID_COLUMN: &str = "_id";

#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub id: String,
    pub avatar: String,
    pub birthdate: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub age: i64,
    pub gender: String,
    pub subscription: String,
    pub created_at: String,
}

impl UserRecord {
    pub fn value(&self, field: Field) -> CellValue<'_> {
        match field {
            Field::Avatar => CellValue::Text(&self.avatar),
            Field::LastName => CellValue::Text(&self.last_name),
            Field::FirstName => CellValue::Text(&self.first_name),
            Field::Age => CellValue::Integer(self.age),
            Field::Gender => CellValue::Text(&self.gender),
            Field::Subscription => CellValue::Text(&self.subscription),
            Field::Email => CellValue::Text(&self.email),
            Field::Birthdate => CellValue::Text(&self.birthdate),
            Field::CreatedAt => CellValue::Text(&self.created_at),
        }
    }
}

#[derive(Debug)]
enum FileType {
    JSON,
    CSV,
}

/// An ordered, read-only set of users and where it came from.
#[derive(Debug)]
pub struct Dataset {
    pub name: String,
    pub records: Vec<UserRecord>,
}

impl Dataset {
    pub fn builtin() -> Result<Self, GridError> {
        Self::from_json_bytes("users.json", BUILTIN_USERS.as_bytes())
    }

    pub fn from_json_bytes(name: &str, bytes: &[u8]) -> Result<Self, GridError> {
        let df = JsonReader::new(Cursor::new(bytes))
            .with_json_format(JsonFormat::Json)
            .finish()?;
        Ok(Self {
            name: name.to_string(),
            records: Self::records_from_frame(&df)?,
        })
    }

    pub fn load(path: &Path) -> Result<Self, GridError> {
        Self::check_file(path)?;
        let start_time = Instant::now();
        let df = match Self::detect_file_type(path)? {
            FileType::JSON => JsonReader::new(fs::File::open(path)?)
                .with_json_format(JsonFormat::Json)
                .finish()?,
            FileType::CSV => LazyCsvReader::new(PlPath::Local(path.into()))
                .with_has_header(true)
                .finish()?
                .collect()?,
        };
        let records = Self::records_from_frame(&df)?;
        info!(
            "Loading {} users took {}ms ...",
            records.len(),
            start_time.elapsed().as_millis()
        );

        Ok(Self {
            name: path
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or("???")
                .to_string(),
            records,
        })
    }

    fn check_file(path: &Path) -> Result<(), GridError> {
        let metadata = fs::metadata(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => GridError::FileNotFound,
            ErrorKind::PermissionDenied => GridError::PermissionDenied,
            _ => GridError::IoError(e),
        })?;
        if !metadata.is_file() {
            return Err(GridError::LoadingFailed("Not a file!".into()));
        }
        Ok(())
    }

    fn detect_file_type(path: &Path) -> Result<FileType, GridError> {
        match path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_uppercase())
            .as_deref()
        {
            Some("JSON") => Ok(FileType::JSON),
            Some("CSV") => Ok(FileType::CSV),
            _ => Err(GridError::UnknownFileType),
        }
    }

    fn records_from_frame(df: &DataFrame) -> Result<Vec<UserRecord>, GridError> {
        const TEXT_COLUMNS: [&str; 9] = [
            ID_COLUMN,
            "avatar",
            "birthdate",
            "email",
            "firstName",
            "lastName",
            "gender",
            "subscription",
            "createdAt",
        ];

        // Each column is converted on its own thread.
        let text: Vec<Vec<String>> = TEXT_COLUMNS
            .par_iter()
            .map(|name| Self::text_column(df, name))
            .collect::<Result<_, _>>()?;
        let ages = Self::integer_column(df, Field::Age.key())?;

        let [ids, avatars, birthdates, emails, first_names, last_names, genders, subscriptions, created] =
            <[Vec<String>; 9]>::try_from(text)
                .map_err(|_| GridError::LoadingFailed("unexpected column count".into()))?;

        let records: Vec<UserRecord> = ids
            .into_iter()
            .zip(avatars)
            .zip(birthdates)
            .zip(emails)
            .zip(first_names)
            .zip(last_names)
            .zip(ages)
            .zip(genders)
            .zip(subscriptions)
            .zip(created)
            .map(
                |(((((((((id, avatar), birthdate), email), first_name), last_name), age), gender), subscription), created_at)| {
                    UserRecord {
                        id,
                        avatar,
                        birthdate,
                        email,
                        first_name,
                        last_name,
                        age,
                        gender,
                        subscription,
                        created_at,
                    }
                },
            )
            .collect();
        debug!("Converted {} rows into users", records.len());
        Ok(records)
    }

    fn column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column, GridError> {
        df.column(name)
            .map_err(|_| GridError::MissingColumn(name.to_string()))
    }

    fn text_column(df: &DataFrame, name: &str) -> Result<Vec<String>, GridError> {
        let col = Self::column(df, name)?.cast(&DataType::String)?;
        col.str()?
            .into_iter()
            .enumerate()
            .map(|(row, value)| {
                value.map(str::to_string).ok_or_else(|| GridError::MissingField {
                    field: name.to_string(),
                    row,
                })
            })
            .collect()
    }

    fn integer_column(df: &DataFrame, name: &str) -> Result<Vec<i64>, GridError> {
        let col = Self::column(df, name)?.cast(&DataType::Int64)?;
        col.i64()?
            .into_iter()
            .enumerate()
            .map(|(row, value)| {
                value.ok_or_else(|| GridError::MissingField {
                    field: name.to_string(),
                    row,
                })
            })
            .collect()
    }
}

/// Expands `~` and environment variables in a user supplied path.
pub fn expand_path(raw: &str) -> Result<PathBuf, GridError> {
    shellexpand::full(raw)
        .map(|p| PathBuf::from(p.as_ref()))
        .map_err(|e| GridError::LoadingFailed(format!("cannot expand {raw}: {e}")))
}
