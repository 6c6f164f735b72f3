use std::fmt;
use std::io::Error;
use std::path::PathBuf;

use polars::error::PolarsError;
use ratatui::crossterm::event::KeyEvent;

use crate::engine::PageSize;

pub const HELP_TEXT: &str = "\
Keys
  q            quit
  ←/→  h/l     focus previous / next column
  Enter  s     toggle sort of the focused column (asc, desc, none)
  /  f         edit the filter of the focused column
  x            clear the filter of the focused column
  ↑/↓  k/j     scroll rows within the page
  g  Home      first page
  p  PgUp      previous page
  n  PgDn      next page
  G  End       last page
  :            go to page
  z            cycle page size (10, 30, 50)
  ?            this help
  Esc          close popup / cancel input
";

#[derive(Debug)]
pub enum GridError {
    IoError(Error),
    PolarsError(PolarsError),
    LoadingFailed(String),
    MissingColumn(String),
    MissingField { field: String, row: usize },
    InvalidPageSize(usize),
    FileNotFound,
    PermissionDenied,
    UnknownFileType,
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridError::IoError(e) => write!(f, "io error: {e}"),
            GridError::PolarsError(e) => write!(f, "could not read dataset: {e}"),
            GridError::LoadingFailed(reason) => write!(f, "loading failed: {reason}"),
            GridError::MissingColumn(name) => write!(f, "dataset has no \"{name}\" column"),
            GridError::MissingField { field, row } => {
                write!(f, "record {row} has no value for field \"{field}\"")
            }
            GridError::InvalidPageSize(size) => {
                write!(f, "page size {size} is not one of {:?}", PageSize::CHOICES)
            }
            GridError::FileNotFound => write!(f, "file not found"),
            GridError::PermissionDenied => write!(f, "permission denied"),
            GridError::UnknownFileType => write!(f, "unknown file type, expected .json or .csv"),
        }
    }
}

impl std::error::Error for GridError {}

impl From<Error> for GridError {
    fn from(err: Error) -> Self {
        GridError::IoError(err)
    }
}

impl From<PolarsError> for GridError {
    fn from(err: PolarsError) -> Self {
        GridError::PolarsError(err)
    }
}

#[derive(Debug, Clone)]
pub struct GridConfig {
    pub event_poll_time: u64,
    pub page_size: PageSize,
    pub data_path: Option<PathBuf>,
    pub log_path: Option<PathBuf>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            event_poll_time: 100,
            page_size: PageSize::default(),
            data_path: None,
            log_path: None,
        }
    }
}

/// What the command line input is currently editing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputMode {
    Filter,
    GoToPage,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Quit,
    FocusLeft,
    FocusRight,
    ScrollUp,
    ScrollDown,
    ToggleSort,
    EditFilter,
    ClearFilter,
    FirstPage,
    PreviousPage,
    NextPage,
    LastPage,
    GoToPage,
    CyclePageSize,
    Help,
    Exit,
    Resize(usize, usize),
    RawKey(KeyEvent),
}
