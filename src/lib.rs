//! A terminal grid over a static set of user records with sorting, per column filters and
//! pagination.
//!
//! [`engine::derive`] computes the visible rows from the records, the [`schema`] and a
//! [`engine::ViewState`]. [`engine::Grid`] keeps state and view in sync, [`model::Model`] maps
//! key presses onto it and [`ui::GridUI`] draws the result.

pub mod controller;
pub mod dataset;
pub mod domain;
pub mod engine;
pub mod filter_widget;
pub mod inputter;
pub mod model;
pub mod schema;
pub mod ui;
