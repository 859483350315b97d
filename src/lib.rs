//! A drill-down date picker for [ratatui] applications.
//!
//! A [`DatePicker`] holds the state of one picker: the selection, the
//! year/month being displayed, which grid (years, months, or days) is shown,
//! and whether the popup is open.  [`DatePickerWidget`] draws it, either with
//! a built-in input box or with a caller-supplied trigger, and records where
//! everything was drawn so that [`DatePicker::pointer_down()`] can map mouse
//! presses back to actions.
mod bounds;
pub mod calmath;
mod config;
mod format;
mod outside;
mod picker;
pub mod theme;
mod widget;
pub use crate::bounds::{parse_bound, BoundParseError, Bounds, DateBound};
pub use crate::config::{Granularity, PickerConfig};
pub use crate::format::DisplayFormat;
pub use crate::outside::{OutsideClick, PointerListeners};
pub use crate::picker::{DatePicker, PickerEvent, Target, ViewMode};
pub use crate::widget::{DatePickerWidget, OpenAction, TriggerProps};
