use crate::bounds::{Bounds, DateBound};
use crate::format::DisplayFormat;
use crate::picker::ViewMode;

/// Whether a selection resolves to a full date or only to a year and month
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Granularity {
    /// Year and month; the stored date is always the first of the month
    #[default]
    Month,

    /// Year, month, and day
    Day,
}

impl Granularity {
    /// The view the popup starts in and returns to after an outside click
    pub fn initial_mode(self) -> ViewMode {
        match self {
            Granularity::Month => ViewMode::Months,
            Granularity::Day => ViewMode::Days,
        }
    }
}

/// Host-supplied settings for a [`DatePicker`](crate::DatePicker)
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PickerConfig {
    placeholder: String,
    disabled: bool,
    granularity: Granularity,
    pattern: Option<String>,
    hide_input: bool,
    min: Option<DateBound>,
    max: Option<DateBound>,
}

impl PickerConfig {
    pub fn new() -> PickerConfig {
        PickerConfig::default()
    }

    /// Text shown in the input box while nothing is selected
    pub fn placeholder<S: Into<String>>(mut self, text: S) -> Self {
        self.placeholder = text.into();
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }

    /// Shorthand for `granularity(Granularity::Day)` when `true`
    pub fn show_days(self, yes: bool) -> Self {
        self.granularity(if yes {
            Granularity::Day
        } else {
            Granularity::Month
        })
    }

    /// Display pattern in which `yyyy`, `mm`, and `dd` are substituted
    pub fn format<S: Into<String>>(mut self, pattern: S) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Don't draw the built-in input; the widget's trigger render function,
    /// if any, draws the trigger instead
    pub fn hide_input(mut self, hide: bool) -> Self {
        self.hide_input = hide;
        self
    }

    pub fn min_date<B: Into<DateBound>>(mut self, bound: B) -> Self {
        self.min = Some(bound.into());
        self
    }

    pub fn max_date<B: Into<DateBound>>(mut self, bound: B) -> Self {
        self.max = Some(bound.into());
        self
    }

    pub fn get_placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn get_granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn is_input_hidden(&self) -> bool {
        self.hide_input
    }

    pub(crate) fn display_format(&self) -> DisplayFormat {
        DisplayFormat::new(self.pattern.as_deref(), self.granularity)
    }

    pub(crate) fn bounds(&self) -> Bounds {
        Bounds::new(self.min.as_ref(), self.max.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    #[test]
    fn test_defaults() {
        let config = PickerConfig::new();
        assert_eq!(config.get_placeholder(), "");
        assert!(!config.is_disabled());
        assert!(!config.is_input_hidden());
        assert_eq!(config.get_granularity(), Granularity::Month);
        assert_eq!(
            config.display_format(),
            DisplayFormat::Verbose(Granularity::Month)
        );
        assert_eq!(config.bounds(), Bounds::default());
    }

    #[test]
    fn test_builder() {
        let config = PickerConfig::new()
            .placeholder("Pick a date")
            .show_days(true)
            .format("yyyy/mm/dd")
            .min_date(date!(2024 - 01 - 10))
            .max_date("2024-12-31T18:00");
        assert_eq!(config.get_placeholder(), "Pick a date");
        assert_eq!(config.get_granularity().initial_mode(), ViewMode::Days);
        assert_eq!(
            config.display_format(),
            DisplayFormat::Pattern(String::from("yyyy/mm/dd"))
        );
        let bounds = config.bounds();
        assert_eq!(bounds.min(), Some(datetime!(2024 - 01 - 10 0:00)));
        assert_eq!(bounds.max(), Some(datetime!(2024 - 12 - 31 18:00)));
    }
}
