use crate::bounds::Bounds;
use crate::calmath::{
    clamp_year, first_of_month, last_of_month, step_month, step_year, year_window, YEAR_WINDOW_LEN,
};
use crate::config::{Granularity, PickerConfig};
use crate::format::DisplayFormat;
use crate::outside::{OutsideClick, PointerListeners};
use ratatui::layout::{Position, Rect};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::ops::RangeInclusive;
use std::rc::Rc;
use time::{Date, Month};

/// Which grid the popup is showing
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ViewMode {
    Years,
    Months,
    Days,
}

/// Notifications emitted by a [`DatePicker`] whenever its visible state
/// changes.  Hosts drain these with [`DatePicker::drain_events()`] and redraw.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PickerEvent {
    Opened,
    Closed,
    /// The view mode or the displayed year/month changed
    ViewChanged,
    /// The selection changed through user interaction
    Changed(Option<Date>),
}

/// Something drawn by the widget that reacts to a pointer press
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Target {
    /// The built-in input box; toggles the popup
    Input,
    /// The area a custom trigger bound its open action to
    OpenAction,
    Prev,
    Next,
    YearLabel,
    MonthLabel,
    Year(i32),
    Month(Month),
    Day(u8),
    /// Part of the popup with no action of its own
    Popup,
    /// The rest of the widget's area while the popup is open
    Overlay,
}

type ChangeCallback = Box<dyn FnMut(Option<Date>)>;

/// The part of a picker's state that an outside press changes, shared with
/// the picker's outside-press listener
#[derive(Debug)]
struct Popup {
    open: Cell<bool>,
    mode: Cell<ViewMode>,
    initial_mode: Cell<ViewMode>,
    events: RefCell<Vec<PickerEvent>>,
}

impl Popup {
    fn new(mode: ViewMode) -> Popup {
        Popup {
            open: Cell::new(false),
            mode: Cell::new(mode),
            initial_mode: Cell::new(mode),
            events: RefCell::new(Vec::new()),
        }
    }

    fn emit(&self, event: PickerEvent) {
        self.events.borrow_mut().push(event);
    }

    fn close(&self) -> bool {
        if !self.open.get() {
            return false;
        }
        self.open.set(false);
        log::debug!("Picker closed");
        self.emit(PickerEvent::Closed);
        true
    }

    // Closes and returns to the initial view
    fn close_from_outside(&self) -> bool {
        if !self.open.get() {
            return false;
        }
        self.mode.set(self.initial_mode.get());
        self.close()
    }
}

/// State of one date picker: what is selected, what the popup shows, and
/// whether it is open
pub struct DatePicker {
    config: PickerConfig,
    bounds: Bounds,
    format: DisplayFormat,
    today: Date,
    selected: Option<Date>,
    // Last value supplied by the host, used to detect external changes
    external: Option<Date>,
    year: i32,
    month: Month,
    popup: Rc<Popup>,
    on_change: Option<ChangeCallback>,
    listeners: Option<PointerListeners>,
    outside: Option<OutsideClick>,
    hits: Vec<(Rect, Target)>,
}

impl DatePicker {
    pub fn new(config: PickerConfig, today: Date) -> DatePicker {
        DatePicker {
            bounds: config.bounds(),
            format: config.display_format(),
            popup: Rc::new(Popup::new(config.get_granularity().initial_mode())),
            config,
            today,
            selected: None,
            external: None,
            year: today.year(),
            month: today.month(),
            on_change: None,
            listeners: None,
            outside: None,
            hits: Vec::new(),
        }
    }

    /// Seeds the picker with an initial value
    pub fn with_value(mut self, value: Option<Date>) -> Self {
        self.set_value(value);
        self.popup.events.borrow_mut().clear();
        self
    }

    /// Sets the function called with the new selection each time the user
    /// picks a date or clears the selection
    pub fn on_change<F>(mut self, func: F) -> Self
    where
        F: FnMut(Option<Date>) + 'static,
    {
        self.on_change = Some(Box::new(func));
        self
    }

    /// Registers for outside-press notifications from `listeners` while the
    /// popup is open
    pub fn pointer_listeners(mut self, listeners: &PointerListeners) -> Self {
        self.listeners = Some(listeners.clone());
        if self.is_open() {
            self.subscribe_outside();
        }
        self
    }

    fn subscribe_outside(&mut self) {
        let popup = Rc::downgrade(&self.popup);
        self.outside = self.listeners.as_ref().map(|listeners| {
            listeners.subscribe(move || {
                if let Some(popup) = popup.upgrade() {
                    popup.close_from_outside();
                }
            })
        });
    }

    /// Applies a value supplied by the host.  If it differs from the last
    /// supplied value, the selection is replaced by it and, if it is a date,
    /// the popup moves to its month.  The change callback is not called.
    pub fn set_value(&mut self, value: Option<Date>) -> bool {
        if value == self.external {
            return false;
        }
        self.external = value;
        self.selected = value;
        if let Some(date) = value {
            self.year = date.year();
            self.month = date.month();
        }
        log::debug!("Picker value set externally to {value:?}");
        self.popup.emit(PickerEvent::ViewChanged);
        true
    }

    /// Replaces the configuration.  Bounds and format are re-derived; if the
    /// granularity changed, the view returns to the initial mode.
    pub fn reconfigure(&mut self, config: PickerConfig) {
        let granularity_changed = config.get_granularity() != self.config.get_granularity();
        self.bounds = config.bounds();
        self.format = config.display_format();
        self.config = config;
        self.popup
            .initial_mode
            .set(self.config.get_granularity().initial_mode());
        if granularity_changed {
            self.popup.mode.set(self.initial_mode());
        }
        if self.config.is_disabled() {
            self.close();
        }
        self.popup.emit(PickerEvent::ViewChanged);
    }

    pub fn config(&self) -> &PickerConfig {
        &self.config
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn value(&self) -> Option<Date> {
        self.selected
    }

    /// The current selection as display text; empty if nothing is selected
    pub fn formatted_value(&self) -> String {
        self.format.format(self.selected)
    }

    pub fn is_open(&self) -> bool {
        self.popup.open.get()
    }

    pub fn is_disabled(&self) -> bool {
        self.config.is_disabled()
    }

    pub fn mode(&self) -> ViewMode {
        self.popup.mode.get()
    }

    /// The year and month currently displayed
    pub fn cursor(&self) -> (i32, Month) {
        (self.year, self.month)
    }

    pub fn today(&self) -> Date {
        self.today
    }

    /// Updates the date used for "today" highlighting
    pub fn set_today(&mut self, today: Date) {
        if today != self.today {
            self.today = today;
            self.popup.emit(PickerEvent::ViewChanged);
        }
    }

    pub fn granularity(&self) -> Granularity {
        self.config.get_granularity()
    }

    fn initial_mode(&self) -> ViewMode {
        self.popup.initial_mode.get()
    }

    /// Returns and forgets all notifications emitted since the last call
    pub fn drain_events(&mut self) -> Vec<PickerEvent> {
        self.popup.events.take()
    }

    pub fn toggle(&mut self) -> bool {
        if self.is_open() {
            self.close()
        } else {
            self.open()
        }
    }

    pub fn open(&mut self) -> bool {
        if self.is_open() || self.is_disabled() {
            return false;
        }
        self.popup.open.set(true);
        self.subscribe_outside();
        log::debug!("Picker opened in {:?} view", self.mode());
        self.popup.emit(PickerEvent::Opened);
        true
    }

    pub fn close(&mut self) -> bool {
        self.outside = None;
        self.popup.close()
    }

    /// Closes the popup in response to a press on the dismiss overlay.  The
    /// view mode is kept.
    pub fn dismiss(&mut self) -> bool {
        self.close()
    }

    /// Closes the popup in response to a press outside the widget and
    /// returns the view to its initial mode.  A picker given
    /// [`PointerListeners`] does this by itself when the host reports the
    /// press to the registry.
    pub fn outside_interaction(&mut self) -> bool {
        self.outside = None;
        self.popup.close_from_outside()
    }

    /// Switches from the month grid to the year grid
    pub fn show_years(&mut self) -> bool {
        if self.mode() != ViewMode::Months {
            return false;
        }
        self.set_mode(ViewMode::Years);
        true
    }

    /// Switches from the day grid to the month grid
    pub fn show_months(&mut self) -> bool {
        if self.mode() != ViewMode::Days {
            return false;
        }
        self.set_mode(ViewMode::Months);
        true
    }

    fn set_mode(&self, mode: ViewMode) {
        log::trace!("Picker view {:?} -> {mode:?}", self.mode());
        self.popup.mode.set(mode);
        self.popup.emit(PickerEvent::ViewChanged);
    }

    pub fn pick_year(&mut self, year: i32) -> bool {
        if self.mode() != ViewMode::Years {
            return false;
        }
        self.year = clamp_year(year);
        self.set_mode(ViewMode::Months);
        true
    }

    /// Handles a press on a month cell.  With day granularity this drills
    /// down into that month; otherwise the first of the month is selected
    /// and the popup closes.  Months with nothing selectable are ignored.
    pub fn pick_month(&mut self, month: Month) -> bool {
        if self.mode() != ViewMode::Months || self.is_disabled() || !self.month_in_range(month) {
            return false;
        }
        match self.granularity() {
            Granularity::Day => {
                self.month = month;
                self.set_mode(ViewMode::Days);
            }
            Granularity::Month => {
                self.month = month;
                self.select(first_of_month(self.year, month));
                self.close();
            }
        }
        true
    }

    /// Handles a press on a day cell.  Out-of-range days are ignored.
    pub fn pick_day(&mut self, day: u8) -> bool {
        if self.mode() != ViewMode::Days || self.is_disabled() {
            return false;
        }
        match Date::from_calendar_date(self.year, self.month, day) {
            Ok(date) if self.bounds.contains(date) => {
                self.select(date);
                self.close();
                true
            }
            _ => false,
        }
    }

    /// Empties the selection and notifies the change callback with `None`
    pub fn clear(&mut self) -> bool {
        if self.is_disabled() || self.selected.is_none() {
            return false;
        }
        self.selected = None;
        self.notify();
        true
    }

    fn select(&mut self, date: Date) {
        log::debug!("Picker selected {date}");
        self.selected = Some(date);
        self.notify();
    }

    fn notify(&mut self) {
        if let Some(func) = self.on_change.as_mut() {
            func(self.selected);
        }
        self.popup.emit(PickerEvent::Changed(self.selected));
    }

    /// Moves the view back one month, one year, or one page of years,
    /// depending on the current mode
    pub fn show_prev(&mut self) -> bool {
        self.step(-1)
    }

    /// Moves the view forwards one month, one year, or one page of years,
    /// depending on the current mode
    pub fn show_next(&mut self) -> bool {
        self.step(1)
    }

    fn step(&mut self, delta: i32) -> bool {
        let (year, month) = match self.mode() {
            ViewMode::Days => step_month(self.year, self.month, delta),
            ViewMode::Months => (step_year(self.year, delta), self.month),
            ViewMode::Years => (
                step_year(self.year, delta.saturating_mul(YEAR_WINDOW_LEN)),
                self.month,
            ),
        };
        if (year, month) == (self.year, self.month) {
            return false;
        }
        self.year = year;
        self.month = month;
        self.popup.emit(PickerEvent::ViewChanged);
        true
    }

    /// The years shown in the year grid
    pub fn year_window(&self) -> RangeInclusive<i32> {
        year_window(self.year)
    }

    pub fn is_current_year(&self, year: i32) -> bool {
        self.today.year() == year
    }

    pub fn is_selected_year(&self, year: i32) -> bool {
        self.selected.is_some_and(|d| d.year() == year)
    }

    /// Whether `month` of the displayed year is the current month
    pub fn is_current_month(&self, month: Month) -> bool {
        self.today.year() == self.year && self.today.month() == month
    }

    /// Whether `month` of the displayed year is the selected month
    pub fn is_selected_month(&self, month: Month) -> bool {
        self.selected
            .is_some_and(|d| d.year() == self.year && d.month() == month)
    }

    /// Whether `day` of the displayed month is today
    pub fn is_current_day(&self, day: u8) -> bool {
        self.today.year() == self.year
            && self.today.month() == self.month
            && self.today.day() == day
    }

    /// Whether `day` of the displayed month is the selected date
    pub fn is_selected_day(&self, day: u8) -> bool {
        self.selected.is_some_and(|d| {
            d.year() == self.year && d.month() == self.month && d.day() == day
        })
    }

    /// Whether `month` of the displayed year can be picked
    pub fn month_in_range(&self, month: Month) -> bool {
        match self.granularity() {
            Granularity::Month => self.bounds.contains(first_of_month(self.year, month)),
            Granularity::Day => self.bounds.contains_any(
                first_of_month(self.year, month),
                last_of_month(self.year, month),
            ),
        }
    }

    /// Whether `day` of the displayed month can be picked
    pub fn day_in_range(&self, day: u8) -> bool {
        Date::from_calendar_date(self.year, self.month, day)
            .is_ok_and(|date| self.bounds.contains(date))
    }

    pub(crate) fn clear_hits(&mut self) {
        self.hits.clear();
    }

    pub(crate) fn add_hit(&mut self, area: Rect, target: Target) {
        if !area.is_empty() {
            self.hits.push((area, target));
        }
    }

    pub(crate) fn set_outside_area(&self, area: Rect) {
        if let Some(sub) = self.outside.as_ref() {
            sub.set_inside(vec![area]);
        }
    }

    /// Returns the topmost thing drawn at `pos` during the last render
    pub fn target_at(&self, pos: Position) -> Option<Target> {
        self.hits
            .iter()
            .rev()
            .find(|(area, _)| area.contains(pos))
            .map(|&(_, target)| target)
    }

    /// Handles a pointer press at `pos`.  Presses outside the widget are
    /// handled through [`PointerListeners`] instead.
    pub fn pointer_down(&mut self, pos: Position) -> bool {
        if !self.is_open() {
            // Released by the registry after an outside press
            self.outside = None;
        }
        let Some(target) = self.target_at(pos) else {
            return false;
        };
        log::trace!("Press at {pos:?} hit {target:?}");
        // The popup may have closed since the last render, leaving its cells
        // in the hit list
        if !self.is_open() && !matches!(target, Target::Input | Target::OpenAction) {
            return false;
        }
        match target {
            Target::Input => self.toggle(),
            Target::OpenAction => self.open(),
            Target::Prev => self.show_prev(),
            Target::Next => self.show_next(),
            Target::YearLabel => self.show_years(),
            Target::MonthLabel => self.show_months(),
            Target::Year(year) => self.pick_year(year),
            Target::Month(month) => self.pick_month(month),
            Target::Day(day) => self.pick_day(day),
            Target::Popup => false,
            Target::Overlay => self.dismiss(),
        }
    }
}

impl fmt::Debug for DatePicker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatePicker")
            .field("config", &self.config)
            .field("bounds", &self.bounds)
            .field("today", &self.today)
            .field("selected", &self.selected)
            .field("external", &self.external)
            .field("year", &self.year)
            .field("month", &self.month)
            .field("popup", &self.popup)
            .field("on_change", &self.on_change.as_ref().map(|_| "<callback>"))
            .field("outside", &self.outside)
            .finish_non_exhaustive()
    }
}
