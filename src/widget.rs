use crate::calmath::{clamp_year, month_weeks};
use crate::picker::{DatePicker, Target, ViewMode};
use crate::theme::{
    BASE_STYLE, DISABLED_STYLE, LABEL_STYLE, NAV_STYLE, PLACEHOLDER_STYLE, SELECTED_STYLE,
    WEEKDAY_STYLE,
};
use ratatui::{
    buffer::Buffer,
    layout::{Margin, Rect},
    style::Style,
    text::Text,
    widgets::{Block, Clear, Paragraph, StatefulWidget, Widget},
};
use std::fmt;
use std::iter::zip;
use time::{Date, Month};

static WEEKDAY_HEADER: &str = " Su  Mo  Tu  We  Th  Fr  Sa ";

/// Number of lines taken up by the trigger
const TRIGGER_HEIGHT: u16 = 3;

/// Width of the built-in input box
const INPUT_WIDTH: u16 = 30;

const POPUP_WIDTH: u16 = 30;

/// Borders, the header line, and up to seven grid lines (the weekday header
/// plus six weeks)
const POPUP_HEIGHT: u16 = 10;

/// Width of the clickable area around each navigation arrow
const NAV_WIDTH: u16 = 3;

/// Line of the popup's interior at which the year and month grids start
const GRID_TOP: u16 = 2;

/// Columns per day of week
const DAY_WIDTH: u16 = 4;

const MONTH_COLUMNS: u16 = 3;
const MONTH_WIDTH: u16 = 9;

const YEAR_COLUMNS: u16 = 4;
const YEAR_WIDTH: u16 = 7;

const PREV_ARROW: &str = "‹";
const NEXT_ARROW: &str = "›";
const OPEN_INDICATOR: &str = "▴";
const CLOSED_INDICATOR: &str = "▾";

/// What a custom trigger render function is given to work with
#[derive(Debug)]
pub struct TriggerProps<'a> {
    /// Bind this to the area that should open the popup when pressed
    pub open: OpenAction<'a>,
    pub is_open: bool,
    pub value: Option<Date>,
    /// The selection as display text; empty if nothing is selected
    pub formatted: &'a str,
}

/// The "open the popup" action handed to a custom trigger
#[derive(Debug)]
pub struct OpenAction<'a> {
    area: &'a mut Option<Rect>,
}

impl OpenAction<'_> {
    /// Makes a press anywhere in `area` open the popup.  The popup is placed
    /// below the last area bound.
    pub fn bind(&mut self, area: Rect) {
        *self.area = Some(area);
    }
}

type TriggerFn<'a> = Box<dyn Fn(TriggerProps<'_>, Rect, &mut Buffer) + 'a>;

/// Draws a [`DatePicker`]: its trigger and, when open, the popup below it.
///
/// While the popup is open, the whole area given to the widget acts as a
/// dismiss overlay: a press on it that misses the trigger and the popup
/// closes the popup.
#[derive(Default)]
pub struct DatePickerWidget<'a> {
    trigger: Option<TriggerFn<'a>>,
}

impl<'a> DatePickerWidget<'a> {
    pub fn new() -> Self {
        DatePickerWidget::default()
    }

    /// Sets the function that draws the trigger for pickers configured with
    /// `hide_input(true)`.  It is given the top three lines of the
    /// widget's area.
    pub fn trigger<F>(mut self, func: F) -> Self
    where
        F: Fn(TriggerProps<'_>, Rect, &mut Buffer) + 'a,
    {
        self.trigger = Some(Box::new(func));
        self
    }

    // Returns the area below which the popup is placed
    fn render_custom_trigger(&self, area: Rect, buf: &mut Buffer, state: &mut DatePicker) -> Rect {
        let Some(func) = self.trigger.as_ref() else {
            return Rect { height: 0, ..area };
        };
        let formatted = state.formatted_value();
        let mut bound = None;
        func(
            TriggerProps {
                open: OpenAction { area: &mut bound },
                is_open: state.is_open(),
                value: state.value(),
                formatted: &formatted,
            },
            area,
            buf,
        );
        match bound {
            Some(r) => {
                if !state.is_disabled() {
                    state.add_hit(r.intersection(buf.area), Target::OpenAction);
                }
                r
            }
            None => area,
        }
    }
}

impl fmt::Debug for DatePickerWidget<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatePickerWidget")
            .field("trigger", &self.trigger.as_ref().map(|_| "<render fn>"))
            .finish()
    }
}

impl StatefulWidget for DatePickerWidget<'_> {
    type State = DatePicker;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        state.clear_hits();
        if area.is_empty() {
            return;
        }
        let open = state.is_open();
        if open {
            state.add_hit(area, Target::Overlay);
            state.set_outside_area(area);
        }
        let trigger_area = Rect {
            height: TRIGGER_HEIGHT.min(area.height),
            ..area
        };
        let anchor = if state.config().is_input_hidden() {
            self.render_custom_trigger(trigger_area, buf, state)
        } else {
            let input_area = Rect {
                width: INPUT_WIDTH.min(area.width),
                ..trigger_area
            };
            render_input(input_area, buf, state);
            if !state.is_disabled() {
                state.add_hit(input_area, Target::Input);
            }
            input_area
        };
        if open {
            let popup = Rect {
                x: anchor.x,
                y: anchor.bottom(),
                width: POPUP_WIDTH,
                height: POPUP_HEIGHT,
            }
            .clamp(area);
            render_popup(popup, buf, state);
        }
    }
}

fn render_input(area: Rect, buf: &mut Buffer, state: &DatePicker) {
    let style = if state.is_disabled() {
        DISABLED_STYLE
    } else {
        BASE_STYLE
    };
    let block = Block::bordered().style(style);
    let inner = block.inner(area);
    block.render(area, buf);
    let mut canvas = Canvas { area: inner, buf };
    let value = state.formatted_value();
    let (text, text_style) = if value.is_empty() {
        let ph_style = if state.is_disabled() {
            DISABLED_STYLE
        } else {
            PLACEHOLDER_STYLE
        };
        (state.config().get_placeholder().to_owned(), ph_style)
    } else {
        (value, style)
    };
    canvas.print_clipped(0, 1, text, text_style, inner.width.saturating_sub(4));
    let indicator = if state.is_open() {
        OPEN_INDICATOR
    } else {
        CLOSED_INDICATOR
    };
    canvas.print(0, inner.width.saturating_sub(2), indicator, style);
}

fn render_popup(area: Rect, buf: &mut Buffer, state: &mut DatePicker) {
    Clear.render(area, buf);
    Block::bordered().style(BASE_STYLE).render(area, buf);
    state.add_hit(area, Target::Popup);
    let inner = area.inner(Margin::new(1, 1));
    let mut canvas = Canvas { area: inner, buf };
    render_header(&mut canvas, state);
    match state.mode() {
        ViewMode::Years => render_years(&mut canvas, state),
        ViewMode::Months => render_months(&mut canvas, state),
        ViewMode::Days => render_days(&mut canvas, state),
    }
}

fn render_header(canvas: &mut Canvas<'_>, state: &mut DatePicker) {
    let (year, month) = state.cursor();
    let (label, target) = match state.mode() {
        ViewMode::Years => {
            let window = state.year_window();
            (format!("{}-{}", window.start(), window.end()), None)
        }
        ViewMode::Months => (year.to_string(), Some(Target::YearLabel)),
        ViewMode::Days => (format!("{month} {year}"), Some(Target::MonthLabel)),
    };
    let width = canvas.area.width;
    canvas.print(0, 1, PREV_ARROW, NAV_STYLE);
    state.add_hit(canvas.rect(0, 0, NAV_WIDTH), Target::Prev);
    canvas.print(0, width.saturating_sub(2), NEXT_ARROW, NAV_STYLE);
    state.add_hit(
        canvas.rect(0, width.saturating_sub(NAV_WIDTH), NAV_WIDTH),
        Target::Next,
    );
    let label_width = u16::try_from(label.chars().count()).unwrap_or(u16::MAX);
    let rect = canvas.print(0, width.saturating_sub(label_width) / 2, label, LABEL_STYLE);
    if let Some(target) = target {
        state.add_hit(rect, target);
    }
}

fn render_years(canvas: &mut Canvas<'_>, state: &mut DatePicker) {
    for (i, year) in zip(0u16.., state.year_window()) {
        let enabled = year == clamp_year(year);
        let text = format!(
            "{:^width$}",
            mark(&year.to_string(), state.is_current_year(year)),
            width = usize::from(YEAR_WIDTH)
        );
        let style = cell_style(state.is_selected_year(year), enabled);
        let rect = canvas.print(
            GRID_TOP + i / YEAR_COLUMNS,
            (i % YEAR_COLUMNS) * YEAR_WIDTH,
            text,
            style,
        );
        if enabled {
            state.add_hit(rect, Target::Year(year));
        }
    }
}

fn render_months(canvas: &mut Canvas<'_>, state: &mut DatePicker) {
    for (i, month) in zip(0u16.., months()) {
        let enabled = state.month_in_range(month);
        let abbrev = month.to_string().chars().take(3).collect::<String>();
        let text = format!(
            "{:^width$}",
            mark(&abbrev, state.is_current_month(month)),
            width = usize::from(MONTH_WIDTH)
        );
        let style = cell_style(state.is_selected_month(month), enabled);
        let rect = canvas.print(
            GRID_TOP + i / MONTH_COLUMNS,
            (i % MONTH_COLUMNS) * MONTH_WIDTH,
            text,
            style,
        );
        if enabled {
            state.add_hit(rect, Target::Month(month));
        }
    }
}

fn render_days(canvas: &mut Canvas<'_>, state: &mut DatePicker) {
    let (year, month) = state.cursor();
    canvas.print(1, 0, WEEKDAY_HEADER, WEEKDAY_STYLE);
    for (row, week) in zip(0u16.., month_weeks(year, month)) {
        for (col, day) in week.days() {
            let enabled = state.day_in_range(day);
            let text = mark(&format!("{day:2}"), state.is_current_day(day));
            let style = cell_style(state.is_selected_day(day), enabled);
            let rect = canvas.print(2 + row, col * DAY_WIDTH, text, style);
            if enabled {
                state.add_hit(rect, Target::Day(day));
            }
        }
    }
}

fn months() -> impl Iterator<Item = Month> {
    (0..12).map(|i| Month::January.nth_next(i))
}

// Today's cell is bracketed
fn mark(label: &str, current: bool) -> String {
    if current {
        format!("[{label}]")
    } else {
        format!(" {label} ")
    }
}

fn cell_style(selected: bool, enabled: bool) -> Style {
    if !enabled {
        DISABLED_STYLE
    } else if selected {
        SELECTED_STYLE
    } else {
        BASE_STYLE
    }
}

/// Draws text at coordinates relative to `area`, truncating anything that
/// would extend past it
#[derive(Debug, Eq, PartialEq)]
struct Canvas<'a> {
    area: Rect,
    buf: &'a mut Buffer,
}

impl Canvas<'_> {
    // Returns the area actually drawn to
    fn print<S: AsRef<str>>(&mut self, y: u16, x: u16, s: S, style: Style) -> Rect {
        self.print_clipped(y, x, s, style, u16::MAX)
    }

    fn print_clipped<S: AsRef<str>>(
        &mut self,
        y: u16,
        x: u16,
        s: S,
        style: Style,
        max_width: u16,
    ) -> Rect {
        if y < self.area.height && x < self.area.width {
            let text = Text::styled(s.as_ref(), style);
            let width = u16::try_from(text.width())
                .unwrap_or(u16::MAX)
                .min(max_width);
            // Rendering through a Paragraph truncates text at the edge of the
            // Rect, which must lie entirely within the buffer.
            let rect = self.rect(y, x, width);
            Paragraph::new(text).render(rect, self.buf);
            rect
        } else {
            Rect::default()
        }
    }

    /// A one-line area at relative coordinates, clipped to the canvas
    fn rect(&self, y: u16, x: u16, width: u16) -> Rect {
        if y < self.area.height && x < self.area.width {
            Rect {
                x: x + self.area.x,
                y: y + self.area.y,
                width: (self.area.width - x).min(width),
                height: 1,
            }
        } else {
            Rect::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PickerConfig;
    use crate::outside::PointerListeners;
    use crate::picker::PickerEvent;
    use ratatui::layout::Position;
    use ratatui::style::{Color, Modifier};
    use time::macros::date;
    use time::Month::*;

    const TODAY: Date = date!(2024 - 05 - 20);

    fn render(picker: &mut DatePicker, widget: DatePickerWidget<'_>, area: Rect) -> Buffer {
        let mut buffer = Buffer::empty(area);
        widget.render(area, &mut buffer, picker);
        buffer
    }

    fn lines(buf: &Buffer) -> Vec<String> {
        let area = buf.area;
        (area.top()..area.bottom())
            .map(|y| {
                (area.left()..area.right())
                    .map(|x| buf[(x, y)].symbol())
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_closed_with_placeholder() {
        let mut picker = DatePicker::new(PickerConfig::new().placeholder("Pick a month"), TODAY);
        let buffer = render(&mut picker, DatePickerWidget::new(), Rect::new(0, 0, 32, 4));
        assert_eq!(
            lines(&buffer),
            [
                "┌────────────────────────────┐  ",
                "│ Pick a month             ▾ │  ",
                "└────────────────────────────┘  ",
                "                                ",
            ]
        );
        assert_eq!(buffer[(2, 1)].fg, Color::DarkGray);
        assert_eq!(
            picker.target_at(Position::new(5, 1)),
            Some(Target::Input)
        );
        assert_eq!(picker.target_at(Position::new(5, 3)), None);
    }

    #[test]
    fn test_day_grid() {
        let config = PickerConfig::new().show_days(true);
        let mut picker = DatePicker::new(config, TODAY).with_value(Some(date!(2023 - 03 - 15)));
        picker.open();
        let buffer = render(&mut picker, DatePickerWidget::new(), Rect::new(0, 0, 32, 13));
        assert_eq!(
            lines(&buffer),
            [
                "┌────────────────────────────┐  ",
                "│ 15 March 2023            ▴ │  ",
                "└────────────────────────────┘  ",
                "┌────────────────────────────┐  ",
                "│ ‹       March 2023       › │  ",
                "│ Su  Mo  Tu  We  Th  Fr  Sa │  ",
                "│              1   2   3   4 │  ",
                "│  5   6   7   8   9  10  11 │  ",
                "│ 12  13  14  15  16  17  18 │  ",
                "│ 19  20  21  22  23  24  25 │  ",
                "│ 26  27  28  29  30  31     │  ",
                "│                            │  ",
                "└────────────────────────────┘  ",
            ]
        );
        assert!(buffer[(15, 8)].modifier.contains(Modifier::REVERSED));
        assert!(!buffer[(11, 8)].modifier.contains(Modifier::REVERSED));
        assert_eq!(picker.target_at(Position::new(15, 8)), Some(Target::Day(15)));
        assert_eq!(picker.target_at(Position::new(13, 6)), Some(Target::Day(1)));
        assert_eq!(picker.target_at(Position::new(4, 6)), Some(Target::Popup));
        assert_eq!(picker.target_at(Position::new(2, 4)), Some(Target::Prev));
        assert_eq!(picker.target_at(Position::new(27, 4)), Some(Target::Next));
        assert_eq!(
            picker.target_at(Position::new(12, 4)),
            Some(Target::MonthLabel)
        );
        assert_eq!(
            picker.target_at(Position::new(31, 12)),
            Some(Target::Overlay)
        );
    }

    #[test]
    fn test_today_is_bracketed() {
        let config = PickerConfig::new().show_days(true);
        let mut picker = DatePicker::new(config, TODAY);
        picker.open();
        let buffer = render(&mut picker, DatePickerWidget::new(), Rect::new(0, 0, 30, 13));
        // May 2024 starts on a Wednesday, so the 20th is the Monday of the
        // fourth row
        assert_eq!(lines(&buffer)[9], "│ 19 [20] 21  22  23  24  25 │");
    }

    #[test]
    fn test_disabled_days() {
        let config = PickerConfig::new()
            .show_days(true)
            .min_date(date!(2024 - 01 - 10));
        let mut picker = DatePicker::new(config, TODAY)
            .with_value(Some(date!(2024 - 01 - 20)));
        picker.open();
        let buffer = render(&mut picker, DatePickerWidget::new(), Rect::new(0, 0, 30, 13));
        // January 2024 starts on a Monday; the 5th is the Friday of the first
        // row and the 10th the Wednesday of the second
        assert_eq!(buffer[(23, 6)].symbol(), "5");
        assert_eq!(buffer[(23, 6)].fg, Color::DarkGray);
        assert_eq!(picker.target_at(Position::new(23, 6)), Some(Target::Popup));
        assert_eq!(buffer[(15, 7)].symbol(), "0");
        assert_eq!(buffer[(15, 7)].fg, Color::White);
        assert!(picker.pointer_down(Position::new(15, 7)));
        assert_eq!(picker.value(), Some(date!(2024 - 01 - 10)));
        assert!(!picker.is_open());
    }

    #[test]
    fn test_month_grid() {
        let config = PickerConfig::new().placeholder("Pick a month");
        let mut picker = DatePicker::new(config, TODAY);
        picker.open();
        let buffer = render(&mut picker, DatePickerWidget::new(), Rect::new(0, 0, 30, 13));
        assert_eq!(
            lines(&buffer),
            [
                "┌────────────────────────────┐",
                "│ Pick a month             ▴ │",
                "└────────────────────────────┘",
                "┌────────────────────────────┐",
                "│ ‹          2024          › │",
                "│                            │",
                "│   Jan      Feb      Mar    │",
                "│   Apr     [May]     Jun    │",
                "│   Jul      Aug      Sep    │",
                "│   Oct      Nov      Dec    │",
                "│                            │",
                "│                            │",
                "└────────────────────────────┘",
            ]
        );
        assert_eq!(
            picker.target_at(Position::new(14, 4)),
            Some(Target::YearLabel)
        );
        assert_eq!(
            picker.target_at(Position::new(23, 8)),
            Some(Target::Month(September))
        );
    }

    #[test]
    fn test_year_grid() {
        let mut picker = DatePicker::new(PickerConfig::new(), TODAY)
            .with_value(Some(date!(2016 - 02 - 01)));
        picker.open();
        picker.show_years();
        let buffer = render(&mut picker, DatePickerWidget::new(), Rect::new(0, 0, 30, 13));
        let lines = lines(&buffer);
        assert_eq!(lines[4], "│ ‹       2006-2025        › │");
        assert_eq!(lines[6], "│ 2006   2007   2008   2009  │");
        assert_eq!(lines[8], "│ 2014   2015   2016   2017  │");
        assert_eq!(lines[10], "│ 2022   2023  [2024]  2025  │");
        assert!(buffer[(16, 8)].modifier.contains(Modifier::REVERSED));
        assert_eq!(
            picker.target_at(Position::new(16, 8)),
            Some(Target::Year(2016))
        );
    }

    #[test]
    fn test_drill_down_by_pointer() {
        let config = PickerConfig::new().show_days(true).format("yyyy/mm/dd");
        let mut picker = DatePicker::new(config, TODAY);
        let area = Rect::new(0, 0, 30, 13);
        render(&mut picker, DatePickerWidget::new(), area);
        assert!(picker.pointer_down(Position::new(3, 1)));
        assert!(picker.is_open());
        // Month label
        render(&mut picker, DatePickerWidget::new(), area);
        assert!(picker.pointer_down(Position::new(12, 4)));
        assert_eq!(picker.mode(), ViewMode::Months);
        // Year label
        render(&mut picker, DatePickerWidget::new(), area);
        assert!(picker.pointer_down(Position::new(14, 4)));
        assert_eq!(picker.mode(), ViewMode::Years);
        // 2024 is at row 2, column 2 of the year grid; step back a page first
        render(&mut picker, DatePickerWidget::new(), area);
        assert!(picker.pointer_down(Position::new(2, 4)));
        assert_eq!(picker.year_window(), 1994..=2013);
        render(&mut picker, DatePickerWidget::new(), area);
        // 2003 is the 10th entry: row 2, column 1
        assert!(picker.pointer_down(Position::new(10, 8)));
        assert_eq!(picker.cursor(), (2003, May));
        assert_eq!(picker.mode(), ViewMode::Months);
        render(&mut picker, DatePickerWidget::new(), area);
        // March
        assert!(picker.pointer_down(Position::new(22, 6)));
        assert_eq!(picker.mode(), ViewMode::Days);
        render(&mut picker, DatePickerWidget::new(), area);
        // March 2003 starts on a Saturday; the 15th is the Saturday of the
        // third row
        assert!(picker.pointer_down(Position::new(27, 8)));
        assert_eq!(picker.value(), Some(date!(2003 - 03 - 15)));
        assert_eq!(picker.formatted_value(), "2003/03/15");
        assert!(!picker.is_open());
    }

    #[test]
    fn test_overlay_press_keeps_mode() {
        let listeners = PointerListeners::new();
        let mut picker = DatePicker::new(PickerConfig::new(), TODAY)
            .pointer_listeners(&listeners);
        picker.open();
        picker.show_years();
        let area = Rect::new(0, 0, 40, 14);
        render(&mut picker, DatePickerWidget::new(), area);
        let pos = Position::new(35, 12);
        assert_eq!(listeners.pointer_down(pos), 0);
        assert!(picker.pointer_down(pos));
        assert!(!picker.is_open());
        assert_eq!(picker.mode(), ViewMode::Years);
    }

    #[test]
    fn test_outside_press_resets_mode() {
        let listeners = PointerListeners::new();
        let mut picker = DatePicker::new(PickerConfig::new(), TODAY)
            .pointer_listeners(&listeners);
        picker.open();
        picker.show_years();
        render(&mut picker, DatePickerWidget::new(), Rect::new(0, 0, 40, 14));
        let pos = Position::new(45, 20);
        assert_eq!(listeners.pointer_down(pos), 1);
        assert!(!picker.is_open());
        assert!(!picker.pointer_down(pos));
        assert_eq!(picker.mode(), ViewMode::Months);
        assert!(listeners.is_empty());
    }

    #[test]
    fn test_custom_trigger() {
        let config = PickerConfig::new().hide_input(true).format("mm/yyyy");
        let mut picker = DatePicker::new(config, TODAY)
            .with_value(Some(date!(2024 - 02 - 01)));
        let widget = || {
            DatePickerWidget::new().trigger(|mut props, area, buf| {
                let label = format!("[{}]", props.formatted);
                buf.set_string(area.x, area.y, &label, BASE_STYLE);
                let width = u16::try_from(label.len()).unwrap_or(u16::MAX);
                props.open.bind(Rect::new(area.x, area.y, width, 1));
            })
        };
        let area = Rect::new(0, 0, 30, 12);
        let buffer = render(&mut picker, widget(), area);
        assert_eq!(lines(&buffer)[0], format!("{:30}", "[02/2024]"));
        assert_eq!(
            picker.target_at(Position::new(4, 0)),
            Some(Target::OpenAction)
        );
        assert_eq!(picker.target_at(Position::new(4, 1)), None);
        assert!(picker.pointer_down(Position::new(4, 0)));
        assert!(picker.is_open());
        let buffer = render(&mut picker, widget(), area);
        // The popup sits directly below the bound area
        assert_eq!(lines(&buffer)[1], format!("┌{}┐", "─".repeat(28)));
        assert_eq!(picker.drain_events().first(), Some(&PickerEvent::Opened));
    }

    #[test]
    fn test_disabled_input_does_not_open() {
        let config = PickerConfig::new().disabled(true).placeholder("Off");
        let mut picker = DatePicker::new(config, TODAY);
        let buffer = render(&mut picker, DatePickerWidget::new(), Rect::new(0, 0, 30, 3));
        assert_eq!(buffer[(0, 0)].fg, Color::DarkGray);
        assert_eq!(picker.target_at(Position::new(3, 1)), None);
        assert!(!picker.pointer_down(Position::new(3, 1)));
        assert!(!picker.is_open());
    }

    #[test]
    fn test_popup_stays_inside_area() {
        let mut picker = DatePicker::new(PickerConfig::new(), TODAY);
        picker.open();
        let buffer = render(&mut picker, DatePickerWidget::new(), Rect::new(0, 0, 30, 8));
        let lines = lines(&buffer);
        assert_eq!(lines[7], format!("└{}┘", "─".repeat(28)));
        assert!(lines[0].starts_with('┌'));
    }
}
