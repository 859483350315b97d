use crate::help::Help;
use crossterm::{
    event::{
        read, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyModifiers,
        MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
};
use datepick::{
    theme::{BASE_STYLE, LABEL_STYLE, PLACEHOLDER_STYLE},
    DatePicker, DatePickerWidget, Granularity, PickerEvent, PointerListeners, TriggerProps,
    ViewMode,
};
use ratatui::{
    backend::Backend,
    buffer::Buffer,
    layout::{Constraint, Flex, Layout, Position, Rect},
    style::Modifier,
    text::Line,
    widgets::{StatefulWidget, Widget},
    Terminal,
};
use std::io::{self, Write};
use time::OffsetDateTime;

/// Width of the area given to the picker widget
const PICKER_WIDTH: u16 = 30;

/// Trigger plus popup
const PICKER_HEIGHT: u16 = 13;

const HELP_HINT: &str = "Press ? for help";

#[derive(Debug)]
pub(crate) struct App {
    picker: DatePicker,
    listeners: PointerListeners,
    state: AppState,
}

impl App {
    pub(crate) fn new(picker: DatePicker, listeners: PointerListeners) -> App {
        App {
            picker,
            listeners,
            state: AppState::Picking,
        }
    }

    /// Runs the UI until the user quits and returns the selection as display
    /// text
    pub(crate) fn run<B: Backend>(mut self, mut terminal: Terminal<B>) -> io::Result<String> {
        let _capture = MouseCapture::enable()?;
        while !self.quitting() {
            self.refresh_today();
            self.draw(&mut terminal)?;
            self.handle_input()?;
            self.log_events();
        }
        Ok(self.picker.formatted_value())
    }

    fn draw<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        terminal.draw(|frame| frame.render_widget(self, frame.area()))?;
        Ok(())
    }

    fn handle_input(&mut self) -> io::Result<()> {
        let normal_modifiers = KeyModifiers::NONE | KeyModifiers::SHIFT;
        let event = read()?;
        if let Some(KeyEvent {
            code, modifiers, ..
        }) = event.as_key_press_event()
        {
            if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
                self.state = AppState::Quitting;
            } else if !normal_modifiers.contains(modifiers) || !self.handle_key(code) {
                self.beep()?;
            }
        } else if let Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            ..
        }) = event
        {
            self.handle_press(Position::new(column, row));
        }
        // else: Redraw on resize, and we might as well redraw on other stuff
        // too
        Ok(())
    }

    // Returns `false` if the user pressed an invalid key
    fn handle_key(&mut self, key: KeyCode) -> bool {
        match self.state {
            AppState::Picking => match key {
                KeyCode::Enter | KeyCode::Char(' ') => self.picker.toggle(),
                KeyCode::Char('h') | KeyCode::Left => {
                    self.picker.is_open() && self.picker.show_prev()
                }
                KeyCode::Char('l') | KeyCode::Right => {
                    self.picker.is_open() && self.picker.show_next()
                }
                KeyCode::Char('k') | KeyCode::Up => self.picker.is_open() && self.go_up(),
                KeyCode::Backspace | KeyCode::Delete => self.picker.clear(),
                KeyCode::Esc if self.picker.is_open() => self.picker.dismiss(),
                KeyCode::Char('q') | KeyCode::Esc => {
                    self.state = AppState::Quitting;
                    true
                }
                KeyCode::Char('?') => {
                    self.state = AppState::Helping;
                    true
                }
                _ => false,
            },
            AppState::Helping => {
                self.state = AppState::Picking;
                true
            }
            AppState::Quitting => false,
        }
    }

    // Returns `false` if the press did nothing
    fn handle_press(&mut self, pos: Position) -> bool {
        match self.state {
            AppState::Picking => {
                let notified = self.listeners.pointer_down(pos);
                log::trace!("Press at {pos:?} notified {notified} outside listener(s)");
                self.picker.pointer_down(pos) || notified > 0
            }
            AppState::Helping => {
                self.state = AppState::Picking;
                true
            }
            AppState::Quitting => false,
        }
    }

    fn go_up(&mut self) -> bool {
        match self.picker.mode() {
            ViewMode::Days => self.picker.show_months(),
            ViewMode::Months => self.picker.show_years(),
            ViewMode::Years => false,
        }
    }

    fn beep(&self) -> io::Result<()> {
        io::stdout().write_all(b"\x07")
    }

    fn quitting(&self) -> bool {
        self.state == AppState::Quitting
    }

    // The local date is looked up on every pass so that the "today" mark
    // moves at midnight.
    fn refresh_today(&mut self) {
        match OffsetDateTime::now_local() {
            Ok(now) => self.picker.set_today(now.date()),
            Err(e) => log::debug!("Could not determine local date: {e}"),
        }
    }

    fn log_events(&mut self) {
        for event in self.picker.drain_events() {
            match event {
                PickerEvent::Changed(Some(date)) => log::info!("Selected {date}"),
                PickerEvent::Changed(None) => log::info!("Selection cleared"),
                other => log::debug!("Picker event: {other:?}"),
            }
        }
    }
}

impl Widget for &mut App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, BASE_STYLE);
        let [title_area, body, status_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .areas(area);
        let title = match self.picker.granularity() {
            Granularity::Month => "Pick a month",
            Granularity::Day => "Pick a date",
        };
        Line::styled(title, LABEL_STYLE)
            .centered()
            .render(title_area, buf);
        let [picker_area] = Layout::horizontal([PICKER_WIDTH])
            .flex(Flex::Center)
            .areas(body);
        let picker_area = Rect {
            y: picker_area.y.saturating_add(1),
            height: PICKER_HEIGHT.min(picker_area.height.saturating_sub(1)),
            ..picker_area
        };
        let placeholder = self.picker.config().get_placeholder().to_owned();
        DatePickerWidget::new()
            .trigger(move |props, area, buf| render_button(props, area, buf, &placeholder))
            .render(picker_area, buf, &mut self.picker);
        let [selection_area, hint_area] = Layout::horizontal([
            Constraint::Min(0),
            Constraint::Length(u16::try_from(HELP_HINT.len()).unwrap_or(u16::MAX)),
        ])
        .areas(status_area);
        let selection = self.picker.formatted_value();
        if selection.is_empty() {
            Line::styled("Nothing selected", PLACEHOLDER_STYLE).render(selection_area, buf);
        } else {
            Line::raw(format!("Selected: {selection}")).render(selection_area, buf);
        }
        Line::styled(HELP_HINT, PLACEHOLDER_STYLE).render(hint_area, buf);
        if self.state == AppState::Helping {
            Help(BASE_STYLE).render(area, buf);
        }
    }
}

/// Compact trigger drawn in place of the input box when it is hidden
fn render_button(mut props: TriggerProps<'_>, area: Rect, buf: &mut Buffer, placeholder: &str) {
    if area.height < 2 {
        return;
    }
    let text = if props.formatted.is_empty() {
        placeholder
    } else {
        props.formatted
    };
    let indicator = if props.is_open { '▴' } else { '▾' };
    let line = Line::styled(
        format!("[ {text} {indicator} ]"),
        BASE_STYLE.add_modifier(Modifier::BOLD),
    );
    let width = u16::try_from(line.width())
        .unwrap_or(u16::MAX)
        .min(area.width);
    let button = Rect {
        y: area.y + 1,
        width,
        height: 1,
        ..area
    };
    line.render(button, buf);
    props.open.bind(button);
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum AppState {
    Picking,
    Helping,
    Quitting,
}

/// Mouse reporting is on for as long as this is alive
#[derive(Debug)]
struct MouseCapture;

impl MouseCapture {
    fn enable() -> io::Result<MouseCapture> {
        execute!(io::stdout(), EnableMouseCapture)?;
        Ok(MouseCapture)
    }
}

impl Drop for MouseCapture {
    fn drop(&mut self) {
        if let Err(e) = execute!(io::stdout(), DisableMouseCapture) {
            log::warn!("Failed to disable mouse capture: {e}");
        }
    }
}
