use ratatui::style::{Color, Modifier, Style};

pub const BASE_STYLE: Style = Style::new().fg(Color::White).bg(Color::Black);

/// Placeholder text in an empty input box
pub const PLACEHOLDER_STYLE: Style = BASE_STYLE.fg(Color::DarkGray);

/// The input box of a disabled picker, and grid cells that cannot be picked
pub const DISABLED_STYLE: Style = BASE_STYLE.fg(Color::DarkGray);

pub const SELECTED_STYLE: Style = BASE_STYLE.add_modifier(Modifier::REVERSED);

/// The year/month label in the popup header
pub const LABEL_STYLE: Style = BASE_STYLE.add_modifier(Modifier::BOLD);

pub const NAV_STYLE: Style = BASE_STYLE.add_modifier(Modifier::BOLD);

pub const WEEKDAY_STYLE: Style = BASE_STYLE.add_modifier(Modifier::BOLD);
