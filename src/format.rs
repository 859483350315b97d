use crate::config::Granularity;
use std::fmt::{self, Write};
use time::{format_description::BorrowedFormatItem, macros::format_description, Date};

static DAY_FMT: &[BorrowedFormatItem<'_>] =
    format_description!("[day padding:none] [month repr:long] [year]");

static MONTH_FMT: &[BorrowedFormatItem<'_>] = format_description!("[month repr:long] [year]");

const YEAR_TOKEN: &str = "yyyy";
const MONTH_TOKEN: &str = "mm";
const DAY_TOKEN: &str = "dd";

/// How a selected date is turned into display text
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum DisplayFormat {
    /// "15 March 2023" for day granularity, "March 2023" for month granularity
    Verbose(Granularity),

    /// A pattern in which every `yyyy`, `mm`, and `dd` is replaced by the
    /// zero-padded year, month (1-based), and day
    Pattern(String),
}

impl DisplayFormat {
    pub fn new(pattern: Option<&str>, granularity: Granularity) -> DisplayFormat {
        match pattern {
            Some(p) => DisplayFormat::Pattern(p.to_owned()),
            None => DisplayFormat::Verbose(granularity),
        }
    }

    /// Formats `date`, returning an empty string for `None`
    pub fn format(&self, date: Option<Date>) -> String {
        let Some(date) = date else {
            return String::new();
        };
        match self {
            DisplayFormat::Verbose(Granularity::Day) => date.format(DAY_FMT).unwrap_or_default(),
            DisplayFormat::Verbose(Granularity::Month) => {
                date.format(MONTH_FMT).unwrap_or_default()
            }
            DisplayFormat::Pattern(pattern) => substitute(pattern, date).unwrap_or_default(),
        }
    }
}

fn substitute(pattern: &str, date: Date) -> Result<String, fmt::Error> {
    let mut out = String::with_capacity(pattern.len() + 4);
    let mut rest = pattern;
    while let Some(ch) = rest.chars().next() {
        if let Some(r) = rest.strip_prefix(YEAR_TOKEN) {
            write!(out, "{:04}", date.year())?;
            rest = r;
        } else if let Some(r) = rest.strip_prefix(MONTH_TOKEN) {
            write!(out, "{:02}", u8::from(date.month()))?;
            rest = r;
        } else if let Some(r) = rest.strip_prefix(DAY_TOKEN) {
            write!(out, "{:02}", date.day())?;
            rest = r;
        } else {
            out.push(ch);
            rest = &rest[ch.len_utf8()..];
        }
    }
    Ok(out)
}
