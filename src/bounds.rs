use thiserror::Error;
use time::{
    format_description::{well_known::Rfc3339, BorrowedFormatItem},
    macros::format_description,
    Date, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset,
};

static DATE_FMT: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");

static DATETIME_FMTS: &[&[BorrowedFormatItem<'_>]] = &[
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]"),
];

/// A minimum or maximum selectable date as supplied by the host
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DateBound {
    /// A fully resolved wall-clock instant
    At(PrimitiveDateTime),

    /// Text to be parsed with [`parse_bound()`]; unparseable text acts as if
    /// no bound were given
    Text(String),
}

impl DateBound {
    /// Resolves the bound to an instant, or `None` if it is unparseable text
    pub fn resolve(&self) -> Option<PrimitiveDateTime> {
        match self {
            DateBound::At(dt) => Some(*dt),
            DateBound::Text(s) => match parse_bound(s) {
                Ok(dt) => Some(dt),
                Err(e) => {
                    log::debug!("Ignoring date bound: {e}");
                    None
                }
            },
        }
    }
}

impl From<Date> for DateBound {
    fn from(date: Date) -> DateBound {
        DateBound::At(date.midnight())
    }
}

impl From<PrimitiveDateTime> for DateBound {
    fn from(dt: PrimitiveDateTime) -> DateBound {
        DateBound::At(dt)
    }
}

impl From<OffsetDateTime> for DateBound {
    fn from(dt: OffsetDateTime) -> DateBound {
        DateBound::At(utc_wall_clock(dt))
    }
}

impl From<&str> for DateBound {
    fn from(s: &str) -> DateBound {
        DateBound::Text(s.to_owned())
    }
}

impl From<String> for DateBound {
    fn from(s: String) -> DateBound {
        DateBound::Text(s)
    }
}

#[derive(Debug, Error)]
#[error("could not parse {text:?} as a date")]
pub struct BoundParseError {
    text: String,
    #[source]
    source: time::error::Parse,
}

impl BoundParseError {
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Parses a date bound given as text.
///
/// Accepted forms are `YYYY-MM-DD` (the start of that day),
/// `YYYY-MM-DDTHH:MM[:SS]` or the same with a space instead of the `T`, and
/// RFC 3339 timestamps, which are converted to UTC.
pub fn parse_bound(s: &str) -> Result<PrimitiveDateTime, BoundParseError> {
    let text = s.trim();
    let mut last_err = match Date::parse(text, DATE_FMT) {
        Ok(date) => return Ok(date.midnight()),
        Err(e) => e,
    };
    for fmt in DATETIME_FMTS {
        match PrimitiveDateTime::parse(text, fmt) {
            Ok(dt) => return Ok(dt),
            Err(e) => last_err = e,
        }
    }
    match OffsetDateTime::parse(text, &Rfc3339) {
        Ok(dt) => Ok(utc_wall_clock(dt)),
        Err(_) => Err(BoundParseError {
            text: s.to_owned(),
            source: last_err,
        }),
    }
}

fn utc_wall_clock(dt: OffsetDateTime) -> PrimitiveDateTime {
    let dt = dt.to_offset(UtcOffset::UTC);
    PrimitiveDateTime::new(dt.date(), dt.time())
}

/// Inclusive minimum and maximum selectable instants
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Bounds {
    min: Option<PrimitiveDateTime>,
    max: Option<PrimitiveDateTime>,
}

impl Bounds {
    pub fn new(min: Option<&DateBound>, max: Option<&DateBound>) -> Bounds {
        Bounds {
            min: min.and_then(DateBound::resolve),
            max: max.and_then(DateBound::resolve),
        }
    }

    pub fn min(&self) -> Option<PrimitiveDateTime> {
        self.min
    }

    pub fn max(&self) -> Option<PrimitiveDateTime> {
        self.max
    }

    /// Returns `true` unless the start of `date` lies strictly before the
    /// minimum or strictly after the maximum
    pub fn contains(&self, date: Date) -> bool {
        let t = date.midnight();
        !(self.min.is_some_and(|min| t < min) || self.max.is_some_and(|max| t > max))
    }

    /// Returns `true` if at least one day from `first` through `last`
    /// (inclusive) is within the bounds
    pub fn contains_any(&self, first: Date, last: Date) -> bool {
        let lo = match self.min.map(first_day_at_or_after) {
            Some(Some(d)) => d.max(first),
            Some(None) => return false,
            None => first,
        };
        let hi = match self.max {
            Some(max) => max.date().min(last),
            None => last,
        };
        lo <= hi
    }
}

// The first date whose start is not before `dt`
fn first_day_at_or_after(dt: PrimitiveDateTime) -> Option<Date> {
    if dt.time() == Time::MIDNIGHT {
        Some(dt.date())
    } else {
        dt.date().next_day()
    }
}
