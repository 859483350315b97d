mod app;
mod help;
use crate::app::App;
use anyhow::Context;
use datepick::{parse_bound, DatePicker, PickerConfig, PointerListeners};
use lexopt::{Arg, Parser, ValueExt};
use ratatui::DefaultTerminal;
use std::fs::File;
use std::path::{Path, PathBuf};
use time::{
    format_description::BorrowedFormatItem, macros::format_description, Date, OffsetDateTime,
};

static YMD_FMT: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");

#[derive(Clone, Debug, Default, Eq, PartialEq)]
struct Options {
    date: Option<Date>,
    days: bool,
    format: Option<String>,
    min: Option<String>,
    max: Option<String>,
    placeholder: Option<String>,
    disabled: bool,
    hide_input: bool,
    log_file: Option<PathBuf>,
}

impl Options {
    fn config(&self) -> PickerConfig {
        let mut config = PickerConfig::new()
            .show_days(self.days)
            .disabled(self.disabled)
            .hide_input(self.hide_input)
            .placeholder(self.placeholder.clone().unwrap_or_else(|| {
                String::from(if self.days {
                    "Select a date"
                } else {
                    "Select a month"
                })
            }));
        if let Some(ref pattern) = self.format {
            config = config.format(pattern.as_str());
        }
        if let Some(ref min) = self.min {
            config = config.min_date(min.as_str());
        }
        if let Some(ref max) = self.max {
            config = config.max_date(max.as_str());
        }
        config
    }

    /// Returns a warning for each `--min`/`--max` value that will be ignored
    /// because it cannot be parsed
    fn bound_warnings(&self) -> Vec<String> {
        self.min
            .iter()
            .chain(&self.max)
            .filter_map(|bound| parse_bound(bound).err())
            .map(|e| format!("{e}; the bound will be ignored"))
            .collect()
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum Command {
    Run(Options),
    Help,
    Version,
}

impl Command {
    fn from_parser(mut parser: Parser) -> Result<Command, lexopt::Error> {
        let mut opts = Options::default();
        while let Some(arg) = parser.next()? {
            match arg {
                Arg::Short('h') | Arg::Long("help") => return Ok(Command::Help),
                Arg::Short('V') | Arg::Long("version") => return Ok(Command::Version),
                Arg::Short('d') | Arg::Long("days") => opts.days = true,
                Arg::Short('f') | Arg::Long("format") => {
                    opts.format = Some(parser.value()?.string()?);
                }
                Arg::Long("min") => opts.min = Some(parser.value()?.string()?),
                Arg::Long("max") => opts.max = Some(parser.value()?.string()?),
                Arg::Short('p') | Arg::Long("placeholder") => {
                    opts.placeholder = Some(parser.value()?.string()?);
                }
                Arg::Long("disabled") => opts.disabled = true,
                Arg::Long("hide-input") => opts.hide_input = true,
                Arg::Long("log-file") => opts.log_file = Some(PathBuf::from(parser.value()?)),
                Arg::Value(value) if opts.date.is_none() => {
                    let value = value.string()?;
                    match Date::parse(&value, &YMD_FMT) {
                        Ok(d) => opts.date = Some(d),
                        Err(e) => {
                            return Err(lexopt::Error::ParsingFailed {
                                value,
                                error: Box::new(e),
                            })
                        }
                    }
                }
                _ => return Err(arg.unexpected()),
            }
        }
        Ok(Command::Run(opts))
    }

    fn run(self) -> anyhow::Result<()> {
        match self {
            Command::Run(opts) => {
                if let Some(ref path) = opts.log_file {
                    init_logging(path)?;
                }
                // Shown before the terminal is taken over so that it stays
                // visible after exit
                for warning in opts.bound_warnings() {
                    log::warn!("{warning}");
                    eprintln!("datepick: warning: {warning}");
                }
                let today = OffsetDateTime::now_local()
                    .context("failed to determine local date")?
                    .date();
                let listeners = PointerListeners::new();
                let picker = DatePicker::new(opts.config(), today)
                    .with_value(opts.date)
                    .pointer_listeners(&listeners);
                let selection = with_terminal(|terminal| {
                    App::new(picker, listeners)
                        .run(terminal)
                        .context("terminal I/O failed")
                })?;
                println!("{selection}");
                Ok(())
            }
            Command::Help => {
                println!("Usage: datepick [options] [YYYY-MM-DD]");
                println!();
                println!("Pick a month or a date in the terminal and print it");
                println!();
                println!("Options:");
                println!("  -d, --days              Pick a full date instead of a year and month");
                println!("  -f, --format PATTERN    Display pattern using yyyy, mm, and dd");
                println!("      --min DATE          Earliest selectable date");
                println!("      --max DATE          Latest selectable date");
                println!("  -p, --placeholder TEXT  Text shown when nothing is selected");
                println!("      --disabled          Show the picker without allowing changes");
                println!("      --hide-input        Use a compact button instead of an input box");
                println!("      --log-file PATH     Write logs to PATH (level set by RUST_LOG)");
                println!("  -h, --help              Display this help message and exit");
                println!("  -V, --version           Show the program version and exit");
                Ok(())
            }
            Command::Version => {
                println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
                Ok(())
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    Command::from_parser(Parser::from_env())?.run()
}

fn with_terminal<F, T>(func: F) -> anyhow::Result<T>
where
    F: FnOnce(DefaultTerminal) -> anyhow::Result<T>,
{
    let terminal = ratatui::init();
    let r = func(terminal);
    ratatui::restore();
    r
}

// Logging goes to a file because stderr is shared with the terminal UI
fn init_logging(path: &Path) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    log::info!("{} {} starting", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use datepick::{Granularity, ViewMode};
    use std::ffi::OsString;
    use time::macros::{date, datetime};

    fn parse(args: &[&str]) -> Result<Command, lexopt::Error> {
        let args = args.iter().map(OsString::from).collect::<Vec<_>>();
        Command::from_parser(Parser::from_iter(
            std::iter::once(OsString::from("datepick")).chain(args),
        ))
    }

    #[test]
    fn test_defaults() {
        assert_eq!(parse(&[]).unwrap(), Command::Run(Options::default()));
    }

    #[test]
    fn test_all_options() {
        let cmd = parse(&[
            "--days",
            "-f",
            "yyyy/mm/dd",
            "--min",
            "2024-01-10",
            "--max=2024-12-31",
            "-p",
            "When?",
            "--hide-input",
            "--log-file",
            "picker.log",
            "2024-03-15",
        ])
        .unwrap();
        let Command::Run(opts) = cmd else {
            panic!("Expected Run command, got {cmd:?}");
        };
        assert_eq!(opts.date, Some(date!(2024 - 03 - 15)));
        assert!(opts.days);
        assert!(opts.hide_input);
        assert!(!opts.disabled);
        assert_eq!(opts.log_file, Some(PathBuf::from("picker.log")));
        let config = opts.config();
        assert_eq!(config.get_granularity(), Granularity::Day);
        assert_eq!(config.get_placeholder(), "When?");
        assert!(config.is_input_hidden());
        let picker = DatePicker::new(config, date!(2024 - 05 - 20)).with_value(opts.date);
        assert_eq!(picker.formatted_value(), "2024/03/15");
        assert_eq!(picker.mode(), ViewMode::Days);
        assert_eq!(picker.bounds().min(), Some(datetime!(2024 - 01 - 10 0:00)));
        assert_eq!(picker.bounds().max(), Some(datetime!(2024 - 12 - 31 0:00)));
    }

    #[test]
    fn test_default_placeholder() {
        let opts = Options::default();
        assert_eq!(opts.config().get_placeholder(), "Select a month");
        let opts = Options {
            days: true,
            ..Options::default()
        };
        assert_eq!(opts.config().get_placeholder(), "Select a date");
    }

    #[test]
    fn test_bound_warnings() {
        let opts = Options {
            min: Some(String::from("soon")),
            max: Some(String::from("2024-12-31")),
            ..Options::default()
        };
        assert_eq!(
            opts.bound_warnings(),
            ["could not parse \"soon\" as a date; the bound will be ignored"]
        );
        let opts = Options {
            max: Some(String::from("later")),
            ..opts
        };
        assert_eq!(opts.bound_warnings().len(), 2);
        assert!(Options::default().bound_warnings().is_empty());
        let picker = DatePicker::new(opts.config(), date!(2024 - 05 - 20));
        assert_eq!(picker.bounds().min(), None);
    }

    #[test]
    fn test_bad_date() {
        assert!(parse(&["2024-13-01"]).is_err());
        assert!(parse(&["2024-01-01", "2024-01-02"]).is_err());
    }

    #[test]
    fn test_help_and_version() {
        assert_eq!(parse(&["--days", "-h"]).unwrap(), Command::Help);
        assert_eq!(parse(&["--version"]).unwrap(), Command::Version);
    }

    #[test]
    fn test_missing_value() {
        assert!(parse(&["--format"]).is_err());
    }
}
