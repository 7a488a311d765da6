//! Where a run's selections come from: command-line flags or a terminal prompt.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use stockfetch_core::domain::{Interval, TickerList};
use stockfetch_core::range::{RangePreset, RangeRequest};

/// Everything needed to start a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub tickers: TickerList,
    pub interval: Interval,
    pub range: RangeRequest,
    pub generate_charts: bool,
}

impl Selection {
    /// Print the selection as a two-column table.
    pub fn write_summary(&self, out: &mut dyn Write, today: NaiveDate) -> std::io::Result<()> {
        let dates = match self.range.to_dates(self.interval, today) {
            Ok((start, end)) if self.range != RangeRequest::Max => format!("{start} to {end}"),
            _ => "Maximum available".to_string(),
        };
        writeln!(out, "\nSummary of Selections")?;
        writeln!(out, "  {:<16} {}", "Stocks", self.tickers.joined())?;
        writeln!(out, "  {:<16} {}", "Data Frequency", self.interval)?;
        writeln!(out, "  {:<16} {} ({dates})", "Date Range", self.range.describe())?;
        writeln!(
            out,
            "  {:<16} {}",
            "Generate Charts",
            if self.generate_charts { "Yes" } else { "No" }
        )
    }
}

/// A source of run selections.
pub trait InputSource {
    fn tickers(&mut self) -> Result<TickerList>;

    fn interval(&mut self) -> Result<Interval>;

    fn range(&mut self, interval: Interval) -> Result<RangeRequest>;

    fn generate_charts(&mut self) -> Result<bool>;

    /// Last chance to back out. Non-interactive sources always proceed.
    fn confirm(&mut self, _selection: &Selection, _today: NaiveDate) -> Result<bool> {
        Ok(true)
    }
}

/// Ask a source for a complete selection, in step order.
pub fn collect(source: &mut dyn InputSource) -> Result<Selection> {
    let tickers = source.tickers()?;
    let interval = source.interval()?;
    let range = source.range(interval)?;
    let generate_charts = source.generate_charts()?;
    Ok(Selection {
        tickers,
        interval,
        range,
        generate_charts,
    })
}

// ─── Flags ──────────────────────────────────────────────────────────

/// Selections given on the command line, with the ticker file as fallback.
#[derive(Debug, Clone, Default)]
pub struct ArgsInput {
    pub tickers: Option<String>,
    pub ticker_file: PathBuf,
    pub interval: Interval,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub preset: Option<RangePreset>,
    pub max: bool,
    pub generate_charts: bool,
}

impl InputSource for ArgsInput {
    fn tickers(&mut self) -> Result<TickerList> {
        let list = match &self.tickers {
            Some(raw) => TickerList::parse_csv(raw)?,
            None => TickerList::from_file(&self.ticker_file).with_context(|| {
                format!(
                    "no --tickers given and the ticker file {} could not be read",
                    self.ticker_file.display()
                )
            })?,
        };
        if list.is_empty() {
            bail!(
                "no tickers to fetch: pass --tickers or list symbols in {}",
                self.ticker_file.display()
            );
        }
        Ok(list)
    }

    fn interval(&mut self) -> Result<Interval> {
        Ok(self.interval)
    }

    fn range(&mut self, interval: Interval) -> Result<RangeRequest> {
        if self.max {
            return Ok(RangeRequest::Max);
        }
        if let Some(start) = self.start {
            return Ok(RangeRequest::Between {
                start,
                end: self.end,
            });
        }
        match self.preset {
            Some(RangePreset::Custom) => bail!("--preset custom needs --start (and optionally --end)"),
            Some(preset) => {
                if !interval.presets().contains(&preset) {
                    tracing::warn!(%interval, preset = preset.slug(), "preset is not offered for this interval");
                }
                Ok(RangeRequest::Preset(preset))
            }
            None => Ok(RangeRequest::default_for(interval)),
        }
    }

    fn generate_charts(&mut self) -> Result<bool> {
        Ok(self.generate_charts)
    }
}

// ─── Terminal prompt ────────────────────────────────────────────────

/// Step-by-step questions on a terminal (or any reader/writer pair).
pub struct PromptInput<R, W> {
    reader: R,
    writer: W,
    ticker_file: PathBuf,
    default_interval: Interval,
}

impl<R: BufRead, W: Write> PromptInput<R, W> {
    pub fn new(reader: R, writer: W, ticker_file: &Path, default_interval: Interval) -> Self {
        Self {
            reader,
            writer,
            ticker_file: ticker_file.to_path_buf(),
            default_interval,
        }
    }

    /// Print `question`, read one trimmed line. End of input is an error.
    fn ask(&mut self, question: &str) -> Result<String> {
        write!(self.writer, "{question} ")?;
        self.writer.flush()?;
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            bail!("input closed before a selection was made");
        }
        Ok(line.trim().to_string())
    }

    fn ask_yes_no(&mut self, question: &str, default: bool) -> Result<bool> {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        loop {
            let answer = self.ask(&format!("{question} {hint}"))?;
            match answer.to_lowercase().as_str() {
                "" => return Ok(default),
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => writeln!(self.writer, "Please answer y or n.")?,
            }
        }
    }

    /// Numbered menu; returns the chosen index. Blank picks `default`.
    fn ask_choice(&mut self, question: &str, options: &[String], default: usize) -> Result<usize> {
        for (i, opt) in options.iter().enumerate() {
            let marker = if i == default { " (default)" } else { "" };
            writeln!(self.writer, "  {:>2}) {opt}{marker}", i + 1)?;
        }
        loop {
            let answer = self.ask(question)?;
            if answer.is_empty() {
                return Ok(default);
            }
            match answer.parse::<usize>() {
                Ok(n) if (1..=options.len()).contains(&n) => return Ok(n - 1),
                _ => writeln!(self.writer, "Enter a number between 1 and {}.", options.len())?,
            }
        }
    }

    fn ask_date(&mut self, question: &str, optional: bool) -> Result<Option<NaiveDate>> {
        loop {
            let answer = self.ask(question)?;
            if answer.is_empty() && optional {
                return Ok(None);
            }
            match NaiveDate::parse_from_str(&answer, "%Y-%m-%d") {
                Ok(date) => return Ok(Some(date)),
                Err(_) => writeln!(self.writer, "Not a date in YYYY-MM-DD form: '{answer}'")?,
            }
        }
    }

    fn file_tickers(&self) -> Option<TickerList> {
        if !self.ticker_file.exists() {
            return None;
        }
        match TickerList::from_file(&self.ticker_file) {
            Ok(list) if !list.is_empty() => Some(list),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable ticker file");
                None
            }
        }
    }
}

impl<R: BufRead, W: Write> InputSource for PromptInput<R, W> {
    fn tickers(&mut self) -> Result<TickerList> {
        writeln!(self.writer, "\nStep 1: Stock Selection")?;

        if let Some(list) = self.file_tickers() {
            writeln!(self.writer, "Available tickers in input file:")?;
            writeln!(self.writer, "{}", list.joined())?;
            if self.ask_yes_no("Use tickers from the input file?", true)? {
                return Ok(list);
            }
        } else {
            writeln!(
                self.writer,
                "No input file found or file is empty. Please enter tickers manually."
            )?;
        }

        loop {
            let answer = self.ask("Enter stock tickers (comma-separated):")?;
            match TickerList::parse_csv(&answer) {
                Ok(list) => return Ok(list),
                Err(e) => writeln!(self.writer, "{e}")?,
            }
        }
    }

    fn interval(&mut self) -> Result<Interval> {
        writeln!(self.writer, "\nStep 2: Data Frequency Selection")?;
        let options: Vec<String> = Interval::ALL
            .iter()
            .map(|i| format!("{i} ({} - {})", i.description(), i.availability()))
            .collect();
        let default = Interval::ALL
            .iter()
            .position(|i| *i == self.default_interval)
            .unwrap_or(0);
        let idx = self.ask_choice("Select data frequency:", &options, default)?;
        Ok(Interval::ALL[idx])
    }

    fn range(&mut self, interval: Interval) -> Result<RangeRequest> {
        writeln!(self.writer, "\nStep 3: Date Range Selection")?;
        let presets = interval.presets();
        let mut options: Vec<String> = presets.iter().map(|p| p.label().to_string()).collect();
        options.push("Maximum available".to_string());

        let idx = self.ask_choice("Select date range:", &options, 0)?;
        match presets.get(idx) {
            None => Ok(RangeRequest::Max),
            Some(RangePreset::Custom) => {
                let start = self
                    .ask_date("Enter start date (YYYY-MM-DD):", false)?
                    .context("start date is required")?;
                let end =
                    self.ask_date("Enter end date (YYYY-MM-DD or press enter for today):", true)?;
                Ok(RangeRequest::Between { start, end })
            }
            Some(preset) => Ok(RangeRequest::Preset(*preset)),
        }
    }

    fn generate_charts(&mut self) -> Result<bool> {
        writeln!(self.writer, "\nStep 4: Visualization Options")?;
        self.ask_yes_no("Generate interactive charts?", true)
    }

    fn confirm(&mut self, selection: &Selection, today: NaiveDate) -> Result<bool> {
        selection.write_summary(&mut self.writer, today)?;
        self.ask_yes_no("Proceed with these selections?", true)
    }
}
