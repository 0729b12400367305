//! Rendering of ticks for the terminal and the audit log.

use crate::audit::{timestamp, AuditLog};
use crate::error::{Result, StashError};
use crate::outcome::{Outcome, Status, Tick};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;

pub const SHORT_ID_LEN: usize = 8;

const ANSI_GREEN: &str = "\x1b[32m";
const ANSI_DIM: &str = "\x1b[2m";
const ANSI_RED: &str = "\x1b[31m";
const ANSI_BOLD: &str = "\x1b[1m";
const ANSI_RESET: &str = "\x1b[0m";

// ---------------------------------------------------------------------------
// Format
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Line,
    Pretty,
}

impl Format {
    pub fn as_str(self) -> &'static str {
        match self {
            Format::Line => "line",
            Format::Pretty => "pretty",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Format {
    type Err = StashError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "line" => Ok(Format::Line),
            "pretty" => Ok(Format::Pretty),
            _ => Err(StashError::UnknownFormat(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Visual class of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Quiet,
    Failure,
    Heading,
}

impl Tone {
    fn for_status(status: Status) -> Self {
        match status {
            Status::Stashed => Tone::Success,
            Status::NoChanges | Status::Skipped => Tone::Quiet,
            Status::Error => Tone::Failure,
        }
    }

    fn icon(self) -> &'static str {
        match self {
            Tone::Success => "✔",
            Tone::Quiet => "·",
            Tone::Failure => "✖",
            Tone::Heading => "",
        }
    }

    fn ansi(self) -> &'static str {
        match self {
            Tone::Success => ANSI_GREEN,
            Tone::Quiet => ANSI_DIM,
            Tone::Failure => ANSI_RED,
            Tone::Heading => ANSI_BOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLine {
    pub text: String,
    pub tone: Tone,
    /// Whether the console copy gets a timestamp prefix. The audit log
    /// always stamps.
    pub stamped: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub lines: Vec<ReportLine>,
}

impl Report {
    /// Plain text, one line per entry, no timestamps or colour.
    pub fn plain(&self) -> Vec<&str> {
        self.lines.iter().map(|l| l.text.as_str()).collect()
    }

    /// Console rendering: timestamps on stamped lines, ANSI colour when
    /// `color` is set.
    pub fn console(&self, at: DateTime<Local>, color: bool) -> String {
        let stamp = timestamp(at);
        let mut out = String::new();
        for line in &self.lines {
            if line.stamped {
                out.push_str(&stamp);
                out.push(' ');
            }
            if color {
                out.push_str(line.tone.ansi());
                out.push_str(&line.text);
                out.push_str(ANSI_RESET);
            } else {
                out.push_str(&line.text);
            }
            out.push('\n');
        }
        out
    }
}

pub fn render(tick: &Tick, format: Format) -> Report {
    match format {
        Format::Line => render_line(tick),
        Format::Pretty => render_pretty(tick),
    }
}

fn render_line(tick: &Tick) -> Report {
    let mut lines: Vec<ReportLine> = tick
        .outcomes
        .iter()
        .map(|o| ReportLine {
            text: outcome_fields(o),
            tone: Tone::for_status(o.status()),
            stamped: false,
        })
        .collect();

    let mut summary = format!(
        "summary run={} {} took={:.2}s",
        tick.index,
        tick.summary(),
        tick.duration.as_secs_f64()
    );
    if let Some(next) = tick.next_run {
        summary.push_str(&format!(" next=\"{}\"", next.format("%Y-%m-%d %H:%M:%S")));
    }
    lines.push(ReportLine {
        text: summary,
        tone: summary_tone(tick),
        stamped: true,
    });
    Report { lines }
}

/// `STATUS repo=<path> [stash=<id8>] [msg="..."] [detail="..."]`
fn outcome_fields(o: &Outcome) -> String {
    let mut s = format!("{} repo={}", o.status(), o.repo);
    if let Some(id) = o.stash_id() {
        s.push_str(&format!(" stash={}", short_id(id)));
    }
    if let Some(msg) = o.message() {
        s.push_str(&format!(" msg={msg:?}"));
    }
    if let Some(detail) = o.detail() {
        s.push_str(&format!(" detail={detail:?}"));
    }
    s
}

fn render_pretty(tick: &Tick) -> Report {
    let mut header = format!(
        "run #{}  took {:.2}s",
        tick.index,
        tick.duration.as_secs_f64()
    );
    match tick.next_run {
        Some(next) => header.push_str(&format!("  next run {}", next.format("%Y-%m-%d %H:%M:%S"))),
        None => header.push_str("  no further runs"),
    }

    let mut lines = vec![ReportLine {
        text: header,
        tone: Tone::Heading,
        stamped: true,
    }];

    for o in &tick.outcomes {
        let tone = Tone::for_status(o.status());
        let mut text = format!("├─ {} {:<10}  {}", tone.icon(), o.status(), o.repo);
        if let Some(id) = o.stash_id() {
            text.push_str(&format!("  stash {}", short_id(id)));
        }
        if let Some(msg) = o.message() {
            text.push_str(&format!("  {msg:?}"));
        }
        if let Some(detail) = o.detail() {
            text.push_str(&format!("  {}", first_line(detail)));
        }
        lines.push(ReportLine {
            text,
            tone,
            stamped: false,
        });
    }

    lines.push(ReportLine {
        text: format!("└─ {}", tick.summary()),
        tone: summary_tone(tick),
        stamped: false,
    });
    Report { lines }
}

fn summary_tone(tick: &Tick) -> Tone {
    let s = tick.summary();
    if s.error > 0 {
        Tone::Failure
    } else if s.stashed > 0 {
        Tone::Success
    } else {
        Tone::Quiet
    }
}

fn short_id(id: &str) -> &str {
    id.get(..SHORT_ID_LEN).unwrap_or(id)
}

fn first_line(s: &str) -> &str {
    s.lines().next().unwrap_or("")
}

// ---------------------------------------------------------------------------
// Reporter
// ---------------------------------------------------------------------------

/// Writes rendered ticks and lifecycle events to a console writer and the
/// audit log.
pub struct Reporter<W> {
    format: Format,
    color: bool,
    audit: AuditLog,
    out: W,
}

impl<W: Write> Reporter<W> {
    pub fn new(format: Format, color: bool, audit: AuditLog, out: W) -> Self {
        Self {
            format,
            color,
            audit,
            out,
        }
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    pub fn emit(&mut self, tick: &Tick) -> Result<()> {
        self.emit_at(tick, Local::now())
    }

    pub fn emit_at(&mut self, tick: &Tick, at: DateTime<Local>) -> Result<()> {
        let report = render(tick, self.format);
        self.out.write_all(report.console(at, self.color).as_bytes())?;
        self.out.flush()?;
        self.audit.append(at, &report.plain())
    }

    /// A single lifecycle line, stamped on both surfaces.
    pub fn event(&mut self, text: &str) -> Result<()> {
        let at = Local::now();
        writeln!(self.out, "{} {text}", timestamp(at))?;
        self.audit.append(at, &[text])
    }
}
