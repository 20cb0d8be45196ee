//! Display side: turns a [`Progress`] into the strings shown each tick and
//! writes them to a terminal.

use std::io::{self, Write};

use crate::age::age_string;
use crate::stats::Progress;

pub const TOTAL_LABELS: [&str; 6] = ["months", "weeks", "days", "hours", "minutes", "seconds"];

/// One rendered tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub age: String,
    /// Long date, e.g. "June 15, 2070".
    pub target_date: String,
    pub remaining_percent: String,
    pub remaining_years: String,
    /// Years unpadded, everything else zero-padded to two digits.
    pub countdown: [String; 6],
    pub totals: [String; 6],
    pub stroke_offset: f64,
}

impl Frame {
    pub fn from_progress(p: &Progress, stroke_offset: f64) -> Self {
        let r = &p.remaining;
        let t = &p.totals;
        Self {
            age: age_string(&p.age),
            target_date: p.target.format("%B %-d, %Y").to_string(),
            remaining_percent: format!("{:.4}%", p.remaining_ratio * 100.0),
            remaining_years: r.years.to_string(),
            countdown: [
                r.years.to_string(),
                format!("{:02}", r.months),
                format!("{:02}", r.days),
                format!("{:02}", r.hours),
                format!("{:02}", r.minutes),
                format!("{:02}", r.seconds),
            ],
            totals: [t.months, t.weeks, t.days, t.hours, t.minutes, t.seconds].map(group_thousands),
            stroke_offset,
        }
    }
}

/// Formats with `,` between groups of three digits, the en-US convention.
/// Output is the same whatever the host locale.
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Receives computed frames.
pub trait DisplaySink {
    fn render(&mut self, frame: &Frame) -> io::Result<()>;

    /// Called instead of `render` while no birth date is configured. The
    /// settings are entered on the same surface the frames are drawn on, so
    /// the sink owns the prompt.
    fn request_configuration(&mut self) -> io::Result<()>;
}

/// Redraws the frame in place on an ANSI terminal.
pub struct TerminalSink<W: Write> {
    out: W,
    redraw: bool,
}

impl TerminalSink<io::Stdout> {
    pub fn stdout(redraw: bool) -> Self {
        Self::new(io::stdout(), redraw)
    }
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W, redraw: bool) -> Self {
        Self { out, redraw }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> DisplaySink for TerminalSink<W> {
    fn render(&mut self, frame: &Frame) -> io::Result<()> {
        if self.redraw {
            // cursor home + clear screen
            write!(self.out, "\x1b[H\x1b[2J")?;
        }
        write_frame(&mut self.out, frame)?;
        self.out.flush()
    }

    fn request_configuration(&mut self) -> io::Result<()> {
        writeln!(
            self.out,
            "No birth date configured. Enter: set <YYYY-MM-DD> <target age>"
        )?;
        self.out.flush()
    }
}

fn write_frame(out: &mut impl Write, frame: &Frame) -> io::Result<()> {
    writeln!(out, "Age           {}", frame.age)?;
    writeln!(out, "Remaining     {}", frame.remaining_percent)?;
    writeln!(out, "Years left    {}", frame.remaining_years)?;
    writeln!(out, "Target date   {}", frame.target_date)?;
    writeln!(out)?;

    let c = &frame.countdown;
    writeln!(
        out,
        "Countdown     {}y {}m {}d {}:{}:{}",
        c[0], c[1], c[2], c[3], c[4], c[5]
    )?;
    writeln!(out)?;

    for (label, value) in TOTAL_LABELS.iter().zip(&frame.totals) {
        writeln!(out, "  {label:<9} {value:>18}")?;
    }
    writeln!(out)?;
    writeln!(out, "Ring offset   {:.3}", frame.stroke_offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::age::Breakdown;
    use crate::stats::Totals;
    use chrono::NaiveDate;

    fn sample() -> Progress {
        Progress {
            target: NaiveDate::from_ymd_opt(2070, 6, 15)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            progress_ratio: 0.425,
            remaining_ratio: 0.575,
            remaining: Breakdown {
                years: 46,
                months: 1,
                days: 9,
                hours: 0,
                minutes: 5,
                seconds: 7,
            },
            age: Breakdown {
                years: 34,
                months: 2,
                days: 3,
                ..Breakdown::ZERO
            },
            total_ms: 0,
            remaining_ms: 86_400_000,
            totals: Totals {
                months: 553,
                weeks: 2_403,
                days: 16_824,
                hours: 403_776,
                minutes: 24_226_560,
                seconds: 1_453_593_600,
            },
        }
    }

    #[test]
    fn frame_fields() {
        let frame = Frame::from_progress(&sample(), 343.23);
        assert_eq!(frame.age, "34y 2m 3d");
        assert_eq!(frame.target_date, "June 15, 2070");
        assert_eq!(frame.remaining_percent, "57.5000%");
        assert_eq!(frame.remaining_years, "46");
        assert_eq!(frame.countdown, ["46", "01", "09", "00", "05", "07"].map(String::from));
        assert_eq!(frame.totals[0], "553");
        assert_eq!(frame.totals[2], "16,824");
        assert_eq!(frame.totals[5], "1,453,593,600");
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1_000), "1,000");
        assert_eq!(group_thousands(123_456), "123,456");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
    }

    #[test]
    fn terminal_output() {
        let frame = Frame::from_progress(&sample(), 343.23);
        let mut sink = TerminalSink::new(Vec::new(), false);
        sink.render(&frame).unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();

        assert!(text.contains("Age           34y 2m 3d"));
        assert!(text.contains("Target date   June 15, 2070"));
        assert!(text.contains("Countdown     46y 01m 09d 00:05:07"));
        assert!(text.contains("1,453,593,600"));
        assert!(text.contains("Ring offset   343.230"));
        assert!(!text.contains('\x1b'));
    }

    #[test]
    fn configuration_prompt() {
        let mut sink = TerminalSink::new(Vec::new(), true);
        sink.request_configuration().unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert!(text.starts_with("No birth date configured"));
    }
}
