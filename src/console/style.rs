//! Colors and tabular layout for console output.

use crossterm::style::{StyledContent, Stylize};

use crate::client::Stats;
use crate::session::TubeSummary;

/// Applies ANSI styling, or passes text through when color is off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    color: bool,
}

impl Palette {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    pub fn plain() -> Self {
        Self::new(false)
    }

    pub fn is_color(&self) -> bool {
        self.color
    }

    fn paint(&self, text: &str, style: fn(&str) -> StyledContent<&str>) -> String {
        if self.color {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    pub fn info(&self, text: &str) -> String {
        self.paint(text, |t| t.cyan().bold())
    }

    pub fn error(&self, text: &str) -> String {
        self.paint(text, |t| t.red().bold())
    }

    pub fn heading(&self, text: &str) -> String {
        self.paint(text, |t| t.bold().underlined())
    }

    pub fn bracket(&self, text: &str) -> String {
        self.paint(text, |t| t.yellow())
    }

    pub fn tube(&self, text: &str) -> String {
        self.paint(text, |t| t.magenta().bold())
    }

    pub fn disconnected(&self, text: &str) -> String {
        self.paint(text, |t| t.red().bold())
    }

    pub fn key(&self, text: &str) -> String {
        self.paint(text, |t| t.green())
    }

    pub fn ready(&self, text: &str) -> String {
        self.paint(text, |t| t.green())
    }

    pub fn delayed(&self, text: &str) -> String {
        self.paint(text, |t| t.yellow())
    }

    pub fn buried(&self, text: &str) -> String {
        self.paint(text, |t| t.red())
    }
}

/// `key: value` lines in key order.
pub fn listing(palette: &Palette, stats: &Stats) -> String {
    stats
        .iter()
        .map(|(key, value)| format!("{}: {}\n", palette.key(key), value))
        .collect()
}

/// Left-align `text` in `width` columns, measuring the unstyled text so
/// escape codes don't skew the layout.
fn pad(styled: String, text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.chars().count());
    format!("{}{}", styled, " ".repeat(fill))
}

/// One row per tube with its ready/delayed/buried counts.
pub fn tube_table(palette: &Palette, tubes: &[TubeSummary]) -> String {
    const HEADERS: [&str; 4] = ["Tube", "Ready", "Delayed", "Buried"];

    let mut widths = HEADERS.map(str::len);
    for tube in tubes {
        let cells = [&tube.name, &tube.ready, &tube.delayed, &tube.buried];
        for (width, cell) in widths.iter_mut().zip(cells) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let header: Vec<String> = HEADERS
        .iter()
        .zip(widths)
        .map(|(h, w)| pad(palette.heading(h), h, w))
        .collect();
    out.push_str(header.join("  ").trim_end());
    out.push('\n');

    for tube in tubes {
        let row = [
            pad(palette.tube(&tube.name), &tube.name, widths[0]),
            pad(palette.ready(&tube.ready), &tube.ready, widths[1]),
            pad(palette.delayed(&tube.delayed), &tube.delayed, widths[2]),
            pad(palette.buried(&tube.buried), &tube.buried, widths[3]),
        ];
        out.push_str(row.join("  ").trim_end());
        out.push('\n');
    }
    out
}
