//! Terminal output: status lines and the word table.
//!
//! Table cells are measured in terminal columns, so full-width text such as
//! Chinese remarks keeps the borders aligned.

use crossterm::style::{Color, Stylize};
use std::io::{self, IsTerminal, Stderr, Stdout, Write};
use unicode_width::UnicodeWidthStr;
use wordbook_core::WordRecord;

/// Line-oriented writer with green/red/blue status tones.
///
/// Tones are only emitted as ANSI colors when the sink is a terminal.
pub struct Printer<W> {
    out: W,
    styled: bool,
}

impl Printer<Stdout> {
    pub fn stdout() -> Self {
        let out = io::stdout();
        let styled = out.is_terminal();
        Self { out, styled }
    }
}

impl Printer<Stderr> {
    pub fn stderr() -> Self {
        let out = io::stderr();
        let styled = out.is_terminal();
        Self { out, styled }
    }
}

impl<W: Write> Printer<W> {
    pub fn new(out: W, styled: bool) -> Self {
        Self { out, styled }
    }

    pub fn success(&mut self, message: &str) -> io::Result<()> {
        self.line(message, Color::Green)
    }

    pub fn failure(&mut self, message: &str) -> io::Result<()> {
        self.line(message, Color::Red)
    }

    pub fn info(&mut self, message: &str) -> io::Result<()> {
        self.line(message, Color::Blue)
    }

    /// Writes pre-rendered text such as a table, without a tone.
    pub fn raw(&mut self, text: &str) -> io::Result<()> {
        self.out.write_all(text.as_bytes())?;
        self.out.flush()
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, message: &str, color: Color) -> io::Result<()> {
        if self.styled {
            writeln!(self.out, "{}", message.with(color))?;
        } else {
            writeln!(self.out, "{message}")?;
        }
        self.out.flush()
    }
}

const HEADERS: [&str; 4] = ["Word", "Sentence", "Remark", "Reviews"];

pub fn render_records(records: &[WordRecord]) -> String {
    let mut groups: Vec<Vec<[String; 4]>> = Vec::with_capacity(records.len());
    for record in records {
        let rows = record
            .examples
            .iter()
            .enumerate()
            .map(|(index, example)| {
                // Word and count only on the first row of each record.
                let (word, count) = if index == 0 {
                    (record.word.clone(), record.review_count.to_string())
                } else {
                    (String::new(), String::new())
                };
                [word, example.sentence.clone(), example.remark.clone(), count]
            })
            .collect();
        groups.push(rows);
    }

    let mut widths = HEADERS.map(|header| header.width());
    for row in groups.iter().flatten() {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.width());
        }
    }

    let separator = separator_line(&widths);
    let mut out = String::new();
    out.push_str(&separator);
    out.push_str(&row_line(&HEADERS.map(String::from), &widths));
    out.push_str(&separator);
    for rows in &groups {
        for row in rows {
            out.push_str(&row_line(row, &widths));
        }
        out.push_str(&separator);
    }
    out
}

fn separator_line(widths: &[usize; 4]) -> String {
    let mut line = String::from("+");
    for width in widths {
        line.push_str(&"-".repeat(width + 2));
        line.push('+');
    }
    line.push('\n');
    line
}

fn row_line(cells: &[String; 4], widths: &[usize; 4]) -> String {
    let mut line = String::from("|");
    for (cell, width) in cells.iter().zip(widths) {
        let padding = width - cell.width();
        line.push(' ');
        line.push_str(cell);
        line.push_str(&" ".repeat(padding + 1));
        line.push('|');
    }
    line.push('\n');
    line
}
