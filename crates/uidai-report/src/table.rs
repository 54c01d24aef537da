//! Plain-text table layout.
//!
//! Column widths are measured in terminal cells so state names with
//! non-ASCII characters still line up.

use unicode_width::UnicodeWidthStr;

/// Horizontal alignment of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// A bordered text table with a header row.
#[derive(Debug, Clone)]
pub struct TextTable {
    headers: Vec<String>,
    aligns: Vec<Align>,
    rows: Vec<Vec<String>>,
}

impl TextTable {
    /// `columns` pairs each header with its alignment.
    pub fn new(columns: &[(&str, Align)]) -> Self {
        Self {
            headers: columns.iter().map(|(h, _)| h.to_string()).collect(),
            aligns: columns.iter().map(|(_, a)| *a).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row; missing cells render empty, extra cells are dropped.
    pub fn push_row(&mut self, cells: Vec<String>) {
        let mut cells = cells;
        cells.resize(self.headers.len(), String::new());
        self.rows.push(cells);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn widths(&self) -> Vec<usize> {
        self.headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                self.rows
                    .iter()
                    .map(|r| r[i].width())
                    .chain(std::iter::once(h.width()))
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }

    pub fn render(&self) -> String {
        let widths = self.widths();
        let rule: String = {
            let parts: Vec<String> = widths.iter().map(|w| "-".repeat(w + 2)).collect();
            format!("+{}+", parts.join("+"))
        };

        let mut out = String::new();
        out.push_str(&rule);
        out.push('\n');
        out.push_str(&self.render_line(&self.headers, &widths, true));
        out.push_str(&rule);
        out.push('\n');
        for row in &self.rows {
            out.push_str(&self.render_line(row, &widths, false));
        }
        out.push_str(&rule);
        out.push('\n');
        out
    }

    fn render_line(&self, cells: &[String], widths: &[usize], header: bool) -> String {
        let mut line = String::from("|");
        for (i, cell) in cells.iter().enumerate() {
            let pad = widths[i].saturating_sub(cell.width());
            let align = if header { Align::Left } else { self.aligns[i] };
            match align {
                Align::Left => line.push_str(&format!(" {}{} |", cell, " ".repeat(pad))),
                Align::Right => line.push_str(&format!(" {}{} |", " ".repeat(pad), cell)),
            }
        }
        line.push('\n');
        line
    }
}
