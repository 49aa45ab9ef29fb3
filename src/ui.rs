//! Terminal UI utilities.
//!
//! A two-or-more column table drawn with box characters, sized to the
//! terminal. Cells may contain ANSI colors; widths are measured without them.

use colored::*;
use console::{measure_text_width, truncate_str};

pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Rows with the wrong number of cells are ignored.
    pub fn add_row(&mut self, row: Vec<String>) {
        if row.len() == self.headers.len() {
            self.rows.push(row);
        }
    }

    pub fn print(&self) {
        let (_, term_width) = console::Term::stdout().size();
        print!("{}", self.render(term_width as usize));
    }

    /// Render to a string no wider than `max_width` where possible.
    pub fn render(&self, max_width: usize) -> String {
        if self.headers.is_empty() {
            return String::new();
        }

        let mut widths: Vec<usize> = self.headers.iter().map(|h| measure_text_width(h)).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(measure_text_width(&flatten(cell)));
            }
        }

        // Shrink the widest column first, but never below 8.
        let overhead = 3 + 3 * widths.len();
        let budget = max_width.saturating_sub(overhead);
        while widths.iter().sum::<usize>() > budget {
            let Some((idx, &widest)) = widths.iter().enumerate().max_by_key(|(_, w)| **w) else {
                break;
            };
            if widest <= 8 {
                break;
            }
            widths[idx] -= 1;
        }

        let border = |left: &str, mid: &str, right: &str| -> String {
            let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
            format!("  {}{}{}\n", left, segments.join(mid), right)
        };

        let line = |cells: &[String], bold: bool| -> String {
            let mut out = String::from("  │");
            for (cell, &width) in cells.iter().zip(&widths) {
                let text = truncate_str(&flatten(cell), width, "...").to_string();
                let padding = width.saturating_sub(measure_text_width(&text));
                let text = if bold { text.bold().to_string() } else { text };
                out.push_str(&format!(" {}{} │", text, " ".repeat(padding)));
            }
            out.push('\n');
            out
        };

        let mut out = border("┌", "┬", "┐");
        out.push_str(&line(&self.headers, true));
        out.push_str(&border("├", "┼", "┤"));
        for row in &self.rows {
            out.push_str(&line(row, false));
        }
        out.push_str(&border("└", "┴", "┘"));
        out
    }
}

fn flatten(s: &str) -> String {
    s.replace(['\n', '\r', '\t'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_shape() {
        colored::control::set_override(false);
        let mut table = Table::new(&["Key", "Value"]);
        table.add_row(vec!["name".into(), "acme".into()]);
        table.add_row(vec!["ignored".into()]);

        let out = table.render(80);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "  ┌──────┬───────┐");
        assert_eq!(lines[1], "  │ Key  │ Value │");
        assert_eq!(lines[3], "  │ name │ acme  │");
    }

    #[test]
    fn test_render_truncates_to_width() {
        colored::control::set_override(false);
        let mut table = Table::new(&["Key", "Value"]);
        table.add_row(vec!["url".into(), "x".repeat(100)]);

        let out = table.render(40);
        for line in out.lines() {
            assert!(measure_text_width(line) <= 40, "too wide: {}", line);
        }
        assert!(out.contains("..."));
    }
}
