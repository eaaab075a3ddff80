use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};
use termion::style::{Underline, Reset};
use std::fmt;

/// Plain text table, printed with an underlined header and columns padded
/// to equal width.
pub struct Table<'h> {
    header: &'h [&'h str],
    rows: Vec<Vec<String>>,
}

impl<'h> Table<'h> {
    pub fn new(header: &'h [&'h str]) -> Table<'h> {
        Table { header, rows: Vec::new() }
    }

    /// Add a row. Missing cells are left blank, excess cells are ignored.
    pub fn row(&mut self, cells: Vec<String>) -> &mut Self {
        self.rows.push(cells);
        self
    }

    pub fn print(&self) {
        let (terminal_width, _) = termion::terminal_size().unwrap_or((80, 20));
        let widths = self.widths(usize::from(terminal_width));

        let header = self.header.iter()
            .zip(&widths)
            .map(|(name, &width)| format!("{}{}{}", Underline, Cell(name, width), Reset))
            .collect::<Vec<_>>();
        println!("{}", header.join(" "));

        for row in &self.rows {
            let line = widths.iter()
                .enumerate()
                .map(|(inx, &width)| {
                    let text = row.get(inx).map_or("", String::as_str);
                    Cell(text, width).to_string()
                })
                .collect::<Vec<_>>();
            println!("{}", line.join(" ").trim_end());
        }
    }

    /// Compute column widths fitting in `available` terminal columns.
    ///
    /// Only the last column is narrowed, and never below its header.
    fn widths(&self, available: usize) -> Vec<usize> {
        let mut widths = self.header.iter()
            .map(|name| name.width())
            .collect::<Vec<_>>();

        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.width());
            }
        }

        let used = widths.iter().sum::<usize>() + widths.len().saturating_sub(1);

        if used >= available {
            let floor = self.header.last().map_or(0, |name| name.width());

            if let Some(last) = widths.last_mut() {
                *last = last.saturating_sub(used - available + 1).max(floor);
            }
        }

        widths
    }
}

/// Text cut or padded to exactly the given display width.
struct Cell<'a>(&'a str, usize);

impl<'a> fmt::Display for Cell<'a> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let mut used = 0;

        for chr in self.0.chars() {
            let width = chr.width().unwrap_or(0);
            if used + width > self.1 {
                break;
            }
            used += width;
            fmt::Write::write_char(fmt, chr)?;
        }

        write!(fmt, "{:1$}", "", self.1 - used)
    }
}
