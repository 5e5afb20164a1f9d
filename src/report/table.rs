use std::fmt;

/// A plain-text table with a header row.
///
/// The first column is left-aligned (row labels), the rest are
/// right-aligned (numbers).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextTable {
    title: Option<String>,
    header: Vec<String>,
    rows: Vec<Vec<String>>,
    label_columns: usize,
}

impl TextTable {
    /// Empty table with these column headers.
    pub fn new<I, S>(header: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            title: None,
            header: header.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
            label_columns: 1,
        }
    }

    /// Line printed above the header.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Left-align the first `n` columns instead of just the first.
    pub fn with_label_columns(mut self, n: usize) -> Self {
        self.label_columns = n;
        self
    }

    /// Append a row; short rows are padded with empty cells.
    pub fn push_row<I, S>(&mut self, row: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut row: Vec<String> = row.into_iter().map(Into::into).collect();
        if row.len() < self.header.len() {
            row.resize(self.header.len(), String::new());
        }
        self.rows.push(row);
    }

    /// Column headers.
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Rows in insertion order, padded to the header width.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of body rows.
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    fn widths(&self) -> Vec<usize> {
        let n_cols = self
            .rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.header.len()))
            .max()
            .unwrap_or(0);
        (0..n_cols)
            .map(|c| {
                std::iter::once(&self.header)
                    .chain(&self.rows)
                    .filter_map(|r| r.get(c))
                    .map(|s| s.chars().count())
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }

    fn write_row(&self, f: &mut fmt::Formatter<'_>, row: &[String], widths: &[usize]) -> fmt::Result {
        let mut line = String::new();
        for (c, width) in widths.iter().enumerate() {
            let cell = row.get(c).map(String::as_str).unwrap_or("");
            if c > 0 {
                line.push_str("  ");
            }
            if c < self.label_columns {
                line.push_str(&format!("{cell:<width$}"));
            } else {
                line.push_str(&format!("{cell:>width$}"));
            }
        }
        writeln!(f, "{}", line.trim_end())
    }
}

impl fmt::Display for TextTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(title) = &self.title {
            writeln!(f, "{title}")?;
        }
        let widths = self.widths();
        self.write_row(f, &self.header, &widths)?;
        let total = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
        writeln!(f, "{}", "-".repeat(total))?;
        for row in &self.rows {
            self.write_row(f, row, &widths)?;
        }
        Ok(())
    }
}

/// Fixed-precision number; integers print without decimals, NaN as `NaN`.
pub fn fmt_num(value: f64, precision: usize) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value:.precision$}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alignment() {
        let mut t = TextTable::new(["name", "count"]);
        t.push_row(["a", "1"]);
        t.push_row(["longer", "100"]);

        let rendered = t.to_string();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "name    count");
        assert_eq!(lines[1], "-------------");
        assert_eq!(lines[2], "a           1");
        assert_eq!(lines[3], "longer    100");
    }

    #[test]
    fn test_title_and_padding() {
        let mut t = TextTable::new(["k", "v", "w"]).with_title("Sizes");
        t.push_row(["x"]);
        assert_eq!(t.rows()[0].len(), 3);
        assert!(t.to_string().starts_with("Sizes\n"));
    }

    #[test]
    fn test_label_columns() {
        let mut t = TextTable::new(["a", "b", "n"]).with_label_columns(2);
        t.push_row(["x", "y", "1"]);
        t.push_row(["xx", "yy", "10"]);
        let rendered = t.to_string();
        assert_eq!(rendered.lines().nth(2), Some("x   y    1"));
    }

    #[test]
    fn test_fmt_num() {
        assert_eq!(fmt_num(3.0, 4), "3");
        assert_eq!(fmt_num(0.123456, 4), "0.1235");
        assert_eq!(fmt_num(f64::NAN, 4), "NaN");
        assert_eq!(fmt_num(-2.5, 2), "-2.50");
    }
}
