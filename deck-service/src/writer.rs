//! Line-oriented deck buffer shared by every dialect

use std::fmt::Write as _;

/// Width of the banner divider lines
pub const DIVIDER_WIDTH: usize = 78;

/// Identifiers per line in set listings
pub const IDS_PER_LINE: usize = 16;

/// Buffers a deck in memory; nothing touches the filesystem until the
/// whole deck has rendered.
pub struct Writer {
    buf: String,
    comment: &'static str,
    separator: &'static str,
    offset: usize,
}

impl Writer {
    pub fn new(comment: &'static str, separator: &'static str, offset: usize) -> Self {
        Self {
            buf: String::with_capacity(64 * 1024),
            comment,
            separator,
            offset,
        }
    }

    pub fn comment(&self) -> &'static str {
        self.comment
    }

    pub fn separator(&self) -> &'static str {
        self.separator
    }

    /// Deck identifier of an internal key
    pub fn id(&self, key: usize) -> usize {
        key + self.offset
    }

    pub fn write_line(&mut self, line: impl AsRef<str>) {
        self.buf.push_str(line.as_ref());
        self.buf.push('\n');
    }

    /// Fields joined by the dialect separator
    pub fn write_fields<I, S>(&mut self, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut first = true;
        for field in fields {
            if !first {
                self.buf.push_str(self.separator);
            }
            self.buf.push_str(field.as_ref());
            first = false;
        }
        self.buf.push('\n');
    }

    pub fn write_comment(&mut self, text: impl AsRef<str>) {
        let _ = writeln!(self.buf, "{} {}", self.comment, text.as_ref());
    }

    /// An empty comment line
    pub fn blank_line(&mut self) {
        self.buf.push_str(self.comment);
        self.buf.push('\n');
    }

    pub fn divider_line(&mut self) {
        self.buf.push_str(self.comment);
        let width = DIVIDER_WIDTH.saturating_sub(self.comment.len());
        self.buf.extend(std::iter::repeat('-').take(width));
        self.buf.push('\n');
    }

    pub fn write_section(&mut self, title: &str) {
        self.divider_line();
        let _ = writeln!(self.buf, "{} ----- {title}", self.comment);
        self.divider_line();
        self.blank_line();
    }

    pub fn write_subsection(&mut self, title: &str) {
        let _ = writeln!(self.buf, "{} {title}", self.comment);
        let _ = writeln!(self.buf, "{} {}", self.comment, "-".repeat(title.len()));
        self.blank_line();
    }

    /// Deck identifiers of `keys`, `per_line` to a line
    pub fn write_ids(&mut self, keys: &[usize], per_line: usize, trailing: &str) {
        for chunk in keys.chunks(per_line.max(1)) {
            let ids: Vec<String> = chunk.iter().map(|k| self.id(*k).to_string()).collect();
            self.buf.push_str(&ids.join(self.separator));
            self.buf.push_str(trailing);
            self.buf.push('\n');
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_string(self) -> String {
        self.buf
    }
}

/// Shortest decimal form that reads back to the same value
pub fn num(value: f64) -> String {
    if value == 0.0 {
        "0".to_string()
    } else {
        format!("{value}")
    }
}

/// Scientific form used where a solver reads fixed-width fields
pub fn sci(value: f64) -> String {
    format!("{value:.6e}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_banner() {
        let mut w = Writer::new("**", ", ", 1);
        w.write_section("Nodes");
        let text = w.into_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0].len(), DIVIDER_WIDTH);
        assert_eq!(lines[1], "** ----- Nodes");
        assert_eq!(lines[2], lines[0]);
        assert_eq!(lines[3], "**");
    }

    #[test]
    fn test_ids_are_offset_and_wrapped() {
        let mut w = Writer::new("**", ", ", 1);
        let keys: Vec<usize> = (0..20).collect();
        w.write_ids(&keys, IDS_PER_LINE, ",");
        let text = w.into_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("1, 2, 3"));
        assert!(lines[0].ends_with("16,"));
        assert_eq!(lines[1], "17, 18, 19, 20,");
    }

    #[test]
    fn test_num_is_shortest_round_trip() {
        assert_eq!(num(200e9), "200000000000");
        assert_eq!(num(1e-4), "0.0001");
        assert_eq!(num(-100000.0), "-100000");
        assert_eq!(num(-0.0), "0");
        assert_eq!(num(0.1 + 0.2).parse::<f64>().unwrap(), 0.1 + 0.2);
    }

    #[test]
    fn test_fields_use_separator() {
        let mut w = Writer::new("!", " ", 1);
        w.write_fields(["N", "1", "0", "0", "0"]);
        assert_eq!(w.into_string(), "N 1 0 0 0\n");
    }
}
