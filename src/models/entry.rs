//! Represents a single blog post loaded from the flat-file corpus.

use chrono::NaiveDate;
use serde::Serialize;

/// One blog post.
///
/// Built once at load time from a file named `MM-DD-YY<delim>slug.html`.
/// The first line of the file is the title and the rest is the body, which
/// is treated as already-sanitized markup.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    /// Base name of the source file up to its first `.`; unique in a corpus.
    pub id: String,

    /// Publication date parsed from the filename prefix.
    pub date: NaiveDate,

    /// First line of the source file.
    pub title: String,

    /// Remaining lines, joined with their original `\n` breaks.
    pub body: String,
}

impl Entry {
    /// Short `MM/DD/YY` form used in listings.
    pub fn display_date(&self) -> String {
        self.date.format("%m/%d/%y").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_date_uses_two_digit_year() {
        let entry = Entry {
            id: "01-15-24-hello".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            title: "Hello".into(),
            body: "World body".into(),
        };
        assert_eq!(entry.display_date(), "01/15/24");
    }
}
