use kiauto_config::PangoTable;

use crate::state::FixedString;

pub const LAST_TEXT_CAPACITY: usize = 1024;

/// Drops the layout calls that carry no information.
///
/// Pango lays the same string out several times in a row and measures fonts
/// with a few fixed strings. Only the first of a run of identical texts
/// gets through; A, B, A still gives three lines.
#[derive(Debug, Default)]
pub struct LayoutTextFilter {
    last: FixedString<LAST_TEXT_CAPACITY>,
}

impl LayoutTextFilter {
    pub const fn new() -> Self {
        Self {
            last: FixedString::new(),
        }
    }

    /// Whether `text` should be traced. Comparison covers the first
    /// [`LAST_TEXT_CAPACITY`] bytes only.
    pub fn admit(&mut self, text: &[u8], ignored: &PangoTable) -> bool {
        if text.is_empty() || ignored.is_ignored(text) {
            return false;
        }
        let seen = &text[..text.len().min(LAST_TEXT_CAPACITY)];
        if self.last.as_bytes() == seen {
            return false;
        }
        self.last.set(seen);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(texts: &[&str]) -> usize {
        let ignored = PangoTable::default();
        let mut filter = LayoutTextFilter::new();
        texts
            .iter()
            .filter(|t| filter.admit(t.as_bytes(), &ignored))
            .count()
    }

    #[test]
    fn test_repeats_collapse() {
        assert_eq!(run(&["X", "X"]), 1);
        assert_eq!(run(&["X", "X", "X", "Y"]), 2);
    }

    #[test]
    fn test_only_immediate_repeats() {
        assert_eq!(run(&["X", "Y", "X"]), 3);
    }

    #[test]
    fn test_empty_and_measurement_strings_dropped() {
        assert_eq!(run(&["", "g", "...", "ABCDEFHXfgkj"]), 0);
        assert_eq!(run(&["\u{2022}", "\u{25CF}"]), 0);
    }

    #[test]
    fn test_measurement_string_does_not_reset_last() {
        // X, "g", X: the second X still repeats the last traced text
        assert_eq!(run(&["X", "g", "X"]), 1);
    }

    #[test]
    fn test_long_texts_compare_on_capacity() {
        let a = "a".repeat(LAST_TEXT_CAPACITY + 10);
        assert_eq!(run(&[a.as_str(), a.as_str()]), 1);
        // Differences past the capacity are invisible
        let longer = format!("{}z", a);
        assert_eq!(run(&[a.as_str(), longer.as_str()]), 1);
        let early = format!("c{}", &a[1..]);
        assert_eq!(run(&[a.as_str(), early.as_str()]), 2);
    }
}
