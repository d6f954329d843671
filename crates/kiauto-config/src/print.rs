//! Print dialog options.
//!
//! The host tool writes a three line file (output directory, output base
//! name, output format) and exports its path in `KIAUTO_INTERPOSER_PRINT`.
//! Lines are taken verbatim minus their terminator, as raw bytes: a
//! directory name doesn't have to be UTF-8. Missing lines keep the default
//! for that slot.

use std::ffi::OsString;
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::path::Path;

use tracing::debug;

use crate::{ConfigError, ENV_PRINT};

pub const DEFAULT_DIR: &str = "/tmp";
pub const DEFAULT_BASENAME: &str = "pp";
pub const DEFAULT_FORMAT: &str = "pdf";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintOptions {
    /// Directory the print-to-file backend writes into
    pub dir: OsString,
    /// Output file name without extension
    pub basename: OsString,
    /// Output format (`pdf`, `ps`, `svg`)
    pub format: OsString,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            dir: DEFAULT_DIR.into(),
            basename: DEFAULT_BASENAME.into(),
            format: DEFAULT_FORMAT.into(),
        }
    }
}

/// Lines of `contents`, each without its `\n` or `\r\n`. A final
/// terminator doesn't start another line.
fn lines(contents: &[u8]) -> impl Iterator<Item = &[u8]> {
    let body = contents.strip_suffix(b"\n").unwrap_or(contents);
    (!contents.is_empty())
        .then(|| body.split(|&b| b == b'\n'))
        .into_iter()
        .flatten()
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
}

impl PrintOptions {
    /// Parse the file contents. Never fails.
    pub fn parse(contents: &[u8]) -> Self {
        let mut options = Self::default();
        let mut lines = lines(contents).map(|line| OsString::from_vec(line.to_vec()));
        if let Some(dir) = lines.next() {
            options.dir = dir;
        }
        if let Some(basename) = lines.next() {
            options.basename = basename;
        }
        if let Some(format) = lines.next() {
            options.format = format;
        }
        options
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read(path)?;
        Ok(Self::parse(&contents))
    }

    /// The file named by `KIAUTO_INTERPOSER_PRINT`, or the defaults when the
    /// variable is unset. An unreadable file is an error.
    pub fn try_from_env() -> Result<Self, ConfigError> {
        let Some(path) = std::env::var_os(ENV_PRINT) else {
            debug!("{} not set, using default print options", ENV_PRINT);
            return Ok(Self::default());
        };
        let options = Self::load(Path::new(&path))?;
        debug!(path = ?path, ?options, "Loaded print options");
        Ok(options)
    }

    /// Render in the on-disk format
    pub fn to_file_contents(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for field in [&self.dir, &self.basename, &self.format] {
            out.extend_from_slice(field.as_bytes());
            out.push(b'\n');
        }
        out
    }

    /// Where the print-to-file backend will put the document:
    /// `<dir>/<basename>.<format>`
    pub fn output_path(&self) -> OsString {
        let mut path = self.dir.clone();
        path.push("/");
        path.push(&self.basename);
        path.push(".");
        path.push(&self.format);
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = PrintOptions::default();
        assert_eq!(options.dir, "/tmp");
        assert_eq!(options.basename, "pp");
        assert_eq!(options.format, "pdf");
        assert_eq!(options.output_path(), "/tmp/pp.pdf");
    }

    #[test]
    fn test_parse_three_lines() {
        let options = PrintOptions::parse(b"/home/user/out\nboard\nsvg\n");
        assert_eq!(options.dir, "/home/user/out");
        assert_eq!(options.basename, "board");
        assert_eq!(options.format, "svg");
    }

    #[test]
    fn test_missing_lines_keep_defaults() {
        let options = PrintOptions::parse(b"/srv/print\n");
        assert_eq!(options.dir, "/srv/print");
        assert_eq!(options.basename, DEFAULT_BASENAME);
        assert_eq!(options.format, DEFAULT_FORMAT);

        assert_eq!(PrintOptions::parse(b""), PrintOptions::default());
    }

    #[test]
    fn test_lines_are_verbatim() {
        // No trimming, no comments: only the terminator goes away
        let options = PrintOptions::parse(b" spaced dir \n# not a comment\r\nps");
        assert_eq!(options.dir, " spaced dir ");
        assert_eq!(options.basename, "# not a comment");
        assert_eq!(options.format, "ps");
    }

    #[test]
    fn test_non_utf8_bytes_kept() {
        let options = PrintOptions::parse(b"/home/jos\xe9/out\nboard\nsvg\n");
        assert_eq!(options.dir.as_bytes(), b"/home/jos\xe9/out");
        assert_eq!(options.basename, "board");
        assert_eq!(options.format, "svg");
        assert_eq!(
            options.output_path().as_bytes(),
            b"/home/jos\xe9/out/board.svg"
        );
    }

    #[test]
    fn test_blank_line_is_a_value() {
        let options = PrintOptions::parse(b"\nboard\n");
        assert_eq!(options.dir, "");
        assert_eq!(options.basename, "board");
        assert_eq!(options.format, DEFAULT_FORMAT);
    }

    #[test]
    fn test_extra_lines_ignored() {
        let options = PrintOptions::parse(b"a\nb\nc\nd\n");
        assert_eq!(options.format, "c");
    }

    #[test]
    fn test_file_contents_parse_back() {
        let options = PrintOptions {
            dir: "/x".into(),
            basename: "y".into(),
            format: "ps".into(),
        };
        assert_eq!(options.to_file_contents(), b"/x\ny\nps\n");
        assert_eq!(PrintOptions::parse(&options.to_file_contents()), options);
    }
}
