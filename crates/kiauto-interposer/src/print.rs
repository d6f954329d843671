//! Print dialog forcing.
//!
//! Every print operation is pointed at GTK's print-to-file backend with the
//! directory, base name and format from the print options file, so the
//! dialog produces a known file without user input.

use std::ffi::{CStr, CString};
use std::os::unix::ffi::{OsStrExt, OsStringExt};

use kiauto_config::{log_interposer_warn, PrintOptions};
use once_cell::sync::Lazy;

use crate::error::InterposerError;

pub const OUTPUT_BASENAME: &CStr = c"output-basename";
pub const OUTPUT_DIR: &CStr = c"output-dir";
pub const OUTPUT_FILE_FORMAT: &CStr = c"output-file-format";
pub const PRINT_TO_FILE: &CStr = c"Print to File";
pub const FILE_BACKEND: &CStr = c"file";

/// Something print settings can be pushed into
pub trait PrintSettingsTarget {
    fn set(&mut self, key: &CStr, value: &CStr) -> Result<(), InterposerError>;
    fn set_printer(&mut self, printer: &CStr) -> Result<(), InterposerError>;
    fn restrict_backends(&mut self, backends: &CStr) -> Result<(), InterposerError>;
}

/// Print options as the C strings handed to GTK
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForcedOutput {
    dir: CString,
    basename: CString,
    format: CString,
    path: Vec<u8>,
}

impl ForcedOutput {
    pub fn new(options: &PrintOptions) -> Self {
        Self {
            dir: c_string(options.dir.as_bytes()),
            basename: c_string(options.basename.as_bytes()),
            format: c_string(options.format.as_bytes()),
            path: options.output_path().into_vec(),
        }
    }

    pub fn apply(&self, target: &mut impl PrintSettingsTarget) -> Result<(), InterposerError> {
        target.set(OUTPUT_BASENAME, &self.basename)?;
        target.set(OUTPUT_DIR, &self.dir)?;
        target.set(OUTPUT_FILE_FORMAT, &self.format)?;
        target.set_printer(PRINT_TO_FILE)?;
        target.restrict_backends(FILE_BACKEND)
    }

    /// `<dir>/<basename>.<format>`
    pub fn output_path(&self) -> &[u8] {
        &self.path
    }
}

/// C strings end at the first NUL
fn c_string(bytes: &[u8]) -> CString {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    CString::new(&bytes[..end]).unwrap_or_default()
}

fn load_options() -> Result<PrintOptions, InterposerError> {
    Ok(PrintOptions::try_from_env()?)
}

static FORCED: Lazy<ForcedOutput> = Lazy::new(|| {
    let options = load_options().unwrap_or_else(|e| {
        log_interposer_warn!(
            "Using default print options",
            error = tracing::field::display(&e)
        );
        PrintOptions::default()
    });
    ForcedOutput::new(&options)
});

/// Read on first use, never refreshed
pub fn forced() -> &'static ForcedOutput {
    &FORCED
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        ops: Vec<String>,
        fail_printer: bool,
    }

    impl PrintSettingsTarget for Recorder {
        fn set(&mut self, key: &CStr, value: &CStr) -> Result<(), InterposerError> {
            self.ops.push(format!(
                "set {}={}",
                key.to_string_lossy(),
                value.to_string_lossy()
            ));
            Ok(())
        }

        fn set_printer(&mut self, printer: &CStr) -> Result<(), InterposerError> {
            if self.fail_printer {
                return Err(InterposerError::Unresolved {
                    symbol: "gtk_print_settings_set_printer",
                    reason: "missing".to_string(),
                });
            }
            self.ops.push(format!("printer {}", printer.to_string_lossy()));
            Ok(())
        }

        fn restrict_backends(&mut self, backends: &CStr) -> Result<(), InterposerError> {
            self.ops.push(format!("backends {}", backends.to_string_lossy()));
            Ok(())
        }
    }

    #[test]
    fn test_defaults_applied() {
        let forced = ForcedOutput::new(&PrintOptions::default());
        let mut target = Recorder::default();
        forced.apply(&mut target).unwrap();
        assert_eq!(
            target.ops,
            [
                "set output-basename=pp",
                "set output-dir=/tmp",
                "set output-file-format=pdf",
                "printer Print to File",
                "backends file",
            ]
        );
        assert_eq!(forced.output_path(), b"/tmp/pp.pdf");
    }

    #[test]
    fn test_file_values_verbatim() {
        let options = PrintOptions::parse(b"/out/my dir\nsch-1\nps\n");
        let forced = ForcedOutput::new(&options);
        let mut target = Recorder::default();
        forced.apply(&mut target).unwrap();
        assert_eq!(target.ops[0], "set output-basename=sch-1");
        assert_eq!(target.ops[1], "set output-dir=/out/my dir");
        assert_eq!(target.ops[2], "set output-file-format=ps");
        assert_eq!(forced.output_path(), b"/out/my dir/sch-1.ps");
    }

    #[test]
    fn test_non_utf8_dir_reaches_gtk_unchanged() {
        let options = PrintOptions::parse(b"/home/jos\xe9/out\nboard\nsvg\n");
        let forced = ForcedOutput::new(&options);
        assert_eq!(forced.dir.as_bytes(), b"/home/jos\xe9/out");
        assert_eq!(forced.output_path(), b"/home/jos\xe9/out/board.svg");
    }

    #[test]
    fn test_failure_stops_apply() {
        let forced = ForcedOutput::new(&PrintOptions::default());
        let mut target = Recorder {
            fail_printer: true,
            ..Default::default()
        };
        assert!(forced.apply(&mut target).is_err());
        assert_eq!(target.ops.len(), 3);
    }

    #[test]
    fn test_interior_nul_truncates() {
        assert_eq!(c_string(b"ab\0cd").as_bytes(), b"ab");
        assert_eq!(c_string(b"").as_bytes(), b"");
    }
}
