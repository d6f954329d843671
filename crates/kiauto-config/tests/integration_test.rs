//! Integration tests for kiauto-config
//!
//! These tests load print options and tables from real files.

use std::os::unix::ffi::OsStrExt;

use kiauto_config::{ConfigError, InterposerTables, PrintOptions};
use tempfile::tempdir;

/// Print options written by the host tool are read back verbatim
#[test]
fn test_load_print_options_file() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("print.cfg");
    std::fs::write(&path, "/tmp/kiauto_out\nschematic\nsvg\n").unwrap();

    let options = PrintOptions::load(&path).unwrap();
    assert_eq!(options.dir, "/tmp/kiauto_out");
    assert_eq!(options.basename, "schematic");
    assert_eq!(options.format, "svg");
    assert_eq!(options.output_path(), "/tmp/kiauto_out/schematic.svg");
}

#[test]
fn test_missing_print_options_file_is_error() {
    let temp = tempdir().unwrap();
    let err = PrintOptions::load(&temp.path().join("absent")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

/// Written files parse back to the same options
#[test]
fn test_print_options_file_written_by_hand() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("print.cfg");
    let options = PrintOptions {
        dir: "/work/out dir".into(),
        basename: "board-F_Cu".into(),
        format: "ps".into(),
    };
    std::fs::write(&path, options.to_file_contents()).unwrap();

    assert_eq!(PrintOptions::load(&path).unwrap(), options);
}

/// A Latin-1 directory name reaches the caller byte for byte
#[test]
fn test_load_print_options_non_utf8_dir() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("print.cfg");
    std::fs::write(&path, b"/home/jos\xe9/out\nboard\nsvg\n").unwrap();

    let options = PrintOptions::load(&path).unwrap();
    assert_eq!(options.dir.as_bytes(), b"/home/jos\xe9/out");
    assert_eq!(options.basename, "board");
    assert_eq!(options.format, "svg");
}

/// A tables file replaces only the sections it names
#[test]
fn test_load_tables_file() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("tables.toml");
    let contents = r#"
[pango]
ignored = ["M", "W"]

[[rewrite.label_set_text]]
pattern = "Refill zones"
replacement = "Refill _zones"
"#;
    std::fs::write(&path, contents).unwrap();

    let tables = InterposerTables::load(&path).unwrap();
    assert!(tables.pango.is_ignored(b"M"));
    assert!(!tables.pango.is_ignored(b"g"));
    assert_eq!(tables.rewrite.label_set_text.len(), 1);
    assert_eq!(
        tables
            .rewrite
            .label_set_text
            .lookup(b"Refill zones")
            .unwrap()
            .replacement,
        "Refill _zones"
    );
    // Untouched site keeps the built-in table
    assert!(tables.rewrite.button_set_label.lookup(b"Run DRC").is_some());
}

#[test]
fn test_malformed_tables_file() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("tables.toml");
    std::fs::write(&path, "[[rewrite.label_set_text]]\npattern = 3\n").unwrap();

    let err = InterposerTables::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)));
}

/// Bad entries are reported with their site
#[test]
fn test_tables_problems_name_the_site() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("tables.toml");
    let contents = r#"
[[rewrite.check_button_new_with_label]]
pattern = "Mirror"
replacement = "_Mirr_or"
"#;
    std::fs::write(&path, contents).unwrap();

    let tables = InterposerTables::load(&path).unwrap();
    let problems = tables.problems();
    assert_eq!(problems.len(), 1);
    match &problems[0] {
        ConfigError::InvalidSubstitution { site, pattern, .. } => {
            assert_eq!(*site, "check_button_new_with_label");
            assert_eq!(pattern, "Mirror");
        }
        other => panic!("unexpected error: {other}"),
    }
}

/// The generated default file is a valid tables file
#[test]
fn test_default_toml_loads_back() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("tables.toml");
    std::fs::write(&path, InterposerTables::default_toml().unwrap()).unwrap();

    let tables = InterposerTables::load(&path).unwrap();
    assert_eq!(tables, InterposerTables::default());
    assert!(tables.problems().is_empty());
}
