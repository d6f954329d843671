//! The stdout trace.
//!
//! One line per event, `<TAG>:<description>`, flushed as soon as it is
//! written so the host sees it even if KiCad hangs right after. Banner lines
//! start with `* `, resolution failures with `** `.
//!
//! Lines are written to descriptor 1 through Rust's `stdout`, not through the
//! host's C `stdout` stream. Whatever the host has buffered in the C stream
//! is flushed first, so its earlier output stays ahead of the trace line.

use std::ffi::CStr;
use std::fmt;
use std::io::{self, Write};

use libc::{c_char, FILE};

use crate::error::InterposerError;
use crate::reals::RealSymbol;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Gtk,
    Glx,
    Pango,
    Io,
}

impl Category {
    pub fn tag(self) -> &'static str {
        match self {
            Category::Gtk => "GTK",
            Category::Glx => "GLX",
            Category::Pango => "PANGO",
            Category::Io => "IO",
        }
    }
}

pub fn write_event<W: Write>(
    out: &mut W,
    category: Category,
    args: fmt::Arguments<'_>,
) -> io::Result<()> {
    write!(out, "{}:", category.tag())?;
    out.write_fmt(args)?;
    out.write_all(b"\n")?;
    out.flush()
}

pub fn write_banner<W: Write>(out: &mut W, what: &str) -> io::Result<()> {
    writeln!(out, "* wrapping {}", what)?;
    out.flush()
}

pub fn write_failure<W: Write>(out: &mut W, err: &InterposerError) -> io::Result<()> {
    writeln!(out, "** {}", err)?;
    out.flush()
}

/// The C library's `stdout` variable
static HOST_STDOUT: RealSymbol = RealSymbol::global(c"stdout");

fn flush_host_stdout() {
    let Ok(var) = HOST_STDOUT.resolve() else {
        return;
    };
    unsafe {
        let stream = *var.as_ptr().cast::<*mut FILE>();
        if !stream.is_null() {
            libc::fflush(stream);
        }
    }
}

/// A write error on stdout has nowhere to be reported; it is dropped.
pub fn event(category: Category, args: fmt::Arguments<'_>) {
    flush_host_stdout();
    let _ = write_event(&mut io::stdout().lock(), category, args);
}

pub fn banner(what: &str) {
    flush_host_stdout();
    let _ = write_banner(&mut io::stdout().lock(), what);
}

pub fn failure(err: &InterposerError) {
    flush_host_stdout();
    let _ = write_failure(&mut io::stdout().lock(), err);
}

/// C string argument shown in a trace line. Null prints as empty.
#[derive(Clone, Copy)]
pub struct CText<'a>(&'a [u8]);

impl<'a> CText<'a> {
    /// # Safety
    /// `ptr` must be null or a NUL-terminated string valid for `'a`.
    pub unsafe fn from_ptr(ptr: *const c_char) -> Self {
        if ptr.is_null() {
            Self(&[])
        } else {
            Self(CStr::from_ptr(ptr).to_bytes())
        }
    }

    pub fn from_bytes(bytes: &'a [u8]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(self.0) {
            Ok(s) => f.write_str(s),
            Err(_) => f.write_str(&String::from_utf8_lossy(self.0)),
        }
    }
}

impl fmt::Debug for CText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(self.0))
    }
}
