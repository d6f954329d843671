//! Dialog, print and file chooser flow, plus the main loop.

use std::ffi::CString;
use std::os::unix::ffi::OsStringExt;
use std::ptr;

use libc::{c_char, c_int};

use super::interposer_work;
use crate::gtk::{self, GBoolean, GError, GtkDialog, GtkFileChooser, GtkPrintOperation, GtkWindow};
use crate::print;
use crate::reals::RealSymbol;
use crate::trace::{self, CText};

type DialogRunFn = unsafe extern "C" fn(*mut GtkDialog) -> c_int;
type PrintRunFn =
    unsafe extern "C" fn(*mut GtkPrintOperation, c_int, *mut GtkWindow, *mut *mut GError) -> c_int;
type GetFilenameFn = unsafe extern "C" fn(*mut GtkFileChooser) -> *mut c_char;
type MainIterationFn = unsafe extern "C" fn() -> GBoolean;

static REAL_DIALOG_RUN: RealSymbol = RealSymbol::next(c"gtk_dialog_run", "dialog run");
static REAL_PRINT_RUN: RealSymbol = RealSymbol::next(c"gtk_print_operation_run", "print run");
static REAL_GET_FILENAME: RealSymbol =
    RealSymbol::next(c"gtk_file_chooser_get_filename", "file chooser");
static REAL_MAIN_ITERATION: RealSymbol =
    RealSymbol::next(c"gtk_main_iteration", "gtk_main_iteration");

/// `GTK_PRINT_OPERATION_RESULT_ERROR`
const PRINT_RESULT_ERROR: c_int = 0;

#[cfg_attr(not(test), no_mangle)]
pub unsafe extern "C" fn gtk_dialog_run(dialog: *mut GtkDialog) -> c_int {
    let real: DialogRunFn = get_real!(REAL_DIALOG_RUN, 0);
    let title = interposer_work(|| gtk::window_title_owned(dialog.cast()));
    let response = real(dialog);
    if let Some(title) = title {
        interposer_work(|| trace_line!(Gtk, "Dialog Run:{}", title));
    }
    response
}

/// Forces the print-to-file backend before GTK shows anything
#[cfg_attr(not(test), no_mangle)]
pub unsafe extern "C" fn gtk_print_operation_run(
    op: *mut GtkPrintOperation,
    action: c_int,
    parent: *mut GtkWindow,
    error: *mut *mut GError,
) -> c_int {
    let real: PrintRunFn = get_real!(REAL_PRINT_RUN, PRINT_RESULT_ERROR);
    let forced = interposer_work(|| {
        let forced = print::forced();
        let applied = gtk::OperationSettings::attach(op).and_then(|mut s| forced.apply(&mut s));
        if let Err(e) = applied {
            trace::failure(&e);
        }
        forced
    });
    let result = real(op, action, parent, error);
    if let Some(forced) = forced {
        interposer_work(|| {
            trace_line!(Gtk, "Print Run:{}", CText::from_bytes(forced.output_path()))
        });
    }
    result
}

#[cfg_attr(not(test), no_mangle)]
pub unsafe extern "C" fn gtk_file_chooser_get_filename(chooser: *mut GtkFileChooser) -> *mut c_char {
    let real: GetFilenameFn = get_real!(REAL_GET_FILENAME, ptr::null_mut());
    let name = real(chooser);
    interposer_work(|| chooser_result(name)).unwrap_or(name)
}

/// The name handed back to KiCad. With `KIAUTO_INTERPOSER_FILENAME` set it
/// is a fresh GLib copy of that value and the chooser's own is freed.
unsafe fn chooser_result(name: *mut c_char) -> *mut c_char {
    let original = CText::from_ptr(name);
    let Some(forced) = std::env::var_os(kiauto_config::ENV_FILENAME) else {
        trace_line!(Gtk, "File Chooser:{}", original);
        return name;
    };
    // Environment values can't hold a NUL
    let forced = CString::new(forced.into_vec()).unwrap_or_default();
    match gtk::g_strdup(&forced) {
        Ok(copy) => {
            trace_line!(
                Gtk,
                "File Chooser:{} (was {})",
                CText::from_bytes(forced.as_bytes()),
                original
            );
            if let Err(e) = gtk::g_free(name.cast()) {
                trace::failure(&e);
            }
            copy
        }
        Err(e) => {
            trace::failure(&e);
            trace_line!(Gtk, "File Chooser:{}", original);
            name
        }
    }
}

/// The one two-line call site: entry and exit
#[cfg_attr(not(test), no_mangle)]
pub unsafe extern "C" fn gtk_main_iteration() -> GBoolean {
    let real: MainIterationFn = get_real!(REAL_MAIN_ITERATION, 0);
    interposer_work(|| trace_line!(Gtk, "gtk_main_iteration:In"));
    let res = real();
    interposer_work(|| trace_line!(Gtk, "gtk_main_iteration:Out {}", res));
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chooser_without_override_keeps_name() {
        std::env::remove_var(kiauto_config::ENV_FILENAME);
        let name = c"/home/user/board.kicad_pcb";
        let out = unsafe { chooser_result(name.as_ptr().cast_mut()) };
        assert_eq!(out, name.as_ptr().cast_mut());
    }

    #[test]
    fn test_unresolved_calls_return_neutral() {
        unsafe {
            assert_eq!(gtk_dialog_run(ptr::null_mut()), 0);
            assert_eq!(gtk_main_iteration(), 0);
            assert!(gtk_file_chooser_get_filename(ptr::null_mut()).is_null());
            assert_eq!(
                gtk_print_operation_run(ptr::null_mut(), 0, ptr::null_mut(), ptr::null_mut()),
                PRINT_RESULT_ERROR
            );
        }
    }
}
