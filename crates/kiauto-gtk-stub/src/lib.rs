//! # kiauto-gtk-stub
//!
//! Stand-in for the GTK, GLib and Pango functions the interposer wraps or
//! calls. Preloaded right after `libinterposer.so`, it is what the
//! interposer's `RTLD_NEXT` lookups find.
//!
//! Every entry point prints `STUB:<function>:<detail>` on stdout, so a test
//! can check what actually reached the library behind the interposer.

// Allow unsafe FFI functions without safety docs - these are inherently unsafe C ABI
#![allow(clippy::missing_safety_doc)]

use std::ffi::CStr;
use std::io::{self, Write};
use std::ptr;

use libc::{c_char, c_int, c_void};

/// Name the file chooser "picked"
pub const CHOOSER_NAME: &CStr = c"/orig/name.sch";

/// `GTK_PRINT_OPERATION_RESULT_APPLY`
pub const PRINT_RESULT_APPLY: c_int = 1;

/// Stands in for every GObject the stub hands out
static OBJECT: u8 = 0;

fn object<T>() -> *mut T {
    ptr::addr_of!(OBJECT).cast_mut().cast()
}

fn record(function: &str, detail: &[u8]) {
    let line = [&b"STUB:"[..], function.as_bytes(), &b":"[..], detail, &b"\n"[..]].concat();
    let mut out = io::stdout().lock();
    let _ = out.write_all(&line).and_then(|()| out.flush());
}

unsafe fn text<'a>(p: *const c_char) -> &'a [u8] {
    if p.is_null() {
        b""
    } else {
        CStr::from_ptr(p).to_bytes()
    }
}

fn pair(key: &[u8], value: &[u8]) -> Vec<u8> {
    [key, &b"="[..], value].concat()
}

// ============================================================================
// GLib
// ============================================================================

#[no_mangle]
pub unsafe extern "C" fn g_strdup(s: *const c_char) -> *mut c_char {
    if s.is_null() {
        return ptr::null_mut();
    }
    libc::strdup(s)
}

#[no_mangle]
pub unsafe extern "C" fn g_free(p: *mut c_void) {
    libc::free(p);
}

/// Only ever called with one property and the NULL terminator
#[no_mangle]
pub unsafe extern "C" fn g_object_set(
    _object: *mut c_void,
    name: *const c_char,
    value: *const c_char,
    _terminator: *const c_char,
) {
    record("g_object_set", &pair(text(name), text(value)));
}

// ============================================================================
// Pango
// ============================================================================

#[no_mangle]
pub unsafe extern "C" fn pango_layout_set_text(
    _layout: *mut c_void,
    text_ptr: *const c_char,
    length: c_int,
) {
    let bytes = if text_ptr.is_null() || length < 0 {
        text(text_ptr)
    } else {
        std::slice::from_raw_parts(text_ptr.cast::<u8>(), length as usize)
    };
    record("pango_layout_set_text", bytes);
}

// ============================================================================
// GTK file chooser and printing
// ============================================================================

/// A fresh GLib string, as GTK returns it
#[no_mangle]
pub unsafe extern "C" fn gtk_file_chooser_get_filename(_chooser: *mut c_void) -> *mut c_char {
    record("gtk_file_chooser_get_filename", CHOOSER_NAME.to_bytes());
    g_strdup(CHOOSER_NAME.as_ptr())
}

#[no_mangle]
pub unsafe extern "C" fn gtk_print_operation_get_print_settings(_op: *mut c_void) -> *mut c_void {
    object()
}

#[no_mangle]
pub unsafe extern "C" fn gtk_print_operation_set_print_settings(
    _op: *mut c_void,
    _settings: *mut c_void,
) {
    record("gtk_print_operation_set_print_settings", b"");
}

#[no_mangle]
pub unsafe extern "C" fn gtk_print_settings_new() -> *mut c_void {
    object()
}

#[no_mangle]
pub unsafe extern "C" fn g_object_unref(_object: *mut c_void) {}

#[no_mangle]
pub unsafe extern "C" fn gtk_print_settings_set(
    _settings: *mut c_void,
    key: *const c_char,
    value: *const c_char,
) {
    record("gtk_print_settings_set", &pair(text(key), text(value)));
}

#[no_mangle]
pub unsafe extern "C" fn gtk_print_settings_set_printer(
    _settings: *mut c_void,
    printer: *const c_char,
) {
    record("gtk_print_settings_set_printer", text(printer));
}

#[no_mangle]
pub unsafe extern "C" fn gtk_settings_get_default() -> *mut c_void {
    object()
}

#[no_mangle]
pub unsafe extern "C" fn gtk_print_operation_run(
    _op: *mut c_void,
    action: c_int,
    _parent: *mut c_void,
    _error: *mut *mut c_void,
) -> c_int {
    record("gtk_print_operation_run", action.to_string().as_bytes());
    PRINT_RESULT_APPLY
}

// ============================================================================
// GTK toolbar
// ============================================================================

#[no_mangle]
pub unsafe extern "C" fn gtk_tool_item_set_tooltip(
    _item: *mut c_void,
    _tooltips: *mut c_void,
    tip_text: *const c_char,
    _tip_private: *const c_char,
) {
    record("gtk_tool_item_set_tooltip", text(tip_text));
}

#[no_mangle]
pub unsafe extern "C" fn gtk_tool_item_set_tooltip_text(_item: *mut c_void, tip: *const c_char) {
    record("gtk_tool_item_set_tooltip_text", text(tip));
}

#[no_mangle]
pub unsafe extern "C" fn gtk_toolbar_insert(_toolbar: *mut c_void, _item: *mut c_void, pos: c_int) {
    record("gtk_toolbar_insert", pos.to_string().as_bytes());
}
