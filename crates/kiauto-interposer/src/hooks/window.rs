use libc::c_char;

use super::interposer_work;
use crate::gtk::{self, GBoolean, GtkWidget, GtkWindow};
use crate::reals::RealSymbol;
use crate::trace::CText;

type SetTitleFn = unsafe extern "C" fn(*mut GtkWindow, *const c_char);
type SetFlagFn = unsafe extern "C" fn(*mut GtkWindow, GBoolean);
type SetFocusFn = unsafe extern "C" fn(*mut GtkWindow, *mut GtkWidget);
type WindowFn = unsafe extern "C" fn(*mut GtkWindow);

static REAL_SET_TITLE: RealSymbol =
    RealSymbol::next(c"gtk_window_set_title", "window title change");
static REAL_SET_MODAL: RealSymbol = RealSymbol::next(c"gtk_window_set_modal", "window set modal");
static REAL_SET_FOCUS: RealSymbol = RealSymbol::next(c"gtk_window_set_focus", "window set focus");
static REAL_PRESENT: RealSymbol = RealSymbol::next(c"gtk_window_present", "window present");
static REAL_DESTROY: RealSymbol = RealSymbol::next(c"gtk_window_destroy", "window destroy");
static REAL_CLOSE: RealSymbol = RealSymbol::next(c"gtk_window_close", "window close");
static REAL_SET_HIDE_ON_CLOSE: RealSymbol =
    RealSymbol::next(c"gtk_window_set_hide_on_close", "window hide on close");

fn flag(value: GBoolean) -> u8 {
    u8::from(value != 0)
}

#[cfg_attr(not(test), no_mangle)]
pub unsafe extern "C" fn gtk_window_set_title(window: *mut GtkWindow, title: *const c_char) {
    let real: SetTitleFn = get_real!(REAL_SET_TITLE, ());
    real(window, title);
    interposer_work(|| trace_line!(Gtk, "Window Title:{}", CText::from_ptr(title)));
}

#[cfg_attr(not(test), no_mangle)]
pub unsafe extern "C" fn gtk_window_set_modal(window: *mut GtkWindow, modal: GBoolean) {
    let real: SetFlagFn = get_real!(REAL_SET_MODAL, ());
    real(window, modal);
    interposer_work(|| {
        trace_line!(
            Gtk,
            "Window Set Modal:{} {}",
            gtk::window_title(window),
            flag(modal)
        )
    });
}

#[cfg_attr(not(test), no_mangle)]
pub unsafe extern "C" fn gtk_window_set_focus(window: *mut GtkWindow, focus: *mut GtkWidget) {
    let real: SetFocusFn = get_real!(REAL_SET_FOCUS, ());
    real(window, focus);
    interposer_work(|| trace_line!(Gtk, "Window Set Focus:{}", gtk::window_title(window)));
}

#[cfg_attr(not(test), no_mangle)]
pub unsafe extern "C" fn gtk_window_present(window: *mut GtkWindow) {
    let real: WindowFn = get_real!(REAL_PRESENT, ());
    real(window);
    interposer_work(|| trace_line!(Gtk, "Window Present:{}", gtk::window_title(window)));
}

/// The title is read before the window goes away
#[cfg_attr(not(test), no_mangle)]
pub unsafe extern "C" fn gtk_window_destroy(window: *mut GtkWindow) {
    let real: WindowFn = get_real!(REAL_DESTROY, ());
    let title = interposer_work(|| gtk::window_title_owned(window));
    real(window);
    if let Some(title) = title {
        interposer_work(|| trace_line!(Gtk, "Window Destroy:{}", title));
    }
}

#[cfg_attr(not(test), no_mangle)]
pub unsafe extern "C" fn gtk_window_close(window: *mut GtkWindow) {
    let real: WindowFn = get_real!(REAL_CLOSE, ());
    let title = interposer_work(|| gtk::window_title_owned(window));
    real(window);
    if let Some(title) = title {
        interposer_work(|| trace_line!(Gtk, "Window Close:{}", title));
    }
}

#[cfg_attr(not(test), no_mangle)]
pub unsafe extern "C" fn gtk_window_set_hide_on_close(window: *mut GtkWindow, setting: GBoolean) {
    let real: SetFlagFn = get_real!(REAL_SET_HIDE_ON_CLOSE, ());
    real(window, setting);
    interposer_work(|| {
        trace_line!(
            Gtk,
            "Window Set Hide on Close:{} {}",
            gtk::window_title(window),
            flag(setting)
        )
    });
}
