use std::ffi::CString;
use std::fmt;

use kiauto_config::{RewriteTable, RewriteTables};
use libc::{c_char, c_int};

use super::interposer_work;
use crate::gtk::{
    GSList, GtkAdjustment, GtkButton, GtkLabel, GtkToolItem, GtkToolbar, GtkTooltips, GtkWidget,
};
use crate::reals::RealSymbol;
use crate::trace::CText;

type ScrolledWindowNewFn =
    unsafe extern "C" fn(*mut GtkAdjustment, *mut GtkAdjustment) -> *mut GtkWidget;
type RadioButtonNewFn = unsafe extern "C" fn(*mut GSList, *const c_char) -> *mut GtkWidget;
type CheckButtonNewFn = unsafe extern "C" fn(*const c_char) -> *mut GtkWidget;
type ButtonSetLabelFn = unsafe extern "C" fn(*mut GtkButton, *const c_char);
type LabelSetTextFn = unsafe extern "C" fn(*mut GtkLabel, *const c_char);
type SetTooltipFn =
    unsafe extern "C" fn(*mut GtkToolItem, *mut GtkTooltips, *const c_char, *const c_char);
type SetTooltipTextFn = unsafe extern "C" fn(*mut GtkToolItem, *const c_char);
type ToolbarInsertFn = unsafe extern "C" fn(*mut GtkToolbar, *mut GtkToolItem, c_int);

static REAL_SCROLLED_WINDOW_NEW: RealSymbol =
    RealSymbol::next(c"gtk_scrolled_window_new", "window creation");
static REAL_RADIO_WITH_LABEL: RealSymbol =
    RealSymbol::next(c"gtk_radio_button_new_with_label", "radio label");
static REAL_RADIO_WITH_MNEMONIC: RealSymbol =
    RealSymbol::next(c"gtk_radio_button_new_with_mnemonic", "radio label 2");
static REAL_CHECK_WITH_LABEL: RealSymbol =
    RealSymbol::next(c"gtk_check_button_new_with_label", "check button label");
static REAL_BUTTON_SET_LABEL: RealSymbol =
    RealSymbol::next(c"gtk_button_set_label", "button set label");
static REAL_LABEL_SET_TEXT: RealSymbol =
    RealSymbol::next(c"gtk_label_set_text", "label set text");
static REAL_SET_TOOLTIP: RealSymbol =
    RealSymbol::next(c"gtk_tool_item_set_tooltip", "tooltip set");
static REAL_SET_TOOLTIP_TEXT: RealSymbol =
    RealSymbol::next(c"gtk_tool_item_set_tooltip_text", "tooltip set text");
static REAL_TOOLBAR_INSERT: RealSymbol =
    RealSymbol::next(c"gtk_toolbar_insert", "toolbar insert");

/// A text argument on its way to GTK, rewritten when a table entry matched
pub struct Forwarded<'a> {
    original: CText<'a>,
    replacement: Option<CString>,
}

impl<'a> Forwarded<'a> {
    pub fn lookup(table: &RewriteTable, original: CText<'a>) -> Self {
        let replacement = table
            .lookup(original.as_bytes())
            .and_then(|s| CString::new(s.replacement.as_str()).ok());
        Self {
            original,
            replacement,
        }
    }

    pub fn unchanged(original: CText<'a>) -> Self {
        Self {
            original,
            replacement: None,
        }
    }

    #[cfg(test)]
    fn is_rewritten(&self) -> bool {
        self.replacement.is_some()
    }

    /// The replacement, or the caller's own pointer
    pub fn as_ptr(&self, caller: *const c_char) -> *const c_char {
        self.replacement.as_ref().map_or(caller, |r| r.as_ptr())
    }
}

impl fmt::Display for Forwarded<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.replacement {
            Some(r) => write!(
                f,
                "{} (was {})",
                CText::from_bytes(r.as_bytes()),
                self.original
            ),
            None => write!(f, "{}", self.original),
        }
    }
}

unsafe fn rewrite<'a>(
    text: *const c_char,
    site: impl FnOnce(&RewriteTables) -> &RewriteTable,
) -> Forwarded<'a> {
    let original = CText::from_ptr(text);
    interposer_work(|| Forwarded::lookup(site(&kiauto_config::tables().rewrite), original))
        .unwrap_or_else(|| Forwarded::unchanged(original))
}

#[cfg_attr(not(test), no_mangle)]
pub unsafe extern "C" fn gtk_scrolled_window_new(
    hadjustment: *mut GtkAdjustment,
    vadjustment: *mut GtkAdjustment,
) -> *mut GtkWidget {
    let real: ScrolledWindowNewFn = get_real!(REAL_SCROLLED_WINDOW_NEW, std::ptr::null_mut());
    let widget = real(hadjustment, vadjustment);
    interposer_work(|| trace_line!(Gtk, "Window_Creation"));
    widget
}

#[cfg_attr(not(test), no_mangle)]
pub unsafe extern "C" fn gtk_radio_button_new_with_label(
    group: *mut GSList,
    label: *const c_char,
) -> *mut GtkWidget {
    let real: RadioButtonNewFn = get_real!(REAL_RADIO_WITH_LABEL, std::ptr::null_mut());
    let forwarded = rewrite(label, |t| &t.radio_button_new_with_label);
    let widget = real(group, forwarded.as_ptr(label));
    interposer_work(|| trace_line!(Gtk, "Radio Button Label:{}", forwarded));
    widget
}

#[cfg_attr(not(test), no_mangle)]
pub unsafe extern "C" fn gtk_radio_button_new_with_mnemonic(
    group: *mut GSList,
    label: *const c_char,
) -> *mut GtkWidget {
    let real: RadioButtonNewFn = get_real!(REAL_RADIO_WITH_MNEMONIC, std::ptr::null_mut());
    let widget = real(group, label);
    interposer_work(|| trace_line!(Gtk, "Radio Button Label 2:{}", CText::from_ptr(label)));
    widget
}

#[cfg_attr(not(test), no_mangle)]
pub unsafe extern "C" fn gtk_check_button_new_with_label(label: *const c_char) -> *mut GtkWidget {
    let real: CheckButtonNewFn = get_real!(REAL_CHECK_WITH_LABEL, std::ptr::null_mut());
    let forwarded = rewrite(label, |t| &t.check_button_new_with_label);
    let widget = real(forwarded.as_ptr(label));
    interposer_work(|| trace_line!(Gtk, "Check Button Label:{}", forwarded));
    widget
}

#[cfg_attr(not(test), no_mangle)]
pub unsafe extern "C" fn gtk_button_set_label(button: *mut GtkButton, label: *const c_char) {
    let real: ButtonSetLabelFn = get_real!(REAL_BUTTON_SET_LABEL, ());
    let forwarded = rewrite(label, |t| &t.button_set_label);
    real(button, forwarded.as_ptr(label));
    interposer_work(|| trace_line!(Gtk, "Button Set Label:{}", forwarded));
}

#[cfg_attr(not(test), no_mangle)]
pub unsafe extern "C" fn gtk_label_set_text(label: *mut GtkLabel, text: *const c_char) {
    let real: LabelSetTextFn = get_real!(REAL_LABEL_SET_TEXT, ());
    let forwarded = rewrite(text, |t| &t.label_set_text);
    real(label, forwarded.as_ptr(text));
    interposer_work(|| trace_line!(Gtk, "Label Set Text:{}", forwarded));
}

// "Tootip" is the tag KiAuto matches on
/// GTK2 form
#[cfg_attr(not(test), no_mangle)]
pub unsafe extern "C" fn gtk_tool_item_set_tooltip(
    item: *mut GtkToolItem,
    tooltips: *mut GtkTooltips,
    tip_text: *const c_char,
    tip_private: *const c_char,
) {
    let real: SetTooltipFn = get_real!(REAL_SET_TOOLTIP, ());
    real(item, tooltips, tip_text, tip_private);
    interposer_work(|| trace_line!(Gtk, "Tootip:{}", CText::from_ptr(tip_text)));
}

#[cfg_attr(not(test), no_mangle)]
pub unsafe extern "C" fn gtk_tool_item_set_tooltip_text(item: *mut GtkToolItem, text: *const c_char) {
    let real: SetTooltipTextFn = get_real!(REAL_SET_TOOLTIP_TEXT, ());
    real(item, text);
    interposer_work(|| trace_line!(Gtk, "Tootip:{}", CText::from_ptr(text)));
}

#[cfg_attr(not(test), no_mangle)]
pub unsafe extern "C" fn gtk_toolbar_insert(
    toolbar: *mut GtkToolbar,
    item: *mut GtkToolItem,
    pos: c_int,
) {
    let real: ToolbarInsertFn = get_real!(REAL_TOOLBAR_INSERT, ());
    real(toolbar, item, pos);
    interposer_work(|| trace_line!(Gtk, "Tootip:"));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forwarded(table: &RewriteTable, text: &str) -> String {
        Forwarded::lookup(table, CText::from_bytes(text.as_bytes())).to_string()
    }

    #[test]
    fn test_every_default_entry_rewrites() {
        let tables = RewriteTables::default();
        for (_, table) in tables.sites() {
            for entry in table.entries() {
                let fwd = Forwarded::lookup(table, CText::from_bytes(entry.pattern.as_bytes()));
                assert!(fwd.is_rewritten(), "{} not rewritten", entry.pattern);
                let ptr = fwd.as_ptr(std::ptr::null());
                let passed = unsafe { std::ffi::CStr::from_ptr(ptr) };
                assert_eq!(passed.to_bytes(), entry.replacement.as_bytes());
            }
        }
    }

    #[test]
    fn test_trace_shows_both_values() {
        let tables = RewriteTables::default();
        assert_eq!(
            forwarded(&tables.label_set_text, "Report all errors for tracks (slower)"),
            "_Report all errors for tracks (slower) (was Report all errors for tracks (slower))"
        );
        assert_eq!(forwarded(&tables.button_set_label, "Close"), "Close");
    }

    #[test]
    fn test_unmatched_text_keeps_caller_pointer() {
        let tables = RewriteTables::default();
        let text = c"Some other label";
        let fwd = unsafe { Forwarded::lookup(&tables.label_set_text, CText::from_ptr(text.as_ptr())) };
        assert!(!fwd.is_rewritten());
        assert_eq!(fwd.as_ptr(text.as_ptr()), text.as_ptr());
    }

    #[test]
    fn test_null_text_forwarded_as_null() {
        let fwd = unsafe { rewrite(std::ptr::null(), |t| &t.label_set_text) };
        assert!(fwd.as_ptr(std::ptr::null()).is_null());
        assert_eq!(fwd.to_string(), "");
    }

    #[test]
    fn test_unresolved_toolbar_calls_return() {
        // No GTK in the test binary: each call reports and returns
        unsafe {
            gtk_tool_item_set_tooltip(
                std::ptr::null_mut(),
                std::ptr::null_mut(),
                c"Zoom in".as_ptr(),
                std::ptr::null(),
            );
            gtk_tool_item_set_tooltip_text(std::ptr::null_mut(), c"Zoom in".as_ptr());
            gtk_toolbar_insert(std::ptr::null_mut(), std::ptr::null_mut(), -1);
        }
    }

    #[test]
    fn test_rewrite_inside_interposer_passes_through() {
        let text = c"Run DRC";
        let fwd = interposer_work(|| unsafe { rewrite(text.as_ptr(), |t| &t.button_set_label) })
            .unwrap();
        assert!(!fwd.is_rewritten());
    }
}
