//! GTK/GLib functions the interposer calls on its own behalf.
//!
//! Looked up in the global scope at run time; the library never links
//! against GTK.

use std::ffi::CStr;
use std::ptr::NonNull;

use libc::{c_char, c_void};

use crate::error::InterposerError;
use crate::print::PrintSettingsTarget;
use crate::reals::RealSymbol;
use crate::trace::{self, CText};

opaque_types!(
    GSList,
    GError,
    GtkAdjustment,
    GtkButton,
    GtkDialog,
    GtkFileChooser,
    GtkLabel,
    GtkPrintOperation,
    GtkPrintSettings,
    GtkSettings,
    GtkToolItem,
    GtkToolbar,
    GtkTooltips,
    GtkWidget,
    GtkWindow,
    PangoLayout,
    XDisplay,
);

pub type GBoolean = libc::c_int;

type WindowGetTitleFn = unsafe extern "C" fn(*mut GtkWindow) -> *const c_char;
type StrdupFn = unsafe extern "C" fn(*const c_char) -> *mut c_char;
type FreeFn = unsafe extern "C" fn(*mut c_void);
type ObjectUnrefFn = unsafe extern "C" fn(*mut c_void);
type ObjectSetFn = unsafe extern "C" fn(*mut c_void, *const c_char, ...);
type SettingsGetDefaultFn = unsafe extern "C" fn() -> *mut GtkSettings;
type GetPrintSettingsFn = unsafe extern "C" fn(*mut GtkPrintOperation) -> *mut GtkPrintSettings;
type SetPrintSettingsFn = unsafe extern "C" fn(*mut GtkPrintOperation, *mut GtkPrintSettings);
type PrintSettingsNewFn = unsafe extern "C" fn() -> *mut GtkPrintSettings;
type PrintSettingsSetFn = unsafe extern "C" fn(*mut GtkPrintSettings, *const c_char, *const c_char);
type PrintSettingsSetPrinterFn = unsafe extern "C" fn(*mut GtkPrintSettings, *const c_char);

static GTK_WINDOW_GET_TITLE: RealSymbol = RealSymbol::global(c"gtk_window_get_title");
static G_STRDUP: RealSymbol = RealSymbol::global(c"g_strdup");
static G_FREE: RealSymbol = RealSymbol::global(c"g_free");
static G_OBJECT_UNREF: RealSymbol = RealSymbol::global(c"g_object_unref");
static G_OBJECT_SET: RealSymbol = RealSymbol::global(c"g_object_set");
static GTK_SETTINGS_GET_DEFAULT: RealSymbol = RealSymbol::global(c"gtk_settings_get_default");
static GTK_PRINT_OPERATION_GET_PRINT_SETTINGS: RealSymbol =
    RealSymbol::global(c"gtk_print_operation_get_print_settings");
static GTK_PRINT_OPERATION_SET_PRINT_SETTINGS: RealSymbol =
    RealSymbol::global(c"gtk_print_operation_set_print_settings");
static GTK_PRINT_SETTINGS_NEW: RealSymbol = RealSymbol::global(c"gtk_print_settings_new");
static GTK_PRINT_SETTINGS_SET: RealSymbol = RealSymbol::global(c"gtk_print_settings_set");
static GTK_PRINT_SETTINGS_SET_PRINTER: RealSymbol =
    RealSymbol::global(c"gtk_print_settings_set_printer");

/// Window title, owned by the window. Empty for a null window, an untitled
/// one, or when GTK isn't there to ask.
pub unsafe fn window_title<'a>(window: *mut GtkWindow) -> CText<'a> {
    if window.is_null() {
        return CText::from_bytes(&[]);
    }
    match GTK_WINDOW_GET_TITLE.function::<WindowGetTitleFn>() {
        Ok(get_title) => CText::from_ptr(get_title(window)),
        Err(e) => {
            trace::failure(&e);
            CText::from_bytes(&[])
        }
    }
}

/// Title copied out, for calls that may free the window
pub unsafe fn window_title_owned(window: *mut GtkWindow) -> String {
    window_title(window).to_string()
}

/// A copy of `s` the caller releases with `g_free`
pub unsafe fn g_strdup(s: &CStr) -> Result<*mut c_char, InterposerError> {
    let strdup: StrdupFn = G_STRDUP.function()?;
    Ok(strdup(s.as_ptr()))
}

pub unsafe fn g_free(p: *mut c_void) -> Result<(), InterposerError> {
    if p.is_null() {
        return Ok(());
    }
    let free: FreeFn = G_FREE.function()?;
    free(p);
    Ok(())
}

/// Print settings of one operation
pub struct OperationSettings {
    settings: NonNull<GtkPrintSettings>,
}

impl OperationSettings {
    /// Settings attached to `op`. An operation without any gets a fresh
    /// settings object, owned by the operation.
    pub unsafe fn attach(op: *mut GtkPrintOperation) -> Result<Self, InterposerError> {
        let get: GetPrintSettingsFn = GTK_PRINT_OPERATION_GET_PRINT_SETTINGS.function()?;
        if let Some(settings) = NonNull::new(get(op)) {
            return Ok(Self { settings });
        }

        let new: PrintSettingsNewFn = GTK_PRINT_SETTINGS_NEW.function()?;
        let set: SetPrintSettingsFn = GTK_PRINT_OPERATION_SET_PRINT_SETTINGS.function()?;
        let unref: ObjectUnrefFn = G_OBJECT_UNREF.function()?;
        let Some(settings) = NonNull::new(new()) else {
            return Err(InterposerError::Unresolved {
                symbol: GTK_PRINT_SETTINGS_NEW.name(),
                reason: "returned no settings object".to_string(),
            });
        };
        set(op, settings.as_ptr());
        // The operation keeps its own reference
        unref(settings.as_ptr().cast());
        Ok(Self { settings })
    }
}

impl PrintSettingsTarget for OperationSettings {
    fn set(&mut self, key: &CStr, value: &CStr) -> Result<(), InterposerError> {
        unsafe {
            let set: PrintSettingsSetFn = GTK_PRINT_SETTINGS_SET.function()?;
            set(self.settings.as_ptr(), key.as_ptr(), value.as_ptr());
        }
        Ok(())
    }

    fn set_printer(&mut self, printer: &CStr) -> Result<(), InterposerError> {
        unsafe {
            let set_printer: PrintSettingsSetPrinterFn = GTK_PRINT_SETTINGS_SET_PRINTER.function()?;
            set_printer(self.settings.as_ptr(), printer.as_ptr());
        }
        Ok(())
    }

    fn restrict_backends(&mut self, backends: &CStr) -> Result<(), InterposerError> {
        unsafe {
            let get_default: SettingsGetDefaultFn = GTK_SETTINGS_GET_DEFAULT.function()?;
            let object_set: ObjectSetFn = G_OBJECT_SET.function()?;
            let defaults = get_default();
            if defaults.is_null() {
                // No display yet; nothing to restrict
                return Ok(());
            }
            object_set(
                defaults.cast(),
                c"gtk-print-backends".as_ptr(),
                backends.as_ptr(),
                std::ptr::null::<c_char>(),
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The test binary doesn't load GTK: helpers must degrade, not crash

    #[test]
    fn test_null_window_has_empty_title() {
        let title = unsafe { window_title(std::ptr::null_mut()) };
        assert!(title.is_empty());
    }

    #[test]
    fn test_g_free_null_is_noop() {
        assert!(unsafe { g_free(std::ptr::null_mut()) }.is_ok());
    }

    #[test]
    fn test_attach_without_gtk_fails_cleanly() {
        match unsafe { OperationSettings::attach(std::ptr::null_mut()) } {
            Err(InterposerError::Unresolved { symbol, .. }) => {
                assert_eq!(symbol, "gtk_print_operation_get_print_settings")
            }
            _ => panic!("GTK should not be loaded in unit tests"),
        }
    }
}
