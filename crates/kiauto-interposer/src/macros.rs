/// Emit one trace line under a category tag.
///
/// # Usage:
/// ```ignore
/// trace_line!(Gtk, "Window Title:{}", title);  // GTK:Window Title:...
/// ```
#[macro_export]
macro_rules! trace_line {
    ($category:ident, $($arg:tt)*) => {
        $crate::trace::event($crate::trace::Category::$category, format_args!($($arg)*))
    };
}

/// Resolve a [`RealSymbol`](crate::reals::RealSymbol) into the function
/// pointer type of the binding, or print the `**` line and return
/// `$fallback` from the enclosing hook.
///
/// # Usage:
/// ```ignore
/// let real: CloseFn = get_real!(REAL_CLOSE, enosys(-1));
/// ```
#[macro_export]
macro_rules! get_real {
    ($storage:expr, $fallback:expr) => {
        match $storage.function() {
            Ok(f) => f,
            Err(e) => {
                $crate::trace::failure(&e);
                return $fallback;
            }
        }
    };
}

/// Opaque C types only ever handled by pointer
macro_rules! opaque_types {
    ($($name:ident),* $(,)?) => {
        $(
            #[repr(C)]
            pub struct $name {
                _private: [u8; 0],
            }
        )*
    };
}
