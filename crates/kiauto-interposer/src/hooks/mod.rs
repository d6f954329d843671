//! Exported wrappers, one per intercepted symbol.
//!
//! Every wrapper has the same shape: resolve the real function, maybe
//! rewrite an argument, call through, trace, return the real result. The
//! interposer guard is held only around the interposer's own work, never
//! across the real call, so GTK calls made from inside a wrapped call (a
//! dialog running its own main loop) are traced too.
//!
//! Symbols are exported unmangled outside of `cfg(test)` only; the unit test
//! binary must not interpose its own libc.

pub mod dialog;
pub mod glx;
pub mod io;
pub mod pango;
pub mod widgets;
pub mod window;

use crate::state::InterposerGuard;

/// Run `f` as interposer work. `None` when this thread is already inside
/// the interposer.
pub(crate) fn interposer_work<R>(f: impl FnOnce() -> R) -> Option<R> {
    let _guard = InterposerGuard::enter()?;
    Some(f())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_work_is_skipped() {
        let outer = interposer_work(|| interposer_work(|| 1));
        assert_eq!(outer, Some(None));
        assert_eq!(interposer_work(|| 2), Some(2));
    }
}
