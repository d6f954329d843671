use libc::{c_char, c_void};
use std::ffi::CStr;
use std::ptr::{self, NonNull};
use std::sync::atomic::{AtomicBool, AtomicPtr, Ordering};

use crate::error::InterposerError;
use crate::state::InterposerGuard;
use crate::trace;

/// Where `dlsym` looks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Next object after this one: the implementation being wrapped
    Next,
    /// Global search order: GTK/GLib helpers the interposer calls itself
    Default,
}

/// Lazily resolved address of a real function.
///
/// A successful lookup is cached for the life of the process. A failed one
/// is not, so a library `dlopen`ed later is picked up on the next call.
///
/// The `* wrapping` banner goes out on the first resolve made outside the
/// interposer, so the shim reading its own files doesn't announce `open64`
/// on the host's behalf.
pub struct RealSymbol {
    ptr: AtomicPtr<c_void>,
    name: &'static CStr,
    scope: Scope,
    banner: Option<&'static str>,
    announced: AtomicBool,
}

impl RealSymbol {
    const fn new(name: &'static CStr, scope: Scope, banner: Option<&'static str>) -> Self {
        Self {
            ptr: AtomicPtr::new(ptr::null_mut()),
            name,
            scope,
            banner,
            announced: AtomicBool::new(false),
        }
    }

    /// A wrapped function. `banner` goes into the `* wrapping` line.
    pub const fn next(name: &'static CStr, banner: &'static str) -> Self {
        Self::new(name, Scope::Next, Some(banner))
    }

    /// A wrapped function that is never announced
    pub const fn next_silent(name: &'static CStr) -> Self {
        Self::new(name, Scope::Next, None)
    }

    /// A helper looked up in the global scope, no banner
    pub const fn global(name: &'static CStr) -> Self {
        Self::new(name, Scope::Default, None)
    }

    pub fn name(&self) -> &'static str {
        self.name.to_str().unwrap_or("?")
    }

    pub fn resolve(&self) -> Result<NonNull<c_void>, InterposerError> {
        let f = match NonNull::new(self.ptr.load(Ordering::Acquire)) {
            Some(p) => p,
            None => self.lookup()?,
        };
        self.announce();
        Ok(f)
    }

    fn lookup(&self) -> Result<NonNull<c_void>, InterposerError> {
        let handle = match self.scope {
            Scope::Next => libc::RTLD_NEXT,
            Scope::Default => libc::RTLD_DEFAULT,
        };
        // Clear any stale error before the lookup
        unsafe { libc::dlerror() };
        let f = unsafe { libc::dlsym(handle, self.name.as_ptr()) };
        let Some(f) = NonNull::new(f) else {
            return Err(InterposerError::Unresolved {
                symbol: self.name(),
                reason: last_dl_error(),
            });
        };
        // Racing threads store the same address
        self.ptr.store(f.as_ptr(), Ordering::Release);
        Ok(f)
    }

    fn announce(&self) {
        let Some(banner) = self.banner else {
            return;
        };
        if self.announced.load(Ordering::Acquire) || InterposerGuard::is_held() {
            return;
        }
        // Only the winner prints
        if !self.announced.swap(true, Ordering::AcqRel) {
            trace::banner(banner);
        }
    }

    /// Resolve and cast to the function pointer type `F`.
    ///
    /// # Safety
    /// `F` must be an `extern "C"` function pointer type matching the
    /// symbol's real signature.
    pub unsafe fn function<F: Copy>(&self) -> Result<F, InterposerError> {
        debug_assert_eq!(
            std::mem::size_of::<F>(),
            std::mem::size_of::<*mut c_void>()
        );
        let p = self.resolve()?.as_ptr();
        Ok(std::mem::transmute_copy::<*mut c_void, F>(&p))
    }
}

fn last_dl_error() -> String {
    let msg: *const c_char = unsafe { libc::dlerror() };
    if msg.is_null() {
        return "symbol not found".to_string();
    }
    unsafe { CStr::from_ptr(msg) }.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    static REAL_GETPID: RealSymbol = RealSymbol::global(c"getpid");
    static MISSING: RealSymbol = RealSymbol::global(c"kiauto_no_such_symbol");

    #[test]
    fn test_resolves_and_caches() {
        let first = REAL_GETPID.resolve().unwrap();
        let second = REAL_GETPID.resolve().unwrap();
        assert_eq!(first, second);

        let getpid: unsafe extern "C" fn() -> libc::pid_t = unsafe { REAL_GETPID.function() }.unwrap();
        assert_eq!(unsafe { getpid() } as u32, std::process::id());
    }

    #[test]
    fn test_missing_symbol_is_reported_and_retried() {
        for _ in 0..2 {
            match MISSING.resolve() {
                Err(InterposerError::Unresolved { symbol, reason }) => {
                    assert_eq!(symbol, "kiauto_no_such_symbol");
                    assert!(!reason.is_empty());
                }
                other => panic!("unexpected: {other:?}"),
            }
        }
        assert!(MISSING.ptr.load(Ordering::Acquire).is_null());
    }

    #[test]
    fn test_banner_waits_for_outside_call() {
        static REAL_GETPPID: RealSymbol = RealSymbol::next(c"getppid", "getppid");

        let guard = InterposerGuard::enter().unwrap();
        REAL_GETPPID.resolve().unwrap();
        assert!(!REAL_GETPPID.announced.load(Ordering::Acquire));
        drop(guard);

        REAL_GETPPID.resolve().unwrap();
        assert!(REAL_GETPPID.announced.load(Ordering::Acquire));
    }

    #[test]
    fn test_silent_symbol_never_announced() {
        static REAL_GETUID: RealSymbol = RealSymbol::next_silent(c"getuid");
        REAL_GETUID.resolve().unwrap();
        assert!(!REAL_GETUID.announced.load(Ordering::Acquire));
        assert_eq!(REAL_GETUID.scope, Scope::Next);
    }

    #[test]
    fn test_name() {
        let sym = RealSymbol::next(c"gtk_window_set_title", "window title change");
        assert_eq!(sym.name(), "gtk_window_set_title");
        assert_eq!(sym.scope, Scope::Next);
    }
}
