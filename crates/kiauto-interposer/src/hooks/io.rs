//! Descriptor lifecycle notifiers.

use libc::{c_char, c_int, mode_t, FILE};

use super::interposer_work;
use crate::fdpath::fd_path;
use crate::reals::RealSymbol;
use crate::trace::CText;

type OpenFn = unsafe extern "C" fn(*const c_char, c_int, mode_t) -> c_int;
type OpenatFn = unsafe extern "C" fn(c_int, *const c_char, c_int, mode_t) -> c_int;
type CreatFn = unsafe extern "C" fn(*const c_char, mode_t) -> c_int;
type FopenFn = unsafe extern "C" fn(*const c_char, *const c_char) -> *mut FILE;
type CloseFn = unsafe extern "C" fn(c_int) -> c_int;
type FcloseFn = unsafe extern "C" fn(*mut FILE) -> c_int;

static REAL_OPEN: RealSymbol = RealSymbol::next(c"open", "open");
static REAL_OPEN64: RealSymbol = RealSymbol::next(c"open64", "open64");
static REAL_OPENAT: RealSymbol = RealSymbol::next(c"openat", "openat");
static REAL_CREAT: RealSymbol = RealSymbol::next(c"creat", "creat");
// Not announced
static REAL_FOPEN: RealSymbol = RealSymbol::next_silent(c"fopen");
static REAL_FOPEN64: RealSymbol = RealSymbol::next_silent(c"fopen64");
static REAL_CLOSE: RealSymbol = RealSymbol::next(c"close", "close");
static REAL_FCLOSE: RealSymbol = RealSymbol::next(c"fclose", "fclose");

#[cfg(target_os = "linux")]
unsafe fn set_errno(errno: c_int) {
    *libc::__errno_location() = errno;
}

#[cfg(target_os = "linux")]
unsafe fn get_errno() -> c_int {
    *libc::__errno_location()
}

/// Neutral return for a call that could not be forwarded
unsafe fn enosys<T>(value: T) -> T {
    set_errno(libc::ENOSYS);
    value
}

/// Keeps the real call's errno across the tracing that follows it
struct SavedErrno(c_int);

impl SavedErrno {
    unsafe fn save() -> Self {
        Self(get_errno())
    }
}

impl Drop for SavedErrno {
    fn drop(&mut self) {
        unsafe { set_errno(self.0) };
    }
}

unsafe fn trace_path(call: &str, path: *const c_char) {
    let _errno = SavedErrno::save();
    interposer_work(|| trace_line!(Io, "{}:{}", call, CText::from_ptr(path)));
}

/// Only text files opened for writing are of interest
unsafe fn is_write_text(mode: *const c_char) -> bool {
    CText::from_ptr(mode).as_bytes().starts_with(b"wt")
}

#[cfg_attr(not(test), no_mangle)]
pub unsafe extern "C" fn open(path: *const c_char, flags: c_int, mode: mode_t) -> c_int {
    let real: OpenFn = get_real!(REAL_OPEN, enosys(-1));
    let fd = real(path, flags, mode);
    trace_path("open", path);
    fd
}

#[cfg_attr(not(test), no_mangle)]
pub unsafe extern "C" fn open64(path: *const c_char, flags: c_int, mode: mode_t) -> c_int {
    let real: OpenFn = get_real!(REAL_OPEN64, enosys(-1));
    let fd = real(path, flags, mode);
    trace_path("open", path);
    fd
}

#[cfg_attr(not(test), no_mangle)]
pub unsafe extern "C" fn openat(
    dirfd: c_int,
    path: *const c_char,
    flags: c_int,
    mode: mode_t,
) -> c_int {
    let real: OpenatFn = get_real!(REAL_OPENAT, enosys(-1));
    let fd = real(dirfd, path, flags, mode);
    trace_path("open", path);
    fd
}

#[cfg_attr(not(test), no_mangle)]
pub unsafe extern "C" fn creat(path: *const c_char, mode: mode_t) -> c_int {
    let real: CreatFn = get_real!(REAL_CREAT, enosys(-1));
    let fd = real(path, mode);
    trace_path("creat", path);
    fd
}

#[cfg_attr(not(test), no_mangle)]
pub unsafe extern "C" fn fopen(path: *const c_char, mode: *const c_char) -> *mut FILE {
    let real: FopenFn = get_real!(REAL_FOPEN, enosys(std::ptr::null_mut()));
    let stream = real(path, mode);
    if is_write_text(mode) {
        trace_path("fopen", path);
    }
    stream
}

#[cfg_attr(not(test), no_mangle)]
pub unsafe extern "C" fn fopen64(path: *const c_char, mode: *const c_char) -> *mut FILE {
    let real: FopenFn = get_real!(REAL_FOPEN64, enosys(std::ptr::null_mut()));
    let stream = real(path, mode);
    if is_write_text(mode) {
        trace_path("fopen", path);
    }
    stream
}

/// The path is read from `/proc` while the descriptor is still open
#[cfg_attr(not(test), no_mangle)]
pub unsafe extern "C" fn close(fd: c_int) -> c_int {
    let real: CloseFn = get_real!(REAL_CLOSE, enosys(-1));
    let path = interposer_work(|| fd_path(fd));
    let res = real(fd);
    if let Some(path) = path {
        let _errno = SavedErrno::save();
        interposer_work(|| trace_line!(Io, "close:{}", CText::from_bytes(&path)));
    }
    res
}

/// A null stream is forwarded as is and traced with an empty path
#[cfg_attr(not(test), no_mangle)]
pub unsafe extern "C" fn fclose(stream: *mut FILE) -> c_int {
    let real: FcloseFn = get_real!(REAL_FCLOSE, enosys(libc::EOF));
    let path = interposer_work(|| {
        if stream.is_null() {
            Vec::new()
        } else {
            fd_path(libc::fileno(stream))
        }
    });
    let res = real(stream);
    if let Some(path) = path {
        let _errno = SavedErrno::save();
        interposer_work(|| trace_line!(Io, "fclose:{}", CText::from_bytes(&path)));
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    fn c_path(path: &std::path::Path) -> CString {
        CString::new(path.as_os_str().as_bytes()).unwrap()
    }

    #[test]
    fn test_write_text_modes() {
        unsafe {
            assert!(is_write_text(c"wt".as_ptr()));
            assert!(is_write_text(c"wt+".as_ptr()));
            assert!(!is_write_text(c"w".as_ptr()));
            assert!(!is_write_text(c"rt".as_ptr()));
            assert!(!is_write_text(c"tw".as_ptr()));
            assert!(!is_write_text(std::ptr::null()));
        }
    }

    #[test]
    fn test_open_and_close_forward() {
        let dir = tempfile::tempdir().unwrap();
        let path = c_path(&dir.path().join("out.txt"));
        unsafe {
            let fd = open(path.as_ptr(), libc::O_CREAT | libc::O_WRONLY, 0o644);
            assert!(fd >= 0);
            assert_eq!(close(fd), 0);
        }
        assert!(dir.path().join("out.txt").exists());
    }

    #[test]
    fn test_close_invalid_descriptor_keeps_errno() {
        unsafe {
            assert_eq!(close(-1), -1);
            assert_eq!(get_errno(), libc::EBADF);
        }
    }

    #[test]
    fn test_failed_open_keeps_errno() {
        unsafe {
            let fd = open(c"/nonexistent/kiauto/file".as_ptr(), libc::O_RDONLY, 0);
            assert_eq!(fd, -1);
            assert_eq!(get_errno(), libc::ENOENT);
        }
    }

    #[test]
    fn test_fopen_fclose_forward() {
        let dir = tempfile::tempdir().unwrap();
        let path = c_path(&dir.path().join("netlist.net"));
        unsafe {
            let stream = fopen(path.as_ptr(), c"wt".as_ptr());
            assert!(!stream.is_null());
            assert_eq!(fclose(stream), 0);
        }
    }

    #[test]
    fn test_creat_forwards() {
        let dir = tempfile::tempdir().unwrap();
        let path = c_path(&dir.path().join("new.kicad_pcb"));
        unsafe {
            let fd = creat(path.as_ptr(), 0o600);
            assert!(fd >= 0);
            assert_eq!(close(fd), 0);
        }
    }
}
