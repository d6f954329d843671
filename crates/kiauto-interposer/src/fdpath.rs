use std::ffi::OsString;
use std::os::unix::ffi::OsStringExt;
use std::path::PathBuf;

use libc::c_int;

/// Path behind a descriptor, from its `/proc/self/fd` link.
///
/// Empty when the descriptor is invalid or the link can't be read. Sockets
/// and pipes come back as `socket:[...]`/`pipe:[...]`.
pub fn fd_path(fd: c_int) -> Vec<u8> {
    if fd < 0 {
        return Vec::new();
    }
    let link = PathBuf::from(format!("/proc/self/fd/{}", fd));
    nix::fcntl::readlink(link.as_path())
        .map(OsString::into_vec)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::io::AsRawFd;

    #[test]
    fn test_known_file() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        let path = fd_path(temp.as_file().as_raw_fd());
        let expected = std::fs::canonicalize(temp.path()).unwrap();
        assert_eq!(path, expected.into_os_string().into_vec());
    }

    #[test]
    fn test_invalid_descriptors() {
        assert!(fd_path(-1).is_empty());
        assert!(fd_path(1_000_000).is_empty());
    }
}
