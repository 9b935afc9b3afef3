use std::io;
use std::os::fd::RawFd;

/// Resize a pipe to `capacity` bytes via `fcntl(F_SETPIPE_SZ)`.
///
/// The kernel rounds the request up to a power of two and returns the
/// capacity actually set. Requests above `/proc/sys/fs/pipe-max-size`
/// fail with `EPERM` for unprivileged processes.
pub(crate) fn set_pipe_capacity(fd: RawFd, capacity: usize) -> io::Result<usize> {
    // SAFETY: `fd` is an open pipe descriptor owned by the calling
    // channel; F_SETPIPE_SZ takes a plain integer argument.
    let rc = unsafe { libc::fcntl(fd, libc::F_SETPIPE_SZ, capacity as libc::c_int) };
    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(rc as usize)
    }
}
