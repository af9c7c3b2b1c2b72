//! Constants for the download module (timeouts, file permissions).

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes for large files).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Permission bits for files created by downloads (unix only).
#[cfg(unix)]
pub const DEFAULT_FILE_MODE: u32 = 0o644;
