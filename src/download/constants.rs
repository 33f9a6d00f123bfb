//! Constants for the download module (timeouts, staging).

/// Default HTTP connect timeout for image fetches (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout for image fetches (5 minutes).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Extension used when neither Content-Type nor URL names one.
pub const DEFAULT_IMAGE_EXTENSION: &str = "jpg";

/// Name of the staging directory created under the library root.
pub const STAGING_DIR_NAME: &str = ".staging";
