//! Shared User-Agent string for API and image traffic.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/fierce/linkgrab";

/// Default User-Agent for every request the crate sends.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("linkgrab/{version} (+{PROJECT_UA_URL})")
}
