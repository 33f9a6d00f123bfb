//! Shared HTTP client construction policy.
//!
//! Both the API client and the image fetcher build their `reqwest::Client`
//! here so they agree on user-agent, compression and cookies.

use std::time::Duration;

use reqwest::Client;

use crate::user_agent;

/// Timeouts applied to a client. `None` leaves reqwest's default in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ClientTimeouts {
    pub(crate) connect: Option<Duration>,
    pub(crate) total: Option<Duration>,
}

/// Builds a gzip-enabled client with a cookie store and the crate user agent.
pub(crate) fn build_client(timeouts: ClientTimeouts) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .gzip(true)
        .cookie_store(true)
        .user_agent(user_agent::default_user_agent());
    if let Some(connect) = timeouts.connect {
        builder = builder.connect_timeout(connect);
    }
    if let Some(total) = timeouts.total {
        builder = builder.timeout(total);
    }
    builder.build()
}
