//! Effective settings: CLI flags over file config over defaults.

use std::path::PathBuf;

use anyhow::Result;
use linkgrab_core::ProxyMode;
use linkgrab_core::api::DEFAULT_API_TIMEOUT_SECS;
use linkgrab_core::download::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};

use super::config::{FileConfig, validate_backend_url};
use crate::cli::Cli;

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_OUTPUT_DIR: &str = "./photos";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub backend_url: String,
    pub proxy_mode: ProxyMode,
    pub output_dir: PathBuf,
    pub cookie: Option<String>,
    pub api_timeout_secs: u64,
    pub download_connect_timeout_secs: u64,
    pub download_read_timeout_secs: u64,
    pub direct_for_non_doubao: bool,
}

impl Settings {
    /// Merges CLI flags over the file config over built-in defaults.
    ///
    /// `--direct` forces [`ProxyMode::Direct`]; without it the file's
    /// `proxy_mode` applies. A blank cookie counts as absent.
    pub fn resolve(cli: &Cli, file: Option<&FileConfig>) -> Result<Self> {
        let file = file.cloned().unwrap_or_default();

        let backend_url = cli
            .backend
            .clone()
            .or(file.backend_url)
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());
        validate_backend_url(&backend_url)?;

        let proxy_mode = if cli.direct {
            ProxyMode::Direct
        } else {
            file.proxy_mode.unwrap_or_default()
        };

        let cookie = cli
            .cookie
            .clone()
            .or(file.cookie)
            .filter(|cookie| !cookie.trim().is_empty());

        Ok(Self {
            backend_url,
            proxy_mode,
            output_dir: cli
                .output_dir
                .clone()
                .or(file.output_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            cookie,
            api_timeout_secs: file.api_timeout_secs.unwrap_or(DEFAULT_API_TIMEOUT_SECS),
            download_connect_timeout_secs: file
                .download_connect_timeout_secs
                .unwrap_or(CONNECT_TIMEOUT_SECS),
            download_read_timeout_secs: file
                .download_read_timeout_secs
                .unwrap_or(READ_TIMEOUT_SECS),
            direct_for_non_doubao: file.direct_for_non_doubao.unwrap_or(true),
        })
    }
}
