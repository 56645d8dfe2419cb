use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING};

use crate::core::error::RelaunchResult;

const APP_USER_AGENT: &str = concat!("CleanroomRelauncher/", env!("CARGO_PKG_VERSION"));

/// Blocking client shared by the catalog and the library downloader.
pub fn client(timeout: Duration) -> RelaunchResult<Client> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    let client = Client::builder()
        .user_agent(APP_USER_AGENT)
        .default_headers(default_headers)
        .timeout(timeout)
        .build()?;
    Ok(client)
}
