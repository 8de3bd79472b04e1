//! Shared fixtures for store tests.

use crate::api::ApiClient;
use crate::stores::auth::{Session, SessionReader};

pub const TOKEN: &str = "tok";
pub const BEARER: &str = "Bearer tok";

pub fn api(server: &mockito::ServerGuard) -> ApiClient {
    ApiClient::new(reqwest::Client::new(), server.url())
}

pub fn signed_in() -> SessionReader {
    SessionReader::detached(Session {
        user: None,
        token: Some(TOKEN.to_string()),
    })
}

pub fn signed_out() -> SessionReader {
    SessionReader::detached(Session::default())
}
