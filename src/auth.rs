use crate::accounts::Account;
use anyhow::Result;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

const TOKEN_URL: &str = "https://auth.aliyundrive.com/v2/account/token";
const REFRESH_TIMEOUT: Duration = Duration::from_secs(10);

/// Short-lived credentials for one account, valid for a single run.
#[derive(Debug)]
pub struct Session {
    pub display_name: String,
    pub access_token: String,
}

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("token refresh rejected by server: {code} - {message}")]
    Api { code: String, message: String },
    #[error("token refresh response did not contain an access_token")]
    MissingAccessToken,
    #[error("token refresh timed out, check network connectivity")]
    Timeout,
    #[error("token refresh failed: {0}")]
    Transport(#[source] reqwest::Error),
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    code: Option<Value>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    nick_name: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
}

/// Exchanges a long-lived refresh token for a fresh access token.
pub struct TokenRefresher {
    client: Client,
    endpoint: String,
}

impl TokenRefresher {
    pub fn new() -> Result<Self> {
        Self::with_endpoint(TOKEN_URL)
    }

    pub fn with_endpoint<S: Into<String>>(endpoint: S) -> Result<Self> {
        let client = Client::builder().timeout(REFRESH_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Single attempt, no retries; every expected failure mode maps to a
    /// distinct `RefreshError` variant.
    pub fn refresh(&self, account: &Account) -> Result<Session, RefreshError> {
        log::info!("refreshing access token for {}", account.label);
        let body = json!({
            "grant_type": "refresh_token",
            "refresh_token": account.refresh_token,
        });
        let res = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .map_err(classify)?;
        let data: TokenResponse = res.json().map_err(classify)?;
        if let Some(code) = data.code.as_ref().and_then(error_code) {
            return Err(RefreshError::Api {
                code,
                message: data
                    .message
                    .unwrap_or_else(|| "unknown error".to_string()),
            });
        }
        let access_token = data
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or(RefreshError::MissingAccessToken)?;
        let display_name = match data.nick_name {
            Some(ref nick) if !nick.is_empty() && nick != &account.label => {
                format!("{}({})", nick, account.label)
            }
            _ => account.label.clone(),
        };
        log::info!("token refreshed for {}", display_name);
        Ok(Session {
            display_name,
            access_token,
        })
    }
}

fn classify(err: reqwest::Error) -> RefreshError {
    if err.is_timeout() {
        RefreshError::Timeout
    } else {
        RefreshError::Transport(err)
    }
}

/// The service reports errors through a `code` field that is absent, null,
/// or zero on success.
fn error_code(code: &Value) -> Option<String> {
    match code {
        Value::Null => None,
        Value::Number(n) if n.as_i64() == Some(0) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn start_server() -> (tokio::runtime::Runtime, MockServer) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let server = rt.block_on(MockServer::start());
        (rt, server)
    }

    fn account() -> Account {
        Account {
            refresh_token: "abcdefghijklmnop".to_string(),
            label: "account 1".to_string(),
        }
    }

    #[test]
    fn returns_session_with_nickname_label() {
        let (rt, server) = start_server();
        rt.block_on(
            Mock::given(method("POST"))
                .and(body_json(json!({
                    "grant_type": "refresh_token",
                    "refresh_token": "abcdefghijklmnop",
                })))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "nick_name": "alice",
                    "refresh_token": "rotated",
                    "access_token": "at-123",
                })))
                .mount(&server),
        );
        let refresher = TokenRefresher::with_endpoint(server.uri()).unwrap();
        let session = refresher.refresh(&account()).unwrap();
        assert_eq!(session.access_token, "at-123");
        assert_eq!(session.display_name, "alice(account 1)");
    }

    #[test]
    fn falls_back_to_account_label_without_nickname() {
        let (rt, server) = start_server();
        rt.block_on(
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "access_token": "at-123",
                })))
                .mount(&server),
        );
        let refresher = TokenRefresher::with_endpoint(server.uri()).unwrap();
        let session = refresher.refresh(&account()).unwrap();
        assert_eq!(session.display_name, "account 1");
    }

    #[test]
    fn rejects_response_with_error_code() {
        let (rt, server) = start_server();
        rt.block_on(
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "code": "InvalidParameter.RefreshToken",
                    "message": "refresh token is invalid",
                })))
                .mount(&server),
        );
        let refresher = TokenRefresher::with_endpoint(server.uri()).unwrap();
        let err = refresher.refresh(&account()).unwrap_err();
        match err {
            RefreshError::Api { ref code, ref message } => {
                assert_eq!(code, "InvalidParameter.RefreshToken");
                assert_eq!(message, "refresh token is invalid");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn rejects_response_without_access_token() {
        let (rt, server) = start_server();
        rt.block_on(
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "nick_name": "alice",
                })))
                .mount(&server),
        );
        let refresher = TokenRefresher::with_endpoint(server.uri()).unwrap();
        let err = refresher.refresh(&account()).unwrap_err();
        assert!(matches!(err, RefreshError::MissingAccessToken));
    }

    #[test]
    fn zero_code_is_not_an_error() {
        let (rt, server) = start_server();
        rt.block_on(
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "code": 0,
                    "access_token": "at-123",
                })))
                .mount(&server),
        );
        let refresher = TokenRefresher::with_endpoint(server.uri()).unwrap();
        assert!(refresher.refresh(&account()).is_ok());
    }
}
