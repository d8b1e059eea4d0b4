use crate::auth::Session;
use anyhow::Result;
use reqwest::blocking::Client;
use reqwest::header::USER_AGENT;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

const MEMBER_BASE: &str = "https://member.aliyundrive.com";
const SIGNIN_PATH: &str = "/v1/activity/sign_in_list";
const REWARD_PATH: &str = "/v1/activity/sign_in_reward";
const CHECKIN_TIMEOUT: Duration = Duration::from_secs(10);
const CLAIM_TIMEOUT: Duration = Duration::from_secs(5);

// The check-in endpoint only answers for mobile clients.
const MOBILE_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 15_0 like Mac OS X) \
     AppleWebKit/605.1.15 (KHTML, like Gecko) Version/15.0 Mobile/15E148 Safari/604.1";

/// Check-in failure whose message already carries the per-account summary
/// trail, the failure detail, and the HTTP status code when one is known.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct SignInError(pub(crate) String);

#[derive(Deserialize)]
struct SignInResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    result: Option<SignInResult>,
}

#[derive(Deserialize, Default)]
struct SignInResult {
    #[serde(rename = "signInLogs", default)]
    sign_in_logs: Vec<SignInLog>,
    #[serde(rename = "signInCount", default)]
    sign_in_count: u32,
}

#[derive(Deserialize)]
struct SignInLog {
    #[serde(default)]
    day: u32,
    #[serde(rename = "isReward", default)]
    is_reward: bool,
    #[serde(default)]
    reward: Option<Reward>,
}

#[derive(Deserialize, Default)]
struct Reward {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Deserialize)]
struct ClaimResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    result: Option<Reward>,
}

/// Performs the daily check-in and a best-effort reward claim.
pub struct CheckInClient {
    client: Client,
    base: String,
}

impl CheckInClient {
    pub fn new() -> Result<Self> {
        Self::with_base(MEMBER_BASE)
    }

    pub fn with_base<S: Into<String>>(base: S) -> Result<Self> {
        // Timeouts differ per endpoint, so they are set per request.
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base: base.into(),
        })
    }

    /// Returns the ordered summary lines for one account. The reward claim
    /// is an independent failure domain: its errors turn into a "skipped"
    /// line instead of failing the account.
    pub fn sign_in(&self, session: &Session) -> Result<Vec<String>, SignInError> {
        let mut lines = vec![session.display_name.clone()];
        log::info!("checking in for {}", session.display_name);

        let res = self
            .client
            .post(&format!("{}{}", self.base, SIGNIN_PATH))
            .bearer_auth(&session.access_token)
            .header(USER_AGENT, MOBILE_UA)
            .timeout(CHECKIN_TIMEOUT)
            .json(&json!({ "isReward": false }))
            .send()
            .map_err(|e| failure(&lines, &e.to_string(), e.status()))?;
        let status = res.status();
        let data: SignInResponse = res
            .json()
            .map_err(|e| failure(&lines, &e.to_string(), Some(status)))?;
        if !data.success {
            let detail = data
                .message
                .unwrap_or_else(|| "unknown error".to_string());
            return Err(failure(&lines, &detail, Some(status)));
        }

        lines.push("check-in ok".to_string());
        let result = data.result.unwrap_or_default();
        lines.push(format!(
            "signed in {} days this month",
            result.sign_in_count
        ));
        if let Some(reward) = today_reward(&result) {
            lines.push(format!("today's reward: {}", reward_text(reward)));
        }

        match self.claim_reward(session, result.sign_in_count) {
            Ok(Some(reward)) => {
                lines.push(format!("reward claimed: {}", reward_text(&reward)));
            }
            Ok(None) => {}
            Err(err) => {
                log::warn!(
                    "reward claim failed for {}: {}",
                    session.display_name,
                    err
                );
                lines.push("reward claim skipped (possibly already claimed)".to_string());
            }
        }

        Ok(lines)
    }

    fn claim_reward(
        &self,
        session: &Session,
        sign_in_day: u32,
    ) -> Result<Option<Reward>, reqwest::Error> {
        let res = self
            .client
            .post(&format!("{}{}", self.base, REWARD_PATH))
            .bearer_auth(&session.access_token)
            .timeout(CLAIM_TIMEOUT)
            .json(&json!({ "signInDay": sign_in_day }))
            .send()?
            .error_for_status()?;
        let data: ClaimResponse = res.json()?;
        if data.success {
            Ok(data.result)
        } else {
            Ok(None)
        }
    }
}

/// The entry whose day equals the cumulative count is today's log entry.
fn today_reward(result: &SignInResult) -> Option<&Reward> {
    result
        .sign_in_logs
        .iter()
        .find(|log| log.day == result.sign_in_count)
        .filter(|log| log.is_reward)
        .and_then(|log| log.reward.as_ref())
}

fn reward_text(reward: &Reward) -> String {
    format!(
        "{}{}",
        reward.name.as_deref().unwrap_or(""),
        reward.description.as_deref().unwrap_or("")
    )
}

fn failure(lines: &[String], detail: &str, status: Option<StatusCode>) -> SignInError {
    let mut all = lines.to_vec();
    all.push("check-in failed".to_string());
    all.push(format!("error: {}", detail));
    if let Some(status) = status {
        all.push(format!("status code: {}", status.as_u16()));
    }
    SignInError(all.join(" | "))
}
