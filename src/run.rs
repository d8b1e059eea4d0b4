use crate::accounts::{self, Account};
use crate::auth::{RefreshError, Session, TokenRefresher};
use crate::notify::Notifier;
use crate::report::{Outcome, Report};
use crate::signin::{CheckInClient, SignInError};
use anyhow::Result;
use chrono::Local;
use std::thread;
use std::time::Duration;

pub const REPORT_TITLE: &str = "Aliyun Drive check-in report";
pub const FAILURE_TITLE: &str = "Aliyun Drive check-in failed";

const NO_ACCOUNTS_MESSAGE: &str = "no valid refresh tokens configured; \
     supply them via --tokens or the refreshToken environment variable";

pub struct Config {
    pub tokens: String,
    /// Pause between accounts to stay under the service's rate limit.
    pub delay: Duration,
}

/// Seam between the orchestrator and the remote service, so tests can
/// substitute a fake.
pub trait DriveApi {
    fn refresh(&self, account: &Account) -> Result<Session, RefreshError>;
    fn sign_in(&self, session: &Session) -> Result<Vec<String>, SignInError>;
}

pub struct HttpApi {
    refresher: TokenRefresher,
    checkin: CheckInClient,
}

impl HttpApi {
    pub fn new() -> Result<Self> {
        Ok(Self {
            refresher: TokenRefresher::new()?,
            checkin: CheckInClient::new()?,
        })
    }
}

impl DriveApi for HttpApi {
    fn refresh(&self, account: &Account) -> Result<Session, RefreshError> {
        self.refresher.refresh(account)
    }

    fn sign_in(&self, session: &Session) -> Result<Vec<String>, SignInError> {
        self.checkin.sign_in(session)
    }
}

/// Runs the whole workflow and returns the process exit code: 0 once the
/// report went out (per-account failures allowed), 1 when no valid accounts
/// were configured.
pub fn run(config: &Config, api: &dyn DriveApi, notifier: &dyn Notifier) -> i32 {
    let started = Local::now();
    let accounts = accounts::parse_tokens(&config.tokens);
    if accounts.is_empty() {
        log::error!("no valid refresh tokens configured");
        send(notifier, FAILURE_TITLE, NO_ACCOUNTS_MESSAGE);
        return 1;
    }

    log::info!("processing {} account(s)", accounts.len());
    let mut report = Report::new(started);
    for (i, account) in accounts.iter().enumerate() {
        report.push(process_account(api, account));
        if i + 1 < accounts.len() {
            thread::sleep(config.delay);
        }
    }

    log::info!(
        "run finished: {}/{} succeeded",
        report.success_count(),
        report.total()
    );
    send(notifier, REPORT_TITLE, &report.body());
    0
}

/// Per-account errors stop here: they become a failure outcome and never
/// abort the rest of the run. A refresher failure skips the check-in.
fn process_account(api: &dyn DriveApi, account: &Account) -> Outcome {
    let session = match api.refresh(account) {
        Ok(session) => session,
        Err(err) => {
            log::error!("{}: {}", account.label, err);
            return Outcome::failure(account.label.clone(), err.to_string());
        }
    };
    match api.sign_in(&session) {
        Ok(lines) => {
            log::info!("{} processed", session.display_name);
            Outcome::success(account.label.clone(), lines)
        }
        Err(err) => {
            log::error!("{}: {}", session.display_name, err);
            Outcome::failure(account.label.clone(), err.to_string())
        }
    }
}

fn send(notifier: &dyn Notifier, title: &str, body: &str) {
    if let Err(err) = notifier.notify(title, body) {
        log::warn!("notification delivery failed: {}", err);
    }
}
