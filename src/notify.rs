use anyhow::Result;
use reqwest::blocking::Client;
use serde_json::json;
use std::time::Duration;

const NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Delivery sink for the end-of-run report. Delivery failures are never
/// fatal to a run; callers log and move on.
pub trait Notifier {
    fn notify(&self, title: &str, body: &str) -> Result<()>;
}

/// Default sink: writes the report to the log.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, body: &str) -> Result<()> {
        log::info!("[{}]\n{}", title, body);
        Ok(())
    }
}

/// Posts the report as JSON to a user-supplied webhook, and also logs it so
/// the run remains observable when the webhook is down.
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new<S: Into<String>>(url: S) -> Result<Self> {
        let client = Client::builder().timeout(NOTIFY_TIMEOUT).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl Notifier for WebhookNotifier {
    fn notify(&self, title: &str, body: &str) -> Result<()> {
        log::info!("[{}]\n{}", title, body);
        self.client
            .post(&self.url)
            .json(&json!({ "title": title, "body": body }))
            .send()?
            .error_for_status()?;
        Ok(())
    }
}
