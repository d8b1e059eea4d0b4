use structopt::StructOpt;

/// A program to perform the Aliyun Drive daily check-in for one or more accounts and report the results
#[derive(StructOpt, Debug)]
#[structopt()]
pub struct Args {
    /// Long-lived refresh tokens, separated by `&` or newlines
    #[structopt(short, long, env = "refreshToken", hide_env_values = true, default_value = "")]
    pub tokens: String,

    /// Seconds to pause between accounts to avoid remote rate limiting
    #[structopt(short, long, default_value = "2")]
    pub delay_secs: u64,

    /// Webhook URL to POST the final report to as JSON {title, body}
    #[structopt(short, long, env = "NOTIFY_WEBHOOK", hide_env_values = true)]
    pub notify_url: Option<String>,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::from_args()
    }
}
