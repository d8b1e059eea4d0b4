#![warn(clippy::pedantic)]

mod accounts;
mod auth;
mod cli;
mod notify;
mod report;
mod run;
mod signin;

use anyhow::{Context, Result};
use notify::{LogNotifier, Notifier, WebhookNotifier};
use run::{Config, HttpApi};
use std::process;
use std::time::Duration;

fn main() {
    env_logger::init();
    let args = cli::Args::parse_args();
    let notifier = build_notifier(args.notify_url.as_deref());
    match try_run(&args, notifier.as_ref()) {
        Ok(code) => process::exit(code),
        Err(err) => {
            log::error!("run aborted: {:#}", err);
            let body = format!("unexpected failure:\n{:#}", err);
            if let Err(notify_err) = notifier.notify(run::FAILURE_TITLE, &body) {
                log::warn!("notification delivery failed: {}", notify_err);
            }
            process::exit(1);
        }
    }
}

fn try_run(args: &cli::Args, notifier: &dyn Notifier) -> Result<i32> {
    let api = HttpApi::new().with_context(|| "Error creating API clients")?;
    let config = Config {
        tokens: args.tokens.clone(),
        delay: Duration::from_secs(args.delay_secs),
    };
    Ok(run::run(&config, &api, notifier))
}

fn build_notifier(url: Option<&str>) -> Box<dyn Notifier> {
    match url {
        Some(url) => match WebhookNotifier::new(url) {
            Ok(notifier) => Box::new(notifier),
            Err(err) => {
                log::warn!("could not build webhook notifier, logging only: {}", err);
                Box::new(LogNotifier)
            }
        },
        None => Box::new(LogNotifier),
    }
}
