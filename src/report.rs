use chrono::{DateTime, Local};

/// Result of processing one account. Exactly one is recorded per loaded
/// account, in load order.
pub struct Outcome {
    pub label: String,
    pub success: bool,
    pub lines: Vec<String>,
}

impl Outcome {
    pub fn success(label: String, lines: Vec<String>) -> Self {
        Self {
            label,
            success: true,
            lines,
        }
    }

    pub fn failure(label: String, error: String) -> Self {
        Self {
            label,
            success: false,
            lines: vec![error],
        }
    }
}

pub struct Report {
    started: DateTime<Local>,
    outcomes: Vec<Outcome>,
}

impl Report {
    pub fn new(started: DateTime<Local>) -> Self {
        Self {
            started,
            outcomes: Vec::new(),
        }
    }

    pub fn push(&mut self, outcome: Outcome) {
        self.outcomes.push(outcome);
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.success).count()
    }

    pub fn failure_count(&self) -> usize {
        self.total() - self.success_count()
    }

    pub fn body(&self) -> String {
        let mut out = vec![
            format!("run started: {}", self.started.format("%Y-%m-%d %H:%M:%S")),
            format!("accounts processed: {}", self.total()),
            format!("succeeded: {}", self.success_count()),
            format!("failed: {}", self.failure_count()),
            String::new(),
            "details:".to_string(),
        ];
        for outcome in &self.outcomes {
            if outcome.success {
                out.push(outcome.lines.join(" | "));
            } else {
                out.push(format!("{} failed: {}", outcome.label, outcome.lines.join(" | ")));
            }
        }
        out.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report_with(outcomes: Vec<Outcome>) -> Report {
        let mut report = Report::new(Local::now());
        for outcome in outcomes {
            report.push(outcome);
        }
        report
    }

    #[test]
    fn counts_add_up() {
        let report = report_with(vec![
            Outcome::success("account 1".to_string(), vec!["ok".to_string()]),
            Outcome::failure("account 2".to_string(), "boom".to_string()),
            Outcome::success("account 3".to_string(), vec!["ok".to_string()]),
        ]);
        assert_eq!(report.total(), 3);
        assert_eq!(report.success_count() + report.failure_count(), 3);
        assert_eq!(report.failure_count(), 1);
    }

    #[test]
    fn body_lists_outcomes_in_order() {
        let report = report_with(vec![
            Outcome::success(
                "account 1".to_string(),
                vec!["alice".to_string(), "check-in ok".to_string()],
            ),
            Outcome::failure("account 2".to_string(), "token refresh timed out".to_string()),
        ]);
        let body = report.body();
        assert!(body.contains("accounts processed: 2"));
        assert!(body.contains("succeeded: 1"));
        assert!(body.contains("failed: 1"));
        let first = body.find("alice | check-in ok").unwrap();
        let second = body.find("account 2 failed: token refresh timed out").unwrap();
        assert!(first < second);
    }
}
