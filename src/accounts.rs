/// Minimum plausible length for a refresh token; anything at or below this
/// is treated as noise left over from copy-pasting.
const MIN_TOKEN_LEN: usize = 10;

pub struct Account {
    pub refresh_token: String,
    pub label: String,
}

/// Parses the configured token string into accounts.
///
/// Tokens are separated by `&` or newlines and may be padded with
/// whitespace. Entries that are empty or implausibly short after trimming
/// are dropped. Surviving entries are labelled "account N" by their
/// 1-based position.
pub fn parse_tokens(raw: &str) -> Vec<Account> {
    raw.split(|c| c == '&' || c == '\n')
        .map(str::trim)
        .filter(|token| token.len() > MIN_TOKEN_LEN)
        .enumerate()
        .map(|(i, token)| Account {
            refresh_token: token.to_string(),
            label: format!("account {}", i + 1),
        })
        .collect()
}
