//! Small helpers shared by the upstream clients.

use anyhow::{Context, Result, anyhow};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Build a client with a bounded total request timeout.
pub(crate) fn client_with_timeout(timeout: Duration, user_agent: Option<&str>) -> Result<Client> {
    let mut builder = Client::builder().timeout(timeout);
    if let Some(agent) = user_agent {
        builder = builder.user_agent(agent.to_owned());
    }
    builder.build().context("Failed to build HTTP client")
}

/// Read the body, fail on a non-success status, and decode JSON.
pub(crate) async fn decode_json<T: DeserializeOwned>(res: Response, upstream: &str) -> Result<T> {
    let status = res.status();
    let body = res
        .text()
        .await
        .with_context(|| format!("Failed to read {upstream} response body"))?;

    if !status.is_success() {
        return Err(anyhow!(
            "{upstream} request failed with status {}: {}",
            status,
            truncate_body(&body),
        ));
    }

    serde_json::from_str(&body).with_context(|| format!("Failed to parse {upstream} JSON"))
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body.to_string();
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_body_is_kept() {
        assert_eq!(truncate_body("not found"), "not found");
    }

    #[test]
    fn long_body_is_cut_on_char_boundary() {
        let body = "é".repeat(150);
        let cut = truncate_body(&body);

        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), 100 + 3);
    }
}
