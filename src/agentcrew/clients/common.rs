//! Helpers shared by the HTTP client wrappers.
//!
//! - a single pooled `reqwest::Client` so connections, DNS lookups and TLS sessions are
//!   reused across every agent call in the process;
//! - extraction of the back-off a throttled endpoint asks for.

use crate::client_wrapper::WaitHint;
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use std::time::Duration;

lazy_static! {
    static ref SHARED_HTTP_CLIENT: reqwest::Client = reqwest::ClientBuilder::new()
        .pool_idle_timeout(Some(Duration::from_secs(90)))
        .pool_max_idle_per_host(10)
        .tcp_keepalive(Some(Duration::from_secs(60)))
        .timeout(Duration::from_secs(300))
        .build()
        .unwrap_or_else(|err| {
            log::warn!(
                "agentcrew::clients::common: pooled HTTP client could not be built ({}), using defaults",
                err
            );
            reqwest::Client::new()
        });
    static ref TRY_AGAIN_IN: Regex = Regex::new(r"(?i)try again in\s+([0-9][0-9hms.]*)").unwrap();
    static ref DURATION_PART: Regex = Regex::new(r"(\d+(?:\.\d+)?)(ms|h|m|s)").unwrap();
}

/// The process-wide pooled HTTP client.
pub fn get_shared_http_client() -> &'static reqwest::Client {
    &SHARED_HTTP_CLIENT
}

/// Work out how long a throttled endpoint wants us to wait.
///
/// The `retry-after` header wins when present: either delta-seconds (fractions allowed) or
/// an HTTP date. Without the header the error body is searched for the
/// `"Please try again in 7.5s"` phrase used by OpenAI-compatible providers.
pub fn parse_wait_hint(retry_after: Option<&str>, body: &str) -> WaitHint {
    if let Some(raw) = retry_after {
        let raw = raw.trim();
        if let Ok(secs) = raw.parse::<f64>() {
            return match Duration::try_from_secs_f64(secs) {
                Ok(wait) => WaitHint::Suggested(wait),
                Err(_) => WaitHint::Unparseable(raw.to_string()),
            };
        }
        if let Ok(at) = DateTime::parse_from_rfc2822(raw) {
            let delta = at.with_timezone(&Utc) - Utc::now();
            return WaitHint::Suggested(delta.to_std().unwrap_or(Duration::ZERO));
        }
        return WaitHint::Unparseable(raw.to_string());
    }

    match TRY_AGAIN_IN.captures(body) {
        Some(caps) => {
            let token = caps[1].trim_end_matches('.');
            match parse_compound_duration(token) {
                Some(wait) => WaitHint::Suggested(wait),
                None => WaitHint::Unparseable(token.to_string()),
            }
        }
        None => WaitHint::Absent,
    }
}

/// Parse durations such as `1m2.5s`, `7.66s`, `250ms` or `1h`. The whole input must be
/// made of `<number><unit>` parts. Totals too large for a `Duration` yield `None`.
pub fn parse_compound_duration(text: &str) -> Option<Duration> {
    let mut consumed = 0;
    let mut total = 0f64;
    for caps in DURATION_PART.captures_iter(text) {
        let whole = caps.get(0)?;
        if whole.start() != consumed {
            return None;
        }
        consumed = whole.end();
        let value: f64 = caps[1].parse().ok()?;
        total += match &caps[2] {
            "h" => value * 3600.0,
            "m" => value * 60.0,
            "s" => value,
            "ms" => value / 1000.0,
            _ => return None,
        };
    }
    if consumed == 0 || consumed != text.len() {
        return None;
    }
    Duration::try_from_secs_f64(total).ok()
}
