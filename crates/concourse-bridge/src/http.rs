//! Shared plumbing for the upstream HTTP clients.

use std::time::Duration;

use reqwest::{Response, Url};
use serde::de::DeserializeOwned;

use crate::error::BridgeError;
use crate::Result;

const USER_AGENT: &str = concat!("canaryd/", env!("CARGO_PKG_VERSION"));

/// Bodies longer than this are cut in error messages.
const MAX_ERROR_BODY: usize = 512;

pub(crate) fn build_client(service: &'static str, timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|e| BridgeError::Transport {
            service,
            reason: e.to_string(),
        })
}

/// Parse a base URL that later path segments can be appended to.
pub(crate) fn parse_base(service: &'static str, raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| BridgeError::InvalidUrl {
        service,
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(BridgeError::InvalidUrl {
            service,
            reason: format!("{raw} cannot be a base URL"),
        });
    }
    Ok(url)
}

/// Append percent-encoded path segments to `base`.
pub(crate) fn join_segments(service: &'static str, base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    {
        let mut path = url.path_segments_mut().map_err(|()| BridgeError::InvalidUrl {
            service,
            reason: format!("{base} cannot be a base URL"),
        })?;
        path.pop_if_empty();
        path.extend(segments);
    }
    Ok(url)
}

/// Fail on transport errors and non-success statuses.
pub(crate) async fn check(
    service: &'static str,
    sent: std::result::Result<Response, reqwest::Error>,
) -> Result<Response> {
    let response = sent.map_err(|e| BridgeError::Transport {
        service,
        reason: e.to_string(),
    })?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let mut body = response.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
        let cut = (0..=MAX_ERROR_BODY)
            .rev()
            .find(|i| body.is_char_boundary(*i))
            .unwrap_or(0);
        body.truncate(cut);
    }
    Err(BridgeError::Upstream {
        service,
        status: status.as_u16(),
        body,
    })
}

pub(crate) async fn decode<T: DeserializeOwned>(
    service: &'static str,
    response: Response,
) -> Result<T> {
    let bytes = response.bytes().await.map_err(|e| BridgeError::Transport {
        service,
        reason: e.to_string(),
    })?;
    serde_json::from_slice(&bytes).map_err(|e| BridgeError::Decode {
        service,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_are_encoded_and_trailing_slash_dropped() {
        let base = parse_base("igor", "http://igor.local:8088/").unwrap();
        let url = join_segments("igor", &base, &["concourse", "ci master", "teams"]).unwrap();
        assert_eq!(url.as_str(), "http://igor.local:8088/concourse/ci%20master/teams");
    }

    #[test]
    fn base_path_is_kept() {
        let base = parse_base("orca", "http://gateway/orca").unwrap();
        let url = join_segments("orca", &base, &["concourse", "stage", "start"]).unwrap();
        assert_eq!(url.as_str(), "http://gateway/orca/concourse/stage/start");
    }

    #[test]
    fn slash_inside_segment_is_escaped() {
        let base = parse_base("igor", "http://igor").unwrap();
        let url = join_segments("igor", &base, &["teams", "a/b"]).unwrap();
        assert_eq!(url.as_str(), "http://igor/teams/a%2Fb");
    }

    #[test]
    fn unusable_base_rejected() {
        assert!(matches!(
            parse_base("igor", "not a url"),
            Err(BridgeError::InvalidUrl { .. })
        ));
        assert!(matches!(
            parse_base("igor", "mailto:ops@example.com"),
            Err(BridgeError::InvalidUrl { .. })
        ));
    }
}
