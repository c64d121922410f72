//! Single-attempt page fetch: redirect following, header construction,
//! charset decoding, and anti-bot detection.
//!
//! Retry policy lives one level up in [`crate::engine`] -- a retry needs to
//! rotate the proxy and re-consult the delay manager between attempts, which
//! this module has no business knowing about. This is a direct generalization
//! of the source crawler's single-client fetch loop, split so the retry
//! bookkeeping is the engine's job and the wire mechanics are this module's.

use crate::antibot::{self, AntiBotSignal, ResponseSnapshot};
use reqwest::{Client, Response};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use url::Url;

const MAX_REDIRECTS: usize = 10;
const META_CHARSET_SCAN_BYTES: usize = 1024;

/// Outcome of a single fetch attempt, pre-retry-classification.
pub enum FetchOutcome {
    Success {
        final_url: Url,
        status_code: u16,
        content_type: String,
        body: String,
    },
    AntiBot {
        signal: AntiBotSignal,
        status_code: u16,
        retry_after: Option<Duration>,
    },
    HttpError {
        status_code: u16,
        retry_after: Option<Duration>,
    },
    TooManyRedirects,
    RedirectLoop,
    Network(String),
    Timeout,
}

/// Builds the header set a polite crawler sends on every request: a rotated
/// `User-Agent` (supplied by the caller, which owns rotation), `Accept`,
/// `Accept-Language`, cache-busting, and an upgrade-insecure-requests hint.
/// A `Referer` is only attached when the caller actually has one.
fn build_headers(user_agent: &str, referrer: Option<&str>) -> reqwest::header::HeaderMap {
    use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(user_agent) {
        headers.insert(reqwest::header::USER_AGENT, value);
    }
    headers.insert(
        reqwest::header::ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(
        reqwest::header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.9"),
    );
    headers.insert(reqwest::header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    if let Ok(name) = HeaderName::from_bytes(b"Upgrade-Insecure-Requests") {
        headers.insert(name, HeaderValue::from_static("1"));
    }
    if let Some(referrer) = referrer {
        if let Ok(value) = HeaderValue::from_str(referrer) {
            headers.insert(reqwest::header::REFERER, value);
        }
    }
    headers
}

fn headers_to_map(response: &Response) -> HashMap<String, String> {
    response
        .headers()
        .iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
        .collect()
}

/// Fetches `url`, following redirects manually (the client is built with
/// `redirect::Policy::none()`) up to [`MAX_REDIRECTS`] hops, bailing out on a
/// cycle. Charset decoding follows a four-tier precedence: the `Content-Type`
/// charset parameter, a byte-order-mark, a `<meta charset>` tag in the first
/// kilobyte of the body, and finally UTF-8 as the default.
pub async fn fetch(client: &Client, url: &Url, user_agent: &str, referrer: Option<&str>) -> FetchOutcome {
    let mut visited = HashSet::new();
    fetch_inner(client, url.clone(), user_agent, referrer, &mut visited, 0).await
}

fn fetch_inner<'a>(
    client: &'a Client,
    url: Url,
    user_agent: &'a str,
    referrer: Option<&'a str>,
    visited: &'a mut HashSet<String>,
    depth: usize,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = FetchOutcome> + Send + 'a>> {
    Box::pin(async move {
        if depth > MAX_REDIRECTS {
            return FetchOutcome::TooManyRedirects;
        }
        if !visited.insert(url.to_string()) {
            return FetchOutcome::RedirectLoop;
        }

        let headers = build_headers(user_agent, referrer);
        let response = match client.get(url.clone()).headers(headers).send().await {
            Ok(response) => response,
            Err(err) if err.is_timeout() => return FetchOutcome::Timeout,
            Err(err) => return FetchOutcome::Network(err.to_string()),
        };

        let status = response.status();
        if status.is_redirection() {
            let location = response
                .headers()
                .get(reqwest::header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|loc| url.join(loc).ok());

            return match location {
                Some(next) => fetch_inner(client, next, user_agent, referrer, visited, depth + 1).await,
                None => FetchOutcome::HttpError {
                    status_code: status.as_u16(),
                    retry_after: None,
                },
            };
        }

        let status_code = status.as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let headers_map = headers_to_map(&response);
        let set_cookie_count = response.headers().get_all(reqwest::header::SET_COOKIE).iter().count();

        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(err) if err.is_timeout() => return FetchOutcome::Timeout,
            Err(err) => return FetchOutcome::Network(err.to_string()),
        };
        let body = decode_body(&bytes, &content_type);

        let retry_after = headers_map
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("retry-after"))
            .and_then(|(_, v)| crate::retry::parse_retry_after(v));

        let snapshot = ResponseSnapshot {
            status: status_code,
            headers: &headers_map,
            set_cookie_count,
            body: &body,
        };
        if let Some(signal) = antibot::detect(&snapshot) {
            return FetchOutcome::AntiBot {
                signal,
                status_code,
                retry_after,
            };
        }

        if status.is_success() {
            return FetchOutcome::Success {
                final_url: url,
                status_code,
                content_type,
                body,
            };
        }

        FetchOutcome::HttpError { status_code, retry_after }
    })
}

/// Decodes a response body according to the four-tier charset precedence.
/// Anything other than UTF-8 falls back to a lossy UTF-8 decode rather than
/// a full transcode, since downstream processing only ever needs text, not
/// byte-exact fidelity.
fn decode_body(bytes: &[u8], content_type: &str) -> String {
    if let Some(charset) = charset_from_content_type(content_type) {
        if let Some(decoded) = decode_with_label(bytes, &charset) {
            return decoded;
        }
    }
    if let Some(decoded) = decode_with_bom(bytes) {
        return decoded;
    }
    if let Some(charset) = charset_from_meta_tag(bytes) {
        if let Some(decoded) = decode_with_label(bytes, &charset) {
            return decoded;
        }
    }
    String::from_utf8_lossy(bytes).into_owned()
}

fn charset_from_content_type(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("charset="))
        .map(|c| c.trim_matches('"').to_string())
}

fn decode_with_bom(bytes: &[u8]) -> Option<String> {
    let (encoding, bom_len) = encoding_rs::Encoding::for_bom(bytes)?;
    let (decoded, _, _) = encoding.decode(&bytes[bom_len..]);
    Some(decoded.into_owned())
}

fn charset_from_meta_tag(bytes: &[u8]) -> Option<String> {
    let scan_len = bytes.len().min(META_CHARSET_SCAN_BYTES);
    let prefix = String::from_utf8_lossy(&bytes[..scan_len]);
    let lower = prefix.to_ascii_lowercase();
    let marker = "charset=";
    let idx = lower.find(marker)?;
    let rest = &prefix[idx + marker.len()..];
    let value: String = rest
        .trim_start_matches(['"', '\''])
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn decode_with_label(bytes: &[u8], label: &str) -> Option<String> {
    let encoding = encoding_rs::Encoding::for_label(label.as_bytes())?;
    let (decoded, _, had_errors) = encoding.decode(bytes);
    if had_errors && encoding != encoding_rs::UTF_8 {
        None
    } else {
        Some(decoded.into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charset_parsed_from_content_type_parameter() {
        assert_eq!(
            charset_from_content_type("text/html; charset=iso-8859-1"),
            Some("iso-8859-1".to_string())
        );
        assert_eq!(charset_from_content_type("text/html"), None);
    }

    #[test]
    fn charset_parsed_from_meta_tag() {
        let html = b"<html><head><meta charset=\"windows-1252\"></head></html>";
        assert_eq!(charset_from_meta_tag(html), Some("windows-1252".to_string()));
    }

    #[test]
    fn meta_tag_scan_ignores_declarations_past_the_scan_window() {
        let mut body = vec![b' '; META_CHARSET_SCAN_BYTES + 10];
        body.extend_from_slice(b"<meta charset=\"shift_jis\">");
        assert_eq!(charset_from_meta_tag(&body), None);
    }

    #[test]
    fn decode_defaults_to_utf8_lossy_with_no_hints() {
        let body = decode_body("hello world".as_bytes(), "");
        assert_eq!(body, "hello world");
    }

    #[test]
    fn decode_uses_declared_charset() {
        let (bytes, _, _) = encoding_rs::WINDOWS_1252.encode("café");
        let body = decode_body(&bytes, "text/html; charset=windows-1252");
        assert_eq!(body, "café");
    }

    #[test]
    fn decode_prefers_bom_over_meta_when_content_type_is_silent() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice("hello".as_bytes());
        let body = decode_body(&bytes, "");
        assert_eq!(body, "hello");
    }

    #[test]
    fn headers_built_with_expected_defaults() {
        let headers = build_headers("ripcrawl-test/1.0", None);
        assert_eq!(headers.get(reqwest::header::USER_AGENT).unwrap(), "ripcrawl-test/1.0");
        assert!(headers.contains_key(reqwest::header::ACCEPT));
        assert!(headers.contains_key(reqwest::header::ACCEPT_LANGUAGE));
        assert!(!headers.contains_key(reqwest::header::REFERER));
    }

    #[test]
    fn headers_include_referer_when_present() {
        let headers = build_headers("ripcrawl-test/1.0", Some("https://example.com/"));
        assert_eq!(headers.get(reqwest::header::REFERER).unwrap(), "https://example.com/");
    }
}
