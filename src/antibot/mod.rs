//! Anti-bot Detector: a fixed-order chain of stateless heuristics run against
//! a fetch response. The first detector to match wins; none of them inspect
//! the others' state, so the chain is cheap to extend.

use std::collections::HashMap;

/// What kind of bot defense a response appears to be throwing up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AntiBotSignal {
    Captcha,
    RateLimit,
    IpBlock,
    JsChallenge,
    CookieTracking,
    UserAgent,
    RequestDelay,
}

/// The response surface the detector chain inspects. Header lookups are
/// case-insensitive by construction of the caller's header map.
pub struct ResponseSnapshot<'a> {
    pub status: u16,
    pub headers: &'a HashMap<String, String>,
    pub set_cookie_count: usize,
    pub body: &'a str,
}

const CAPTCHA_MARKERS: &[&str] = &[
    "captcha",
    "recaptcha",
    "h-captcha",
    "hcaptcha",
    "captcha-delivery",
    "are you a robot",
    "验证码",
    "人机验证",
];
const IP_BLOCK_MARKERS: &[&str] = &["your ip has been blocked", "access denied", "ip address has been banned"];
const JS_CHALLENGE_MARKERS: &[&str] = &["challenge-form", "checking your browser", "jschl_vc", "cf-browser-verification"];
const TRACKING_COOKIE_NAMES: &[&str] = &[
    "_ga", "_gid", "_fbp", "_gcl", "__cf", "amplitude", "mixpanel", "optimizely", "hubspot", "segment", "_hj",
];
const UA_REJECTION_MARKERS: &[&str] = &["user agent not allowed", "unsupported browser", "bot detected", "automated request"];
const REQUEST_DELAY_MARKERS: &[&str] = &["please slow down", "request throttled", "too many requests in a short time"];

/// Runs the fixed-order detector chain and returns the first match, if any.
pub fn detect(response: &ResponseSnapshot) -> Option<AntiBotSignal> {
    detect_captcha(response)
        .or_else(|| detect_rate_limit(response))
        .or_else(|| detect_ip_block(response))
        .or_else(|| detect_js_challenge(response))
        .or_else(|| detect_cookie_tracking(response))
        .or_else(|| detect_user_agent(response))
        .or_else(|| detect_request_delay(response))
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    let lower = haystack.to_lowercase();
    needles.iter().any(|n| lower.contains(n))
}

fn header<'a>(response: &ResponseSnapshot<'a>, name: &str) -> Option<&'a str> {
    response
        .headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

fn detect_captcha(response: &ResponseSnapshot) -> Option<AntiBotSignal> {
    contains_any(response.body, CAPTCHA_MARKERS).then_some(AntiBotSignal::Captcha)
}

fn detect_rate_limit(response: &ResponseSnapshot) -> Option<AntiBotSignal> {
    (response.status == 429 && header(response, "retry-after").is_some()).then_some(AntiBotSignal::RateLimit)
}

fn detect_ip_block(response: &ResponseSnapshot) -> Option<AntiBotSignal> {
    (response.status == 403 && contains_any(response.body, IP_BLOCK_MARKERS)).then_some(AntiBotSignal::IpBlock)
}

fn detect_js_challenge(response: &ResponseSnapshot) -> Option<AntiBotSignal> {
    contains_any(response.body, JS_CHALLENGE_MARKERS).then_some(AntiBotSignal::JsChallenge)
}

fn detect_cookie_tracking(response: &ResponseSnapshot) -> Option<AntiBotSignal> {
    if response.set_cookie_count <= 10 {
        return None;
    }
    let matches = TRACKING_COOKIE_NAMES
        .iter()
        .filter(|name| response.body.to_lowercase().contains(&name.to_lowercase()))
        .count();
    (matches > 5).then_some(AntiBotSignal::CookieTracking)
}

fn detect_user_agent(response: &ResponseSnapshot) -> Option<AntiBotSignal> {
    (response.status == 403 && contains_any(response.body, UA_REJECTION_MARKERS)).then_some(AntiBotSignal::UserAgent)
}

fn detect_request_delay(response: &ResponseSnapshot) -> Option<AntiBotSignal> {
    contains_any(response.body, REQUEST_DELAY_MARKERS).then_some(AntiBotSignal::RequestDelay)
}
