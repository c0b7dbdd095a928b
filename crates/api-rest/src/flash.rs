//! One-shot flash notices carried across a redirect.
//!
//! A write action answers with a redirect whose response sets the flash cookie. The next page
//! render reads the notice, shows it once, and clears the cookie in its own response. The
//! cookie value is a single form-urlencoded pair, `<kind>=<text>`, so it never contains
//! characters that are illegal in a cookie.

use axum::http::{header, HeaderMap, HeaderValue};
use rxstatus_core::{Notice, NoticeKind};
use url::form_urlencoded;

pub const FLASH_COOKIE: &str = "rxstatus_flash";

/// `Set-Cookie` value that removes the flash cookie.
pub const CLEARED_COOKIE: &str = "rxstatus_flash=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax";

/// Encode a notice as a `Set-Cookie` header value.
pub fn set_cookie(notice: &Notice) -> Option<HeaderValue> {
    let value = form_urlencoded::Serializer::new(String::new())
        .append_pair(notice.kind.as_str(), &notice.text)
        .finish();
    HeaderValue::from_str(&format!(
        "{FLASH_COOKIE}={value}; Path=/; HttpOnly; SameSite=Lax"
    ))
    .ok()
}

/// Read the flash notice from the request's cookies, if one is present and well-formed.
pub fn take(headers: &HeaderMap) -> Option<Notice> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == FLASH_COOKIE)
        .and_then(|(_, value)| decode(value))
}

fn decode(value: &str) -> Option<Notice> {
    let (kind, text) = form_urlencoded::parse(value.as_bytes()).next()?;
    let kind = NoticeKind::parse(&kind)?;
    Some(Notice {
        kind,
        text: text.into_owned(),
    })
}

/// Whether the request carries a flash cookie, well-formed or not.
pub fn present(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .any(|pair| pair.trim().starts_with(&format!("{FLASH_COOKIE}=")))
}
