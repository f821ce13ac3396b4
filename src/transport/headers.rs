//! Header and cookie construction for the chat and auth hosts.

use reqwest::header::{self, HeaderMap, HeaderValue};

use crate::config::{ACCEPT_LANGUAGE, CLEARANCE_COOKIE, SESSION_COOKIE};
use crate::error::{Error, Result};
use crate::models::Clearance;
use crate::transport::AcceptMode;

fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| Error::InvalidInput(format!("{name} contains characters not allowed in a header")))
}

/// Headers for `POST backend-api/conversation`.
pub fn conversation_headers(
    access_token: &str,
    accept: AcceptMode,
    user_agent: &str,
) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();

    headers.insert(
        header::AUTHORIZATION,
        header_value("access token", &format!("Bearer {access_token}"))?,
    );
    headers.insert(header::ACCEPT, HeaderValue::from_static(accept.as_str()));
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(header::USER_AGENT, header_value("user agent", user_agent)?);

    Ok(headers)
}

/// Headers for `GET api/auth/session`.
///
/// The clearance token and its User-Agent travel together; without a stored
/// pair the session cookie is sent alone with `fallback_user_agent`.
pub fn session_headers(
    session_token: &str,
    clearance: Option<&Clearance>,
    fallback_user_agent: &str,
    referer: &str,
) -> Result<HeaderMap> {
    let mut cookies = vec![(SESSION_COOKIE, session_token)];
    let user_agent = match clearance {
        Some(pair) => {
            cookies.push((CLEARANCE_COOKIE, pair.token.as_str()));
            pair.user_agent.as_str()
        }
        None => fallback_user_agent,
    };

    let mut headers = browser_headers(user_agent, referer)?;
    headers.insert(header::COOKIE, header_value("cookie", &cookie_header(&cookies))?);
    Ok(headers)
}

/// Headers for the clearance probe against the chat host.
pub fn clearance_probe_headers(clearance: &Clearance, referer: &str) -> Result<HeaderMap> {
    let mut headers = browser_headers(&clearance.user_agent, referer)?;
    headers.insert(
        header::COOKIE,
        header_value(
            "cookie",
            &cookie_header(&[(CLEARANCE_COOKIE, clearance.token.as_str())]),
        )?,
    );
    Ok(headers)
}

fn browser_headers(user_agent: &str, referer: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(header::USER_AGENT, header_value("user agent", user_agent)?);
    headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static(ACCEPT_LANGUAGE),
    );
    headers.insert(header::REFERER, header_value("referer", referer)?);
    Ok(headers)
}

/// Render cookies as a single `Cookie` header value: `a=1; b=2`.
pub fn cookie_header(cookies: &[(&str, &str)]) -> String {
    cookies
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Value of the last non-empty `Set-Cookie` entry named `name`.
pub fn find_set_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|raw| {
            let pair = raw.split(';').next()?.trim();
            let (k, v) = pair.split_once('=')?;
            (k.trim() == name).then(|| v.trim().trim_matches('"').to_string())
        })
        .filter(|v| !v.is_empty())
        .last()
}
