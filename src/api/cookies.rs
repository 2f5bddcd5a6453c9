use axum::http::{header, HeaderMap, HeaderValue};

use crate::core::config::Settings;

pub(crate) fn session_cookie(token: &str, settings: &Settings) -> Option<HeaderValue> {
    let max_age = settings.security().access_token_expire_minutes * 60;
    build(token, max_age, settings)
}

pub(crate) fn clear_session_cookie(settings: &Settings) -> Option<HeaderValue> {
    build("", 0, settings)
}

fn build(value: &str, max_age: u64, settings: &Settings) -> Option<HeaderValue> {
    let name = &settings.security().cookie_name;
    let mut cookie = format!("{name}={value}; Path=/; Max-Age={max_age}; HttpOnly");
    if max_age == 0 {
        cookie.push_str("; Expires=Thu, 01 Jan 1970 00:00:00 GMT");
    }
    if settings.runtime().environment.is_production() {
        cookie.push_str("; Secure; SameSite=None");
    } else {
        cookie.push_str("; SameSite=Strict");
    }

    HeaderValue::from_str(&cookie).ok()
}

pub(crate) fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}
