//! Hilfsfunktionen fuer Header, Cookies und Fehlerantworten

use axum::{
    extract::rejection::JsonRejection,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use serde_json::json;

use torwache_auth::{AuthError, FehlerKategorie};

use crate::rest::CookieKonfig;

/// Name des Cookies mit dem Refresh-Token
pub const REFRESH_COOKIE: &str = "refresh_token";

/// Pfad, auf den das Cookie beschraenkt ist
const COOKIE_PFAD: &str = "/v1/auth";

/// Fehlerantwort fuer REST-API
pub fn fehler_antwort(status: StatusCode, nachricht: &str, typ: &str) -> Response {
    (
        status,
        Json(json!({
            "error": {
                "code": status.as_u16(),
                "typ": typ,
                "message": nachricht
            }
        })),
    )
        .into_response()
}

/// Bildet einen Auth-Fehler auf Status und oeffentliche Meldung ab
pub fn auth_fehler_antwort(e: &AuthError) -> Response {
    if e.kategorie() == FehlerKategorie::Intern {
        tracing::error!(fehler = %e, "Interner Fehler bei Auth-Anfrage");
    }
    let status =
        StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    fehler_antwort(status, &e.oeffentliche_meldung(), e.code())
}

/// Abgelehnter JSON-Body im gleichen Fehlerformat wie alle anderen Antworten
pub fn json_ablehnung(e: JsonRejection) -> Response {
    tracing::debug!(fehler = %e.body_text(), "Ungueltiger JSON-Body");
    fehler_antwort(
        StatusCode::BAD_REQUEST,
        "Ungueltiger Anfrage-Body",
        "UNGUELTIGE_EINGABE",
    )
}

/// Extrahiert Bearer-Token aus Authorization-Header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Liest einen Cookie-Wert aus allen Cookie-Headern
pub fn cookie_wert<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .filter_map(|paar| paar.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v)
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Default, Deserialize)]
struct RefreshBody {
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Sucht das Refresh-Token: JSON-Body, dann Cookie, dann Bearer-Header
pub fn refresh_token_aus_anfrage(headers: &HeaderMap, body: &[u8]) -> Option<String> {
    let aus_body = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        serde_json::from_slice::<RefreshBody>(body)
            .ok()
            .and_then(|b| b.refresh_token)
            .filter(|t| !t.is_empty())
    };

    aus_body
        .or_else(|| cookie_wert(headers, REFRESH_COOKIE).map(str::to_string))
        .or_else(|| bearer_token(headers).map(str::to_string))
}

/// `Set-Cookie`-Wert fuer ein neues Refresh-Token
pub fn refresh_cookie_setzen(konfig: &CookieKonfig, token: &str) -> String {
    cookie_zeile(konfig, token, konfig.max_age_sek)
}

/// `Set-Cookie`-Wert, der das Refresh-Cookie loescht
pub fn refresh_cookie_loeschen(konfig: &CookieKonfig) -> String {
    cookie_zeile(konfig, "", 0)
}

fn cookie_zeile(konfig: &CookieKonfig, wert: &str, max_age: i64) -> String {
    let mut zeile = format!(
        "{REFRESH_COOKIE}={wert}; Path={COOKIE_PFAD}; Max-Age={max_age}; HttpOnly; SameSite=Strict"
    );
    if konfig.secure {
        zeile.push_str("; Secure");
    }
    zeile
}
