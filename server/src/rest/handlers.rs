//! REST-Handler fuer die Auth-Endpunkte

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use serde_json::json;

use torwache_auth::{AuthError, BerechtigungsKatalog, Registrierung};

use crate::rest::middleware::{
    auth_fehler_antwort, bearer_token, fehler_antwort, json_ablehnung, refresh_cookie_loeschen,
    refresh_cookie_setzen, refresh_token_aus_anfrage,
};
use crate::rest::AppState;

/// GET /health – Health-Check-Endpunkt
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

/// GET /v1/permissions – der feste Berechtigungskatalog
pub async fn permissions() -> impl IntoResponse {
    let eintraege: Vec<_> = BerechtigungsKatalog::global()
        .eintraege()
        .map(|(b, beschreibung)| json!({ "name": b, "beschreibung": beschreibung }))
        .collect();
    Json(json!({ "permissions": eintraege }))
}

/// Body von POST /v1/auth/register. Eine Rolle kann hier nicht gewaehlt
/// werden, neue Konten sind immer Standard-Benutzer.
#[derive(Deserialize)]
pub struct RegistrierungsBody {
    pub name: String,
    pub email: String,
    #[serde(alias = "password")]
    pub passwort: String,
}

/// POST /v1/auth/register
pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegistrierungsBody>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return json_ablehnung(e),
    };
    let daten = Registrierung {
        name: body.name,
        email: body.email,
        passwort: body.passwort,
        rolle: None,
    };
    match state.auth.registrieren(daten).await {
        Ok(benutzer) => (StatusCode::CREATED, Json(benutzer)).into_response(),
        Err(e) => auth_fehler_antwort(&e),
    }
}

#[derive(Deserialize)]
pub struct AnmeldeBody {
    pub email: String,
    #[serde(alias = "password")]
    pub passwort: String,
}

/// POST /v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<AnmeldeBody>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return json_ablehnung(e),
    };
    match state.auth.anmelden(&body.email, &body.passwort).await {
        Ok(paar) => {
            let cookie = refresh_cookie_setzen(&state.cookie, &paar.refresh_token);
            (StatusCode::OK, [(header::SET_COOKIE, cookie)], Json(paar)).into_response()
        }
        Err(e) => auth_fehler_antwort(&e),
    }
}

/// POST /v1/auth/refresh
pub async fn refresh(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let Some(token) = refresh_token_aus_anfrage(&headers, &body) else {
        return fehler_antwort(
            StatusCode::BAD_REQUEST,
            "Refresh-Token fehlt",
            "UNGUELTIGE_EINGABE",
        );
    };

    match state.auth.token_erneuern(&token).await {
        Ok(paar) => {
            let cookie = refresh_cookie_setzen(&state.cookie, &paar.refresh_token);
            (StatusCode::OK, [(header::SET_COOKIE, cookie)], Json(paar)).into_response()
        }
        Err(e) => auth_fehler_antwort(&e),
    }
}

/// POST /v1/auth/logout
pub async fn logout(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let Some(token) = refresh_token_aus_anfrage(&headers, &body) else {
        return fehler_antwort(
            StatusCode::BAD_REQUEST,
            "Refresh-Token fehlt",
            "UNGUELTIGE_EINGABE",
        );
    };

    match state.auth.abmelden(&token).await {
        Ok(()) => (
            StatusCode::OK,
            [(header::SET_COOKIE, refresh_cookie_loeschen(&state.cookie))],
            Json(json!({ "message": "Abgemeldet" })),
        )
            .into_response(),
        Err(e) => auth_fehler_antwort(&e),
    }
}

/// POST /v1/auth/logout-all – erfordert ein gueltiges Zugriffstoken
pub async fn logout_all(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(token) = bearer_token(&headers) else {
        return fehler_antwort(
            StatusCode::UNAUTHORIZED,
            "Authorization-Header fehlt",
            "ZUGRIFFSTOKEN_UNGUELTIG",
        );
    };

    let user_id = match state
        .auth
        .zugriffstoken_pruefen(token)
        .and_then(|claims| claims.user_id())
    {
        Ok(id) => id,
        Err(e) => return auth_fehler_antwort(&e),
    };

    match state.auth.ueberall_abmelden(user_id).await {
        Ok(_) => (
            StatusCode::NO_CONTENT,
            [(header::SET_COOKIE, refresh_cookie_loeschen(&state.cookie))],
        )
            .into_response(),
        // Benutzer seit Ausstellung des Tokens geloescht
        Err(AuthError::BenutzerNichtGefunden(_)) => fehler_antwort(
            StatusCode::UNAUTHORIZED,
            "Zugriffstoken ungueltig oder abgelaufen",
            "ZUGRIFFSTOKEN_UNGUELTIG",
        ),
        Err(e) => auth_fehler_antwort(&e),
    }
}
