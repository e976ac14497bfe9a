//! Session tokens, the auth middleware and the sign-in endpoints.

use api_types::{
    ApiResponse,
    user::{UserRole as ApiRole, UserView},
};
use axum::{
    Extension, Json,
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{Duration, Utc};
use engine::{EngineError, User, UserRole};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ServerError, extract::ApiQuery, server::ServerState};

pub const SESSION_COOKIE: &str = "fintrack_session";
const STATE_COOKIE: &str = "fintrack_oauth_state";
const STATE_TTL_MINUTES: i64 = 10;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// Signs and verifies the HS256 session tokens.
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenKeys {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user_id: Uuid) -> Result<String, ServerError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|err| ServerError::Generic(format!("failed to sign token: {err}")))
    }

    /// Returns the user id carried by a valid, unexpired token.
    pub fn verify(&self, token: &str) -> Result<Uuid, ServerError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|err| {
            tracing::warn!("rejected token: {err}");
            ServerError::Unauthorized("Invalid or expired token".to_string())
        })?;
        Uuid::parse_str(&data.claims.sub)
            .map_err(|_| ServerError::Unauthorized("Invalid or expired token".to_string()))
    }
}

fn bearer_token(request: &Request) -> Option<String> {
    let header = request.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Resolves the caller from the bearer header or the session cookie and
/// stores the [`User`] in the request extensions.
pub(crate) async fn require_user(
    State(state): State<ServerState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let token = bearer_token(&request)
        .or_else(|| jar.get(SESSION_COOKIE).map(|c| c.value().to_string()))
        .ok_or_else(|| ServerError::Unauthorized("Access token required".to_string()))?;

    let user_id = state.tokens.verify(&token)?;
    let user = match state.engine.user(user_id).await {
        Ok(user) => user,
        Err(EngineError::KeyNotFound(_)) => {
            return Err(ServerError::Unauthorized("User not found".to_string()));
        }
        Err(err) => return Err(err.into()),
    };

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

pub(crate) fn user_view(user: &User) -> UserView {
    UserView {
        id: user.id,
        name: user.name.clone(),
        email: user.email.clone(),
        role: match user.role {
            UserRole::User => ApiRole::User,
            UserRole::Admin => ApiRole::Admin,
        },
    }
}

fn session_cookie(token: String, ttl: Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::seconds(ttl.num_seconds()))
        .build()
}

fn login_redirect(client_url: &str, params: &[(&str, &str)]) -> Redirect {
    let base = format!("{}/login", client_url.trim_end_matches('/'));
    match reqwest::Url::parse_with_params(&base, params) {
        Ok(url) => Redirect::to(url.as_str()),
        Err(err) => {
            tracing::error!("invalid client url {client_url}: {err}");
            Redirect::to("/")
        }
    }
}

/// Sends the browser to the provider's consent page.
pub async fn google_login(
    State(state): State<ServerState>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), ServerError> {
    let csrf = Uuid::new_v4().simple().to_string();
    let url = state.identity.authorize_url(&csrf)?;
    let cookie = Cookie::build((STATE_COOKIE, csrf))
        .http_only(true)
        .secure(state.secure_cookies)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::minutes(STATE_TTL_MINUTES));

    Ok((jar.add(cookie), Redirect::to(&url)))
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

async fn complete_sign_in(
    state: &ServerState,
    expected_state: Option<&str>,
    params: CallbackParams,
) -> Result<(User, String), ServerError> {
    if let Some(error) = params.error {
        return Err(ServerError::Unauthorized(format!(
            "Google sign-in failed: {error}"
        )));
    }
    let code = params
        .code
        .ok_or_else(|| ServerError::Unauthorized("Missing authorization code".to_string()))?;
    if expected_state.is_none() || params.state.as_deref() != expected_state {
        return Err(ServerError::Unauthorized("Invalid OAuth state".to_string()));
    }

    let profile = state.identity.exchange_code(&code).await?;
    let user = state.engine.sign_in_external(profile).await?;
    let token = state.tokens.issue(user.id)?;
    Ok((user, token))
}

/// Finishes the sign-in and hands the session back to the client app.
///
/// Failures never surface as HTTP errors; the client login page receives an
/// `error` parameter instead.
pub async fn google_callback(
    State(state): State<ServerState>,
    jar: CookieJar,
    ApiQuery(params): ApiQuery<CallbackParams>,
) -> (CookieJar, Redirect) {
    let expected = jar.get(STATE_COOKIE).map(|c| c.value().to_string());
    let jar = jar.remove(Cookie::build(STATE_COOKIE).path("/"));

    let signed_in = complete_sign_in(&state, expected.as_deref(), params).await;
    let payload = signed_in.and_then(|(user, token)| {
        serde_json::to_string(&user_view(&user))
            .map(|json| (user, token, json))
            .map_err(|err| ServerError::Generic(format!("failed to encode user: {err}")))
    });

    match payload {
        Ok((user, token, user_json)) => {
            tracing::info!(user_id = %user.id, "user signed in");
            let jar = jar.add(session_cookie(
                token.clone(),
                state.tokens.ttl(),
                state.secure_cookies,
            ));
            let redirect = login_redirect(
                &state.client_url,
                &[("token", token.as_str()), ("user", user_json.as_str())],
            );
            (jar, redirect)
        }
        Err(err) => {
            let message = err.to_string();
            tracing::warn!("sign-in failed: {message}");
            (
                jar,
                login_redirect(&state.client_url, &[("error", message.as_str())]),
            )
        }
    }
}

pub async fn me(Extension(user): Extension<User>) -> Json<ApiResponse<UserView>> {
    Json(ApiResponse::ok(user_view(&user)))
}

pub async fn logout(jar: CookieJar) -> (CookieJar, Json<ApiResponse<()>>) {
    (
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        Json(ApiResponse::message("Logout successful")),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies() {
        let keys = TokenKeys::new(b"test-secret", Duration::days(30));
        let user_id = Uuid::new_v4();
        let token = keys.issue(user_id).unwrap();
        assert_eq!(keys.verify(&token).unwrap(), user_id);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let keys = TokenKeys::new(b"test-secret", Duration::days(30));
        let other = TokenKeys::new(b"other-secret", Duration::days(30));
        let token = other.issue(Uuid::new_v4()).unwrap();
        assert!(matches!(
            keys.verify(&token),
            Err(ServerError::Unauthorized(_))
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = TokenKeys::new(b"test-secret", Duration::days(-1));
        let token = keys.issue(Uuid::new_v4()).unwrap();
        assert!(matches!(
            keys.verify(&token),
            Err(ServerError::Unauthorized(_))
        ));
    }
}
