//! External identity provider used by the sign-in flow.

use async_trait::async_trait;
use engine::ExternalProfile;
use serde::Deserialize;

use crate::ServerError;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// Turns an authorization code into a verified profile.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Consent page the browser is sent to. `state` must come back unchanged
    /// on the callback.
    fn authorize_url(&self, state: &str) -> Result<String, ServerError>;

    async fn exchange_code(&self, code: &str) -> Result<ExternalProfile, ServerError>;
}

#[derive(Clone, Debug, Deserialize)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
}

pub struct GoogleProvider {
    http: reqwest::Client,
    config: GoogleConfig,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct UserInfo {
    sub: String,
    name: Option<String>,
    email: Option<String>,
}

fn upstream(err: reqwest::Error) -> ServerError {
    ServerError::Unauthorized(format!("Google authentication failed: {err}"))
}

impl GoogleProvider {
    pub fn new(config: GoogleConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn authorize_url(&self, state: &str) -> Result<String, ServerError> {
        let url = reqwest::Url::parse_with_params(
            GOOGLE_AUTH_URL,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_url.as_str()),
                ("response_type", "code"),
                ("scope", "openid email profile"),
                ("state", state),
            ],
        )
        .map_err(|err| ServerError::Generic(format!("invalid authorization url: {err}")))?;
        Ok(url.into())
    }

    async fn exchange_code(&self, code: &str) -> Result<ExternalProfile, ServerError> {
        let token: TokenResponse = self
            .http
            .post(GOOGLE_TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(upstream)?
            .json()
            .await
            .map_err(upstream)?;

        let info: UserInfo = self
            .http
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(upstream)?
            .json()
            .await
            .map_err(upstream)?;

        let email = info.email.ok_or_else(|| {
            ServerError::Unauthorized("Google account has no email address".to_string())
        })?;
        Ok(ExternalProfile {
            external_id: info.sub,
            name: info.name.unwrap_or_default(),
            email,
        })
    }
}
