//! Google OAuth2 helpers for the Blogger API.
//!
//! Two flows are supported:
//! - **Refresh**: exchange the long-lived refresh token for an access token
//!   before each publish ([`refresh_access_token`])
//! - **Bootstrap**: the interactive `auth` subcommand that prints a consent URL,
//!   reads the returned code from stdin and prints the refresh token to store
//!   in `.env` ([`run_bootstrap`])

use serde::Deserialize;
use std::fmt;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, instrument};
use url::Url;

use crate::api::{ApiError, read_success_body};

pub const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const BLOGGER_SCOPE: &str = "https://www.googleapis.com/auth/blogger";
pub const REDIRECT_URI: &str = "http://localhost:3000/oauth2callback";

/// OAuth client registration.
#[derive(Clone)]
pub struct OAuthClient {
    pub client_id: String,
    pub client_secret: String,
    pub token_url: String,
}

impl fmt::Debug for OAuthClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthClient")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("token_url", &self.token_url)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Consent URL requesting offline access so that a refresh token is issued.
pub fn consent_url(client_id: &str) -> Result<Url, url::ParseError> {
    Url::parse_with_params(
        AUTH_URL,
        &[
            ("client_id", client_id),
            ("redirect_uri", REDIRECT_URI),
            ("response_type", "code"),
            ("scope", BLOGGER_SCOPE),
            ("access_type", "offline"),
            ("prompt", "consent"),
        ],
    )
}

/// Exchange a refresh token for a short-lived access token.
#[instrument(level = "debug", skip_all)]
pub async fn refresh_access_token(
    http: &reqwest::Client,
    client: &OAuthClient,
    refresh_token: &str,
) -> Result<TokenResponse, ApiError> {
    let resp = http
        .post(&client.token_url)
        .form(&[
            ("client_id", client.client_id.as_str()),
            ("client_secret", client.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ])
        .send()
        .await?;
    parse_token(read_success_body(resp).await?)
}

/// Exchange an authorization code for tokens.
#[instrument(level = "debug", skip_all)]
pub async fn exchange_code(
    http: &reqwest::Client,
    client: &OAuthClient,
    code: &str,
) -> Result<TokenResponse, ApiError> {
    let resp = http
        .post(&client.token_url)
        .form(&[
            ("client_id", client.client_id.as_str()),
            ("client_secret", client.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", REDIRECT_URI),
            ("grant_type", "authorization_code"),
        ])
        .send()
        .await?;
    parse_token(read_success_body(resp).await?)
}

fn parse_token(body: String) -> Result<TokenResponse, ApiError> {
    serde_json::from_str(&body).map_err(|e| ApiError::Response(format!("token response: {e}")))
}

/// Interactive bootstrap: print the consent URL, read the code, print the
/// refresh token.
pub async fn run_bootstrap(client: &OAuthClient) -> Result<(), Box<dyn std::error::Error>> {
    let url = consent_url(&client.client_id)?;
    println!("---------------------------------------------------------");
    println!("Open this link in a browser and complete the consent flow:");
    println!("{url}");
    println!("---------------------------------------------------------");
    println!("Paste the \"code\" value from the redirect URL and press Enter:");

    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    let code = line.trim();
    if code.is_empty() {
        return Err("no authorization code entered".into());
    }

    let http = reqwest::Client::new();
    match exchange_code(&http, client, code).await {
        Ok(tokens) => {
            info!("Authorization succeeded");
            match tokens.refresh_token {
                Some(refresh) => {
                    println!("\n--- Add this line to your .env file ---");
                    println!("GOOGLE_REFRESH_TOKEN={refresh}");
                    println!("---------------------------------------\n");
                    Ok(())
                }
                None => Err("token response carried no refresh token (was consent forced?)".into()),
            }
        }
        Err(e) => {
            error!(error = %e, "Authorization code rejected or token exchange failed");
            Err(e.into())
        }
    }
}
