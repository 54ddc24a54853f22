// src/services/push.rs

// Envio de push pelo Firebase Cloud Messaging (API HTTP v1).

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const FCM_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";
const FCM_API_BASE: &str = "https://fcm.googleapis.com/v1/projects";

#[derive(Debug, Clone)]
pub struct PushMessage {
    pub token: String,
    pub title: String,
    pub body: String,
    pub data: HashMap<String, String>,
}

#[derive(Debug, Error)]
pub enum PushError {
    /// O provedor não reconhece mais o token do aparelho
    #[error("token de push não registrado")]
    Unregistered,
    #[error("push rejeitado: {0}")]
    Rejected(String),
    #[error("falha de transporte no push: {0}")]
    Transport(String),
    #[error("credenciais de push inválidas: {0}")]
    Credentials(String),
}

#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send(&self, message: &PushMessage) -> Result<(), PushError>;
}

/// Credenciais da conta de serviço do Firebase.
#[derive(Clone)]
pub struct FcmCredentials {
    pub project_id: String,
    pub client_email: String,
    pub private_key: String,
}

impl std::fmt::Debug for FcmCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FcmCredentials")
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

pub struct FcmClient {
    client: Client,
    credentials: FcmCredentials,
    key: EncodingKey,
    token: Mutex<Option<CachedToken>>,
}

impl std::fmt::Debug for FcmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FcmClient")
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

impl FcmClient {
    /// `timeout` limita cada chamada de rede.
    pub fn new(credentials: FcmCredentials, timeout: Duration) -> Result<Self, PushError> {
        let key = EncodingKey::from_rsa_pem(credentials.private_key.as_bytes())
            .map_err(|e| PushError::Credentials(e.to_string()))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PushError::Transport(e.to_string()))?;

        Ok(Self { client, credentials, key, token: Mutex::new(None) })
    }

    /// Token OAuth em cache, renovado um minuto antes de expirar.
    async fn access_token(&self) -> Result<String, PushError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() + Duration::from_secs(60) {
                return Ok(token.value.clone());
            }
        }

        let now = chrono::Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &self.credentials.client_email,
            scope: FCM_SCOPE,
            aud: TOKEN_URL,
            iat: now,
            exp: now + 3600,
        };
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &self.key)
            .map_err(|e| PushError::Credentials(e.to_string()))?;

        let response = self
            .client
            .post(TOKEN_URL)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .map_err(|e| PushError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PushError::Credentials(format!("{status}: {body}")));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| PushError::Transport(e.to_string()))?;

        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        });
        debug!("Token OAuth do FCM renovado");
        Ok(token.access_token)
    }
}

#[async_trait]
impl PushSender for FcmClient {
    #[instrument(skip(self, message), fields(title = %message.title))]
    async fn send(&self, message: &PushMessage) -> Result<(), PushError> {
        let access_token = self.access_token().await?;

        let payload = json!({
            "message": {
                "token": message.token,
                "notification": { "title": message.title, "body": message.body },
                "data": message.data,
                "android": {
                    "priority": "high",
                    "notification": { "sound": "default" }
                },
                "apns": {
                    "payload": { "aps": { "sound": "default" } }
                }
            }
        });

        let response = self
            .client
            .post(format!("{FCM_API_BASE}/{}/messages:send", self.credentials.project_id))
            .bearer_auth(access_token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| PushError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_error(status, &body))
    }
}

/// Traduz a resposta de erro do FCM. Token desconhecido ou malformado vira
/// `Unregistered`, para que o chamador limpe o token do usuário.
pub fn classify_error(status: StatusCode, body: &str) -> PushError {
    let parsed: serde_json::Value = serde_json::from_str(body).unwrap_or_default();
    let error = &parsed["error"];

    let fcm_code = error["details"]
        .as_array()
        .into_iter()
        .flatten()
        .find_map(|d| d["errorCode"].as_str());
    let api_status = error["status"].as_str().unwrap_or_default();
    let message = error["message"].as_str().unwrap_or(body);

    let unregistered = match fcm_code {
        Some("UNREGISTERED") => true,
        Some("INVALID_ARGUMENT") => message.contains("registration token"),
        Some(_) => false,
        None => {
            status == StatusCode::NOT_FOUND
                || (api_status == "INVALID_ARGUMENT" && message.contains("registration token"))
        }
    };

    if unregistered {
        PushError::Unregistered
    } else {
        PushError::Rejected(format!("{status}: {message}"))
    }
}
