mod resources;

pub(crate) use resources::{
    CreateClienteRequest, CreateCotizacionRequest, CreateFacturaRequest, CreatedDocument,
    FacturaItemPayload, LineItemPayload, LoginData, RegisterRequest,
};

use crate::storage::SessionProvider;
use leptos::logging::error;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub(crate) enum ApiError {
    /// The request never produced a response (DNS, CORS, connection refused).
    #[error("No se pudo conectar con el servidor: {0}")]
    Network(String),

    /// Non-2xx other than an authenticated 401.
    #[error("{message}")]
    Http { status: u16, message: String },

    #[error("Sesión expirada. Inicie sesión nuevamente.")]
    Unauthorized,

    #[error("Respuesta inválida del servidor: {0}")]
    Parse(String),

    /// 2xx response whose envelope reports `success: false`.
    #[error("{0}")]
    Rejected(String),
}

impl ApiError {
    fn network(e: reqwest::Error) -> Self {
        Self::Network(e.to_string())
    }

    fn parse(e: impl std::fmt::Display) -> Self {
        Self::Parse(e.to_string())
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

/// Human-readable message for a failed response body.
///
/// Prefers the backend's `error` field, then `message`; otherwise a generic
/// status line.
pub(crate) fn error_message_from_body(status: u16, body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    let field = |k: &str| {
        parsed
            .as_ref()
            .and_then(|v| v.get(k))
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
    };

    field("error")
        .or_else(|| field("message"))
        .unwrap_or_else(|| format!("HTTP Error: {status}"))
}

/// Standard response envelope.
///
/// Older endpoints report `status`, newer ones `success`; either may be absent.
#[derive(Deserialize, Clone, Debug)]
pub(crate) struct ApiEnvelope<T> {
    pub success: Option<bool>,
    pub status: Option<bool>,
    pub data: Option<T>,
    pub message: Option<String>,
    pub error: Option<String>,
}

impl<T> ApiEnvelope<T> {
    pub fn is_success(&self) -> bool {
        self.success.or(self.status).unwrap_or(false)
    }

    pub fn failure_message(&self, fallback: &str) -> String {
        self.message
            .clone()
            .filter(|m| !m.trim().is_empty())
            .or_else(|| self.error.clone().filter(|m| !m.trim().is_empty()))
            .unwrap_or_else(|| fallback.to_string())
    }

    /// `data` of a successful envelope; a rejected one becomes [`ApiError::Rejected`].
    pub fn into_data(self, fallback: &str) -> ApiResult<T> {
        if !self.is_success() {
            return Err(ApiError::Rejected(self.failure_message(fallback)));
        }
        self.data
            .ok_or_else(|| ApiError::Parse(format!("{fallback}: respuesta sin datos")))
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct EnvConfig {
    pub api_url: String,
}

impl EnvConfig {
    pub fn new() -> Self {
        let default_api_url = "http://localhost:8000".to_string();

        // `window.ENV.API_URL` is what the deploy script writes; `api_url` is
        // kept for hand-edited env.js files.
        if let Some(window) = web_sys::window() {
            if let Some(env) = window.get("ENV") {
                if !env.is_undefined() && env.is_object() {
                    for key in ["API_URL", "api_url"] {
                        if let Ok(api_url) = js_sys::Reflect::get(&env, &key.into()) {
                            if let Some(url_str) = api_url.as_string() {
                                return Self { api_url: url_str };
                            }
                        }
                    }
                }
            }
        }

        Self {
            api_url: default_api_url,
        }
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// How a request authenticates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Auth {
    None,
    Bearer,
    /// The PDF endpoints read the raw token from `X-API-KEY`.
    ApiKey,
}

#[derive(Clone)]
pub(crate) struct ApiClient {
    pub(crate) base_url: String,
    session: Arc<dyn SessionProvider>,
}

impl ApiClient {
    pub fn new(base_url: String, session: Arc<dyn SessionProvider>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        }
    }

    pub fn from_env(session: Arc<dyn SessionProvider>) -> Self {
        Self::new(EnvConfig::new().api_url, session)
    }

    pub(crate) fn url(&self, endpoint: &str) -> String {
        if endpoint.starts_with('/') {
            format!("{}{}", self.base_url, endpoint)
        } else {
            format!("{}/{}", self.base_url, endpoint)
        }
    }

    /// Header carrying the credential, read from the session at call time.
    pub(crate) fn auth_header(&self, auth: Auth) -> Option<(&'static str, String)> {
        let token = match auth {
            Auth::None => return None,
            Auth::Bearer | Auth::ApiKey => self.session.token()?,
        };
        match auth {
            Auth::Bearer => Some(("Authorization", format!("Bearer {}", token))),
            Auth::ApiKey => Some(("X-API-KEY", token)),
            Auth::None => None,
        }
    }

    pub async fn request<T, B>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
        skip_auth: bool,
    ) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let auth = if skip_auth { Auth::None } else { Auth::Bearer };
        self.send(method, endpoint, body, auth).await
    }

    pub(crate) async fn send<T, B>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
        auth: Auth,
    ) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let result = self.send_inner(method, endpoint, body, auth).await;
        if let Err(e) = &result {
            error!("API Error [{endpoint}]: {e}");
        }
        result
    }

    async fn send_inner<T, B>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
        auth: Auth,
    ) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let client = reqwest::Client::new();
        let mut req = client
            .request(method, self.url(endpoint))
            .header("Content-Type", "application/json");

        if let Some((name, value)) = self.auth_header(auth) {
            req = req.header(name, value);
        }
        if let Some(b) = body {
            req = req.json(b);
        }

        let res = req.send().await.map_err(ApiError::network)?;
        let status = res.status();

        if status.is_success() {
            let text = res.text().await.map_err(ApiError::network)?;
            // 204 / empty bodies decode as JSON null.
            let text = if text.trim().is_empty() { "null" } else { text.as_str() };
            return serde_json::from_str(text).map_err(ApiError::parse);
        }

        if status.as_u16() == 401 && auth != Auth::None {
            return Err(ApiError::Unauthorized);
        }

        let body = res.text().await.unwrap_or_default();
        Err(ApiError::Http {
            status: status.as_u16(),
            message: error_message_from_body(status.as_u16(), &body),
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> ApiResult<T> {
        self.request::<T, ()>(Method::GET, endpoint, None, false)
            .await
    }

    pub async fn post<T, B>(&self, endpoint: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, endpoint, Some(body), false).await
    }

    pub async fn put<T, B>(&self, endpoint: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PUT, endpoint, Some(body), false).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> ApiResult<T> {
        self.request::<T, ()>(Method::DELETE, endpoint, None, false)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemorySession;

    fn client_with(session: &MemorySession) -> ApiClient {
        ApiClient::new("http://localhost:8000/".to_string(), Arc::new(session.clone()))
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let c = client_with(&MemorySession::default());
        assert_eq!(c.base_url, "http://localhost:8000");
        assert_eq!(c.url("/api/clients"), "http://localhost:8000/api/clients");
        assert_eq!(c.url("api/clients"), "http://localhost:8000/api/clients");
    }

    #[test]
    fn test_bearer_header_reads_token_at_call_time() {
        let session = MemorySession::default();
        let c = client_with(&session);
        assert!(c.auth_header(Auth::Bearer).is_none());

        session.set(Some("tok-1"));
        assert_eq!(
            c.auth_header(Auth::Bearer),
            Some(("Authorization", "Bearer tok-1".to_string()))
        );

        session.set(Some("tok-2"));
        assert_eq!(
            c.auth_header(Auth::Bearer),
            Some(("Authorization", "Bearer tok-2".to_string()))
        );
    }

    #[test]
    fn test_api_key_header_and_skip_auth() {
        let session = MemorySession::with_token("raw-token");
        let c = client_with(&session);
        assert_eq!(
            c.auth_header(Auth::ApiKey),
            Some(("X-API-KEY", "raw-token".to_string()))
        );
        assert!(c.auth_header(Auth::None).is_none());
    }

    #[test]
    fn test_error_message_prefers_error_then_message() {
        assert_eq!(
            error_message_from_body(400, r#"{"error":"Cliente no existe","message":"x"}"#),
            "Cliente no existe"
        );
        assert_eq!(
            error_message_from_body(422, r#"{"message":"Datos inválidos"}"#),
            "Datos inválidos"
        );
        assert_eq!(error_message_from_body(500, "<html>oops</html>"), "HTTP Error: 500");
        assert_eq!(error_message_from_body(404, r#"{"error":""}"#), "HTTP Error: 404");
    }

    #[test]
    fn test_envelope_success_or_status() {
        let env: ApiEnvelope<serde_json::Value> =
            serde_json::from_str(r#"{"status":true,"data":[1,2]}"#).expect("should parse");
        assert!(env.is_success());

        let env: ApiEnvelope<serde_json::Value> =
            serde_json::from_str(r#"{"success":false,"error":"Credenciales inválidas"}"#)
                .expect("should parse");
        assert!(!env.is_success());
        assert_eq!(
            env.into_data("Login failed"),
            Err(ApiError::Rejected("Credenciales inválidas".to_string()))
        );
    }

    #[test]
    fn test_envelope_failure_message_fallback() {
        let env: ApiEnvelope<serde_json::Value> =
            serde_json::from_str(r#"{"success":false}"#).expect("should parse");
        assert_eq!(env.failure_message("Login failed"), "Login failed");
    }

    #[test]
    fn test_unauthorized_display_is_spanish() {
        assert!(ApiError::Unauthorized.is_unauthorized());
        assert_eq!(
            ApiError::Unauthorized.to_string(),
            "Sesión expirada. Inicie sesión nuevamente."
        );
        let e = ApiError::Http {
            status: 409,
            message: "Duplicado".to_string(),
        };
        assert_eq!(e.to_string(), "Duplicado");
    }
}
