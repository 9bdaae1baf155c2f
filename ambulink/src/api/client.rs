//! Dispatch API trait and HTTP implementation.

use std::future::Future;

use reqwest::{Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::error::ApiError;
use super::models::{
    AcceptResponse, ChangePasswordRequest, LoginRequest, LoginResponse, MessageResponse,
    PartnerResponse, PartnerRidesResponse, PendingRideResponse, RideAssignment, RideQuery,
    StatusUpdate,
};
use crate::config::ServerSettings;

/// Operations offered by the dispatch backend.
pub trait DispatchApi: Send + Sync + 'static {
    /// POST `ambulancepartner/login`.
    fn login(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<LoginResponse, ApiError>> + Send;

    /// PATCH `ambulancepartner/changepassword/{id}`.
    fn change_password(
        &self,
        partner_id: &str,
        old_password: &str,
        new_password: &str,
    ) -> impl Future<Output = Result<MessageResponse, ApiError>> + Send;

    /// PATCH `ambulancepartner/changestatus/{id}`.
    fn change_status(
        &self,
        partner_id: &str,
        update: &StatusUpdate,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// GET `ambulancepartner/getambulancepartner/{id}`.
    fn get_partner(
        &self,
        partner_id: &str,
    ) -> impl Future<Output = Result<PartnerResponse, ApiError>> + Send;

    /// GET `ride/getpendingambulancelist`.
    fn pending_rides(&self) -> impl Future<Output = Result<PendingRideResponse, ApiError>> + Send;

    /// PATCH `ride/accept/ambulancepartner/{rideId}`.
    fn accept_ride(
        &self,
        ride_id: &str,
        partner_id: &str,
    ) -> impl Future<Output = Result<AcceptResponse, ApiError>> + Send;

    /// GET `ride/getambulancepartnerride/{id}?status=...`.
    fn partner_rides(
        &self,
        partner_id: &str,
        query: RideQuery,
    ) -> impl Future<Output = Result<PartnerRidesResponse, ApiError>> + Send;

    /// PATCH `ride/complete/ambulancepartner/{rideId}`.
    fn complete_ride(
        &self,
        ride_id: &str,
        partner_id: &str,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// DELETE `ride/decline/{rideId}`.
    fn decline_ride(&self, ride_id: &str) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// GET `ride/sendsms/{rideId}`.
    fn send_sms(&self, ride_id: &str) -> impl Future<Output = Result<(), ApiError>> + Send;
}

/// Dispatch API over HTTP.
///
/// Uses a reusable `reqwest::Client` with connection pooling and the
/// configured request timeout.
pub struct HttpDispatchApi {
    http: reqwest::Client,
    base: Url,
    prefix: Vec<String>,
}

impl HttpDispatchApi {
    pub fn new(settings: &ServerSettings) -> Result<Self, ApiError> {
        let base = Url::parse(&settings.base_url)
            .map_err(|e| ApiError::Client(format!("invalid base URL '{}': {}", settings.base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::Client(format!(
                "invalid base URL '{}'",
                settings.base_url
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .map_err(|e| ApiError::Client(e.to_string()))?;

        let prefix = settings
            .api_prefix
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self { http, base, prefix })
    }

    /// Build an endpoint URL from path segments. Segments are percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            path.extend(self.prefix.iter().map(String::as_str));
            path.extend(segments);
        }
        url
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        debug!(url = %response.url(), status = status.as_u16(), "Dispatch API response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn call<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let bytes = self.execute(request).await?.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn call_empty(&self, request: RequestBuilder) -> Result<(), ApiError> {
        self.execute(request).await.map(|_| ())
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        let url = self.endpoint(segments);
        debug!(method = %method, url = %url, "Dispatch API request");
        self.http.request(method, url)
    }

    fn request_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        segments: &[&str],
        body: &B,
    ) -> RequestBuilder {
        self.request(method, segments).json(body)
    }
}

impl DispatchApi for HttpDispatchApi {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let body = LoginRequest { email, password };
        self.call(self.request_json(Method::POST, &["ambulancepartner", "login"], &body))
            .await
    }

    async fn change_password(
        &self,
        partner_id: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<MessageResponse, ApiError> {
        let body = ChangePasswordRequest {
            old_password,
            new_password,
        };
        self.call(self.request_json(
            Method::PATCH,
            &["ambulancepartner", "changepassword", partner_id],
            &body,
        ))
        .await
    }

    async fn change_status(&self, partner_id: &str, update: &StatusUpdate) -> Result<(), ApiError> {
        self.call_empty(self.request_json(
            Method::PATCH,
            &["ambulancepartner", "changestatus", partner_id],
            update,
        ))
        .await
    }

    async fn get_partner(&self, partner_id: &str) -> Result<PartnerResponse, ApiError> {
        self.call(self.request(
            Method::GET,
            &["ambulancepartner", "getambulancepartner", partner_id],
        ))
        .await
    }

    async fn pending_rides(&self) -> Result<PendingRideResponse, ApiError> {
        self.call(self.request(Method::GET, &["ride", "getpendingambulancelist"]))
            .await
    }

    async fn accept_ride(&self, ride_id: &str, partner_id: &str) -> Result<AcceptResponse, ApiError> {
        let body = RideAssignment {
            ambulance_partner_id: partner_id,
        };
        self.call(self.request_json(
            Method::PATCH,
            &["ride", "accept", "ambulancepartner", ride_id],
            &body,
        ))
        .await
        .map(AcceptResponse)
    }

    async fn partner_rides(
        &self,
        partner_id: &str,
        query: RideQuery,
    ) -> Result<PartnerRidesResponse, ApiError> {
        let request = self
            .request(Method::GET, &["ride", "getambulancepartnerride", partner_id])
            .query(&[("status", query.as_str())]);
        self.call(request).await
    }

    async fn complete_ride(&self, ride_id: &str, partner_id: &str) -> Result<(), ApiError> {
        let body = RideAssignment {
            ambulance_partner_id: partner_id,
        };
        self.call_empty(self.request_json(
            Method::PATCH,
            &["ride", "complete", "ambulancepartner", ride_id],
            &body,
        ))
        .await
    }

    async fn decline_ride(&self, ride_id: &str) -> Result<(), ApiError> {
        self.call_empty(self.request(Method::DELETE, &["ride", "decline", ride_id]))
            .await
    }

    async fn send_sms(&self, ride_id: &str) -> Result<(), ApiError> {
        self.call_empty(self.request(Method::GET, &["ride", "sendsms", ride_id]))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn settings(base_url: &str, api_prefix: &str) -> ServerSettings {
        ServerSettings {
            base_url: base_url.to_string(),
            api_prefix: api_prefix.to_string(),
            request_timeout_secs: 5,
        }
    }

    /// Serve a single canned HTTP response and hand back the raw request.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = stream.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(end) = text.find("\r\n\r\n") {
                    let content_length = text[..end]
                        .lines()
                        .find_map(|l| {
                            let lower = l.to_ascii_lowercase();
                            lower
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap())
                        })
                        .unwrap_or(0);
                    if request.len() >= end + 4 + content_length || n == 0 {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).to_string()
        });

        (format!("http://{}", addr), handle)
    }

    #[test]
    fn test_endpoint_joins_prefix() {
        let api = HttpDispatchApi::new(&settings("http://localhost:9000", "api/v1")).unwrap();
        assert_eq!(
            api.endpoint(&["ride", "getpendingambulancelist"]).as_str(),
            "http://localhost:9000/api/v1/ride/getpendingambulancelist"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path_and_encodes_ids() {
        let api = HttpDispatchApi::new(&settings("https://host.example/backend", "")).unwrap();
        assert_eq!(
            api.endpoint(&["ride", "decline", "R 1/2"]).as_str(),
            "https://host.example/backend/ride/decline/R%201%2F2"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            HttpDispatchApi::new(&settings("not a url", "api/v1")),
            Err(ApiError::Client(_))
        ));
    }

    #[tokio::test]
    async fn test_accept_sends_partner_id_and_returns_body() {
        let (base, server) = serve_once("200 OK", r#"{"sessionKey":"sk-9"}"#).await;
        let api = HttpDispatchApi::new(&settings(&base, "api/v1")).unwrap();

        let response = api.accept_ride("R1", "p-1").await.unwrap();
        assert_eq!(response.session_key(), Some("sk-9"));

        let request = server.await.unwrap();
        assert!(request.starts_with("PATCH /api/v1/ride/accept/ambulancepartner/R1 "));
        assert!(request.contains(r#"{"ambulancePartnerId":"p-1"}"#));
    }

    #[tokio::test]
    async fn test_non_success_status_is_surfaced() {
        let (base, server) = serve_once("409 Conflict", r#"{"message":"already taken"}"#).await;
        let api = HttpDispatchApi::new(&settings(&base, "api/v1")).unwrap();

        let err = api.accept_ride("R1", "p-1").await.unwrap_err();
        match err {
            ApiError::Status { status, body } => {
                assert_eq!(status, 409);
                assert!(body.contains("already taken"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_partner_rides_sends_status_query() {
        let (base, server) = serve_once("200 OK", r#"{"message":"ok","ride":[]}"#).await;
        let api = HttpDispatchApi::new(&settings(&base, "api/v1")).unwrap();

        let response = api.partner_rides("p-1", RideQuery::Complete).await.unwrap();
        assert!(response.ride.is_empty());

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /api/v1/ride/getambulancepartnerride/p-1?status=complete "));
    }

    #[tokio::test]
    async fn test_empty_body_endpoints_ignore_body() {
        let (base, server) = serve_once("200 OK", "").await;
        let api = HttpDispatchApi::new(&settings(&base, "api/v1")).unwrap();

        api.decline_ride("R7").await.unwrap();
        let request = server.await.unwrap();
        assert!(request.starts_with("DELETE /api/v1/ride/decline/R7 "));
    }

    #[tokio::test]
    async fn test_transport_error() {
        // Bind then drop to get a port with nothing listening
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let api = HttpDispatchApi::new(&settings(&format!("http://{}", addr), "api/v1")).unwrap();
        assert!(matches!(
            api.pending_rides().await,
            Err(ApiError::Transport(_))
        ));
    }
}
