//! HTTP cart backend.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use trolley::{
    items::CartItemId,
    payload::{CartData, CartEnvelope},
};

use super::{BackendError, CartBackend, NewCartItem};

/// Errors raised while building an [`HttpCartBackend`].
#[derive(Debug, Error)]
pub enum HttpConfigError {
    /// The base URL could not be parsed or cannot carry a path.
    #[error("invalid base url {0}")]
    InvalidBaseUrl(String),

    /// The HTTP client could not be built.
    #[error("http client error: {0}")]
    Client(#[from] reqwest::Error),
}

/// [`CartBackend`] speaking the storefront's JSON API.
#[derive(Debug, Clone)]
pub struct HttpCartBackend {
    base_url: Url,
    token: Option<String>,
    http: Client,
}

impl HttpCartBackend {
    /// Create a backend rooted at `base_url`, sending `token` as a bearer token when present.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not an absolute URL with a path.
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, HttpConfigError> {
        let base_url = Url::parse(base_url)
            .map_err(|error| HttpConfigError::InvalidBaseUrl(format!("{base_url}: {error}")))?;

        if base_url.cannot_be_a_base() {
            return Err(HttpConfigError::InvalidBaseUrl(base_url.to_string()));
        }

        let http = Client::builder()
            .user_agent(concat!("trolley/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_url,
            token: token.filter(|token| !token.trim().is_empty()),
            http,
        })
    }

    /// URL for the given path segments below the base URL, each one percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();

        // `new` has already rejected cannot-be-a-base URLs.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }

        url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn execute(&self, request: RequestBuilder) -> Result<(u16, Vec<u8>), BackendError> {
        let response = self.authorize(request).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;

        debug!(status, bytes = body.len(), "cart backend responded");

        Ok((status, body.to_vec()))
    }

    async fn mutate(&self, request: RequestBuilder) -> Result<(), BackendError> {
        let (status, body) = self.execute(request).await?;

        confirm_response(status, &body)
    }
}

#[async_trait]
impl CartBackend for HttpCartBackend {
    #[tracing::instrument(skip(self))]
    async fn fetch_cart(&self) -> Result<CartData, BackendError> {
        let (status, body) = self.execute(self.http.get(self.endpoint(&["cart"]))).await?;

        cart_from_response(status, &body)
    }

    #[tracing::instrument(skip(self))]
    async fn add_item(&self, item: NewCartItem) -> Result<(), BackendError> {
        self.mutate(self.http.post(self.endpoint(&["cart", "items"])).json(&item))
            .await
    }

    #[tracing::instrument(skip(self), fields(cart_id = %cart_id))]
    async fn remove_item(&self, cart_id: CartItemId) -> Result<(), BackendError> {
        self.mutate(
            self.http
                .delete(self.endpoint(&["cart", "items", cart_id.as_str()])),
        )
        .await
    }

    #[tracing::instrument(skip(self), fields(cart_id = %cart_id))]
    async fn update_quantity(
        &self,
        cart_id: CartItemId,
        quantity: u32,
    ) -> Result<(), BackendError> {
        self.mutate(
            self.http
                .patch(self.endpoint(&["cart", "items", cart_id.as_str()]))
                .json(&serde_json::json!({ "quantity": quantity })),
        )
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn clear(&self) -> Result<(), BackendError> {
        self.mutate(self.http.delete(self.endpoint(&["cart", "clear"])))
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn apply_coupon(&self, code: String) -> Result<(), BackendError> {
        self.mutate(
            self.http
                .post(self.endpoint(&["cart", "coupons"]))
                .json(&serde_json::json!({ "couponCode": code })),
        )
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn remove_coupon(&self, code: String) -> Result<(), BackendError> {
        self.mutate(self.http.delete(self.endpoint(&["cart", "coupons", &code])))
            .await
    }
}

/// Envelope of mutation responses; only the outcome matters.
#[derive(Debug, Default, Deserialize)]
struct Outcome {
    #[serde(default)]
    success: Option<bool>,

    #[serde(default)]
    message: Option<String>,
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

fn error_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<Outcome>(body)
        .ok()
        .and_then(|outcome| outcome.message)
}

/// Interpret the response to `GET /cart`.
pub(crate) fn cart_from_response(status: u16, body: &[u8]) -> Result<CartData, BackendError> {
    if !is_success(status) {
        return Err(BackendError::from_status(status, error_message(body)));
    }

    let envelope = CartEnvelope::from_slice(body)?;

    if envelope.success == Some(false) {
        return Err(BackendError::Rejected {
            message: envelope.message,
        });
    }

    envelope
        .data
        .ok_or_else(|| BackendError::Decode("cart response has no data".to_string()))
}

/// Interpret the response to a mutation. An empty 2xx body counts as success.
pub(crate) fn confirm_response(status: u16, body: &[u8]) -> Result<(), BackendError> {
    if !is_success(status) {
        return Err(BackendError::from_status(status, error_message(body)));
    }

    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(());
    }

    let outcome = serde_json::from_slice::<Outcome>(body)
        .map_err(|error| BackendError::Decode(error.to_string()))?;

    if outcome.success == Some(false) {
        return Err(BackendError::Rejected {
            message: outcome.message,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
        task::JoinHandle,
    };

    use super::*;

    #[test]
    fn cart_response_accepts_both_shapes() -> TestResult {
        let nested = cart_from_response(200, br#"{"success":true,"data":{"items":[{}]}}"#)?;
        let bare = cart_from_response(200, br#"{"success":true,"data":[{},{}]}"#)?;

        assert_eq!(nested.into_entries().len(), 1);
        assert_eq!(bare.into_entries().len(), 2);

        Ok(())
    }

    #[test]
    fn cart_response_statuses_are_classified() {
        assert_eq!(
            cart_from_response(401, br#"{"success":false,"message":"Please sign in"}"#).err(),
            Some(BackendError::Unauthorized {
                message: Some("Please sign in".to_string())
            })
        );

        assert_eq!(
            cart_from_response(503, b"<html>down</html>").err(),
            Some(BackendError::Server {
                status: 503,
                message: None
            })
        );
    }

    #[test]
    fn cart_response_without_data_is_a_decode_error() {
        assert!(matches!(
            cart_from_response(200, br#"{"success":true}"#),
            Err(BackendError::Decode(_))
        ));
    }

    #[test]
    fn unsuccessful_cart_response_is_rejected() {
        assert_eq!(
            cart_from_response(200, br#"{"success":false,"message":"Cart locked"}"#).err(),
            Some(BackendError::Rejected {
                message: Some("Cart locked".to_string())
            })
        );
    }

    #[test]
    fn mutation_responses() {
        assert_eq!(confirm_response(200, br#"{"success":true,"data":{}}"#), Ok(()));
        assert_eq!(confirm_response(204, b""), Ok(()));

        assert_eq!(
            confirm_response(400, br#"{"success":false,"message":"Invalid coupon"}"#),
            Err(BackendError::Client {
                status: 400,
                message: Some("Invalid coupon".to_string())
            })
        );

        assert_eq!(
            confirm_response(200, br#"{"success":false}"#),
            Err(BackendError::Rejected { message: None })
        );

        assert!(matches!(
            confirm_response(200, b"not json"),
            Err(BackendError::Decode(_))
        ));
    }

    #[test]
    fn invalid_base_urls_are_rejected() {
        assert!(HttpCartBackend::new("not a url", None).is_err());
        assert!(HttpCartBackend::new("mailto:shop@example.com", None).is_err());
    }

    #[test]
    fn endpoints_are_percent_encoded() -> TestResult {
        let backend = HttpCartBackend::new("http://shop.test/api/", None)?;

        assert_eq!(
            backend.endpoint(&["cart", "items", "a/b c"]).as_str(),
            "http://shop.test/api/cart/items/a%2Fb%20c"
        );
        assert_eq!(
            backend.endpoint(&["cart"]).as_str(),
            "http://shop.test/api/cart"
        );

        Ok(())
    }

    /// Serve a single canned response and hand back the raw request head.
    async fn serve_once(body: &'static str) -> TestResult<(String, JoinHandle<String>)> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            let Ok((mut socket, _)) = listener.accept().await else {
                return String::new();
            };

            let mut request = Vec::new();
            let mut buffer = [0_u8; 1024];

            while !request.windows(4).any(|window| window == b"\r\n\r\n") {
                match socket.read(&mut buffer).await {
                    Ok(0) | Err(_) => break,
                    Ok(read) => request.extend(buffer.iter().take(read)),
                }
            }

            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );

            _ = socket.write_all(response.as_bytes()).await;

            String::from_utf8_lossy(&request).into_owned()
        });

        Ok((format!("http://{addr}/api"), handle))
    }

    #[tokio::test]
    async fn fetch_cart_sends_bearer_token() -> TestResult {
        let (base_url, server) = serve_once(r#"{"success":true,"data":[]}"#).await?;
        let backend = HttpCartBackend::new(&base_url, Some("secret".to_string()))?;

        let data = backend.fetch_cart().await?;
        let request = server.await?.to_ascii_lowercase();

        assert!(data.into_entries().is_empty());
        assert!(request.starts_with("get /api/cart http/1.1"), "{request}");
        assert!(request.contains("authorization: bearer secret"), "{request}");

        Ok(())
    }

    #[tokio::test]
    async fn remove_item_encodes_the_line_id() -> TestResult {
        let (base_url, server) = serve_once(r#"{"success":true}"#).await?;
        let backend = HttpCartBackend::new(&base_url, None)?;

        backend.remove_item(CartItemId::new("line 1/2")).await?;
        let request = server.await?;

        assert!(
            request.starts_with("DELETE /api/cart/items/line%201%2F2 HTTP/1.1"),
            "{request}"
        );
        assert!(
            !request.to_ascii_lowercase().contains("authorization"),
            "{request}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_error() -> TestResult {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        drop(listener);

        let backend = HttpCartBackend::new(&format!("http://{addr}/api"), None)?;
        let result = backend.clear().await;

        assert!(matches!(result, Err(BackendError::Transport(_))));

        Ok(())
    }
}
