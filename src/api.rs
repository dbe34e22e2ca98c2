//! Storefront API
//!
//! Thin HTTP client for the storefront backend. Requests carry no bodies and no auth headers.
//!
//! | Call | Method | Path |
//! |---|---|---|
//! | List vendors | `GET` | `/user` |
//! | Remove cart item | `DELETE` | `/cart/remove/{productId}` |
//! | Fetch cart | `GET` | `/cart` |

use std::time::Duration;

use async_trait::async_trait;
use mockall::automock;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::{items::CartItem, products::ProductId, vendors::Vendor};

/// Backend the storefront talks to when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "https://burka.onrender.com";

/// Errors that can occur when talking to the storefront backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// An HTTP transport or decoding error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The configured base URL can't be used.
    #[error("invalid base URL '{0}'")]
    InvalidBaseUrl(String),

    /// The backend returned a non-2xx response.
    #[error("unexpected response from storefront: {0}")]
    UnexpectedResponse(String),
}

/// Remote operations the cart page depends on.
#[automock]
#[async_trait]
pub trait StorefrontApi: Send + Sync {
    /// List every vendor.
    async fn list_vendors(&self) -> Result<Vec<Vendor>, ApiError>;

    /// Remove the cart line holding `product`.
    async fn remove_cart_item(&self, product: &ProductId) -> Result<(), ApiError>;

    /// Fetch the current cart lines.
    async fn fetch_cart(&self) -> Result<Vec<CartItem>, ApiError>;
}

/// `reqwest` backed [`StorefrontApi`].
#[derive(Debug, Clone)]
pub struct HttpStorefrontClient {
    http: Client,
    base_url: Url,
}

impl HttpStorefrontClient {
    /// Create a client pointed at [`DEFAULT_BASE_URL`].
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] if the underlying `reqwest::Client` cannot be constructed.
    pub fn new(timeout: Duration) -> Result<Self, ApiError> {
        Self::with_base_url(DEFAULT_BASE_URL, timeout)
    }

    /// Create a client with a custom base URL.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Http`] if the underlying `reqwest::Client` cannot be constructed.
    /// - [`ApiError::InvalidBaseUrl`] if `base_url` isn't an absolute http(s) URL.
    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("burka-cart/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| ApiError::InvalidBaseUrl(base_url.to_string()))?;

        Ok(Self { http, base_url })
    }

    /// Base URL requests are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();

        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let response = ensure_success(self.http.get(url).send().await?).await?;

        Ok(response.json().await?)
    }
}

async fn ensure_success(response: Response) -> Result<Response, ApiError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let url = response.url().clone();
    let text = response.text().await.unwrap_or_default();

    Err(ApiError::UnexpectedResponse(format!(
        "{url} failed with status {status}: {text}"
    )))
}

#[async_trait]
impl StorefrontApi for HttpStorefrontClient {
    #[tracing::instrument(skip(self))]
    async fn list_vendors(&self) -> Result<Vec<Vendor>, ApiError> {
        let vendors: Vec<Vendor> = self.get_json(self.endpoint(&["user"])?).await?;

        debug!(count = vendors.len(), "fetched vendors");

        Ok(vendors)
    }

    #[tracing::instrument(skip(self, product), fields(product = %product))]
    async fn remove_cart_item(&self, product: &ProductId) -> Result<(), ApiError> {
        let url = self.endpoint(&["cart", "remove", product.as_str()])?;

        ensure_success(self.http.delete(url).send().await?).await?;

        debug!("removed cart item");

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_cart(&self) -> Result<Vec<CartItem>, ApiError> {
        let items: Vec<CartItem> = self.get_json(self.endpoint(&["cart"])?).await?;

        debug!(count = items.len(), "fetched cart");

        Ok(items)
    }
}
