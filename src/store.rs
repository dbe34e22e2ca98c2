//! Cart Store
//!
//! The cart is shared state owned outside the page. The page only reads it through [`CartStore`]
//! and asks it to refresh after every mutation; it never merges changes locally.

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;
use tracing::debug;

use crate::{
    api::{ApiError, StorefrontApi},
    items::CartItem,
};

/// Cart store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Fetching the cart from the backend failed.
    #[error("failed to fetch cart")]
    Api(#[from] ApiError),
}

/// Read access to the shared cart plus a refresh primitive.
#[automock]
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Snapshot of the cart lines as of the last successful refresh.
    fn list(&self) -> Vec<CartItem>;

    /// Reload the cart from its source.
    async fn refresh(&self) -> Result<(), StoreError>;
}

/// Cart store that loads its lines from the storefront backend.
pub struct RemoteCartStore {
    api: Arc<dyn StorefrontApi>,
    items: RwLock<Vec<CartItem>>,
}

impl RemoteCartStore {
    /// Create an empty store; call [`CartStore::refresh`] to load it.
    pub fn new(api: Arc<dyn StorefrontApi>) -> Self {
        Self {
            api,
            items: RwLock::new(Vec::new()),
        }
    }
}

impl std::fmt::Debug for RemoteCartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteCartStore")
            .field("items", &self.list().len())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CartStore for RemoteCartStore {
    fn list(&self) -> Vec<CartItem> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn refresh(&self) -> Result<(), StoreError> {
        let items = self.api.fetch_cart().await?;

        debug!(count = items.len(), "cart store refreshed");

        *self.items.write().unwrap_or_else(PoisonError::into_inner) = items;

        Ok(())
    }
}

/// Cart store over a fixed set of lines.
#[derive(Debug, Default)]
pub struct InMemoryCartStore {
    items: RwLock<Vec<CartItem>>,
}

impl InMemoryCartStore {
    /// Create a store holding `items`.
    pub fn new(items: Vec<CartItem>) -> Self {
        Self {
            items: RwLock::new(items),
        }
    }

    /// Replace the stored lines.
    pub fn replace(&self, items: Vec<CartItem>) {
        *self.items.write().unwrap_or_else(PoisonError::into_inner) = items;
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    fn list(&self) -> Vec<CartItem> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn refresh(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
