//! Client-side cart state mirrored from the cart service.
//!
//! The remote cart is authoritative: every successful mutation except clear
//! is followed by a full re-fetch rather than a local merge. State changes
//! are published on a `tokio::sync::watch` channel.

use std::sync::Arc;

use techmart_core::{Cart, ProductId};
use tokio::sync::{RwLock, watch};
use tracing::instrument;

use super::AuthSession;
use crate::api::CartApi;
use crate::error::ApiError;

/// Observable cart state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartState {
    /// `None` while logged out.
    pub cart: Option<Cart>,
    pub sidebar_open: bool,
    /// Set for the duration of every remote call.
    pub loading: bool,
    /// Message of the last failure, cleared when the next action starts.
    pub error: Option<String>,
}

impl CartState {
    /// Sum of line quantities.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.cart.as_ref().map_or(0, Cart::item_count)
    }
}

/// The storefront's cart, kept in step with the remote cart service.
pub struct CartSession {
    api: Arc<dyn CartApi>,
    auth: RwLock<Option<AuthSession>>,
    state: watch::Sender<CartState>,
}

impl CartSession {
    #[must_use]
    pub fn new(api: Arc<dyn CartApi>) -> Self {
        let (state, _) = watch::channel(CartState::default());
        Self {
            api,
            auth: RwLock::new(None),
            state,
        }
    }

    /// Receive every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn snapshot(&self) -> CartState {
        self.state.borrow().clone()
    }

    /// Login, logout or user switch.
    ///
    /// A new identity re-fetches the cart; logging out drops it. Setting the
    /// identity already held does nothing.
    pub async fn set_auth(&self, auth: Option<AuthSession>) {
        let changed = {
            let mut current = self.auth.write().await;
            let changed = match (current.as_ref(), auth.as_ref()) {
                (Some(held), Some(new)) => !held.same_identity(new),
                (None, None) => false,
                _ => true,
            };
            *current = auth;
            changed
        };
        if changed && let Err(e) = self.refresh().await {
            tracing::warn!(error = %e, "Cart refresh after identity change failed");
        }
    }

    /// Re-fetch the cart. A failed fetch leaves an empty cart for the user
    /// and records the error.
    ///
    /// # Errors
    ///
    /// Returns the fetch error after recording it in the state.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<(), ApiError> {
        let Some(auth) = self.current_auth().await else {
            self.state.send_modify(|s| s.cart = None);
            return Ok(());
        };
        self.begin();
        let result = self.load(&auth).await;
        self.finish(&result);
        result
    }

    /// Add `quantity` (default 1) of a product, re-fetch, and open the
    /// sidebar.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotAuthenticated` when logged out, otherwise the
    /// cart service's error.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_item(&self, product_id: ProductId, quantity: Option<u32>) -> Result<(), ApiError> {
        let Some(auth) = self.current_auth().await else {
            return Err(ApiError::NotAuthenticated);
        };
        let quantity = quantity.filter(|q| *q > 0).unwrap_or(1);

        self.begin();
        let result = self
            .api
            .add_item(product_id, quantity, auth.token())
            .await
            .map(|_| ());
        if result.is_ok() {
            self.reload(&auth).await;
            self.state.send_modify(|s| s.sidebar_open = true);
        }
        self.finish(&result);
        result
    }

    /// Set a line's quantity. Zero or below removes the line instead.
    /// A no-op when logged out.
    ///
    /// # Errors
    ///
    /// Returns the cart service's error.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn update_quantity(&self, product_id: ProductId, quantity: i64) -> Result<(), ApiError> {
        let Some(auth) = self.current_auth().await else {
            return Ok(());
        };

        self.begin();
        let result = match u32::try_from(quantity) {
            Ok(quantity) if quantity > 0 => {
                self.api
                    .update_quantity(product_id, quantity, auth.token())
                    .await
            }
            Ok(_) => self.api.remove_item(product_id, auth.token()).await,
            // Negative quantities remove, larger than u32 clamp
            Err(_) if quantity < 0 => self.api.remove_item(product_id, auth.token()).await,
            Err(_) => {
                self.api
                    .update_quantity(product_id, u32::MAX, auth.token())
                    .await
            }
        }
        .map(|_| ());
        if result.is_ok() {
            self.reload(&auth).await;
        }
        self.finish(&result);
        result
    }

    /// Remove a line. A no-op when logged out.
    ///
    /// # Errors
    ///
    /// Returns the cart service's error.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_item(&self, product_id: ProductId) -> Result<(), ApiError> {
        let Some(auth) = self.current_auth().await else {
            return Ok(());
        };

        self.begin();
        let result = self
            .api
            .remove_item(product_id, auth.token())
            .await
            .map(|_| ());
        if result.is_ok() {
            self.reload(&auth).await;
        }
        self.finish(&result);
        result
    }

    /// Empty the cart. The local cart is reset without a re-fetch.
    /// A no-op when logged out.
    ///
    /// # Errors
    ///
    /// Returns the cart service's error.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<(), ApiError> {
        let Some(auth) = self.current_auth().await else {
            return Ok(());
        };

        self.begin();
        let result = self.api.clear(auth.token()).await.map(|_| ());
        if result.is_ok() {
            let empty = Cart::empty(auth.user_id());
            self.state.send_modify(|s| s.cart = Some(empty));
        }
        self.finish(&result);
        result
    }

    pub fn open_sidebar(&self) {
        self.state.send_modify(|s| s.sidebar_open = true);
    }

    pub fn close_sidebar(&self) {
        self.state.send_modify(|s| s.sidebar_open = false);
    }

    pub fn toggle_sidebar(&self) {
        self.state.send_modify(|s| s.sidebar_open = !s.sidebar_open);
    }

    async fn current_auth(&self) -> Option<AuthSession> {
        self.auth.read().await.clone()
    }

    fn begin(&self) {
        self.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });
    }

    fn finish(&self, result: &Result<(), ApiError>) {
        self.state.send_modify(|s| {
            s.loading = false;
            if let Err(e) = result {
                s.error = Some(e.to_string());
            }
        });
    }

    async fn load(&self, auth: &AuthSession) -> Result<(), ApiError> {
        match self.api.get_cart(auth.user_id(), auth.token()).await {
            Ok(cart) => {
                self.state.send_modify(|s| s.cart = Some(cart));
                Ok(())
            }
            Err(e) => {
                let empty = Cart::empty(auth.user_id());
                let message = e.to_string();
                self.state.send_modify(|s| {
                    s.cart = Some(empty);
                    s.error = Some(message);
                });
                Err(e)
            }
        }
    }

    /// Re-fetch after a successful mutation. The mutation stands even if
    /// the re-fetch fails; the failure is kept in `error`.
    async fn reload(&self, auth: &AuthSession) {
        if let Err(e) = self.load(auth).await {
            tracing::warn!(error = %e, "Cart re-fetch after mutation failed");
        }
    }
}
