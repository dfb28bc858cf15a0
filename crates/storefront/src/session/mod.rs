//! Client-side session state: the logged-in user and their cart.

mod auth;
mod cart;

pub use auth::AuthSession;
pub use cart::{CartSession, CartState};
