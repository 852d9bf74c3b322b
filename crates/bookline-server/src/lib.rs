//! Bookline HTTP server: identity resolution, availability scheduling,
//! bookings, messaging, and real-time channel fan-out, all over
//! in-memory stores.

pub mod access;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod server;
pub mod services;
pub mod state;

pub use server::{build_app, BooklineServer};
pub use state::AppState;
