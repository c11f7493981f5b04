//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, bind on serve, graceful drain)
//!     → request.rs (assign / propagate X-Request-ID)
//!     → middleware/ (request metrics)
//!     → handlers.rs (health and key/value over the embedded node)
//! ```

pub mod handlers;
pub mod middleware;
pub mod request;
pub mod server;

pub use request::MakeRequestUuid;
pub use server::{HttpServer, ServerState};
