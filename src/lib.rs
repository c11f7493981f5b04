//! Embedded node host library.
//!
//! Runs an embedded data node and an HTTP server in one process and
//! coordinates their lifecycles: the server only serves once the node is
//! ready, and termination signals shut both down in order.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod node;
pub mod observability;

pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::{Coordinator, Shutdown};
pub use node::EmbeddedNode;
