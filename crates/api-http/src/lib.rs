//! HTTP Delivery Layer
//!
//! The endpoint the push service calls for every task attempt. A non-2xx
//! answer makes the service redeliver.

pub mod error;
pub mod routes;
pub mod server;

pub use routes::{router, DeliveryResponse};
pub use server::{HttpServer, HttpServerConfig};
