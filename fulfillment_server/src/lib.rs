//! # Order Fulfillment Server
//!
//! The HTTP face of the fulfillment saga. It is responsible for:
//! * receiving upstream webhook notifications (order created, product created, delivery
//!   success, cancellation approved) and feeding them into the engine,
//! * receiving and verifying payment-gateway webhooks,
//! * serving the request/reply endpoints (payment queries, seller decisions, analytics),
//! * running the payment-expiry watchdog, and
//! * wiring the saga's event hooks (stock confirmation on order.confirmed, compensating stock
//!   release on payment.failed, and so on).
//!
//! ## Configuration
//! The server is configured via `OFS_*` environment variables, read once at startup into
//! [`config::ServerConfig`]. Nothing below the composition root reads the environment.

pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod integrations;
pub mod routes;
pub mod server;
pub mod watchdog;

#[cfg(test)]
mod endpoint_tests;
