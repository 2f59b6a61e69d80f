//! Order Fulfillment Engine
//!
//! The engine carries the core logic of the order-fulfillment saga. It is transport-agnostic:
//! the HTTP server feeds it events and request/reply calls, and it answers through its APIs and
//! the event channels.
//!
//! The library is divided into three main sections:
//! 1. Database management and control ([`mod@db`]). SQLite is the supported backend. You should
//!    never need to touch the database directly; use the flow APIs instead. The exception is
//!    the data types stored in the database, which live in [`mod@db_types`] and are public.
//! 2. The flow APIs ([`mod@api`]): one per saga component. [`api::PaymentFlowApi`] owns payment
//!    records and their terminal transitions, [`api::InventoryApi`] owns the stock ledger, and
//!    [`api::SellerApi`] owns order snapshots and the revenue aggregates. Each is generic over
//!    the store traits in [`mod@traits`], so a backend (or a mock) plugs in at the seam.
//! 3. The event layer ([`mod@events`]): typed saga events carried over a simple actor-style
//!    channel. Hooks subscribe to events such as `payment.failed` and perform follow-up actions
//!    like the compensating stock release.

mod db;

pub mod api;
pub mod db_types;
pub mod events;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use api::{
    expiry_marker,
    payment_id_from_marker,
    CheckoutStatus,
    GatewayCallback,
    InventoryApi,
    PaymentFlowApi,
    PaymentFlowError,
    PaymentQueryFilter,
    RevenuePeriod,
    RevenueSeries,
    SellerApi,
};
#[cfg(feature = "sqlite")]
pub use db::sqlite::{db_url, new_pool, SqliteDatabase, SqliteDatabaseError};
