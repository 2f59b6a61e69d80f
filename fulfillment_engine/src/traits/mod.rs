//! Interface contracts between the flow APIs and their backends.
//!
//! The engine is split the same way the storage is: the payment orchestrator, the inventory
//! ledger and the seller aggregator each own a trait describing the persistence behaviour they
//! need, and [`crate::SqliteDatabase`] implements all of them. [`CheckoutProvider`] is the seam
//! to the hosted-checkout gateway so the flow logic can be exercised against a mock.

mod checkout_provider;
mod inventory_store;
mod payment_store;
mod seller_store;
mod ttl_store;

pub use checkout_provider::{CheckoutLink, CheckoutProvider, CheckoutProviderError, CheckoutRequest};
pub use inventory_store::{InventoryError, InventoryStore};
pub use payment_store::{InsertPaymentResult, PaymentStore, PaymentStoreError, PaymentTransition};
pub use seller_store::{SellerStore, SellerStoreError};
pub use ttl_store::{TtlStore, TtlStoreError};

/// Everything the payment orchestrator needs from its backend: the payment records themselves
/// plus the durable expiry timers.
pub trait PaymentBackend: PaymentStore + TtlStore {}
impl<T> PaymentBackend for T where T: PaymentStore + TtlStore {}
