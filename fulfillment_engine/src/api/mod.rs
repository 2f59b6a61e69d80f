//! The public faces of the engine: one API struct per saga component, each generic over the
//! store trait it needs so that tests can swap the backend.

pub mod errors;
pub mod inventory_api;
pub mod payment_flow_api;
pub mod payment_objects;
pub mod seller_api;

pub use errors::PaymentFlowError;
pub use inventory_api::InventoryApi;
pub use payment_flow_api::{expiry_marker, payment_id_from_marker, PaymentFlowApi};
pub use payment_objects::{CheckoutStatus, GatewayCallback, PaymentQueryFilter, RevenuePeriod, RevenueSeries};
pub use seller_api::SellerApi;
