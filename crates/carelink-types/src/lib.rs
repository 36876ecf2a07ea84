pub mod api;
pub mod status;

pub use status::DeliveryStatus;
