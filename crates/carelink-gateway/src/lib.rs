pub mod audit;
pub mod sms;

pub use audit::AuditLedger;
pub use sms::{GATEWAY_ACCEPTED, HttpGateway, MockGateway, SmsDispatch, SmsGateway};
