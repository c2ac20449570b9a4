//! Subscription Lookup Library
//!
//! Client adapter for the contract service's `readCustomerSubscriptions`
//! SOAP operation. Answers whether a customer, identified by email and zip
//! code or by customer number, holds subscriptions that are not closed.
//!
//! # Modules
//!
//! - `config`: Credentials and endpoint configuration.
//! - `debug_log`: Wire-level request/response log.
//! - `errors`: Error handling types.
//! - `models`: Lookup requests, subscription records and results.
//! - `soap`: SOAP envelope writer and response reader.
//! - `subscription_client`: The lookup client.

pub mod config;
pub mod debug_log;
pub mod errors;
pub mod models;
pub mod soap;
pub mod subscription_client;

pub use config::{Config, Credentials};
pub use errors::LookupError;
pub use models::{FilterLogic, LookupRequest, LookupResult, SubscriptionRecord};
pub use subscription_client::SubscriptionLookupClient;
