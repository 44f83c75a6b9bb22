//! textgate Gateway
//!
//! Admission-controlled recognition over a bounded worker pool, and the
//! HTTP API in front of it.

pub mod admission;
pub mod control_ui;
pub mod gateway;
pub mod health_api;
pub mod ocr_api;
pub mod response;
pub mod server;
pub mod validation;

#[cfg(test)]
pub(crate) mod testing;

pub use admission::{AdmissionController, Permit};
pub use gateway::{Gateway, GatewayLimits};
pub use server::{build_router, serve, start_server, GatewayState};
pub use validation::{ImageValidator, ValidationError};
