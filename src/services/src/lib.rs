//! # Service wrappers
//!
//! Thin blocking HTTP clients for the gatekeeper, courier, screen writer and
//! producer backends. Every call resolves its URL from the
//! [`harness_config::HarnessConfig`] it was built with and hands back the raw
//! response; interpreting status codes is left to the tests.

mod client;
mod courier;
mod error;
mod gatekeeper;
mod producer;
pub mod response;
mod screen_writer;

pub use client::{ping, ServiceClient};
pub use courier::CourierService;
pub use error::{ServiceError, ServiceResult};
pub use gatekeeper::{GateKeeperService, LoginState, SESSION_COOKIE};
pub use producer::ProducerService;
pub use screen_writer::PackService;
