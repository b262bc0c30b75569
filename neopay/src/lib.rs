//! Neo Pay is a wallet-aware client library for a paid blockchain
//! assistant: it connects a local wallet, executes assistant-proposed
//! on-chain actions, and settles HTTP 402 payment challenges with signed
//! EIP-3009 transfer authorizations.
//!
//! The main pieces:
//!
//! - [`provider`]: the wallet-provider boundary and the local-signer
//!   implementation.
//! - [`wallet`]: session state, events, transfers, typed-data signing,
//!   and network switching.
//! - [`action`]: structured blockchain actions, extraction from model
//!   output, and execution.
//! - [`payment`] and [`x402`]: 402 challenge decoding, authorization
//!   signing, and the pay-and-retry request flow.
//! - [`api`]: the assistant backend client.

pub mod action;
pub mod api;
pub mod config;
pub mod error;
pub mod payment;
pub mod prelude;
pub mod provider;
pub mod wallet;
pub mod x402;

#[cfg(test)]
pub(crate) mod testing;

pub use config::NeoPayConfig;
pub use error::{Error, Result};
