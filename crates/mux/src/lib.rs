//! Client for the Mux video platform.
//!
//! - [`provider`] -- the [`AssetProvider`] contract the pipeline depends on.
//! - [`client`] -- [`MuxClient`], the REST implementation of that contract.
//! - [`webhook`] -- parsing and signature checks for inbound notifications.

pub mod client;
pub mod provider;
pub mod webhook;

pub use client::MuxClient;
pub use provider::{AssetProvider, ProviderError, SubmittedAsset};
