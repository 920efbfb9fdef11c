#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Patch adapter abstraction for `PatchPort`.
//!
//! This crate provides the `PatchAdapter` trait: the seam between the
//! backport pipeline and the external content-adaptation capability.

mod adapter;

pub use adapter::{PatchAdapter, PatchAdapterError};
pub use patchport_adapter_models as models;
