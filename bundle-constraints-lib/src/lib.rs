#![doc(hidden)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core library for bundle-constraints
//!
//! This library lets an operator bundle declare requirements on its environment, such as "requires
//! API group/version/kind X", "requires package Y in version range R", or "requires this
//! expression over the declared properties to hold". These can be combined with `all`, `any`, and
//! `not`, parsed strictly from bounded JSON, and evaluated deterministically against a candidate's
//! properties.
//!
//! # Module Organization
//!
//! - [`properties`]: Typed facts describing a candidate bundle
//! - [`expr`]: The sandboxed expression environment and its `semver_compare` extension
//! - [`constraints`]: Constraint trees, their strict parser, and the evaluator
//! - [`dependencies`]: Bundle dependency files and their conversion into constraints
//! - [`commands`]: Command-line interface and orchestration

pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

pub mod constraints;
pub mod dependencies;
pub mod expr;
pub mod properties;

#[cfg(any(debug_assertions, test))]
pub mod commands;
#[cfg(not(any(debug_assertions, test)))]
mod commands;

pub use crate::commands::{Host, run};
