//! Admission eligibility catalog and application lifecycle.
//!
//! Reference data (universities, majors, admission methods, subject groups and the
//! eligibility mapping table) lives in [`catalog`]; candidate submissions and their
//! status workflow live in [`applications`]. Both are backed by repository traits
//! implemented by the [`persistence`] context.

pub mod applications;
pub mod catalog;
pub mod config;
pub mod error;
pub mod extract;
pub mod persistence;
pub mod principal;
pub mod telemetry;
