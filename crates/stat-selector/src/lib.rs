//! Recommends a classical statistical test for a research design.
//!
//! A fixed set of eligibility rules rejects designs the model was never trained on;
//! everything else is projected onto six categorical fields, one-hot encoded with a
//! frozen encoder and classified by a versioned model artifact.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
