//! Core building blocks shared by every layer: errors, configuration, label taxonomy.

pub mod config;
pub mod errors;
pub mod taxonomy;
