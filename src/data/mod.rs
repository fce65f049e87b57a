//! Data-source integration.
//!
//! The fetch seam is the `GenerationSource` trait so the pipeline can run
//! against the real EIA client or an injected fake in tests.

pub mod eia;

pub use eia::*;
