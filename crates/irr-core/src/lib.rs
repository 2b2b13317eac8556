//! The IRR engine: parses image references out of a chart's values tree,
//! resolves them against a registry mapping, and assembles the minimal
//! override document that redirects them.
//!
//! Pipeline (§4): a chart's merged values tree is handed to the
//! [`walker`] (C3), the detected patterns run through the [`filter`]
//! (C4), each eligible site is parsed by [`reference`] (C1/C2), resolved
//! by [`mapping`] (C6), given a new repository path by [`path_strategy`]
//! (C5), and written into the overlay by [`assembler`] (C7). The
//! [`controller`] (C9) drives this end to end and applies [`rules`] (C8)
//! and the strict/threshold success-rate policy.

pub mod assembler;
pub mod cancel;
pub mod controller;
pub mod errors;
pub mod filter;
pub mod mapping;
pub mod model;
pub mod path_strategy;
pub mod reference;
pub mod rules;
pub mod walker;

pub use cancel::CancellationToken;
pub use controller::{generate, GeneratorOptions};
pub use errors::GeneratorError;
pub use model::{ChartMetadata, MappingConfig, OverrideFile, RegistryMapping};
pub use reference::ImageReference;
