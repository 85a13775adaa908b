// Kaizen - NEMT Claims to X12 837P Converter
// Copyright (c) 2026 Kaizen Contributors
// Licensed under the MIT License

//! # Kaizen - NEMT claims to 837P conversion
//!
//! Kaizen converts structured non-emergency medical transportation
//! (NEMT) claim records into X12 005010X222A1 ("837 Professional")
//! interchange files, with multi-stage validation, enrichment, and
//! batch aggregation suitable for submission to a managed-care payer
//! through a clearinghouse.
//!
//! ## Overview
//!
//! The pipeline is linear with fan-out for batches:
//!
//! 1. **Enrichment** fills cascading defaults and derived fields
//! 2. **Pre-submission validation** enforces the data model and
//!    business rules, accumulating issues into a report
//! 3. **EDI writing** emits the full interchange: envelope, hierarchy,
//!    claim loops, service loops, adjudication
//! 4. **Compliance checking** re-parses the emitted bytes and verifies
//!    structural integrity
//! 5. **Payer rules** enforce payer-specific segment content
//! 6. **Batch processing** groups atomic trip records into claims,
//!    deduplicates, and emits one shared interchange
//!
//! ## Architecture
//!
//! - [`domain`] - Claim and trip records, reports, error types
//! - [`codes`] - Closed code registry (POS, HCPCS, modifiers, payers)
//! - [`config`] - Build configuration and TOML loading
//! - [`x12`] - Low-level segment emission and control numbers
//! - [`core`] - Pipeline stages and orchestration
//! - [`logging`] - Structured logging setup
//!
//! ## Quick start
//!
//! ```no_run
//! use kaizen::config::BuildConfig;
//! use kaizen::domain::ClaimRecord;
//!
//! fn main() -> kaizen::domain::Result<()> {
//!     kaizen::logging::init_logging("info")?;
//!
//!     let claim: ClaimRecord =
//!         serde_json::from_str(&std::fs::read_to_string("claim.json")?)
//!             .map_err(kaizen::domain::KaizenError::from)?;
//!
//!     let config = BuildConfig {
//!         payer_preset: Some("UHC_CS".to_string()),
//!         ..Default::default()
//!     };
//!
//!     let outcome = kaizen::build(claim, &config)?;
//!     match outcome.edi {
//!         Some(bytes) => std::fs::write("claim.dat", bytes)?,
//!         None => eprintln!("{}", outcome.pre_report.format_text()),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Batch flow
//!
//! ```no_run
//! use kaizen::config::BuildConfig;
//! use kaizen::domain::TripRecord;
//!
//! # fn example(trips: Vec<TripRecord>) -> kaizen::domain::Result<()> {
//! let config = BuildConfig::default();
//! let outcome = kaizen::build_batch(trips, &config)?;
//!
//! println!(
//!     "claims: {}, rejected: {}",
//!     outcome.batch_report.claims_generated,
//!     outcome.batch_report.claims_rejected
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Error handling
//!
//! Validation findings are never errors: they accumulate as
//! [`domain::Issue`] values inside reports, and a claim with any ERROR
//! finding is excluded from emission. The only thrown errors are
//! programmer mistakes: invalid configuration, or a writer fed state
//! the validator should have rejected (see [`domain::KaizenError`]).

pub mod codes;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
pub mod x12;

// The two public entry points, re-exported at the crate root
pub use self::core::pipeline::{build, build_batch, BatchOutcome, BuildOutcome};
