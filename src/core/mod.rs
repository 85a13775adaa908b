//! Core business logic
//!
//! The pipeline stages in dependency order: enrichment, pre-submission
//! validation, interchange writing, compliance re-parsing, payer rules,
//! batch processing, and the [`pipeline`] orchestration that ties them
//! together.

pub mod batch;
pub mod compliance;
pub mod enrich;
pub mod naming;
pub mod payer;
pub mod pipeline;
pub mod validate;
pub mod writer;

pub use batch::{assemble_claims, group_trips, AssembledBatch};
pub use compliance::{check_compliance, parse_interchange, Segment};
pub use enrich::enrich;
pub use naming::{submission_filename, validate_filename};
pub use payer::{check_payer_rules, PayerRuleSet};
pub use pipeline::{build, build_batch, BatchOutcome, BuildOutcome, ClaimReports};
pub use validate::validate;
pub use writer::InterchangeWriter;
