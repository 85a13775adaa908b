//! Domain models and types
//!
//! This module contains the record tree for claims and trips, the
//! shared report shape, and the error hierarchy.
//!
//! # Overview
//!
//! - **Claim records** ([`ClaimRecord`], [`Claim`], [`Service`]) — the
//!   typed input tree for the single-claim flow
//! - **Trip records** ([`TripRecord`]) — flattened batch input
//! - **Reports** ([`Report`], [`Issue`], [`Severity`]) — ordered issue
//!   lists with a validity flag, shared by every pipeline stage
//! - **Errors** ([`KaizenError`], [`WriterError`]) — thrown only for
//!   programmer mistakes; findings are report values
//! - **Result alias** ([`Result`])

pub mod claim;
pub mod errors;
pub mod report;
pub mod result;
pub mod trip;

// Re-export commonly used types for convenience
pub use claim::{
    Address, Adjudication, Ambulance, CasAdjustment, Claim, ClaimRecord, Facility, Location,
    MemberGroup, OtherPayer, PersonName, Provider, Receiver, ReferringProvider, Service,
    Submitter, Subscriber, SupportingProvider,
};
pub use errors::{KaizenError, WriterError};
pub use report::{
    BatchReport, ComplianceReport, Issue, PayerReport, Report, Severity, ValidationReport,
};
pub use result::Result;
pub use trip::TripRecord;
