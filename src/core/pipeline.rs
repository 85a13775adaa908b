//! Pipeline orchestration
//!
//! The two public entry points: [`build`] converts one claim record,
//! [`build_batch`] groups trip records into claims and emits a single
//! shared interchange. Each claim flows through enrichment, payer
//! resolution, pre-submission validation, and the EDI writer; the
//! emitted bytes are then re-parsed by the compliance checker and the
//! payer rule validator.

use crate::config::BuildConfig;
use crate::core::batch::assemble_claims;
use crate::core::compliance::check_compliance;
use crate::core::enrich::enrich;
use crate::core::payer::{check_payer_rules, PayerRuleSet};
use crate::core::validate::validate;
use crate::core::writer::{resolve_receiver, InterchangeWriter};
use crate::domain::{
    BatchReport, ClaimRecord, ComplianceReport, Issue, KaizenError, PayerReport, Result,
    TripRecord, ValidationReport,
};

/// Outcome of a single-claim build
#[derive(Debug)]
pub struct BuildOutcome {
    /// Interchange bytes; None when pre-validation blocked emission
    pub edi: Option<Vec<u8>>,
    /// Pre-submission validation findings
    pub pre_report: ValidationReport,
    /// Structural re-parse findings; None when nothing was emitted
    pub compliance_report: Option<ComplianceReport>,
    /// Payer rule findings; None when nothing was emitted
    pub payer_report: Option<PayerReport>,
}

/// Per-claim reporting for a batch build
#[derive(Debug)]
pub struct ClaimReports {
    /// CLM01 of the claim the report belongs to
    pub clm_number: String,
    /// Pre-submission validation findings
    pub validation: ValidationReport,
    /// Whether the claim made it into the interchange
    pub emitted: bool,
}

/// Outcome of a batch build
#[derive(Debug)]
pub struct BatchOutcome {
    /// Interchange bytes; None when every claim was blocked
    pub edi: Option<Vec<u8>>,
    /// Grouping, aggregation and duplicate findings
    pub batch_report: BatchReport,
    /// One entry per assembled claim, in emission order
    pub per_claim_reports: Vec<ClaimReports>,
    /// Structural findings for the shared interchange
    pub compliance_report: Option<ComplianceReport>,
    /// Payer rule findings for the shared interchange
    pub payer_report: Option<PayerReport>,
}

/// Converts one claim record into an 837P interchange
///
/// Returns the emitted bytes together with all reports. When
/// pre-submission validation finds any ERROR, no EDI is emitted and
/// only the validation report is populated.
///
/// # Errors
///
/// [`KaizenError::Configuration`] for invalid configuration;
/// [`KaizenError::Writer`] when the writer reaches an impossible state
/// that validation should have prevented.
pub fn build(claim: ClaimRecord, config: &BuildConfig) -> Result<BuildOutcome> {
    config
        .validate()
        .map_err(KaizenError::Configuration)?;

    let mut enriched = enrich(claim);
    enriched.receiver = resolve_receiver(&enriched, config);

    let pre_report = validate(&enriched);
    if !pre_report.is_valid {
        tracing::warn!(
            clm_number = %enriched.claim.clm_number,
            errors = pre_report.error_count(),
            "Claim blocked by pre-submission validation"
        );
        return Ok(BuildOutcome {
            edi: None,
            pre_report,
            compliance_report: None,
            payer_report: None,
        });
    }

    let mut writer = InterchangeWriter::new(config)?;
    writer.open()?;
    writer.write_claim(&enriched)?;
    let bytes = writer.close()?;

    let compliance_report = check_compliance(&bytes);
    let payer_report = check_payer_rules(&bytes, PayerRuleSet::Uhc)?;

    Ok(BuildOutcome {
        edi: Some(bytes),
        pre_report,
        compliance_report: Some(compliance_report),
        payer_report: Some(payer_report),
    })
}

/// Converts a batch of trip records into a single shared interchange
///
/// Trips are grouped into claims; each claim is enriched, validated and
/// written into one ISA/GS envelope with its own ST/SE pair. Invalid
/// claims are excluded and listed; the batch continues. When every
/// claim fails, no interchange is emitted and only reports are
/// returned.
pub fn build_batch(trips: Vec<TripRecord>, config: &BuildConfig) -> Result<BatchOutcome> {
    config
        .validate()
        .map_err(KaizenError::Configuration)?;

    let assembled = assemble_claims(&trips, config);
    let mut batch_report = assembled.report;
    let mut per_claim_reports = Vec::with_capacity(assembled.claims.len());

    let mut writer = InterchangeWriter::new(config)?;
    writer.open()?;

    for (i, claim) in assembled.claims.into_iter().enumerate() {
        let mut enriched = enrich(claim);
        enriched.receiver = resolve_receiver(&enriched, config);
        let clm_number = enriched.claim.clm_number.clone();

        let validation = validate(&enriched);
        if !validation.is_valid {
            batch_report.push(Issue::warning(
                "BATCH_040",
                format!("claims[{i}]"),
                format!(
                    "Claim {} excluded: {} validation error(s)",
                    clm_number,
                    validation.error_count()
                ),
            ));
            batch_report.claims_rejected += 1;
            per_claim_reports.push(ClaimReports {
                clm_number,
                validation,
                emitted: false,
            });
            continue;
        }

        match writer.write_claim(&enriched) {
            Ok(()) => {
                per_claim_reports.push(ClaimReports {
                    clm_number,
                    validation,
                    emitted: true,
                });
            }
            Err(e) => {
                // Writer failures are fatal per claim, never per batch
                batch_report.push(Issue::error(
                    "BATCH_041",
                    format!("claims[{i}]"),
                    format!("Claim {clm_number} failed during emission: {e}"),
                ));
                batch_report.claims_rejected += 1;
                per_claim_reports.push(ClaimReports {
                    clm_number,
                    validation,
                    emitted: false,
                });
            }
        }
    }

    if writer.transaction_count() == 0 {
        tracing::warn!("Batch produced no emittable claims");
        return Ok(BatchOutcome {
            edi: None,
            batch_report,
            per_claim_reports,
            compliance_report: None,
            payer_report: None,
        });
    }

    let bytes = writer.close()?;
    let compliance_report = check_compliance(&bytes);
    let payer_report = check_payer_rules(&bytes, PayerRuleSet::Uhc)?;

    Ok(BatchOutcome {
        edi: Some(bytes),
        batch_report,
        per_claim_reports,
        compliance_report: Some(compliance_report),
        payer_report: Some(payer_report),
    })
}
