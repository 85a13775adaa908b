//! X12 compliance checking
//!
//! Re-parses an emitted interchange and verifies structural integrity:
//! envelope balance with control-number equality, required segments per
//! transaction, segment ordering inside the 2300 and 2400 loops, the
//! SV111 emergency indicator position, and loop-placement ambiguities.
//! The parser here is also used by the payer rule validator.

use crate::codes;
use crate::domain::{ComplianceReport, Issue, Report};

/// One parsed X12 segment
#[derive(Debug, Clone)]
pub struct Segment {
    /// Segment identifier (CLM, NM1, K3, ...)
    pub id: String,
    /// Data elements, excluding the identifier
    pub elements: Vec<String>,
    /// Position in the interchange, 0-indexed
    pub index: usize,
}

impl Segment {
    /// Element by 1-based X12 position (element(1) is e.g. NM101)
    pub fn element(&self, position: usize) -> &str {
        self.elements
            .get(position.saturating_sub(1))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Splits an interchange into segments, reading the delimiters from the
/// fixed-width ISA header
///
/// Newlines around segments (pretty mode) are ignored.
pub fn parse_interchange(bytes: &[u8]) -> Result<Vec<Segment>, String> {
    let content = std::str::from_utf8(bytes).map_err(|e| format!("not valid UTF-8: {e}"))?;
    if content.len() < 106 || !content.starts_with("ISA") {
        return Err("interchange must start with a fixed-width ISA segment".to_string());
    }

    let element_sep = content.as_bytes()[3] as char;
    // ISA is fixed-width: the terminator is the 106th byte
    let terminator = content.as_bytes()[105] as char;

    let mut segments = Vec::new();
    for raw in content.split(terminator) {
        let raw = raw.trim_matches(['\r', '\n', ' ']);
        if raw.is_empty() {
            continue;
        }
        let mut parts = raw.split(element_sep);
        let id = parts.next().unwrap_or("").to_string();
        let elements: Vec<String> = parts.map(str::to_string).collect();
        let index = segments.len();
        segments.push(Segment { id, elements, index });
    }

    if segments.is_empty() {
        return Err("no segments found".to_string());
    }
    Ok(segments)
}

/// Checks an emitted interchange for structural compliance
pub fn check_compliance(bytes: &[u8]) -> ComplianceReport {
    let mut report = Report::new();

    let segments = match parse_interchange(bytes) {
        Ok(segments) => segments,
        Err(message) => {
            report.push(Issue::error(
                "PARSE_001",
                "interchange",
                format!("Failed to parse EDI content: {message}"),
            ));
            return report;
        }
    };

    check_envelope(&segments, &mut report);
    for transaction in transactions(&segments) {
        check_transaction(transaction, &mut report);
    }
    check_qualifiers(&segments, &mut report);

    tracing::debug!(
        segments = segments.len(),
        errors = report.error_count(),
        "Compliance check finished"
    );

    report
}

fn check_envelope(segments: &[Segment], report: &mut Report) {
    let first = &segments[0];
    if first.id != "ISA" {
        report.push(
            Issue::error("ENV_001", "segment[0]", "EDI must start with ISA segment")
                .with_expected("ISA")
                .with_actual(&first.id),
        );
    }
    let last = &segments[segments.len() - 1];
    if last.id != "IEA" {
        report.push(
            Issue::error(
                "ENV_002",
                format!("segment[{}]", last.index),
                "EDI must end with IEA segment",
            )
            .with_expected("IEA")
            .with_actual(&last.id),
        );
    }

    let count = |id: &str| segments.iter().filter(|s| s.id == id).count();
    let gs_count = count("GS");
    let ge_count = count("GE");
    if gs_count != ge_count {
        report.push(
            Issue::error(
                "ENV_003",
                "interchange",
                format!("Mismatched GS/GE segments: {gs_count} GS vs {ge_count} GE"),
            )
            .with_expected(format!("{gs_count} GE segments"))
            .with_actual(format!("{ge_count} GE segments")),
        );
    }
    let st_count = count("ST");
    let se_count = count("SE");
    if st_count != se_count {
        report.push(
            Issue::error(
                "ENV_004",
                "interchange",
                format!("Mismatched ST/SE segments: {st_count} ST vs {se_count} SE"),
            )
            .with_expected(format!("{st_count} SE segments"))
            .with_actual(format!("{se_count} SE segments")),
        );
    }

    // Control number equality between headers and trailers
    if let (Some(isa), Some(iea)) = (
        segments.iter().find(|s| s.id == "ISA"),
        segments.iter().find(|s| s.id == "IEA"),
    ) {
        if isa.element(13) != iea.element(2) {
            report.push(
                Issue::error(
                    "ENV_005",
                    "interchange",
                    "ISA13 control number does not match IEA02",
                )
                .with_expected(isa.element(13))
                .with_actual(iea.element(2)),
            );
        }
        let group_count: usize = iea.element(1).parse().unwrap_or(0);
        if group_count != gs_count {
            report.push(
                Issue::error(
                    "ENV_010",
                    "interchange",
                    "IEA01 does not match the number of functional groups",
                )
                .with_expected(gs_count.to_string())
                .with_actual(iea.element(1)),
            );
        }
    }
    if let (Some(gs), Some(ge)) = (
        segments.iter().find(|s| s.id == "GS"),
        segments.iter().find(|s| s.id == "GE"),
    ) {
        if gs.element(6) != ge.element(2) {
            report.push(
                Issue::error(
                    "ENV_006",
                    "interchange",
                    "GS06 control number does not match GE02",
                )
                .with_expected(gs.element(6))
                .with_actual(ge.element(2)),
            );
        }
        let tx_count: usize = ge.element(1).parse().unwrap_or(0);
        if tx_count != st_count {
            report.push(
                Issue::error(
                    "ENV_009",
                    "interchange",
                    "GE01 does not match the number of transaction sets",
                )
                .with_expected(st_count.to_string())
                .with_actual(ge.element(1)),
            );
        }
    }
}

/// Slices the interchange into ST..SE transaction sets, inclusive
fn transactions(segments: &[Segment]) -> Vec<&[Segment]> {
    let mut out = Vec::new();
    let mut start = None;
    for (i, segment) in segments.iter().enumerate() {
        match segment.id.as_str() {
            "ST" => start = Some(i),
            "SE" => {
                if let Some(s) = start.take() {
                    out.push(&segments[s..=i]);
                }
            }
            _ => {}
        }
    }
    out
}

fn check_transaction(transaction: &[Segment], report: &mut Report) {
    let st = &transaction[0];
    let se = &transaction[transaction.len() - 1];
    let st_path = format!("segment[{}]:ST", st.index);

    // SE01 carries the ST..SE inclusive segment count, SE02 the control
    // number matching ST02
    let declared: usize = se.element(1).parse().unwrap_or(0);
    if declared != transaction.len() {
        report.push(
            Issue::error(
                "ENV_008",
                format!("segment[{}]:SE", se.index),
                "SE01 does not match the actual segment count",
            )
            .with_expected(transaction.len().to_string())
            .with_actual(se.element(1)),
        );
    }
    if st.element(2) != se.element(2) {
        report.push(
            Issue::error(
                "ENV_007",
                format!("segment[{}]:SE", se.index),
                "ST02 control number does not match SE02",
            )
            .with_expected(st.element(2))
            .with_actual(se.element(2)),
        );
    }

    // Required segments per transaction
    let has = |id: &str| transaction.iter().any(|s| s.id == id);
    if !has("BHT") {
        report.push(Issue::error(
            "TXN_001",
            &st_path,
            "BHT segment is required after ST",
        ));
    }
    if !transaction
        .iter()
        .any(|s| s.id == "NM1" && s.element(1) == "85")
    {
        report.push(Issue::error(
            "TXN_002",
            &st_path,
            "Loop 2010AA billing provider (NM1*85) is required",
        ));
    }
    if !transaction
        .iter()
        .any(|s| s.id == "NM1" && s.element(1) == "IL")
    {
        report.push(Issue::error(
            "TXN_003",
            &st_path,
            "Loop 2010BA subscriber (NM1*IL) is required",
        ));
    }
    if !has("CLM") {
        report.push(Issue::error(
            "LOOP_001",
            &st_path,
            "No CLM segment found - Loop 2300 is required",
        ));
        return;
    }

    for claim in claim_blocks(transaction) {
        check_claim_block(claim, report);
    }
}

/// Slices a transaction into claim blocks, CLM through the segment
/// before the next CLM or the SE
fn claim_blocks(transaction: &[Segment]) -> Vec<&[Segment]> {
    let clm_positions: Vec<usize> = transaction
        .iter()
        .enumerate()
        .filter(|(_, s)| s.id == "CLM")
        .map(|(i, _)| i)
        .collect();
    let mut out = Vec::new();
    for (n, &start) in clm_positions.iter().enumerate() {
        let end = clm_positions
            .get(n + 1)
            .copied()
            .unwrap_or(transaction.len() - 1);
        out.push(&transaction[start..end]);
    }
    out
}

fn check_claim_block(claim: &[Segment], report: &mut Report) {
    let clm = &claim[0];
    let clm_path = format!("segment[{}]:CLM", clm.index);

    let sv1_positions: Vec<usize> = claim
        .iter()
        .enumerate()
        .filter(|(_, s)| s.id == "SV1")
        .map(|(i, _)| i)
        .collect();
    if sv1_positions.is_empty() {
        report.push(Issue::error(
            "LOOP_004",
            &clm_path,
            "Claim has no SV1 service line",
        ));
    }

    // At most one CR1 per claim
    let cr1_count = claim.iter().filter(|s| s.id == "CR1").count();
    if cr1_count > 1 {
        report.push(
            Issue::error(
                "NEMT_005",
                &clm_path,
                "More than one CR1 segment in the claim loop",
            )
            .with_expected("At most 1")
            .with_actual(cr1_count.to_string()),
        );
    }

    let first_lx = claim.iter().position(|s| s.id == "LX");

    // Dual-level pickup/dropoff ambiguity
    for (qualifier, code, loops) in [
        ("PW", "LOOP_002", "2310E/2420G"),
        ("45", "LOOP_003", "2310F/2420H"),
    ] {
        if let Some(lx) = first_lx {
            let claim_level = claim[..lx]
                .iter()
                .any(|s| s.id == "NM1" && s.element(1) == qualifier);
            let service_level = claim[lx..]
                .iter()
                .any(|s| s.id == "NM1" && s.element(1) == qualifier);
            if claim_level && service_level {
                report.push(Issue::warning(
                    code,
                    &clm_path,
                    format!(
                        "Location (NM1*{qualifier}) present at both claim and service level ({loops})"
                    ),
                ));
            }
        }
    }

    // Service-loop ordering
    if let Some(lx) = first_lx {
        let lx_positions: Vec<usize> = claim
            .iter()
            .enumerate()
            .skip(lx)
            .filter(|(_, s)| s.id == "LX")
            .map(|(i, _)| i)
            .collect();
        for (n, &start) in lx_positions.iter().enumerate() {
            let end = lx_positions.get(n + 1).copied().unwrap_or(claim.len());
            check_service_block(&claim[start..end], claim[start].index, report);
        }
    }

    check_mileage_adjacency(claim, &sv1_positions, report);
}

fn check_service_block(line: &[Segment], base_index: usize, report: &mut Report) {
    // K3 must precede any 2420 provider loop
    let first_k3 = line.iter().position(|s| s.id == "K3");
    let first_nm1 = line.iter().position(|s| s.id == "NM1");
    if let (Some(k3), Some(nm1)) = (first_k3, first_nm1) {
        if k3 > nm1 {
            report.push(Issue::error(
                "ORDER_001",
                format!("segment[{}]:LX", base_index),
                "K3 segment must appear before provider loops (NM1) in Loop 2400",
            ));
        }
    }

    // Emergency indicator belongs in SV111, never SV110
    for sv1 in line.iter().filter(|s| s.id == "SV1") {
        if !sv1.element(10).is_empty() {
            report.push(
                Issue::error(
                    "NEMT_006",
                    format!("segment[{}]:SV1", sv1.index),
                    "Emergency indicator found in SV110; it belongs in SV111",
                )
                .with_expected("SV111")
                .with_actual(format!("SV110={}", sv1.element(10))),
            );
        }
    }
}

/// HCPCS code from an SV101 composite (`HC:A0425:RH` → `A0425`)
fn sv1_hcpcs(sv1: &Segment) -> Option<String> {
    let composite = sv1.element(1);
    let mut parts = composite.split(':');
    let qualifier = parts.next()?;
    if qualifier != "HC" {
        return None;
    }
    parts.next().map(str::to_string)
}

fn check_mileage_adjacency(claim: &[Segment], sv1_positions: &[usize], report: &mut Report) {
    for (n, &pos) in sv1_positions.iter().enumerate() {
        let sv1 = &claim[pos];
        let code = match sv1_hcpcs(sv1) {
            Some(code) => code,
            None => continue,
        };
        if !codes::is_mileage(&code) {
            continue;
        }
        if n == 0 {
            report.push(
                Issue::error(
                    "NEMT_003",
                    format!("segment[{}]:SV1", sv1.index),
                    format!(
                        "Mileage code {code} appears as first service line - must follow a transport service"
                    ),
                )
                .with_expected("Transport service before mileage")
                .with_actual(format!("{code} at position 1")),
            );
        } else {
            let prev = &claim[sv1_positions[n - 1]];
            if let Some(prev_code) = sv1_hcpcs(prev) {
                if codes::is_mileage(&prev_code) {
                    report.push(Issue::warning(
                        "NEMT_004",
                        format!("segment[{}]:SV1", sv1.index),
                        format!("Consecutive mileage codes: {prev_code} followed by {code}"),
                    ));
                }
            }
        }
    }
}

fn check_qualifiers(segments: &[Segment], report: &mut Report) {
    const KNOWN: [&str; 14] = [
        "41", "40", "85", "IL", "PR", "DQ", "PW", "45", "77", "82", "DN", "P3", "DK", "QC",
    ];
    for segment in segments.iter().filter(|s| s.id == "NM1") {
        let qualifier = segment.element(1);
        if !qualifier.is_empty() && !KNOWN.contains(&qualifier) {
            report.push(Issue::info(
                "QUAL_001",
                format!("segment[{}]:NM1", segment.index),
                format!("Unusual NM1 entity qualifier: {qualifier}"),
            ));
        }
    }
}
