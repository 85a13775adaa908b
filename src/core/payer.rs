//! Payer-specific rule validation
//!
//! Enforces payer content constraints on the emitted interchange:
//! K3 value grammars, the mandatory member-group NTE, supervising
//! providers for special transport codes, adjustment segments on
//! denials, and the NEMIS duplicate criterion. The K3 grammar is a
//! data-driven table per rule set rather than hard-coded writer logic.

use crate::codes;
use crate::core::compliance::{parse_interchange, Segment};
use crate::domain::{Issue, KaizenError, PayerReport, Report, Result};
use regex::Regex;
use std::collections::HashSet;

/// Supported payer rule sets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayerRuleSet {
    /// UnitedHealthcare Community & State
    Uhc,
}

/// One K3 block grammar entry: leading tag, value pattern, and the
/// other tags allowed to follow it in the same segment
struct K3Rule {
    tag: &'static str,
    value: &'static str,
    companions: &'static [&'static str],
}

const UHC_K3_RULES: [K3Rule; 11] = [
    K3Rule { tag: "PYMS", value: r"^[PD]$", companions: &[] },
    K3Rule { tag: "SUB", value: r"^.+$", companions: &["IPAD", "USER"] },
    K3Rule { tag: "IPAD", value: r"^.+$", companions: &["USER"] },
    K3Rule { tag: "USER", value: r"^.+$", companions: &[] },
    K3Rule { tag: "SNWK", value: r"^[IO]$", companions: &[] },
    K3Rule { tag: "TRPN", value: r"^ASPUFE(ELECTRONIC|PAPER)$", companions: &[] },
    K3Rule { tag: "DREC", value: r"^\d{8}$", companions: &["DADJ", "PAIDDT"] },
    K3Rule { tag: "DADJ", value: r"^\d{8}$", companions: &["PAIDDT"] },
    K3Rule { tag: "PAIDDT", value: r"^\d{8}$", companions: &[] },
    K3Rule { tag: "AL1", value: r"^.+$", companions: &["AL2"] },
    K3Rule { tag: "CY", value: r"^.+$", companions: &["ST", "ZIP"] },
];

/// Validates payer rules against an emitted interchange
///
/// # Errors
///
/// Returns [`KaizenError::Validation`] only on internal failures
/// (grammar compilation); findings go into the report.
pub fn check_payer_rules(bytes: &[u8], rule_set: PayerRuleSet) -> Result<PayerReport> {
    let PayerRuleSet::Uhc = rule_set;
    let mut report = Report::new();

    let segments = match parse_interchange(bytes) {
        Ok(segments) => segments,
        Err(message) => {
            report.push(Issue::error(
                "PARSE_001",
                "interchange",
                format!("Failed to parse EDI content: {message}"),
            ));
            return Ok(report);
        }
    };

    let value_patterns = compile_value_patterns()?;

    let mut seen_triples: HashSet<(String, String, String)> = HashSet::new();
    for claim in claim_blocks(&segments) {
        check_k3_grammar(claim, &value_patterns, &mut report)?;
        check_member_group_nte(claim, &mut report);
        check_supervising(claim, &mut report);
        check_denial_adjustments(claim, &mut report);
        check_duplicate_triple(claim, &mut seen_triples, &mut report);
    }

    tracing::debug!(errors = report.error_count(), "Payer rule check finished");
    Ok(report)
}

fn compile_value_patterns() -> Result<Vec<(&'static str, Regex, &'static [&'static str])>> {
    let mut out = Vec::with_capacity(UHC_K3_RULES.len() + 2);
    for rule in &UHC_K3_RULES {
        let re = Regex::new(rule.value)
            .map_err(|e| KaizenError::Validation(format!("bad K3 grammar: {e}")))?;
        out.push((rule.tag, re, rule.companions));
    }
    // Companion-only tags with their own value shapes
    let st = Regex::new(r"^[A-Z]{2}$")
        .map_err(|e| KaizenError::Validation(format!("bad K3 grammar: {e}")))?;
    out.push(("ST", st, &["ZIP"]));
    let zip = Regex::new(r"^\d{5}(-\d{4})?$")
        .map_err(|e| KaizenError::Validation(format!("bad K3 grammar: {e}")))?;
    out.push(("ZIP", zip, &[]));
    let al2 = Regex::new(r"^.+$")
        .map_err(|e| KaizenError::Validation(format!("bad K3 grammar: {e}")))?;
    out.push(("AL2", al2, &[]));
    Ok(out)
}

/// Claim blocks across every transaction in the interchange
fn claim_blocks(segments: &[Segment]) -> Vec<&[Segment]> {
    let mut out = Vec::new();
    let mut start: Option<usize> = None;
    for (i, segment) in segments.iter().enumerate() {
        match segment.id.as_str() {
            "CLM" => {
                if let Some(s) = start.take() {
                    out.push(&segments[s..i]);
                }
                start = Some(i);
            }
            "SE" => {
                if let Some(s) = start.take() {
                    out.push(&segments[s..i]);
                }
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        out.push(&segments[s..]);
    }
    out
}

fn check_k3_grammar(
    claim: &[Segment],
    patterns: &[(&'static str, Regex, &'static [&'static str])],
    report: &mut Report,
) -> Result<()> {
    for k3 in claim.iter().filter(|s| s.id == "K3") {
        let content = k3.element(1);
        let path = format!("segment[{}]:K3", k3.index);

        let parts: Vec<&str> = content.split(';').collect();
        let mut lead: Option<&str> = None;
        for part in &parts {
            let (tag, value) = match part.split_once('-') {
                Some(pair) => pair,
                None => {
                    report.push(
                        Issue::error(
                            "UHC_033",
                            &path,
                            "K3 block is not in TAG-value form",
                        )
                        .with_actual(*part),
                    );
                    continue;
                }
            };
            let entry = patterns.iter().find(|(t, _, _)| *t == tag);
            match entry {
                None => {
                    report.push(
                        Issue::error("UHC_033", &path, "Unrecognized K3 tag")
                            .with_actual(tag),
                    );
                }
                Some((_, re, _)) => {
                    if !re.is_match(value) {
                        report.push(
                            Issue::error(
                                "UHC_034",
                                &path,
                                format!("K3 {tag} value does not match the required grammar"),
                            )
                            .with_expected(re.as_str())
                            .with_actual(value),
                        );
                    }
                    match lead {
                        None => lead = Some(tag),
                        Some(leader) => {
                            let allowed = patterns
                                .iter()
                                .find(|(t, _, _)| *t == leader)
                                .map(|(_, _, companions)| companions.contains(&tag))
                                .unwrap_or(false);
                            if !allowed {
                                report.push(
                                    Issue::error(
                                        "UHC_035",
                                        &path,
                                        format!("K3 tag {tag} may not follow {leader}"),
                                    )
                                    .with_actual(content),
                                );
                            }
                            lead = Some(tag);
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

fn check_member_group_nte(claim: &[Segment], report: &mut Report) {
    let has_group = claim.iter().any(|s| {
        s.id == "NTE" && s.element(1) == "ADD" && s.element(2).starts_with("GRP-")
    });
    if !has_group {
        report.push(Issue::error(
            "UHC_030",
            format!("segment[{}]:CLM", claim[0].index),
            "NTE*ADD*GRP member group block is required on every claim",
        ));
    }
}

fn check_supervising(claim: &[Segment], report: &mut Report) {
    let special: Vec<String> = claim
        .iter()
        .filter(|s| s.id == "SV1")
        .filter_map(sv1_hcpcs)
        .filter(|code| codes::requires_supervising(code))
        .collect();
    if special.is_empty() {
        return;
    }
    let has_supervising = claim
        .iter()
        .any(|s| s.id == "NM1" && s.element(1) == "DQ");
    if !has_supervising {
        report.push(
            Issue::error(
                "UHC_020",
                format!("segment[{}]:CLM", claim[0].index),
                format!(
                    "HCPCS {} requires a supervising or attendant provider",
                    special.join(", ")
                ),
            )
            .with_expected("NM1*DQ loop")
            .with_actual("Missing"),
        );
    }
}

fn check_denial_adjustments(claim: &[Segment], report: &mut Report) {
    let first_lx = claim.iter().position(|s| s.id == "LX").unwrap_or(claim.len());
    let clm_path = format!("segment[{}]:CLM", claim[0].index);

    // Claim-level denial
    let claim_denied = claim[..first_lx]
        .iter()
        .any(|s| s.id == "K3" && s.element(1) == "PYMS-D");
    if claim_denied {
        let has_cas = claim[..first_lx].iter().any(|s| s.id == "CAS");
        if !has_cas {
            report.push(Issue::error(
                "UHC_031",
                &clm_path,
                "Denied claim carries no claim-level CAS adjustment",
            ));
        }
    }

    // Service-level denials
    let lx_positions: Vec<usize> = claim
        .iter()
        .enumerate()
        .filter(|(_, s)| s.id == "LX")
        .map(|(i, _)| i)
        .collect();
    for (n, &start) in lx_positions.iter().enumerate() {
        let end = lx_positions.get(n + 1).copied().unwrap_or(claim.len());
        let line = &claim[start..end];
        let denied = line
            .iter()
            .any(|s| s.id == "K3" && s.element(1) == "PYMS-D");
        if denied && !line.iter().any(|s| s.id == "CAS") {
            report.push(Issue::error(
                "UHC_032",
                format!("segment[{}]:LX", claim[start].index),
                "Denied service line carries no CAS adjustment",
            ));
        }
    }
}

fn check_duplicate_triple(
    claim: &[Segment],
    seen: &mut HashSet<(String, String, String)>,
    report: &mut Report,
) {
    let clm = &claim[0];
    let clm01 = clm.element(1).to_string();
    let frequency = clm
        .element(5)
        .split(':')
        .nth(2)
        .unwrap_or("")
        .to_string();
    let original = claim
        .iter()
        .find(|s| s.id == "REF" && s.element(1) == "F8")
        .map(|s| s.element(2).to_string())
        .unwrap_or_default();

    let triple = (clm01, frequency, original);
    if !seen.insert(triple.clone()) {
        report.push(
            Issue::error(
                "UHC_040",
                format!("segment[{}]:CLM", clm.index),
                format!(
                    "Duplicate claim per NEMIS criteria: CLM01={}, CLM05-3={}, REF*F8={}",
                    triple.0, triple.1, triple.2
                ),
            )
            .with_expected("Unique (CLM01, CLM05-3, REF*F8) per interchange"),
        );
    }
}

fn sv1_hcpcs(sv1: &Segment) -> Option<String> {
    let mut parts = sv1.element(1).split(':');
    if parts.next()? != "HC" {
        return None;
    }
    parts.next().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interchange(claim_body: &str) -> String {
        let isa = format!(
            "ISA*00*{:10}*00*{:10}*ZZ*{:15}*ZZ*{:15}*260115*1030*^*00501*000000001*0*T*:~",
            "", "", "SENDERID", "RECEIVERID"
        );
        format!(
            "{isa}GS*HC*SENDER*RECEIVER*20260115*1030*1*X*005010X222A1~\
             ST*837*1*005010X222A1~\
             BHT*0019*00*X*20260115*1030*CH~\
             {claim_body}\
             SE*4*1~GE*1*1~IEA*1*000000001~"
        )
    }

    fn base_claim() -> String {
        "CLM*KZN-1*60.00***41:B:1*Y*A*Y*Y~\
         DTP*472*D8*20260101~\
         K3*PYMS-P~\
         K3*SNWK-I~\
         K3*TRPN-ASPUFEELECTRONIC~\
         NTE*ADD*GRP-G;SGR-S;CLS-C;PLN-P;PRD-PR~\
         LX*1~\
         SV1*HC:A0130*60.00*UN*1***41~\
         DTP*472*D8*20260101~"
            .to_string()
    }

    #[test]
    fn test_valid_claim_passes() {
        let report =
            check_payer_rules(interchange(&base_claim()).as_bytes(), PayerRuleSet::Uhc).unwrap();
        assert!(report.is_valid, "{}", report.format_text());
    }

    #[test]
    fn test_missing_group_nte_rejected() {
        let body = base_claim().replace("NTE*ADD*GRP-G;SGR-S;CLS-C;PLN-P;PRD-PR~", "");
        let report = check_payer_rules(interchange(&body).as_bytes(), PayerRuleSet::Uhc).unwrap();
        assert!(report.errors().any(|i| i.code == "UHC_030"));
    }

    #[test]
    fn test_bad_k3_value_rejected() {
        let body = base_claim().replace("K3*PYMS-P~", "K3*PYMS-X~");
        let report = check_payer_rules(interchange(&body).as_bytes(), PayerRuleSet::Uhc).unwrap();
        assert!(report.errors().any(|i| i.code == "UHC_034"));
    }

    #[test]
    fn test_unknown_k3_tag_rejected() {
        let body = base_claim().replace("K3*SNWK-I~", "K3*WHAT-I~");
        let report = check_payer_rules(interchange(&body).as_bytes(), PayerRuleSet::Uhc).unwrap();
        assert!(report.errors().any(|i| i.code == "UHC_033"));
    }

    #[test]
    fn test_trpn_grammar_is_exact() {
        let body = base_claim().replace(
            "K3*TRPN-ASPUFEELECTRONIC~",
            "K3*TRPN-ASPUFEELEC~",
        );
        let report = check_payer_rules(interchange(&body).as_bytes(), PayerRuleSet::Uhc).unwrap();
        assert!(report.errors().any(|i| i.code == "UHC_034"));
    }

    #[test]
    fn test_denied_claim_without_cas_rejected() {
        let body = base_claim().replace("K3*PYMS-P~", "K3*PYMS-D~");
        let report = check_payer_rules(interchange(&body).as_bytes(), PayerRuleSet::Uhc).unwrap();
        assert!(report.errors().any(|i| i.code == "UHC_031"));
    }

    #[test]
    fn test_denied_claim_with_cas_accepted() {
        let body = base_claim().replace(
            "K3*PYMS-D~",
            "K3*PYMS-P~",
        );
        // Denied with the auto-fallback CAS in place
        let body = body.replace("K3*PYMS-P~", "K3*PYMS-D~CAS*CO*45*60.00~");
        let report = check_payer_rules(interchange(&body).as_bytes(), PayerRuleSet::Uhc).unwrap();
        assert!(!report.errors().any(|i| i.code == "UHC_031"));
    }

    #[test]
    fn test_supervising_required_for_special_transport() {
        let body = base_claim().replace("SV1*HC:A0130", "SV1*HC:A0110");
        let report = check_payer_rules(interchange(&body).as_bytes(), PayerRuleSet::Uhc).unwrap();
        assert!(report.errors().any(|i| i.code == "UHC_020"));

        let with_supervising = base_claim().replace("SV1*HC:A0130", "SV1*HC:A0110")
            + "NM1*DQ*1*SMITH*JANE~";
        let report =
            check_payer_rules(interchange(&with_supervising).as_bytes(), PayerRuleSet::Uhc)
                .unwrap();
        assert!(!report.errors().any(|i| i.code == "UHC_020"));
    }

    #[test]
    fn test_duplicate_triple_detected() {
        let two_claims = format!("{}{}", base_claim(), base_claim());
        let report =
            check_payer_rules(interchange(&two_claims).as_bytes(), PayerRuleSet::Uhc).unwrap();
        assert!(report.errors().any(|i| i.code == "UHC_040"));
    }

    #[test]
    fn test_distinct_triples_pass() {
        let second = base_claim().replace("CLM*KZN-1", "CLM*KZN-2");
        let two_claims = format!("{}{}", base_claim(), second);
        let report =
            check_payer_rules(interchange(&two_claims).as_bytes(), PayerRuleSet::Uhc).unwrap();
        assert!(!report.errors().any(|i| i.code == "UHC_040"));
    }

    #[test]
    fn test_date_k3_grammar() {
        let body = base_claim().replace(
            "K3*SNWK-I~",
            "K3*SNWK-I~K3*DREC-20260102;DADJ-20260105;PAIDDT-20260110~",
        );
        let report = check_payer_rules(interchange(&body).as_bytes(), PayerRuleSet::Uhc).unwrap();
        assert!(report.is_valid, "{}", report.format_text());

        let bad = base_claim().replace("K3*SNWK-I~", "K3*SNWK-I~K3*DREC-2026-01-02~");
        let report = check_payer_rules(interchange(&bad).as_bytes(), PayerRuleSet::Uhc).unwrap();
        assert!(report.errors().any(|i| i.code == "UHC_034"));
    }
}
