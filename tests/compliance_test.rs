//! Compliance and payer checks on emitted and tampered interchanges

use chrono::{NaiveDate, NaiveDateTime};
use kaizen::config::BuildConfig;
use kaizen::core::{check_compliance, check_payer_rules, PayerRuleSet};
use kaizen::domain::{
    Address, Claim, ClaimRecord, MemberGroup, PersonName, Provider, Service, Submitter,
    Subscriber,
};

fn stamp() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 1, 15)
        .unwrap()
        .and_hms_opt(10, 30, 0)
        .unwrap()
}

fn config() -> BuildConfig {
    BuildConfig {
        payer_preset: Some("UHC_CS".to_string()),
        timestamp: Some(stamp()),
        ..Default::default()
    }
}

fn record() -> ClaimRecord {
    ClaimRecord {
        submitter: Submitter {
            name: "KAIZEN CLEARING".to_string(),
            id: "KZN001".to_string(),
            ..Default::default()
        },
        billing_provider: Provider {
            npi: "1111111111".to_string(),
            name: "KAIZEN TRANSIT".to_string(),
            address: Some(Address {
                line1: "1 MAIN ST".to_string(),
                city: "LOUISVILLE".to_string(),
                state: "KY".to_string(),
                zip: "40202".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        },
        subscriber: Subscriber {
            member_id: "JOHN123456".to_string(),
            name: PersonName {
                first: "JOHN".to_string(),
                last: "DOE".to_string(),
            },
            ..Default::default()
        },
        claim: Claim {
            clm_number: "KZN-20260101-001".to_string(),
            total_charge: 62.5,
            from: Some("2026-01-01".to_string()),
            payment_status: Some("P".to_string()),
            submission_channel: Some("ELECTRONIC".to_string()),
            rendering_network_indicator: Some("I".to_string()),
            member_group: Some(MemberGroup {
                group_id: "G100".to_string(),
                sub_group_id: "SG1".to_string(),
                class_id: "C1".to_string(),
                plan_id: "PL1".to_string(),
                product_id: "PRD1".to_string(),
            }),
            ..Default::default()
        },
        services: vec![
            Service {
                hcpcs: "A0130".to_string(),
                charge: 60.0,
                ..Default::default()
            },
            Service {
                hcpcs: "A0425".to_string(),
                charge: 2.5,
                units: Some(8.0),
                ..Default::default()
            },
        ],
        ..Default::default()
    }
}

fn emit() -> String {
    let outcome = kaizen::build(record(), &config()).unwrap();
    String::from_utf8(outcome.edi.unwrap()).unwrap()
}

#[test]
fn emitted_interchange_is_compliant() {
    let edi = emit();
    let report = check_compliance(edi.as_bytes());
    assert!(report.is_valid, "{}", report.format_text());
}

#[test]
fn emitted_interchange_passes_payer_rules() {
    let edi = emit();
    let report = check_payer_rules(edi.as_bytes(), PayerRuleSet::Uhc).unwrap();
    assert!(report.is_valid, "{}", report.format_text());
}

#[test]
fn pretty_mode_output_still_parses() {
    let mut cfg = config();
    cfg.pretty = true;
    let outcome = kaizen::build(record(), &cfg).unwrap();
    let edi = outcome.edi.unwrap();
    assert!(edi.contains(&b'\n'));
    let report = check_compliance(&edi);
    assert!(report.is_valid, "{}", report.format_text());
}

#[test]
fn custom_delimiters_round_trip() {
    let mut cfg = config();
    cfg.element_separator = "|".to_string();
    cfg.segment_terminator = "!".to_string();
    let outcome = kaizen::build(record(), &cfg).unwrap();
    let edi = outcome.edi.unwrap();
    let report = check_compliance(&edi);
    assert!(report.is_valid, "{}", report.format_text());
}

#[test]
fn dropped_trailer_is_detected() {
    let edi = emit();
    let truncated = edi.rsplit_once("IEA").unwrap().0;
    let report = check_compliance(truncated.as_bytes());
    assert!(!report.is_valid);
    assert!(report.errors().any(|i| i.code == "ENV_002"));
}

#[test]
fn corrupted_se_count_is_detected() {
    let edi = emit();
    let se_start = edi.find("SE*").unwrap();
    let se_end = edi[se_start..].find('~').unwrap() + se_start;
    let tampered = format!("{}SE*99*1{}", &edi[..se_start], &edi[se_end..]);
    let report = check_compliance(tampered.as_bytes());
    assert!(report.errors().any(|i| i.code == "ENV_008"));
}

#[test]
fn mismatched_group_control_is_detected() {
    let edi = emit().replace("GE*1*1~", "GE*1*7~");
    let report = check_compliance(edi.as_bytes());
    assert!(report.errors().any(|i| i.code == "ENV_006"));
}

#[test]
fn checker_tally_matches_writer_tally() {
    let edi = emit();
    let segments = kaizen::core::parse_interchange(edi.as_bytes()).unwrap();

    let st = segments.iter().position(|s| s.id == "ST").unwrap();
    let se = segments.iter().position(|s| s.id == "SE").unwrap();
    let declared: usize = segments[se].element(1).parse().unwrap();
    assert_eq!(declared, se - st + 1);
}

#[test]
fn k3_grammar_violation_in_foreign_file_is_flagged() {
    // A hand-built file with a K3 the payer grammar rejects
    let edi = emit().replace("K3*SNWK-I~", "K3*SNWK-INNETWORK~");
    let report = check_payer_rules(edi.as_bytes(), PayerRuleSet::Uhc).unwrap();
    assert!(report.errors().any(|i| i.code == "UHC_034"));
}
