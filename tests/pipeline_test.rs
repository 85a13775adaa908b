//! End-to-end pipeline scenarios against the public build entry points

use chrono::{NaiveDate, NaiveDateTime};
use kaizen::config::BuildConfig;
use kaizen::core::parse_interchange;
use kaizen::domain::{
    Address, Claim, ClaimRecord, MemberGroup, PersonName, Provider, Receiver, Service, Submitter,
    Subscriber, TripRecord,
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
        interchange_sender_id: "KZN001".to_string(),
        gs_sender_code: "KZN".to_string(),
        submitter_name: Some("KAIZEN CLEARING".to_string()),
        submitter_id: Some("KZN001".to_string()),
        timestamp: Some(stamp()),
        ..Default::default()
    }
}

fn member_group() -> MemberGroup {
    MemberGroup {
        group_id: "G100".to_string(),
        sub_group_id: "SG1".to_string(),
        class_id: "C1".to_string(),
        plan_id: "PL1".to_string(),
        product_id: "PRD1".to_string(),
    }
}

fn provider(npi: &str, name: &str) -> Provider {
    Provider {
        npi: npi.to_string(),
        name: name.to_string(),
        tax_id: Some("123456789".to_string()),
        address: Some(Address {
            line1: "1 MAIN ST".to_string(),
            city: "LOUISVILLE".to_string(),
            state: "KY".to_string(),
            zip: "40202".to_string(),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn subscriber(member_id: &str) -> Subscriber {
    Subscriber {
        member_id: member_id.to_string(),
        name: PersonName {
            first: "JOHN".to_string(),
            last: "DOE".to_string(),
        },
        dob: Some("1980-05-05".to_string()),
        sex: Some("M".to_string()),
        ..Default::default()
    }
}

fn claim_record(clm_number: &str, total: f64, services: Vec<Service>) -> ClaimRecord {
    ClaimRecord {
        submitter: Submitter {
            name: "KAIZEN CLEARING".to_string(),
            id: "KZN001".to_string(),
            ..Default::default()
        },
        receiver: Receiver::default(),
        billing_provider: provider("1111111111", "KAIZEN TRANSIT"),
        subscriber: subscriber("JOHN123456"),
        claim: Claim {
            clm_number: clm_number.to_string(),
            total_charge: total,
            from: Some("2026-01-01".to_string()),
            payment_status: Some("P".to_string()),
            submission_channel: Some("ELECTRONIC".to_string()),
            rendering_network_indicator: Some("I".to_string()),
            member_group: Some(member_group()),
            ..Default::default()
        },
        services,
        ..Default::default()
    }
}

fn trip(dos: &str, member_id: &str, npi: &str, hcpcs: &str, charge: f64, units: f64) -> TripRecord {
    TripRecord {
        dos: Some(dos.to_string()),
        member: Some(subscriber(member_id)),
        billing_provider: Some(provider(npi, "KAIZEN TRANSIT")),
        rendering_provider: Some(provider(npi, "KAIZEN TRANSIT")),
        service: Some(Service {
            hcpcs: hcpcs.to_string(),
            charge,
            units: Some(units),
            ..Default::default()
        }),
        submission_channel: Some("ELECTRONIC".to_string()),
        payment_status: Some("P".to_string()),
        rendering_network_indicator: Some("I".to_string()),
        member_group: Some(member_group()),
        ..Default::default()
    }
}

fn segment_strings(edi: &[u8]) -> Vec<String> {
    parse_interchange(edi)
        .unwrap()
        .into_iter()
        .map(|s| {
            let mut out = s.id.clone();
            for e in &s.elements {
                out.push('*');
                out.push_str(e);
            }
            out
        })
        .collect()
}

#[test]
fn single_leg_single_provider() {
    let trips = vec![
        trip("2026-01-01", "JOHN123456", "1111111111", "A0130", 60.0, 1.0),
        trip("2026-01-01", "JOHN123456", "1111111111", "A0425", 2.5, 8.0),
    ];
    let outcome = kaizen::build_batch(trips, &config()).unwrap();
    assert!(outcome.batch_report.is_valid(), "{:#?}", outcome.batch_report);

    let edi = outcome.edi.expect("interchange expected");
    let segments = segment_strings(&edi);

    let st_count = segments.iter().filter(|s| s.starts_with("ST*")).count();
    let se_count = segments.iter().filter(|s| s.starts_with("SE*")).count();
    assert_eq!(st_count, 1);
    assert_eq!(se_count, 1);

    let clm = segments
        .iter()
        .find(|s| s.starts_with("CLM*"))
        .expect("CLM segment");
    assert!(clm.starts_with("CLM*KZN-20260101-001*62.50"));

    let lx_count = segments.iter().filter(|s| s.starts_with("LX*")).count();
    assert_eq!(lx_count, 2);

    // SE01 equals the ST..SE inclusive segment count
    let st_index = segments.iter().position(|s| s.starts_with("ST*")).unwrap();
    let se_index = segments.iter().position(|s| s.starts_with("SE*")).unwrap();
    let declared: usize = segments[se_index].split('*').nth(1).unwrap().parse().unwrap();
    assert_eq!(declared, se_index - st_index + 1);

    let compliance = outcome.compliance_report.unwrap();
    assert!(compliance.is_valid, "{}", compliance.format_text());
    let payer = outcome.payer_report.unwrap();
    assert!(payer.is_valid, "{}", payer.format_text());
}

#[test]
fn three_trips_three_providers_share_one_envelope() {
    let trips = vec![
        trip("2026-01-01", "JOHN123456", "2222222222", "A0130", 180.0, 1.0),
        trip("2026-01-01", "JOHN123456", "4444444444", "A0130", 225.0, 1.0),
        trip("2026-01-01", "JOHN123456", "6666666666", "A0130", 220.0, 1.0),
    ];
    let outcome = kaizen::build_batch(trips, &config()).unwrap();
    let edi = outcome.edi.expect("interchange expected");
    let segments = segment_strings(&edi);

    assert_eq!(segments.iter().filter(|s| s.starts_with("ISA*")).count(), 1);
    assert_eq!(segments.iter().filter(|s| s.starts_with("GS*")).count(), 1);
    assert_eq!(segments.iter().filter(|s| s.starts_with("ST*")).count(), 3);
    assert_eq!(segments.iter().filter(|s| s.starts_with("SE*")).count(), 3);

    let clm_numbers: Vec<&str> = segments
        .iter()
        .filter(|s| s.starts_with("CLM*"))
        .map(|s| s.split('*').nth(1).unwrap())
        .collect();
    assert_eq!(clm_numbers.len(), 3);
    let unique: std::collections::HashSet<&&str> = clm_numbers.iter().collect();
    assert_eq!(unique.len(), 3);

    // Channel aggregation: every claim carries the electronic marker
    let trpn_count = segments
        .iter()
        .filter(|s| *s == "K3*TRPN-ASPUFEELECTRONIC")
        .count();
    assert_eq!(trpn_count, 3);

    assert!(outcome.payer_report.unwrap().is_valid);
}

#[test]
fn replacement_claim_carries_original_reference() {
    let mut record = claim_record(
        "ABC-42",
        150.0,
        vec![Service {
            hcpcs: "A0130".to_string(),
            charge: 150.0,
            ..Default::default()
        }],
    );
    record.claim.frequency_code = Some("7".to_string());
    record.claim.original_claim_number = Some("ABC-42".to_string());

    let outcome = kaizen::build(record, &config()).unwrap();
    assert!(outcome.pre_report.is_valid, "{}", outcome.pre_report.format_text());

    let segments = segment_strings(&outcome.edi.unwrap());
    let clm = segments.iter().find(|s| s.starts_with("CLM*")).unwrap();
    assert!(clm.contains("*41:B:7*"), "CLM05-3 must be 7: {clm}");
    assert!(segments.iter().any(|s| s == "REF*F8*ABC-42"));
}

#[test]
fn void_claim_accepts_zero_charges() {
    let mut record = claim_record(
        "ABC-42",
        0.0,
        vec![Service {
            hcpcs: "A0130".to_string(),
            charge: 0.0,
            ..Default::default()
        }],
    );
    record.claim.frequency_code = Some("8".to_string());
    record.claim.original_claim_number = Some("ABC-42".to_string());

    let outcome = kaizen::build(record, &config()).unwrap();
    assert!(outcome.pre_report.is_valid, "{}", outcome.pre_report.format_text());

    let segments = segment_strings(&outcome.edi.unwrap());
    let clm = segments.iter().find(|s| s.starts_with("CLM*")).unwrap();
    assert!(clm.contains("*41:B:8*"));
    assert!(segments.iter().any(|s| s == "REF*F8*ABC-42"));
    assert!(!segments.iter().any(|s| s.starts_with("CAS*")));
}

#[test]
fn denied_claim_gets_automatic_adjustments() {
    let mut record = claim_record(
        "KZN-20260101-009",
        62.5,
        vec![
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
    );
    record.claim.payment_status = Some("D".to_string());

    let outcome = kaizen::build(record, &config()).unwrap();
    assert!(outcome.pre_report.is_valid, "{}", outcome.pre_report.format_text());

    let segments = segment_strings(&outcome.edi.unwrap());
    assert!(segments.iter().any(|s| s == "CAS*CO*45*62.50"));
    assert!(segments.iter().any(|s| s == "MOA**MA130"));
    // Per denied service line
    assert!(segments.iter().any(|s| s == "CAS*CO*45*60.00"));
    assert!(segments.iter().any(|s| s == "CAS*CO*45*2.50"));

    let payer = outcome.payer_report.unwrap();
    assert!(payer.is_valid, "{}", payer.format_text());
}

#[test]
fn mileage_first_claim_is_blocked() {
    let record = claim_record(
        "KZN-20260101-010",
        62.5,
        vec![
            Service {
                hcpcs: "A0425".to_string(),
                charge: 2.5,
                units: Some(8.0),
                ..Default::default()
            },
            Service {
                hcpcs: "A0130".to_string(),
                charge: 60.0,
                ..Default::default()
            },
        ],
    );

    let outcome = kaizen::build(record, &config()).unwrap();
    assert!(outcome.edi.is_none());
    assert!(!outcome.pre_report.is_valid);
    assert!(outcome.pre_report.errors().any(|i| i.code == "BATCH_021"));
    assert!(outcome.compliance_report.is_none());
}

#[test]
fn payer_preset_overrides_receiver() {
    let record = claim_record(
        "KZN-20260101-011",
        60.0,
        vec![Service {
            hcpcs: "A0130".to_string(),
            charge: 60.0,
            ..Default::default()
        }],
    );
    let outcome = kaizen::build(record, &config()).unwrap();
    let segments = segment_strings(&outcome.edi.unwrap());
    assert!(segments
        .iter()
        .any(|s| s.starts_with("NM1*PR*2*UNITED HEALTHCARE COMMUNITY & STATE") && s.ends_with("PI*87726")));
}

#[test]
fn emergency_indicator_lands_in_sv111() {
    let mut record = claim_record(
        "KZN-20260101-012",
        60.0,
        vec![Service {
            hcpcs: "A0130".to_string(),
            charge: 60.0,
            emergency: Some(true),
            ..Default::default()
        }],
    );
    record.claim.pos = Some("41".to_string());

    let outcome = kaizen::build(record, &config()).unwrap();
    let segments = segment_strings(&outcome.edi.unwrap());
    let sv1 = segments.iter().find(|s| s.starts_with("SV1*")).unwrap();
    let elements: Vec<&str> = sv1.split('*').collect();
    // elements[0] is the tag, so SV111 is elements[11]
    assert_eq!(elements[11], "Y");
    assert_eq!(elements[10], "");

    let compliance = outcome.compliance_report.unwrap();
    assert!(compliance.is_valid, "{}", compliance.format_text());
}

#[test]
fn legacy_mode_emits_location_loops() {
    let mut cfg = config();
    cfg.use_cr1_locations = false;

    let mut record = claim_record(
        "KZN-20260101-013",
        60.0,
        vec![Service {
            hcpcs: "A0130".to_string(),
            charge: 60.0,
            ..Default::default()
        }],
    );
    record.claim.ambulance = Some(kaizen::domain::Ambulance {
        weight_unit: Some("LB".to_string()),
        patient_weight: Some(180.0),
        transport_code: Some("A".to_string()),
        transport_reason: Some("B".to_string()),
        trip_number: Some(42),
        special_needs: Some("N".to_string()),
        pickup: Some(kaizen::domain::Location {
            line1: "1 MAIN ST".to_string(),
            city: "LOUISVILLE".to_string(),
            state: "KY".to_string(),
            zip: "40202".to_string(),
            location_code: Some("RH".to_string()),
            ..Default::default()
        }),
        dropoff: None,
    });

    let outcome = kaizen::build(record, &cfg).unwrap();
    let segments = segment_strings(&outcome.edi.unwrap());

    // Legacy rendition: NTE trip descriptors and the 2310E pickup loop
    assert!(segments.iter().any(|s| s.starts_with("NTE*ADD*TRIPNUM-000000042")));
    assert!(segments.iter().any(|s| s == "NM1*PW*2"));

    // CR1 carries only elements 1-8
    let cr1 = segments.iter().find(|s| s.starts_with("CR1*")).unwrap();
    assert!(!cr1.contains("PULOC-"));
}

#[test]
fn cr1_mode_suppresses_location_loops() {
    let mut record = claim_record(
        "KZN-20260101-014",
        60.0,
        vec![Service {
            hcpcs: "A0130".to_string(),
            charge: 60.0,
            ..Default::default()
        }],
    );
    record.claim.ambulance = Some(kaizen::domain::Ambulance {
        weight_unit: Some("LB".to_string()),
        patient_weight: Some(180.0),
        transport_code: Some("A".to_string()),
        transport_reason: Some("B".to_string()),
        trip_number: Some(42),
        special_needs: Some("N".to_string()),
        pickup: Some(kaizen::domain::Location {
            line1: "1 MAIN ST".to_string(),
            city: "LOUISVILLE".to_string(),
            state: "KY".to_string(),
            zip: "40202".to_string(),
            location_code: Some("RH".to_string()),
            ..Default::default()
        }),
        dropoff: None,
    });

    let outcome = kaizen::build(record, &config()).unwrap();
    let segments = segment_strings(&outcome.edi.unwrap());

    let cr1 = segments.iter().find(|s| s.starts_with("CR1*")).unwrap();
    assert!(cr1.contains("PULOC-RH"), "CR109 descriptor expected: {cr1}");
    assert!(!segments.iter().any(|s| s == "NM1*PW*2"));
    assert!(!segments.iter().any(|s| s.starts_with("NTE*ADD*TRIPNUM-")));
}
