//! Batch processing
//!
//! Groups atomic trip records into claim records by
//! (billing NPI, rendering NPI, date of service, member id), preserving
//! arrival order, then aggregates the submission channel, totals the
//! charges, enforces cross-trip agreement, and detects duplicate
//! claims before the pipeline emits a shared interchange.

use crate::config::BuildConfig;
use crate::domain::{
    BatchReport, Claim, ClaimRecord, Issue, Receiver, Submitter, TripRecord,
};

/// Result of trip grouping and claim assembly
pub struct AssembledBatch {
    /// Claims ready for the per-claim pipeline, in grouping-key arrival order
    pub claims: Vec<ClaimRecord>,
    /// Grouping, aggregation and duplicate findings
    pub report: BatchReport,
}

/// Groups trip indices by key, preserving first-arrival order of keys
///
/// This is the seam for future grouping policies (e.g. monthly-pass
/// handling): the processor consumes whatever this returns.
pub fn group_trips(trips: &[TripRecord], usable: &[bool]) -> Vec<Vec<usize>> {
    let mut order: Vec<(String, String, String, String)> = Vec::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for (i, trip) in trips.iter().enumerate() {
        if !usable[i] {
            continue;
        }
        let key = trip.group_key();
        match order.iter().position(|k| *k == key) {
            Some(pos) => groups[pos].push(i),
            None => {
                order.push(key);
                groups.push(vec![i]);
            }
        }
    }
    groups
}

/// Assembles claim records from a batch of trips
pub fn assemble_claims(trips: &[TripRecord], cfg: &BuildConfig) -> AssembledBatch {
    let mut report = BatchReport::new();
    report.trips_processed = trips.len();

    if trips.is_empty() {
        report.push(Issue::error(
            "BATCH_001",
            "trips",
            "No trips provided in batch",
        ));
        return AssembledBatch {
            claims: Vec::new(),
            report,
        };
    }

    let usable = validate_trips(trips, &mut report);
    let groups = group_trips(trips, &usable);

    let mut claims = Vec::with_capacity(groups.len());
    for (seq, group) in groups.iter().enumerate() {
        if group.len() > 1 {
            let first = &trips[group[0]];
            report.push(Issue::info(
                "BATCH_100",
                format!("trips[{}]", group[0]),
                format!(
                    "Grouped {} trips into one claim (DOS={}, member={})",
                    group.len(),
                    first.dos.as_deref().unwrap_or(""),
                    first
                        .member
                        .as_ref()
                        .map(|m| m.member_id.as_str())
                        .unwrap_or("")
                ),
            ));
        }
        match build_claim(trips, group, seq + 1, cfg, &mut report) {
            Some(claim) => claims.push(claim),
            None => report.claims_rejected += 1,
        }
    }

    detect_duplicates(&mut claims, &mut report);

    report.claims_generated = claims.len();
    tracing::info!(
        trips = trips.len(),
        claims = claims.len(),
        rejected = report.claims_rejected,
        "Batch assembly finished"
    );

    AssembledBatch { claims, report }
}

/// Per-trip required fields; unusable trips are excluded, not fatal
fn validate_trips(trips: &[TripRecord], report: &mut BatchReport) -> Vec<bool> {
    let mut usable = vec![true; trips.len()];
    for (i, trip) in trips.iter().enumerate() {
        if trip.dos.as_deref().unwrap_or("").is_empty() {
            report.push(Issue::error(
                "BATCH_002",
                format!("trips[{i}].dos"),
                format!("Trip {i}: missing required field 'dos'"),
            ));
            usable[i] = false;
        }
        if trip
            .member
            .as_ref()
            .map(|m| m.member_id.is_empty())
            .unwrap_or(true)
        {
            report.push(Issue::error(
                "BATCH_003",
                format!("trips[{i}].member"),
                format!("Trip {i}: missing required field 'member'"),
            ));
            usable[i] = false;
        }
        match &trip.service {
            None => {
                report.push(Issue::error(
                    "BATCH_004",
                    format!("trips[{i}].service"),
                    format!("Trip {i}: missing required field 'service'"),
                ));
                usable[i] = false;
            }
            Some(service) => {
                if service.hcpcs.is_empty() {
                    report.push(Issue::error(
                        "BATCH_005",
                        format!("trips[{i}].service.hcpcs"),
                        format!("Trip {i}: missing required field 'service.hcpcs'"),
                    ));
                    usable[i] = false;
                }
            }
        }
    }
    usable
}

/// Builds one claim from a trip group; None when aggregation fails
fn build_claim(
    trips: &[TripRecord],
    group: &[usize],
    sequence: usize,
    cfg: &BuildConfig,
    report: &mut BatchReport,
) -> Option<ClaimRecord> {
    let first = &trips[group[0]];
    let dos = first.dos.clone().unwrap_or_default();

    if !check_agreement(trips, group, report) {
        return None;
    }

    // Channel aggregation: ELECTRONIC if any trip was ELECTRONIC
    let mut channel: Option<String> = None;
    for &i in group {
        match trips[i].submission_channel.as_deref() {
            Some("ELECTRONIC") => {
                channel = Some("ELECTRONIC".to_string());
                break;
            }
            Some(_) => channel = Some("PAPER".to_string()),
            None => {}
        }
    }

    let mut services = Vec::with_capacity(group.len());
    let mut total_charge = 0.0;
    for &i in group {
        let trip = &trips[i];
        let mut service = trip.service.clone().unwrap_or_default();
        if service.dos.is_none() {
            service.dos = trip.dos.clone();
        }
        if service.pickup.is_none() {
            service.pickup = trip.pickup.clone();
        }
        if service.dropoff.is_none() {
            service.dropoff = trip.dropoff.clone();
        }
        if service.payment_status.is_none() {
            service.payment_status = trip.payment_status.clone();
        }
        if service.supervising_provider.is_none() {
            service.supervising_provider = trip.supervising_provider.clone();
        }
        if service.emergency.is_none() {
            service.emergency = trip.emergency;
        }
        if service.adjudication.is_empty() {
            service.adjudication = trip.adjudication.clone();
        }
        total_charge += service.charge;
        services.push(service);
    }

    let clm_number = first
        .clm_number
        .clone()
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| generate_claim_number(&dos, sequence));

    let submitter = first.submitter.clone().unwrap_or_else(|| Submitter {
        name: cfg
            .submitter_name
            .clone()
            .unwrap_or_else(|| cfg.gs_sender_code.clone()),
        id: cfg
            .submitter_id
            .clone()
            .unwrap_or_else(|| cfg.gs_sender_code.clone()),
        contact_name: None,
        contact_phone: None,
    });

    Some(ClaimRecord {
        submitter,
        receiver: first.receiver.clone().unwrap_or_else(Receiver::default),
        billing_provider: first.billing_provider.clone().unwrap_or_default(),
        subscriber: first.member.clone().unwrap_or_default(),
        rendering_provider: first.rendering_provider.clone(),
        supervising_provider: first.supervising_provider.clone(),
        referring_provider: None,
        service_facility: None,
        claim: Claim {
            clm_number,
            total_charge,
            from: Some(dos.clone()),
            to: Some(dos),
            pos: first.pos.clone(),
            frequency_code: first.frequency_code.clone(),
            original_claim_number: first.original_claim_number.clone(),
            payment_status: first.payment_status.clone(),
            submission_channel: channel,
            rendering_network_indicator: first.rendering_network_indicator.clone(),
            member_group: first.member_group.clone(),
            ambulance: first.ambulance.clone(),
            auth_number: first.auth_number.clone(),
            tracking_number: first.tracking_number.clone(),
            patient_account: first.patient_account.clone(),
            date_of_receipt: first.date_of_receipt.clone(),
            adjudication_date: first.adjudication_date.clone(),
            payment_date: first.payment_date.clone(),
            ..Default::default()
        },
        services,
        other_payers: Vec::new(),
    })
}

/// Member group, payment status and network indicator must agree
/// across every trip in the group
fn check_agreement(trips: &[TripRecord], group: &[usize], report: &mut BatchReport) -> bool {
    let mut ok = true;
    let first = &trips[group[0]];

    for &i in &group[1..] {
        let trip = &trips[i];
        if trip.member_group.is_some()
            && first.member_group.is_some()
            && trip.member_group != first.member_group
        {
            report.push(Issue::error(
                "BATCH_030",
                format!("trips[{i}].member_group"),
                format!("Trip {i}: member_group disagrees with the rest of its claim group"),
            ));
            ok = false;
        }
        if trip.payment_status.is_some()
            && first.payment_status.is_some()
            && trip.payment_status != first.payment_status
        {
            report.push(Issue::error(
                "BATCH_030",
                format!("trips[{i}].payment_status"),
                format!("Trip {i}: payment_status disagrees with the rest of its claim group"),
            ));
            ok = false;
        }
        if trip.rendering_network_indicator.is_some()
            && first.rendering_network_indicator.is_some()
            && trip.rendering_network_indicator != first.rendering_network_indicator
        {
            report.push(Issue::error(
                "BATCH_030",
                format!("trips[{i}].rendering_network_indicator"),
                format!(
                    "Trip {i}: rendering_network_indicator disagrees with the rest of its claim group"
                ),
            ));
            ok = false;
        }
    }
    ok
}

/// Claim numbers follow KZN-<yyyymmdd>-<seq>
fn generate_claim_number(dos: &str, sequence: usize) -> String {
    format!("KZN-{}-{:03}", dos.replace('-', ""), sequence)
}

/// Removes later claims that collide on (CLM01, CLM05-3, REF*F8)
fn detect_duplicates(claims: &mut Vec<ClaimRecord>, report: &mut BatchReport) {
    let mut seen = std::collections::HashSet::new();
    let mut index = 0;
    claims.retain(|claim| {
        let key = claim.duplicate_key();
        let keep = seen.insert(key.clone());
        if !keep {
            report.push(Issue::error(
                "BATCH_010",
                format!("claims[{index}]"),
                format!(
                    "Duplicate claim per NEMIS criteria: CLM01={}, CLM05-3={}, REF*F8={}",
                    key.0, key.1, key.2
                ),
            ));
            report.claims_rejected += 1;
        }
        index += 1;
        keep
    });
}
