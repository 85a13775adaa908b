//! Loop 2300 emission
//!
//! Emits the claim loop in the payer's required order: CLM, dates,
//! diagnosis, CR1 ambulance block, REF identifiers, K3 and NTE payload
//! blocks, denial adjustments, COB amounts, claim-level provider loops
//! (2310A-F), other-payer loops (2320/2330), and finally the 2400
//! service loops.

use super::{service_loop, trip9};
use crate::domain::{
    CasAdjustment, ClaimRecord, Location, Receiver, Result, WriterError,
};
use crate::x12::{fmt_amount, fmt_date8, fmt_hhmm, fmt_units, SegmentWriter};

pub(crate) fn emit(
    w: &mut SegmentWriter,
    record: &ClaimRecord,
    receiver: &Receiver,
    use_cr1_locations: bool,
) -> Result<()> {
    let clm = &record.claim;

    // 1. CLM with the POS:B:frequency composite in CLM05
    let pos = clm
        .pos
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| WriterError::missing("claim.pos"))?;
    let frequency = clm.effective_frequency();
    let clm05 = w.composite(&[pos, "B", frequency]);
    w.segment(
        "CLM",
        &[
            &clm.clm_number,
            &fmt_amount(clm.total_charge),
            "",
            "",
            &clm05,
            "Y",
            "A",
            "Y",
            "Y",
        ],
    )?;

    // 2. DTP*472 service date or range
    let from = clm
        .from
        .as_deref()
        .filter(|d| !d.is_empty())
        .ok_or_else(|| WriterError::missing("claim.from"))?;
    let to = clm.to.as_deref().filter(|d| !d.is_empty()).unwrap_or(from);
    if from == to {
        w.segment("DTP", &["472", "D8", &fmt_date8(from)])?;
    } else {
        let range = format!("{}-{}", fmt_date8(from), fmt_date8(to));
        w.segment("DTP", &["472", "RD8", &range])?;
    }

    // Diagnosis codes: first ABK, rest ABF
    if !clm.icd10.is_empty() {
        let mut composites = Vec::with_capacity(clm.icd10.len());
        for (i, code) in clm.icd10.iter().enumerate() {
            let qualifier = if i == 0 { "ABK" } else { "ABF" };
            composites.push(w.composite(&[qualifier, code]));
        }
        let elements: Vec<&str> = composites.iter().map(String::as_str).collect();
        w.segment("HI", &elements)?;
    }

    // 3. CR1 ambulance transport info
    if let Some(amb) = &clm.ambulance {
        let weight = amb.patient_weight.map(fmt_units).unwrap_or_default();
        let pickup_desc = if use_cr1_locations {
            amb.pickup.as_ref().map(pickup_descriptor).unwrap_or_default()
        } else {
            String::new()
        };
        let dropoff_desc = if use_cr1_locations {
            amb.dropoff
                .as_ref()
                .map(dropoff_descriptor)
                .unwrap_or_default()
        } else {
            String::new()
        };
        w.segment(
            "CR1",
            &[
                amb.weight_unit.as_deref().unwrap_or("LB"),
                &weight,
                "",
                "",
                amb.transport_code.as_deref().unwrap_or(""),
                amb.transport_reason.as_deref().unwrap_or(""),
                "",
                "",
                &pickup_desc,
                &dropoff_desc,
            ],
        )?;
    }

    // 4.-6. REF identifiers
    if let Some(auth) = clm.auth_number.as_deref().filter(|v| !v.is_empty()) {
        w.segment("REF", &["G1", auth])?;
    }
    if let Some(tracking) = clm.tracking_number.as_deref().filter(|v| !v.is_empty()) {
        w.segment("REF", &["D9", tracking])?;
    }
    if clm.is_adjustment() {
        let original = clm
            .original_claim_number
            .as_deref()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| WriterError::missing("claim.original_claim_number"))?;
        w.segment("REF", &["F8", original])?;
    }
    if let Some(account) = clm.patient_account.as_deref().filter(|v| !v.is_empty()) {
        w.segment("REF", &["EA", account])?;
    }

    // 7. K3 blocks, in payer-mandated order
    emit_k3_blocks(w, record)?;

    // 8. NTE member group, always emitted
    let group = clm
        .member_group
        .as_ref()
        .ok_or_else(|| WriterError::missing("claim.member_group"))?;
    let nte_group = format!(
        "GRP-{};SGR-{};CLS-{};PLN-{};PRD-{}",
        group.group_id, group.sub_group_id, group.class_id, group.plan_id, group.product_id
    );
    w.segment("NTE", &["ADD", &nte_group])?;

    // 9. Claim-level trip descriptors, legacy mode only
    if !use_cr1_locations {
        if let Some(amb) = &clm.ambulance {
            let mut parts = Vec::new();
            if let Some(trip) = amb.trip_number {
                parts.push(format!("TRIPNUM-{}", trip9(trip)));
            }
            if let Some(needs) = amb.special_needs.as_deref().filter(|v| !v.is_empty()) {
                parts.push(format!("SPECNEED-{needs}"));
            }
            if !parts.is_empty() {
                w.segment("NTE", &["ADD", &parts.join(";")])?;
            }
        }
    }

    // 10. Denied claims: explicit adjustments, else the CO*45 fallback
    let denied = clm.payment_status.as_deref() == Some("D");
    if !clm.cas.is_empty() {
        for cas in &clm.cas {
            emit_cas(w, cas)?;
        }
    } else if denied {
        emit_cas(
            w,
            &CasAdjustment {
                group: "CO".to_string(),
                reason: "45".to_string(),
                amount: clm.total_charge,
                quantity: None,
            },
        )?;
    }
    if denied {
        w.segment("MOA", &["", "MA130"])?;
    }

    // 11. COB amounts, only when other payers participate
    if !record.other_payers.is_empty() {
        for (qualifier, amount) in [
            ("EAF", clm.remaining_liability),
            ("B6", clm.allowed_amount),
            ("AU", clm.coverage_amount),
            ("F2", clm.patient_paid),
        ] {
            if let Some(amount) = amount {
                w.segment("AMT", &[qualifier, &fmt_amount(amount)])?;
            }
        }
    }

    // 12. Claim lifecycle dates
    for (qualifier, date) in [
        ("050", &clm.date_of_receipt),
        ("036", &clm.adjudication_date),
        ("573", &clm.payment_date),
    ] {
        if let Some(date) = date.as_deref().filter(|d| !d.is_empty()) {
            w.segment("DTP", &[qualifier, "D8", &fmt_date8(date)])?;
        }
    }

    emit_claim_providers(w, record, use_cr1_locations)?;
    emit_other_payers(w, record)?;

    // 19. Loop 2400 per service
    for (index, service) in record.services.iter().enumerate() {
        service_loop::emit(w, record, receiver, service, index, use_cr1_locations)?;
    }

    Ok(())
}

/// K3 payload blocks in order: PYMS, SUB/IPAD/USER, SNWK, TRPN,
/// lifecycle dates, rendering-provider address
fn emit_k3_blocks(w: &mut SegmentWriter, record: &ClaimRecord) -> Result<()> {
    let clm = &record.claim;

    if let Some(status) = clm.payment_status.as_deref().filter(|v| !v.is_empty()) {
        w.segment("K3", &[&format!("PYMS-{status}")])?;
    }

    let mut audit = Vec::new();
    if let Some(sub) = clm.subscriber_internal_id.as_deref().filter(|v| !v.is_empty()) {
        audit.push(format!("SUB-{sub}"));
    }
    if let Some(ip) = clm.ip_address.as_deref().filter(|v| !v.is_empty()) {
        audit.push(format!("IPAD-{ip}"));
    }
    if let Some(user) = clm.user_id.as_deref().filter(|v| !v.is_empty()) {
        audit.push(format!("USER-{user}"));
    }
    if !audit.is_empty() {
        w.segment("K3", &[&audit.join(";")])?;
    }

    if let Some(network) = clm
        .rendering_network_indicator
        .as_deref()
        .filter(|v| !v.is_empty())
    {
        w.segment("K3", &[&format!("SNWK-{network}")])?;
    }

    if let Some(channel) = clm.submission_channel.as_deref().filter(|v| !v.is_empty()) {
        w.segment("K3", &[&format!("TRPN-ASPUFE{channel}")])?;
    }

    let mut dates = Vec::new();
    if let Some(date) = clm.date_of_receipt.as_deref().filter(|v| !v.is_empty()) {
        dates.push(format!("DREC-{}", fmt_date8(date)));
    }
    if let Some(date) = clm.adjudication_date.as_deref().filter(|v| !v.is_empty()) {
        dates.push(format!("DADJ-{}", fmt_date8(date)));
    }
    if let Some(date) = clm.payment_date.as_deref().filter(|v| !v.is_empty()) {
        dates.push(format!("PAIDDT-{}", fmt_date8(date)));
    }
    if !dates.is_empty() {
        w.segment("K3", &[&dates.join(";")])?;
    }

    // Rendering-provider address block
    if let Some(addr) = record
        .rendering_provider
        .as_ref()
        .and_then(|p| p.address.as_ref())
    {
        let mut lines = vec![format!("AL1-{}", addr.line1)];
        if let Some(line2) = addr.line2.as_deref().filter(|v| !v.is_empty()) {
            lines.push(format!("AL2-{line2}"));
        }
        w.segment("K3", &[&lines.join(";")])?;
        let locality = format!("CY-{};ST-{};ZIP-{}", addr.city, addr.state, addr.zip);
        w.segment("K3", &[&locality])?;
    }

    Ok(())
}

/// Loops 2310A-2310F
fn emit_claim_providers(
    w: &mut SegmentWriter,
    record: &ClaimRecord,
    use_cr1_locations: bool,
) -> Result<()> {
    // 13. Loop 2310A: referring provider
    if let Some(referring) = &record.referring_provider {
        if !referring.name.last.is_empty() {
            let role = referring.role.as_deref().unwrap_or("DN");
            match referring.npi.as_deref().filter(|v| !v.is_empty()) {
                Some(npi) => w.segment(
                    "NM1",
                    &[
                        role,
                        "1",
                        &referring.name.last,
                        &referring.name.first,
                        "",
                        "",
                        "",
                        "XX",
                        npi,
                    ],
                )?,
                None => w.segment(
                    "NM1",
                    &[role, "1", &referring.name.last, &referring.name.first],
                )?,
            }
        }
    }

    // 14. Loop 2310B: rendering provider
    let rendering = record
        .rendering_provider
        .as_ref()
        .ok_or_else(|| WriterError::missing("rendering_provider"))?;
    w.segment(
        "NM1",
        &[
            "82",
            "2",
            &rendering.name,
            "",
            "",
            "",
            "",
            "XX",
            &rendering.npi,
        ],
    )?;
    if let Some(taxonomy) = rendering.taxonomy.as_deref().filter(|v| !v.is_empty()) {
        w.segment("PRV", &["PE", "PXC", taxonomy])?;
    }
    if let Some(legacy) = rendering.legacy_id.as_deref().filter(|v| !v.is_empty()) {
        w.segment("REF", &["G2", legacy])?;
    } else if let Some(license) = rendering.state_license.as_deref().filter(|v| !v.is_empty()) {
        w.segment("REF", &["0B", license])?;
    }

    // 15. Loop 2310C: service facility
    if let Some(facility) = &record.service_facility {
        if !facility.name.is_empty() {
            match facility.npi.as_deref().filter(|v| !v.is_empty()) {
                Some(npi) => w.segment(
                    "NM1",
                    &["77", "2", &facility.name, "", "", "", "", "XX", npi],
                )?,
                None => w.segment("NM1", &["77", "2", &facility.name])?,
            }
            if let Some(addr) = &facility.address {
                w.segment("N3", &[&addr.line1, addr.line2.as_deref().unwrap_or("")])?;
                w.segment("N4", &[&addr.city, &addr.state, &addr.zip])?;
            }
        }
    }

    // 16. Loop 2310D: supervising provider with the trip number
    if let Some(supervising) = &record.supervising_provider {
        if !supervising.is_empty() {
            match supervising.npi.as_deref().filter(|v| !v.is_empty()) {
                Some(npi) => w.segment(
                    "NM1",
                    &[
                        "DQ",
                        "1",
                        &supervising.name.last,
                        &supervising.name.first,
                        "",
                        "",
                        "",
                        "XX",
                        npi,
                    ],
                )?,
                None => w.segment(
                    "NM1",
                    &["DQ", "1", &supervising.name.last, &supervising.name.first],
                )?,
            }
            if let Some(trip) = record.claim.ambulance.as_ref().and_then(|a| a.trip_number) {
                w.segment("REF", &["LU", &trip9(trip)])?;
            }
        }
    }

    // 17. Loops 2310E/F: claim-level pickup/dropoff, legacy mode only
    if !use_cr1_locations {
        if let Some(amb) = &record.claim.ambulance {
            if let Some(pickup) = &amb.pickup {
                emit_location_loop(w, "PW", pickup)?;
            }
            if let Some(dropoff) = &amb.dropoff {
                emit_location_loop(w, "45", dropoff)?;
            }
        }
    }

    Ok(())
}

/// Loops 2320/2330 per other payer
fn emit_other_payers(w: &mut SegmentWriter, record: &ClaimRecord) -> Result<()> {
    for payer in &record.other_payers {
        let responsibility = payer.responsibility.as_deref().unwrap_or("S");
        w.segment(
            "SBR",
            &[responsibility, "18", "", "", "", "", "", "", "MC"],
        )?;
        if let Some(paid) = payer.paid_amount {
            w.segment("AMT", &["D", &fmt_amount(paid)])?;
        }
        w.segment("OI", &["", "", "Y", "", "", "Y"])?;

        // 2330A: other subscriber mirrors the claim subscriber
        let subscriber = &record.subscriber;
        w.segment(
            "NM1",
            &[
                "IL",
                "1",
                &subscriber.name.last,
                &subscriber.name.first,
                "",
                "",
                "",
                "MI",
                &subscriber.member_id,
            ],
        )?;

        // 2330B: other payer
        w.segment(
            "NM1",
            &[
                "PR",
                "2",
                &payer.payer_name,
                "",
                "",
                "",
                "",
                "PI",
                &payer.payer_id,
            ],
        )?;
    }
    Ok(())
}

pub(crate) fn emit_location_loop(
    w: &mut SegmentWriter,
    qualifier: &str,
    loc: &Location,
) -> Result<()> {
    w.segment("NM1", &[qualifier, "2"])?;
    if !loc.line1.is_empty() {
        w.segment("N3", &[&loc.line1, loc.line2.as_deref().unwrap_or("")])?;
    }
    if !loc.city.is_empty() || !loc.state.is_empty() || !loc.zip.is_empty() {
        w.segment("N4", &[&loc.city, &loc.state, &loc.zip])?;
    }
    Ok(())
}

pub(crate) fn emit_cas(w: &mut SegmentWriter, cas: &CasAdjustment) -> Result<()> {
    let quantity = cas.quantity.map(fmt_units).unwrap_or_default();
    w.segment(
        "CAS",
        &[&cas.group, &cas.reason, &fmt_amount(cas.amount), &quantity],
    )?;
    Ok(())
}

/// CR109 pickup descriptor: semicolon-joined TAG-value pairs
pub(crate) fn pickup_descriptor(loc: &Location) -> String {
    location_descriptor(loc, "PU")
}

/// CR110 dropoff descriptor: semicolon-joined TAG-value pairs
pub(crate) fn dropoff_descriptor(loc: &Location) -> String {
    location_descriptor(loc, "DO")
}

fn location_descriptor(loc: &Location, prefix: &str) -> String {
    let mut parts = Vec::new();
    if let Some(code) = loc.location_code.as_deref().filter(|v| !v.is_empty()) {
        parts.push(format!("{prefix}LOC-{code}"));
    }
    if !loc.line1.is_empty() {
        parts.push(format!("{prefix}ADDR-{}", loc.line1));
    }
    if !loc.city.is_empty() {
        parts.push(format!("{prefix}CY-{}", loc.city));
    }
    if !loc.state.is_empty() {
        parts.push(format!("{prefix}ST-{}", loc.state));
    }
    if !loc.zip.is_empty() {
        parts.push(format!("{prefix}ZIP-{}", loc.zip));
    }
    let time = match prefix {
        "PU" => loc.departure_time.as_deref().or(loc.arrival_time.as_deref()),
        _ => loc.arrival_time.as_deref().or(loc.departure_time.as_deref()),
    };
    if let Some(time) = time.filter(|v| !v.is_empty()) {
        parts.push(format!("{prefix}TIME-{}", fmt_hhmm(time)));
    }
    parts.join(";")
}
