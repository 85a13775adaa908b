//! Loop 2400 emission
//!
//! Emits one service line: LX, SV1 with the emergency indicator in
//! SV111, service date, line-level K3 (always before the 2420 provider
//! loops), denial adjustments, legacy NTE trip details, provider and
//! location loops (2420D, 2420G/H), and prior-payer adjudication
//! (Loop 2430).

use super::claim_loop::{emit_cas, emit_location_loop};
use super::trip9;
use crate::domain::{
    CasAdjustment, ClaimRecord, Receiver, Result, Service, WriterError,
};
use crate::x12::{fmt_amount, fmt_date8, fmt_hhmm, fmt_units, SegmentWriter};

pub(crate) fn emit(
    w: &mut SegmentWriter,
    record: &ClaimRecord,
    receiver: &Receiver,
    svc: &Service,
    index: usize,
    use_cr1_locations: bool,
) -> Result<()> {
    w.segment("LX", &[&(index + 1).to_string()])?;

    if svc.hcpcs.is_empty() {
        return Err(WriterError::missing(format!("services[{index}].hcpcs")).into());
    }
    let mut components = vec!["HC", svc.hcpcs.as_str()];
    for modifier in &svc.modifiers {
        components.push(modifier.as_str());
    }
    let sv101 = w.composite(&components);

    let pos = svc
        .pos
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| WriterError::missing(format!("services[{index}].pos")))?;
    let units = fmt_units(svc.units.unwrap_or(1.0));
    // Emergency travels in SV111; SV108-110 stay empty and are trimmed
    // for non-emergency lines
    let emergency = if svc.emergency.unwrap_or(false) { "Y" } else { "" };
    w.segment(
        "SV1",
        &[
            &sv101,
            &fmt_amount(svc.charge),
            "UN",
            &units,
            "",
            "",
            pos,
            "",
            "",
            "",
            emergency,
        ],
    )?;

    let dos = svc
        .dos
        .as_deref()
        .filter(|d| !d.is_empty())
        .or(record.claim.from.as_deref())
        .ok_or_else(|| WriterError::missing(format!("services[{index}].dos")))?;
    w.segment("DTP", &["472", "D8", &fmt_date8(dos)])?;

    // Line-level K3 must precede any 2420 loop
    let denied = svc.payment_status.as_deref() == Some("D");
    if let Some(status) = svc.payment_status.as_deref().filter(|v| !v.is_empty()) {
        w.segment("K3", &[&format!("PYMS-{status}")])?;
    }

    // Denied lines carry an adjustment even when no prior payer did
    let has_line_cas = svc.adjudication.iter().any(|adj| !adj.line_cas.is_empty());
    if denied && !has_line_cas {
        emit_cas(
            w,
            &CasAdjustment {
                group: "CO".to_string(),
                reason: "45".to_string(),
                amount: svc.charge,
                quantity: None,
            },
        )?;
    }

    // Legacy trip details NTE
    if !use_cr1_locations {
        let mut parts = Vec::new();
        if let Some(pickup) = &svc.pickup {
            if let Some(code) = pickup.location_code.as_deref().filter(|v| !v.is_empty()) {
                parts.push(format!("PULOC-{code}"));
            }
            if let Some(time) = pickup
                .departure_time
                .as_deref()
                .or(pickup.arrival_time.as_deref())
                .filter(|v| !v.is_empty())
            {
                parts.push(format!("PUTIME-{}", fmt_hhmm(time)));
            }
        }
        if let Some(dropoff) = &svc.dropoff {
            if let Some(code) = dropoff.location_code.as_deref().filter(|v| !v.is_empty()) {
                parts.push(format!("DOLOC-{code}"));
            }
            if let Some(time) = dropoff
                .arrival_time
                .as_deref()
                .or(dropoff.departure_time.as_deref())
                .filter(|v| !v.is_empty())
            {
                parts.push(format!("DOTIME-{}", fmt_hhmm(time)));
            }
        }
        if !parts.is_empty() {
            w.segment("NTE", &["ADD", &parts.join(";")])?;
        }
    }

    // Loop 2420D: line-level supervising provider with REF*LU
    if let Some(supervising) = &svc.supervising_provider {
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
            if let Some(trip) = svc.trip_number {
                w.segment("REF", &["LU", &trip9(trip)])?;
            }
        }
    }

    // Loops 2420G/H: service-level pickup/dropoff, legacy mode only
    if !use_cr1_locations {
        if let Some(pickup) = &svc.pickup {
            emit_location_loop(w, "PW", pickup)?;
        }
        if let Some(dropoff) = &svc.dropoff {
            emit_location_loop(w, "45", dropoff)?;
        }
    }

    // Loop 2430: prior-payer adjudication
    for adj in &svc.adjudication {
        let payer_id = adj
            .payer_id
            .as_deref()
            .filter(|v| !v.is_empty())
            .unwrap_or(receiver.payer_id.as_str());
        let paid_units = adj.paid_units.map(fmt_units).unwrap_or_default();
        w.segment(
            "SVD",
            &[
                payer_id,
                &fmt_amount(adj.paid_amount),
                &sv101,
                "",
                &paid_units,
            ],
        )?;
        for cas in &adj.line_cas {
            emit_cas(w, cas)?;
        }
        if let Some(date) = adj.payment_date.as_deref().filter(|v| !v.is_empty()) {
            w.segment("DTP", &["573", "D8", &fmt_date8(date)])?;
        }
    }

    Ok(())
}
