//! Pre-submission validation
//!
//! Structural and semantic checks on an enriched claim record. Every
//! defect becomes an [`Issue`] in the [`ValidationReport`]; nothing is
//! thrown. A claim with any ERROR issue is refused EDI emission.

use crate::codes;
use crate::domain::{
    Address, Ambulance, ClaimRecord, Issue, Location, Provider, Service, Subscriber,
    ValidationReport,
};
use chrono::NaiveDate;

/// Validates an enriched claim record
pub fn validate(record: &ClaimRecord) -> ValidationReport {
    let mut v = Validator::default();

    v.check_parties(record);
    v.check_billing_provider(&record.billing_provider);
    v.check_rendering_provider(record.rendering_provider.as_ref());
    v.check_referring_provider(record);
    v.check_subscriber(&record.subscriber);
    v.check_claim(record);
    v.check_services(record);
    v.check_claim_total(record);
    v.check_mileage_adjacency(&record.services);
    v.check_supervising_requirements(record);
    v.check_location_ambiguity(record);

    tracing::debug!(
        clm_number = %record.claim.clm_number,
        errors = v.report.error_count(),
        issues = v.report.issues.len(),
        "Pre-submission validation finished"
    );

    v.report
}

#[derive(Default)]
struct Validator {
    report: ValidationReport,
}

impl Validator {
    fn error(&mut self, code: &str, path: impl Into<String>, message: impl Into<String>) {
        self.report.push(Issue::error(code, path, message));
    }

    fn error_with(
        &mut self,
        code: &str,
        path: impl Into<String>,
        message: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) {
        self.report.push(
            Issue::error(code, path, message)
                .with_expected(expected)
                .with_actual(actual),
        );
    }

    fn warning(&mut self, code: &str, path: impl Into<String>, message: impl Into<String>) {
        self.report.push(Issue::warning(code, path, message));
    }

    fn check_parties(&mut self, record: &ClaimRecord) {
        if record.submitter.name.is_empty() {
            self.error("VAL_070", "submitter.name", "submitter.name is required");
        }
        if record.submitter.id.is_empty() {
            self.error("VAL_071", "submitter.id", "submitter.id is required");
        }
        if record.receiver.payer_name.is_empty() {
            self.error(
                "VAL_072",
                "receiver.payer_name",
                "receiver.payer_name is required (a payer preset also satisfies this)",
            );
        }
        if record.receiver.payer_id.is_empty() {
            self.error(
                "VAL_073",
                "receiver.payer_id",
                "receiver.payer_id is required (a payer preset also satisfies this)",
            );
        }
    }

    fn check_billing_provider(&mut self, bp: &Provider) {
        if bp.npi.is_empty() {
            self.error("VAL_001", "billing_provider.npi", "billing_provider.npi is required");
        } else if !is_digits(&bp.npi, 10) {
            self.error_with(
                "VAL_002",
                "billing_provider.npi",
                "billing_provider.npi must be 10 digits",
                "10 digits",
                &bp.npi,
            );
        }

        if bp.name.is_empty() {
            self.error("VAL_003", "billing_provider.name", "billing_provider.name is required");
        } else if bp.name.len() > 60 {
            self.error_with(
                "VAL_004",
                "billing_provider.name",
                "billing_provider.name exceeds 60 characters",
                "Max 60 characters",
                format!("{} characters", bp.name.len()),
            );
        }

        match &bp.address {
            Some(addr) => self.check_address(addr, "billing_provider.address"),
            None => {
                self.error(
                    "VAL_005",
                    "billing_provider.address",
                    "billing_provider.address is required",
                );
            }
        }

        if let Some(tax_id) = &bp.tax_id {
            if !is_digits(tax_id, 9) {
                self.error_with(
                    "VAL_013",
                    "billing_provider.tax_id",
                    "billing_provider.tax_id must be 9 digits",
                    "9 digits",
                    tax_id,
                );
            }
        }
    }

    fn check_address(&mut self, addr: &Address, path: &str) {
        if addr.line1.is_empty() {
            self.error("VAL_005", format!("{path}.line1"), "address line1 is required");
        } else if addr.line1.len() > 55 {
            self.error_with(
                "VAL_006",
                format!("{path}.line1"),
                "address line1 exceeds 55 characters",
                "Max 55 characters",
                format!("{} characters", addr.line1.len()),
            );
        }

        if addr.city.is_empty() {
            self.error("VAL_007", format!("{path}.city"), "city is required");
        } else if addr.city.len() > 30 {
            self.error_with(
                "VAL_008",
                format!("{path}.city"),
                "city exceeds 30 characters",
                "Max 30 characters",
                format!("{} characters", addr.city.len()),
            );
        }

        if addr.state.is_empty() {
            self.error("VAL_009", format!("{path}.state"), "state is required");
        } else if !codes::is_state(&addr.state) {
            self.error_with(
                "VAL_010",
                format!("{path}.state"),
                "state is not a recognized US postal code",
                "Valid US state code",
                &addr.state,
            );
        }

        if addr.zip.is_empty() {
            self.error("VAL_011", format!("{path}.zip"), "zip is required");
        } else if !is_zip(&addr.zip) {
            self.error_with(
                "VAL_012",
                format!("{path}.zip"),
                "zip must be format 12345 or 12345-6789",
                "12345 or 12345-6789",
                &addr.zip,
            );
        }
    }

    fn check_rendering_provider(&mut self, rendering: Option<&Provider>) {
        match rendering {
            None => {
                // The enricher copies the billing provider in; reaching
                // here means validation ran on a raw record.
                self.error(
                    "VAL_014",
                    "rendering_provider",
                    "rendering_provider is required (enrichment supplies the billing fallback)",
                );
            }
            Some(rp) => {
                if rp.npi.is_empty() {
                    self.error(
                        "VAL_014",
                        "rendering_provider.npi",
                        "rendering_provider.npi is required",
                    );
                } else if !is_digits(&rp.npi, 10) {
                    self.error_with(
                        "VAL_015",
                        "rendering_provider.npi",
                        "rendering_provider.npi must be 10 digits",
                        "10 digits",
                        &rp.npi,
                    );
                }
            }
        }
    }

    fn check_referring_provider(&mut self, record: &ClaimRecord) {
        if let Some(referring) = &record.referring_provider {
            if let Some(npi) = &referring.npi {
                if !is_digits(npi, 10) {
                    self.error_with(
                        "VAL_016",
                        "referring_provider.npi",
                        "referring_provider.npi must be 10 digits",
                        "10 digits",
                        npi,
                    );
                }
            }
            if let Some(role) = &referring.role {
                if role != "DN" && role != "P3" {
                    self.error_with(
                        "VAL_017",
                        "referring_provider.role",
                        "referring_provider.role must be DN or P3",
                        "DN or P3",
                        role,
                    );
                }
            }
        }
        if let Some(supervising) = &record.supervising_provider {
            if let Some(npi) = &supervising.npi {
                if !is_digits(npi, 10) {
                    self.error_with(
                        "VAL_018",
                        "supervising_provider.npi",
                        "supervising_provider.npi must be 10 digits",
                        "10 digits",
                        npi,
                    );
                }
            }
        }
    }

    fn check_subscriber(&mut self, sub: &Subscriber) {
        if sub.member_id.is_empty() {
            self.error("VAL_020", "subscriber.member_id", "subscriber.member_id is required");
        } else if sub.member_id.len() > 80 {
            self.error_with(
                "VAL_021",
                "subscriber.member_id",
                "subscriber.member_id exceeds 80 characters",
                "Max 80 characters",
                format!("{} characters", sub.member_id.len()),
            );
        }

        if sub.name.last.is_empty() {
            self.error("VAL_022", "subscriber.name.last", "subscriber.name.last is required");
        } else if sub.name.last.len() > 60 {
            self.error_with(
                "VAL_023",
                "subscriber.name.last",
                "subscriber.name.last exceeds 60 characters",
                "Max 60 characters",
                format!("{} characters", sub.name.last.len()),
            );
        }

        if sub.name.first.is_empty() {
            self.error("VAL_024", "subscriber.name.first", "subscriber.name.first is required");
        } else if sub.name.first.len() > 35 {
            self.error_with(
                "VAL_025",
                "subscriber.name.first",
                "subscriber.name.first exceeds 35 characters",
                "Max 35 characters",
                format!("{} characters", sub.name.first.len()),
            );
        }

        if let Some(dob) = &sub.dob {
            if !is_iso_date(dob) {
                self.error_with(
                    "VAL_026",
                    "subscriber.dob",
                    "subscriber.dob must be a valid yyyy-mm-dd date",
                    "yyyy-mm-dd",
                    dob,
                );
            }
        }

        if let Some(sex) = &sub.sex {
            if codes::sex_code(sex).is_none() {
                self.error_with(
                    "VAL_027",
                    "subscriber.sex",
                    "subscriber.sex is not a valid code",
                    "F, M, or U",
                    sex,
                );
            }
        }

        if let Some(addr) = &sub.address {
            self.check_address(addr, "subscriber.address");
        }
    }

    fn check_claim(&mut self, record: &ClaimRecord) {
        let clm = &record.claim;

        if clm.clm_number.is_empty() {
            self.error("VAL_030", "claim.clm_number", "claim.clm_number is required");
        } else if clm.clm_number.len() > 30 {
            self.error_with(
                "VAL_031",
                "claim.clm_number",
                "claim.clm_number exceeds 30 characters",
                "Max 30 characters",
                format!("{} characters", clm.clm_number.len()),
            );
        }

        match &clm.from {
            None => self.error("VAL_034", "claim.from", "claim.from is required"),
            Some(from) => {
                if !is_iso_date(from) {
                    self.error_with(
                        "VAL_035",
                        "claim.from",
                        "claim.from must be a valid yyyy-mm-dd date",
                        "yyyy-mm-dd",
                        from,
                    );
                }
            }
        }

        if let Some(to) = &clm.to {
            if !is_iso_date(to) {
                self.error_with(
                    "VAL_036",
                    "claim.to",
                    "claim.to must be a valid yyyy-mm-dd date",
                    "yyyy-mm-dd",
                    to,
                );
            }
        }

        if let Some(pos) = &clm.pos {
            if codes::place_of_service(pos).is_none() {
                self.error_with(
                    "VAL_037",
                    "claim.pos",
                    "claim.pos is not a valid place of service code",
                    "Valid POS code",
                    pos,
                );
            }
        }

        let freq = clm.effective_frequency();
        if codes::frequency_code(freq).is_none() {
            self.error_with(
                "VAL_038",
                "claim.frequency_code",
                "claim.frequency_code is not a valid code",
                "1, 6, 7, or 8",
                freq,
            );
        }

        if clm.is_adjustment()
            && clm
                .original_claim_number
                .as_deref()
                .unwrap_or("")
                .is_empty()
        {
            self.error(
                "VAL_039",
                "claim.original_claim_number",
                format!(
                    "claim.original_claim_number is required for frequency code {freq}"
                ),
            );
        }

        match &clm.payment_status {
            None => self.error(
                "VAL_046",
                "claim.payment_status",
                "claim.payment_status is required",
            ),
            Some(status) => {
                if codes::payment_status(status).is_none() {
                    self.error_with(
                        "VAL_046",
                        "claim.payment_status",
                        "claim.payment_status is not a valid code",
                        "P or D",
                        status,
                    );
                }
            }
        }

        match &clm.submission_channel {
            None => self.error(
                "VAL_047",
                "claim.submission_channel",
                "claim.submission_channel is required",
            ),
            Some(channel) => {
                if codes::submission_channel(channel).is_none() {
                    self.error_with(
                        "VAL_047",
                        "claim.submission_channel",
                        "claim.submission_channel is not a valid code",
                        "ELECTRONIC or PAPER",
                        channel,
                    );
                }
            }
        }

        match &clm.rendering_network_indicator {
            None => self.error(
                "VAL_048",
                "claim.rendering_network_indicator",
                "claim.rendering_network_indicator is required",
            ),
            Some(indicator) => {
                if codes::network_indicator(indicator).is_none() {
                    self.error_with(
                        "VAL_048",
                        "claim.rendering_network_indicator",
                        "claim.rendering_network_indicator is not a valid code",
                        "I or O",
                        indicator,
                    );
                }
            }
        }

        match &clm.member_group {
            None => self.error(
                "VAL_049",
                "claim.member_group",
                "claim.member_group is required",
            ),
            Some(group) => {
                let missing = group.missing_fields();
                if !missing.is_empty() {
                    self.error_with(
                        "VAL_049",
                        "claim.member_group",
                        "claim.member_group is missing required fields",
                        "group_id, sub_group_id, class_id, plan_id, product_id",
                        format!("missing: {}", missing.join(", ")),
                    );
                }
            }
        }

        for (path, value) in [
            ("claim.date_of_receipt", &clm.date_of_receipt),
            ("claim.adjudication_date", &clm.adjudication_date),
            ("claim.payment_date", &clm.payment_date),
        ] {
            if let Some(date) = value {
                if !is_iso_date(date) {
                    self.error_with(
                        "VAL_051",
                        path,
                        "date must be a valid yyyy-mm-dd date",
                        "yyyy-mm-dd",
                        date,
                    );
                }
            }
        }

        if let Some(amb) = &clm.ambulance {
            self.check_ambulance(amb);
        }
    }

    fn check_ambulance(&mut self, amb: &Ambulance) {
        if let Some(unit) = &amb.weight_unit {
            if codes::weight_unit(unit).is_none() {
                self.error_with(
                    "VAL_052",
                    "claim.ambulance.weight_unit",
                    "weight_unit is not a valid code",
                    "LB or KG",
                    unit,
                );
            }
        }
        if let Some(code) = &amb.transport_code {
            if codes::transport_code(code).is_none() {
                self.error_with(
                    "VAL_053",
                    "claim.ambulance.transport_code",
                    "transport_code is not a valid code",
                    "A, B, C, D, or E",
                    code,
                );
            }
        }
        if let Some(reason) = &amb.transport_reason {
            if codes::transport_reason(reason).is_none() {
                self.error_with(
                    "VAL_054",
                    "claim.ambulance.transport_reason",
                    "transport_reason is not a valid code",
                    "A, B, C, D, DH, or E",
                    reason,
                );
            }
        }
        if let Some(needs) = &amb.special_needs {
            if needs != "Y" && needs != "N" {
                self.error_with(
                    "VAL_055",
                    "claim.ambulance.special_needs",
                    "special_needs must be Y or N",
                    "Y or N",
                    needs,
                );
            }
        }
        for (path, loc) in [
            ("claim.ambulance.pickup", &amb.pickup),
            ("claim.ambulance.dropoff", &amb.dropoff),
        ] {
            if let Some(loc) = loc {
                self.check_location_times(loc, path);
            }
        }
    }

    fn check_location_times(&mut self, loc: &Location, path: &str) {
        for (field, value) in [
            ("arrival_time", &loc.arrival_time),
            ("departure_time", &loc.departure_time),
        ] {
            if let Some(time) = value {
                if !is_hhmm(time) {
                    self.error_with(
                        "VAL_056",
                        format!("{path}.{field}"),
                        "time must be HHMM",
                        "HHMM (0000-2359)",
                        time,
                    );
                }
            }
        }
        if let Some(code) = loc.location_code.as_deref().filter(|v| !v.is_empty()) {
            if !codes::is_origin_destination_modifier(code) {
                self.warning(
                    "VAL_065",
                    format!("{path}.location_code"),
                    format!("location code {code} is not a recognized origin/destination pair"),
                );
            }
        }
    }

    fn check_services(&mut self, record: &ClaimRecord) {
        if record.services.is_empty() {
            self.error("VAL_040", "services", "At least one service is required");
            return;
        }

        for (i, svc) in record.services.iter().enumerate() {
            let path = format!("services[{i}]");

            if svc.hcpcs.is_empty() {
                self.error("VAL_041", format!("{path}.hcpcs"), "hcpcs is required");
            } else if svc.hcpcs.len() > 5 {
                self.error_with(
                    "VAL_042",
                    format!("{path}.hcpcs"),
                    "hcpcs exceeds 5 characters",
                    "Max 5 characters",
                    &svc.hcpcs,
                );
            } else if codes::hcpcs(&svc.hcpcs).is_none() {
                // Experimental codes pass through with a warning
                self.warning(
                    "VAL_060",
                    format!("{path}.hcpcs"),
                    format!("HCPCS code {} is not in the registry", svc.hcpcs),
                );
            }

            if svc.charge < 0.0 {
                self.error_with(
                    "VAL_043",
                    format!("{path}.charge"),
                    "charge must not be negative",
                    ">= 0",
                    format!("{:.2}", svc.charge),
                );
            }

            if svc.modifiers.len() > 4 {
                self.error_with(
                    "VAL_044",
                    format!("{path}.modifiers"),
                    "at most 4 modifiers are allowed",
                    "Max 4 modifiers",
                    format!("{} modifiers", svc.modifiers.len()),
                );
            }
            for modifier in &svc.modifiers {
                if modifier.len() != 2 {
                    self.error_with(
                        "VAL_045",
                        format!("{path}.modifiers"),
                        "modifier must be 2 characters",
                        "2 characters",
                        modifier,
                    );
                } else if !codes::is_known_modifier(modifier) {
                    self.warning(
                        "VAL_061",
                        format!("{path}.modifiers"),
                        format!("modifier {modifier} is not in the registry"),
                    );
                }
            }

            if let Some(dos) = &svc.dos {
                if !is_iso_date(dos) {
                    self.error_with(
                        "VAL_057",
                        format!("{path}.dos"),
                        "dos must be a valid yyyy-mm-dd date",
                        "yyyy-mm-dd",
                        dos,
                    );
                }
            }

            if let Some(pos) = &svc.pos {
                if codes::place_of_service(pos).is_none() {
                    self.error_with(
                        "VAL_037",
                        format!("{path}.pos"),
                        "pos is not a valid place of service code",
                        "Valid POS code",
                        pos,
                    );
                }
            }

            if let Some(status) = &svc.payment_status {
                if codes::payment_status(status).is_none() {
                    self.error_with(
                        "VAL_046",
                        format!("{path}.payment_status"),
                        "payment_status is not a valid code",
                        "P or D",
                        status,
                    );
                }
            }

            for (which, loc) in [("pickup", &svc.pickup), ("dropoff", &svc.dropoff)] {
                if let Some(loc) = loc {
                    self.check_location_times(loc, &format!("{path}.{which}"));
                }
            }
        }
    }

    fn check_claim_total(&mut self, record: &ClaimRecord) {
        let clm = &record.claim;
        if record.services.is_empty() {
            return; // already reported
        }

        if clm.is_void() {
            return; // voids may carry zero charges
        }

        if clm.total_charge <= 0.0 {
            self.error_with(
                "VAL_033",
                "claim.total_charge",
                "claim.total_charge must be > 0 (frequency 8 voids are exempt)",
                "> 0",
                format!("{:.2}", clm.total_charge),
            );
            return;
        }

        let service_total = record.service_total();
        if (service_total - clm.total_charge).abs() > 0.01 {
            self.error_with(
                "VAL_050",
                "claim.total_charge",
                "claim.total_charge does not match sum of service charges",
                format!("{service_total:.2}"),
                format!("{:.2}", clm.total_charge),
            );
        }
    }

    fn check_mileage_adjacency(&mut self, services: &[Service]) {
        for (i, svc) in services.iter().enumerate() {
            if !codes::is_mileage(&svc.hcpcs) {
                continue;
            }
            if i == 0 {
                self.error_with(
                    "BATCH_021",
                    format!("services[{i}].hcpcs"),
                    format!(
                        "mileage code {} appears as the first service line; it must follow a transport service",
                        svc.hcpcs
                    ),
                    "Transport service before mileage",
                    format!("{} at position 1", svc.hcpcs),
                );
            } else if codes::is_mileage(&services[i - 1].hcpcs) {
                self.error_with(
                    "BATCH_022",
                    format!("services[{i}].hcpcs"),
                    format!(
                        "consecutive mileage codes: {} followed by {}",
                        services[i - 1].hcpcs,
                        svc.hcpcs
                    ),
                    "Transport service before each mileage line",
                    format!("{} then {}", services[i - 1].hcpcs, svc.hcpcs),
                );
            }
        }
    }

    fn check_supervising_requirements(&mut self, record: &ClaimRecord) {
        let claim_supervising = record
            .supervising_provider
            .as_ref()
            .map(|sp| !sp.is_empty())
            .unwrap_or(false);

        for (i, svc) in record.services.iter().enumerate() {
            if !codes::requires_supervising(&svc.hcpcs) {
                continue;
            }
            let line_supervising = svc
                .supervising_provider
                .as_ref()
                .map(|sp| !sp.is_empty())
                .unwrap_or(false);
            if !claim_supervising && !line_supervising {
                self.warning(
                    "VAL_062",
                    format!("services[{i}].supervising_provider"),
                    format!(
                        "HCPCS {} requires a supervising or attendant provider",
                        svc.hcpcs
                    ),
                );
            }
        }
    }

    fn check_location_ambiguity(&mut self, record: &ClaimRecord) {
        let amb = match &record.claim.ambulance {
            Some(amb) => amb,
            None => return,
        };

        // The enricher cascades claim-level locations into lines, so an
        // equal copy is not ambiguous; a differing line-level location is.
        let pickup_conflict = amb.pickup.is_some()
            && record.services.iter().any(|svc| {
                svc.pickup.is_some() && svc.pickup != amb.pickup
            });
        let dropoff_conflict = amb.dropoff.is_some()
            && record.services.iter().any(|svc| {
                svc.dropoff.is_some() && svc.dropoff != amb.dropoff
            });

        if pickup_conflict {
            self.warning(
                "VAL_063",
                "claim.ambulance.pickup",
                "pickup supplied at both claim and service level; downstream parsers may disagree",
            );
        }
        if dropoff_conflict {
            self.warning(
                "VAL_064",
                "claim.ambulance.dropoff",
                "dropoff supplied at both claim and service level; downstream parsers may disagree",
            );
        }
    }
}

fn is_digits(s: &str, n: usize) -> bool {
    s.len() == n && s.bytes().all(|b| b.is_ascii_digit())
}

fn is_zip(s: &str) -> bool {
    match s.len() {
        5 => s.bytes().all(|b| b.is_ascii_digit()),
        10 => {
            s.as_bytes()[5] == b'-'
                && s[..5].bytes().all(|b| b.is_ascii_digit())
                && s[6..].bytes().all(|b| b.is_ascii_digit())
        }
        _ => false,
    }
}

fn is_hhmm(s: &str) -> bool {
    if s.len() != 4 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let hours: u32 = s[..2].parse().unwrap_or(99);
    let minutes: u32 = s[2..].parse().unwrap_or(99);
    hours < 24 && minutes < 60
}

fn is_iso_date(s: &str) -> bool {
    // Shape first: chrono accepts 2026-1-1, the wire format does not
    let bytes = s.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return false;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::enrich::enrich;
    use crate::domain::{
        Address, Claim, MemberGroup, PersonName, Provider, Service, Severity, Subscriber,
    };

    fn valid_record() -> ClaimRecord {
        let record = ClaimRecord {
            submitter: crate::domain::Submitter {
                name: "KAIZEN CLEARING".to_string(),
                id: "KZN001".to_string(),
                ..Default::default()
            },
            receiver: crate::domain::Receiver {
                payer_name: "UNITED HEALTHCARE COMMUNITY & STATE".to_string(),
                payer_id: "87726".to_string(),
            },
            billing_provider: Provider {
                npi: "1111111111".to_string(),
                name: "KAIZEN TRANSIT".to_string(),
                tax_id: Some("123456789".to_string()),
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
                dob: Some("1980-05-05".to_string()),
                sex: Some("M".to_string()),
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
                    group_id: "G1".to_string(),
                    sub_group_id: "SG1".to_string(),
                    class_id: "C1".to_string(),
                    plan_id: "P1".to_string(),
                    product_id: "PR1".to_string(),
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
        };
        enrich(record)
    }

    #[test]
    fn test_valid_record_passes() {
        let report = validate(&valid_record());
        assert!(report.is_valid, "{}", report.format_text());
    }

    #[test]
    fn test_missing_npi() {
        let mut record = valid_record();
        record.billing_provider.npi = String::new();
        record.rendering_provider.as_mut().unwrap().npi = String::new();
        let report = validate(&record);
        assert!(!report.is_valid);
        assert!(report.errors().any(|i| i.code == "VAL_001"));
    }

    #[test]
    fn test_bad_npi_format() {
        let mut record = valid_record();
        record.billing_provider.npi = "12345".to_string();
        let report = validate(&record);
        assert!(report.errors().any(|i| i.code == "VAL_002"));
    }

    #[test]
    fn test_bad_state_and_zip() {
        let mut record = valid_record();
        let addr = record.billing_provider.address.as_mut().unwrap();
        addr.state = "XX".to_string();
        addr.zip = "4020".to_string();
        let report = validate(&record);
        assert!(report.errors().any(|i| i.code == "VAL_010"));
        assert!(report.errors().any(|i| i.code == "VAL_012"));
    }

    #[test]
    fn test_bad_date_rejected() {
        let mut record = valid_record();
        record.claim.from = Some("2026-13-01".to_string());
        record.services[0].dos = Some("2026-13-01".to_string());
        record.services[1].dos = Some("2026-13-01".to_string());
        let report = validate(&record);
        assert!(report.errors().any(|i| i.code == "VAL_035"));
    }

    #[test]
    fn test_short_date_shape_rejected() {
        let mut record = valid_record();
        record.subscriber.dob = Some("1980-5-5".to_string());
        let report = validate(&record);
        assert!(report.errors().any(|i| i.code == "VAL_026"));
    }

    #[test]
    fn test_missing_member_group() {
        let mut record = valid_record();
        record.claim.member_group = None;
        let report = validate(&record);
        assert!(report.errors().any(|i| i.code == "VAL_049"));
    }

    #[test]
    fn test_partial_member_group() {
        let mut record = valid_record();
        record.claim.member_group.as_mut().unwrap().plan_id = String::new();
        let report = validate(&record);
        let issue = report.errors().find(|i| i.code == "VAL_049").unwrap();
        assert!(issue.actual.as_deref().unwrap().contains("plan_id"));
    }

    #[test]
    fn test_adjustment_requires_original_claim_number() {
        let mut record = valid_record();
        record.claim.frequency_code = Some("7".to_string());
        let report = validate(&record);
        assert!(report.errors().any(|i| i.code == "VAL_039"));
    }

    #[test]
    fn test_void_allows_zero_total() {
        let mut record = valid_record();
        record.claim.frequency_code = Some("8".to_string());
        record.claim.original_claim_number = Some("KZN-20260101-001".to_string());
        record.claim.total_charge = 0.0;
        record.services[0].charge = 0.0;
        record.services[1].charge = 0.0;
        let report = validate(&record);
        assert!(report.is_valid, "{}", report.format_text());
    }

    #[test]
    fn test_nonvoid_zero_total_rejected() {
        let mut record = valid_record();
        record.claim.total_charge = 0.0;
        record.services[0].charge = 0.0;
        record.services[1].charge = 0.0;
        let report = validate(&record);
        assert!(report.errors().any(|i| i.code == "VAL_033"));
    }

    #[test]
    fn test_total_mismatch_rejected() {
        let mut record = valid_record();
        record.claim.total_charge = 100.0;
        let report = validate(&record);
        assert!(report.errors().any(|i| i.code == "VAL_050"));
    }

    #[test]
    fn test_total_within_tolerance_passes() {
        let mut record = valid_record();
        record.claim.total_charge = 62.505;
        let report = validate(&record);
        assert!(!report.errors().any(|i| i.code == "VAL_050"));
    }

    #[test]
    fn test_mileage_first_rejected() {
        let mut record = valid_record();
        record.services.swap(0, 1);
        let report = validate(&record);
        assert!(report.errors().any(|i| i.code == "BATCH_021"));
    }

    #[test]
    fn test_consecutive_mileage_rejected() {
        let mut record = valid_record();
        record.services.push(Service {
            hcpcs: "A0425".to_string(),
            charge: 0.0,
            ..Default::default()
        });
        record.claim.total_charge = record.services.iter().map(|s| s.charge).sum();
        let report = validate(&enrich(record));
        assert!(report.errors().any(|i| i.code == "BATCH_022"));
    }

    #[test]
    fn test_unknown_hcpcs_is_warning_only() {
        let mut record = valid_record();
        record.services[0].hcpcs = "X9999".to_string();
        let report = validate(&record);
        assert!(report.is_valid);
        assert!(report.warnings().any(|i| i.code == "VAL_060"));
    }

    #[test]
    fn test_unknown_modifier_is_warning() {
        let mut record = valid_record();
        record.services[0].modifiers = vec!["Q9".to_string()];
        let report = validate(&record);
        assert!(report.is_valid);
        assert!(report.warnings().any(|i| i.code == "VAL_061"));
    }

    #[test]
    fn test_too_many_modifiers() {
        let mut record = valid_record();
        record.services[0].modifiers = vec![
            "RH".to_string(),
            "HR".to_string(),
            "GA".to_string(),
            "QM".to_string(),
            "QN".to_string(),
        ];
        let report = validate(&record);
        assert!(report.errors().any(|i| i.code == "VAL_044"));
    }

    #[test]
    fn test_special_transport_supervising_warning() {
        let mut record = valid_record();
        record.services[0].hcpcs = "A0110".to_string();
        let report = validate(&record);
        assert!(report.warnings().any(|i| i.code == "VAL_062"));
    }

    #[test]
    fn test_severity_counts() {
        let mut record = valid_record();
        record.billing_provider.npi = String::new();
        let report = validate(&record);
        assert!(report.issues.iter().any(|i| i.severity == Severity::Error));
    }
}
