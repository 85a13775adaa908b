//! Claim enrichment
//!
//! Deterministic, idempotent transformation that fills cascading
//! defaults and derived fields before validation. Enrichment never
//! invents `member_group`, `payment_status`, or `submission_channel`;
//! their absence stays an input defect for the validator to report.

use crate::domain::ClaimRecord;

/// Default place of service: ambulance, land
const DEFAULT_POS: &str = "41";

/// Enriches a claim record
///
/// Rules, applied in order:
/// 1. `claim.to` defaults to `claim.from`
/// 2. `claim.pos` defaults to 41
/// 3. `claim.frequency_code` defaults to 1, translating the legacy
///    `adjustment_type` alias (replacement→7, void→8); an explicit code
///    wins
/// 4. Each service inherits dos/pos/units/emergency defaults and the
///    claim-level trip number, pickup, dropoff and payment status
/// 5. A missing rendering provider is populated from the billing
///    provider so every claim carries an identified renderer
///
/// Applying the function twice yields the same record as applying it
/// once.
pub fn enrich(mut record: ClaimRecord) -> ClaimRecord {
    let claim = &mut record.claim;

    if claim.to.is_none() {
        claim.to = claim.from.clone();
    }

    if claim.pos.as_deref().unwrap_or("").is_empty() {
        claim.pos = Some(DEFAULT_POS.to_string());
    }

    if claim.frequency_code.as_deref().unwrap_or("").is_empty() {
        let code = match claim.adjustment_type.as_deref() {
            Some("replacement") => "7",
            Some("void") => "8",
            _ => "1",
        };
        claim.frequency_code = Some(code.to_string());
    }

    let claim_from = claim.from.clone();
    let claim_pos = claim.pos.clone();
    let claim_status = claim.payment_status.clone();
    let (claim_trip, claim_pickup, claim_dropoff) = match &claim.ambulance {
        Some(amb) => (amb.trip_number, amb.pickup.clone(), amb.dropoff.clone()),
        None => (None, None, None),
    };

    for service in &mut record.services {
        if service.dos.is_none() {
            service.dos = claim_from.clone();
        }
        if service.pos.as_deref().unwrap_or("").is_empty() {
            service.pos = claim_pos.clone();
        }
        if service.units.is_none() {
            service.units = Some(1.0);
        }
        if service.emergency.is_none() {
            service.emergency = Some(false);
        }
        if service.trip_number.is_none() {
            service.trip_number = claim_trip;
        }
        if service.pickup.is_none() {
            service.pickup = claim_pickup.clone();
        }
        if service.dropoff.is_none() {
            service.dropoff = claim_dropoff.clone();
        }
        if service.payment_status.is_none() {
            service.payment_status = claim_status.clone();
        }
    }

    // Kaizen fallback: every claim carries an identified renderer
    let rendering_missing = record
        .rendering_provider
        .as_ref()
        .map(|p| p.is_empty())
        .unwrap_or(true);
    if rendering_missing {
        record.rendering_provider = Some(record.billing_provider.clone());
    }

    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Ambulance, Claim, Location, Provider, Service};

    fn base_record() -> ClaimRecord {
        ClaimRecord {
            billing_provider: Provider {
                npi: "1111111111".to_string(),
                name: "KAIZEN TRANSIT".to_string(),
                ..Default::default()
            },
            claim: Claim {
                clm_number: "KZN-20260101-001".to_string(),
                from: Some("2026-01-01".to_string()),
                total_charge: 62.5,
                payment_status: Some("P".to_string()),
                ambulance: Some(Ambulance {
                    trip_number: Some(42),
                    pickup: Some(Location {
                        line1: "1 MAIN ST".to_string(),
                        city: "LOUISVILLE".to_string(),
                        state: "KY".to_string(),
                        zip: "40202".to_string(),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            },
            services: vec![Service {
                hcpcs: "A0130".to_string(),
                charge: 62.5,
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_applied() {
        let enriched = enrich(base_record());
        assert_eq!(enriched.claim.to.as_deref(), Some("2026-01-01"));
        assert_eq!(enriched.claim.pos.as_deref(), Some("41"));
        assert_eq!(enriched.claim.frequency_code.as_deref(), Some("1"));

        let svc = &enriched.services[0];
        assert_eq!(svc.dos.as_deref(), Some("2026-01-01"));
        assert_eq!(svc.pos.as_deref(), Some("41"));
        assert_eq!(svc.units, Some(1.0));
        assert_eq!(svc.emergency, Some(false));
        assert_eq!(svc.trip_number, Some(42));
        assert!(svc.pickup.is_some());
        assert_eq!(svc.payment_status.as_deref(), Some("P"));
    }

    #[test]
    fn test_adjustment_type_translation() {
        let mut record = base_record();
        record.claim.adjustment_type = Some("void".to_string());
        let enriched = enrich(record);
        assert_eq!(enriched.claim.frequency_code.as_deref(), Some("8"));
    }

    #[test]
    fn test_explicit_frequency_wins_over_alias() {
        let mut record = base_record();
        record.claim.frequency_code = Some("6".to_string());
        record.claim.adjustment_type = Some("void".to_string());
        let enriched = enrich(record);
        assert_eq!(enriched.claim.frequency_code.as_deref(), Some("6"));
    }

    #[test]
    fn test_rendering_provider_fallback() {
        let enriched = enrich(base_record());
        let rendering = enriched.rendering_provider.as_ref().unwrap();
        assert_eq!(rendering.npi, "1111111111");
        assert_eq!(rendering.name, "KAIZEN TRANSIT");
    }

    #[test]
    fn test_existing_rendering_provider_kept() {
        let mut record = base_record();
        record.rendering_provider = Some(Provider {
            npi: "2222222222".to_string(),
            name: "CAB CO".to_string(),
            ..Default::default()
        });
        let enriched = enrich(record);
        assert_eq!(enriched.rendering_provider.as_ref().unwrap().npi, "2222222222");
    }

    #[test]
    fn test_service_level_values_not_overwritten() {
        let mut record = base_record();
        record.services[0].dos = Some("2026-01-02".to_string());
        record.services[0].units = Some(3.0);
        record.services[0].payment_status = Some("D".to_string());
        let enriched = enrich(record);
        assert_eq!(enriched.services[0].dos.as_deref(), Some("2026-01-02"));
        assert_eq!(enriched.services[0].units, Some(3.0));
        assert_eq!(enriched.services[0].payment_status.as_deref(), Some("D"));
    }

    #[test]
    fn test_never_invents_member_group_or_channel() {
        let enriched = enrich(base_record());
        assert!(enriched.claim.member_group.is_none());
        assert!(enriched.claim.submission_channel.is_none());
    }

    #[test]
    fn test_idempotence() {
        let once = enrich(base_record());
        let twice = enrich(once.clone());
        assert_eq!(
            serde_json::to_value(&once).unwrap(),
            serde_json::to_value(&twice).unwrap()
        );
    }
}
