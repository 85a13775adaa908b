//! Trip records
//!
//! A trip record is the flattened representation of a single service
//! event: member, providers, date, service, and optional pickup and
//! dropoff. The batch processor groups trips into
//! [`ClaimRecord`](crate::domain::claim::ClaimRecord)s by
//! (billing NPI, rendering NPI, date of service, member id).

use crate::domain::claim::{
    Adjudication, Ambulance, Location, MemberGroup, Provider, Receiver, Service, Submitter,
    Subscriber, SupportingProvider,
};
use serde::{Deserialize, Serialize};

/// One atomic trip, as received from dispatch or adjudication feeds
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TripRecord {
    /// Date of service, yyyy-mm-dd; part of the grouping key
    #[serde(default)]
    pub dos: Option<String>,

    /// Member receiving transportation; part of the grouping key
    #[serde(default)]
    pub member: Option<Subscriber>,

    /// Billing provider; part of the grouping key
    #[serde(default)]
    pub billing_provider: Option<Provider>,

    /// Rendering provider; part of the grouping key
    #[serde(default)]
    pub rendering_provider: Option<Provider>,

    /// The service performed on this trip
    #[serde(default)]
    pub service: Option<Service>,

    #[serde(default)]
    pub pickup: Option<Location>,

    #[serde(default)]
    pub dropoff: Option<Location>,

    /// Submitting party; configuration supplies a fallback
    #[serde(default)]
    pub submitter: Option<Submitter>,

    /// Destination payer; the payer preset supplies a fallback
    #[serde(default)]
    pub receiver: Option<Receiver>,

    /// ELECTRONIC or PAPER; aggregated across the group
    #[serde(default)]
    pub submission_channel: Option<String>,

    /// P or D; must agree across the group
    #[serde(default)]
    pub payment_status: Option<String>,

    /// I or O; must agree across the group
    #[serde(default)]
    pub rendering_network_indicator: Option<String>,

    /// Must agree across the group
    #[serde(default)]
    pub member_group: Option<MemberGroup>,

    #[serde(default)]
    pub ambulance: Option<Ambulance>,

    #[serde(default)]
    pub supervising_provider: Option<SupportingProvider>,

    #[serde(default)]
    pub emergency: Option<bool>,

    #[serde(default)]
    pub adjudication: Vec<Adjudication>,

    /// Explicit claim number; the first trip in a group wins, otherwise
    /// the processor generates KZN-<yyyymmdd>-<seq>
    #[serde(default)]
    pub clm_number: Option<String>,

    #[serde(default)]
    pub frequency_code: Option<String>,

    #[serde(default)]
    pub original_claim_number: Option<String>,

    #[serde(default)]
    pub pos: Option<String>,

    #[serde(default)]
    pub auth_number: Option<String>,

    #[serde(default)]
    pub tracking_number: Option<String>,

    #[serde(default)]
    pub patient_account: Option<String>,

    /// yyyy-mm-dd
    #[serde(default)]
    pub date_of_receipt: Option<String>,

    /// yyyy-mm-dd
    #[serde(default)]
    pub adjudication_date: Option<String>,

    /// yyyy-mm-dd
    #[serde(default)]
    pub payment_date: Option<String>,
}

impl TripRecord {
    /// Grouping key components: (billing NPI, rendering NPI, DOS, member id)
    ///
    /// Missing parts group under the empty string, matching the
    /// behavior of downstream duplicate detection which treats absent
    /// identifiers as equal.
    pub fn group_key(&self) -> (String, String, String, String) {
        (
            self.billing_provider
                .as_ref()
                .map(|p| p.npi.clone())
                .unwrap_or_default(),
            self.rendering_provider
                .as_ref()
                .map(|p| p.npi.clone())
                .unwrap_or_default(),
            self.dos.clone().unwrap_or_default(),
            self.member
                .as_ref()
                .map(|m| m.member_id.clone())
                .unwrap_or_default(),
        )
    }
}
