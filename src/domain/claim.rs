//! Claim record tree
//!
//! Typed records for the single-claim pipeline. Conversion from
//! free-form input happens once at this boundary: every struct derives
//! `Deserialize`, unknown fields are ignored, and missing fields take
//! documented defaults so that the pre-submission validator can report
//! all defects in one pass instead of failing on the first one.
//!
//! Code-valued fields (place of service, frequency code, payment
//! status, ...) stay as strings and are checked against the
//! [`codes`](crate::codes) registry; making them enums would reject
//! unknown values at parse time and defeat issue accumulation.

use serde::{Deserialize, Serialize};

/// Party responsible for the submission (Loop 1000A)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Submitter {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub id: String,
    /// Contact name for PER*IC
    #[serde(default)]
    pub contact_name: Option<String>,
    /// Contact phone for PER*IC
    #[serde(default)]
    pub contact_phone: Option<String>,
}

/// Destination payer (Loop 1000B / 2010BB)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Receiver {
    #[serde(default)]
    pub payer_name: String,
    #[serde(default)]
    pub payer_id: String,
}

/// Postal address
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    #[serde(default)]
    pub city: String,
    /// Two-letter US postal state code
    #[serde(default)]
    pub state: String,
    /// 5-digit or 5+4 ZIP
    #[serde(default)]
    pub zip: String,
}

/// Organizational provider (billing or rendering)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Provider {
    /// 10-digit National Provider Identifier
    #[serde(default)]
    pub npi: String,
    #[serde(default)]
    pub name: String,
    /// 9-digit federal tax id (REF*EI)
    #[serde(default)]
    pub tax_id: Option<String>,
    /// Taxonomy code (PRV*PXC)
    #[serde(default)]
    pub taxonomy: Option<String>,
    #[serde(default)]
    pub address: Option<Address>,
    /// Legacy/commercial number (REF*G2); REF*0B is used when absent
    #[serde(default)]
    pub legacy_id: Option<String>,
    /// State license number (REF*0B)
    #[serde(default)]
    pub state_license: Option<String>,
}

impl Provider {
    /// True when neither NPI nor name is populated
    pub fn is_empty(&self) -> bool {
        self.npi.is_empty() && self.name.is_empty()
    }
}

/// Person name pair
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersonName {
    #[serde(default)]
    pub first: String,
    #[serde(default)]
    pub last: String,
}

/// Member receiving transportation (Loop 2010BA)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Subscriber {
    #[serde(default)]
    pub member_id: String,
    #[serde(default)]
    pub name: PersonName,
    /// Date of birth, yyyy-mm-dd
    #[serde(default)]
    pub dob: Option<String>,
    /// F, M or U
    #[serde(default)]
    pub sex: Option<String>,
    #[serde(default)]
    pub address: Option<Address>,
    /// Relationship to insured; anything other than "self" emits SBR02=01
    #[serde(default)]
    pub relationship: Option<String>,
}

/// Individual provider attached to a claim or service line
/// (supervising 2310D/2420D, assistant)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SupportingProvider {
    #[serde(default)]
    pub name: PersonName,
    #[serde(default)]
    pub npi: Option<String>,
    #[serde(default)]
    pub taxonomy: Option<String>,
}

impl SupportingProvider {
    /// True when no identifying data is present
    pub fn is_empty(&self) -> bool {
        self.name.first.is_empty() && self.name.last.is_empty() && self.npi.is_none()
    }
}

/// Service facility (Loop 2310C)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Facility {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub npi: Option<String>,
    #[serde(default)]
    pub address: Option<Address>,
}

/// Referring provider (Loop 2310A)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferringProvider {
    #[serde(default)]
    pub name: PersonName,
    #[serde(default)]
    pub npi: Option<String>,
    /// NM1 qualifier: DN (referring) or P3 (primary care)
    #[serde(default)]
    pub role: Option<String>,
}

/// Member group hierarchy; all five fields are required on every claim
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberGroup {
    #[serde(default)]
    pub group_id: String,
    #[serde(default)]
    pub sub_group_id: String,
    #[serde(default)]
    pub class_id: String,
    #[serde(default)]
    pub plan_id: String,
    #[serde(default)]
    pub product_id: String,
}

impl MemberGroup {
    /// Names of fields that are empty
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.group_id.is_empty() {
            missing.push("group_id");
        }
        if self.sub_group_id.is_empty() {
            missing.push("sub_group_id");
        }
        if self.class_id.is_empty() {
            missing.push("class_id");
        }
        if self.plan_id.is_empty() {
            missing.push("plan_id");
        }
        if self.product_id.is_empty() {
            missing.push("product_id");
        }
        missing
    }
}

/// Pickup or dropoff location
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip: String,
    /// Two-letter origin/destination location code
    #[serde(default)]
    pub location_code: Option<String>,
    /// HHMM
    #[serde(default)]
    pub arrival_time: Option<String>,
    /// HHMM
    #[serde(default)]
    pub departure_time: Option<String>,
}

/// Ambulance transport block (CR1 and trip descriptors)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ambulance {
    /// LB or KG
    #[serde(default)]
    pub weight_unit: Option<String>,
    #[serde(default)]
    pub patient_weight: Option<f64>,
    /// A through E
    #[serde(default)]
    pub transport_code: Option<String>,
    /// A, B, C, D, DH or E
    #[serde(default)]
    pub transport_reason: Option<String>,
    /// Padded to 9 digits on emit
    #[serde(default)]
    pub trip_number: Option<u64>,
    /// Y or N
    #[serde(default)]
    pub special_needs: Option<String>,
    #[serde(default)]
    pub pickup: Option<Location>,
    #[serde(default)]
    pub dropoff: Option<Location>,
}

/// One reason-coded monetary adjustment (CAS)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CasAdjustment {
    /// Claim adjustment group code (CO, PR, OA, ...)
    #[serde(default = "default_cas_group")]
    pub group: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub quantity: Option<f64>,
}

fn default_cas_group() -> String {
    "CO".to_string()
}

/// Line-level adjudication from a prior payer (Loop 2430)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Adjudication {
    #[serde(default)]
    pub payer_id: Option<String>,
    #[serde(default)]
    pub paid_amount: f64,
    #[serde(default)]
    pub paid_units: Option<f64>,
    #[serde(default)]
    pub line_cas: Vec<CasAdjustment>,
    /// Line payment date, yyyy-mm-dd (DTP*573)
    #[serde(default)]
    pub payment_date: Option<String>,
}

/// Other payer for coordination of benefits (Loops 2320/2330)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OtherPayer {
    #[serde(default)]
    pub payer_name: String,
    #[serde(default)]
    pub payer_id: String,
    /// P, S or T payer responsibility; defaults to S on emit
    #[serde(default)]
    pub responsibility: Option<String>,
    #[serde(default)]
    pub paid_amount: Option<f64>,
}

/// Claim-level data (Loop 2300)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Claim {
    /// Unique claim number (CLM01), max 30 characters
    #[serde(default)]
    pub clm_number: String,

    /// Total charge; may be 0 for voids
    #[serde(default)]
    pub total_charge: f64,

    /// Service period start, yyyy-mm-dd
    #[serde(default)]
    pub from: Option<String>,

    /// Service period end; defaults to `from`
    #[serde(default)]
    pub to: Option<String>,

    /// Place of service, 2-digit code; defaults to 41
    #[serde(default)]
    pub pos: Option<String>,

    /// 1 original, 6 corrected, 7 replacement, 8 void; defaults to 1
    #[serde(default)]
    pub frequency_code: Option<String>,

    /// Legacy alias: "replacement" or "void"; explicit frequency wins
    #[serde(default)]
    pub adjustment_type: Option<String>,

    /// Required when frequency_code is 6, 7 or 8 (REF*F8)
    #[serde(default)]
    pub original_claim_number: Option<String>,

    /// P paid or D denied
    #[serde(default)]
    pub payment_status: Option<String>,

    /// ELECTRONIC or PAPER
    #[serde(default)]
    pub submission_channel: Option<String>,

    /// I in-network or O out-of-network
    #[serde(default)]
    pub rendering_network_indicator: Option<String>,

    #[serde(default)]
    pub member_group: Option<MemberGroup>,

    #[serde(default)]
    pub ambulance: Option<Ambulance>,

    /// ICD-10 diagnosis codes (HI*ABK/ABF)
    #[serde(default)]
    pub icd10: Vec<String>,

    /// Prior authorization number (REF*G1)
    #[serde(default)]
    pub auth_number: Option<String>,

    /// Tracking number (REF*D9)
    #[serde(default)]
    pub tracking_number: Option<String>,

    /// Patient account number (REF*EA)
    #[serde(default)]
    pub patient_account: Option<String>,

    /// Internal subscriber id for the K3 SUB block
    #[serde(default)]
    pub subscriber_internal_id: Option<String>,

    /// Originating IP for the K3 IPAD block
    #[serde(default)]
    pub ip_address: Option<String>,

    /// Submitting user for the K3 USER block
    #[serde(default)]
    pub user_id: Option<String>,

    /// yyyy-mm-dd (K3 DREC, DTP*050)
    #[serde(default)]
    pub date_of_receipt: Option<String>,

    /// yyyy-mm-dd (K3 DADJ, DTP*036)
    #[serde(default)]
    pub adjudication_date: Option<String>,

    /// yyyy-mm-dd (K3 PAIDDT, DTP*573)
    #[serde(default)]
    pub payment_date: Option<String>,

    /// Explicit claim-level adjustments; denied claims without any get
    /// the automatic CAS*CO*45 fallback
    #[serde(default)]
    pub cas: Vec<CasAdjustment>,

    /// AMT*B6 when other payers are present
    #[serde(default)]
    pub allowed_amount: Option<f64>,

    /// AMT*EAF when other payers are present
    #[serde(default)]
    pub remaining_liability: Option<f64>,

    /// AMT*AU when other payers are present
    #[serde(default)]
    pub coverage_amount: Option<f64>,

    /// AMT*F2 when other payers are present
    #[serde(default)]
    pub patient_paid: Option<f64>,
}

impl Claim {
    /// Resolved frequency code: explicit value, legacy alias, then "1"
    pub fn effective_frequency(&self) -> &str {
        if let Some(code) = self.frequency_code.as_deref() {
            if !code.is_empty() {
                return code;
            }
        }
        match self.adjustment_type.as_deref() {
            Some("replacement") => "7",
            Some("void") => "8",
            _ => "1",
        }
    }

    /// True for frequency codes 6, 7 and 8
    pub fn is_adjustment(&self) -> bool {
        matches!(self.effective_frequency(), "6" | "7" | "8")
    }

    /// True for frequency code 8
    pub fn is_void(&self) -> bool {
        self.effective_frequency() == "8"
    }
}

/// One service line (Loop 2400)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Service {
    /// HCPCS procedure code, max 5 characters
    #[serde(default)]
    pub hcpcs: String,

    /// Up to four 2-character modifiers
    #[serde(default)]
    pub modifiers: Vec<String>,

    #[serde(default)]
    pub charge: f64,

    /// Unit count or mileage; defaults to 1
    #[serde(default)]
    pub units: Option<f64>,

    /// Date of service, yyyy-mm-dd; defaults to claim.from
    #[serde(default)]
    pub dos: Option<String>,

    /// Defaults to claim.pos
    #[serde(default)]
    pub pos: Option<String>,

    /// Emergency indicator (SV111); defaults to false
    #[serde(default)]
    pub emergency: Option<bool>,

    #[serde(default)]
    pub pickup: Option<Location>,

    #[serde(default)]
    pub dropoff: Option<Location>,

    /// Defaults from claim.ambulance.trip_number
    #[serde(default)]
    pub trip_number: Option<u64>,

    /// Inherited from the claim when absent
    #[serde(default)]
    pub payment_status: Option<String>,

    /// Line-level supervising provider (Loop 2420D)
    #[serde(default)]
    pub supervising_provider: Option<SupportingProvider>,

    #[serde(default)]
    pub adjudication: Vec<Adjudication>,
}

/// Root record for the single-claim flow
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClaimRecord {
    #[serde(default)]
    pub submitter: Submitter,
    #[serde(default)]
    pub receiver: Receiver,
    #[serde(default)]
    pub billing_provider: Provider,
    #[serde(default)]
    pub subscriber: Subscriber,
    #[serde(default)]
    pub rendering_provider: Option<Provider>,
    #[serde(default)]
    pub supervising_provider: Option<SupportingProvider>,
    #[serde(default)]
    pub referring_provider: Option<ReferringProvider>,
    #[serde(default)]
    pub service_facility: Option<Facility>,
    #[serde(default)]
    pub claim: Claim,
    #[serde(default)]
    pub services: Vec<Service>,
    #[serde(default)]
    pub other_payers: Vec<OtherPayer>,
}

impl ClaimRecord {
    /// Sum of service line charges
    pub fn service_total(&self) -> f64 {
        self.services.iter().map(|s| s.charge).sum()
    }

    /// Duplicate-detection triple: (CLM01, CLM05-3, REF*F8)
    pub fn duplicate_key(&self) -> (String, String, String) {
        (
            self.claim.clm_number.clone(),
            self.claim.effective_frequency().to_string(),
            self.claim
                .original_claim_number
                .clone()
                .unwrap_or_default(),
        )
    }
}
