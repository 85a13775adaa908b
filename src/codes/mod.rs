//! Code registry
//!
//! Closed lookup tables compiled into the binary: places of service,
//! transport codes and reasons, HCPCS procedure codes, origin/destination
//! and functional modifiers, frequency codes, and payer presets.
//! Lookups return descriptions and never mutate data; the registry is
//! immutable and safely shared.

/// Place of service description (NEMT whitelist)
pub fn place_of_service(code: &str) -> Option<&'static str> {
    let desc = match code {
        "02" => "Telehealth",
        "11" => "Office",
        "12" => "Home",
        "21" => "Inpatient Hospital",
        "22" => "On Campus-Outpatient Hospital",
        "23" => "Emergency Room - Hospital",
        "31" => "Skilled Nursing Facility",
        "32" => "Nursing Facility",
        "33" => "Custodial Care Facility",
        "41" => "Ambulance - Land",
        "42" => "Ambulance - Air or Water",
        "49" => "Independent Clinic",
        "50" => "Federally Qualified Health Center",
        "51" => "Inpatient Psychiatric Facility",
        "52" => "Psychiatric Facility Partial Hospitalization",
        "53" => "Community Mental Health Center",
        "54" => "Intermediate Care Facility",
        "55" => "Residential Substance Abuse Treatment Facility",
        "56" => "Psychiatric Residential Treatment Center",
        "57" => "Non-residential Substance Abuse Treatment Facility",
        "60" => "Mass Immunization Center",
        "61" => "Comprehensive Inpatient Rehabilitation Facility",
        "62" => "Comprehensive Outpatient Rehabilitation Facility",
        "65" => "End-Stage Renal Disease Treatment Facility",
        "71" => "Public Health Clinic",
        "72" => "Rural Health Clinic",
        "81" => "Independent Laboratory",
        "99" => "Other Place of Service",
        _ => return None,
    };
    Some(desc)
}

/// HCPCS procedure code description (ambulance A-series plus NEMT T-series)
pub fn hcpcs(code: &str) -> Option<&'static str> {
    let desc = match code {
        "A0021" => "Ambulance service, outside state per mile, transport",
        "A0080" => "Non-emergency transportation, per mile - vehicle provided by volunteer",
        "A0090" => "Non-emergency transportation, per mile - vehicle provided by individual",
        "A0100" => "Non-emergency transportation; taxi",
        "A0110" => "Non-emergency transportation and bus, intra- or inter-state carrier",
        "A0120" => "Non-emergency transportation: mini-bus, mountain area transports",
        "A0130" => "Non-emergency transportation: wheelchair van",
        "A0140" => "Non-emergency transportation and air travel, intra- or inter-state",
        "A0160" => "Non-emergency transportation: per mile - case worker or social worker",
        "A0170" => "Transportation ancillary: parking fees, tolls, other",
        "A0180" => "Non-emergency transportation: ancillary: lodging-recipient",
        "A0190" => "Non-emergency transportation: ancillary: meals-recipient",
        "A0200" => "Non-emergency transportation: ancillary: lodging-escort",
        "A0210" => "Non-emergency transportation: ancillary: meals-escort",
        "A0225" => "Ambulance service, neonatal transport, base rate, emergency transport",
        "A0380" => "BLS mileage (per mile)",
        "A0382" => "BLS routine disposable supplies",
        "A0384" => "BLS specialized service disposable supplies",
        "A0390" => "ALS mileage (per mile)",
        "A0392" => "ALS specialized service disposable supplies",
        "A0394" => "ALS specialized service mileage",
        "A0396" => "ALS specialized service; defibrillation",
        "A0398" => "ALS routine disposable supplies",
        "A0420" => "Ambulance waiting time (ALS or BLS)",
        "A0422" => "Ambulance (ALS or BLS) oxygen and oxygen supplies",
        "A0424" => "Extra ambulance attendant, ground or air",
        "A0425" => "Ground mileage, per statute mile",
        "A0426" => "Ambulance service, advanced life support, non-emergency transport (ALS 1)",
        "A0427" => "Ambulance service, advanced life support, emergency transport (ALS 1 - emergency)",
        "A0428" => "Ambulance service, basic life support, non-emergency transport (BLS)",
        "A0429" => "Ambulance service, basic life support, emergency transport (BLS - emergency)",
        "A0430" => "Ambulance service, conventional air services, one way (fixed wing)",
        "A0431" => "Ambulance service, conventional air services, one way (rotary wing)",
        "A0432" => "Paramedic intercept, rural area, volunteer ambulance company",
        "A0433" => "Advanced life support, level 2 (ALS 2)",
        "A0434" => "Specialty care transport (SCT)",
        "A0435" => "Fixed wing air mileage, per statute mile",
        "A0436" => "Rotary wing air mileage, per statute mile",
        "T2001" => "Non-emergency transportation; patient attendant/escort",
        "T2002" => "Non-emergency transportation; per diem",
        "T2003" => "Non-emergency transportation; encounter/trip",
        "T2004" => "Non-emergency transport; commercial carrier, multi-pass",
        "T2005" => "Non-emergency transportation; stretcher van",
        "T2007" => "Transportation waiting time, one half hour increments",
        "T2049" => "Non-emergency transportation; stretcher van, mileage; per mile",
        _ => return None,
    };
    Some(desc)
}

/// Mileage HCPCS codes; each must immediately follow a transport line
pub const MILEAGE_HCPCS: [&str; 7] = [
    "A0380", "A0382", "A0390", "A0425", "A0435", "A0436", "T2049",
];

/// True when `code` is a mileage HCPCS
pub fn is_mileage(code: &str) -> bool {
    MILEAGE_HCPCS.contains(&code)
}

/// HCPCS codes that require a supervising or attendant provider
pub const SPECIAL_TRANSPORT_HCPCS: [&str; 12] = [
    "A0090", "A0100", "A0110", "A0120", "A0140", "A0160", "A0170", "A0180", "A0190", "A0200",
    "A0210", "T2001",
];

/// True when `code` requires a supervising provider
pub fn requires_supervising(code: &str) -> bool {
    SPECIAL_TRANSPORT_HCPCS.contains(&code)
}

/// Origin/destination letters used to form two-character modifiers
const ORIGIN_DESTINATION_LETTERS: [char; 11] =
    ['D', 'E', 'G', 'H', 'I', 'J', 'N', 'P', 'R', 'S', 'X'];

/// Origin/destination letter description
pub fn origin_destination_letter(letter: char) -> Option<&'static str> {
    let desc = match letter {
        'D' => "Diagnostic or therapeutic site other than P or H",
        'E' => "Residential, domiciliary, custodial facility",
        'G' => "Hospital-based dialysis facility",
        'H' => "Hospital",
        'I' => "Site of transfer between modes of transport",
        'J' => "Non-hospital-based dialysis facility",
        'N' => "Skilled nursing facility",
        'P' => "Physician's office",
        'R' => "Residence",
        'S' => "Scene of accident or acute event",
        'X' => "Intermediate stop at physician's office",
        _ => return None,
    };
    Some(desc)
}

/// True for the 110 two-character origin/destination modifiers: both
/// characters from the origin/destination alphabet and distinct
pub fn is_origin_destination_modifier(code: &str) -> bool {
    let mut chars = code.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some(a), Some(b), None) => {
            a != b
                && ORIGIN_DESTINATION_LETTERS.contains(&a)
                && ORIGIN_DESTINATION_LETTERS.contains(&b)
        }
        _ => false,
    }
}

/// Functional modifier description
pub fn functional_modifier(code: &str) -> Option<&'static str> {
    let desc = match code {
        "GA" => "Waiver of liability statement issued as required by payer policy",
        "GY" => "Item or service statutorily excluded",
        "GZ" => "Item or service expected to be denied",
        "QM" => "Ambulance service provided under arrangement by a provider of services",
        "QN" => "Ambulance service furnished directly by a provider of services",
        "GM" => "Multiple patients on one ambulance trip",
        "QL" => "Patient pronounced dead after ambulance called",
        "TQ" => "Basic life support transport by a volunteer ambulance provider",
        _ => return None,
    };
    Some(desc)
}

/// True when `code` is a recognized HCPCS modifier of either kind
pub fn is_known_modifier(code: &str) -> bool {
    is_origin_destination_modifier(code) || functional_modifier(code).is_some()
}

/// Frequency code description (CLM05-3)
pub fn frequency_code(code: &str) -> Option<&'static str> {
    let desc = match code {
        "1" => "Original claim",
        "6" => "Corrected claim",
        "7" => "Replacement of prior claim",
        "8" => "Void/cancel of prior claim",
        _ => return None,
    };
    Some(desc)
}

/// Ambulance transport code description (CR1)
pub fn transport_code(code: &str) -> Option<&'static str> {
    let desc = match code {
        "A" => "Patient was transported to nearest facility",
        "B" => "Patient was transported for the benefit of a preferred physician",
        "C" => "Patient was transported for the nearness of family members",
        "D" => "Patient was transported for the care of a specialist",
        "E" => "Patient was transported for the care of a preferred facility",
        _ => return None,
    };
    Some(desc)
}

/// Ambulance transport reason description (CR1)
pub fn transport_reason(code: &str) -> Option<&'static str> {
    let desc = match code {
        "A" => "Patient was transported for emergency care",
        "B" => "Patient was transported for the purposes of medical treatment",
        "C" => "Patient was transported for the purposes of diagnostic procedures",
        "D" => "Patient was transported for the purposes of a medical emergency",
        "DH" => "Hospital to hospital transfer",
        "E" => "Patient was transported for the purposes of surgery",
        _ => return None,
    };
    Some(desc)
}

/// Patient weight unit description (CR1)
pub fn weight_unit(code: &str) -> Option<&'static str> {
    match code {
        "LB" => Some("Pounds"),
        "KG" => Some("Kilograms"),
        _ => None,
    }
}

/// Sex code description (DMG)
pub fn sex_code(code: &str) -> Option<&'static str> {
    match code {
        "F" => Some("Female"),
        "M" => Some("Male"),
        "U" => Some("Unknown"),
        _ => None,
    }
}

/// Network indicator description (K3 SNWK)
pub fn network_indicator(code: &str) -> Option<&'static str> {
    match code {
        "I" => Some("In-network"),
        "O" => Some("Out-of-network"),
        _ => None,
    }
}

/// Submission channel description (K3 TRPN)
pub fn submission_channel(code: &str) -> Option<&'static str> {
    match code {
        "ELECTRONIC" => Some("Electronic submission"),
        "PAPER" => Some("Paper submission"),
        _ => None,
    }
}

/// Payment status description (K3 PYMS)
pub fn payment_status(code: &str) -> Option<&'static str> {
    match code {
        "P" => Some("Paid"),
        "D" => Some("Denied"),
        _ => None,
    }
}

/// US state and territory postal codes
const STATE_CODES: [&str; 56] = [
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "FL", "GA", "HI", "ID", "IL", "IN", "IA",
    "KS", "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH", "NJ",
    "NM", "NY", "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VT",
    "VA", "WA", "WV", "WI", "WY", "DC", "PR", "VI", "GU", "AS", "MP",
];

/// True when `code` is a recognized US state or territory postal code
pub fn is_state(code: &str) -> bool {
    STATE_CODES.contains(&code)
}

/// Payer preset: symbolic key to identifiers for a known payer route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayerPreset {
    pub key: &'static str,
    pub payer_id: &'static str,
    pub payer_name: &'static str,
    pub interchange_receiver_id: &'static str,
    pub interchange_qualifier: &'static str,
}

const PAYER_PRESETS: [PayerPreset; 3] = [
    PayerPreset {
        key: "UHC_CS",
        payer_id: "87726",
        payer_name: "UNITED HEALTHCARE COMMUNITY & STATE",
        interchange_receiver_id: "87726",
        interchange_qualifier: "ZZ",
    },
    PayerPreset {
        key: "UHC_KY",
        payer_id: "87726",
        payer_name: "UNITED HEALTHCARE KENTUCKY",
        interchange_receiver_id: "87726",
        interchange_qualifier: "ZZ",
    },
    PayerPreset {
        key: "AVAILITY",
        payer_id: "030240928",
        payer_name: "AVAILITY",
        interchange_receiver_id: "030240928",
        interchange_qualifier: "01",
    },
];

/// Looks up a payer preset by its symbolic key
pub fn payer_preset(key: &str) -> Option<&'static PayerPreset> {
    PAYER_PRESETS.iter().find(|p| p.key == key)
}

/// All known payer presets
pub fn payer_presets() -> &'static [PayerPreset] {
    &PAYER_PRESETS
}
