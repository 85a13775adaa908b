//! 837P interchange assembly
//!
//! [`InterchangeWriter`] drives the segment writer and control numbers
//! through a full interchange: `open` emits ISA/GS, `write_claim` emits
//! one ST..SE transaction per enriched, validated claim, and `close`
//! emits GE/IEA and returns the bytes. Claim and service loop emission
//! live in the [`claim_loop`] and [`service_loop`] submodules.
//!
//! The writer is a last line of defense: a claim that reaches it
//! without a field the data model marks mandatory raises
//! [`WriterError::MissingField`] instead of emitting a broken segment.

pub mod claim_loop;
pub mod service_loop;

use crate::codes;
use crate::config::BuildConfig;
use crate::domain::{ClaimRecord, KaizenError, Receiver, Result, WriterError};
use crate::x12::{fmt_date8, ControlNumbers, Delimiters, SegmentWriter};
use chrono::NaiveDateTime;

/// Assembles one interchange from one or more claims
pub struct InterchangeWriter<'a> {
    cfg: &'a BuildConfig,
    w: SegmentWriter,
    cn: ControlNumbers,
    stamp: NaiveDateTime,
    isa_control: Option<u32>,
    gs_control: Option<u32>,
    transaction_count: usize,
}

impl<'a> InterchangeWriter<'a> {
    /// Creates a writer for the given configuration
    ///
    /// # Errors
    ///
    /// Returns [`KaizenError::Configuration`] when the configuration
    /// fails validation.
    pub fn new(cfg: &'a BuildConfig) -> Result<Self> {
        cfg.validate().map_err(KaizenError::Configuration)?;
        let (element, segment, component, repetition) = cfg.delimiter_chars();
        let delims = Delimiters {
            element,
            segment,
            component,
            repetition,
        };
        let stamp = cfg
            .timestamp
            .unwrap_or_else(|| chrono::Local::now().naive_local());
        Ok(Self {
            cfg,
            w: SegmentWriter::new(delims, cfg.pretty),
            cn: ControlNumbers::new(
                cfg.isa_control_start,
                cfg.gs_control_start,
                cfg.st_control_start,
            ),
            stamp,
            isa_control: None,
            gs_control: None,
            transaction_count: 0,
        })
    }

    /// Emits the ISA and GS envelope headers
    pub fn open(&mut self) -> Result<()> {
        let isa_control = self.cn.next_isa();
        self.w.build_isa(
            &self.cfg.interchange_sender_qual,
            &self.cfg.interchange_sender_id,
            &self.cfg.interchange_receiver_qual,
            &self.cfg.interchange_receiver_id,
            self.cfg.usage_indicator.as_x12(),
            isa_control,
            self.stamp,
        );
        self.isa_control = Some(isa_control);

        let gs_control = self.cn.next_gs();
        self.w.build_gs(
            &self.cfg.gs_sender_code,
            &self.cfg.gs_receiver_code,
            gs_control,
            self.stamp,
        )?;
        self.gs_control = Some(gs_control);
        Ok(())
    }

    /// Number of ST/SE pairs written so far
    pub fn transaction_count(&self) -> usize {
        self.transaction_count
    }

    /// Writes one claim as a complete ST..SE transaction set
    ///
    /// On failure every segment of the partial transaction is rolled
    /// back, leaving the envelope intact for subsequent claims.
    pub fn write_claim(&mut self, record: &ClaimRecord) -> Result<()> {
        let checkpoint = self.w.segment_count();
        let saved_cn = self.cn.clone();
        match self.write_claim_inner(record) {
            Ok(()) => {
                self.transaction_count += 1;
                Ok(())
            }
            Err(e) => {
                self.w.truncate(checkpoint);
                self.cn = saved_cn;
                Err(e)
            }
        }
    }

    fn write_claim_inner(&mut self, record: &ClaimRecord) -> Result<()> {
        let receiver = resolve_receiver(record, self.cfg);
        let w = &mut self.w;

        let st_control = self.cn.next_st();
        w.build_st(st_control)?;

        let clm_number = require(&record.claim.clm_number, "claim.clm_number")?;
        let bht_ref: String = clm_number.chars().take(30).collect();
        w.segment(
            "BHT",
            &[
                "0019",
                "00",
                &bht_ref,
                &self.stamp.format("%Y%m%d").to_string(),
                &self.stamp.format("%H%M").to_string(),
                "CH",
            ],
        )?;

        // Loop 1000A: submitter
        let submitter = &record.submitter;
        w.segment(
            "NM1",
            &[
                "41",
                "2",
                require(&submitter.name, "submitter.name")?,
                "",
                "",
                "",
                "",
                "46",
                require(&submitter.id, "submitter.id")?,
            ],
        )?;
        if submitter.contact_name.is_some() || submitter.contact_phone.is_some() {
            w.segment(
                "PER",
                &[
                    "IC",
                    submitter.contact_name.as_deref().unwrap_or(""),
                    "TE",
                    submitter.contact_phone.as_deref().unwrap_or(""),
                ],
            )?;
        }

        // Loop 1000B: receiver
        w.segment(
            "NM1",
            &[
                "40",
                "2",
                require(&receiver.payer_name, "receiver.payer_name")?,
                "",
                "",
                "",
                "",
                "46",
                self.cfg.interchange_receiver_id.trim(),
            ],
        )?;

        // Loop 2000A: billing provider hierarchy
        w.segment("HL", &["1", "", "20", "1"])?;
        let billing = &record.billing_provider;
        if let Some(taxonomy) = &billing.taxonomy {
            w.segment("PRV", &["BI", "PXC", taxonomy])?;
        }
        w.segment(
            "NM1",
            &[
                "85",
                "2",
                require(&billing.name, "billing_provider.name")?,
                "",
                "",
                "",
                "",
                "XX",
                require(&billing.npi, "billing_provider.npi")?,
            ],
        )?;
        let billing_addr = billing
            .address
            .as_ref()
            .ok_or_else(|| WriterError::missing("billing_provider.address"))?;
        w.segment(
            "N3",
            &[
                require(&billing_addr.line1, "billing_provider.address.line1")?,
                billing_addr.line2.as_deref().unwrap_or(""),
            ],
        )?;
        w.segment(
            "N4",
            &[&billing_addr.city, &billing_addr.state, &billing_addr.zip],
        )?;
        if let Some(tax_id) = &billing.tax_id {
            w.segment("REF", &["EI", tax_id])?;
        }

        // Loop 2000B: subscriber hierarchy
        w.segment("HL", &["2", "1", "22", "0"])?;
        let subscriber = &record.subscriber;
        let relationship = match subscriber.relationship.as_deref() {
            None | Some("self") => "18",
            Some(_) => "01",
        };
        w.segment(
            "SBR",
            &["P", relationship, "", "", "", "", "", "", "MC"],
        )?;

        // Loop 2010BA
        w.segment(
            "NM1",
            &[
                "IL",
                "1",
                require(&subscriber.name.last, "subscriber.name.last")?,
                &subscriber.name.first,
                "",
                "",
                "",
                "MI",
                require(&subscriber.member_id, "subscriber.member_id")?,
            ],
        )?;
        if let Some(addr) = &subscriber.address {
            w.segment("N3", &[&addr.line1, addr.line2.as_deref().unwrap_or("")])?;
            w.segment("N4", &[&addr.city, &addr.state, &addr.zip])?;
        }
        if subscriber.dob.is_some() || subscriber.sex.is_some() {
            let dob8 = subscriber
                .dob
                .as_deref()
                .map(fmt_date8)
                .unwrap_or_default();
            w.segment(
                "DMG",
                &["D8", &dob8, subscriber.sex.as_deref().unwrap_or("")],
            )?;
        }

        // Loop 2010BB
        w.segment(
            "NM1",
            &[
                "PR",
                "2",
                &receiver.payer_name,
                "",
                "",
                "",
                "",
                "PI",
                require(&receiver.payer_id, "receiver.payer_id")?,
            ],
        )?;

        // Loop 2300 and everything below it
        claim_loop::emit(w, record, &receiver, self.cfg.use_cr1_locations)?;

        w.build_se(st_control)?;
        tracing::debug!(
            clm_number = %record.claim.clm_number,
            st_control,
            "Transaction set written"
        );
        Ok(())
    }

    /// Emits GE/IEA and returns the interchange bytes
    ///
    /// # Errors
    ///
    /// [`WriterError::UnbalancedTransaction`] when `open` was never
    /// called or no transaction was written.
    pub fn close(mut self) -> Result<Vec<u8>> {
        let gs_control = self.gs_control.ok_or_else(|| {
            WriterError::UnbalancedTransaction("close called before open".to_string())
        })?;
        let isa_control = self.isa_control.ok_or_else(|| {
            WriterError::UnbalancedTransaction("close called before open".to_string())
        })?;
        if self.transaction_count == 0 {
            return Err(WriterError::UnbalancedTransaction(
                "interchange contains no transaction sets".to_string(),
            )
            .into());
        }
        self.w.build_ge(self.transaction_count, gs_control)?;
        self.w.build_iea(1, isa_control)?;

        tracing::info!(
            transactions = self.transaction_count,
            segments = self.w.segment_count(),
            "Interchange closed"
        );
        Ok(self.w.into_bytes())
    }
}

/// Applies the configured payer preset over the claim's receiver
pub fn resolve_receiver(record: &ClaimRecord, cfg: &BuildConfig) -> Receiver {
    if let Some(key) = cfg.payer_preset.as_deref() {
        if let Some(preset) = codes::payer_preset(key) {
            return Receiver {
                payer_name: preset.payer_name.to_string(),
                payer_id: preset.payer_id.to_string(),
            };
        }
    }
    record.receiver.clone()
}

/// Rejects an empty mandatory value with [`WriterError::MissingField`]
fn require<'v>(value: &'v str, field: &str) -> std::result::Result<&'v str, WriterError> {
    if value.is_empty() {
        Err(WriterError::missing(field))
    } else {
        Ok(value)
    }
}

/// Nine-digit trip number wire form
pub(crate) fn trip9(trip_number: u64) -> String {
    format!("{trip_number:09}")
}
