//! Low-level X12 segment emission
//!
//! [`SegmentWriter`] owns delimiter policy, trailing-element trimming,
//! segment termination, and the live segment counter used for SE totals.
//! [`ControlNumbers`] carries the ISA/GS/ST counters, advanced
//! monotonically within one interchange and owned exclusively by the
//! interchange emitter.

use crate::domain::WriterError;
use chrono::NaiveDateTime;

/// X12 implementation guide version emitted in GS08 and ST03
pub const IMPLEMENTATION_GUIDE: &str = "005010X222A1";

/// ISA12 interchange control version
pub const INTERCHANGE_VERSION: &str = "00501";

/// Delimiter set for one interchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delimiters {
    /// Element separator (default `*`)
    pub element: char,
    /// Segment terminator (default `~`)
    pub segment: char,
    /// Component separator (default `:`)
    pub component: char,
    /// Repetition separator (default `^`)
    pub repetition: char,
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            element: '*',
            segment: '~',
            component: ':',
            repetition: '^',
        }
    }
}

/// Interchange control number state
///
/// Post-increment accessors: `next_*` returns the current value and
/// advances the counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlNumbers {
    isa: u32,
    gs: u32,
    st: u32,
}

impl ControlNumbers {
    /// Creates control number state with the given starting values
    pub fn new(isa: u32, gs: u32, st: u32) -> Self {
        Self { isa, gs, st }
    }

    /// Returns the current ISA control number and advances it
    pub fn next_isa(&mut self) -> u32 {
        let v = self.isa;
        self.isa += 1;
        v
    }

    /// Returns the current GS control number and advances it
    pub fn next_gs(&mut self) -> u32 {
        let v = self.gs;
        self.gs += 1;
        v
    }

    /// Returns the current ST control number and advances it
    pub fn next_st(&mut self) -> u32 {
        let v = self.st;
        self.st += 1;
        v
    }
}

impl Default for ControlNumbers {
    fn default() -> Self {
        Self::new(1, 1, 1)
    }
}

/// Segment-level X12 writer
///
/// Emits segments as strings with the configured delimiters. Trailing
/// empty elements are trimmed; elements containing a reserved separator
/// are rejected with [`WriterError::ReservedCharacter`]. The component
/// separator is legal element content because composites (CLM05, SV101)
/// are passed as ordinary elements.
#[derive(Debug)]
pub struct SegmentWriter {
    delims: Delimiters,
    pretty: bool,
    segments: Vec<String>,
    st_mark: Option<usize>,
}

impl SegmentWriter {
    /// Creates a writer with the given delimiters
    pub fn new(delims: Delimiters, pretty: bool) -> Self {
        Self {
            delims,
            pretty,
            segments: Vec::new(),
            st_mark: None,
        }
    }

    /// The active delimiter set
    pub fn delimiters(&self) -> Delimiters {
        self.delims
    }

    /// Total segments emitted so far
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    fn check_element(&self, element: &str) -> Result<(), WriterError> {
        for sep in [
            self.delims.element,
            self.delims.segment,
            self.delims.repetition,
        ] {
            if element.contains(sep) {
                return Err(WriterError::ReservedCharacter {
                    element: element.to_string(),
                    separator: sep,
                });
            }
        }
        Ok(())
    }

    /// Emits one segment, trimming trailing empty elements
    ///
    /// # Errors
    ///
    /// [`WriterError::EmptySegment`] when every element is empty;
    /// [`WriterError::ReservedCharacter`] when an element contains a
    /// reserved separator.
    pub fn segment(&mut self, tag: &str, elements: &[&str]) -> Result<(), WriterError> {
        let mut last = 0;
        for (i, element) in elements.iter().enumerate() {
            self.check_element(element)?;
            if !element.is_empty() {
                last = i + 1;
            }
        }
        if last == 0 {
            return Err(WriterError::EmptySegment {
                tag: tag.to_string(),
            });
        }

        let sep = self.delims.element;
        let mut out = String::from(tag);
        for element in &elements[..last] {
            out.push(sep);
            out.push_str(element);
        }
        out.push(self.delims.segment);
        self.segments.push(out);
        Ok(())
    }

    /// Joins composite components, dropping trailing empties
    pub fn composite(&self, components: &[&str]) -> String {
        let last = components
            .iter()
            .rposition(|c| !c.is_empty())
            .map(|i| i + 1)
            .unwrap_or(0);
        components[..last].join(&self.delims.component.to_string())
    }

    /// Pushes a pre-formed segment verbatim (fixed-width ISA)
    fn raw(&mut self, segment: String) {
        self.segments.push(segment);
    }

    /// Emits the fixed-width ISA interchange header
    pub fn build_isa(
        &mut self,
        sender_qual: &str,
        sender_id: &str,
        receiver_qual: &str,
        receiver_id: &str,
        usage_indicator: &str,
        control_number: u32,
        stamp: NaiveDateTime,
    ) {
        let sep = self.delims.element;
        let elements = [
            "00".to_string(),
            pad(" ", 10),
            "00".to_string(),
            pad(" ", 10),
            pad_to(sender_qual, 2),
            pad_to(sender_id, 15),
            pad_to(receiver_qual, 2),
            pad_to(receiver_id, 15),
            stamp.format("%y%m%d").to_string(),
            stamp.format("%H%M").to_string(),
            self.delims.repetition.to_string(),
            pad_to(INTERCHANGE_VERSION, 5),
            format!("{control_number:09}"),
            "0".to_string(),
            pad_to(usage_indicator, 1),
            self.delims.component.to_string(),
        ];
        let mut out = String::from("ISA");
        for element in elements {
            out.push(sep);
            out.push_str(&element);
        }
        out.push(self.delims.segment);
        self.raw(out);
    }

    /// Emits the IEA interchange trailer
    pub fn build_iea(&mut self, group_count: usize, control_number: u32) -> Result<(), WriterError> {
        self.segment(
            "IEA",
            &[&group_count.to_string(), &format!("{control_number:09}")],
        )
    }

    /// Emits the GS functional group header
    pub fn build_gs(
        &mut self,
        sender_code: &str,
        receiver_code: &str,
        control_number: u32,
        stamp: NaiveDateTime,
    ) -> Result<(), WriterError> {
        self.segment(
            "GS",
            &[
                "HC",
                sender_code,
                receiver_code,
                &stamp.format("%Y%m%d").to_string(),
                &stamp.format("%H%M").to_string(),
                &control_number.to_string(),
                "X",
                IMPLEMENTATION_GUIDE,
            ],
        )
    }

    /// Emits the GE functional group trailer
    pub fn build_ge(
        &mut self,
        transaction_count: usize,
        control_number: u32,
    ) -> Result<(), WriterError> {
        self.segment(
            "GE",
            &[&transaction_count.to_string(), &control_number.to_string()],
        )
    }

    /// Emits the ST transaction set header and marks the SE count origin
    pub fn build_st(&mut self, control_number: u32) -> Result<(), WriterError> {
        self.st_mark = Some(self.segments.len());
        self.segment(
            "ST",
            &["837", &control_number.to_string(), IMPLEMENTATION_GUIDE],
        )
    }

    /// Emits the SE trailer with the ST..SE inclusive segment count
    ///
    /// # Errors
    ///
    /// [`WriterError::UnbalancedTransaction`] when no ST is open.
    pub fn build_se(&mut self, control_number: u32) -> Result<(), WriterError> {
        let mark = self.st_mark.take().ok_or_else(|| {
            WriterError::UnbalancedTransaction("SE emitted without a matching ST".to_string())
        })?;
        let count = self.segments.len() - mark + 1;
        self.segment("SE", &[&count.to_string(), &control_number.to_string()])
    }

    /// Segments emitted since the open ST, inclusive
    pub fn open_transaction_len(&self) -> Option<usize> {
        self.st_mark.map(|mark| self.segments.len() - mark)
    }

    /// Discards segments emitted after `len`, abandoning any open ST
    ///
    /// Used by the batch processor to roll back a claim whose emission
    /// failed part-way without poisoning the shared envelope.
    pub fn truncate(&mut self, len: usize) {
        self.segments.truncate(len);
        if let Some(mark) = self.st_mark {
            if mark >= len {
                self.st_mark = None;
            }
        }
    }

    /// Consumes the writer and returns the interchange bytes
    pub fn into_bytes(self) -> Vec<u8> {
        let joiner = if self.pretty { "\n" } else { "" };
        let mut out = self.segments.join(joiner);
        if self.pretty && !out.is_empty() {
            out.push('\n');
        }
        out.into_bytes()
    }
}

fn pad(fill: &str, len: usize) -> String {
    fill.repeat(len)
}

fn pad_to(value: &str, len: usize) -> String {
    let mut s: String = value.chars().take(len).collect();
    while s.chars().count() < len {
        s.push(' ');
    }
    s
}

/// Formats a monetary amount as fixed-point with two decimals
pub fn fmt_amount(amount: f64) -> String {
    format!("{amount:.2}")
}

/// Formats a unit quantity without a trailing `.0`
pub fn fmt_units(units: f64) -> String {
    if (units - units.trunc()).abs() < 1e-9 {
        format!("{}", units.trunc() as i64)
    } else {
        let mut s = format!("{units}");
        if let Some(stripped) = s.strip_suffix(".0") {
            s = stripped.to_string();
        }
        s
    }
}

/// Converts a yyyy-mm-dd date to the D8 wire form (ccyymmdd)
pub fn fmt_date8(iso: &str) -> String {
    iso.replace('-', "")
}

/// Converts an HH:MM or HHMM time to the 4-digit wire form
pub fn fmt_hhmm(time: &str) -> String {
    let digits: String = time.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.chars().take(4).collect()
}
