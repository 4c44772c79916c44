//! Attachment serialization.
//!
//! Attachments follow a payload as counter-prefixed groups of primitives.
//! [`AttachmentsBuilder`] writes the groups a controller or witness emits,
//! optionally wrapped in an attachment-group counter that announces the total
//! length in quadlets.

use chrono::{DateTime, FixedOffset, TimeZone};

use crate::b64::{b64_to_int, int_to_b64};
use crate::codec::{encode_counter, Result};
use crate::codes::{counter, matter};
use crate::date::encode_date;
use crate::error::CodecError;

/// Soft size of a sequence-number primitive.
const SEQNER_WIDTH: usize = 22;

/// Encode a sequence number as a `0A` primitive.
pub fn encode_seqner(sn: u64) -> String {
    // a u64 always fits 22 base64 digits
    let soft = int_to_b64(sn, SEQNER_WIDTH).unwrap_or_default();
    format!("{}{soft}", matter::SALT_128)
}

/// Decode a `0A` sequence-number primitive.
pub fn decode_seqner(text: &str) -> Result<u64> {
    let body = text
        .strip_prefix(matter::SALT_128)
        .ok_or_else(|| CodecError::UnknownCode(text.chars().take(2).collect()))?;
    if body.len() != SEQNER_WIDTH {
        return Err(CodecError::invalid_size(
            matter::SALT_128,
            format!("expected {SEQNER_WIDTH} characters, got {}", body.len()),
        ));
    }
    b64_to_int(body)
}

/// Number of primitives making up one counted item of a group.
pub fn group_arity(code: &str) -> usize {
    match code {
        counter::NON_TRANS_RECEIPT_COUPLES
        | counter::FIRST_SEEN_REPLAY_COUPLES
        | counter::SEAL_SOURCE_COUPLES => 2,
        counter::SEAL_SOURCE_TRIPLES => 3,
        counter::TRANS_RECEIPT_QUADRUPLES => 4,
        _ => 1,
    }
}

/// Establishment event a set of signatures was made under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSeal {
    pub i: String,
    pub s: u64,
    pub d: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Source {
    Couple { s: u64, d: String },
    Triple(EventSeal),
}

/// Builds the attachment text for one message.
#[derive(Debug, Clone, Default)]
pub struct AttachmentsBuilder {
    sigs: Vec<String>,
    seal: Option<EventSeal>,
    wigs: Vec<String>,
    receipts: Vec<(String, String)>,
    source: Option<Source>,
    first_seen: Vec<(u64, String)>,
    pathed: Vec<(String, AttachmentsBuilder)>,
    grouped: bool,
}

impl AttachmentsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add indexed controller signatures.
    pub fn controller_sigs(mut self, sigs: impl IntoIterator<Item = String>) -> Self {
        self.sigs.extend(sigs);
        self
    }

    /// Mark the controller signatures as made under the given establishment
    /// event, emitting them as a transferable indexed signature group.
    pub fn signer_seal(mut self, seal: EventSeal) -> Self {
        self.seal = Some(seal);
        self
    }

    /// Add indexed witness signatures.
    pub fn witness_sigs(mut self, wigs: impl IntoIterator<Item = String>) -> Self {
        self.wigs.extend(wigs);
        self
    }

    /// Add a non-transferable receipt couple: a witness prefix and its
    /// unindexed signature.
    pub fn receipt(mut self, backer: impl Into<String>, signature: impl Into<String>) -> Self {
        self.receipts.push((backer.into(), signature.into()));
        self
    }

    /// Point at the event anchoring this one by sequence number and digest.
    pub fn source_couple(mut self, s: u64, d: impl Into<String>) -> Self {
        self.source = Some(Source::Couple { s, d: d.into() });
        self
    }

    /// Point at the event anchoring this one in another identifier's log.
    pub fn source_triple(mut self, seal: EventSeal) -> Self {
        self.source = Some(Source::Triple(seal));
        self
    }

    /// Add a first-seen replay couple.
    pub fn first_seen<Tz: TimeZone>(mut self, fn_: u64, dt: &DateTime<Tz>) -> Self {
        self.first_seen.push((fn_, encode_date(dt)));
        self
    }

    /// Nest attachments under a SAD path.
    pub fn pathed(mut self, path: impl Into<String>, nested: AttachmentsBuilder) -> Self {
        self.pathed.push((path.into(), nested));
        self
    }

    /// Wrap the output in an attachment-group counter.
    pub fn grouped(mut self, grouped: bool) -> Self {
        self.grouped = grouped;
        self
    }

    /// Serialize to CESR text.
    pub fn build(&self) -> Result<String> {
        let mut atc = String::new();

        if !self.sigs.is_empty() {
            if let Some(seal) = &self.seal {
                atc.push_str(&encode_counter(counter::TRANS_IDX_SIG_GROUPS, 1)?);
                atc.push_str(&seal.i);
                atc.push_str(&encode_seqner(seal.s));
                atc.push_str(&seal.d);
            }
            push_group(&mut atc, counter::CONTROLLER_IDX_SIGS, self.sigs.iter())?;
        }

        match &self.source {
            Some(Source::Triple(seal)) => {
                atc.push_str(&encode_counter(counter::SEAL_SOURCE_TRIPLES, 1)?);
                atc.push_str(&seal.i);
                atc.push_str(&encode_seqner(seal.s));
                atc.push_str(&seal.d);
            }
            Some(Source::Couple { s, d }) => {
                atc.push_str(&encode_counter(counter::SEAL_SOURCE_COUPLES, 1)?);
                atc.push_str(&encode_seqner(*s));
                atc.push_str(d);
            }
            None => {}
        }

        if !self.receipts.is_empty() {
            atc.push_str(&encode_counter(
                counter::NON_TRANS_RECEIPT_COUPLES,
                self.receipts.len() as u64,
            )?);
            for (backer, sig) in &self.receipts {
                atc.push_str(backer);
                atc.push_str(sig);
            }
        }

        if !self.wigs.is_empty() {
            push_group(&mut atc, counter::WITNESS_IDX_SIGS, self.wigs.iter())?;
        }

        for (path, nested) in &self.pathed {
            let mut material = encode_path(path)?;
            material.push_str(&nested.build()?);
            atc.push_str(&encode_counter(
                counter::PATHED_MATERIAL_GROUP,
                (material.len() / 4) as u64,
            )?);
            atc.push_str(&material);
        }

        if !self.first_seen.is_empty() {
            atc.push_str(&encode_counter(
                counter::FIRST_SEEN_REPLAY_COUPLES,
                self.first_seen.len() as u64,
            )?);
            for (fn_, date) in &self.first_seen {
                atc.push_str(&encode_seqner(*fn_));
                atc.push_str(date);
            }
        }

        if self.grouped && !atc.is_empty() {
            let quadlets = (atc.len() / 4) as u64;
            let wrapper = encode_counter(counter::ATTACHMENT_GROUP, quadlets)
                .or_else(|_| encode_counter(counter::BIG_ATTACHMENT_GROUP, quadlets))?;
            atc.insert_str(0, &wrapper);
        }

        Ok(atc)
    }
}

fn push_group<'a>(
    out: &mut String,
    code: &str,
    items: impl ExactSizeIterator<Item = &'a String>,
) -> Result<()> {
    out.push_str(&encode_counter(code, items.len() as u64)?);
    for item in items {
        out.push_str(item);
    }
    Ok(())
}

/// Encode a SAD path as a base64 string primitive. Paths are `-` separated
/// and must already be valid base64 text.
fn encode_path(path: &str) -> Result<String> {
    let text = path.replace('/', "-");
    if !text.bytes().all(crate::b64::is_b64_char) {
        return Err(CodecError::InvalidBase64(path.to_string()));
    }
    // pad with 'A' to a quadlet boundary; the lead size counts whole zero bytes
    let ts = text.len() % 4;
    let wad = "A".repeat((4 - ts) % 4);
    let code = match (3 - ts % 3) % 3 {
        0 => matter::STR_B64_L0,
        1 => matter::STR_B64_L1,
        _ => matter::STR_B64_L2,
    };
    let body = format!("{wad}{text}");
    let soft = int_to_b64((body.len() / 4) as u64, 2)
        .ok_or_else(|| CodecError::invalid_size(code, "path too long"))?;
    Ok(format!("{code}{soft}{body}"))
}

/// Decode a first-seen couple's date primitive.
pub fn decode_first_seen(seqner: &str, date: &str) -> Result<(u64, DateTime<FixedOffset>)> {
    Ok((decode_seqner(seqner)?, crate::date::decode_date(date)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode_counter;
    use chrono::Utc;

    const SIG: &str = "AADjncC4UZdYY413O2HwAeW8Q0hCe0tgkpNUqBbjgJnvKZ5mG3h2hnYTzwnO896ArtnKNSkIOikWjXy3NUPGFoEB";

    #[test]
    fn test_seqner() {
        assert_eq!(encode_seqner(0), "0AAAAAAAAAAAAAAAAAAAAAAA");
        assert_eq!(encode_seqner(2), "0AAAAAAAAAAAAAAAAAAAAAAC");
        assert_eq!(decode_seqner("0AAAAAAAAAAAAAAAAAAAAAAC").unwrap(), 2);
        assert!(decode_seqner("0AAAA").is_err());
    }

    #[test]
    fn test_seqner_full_range() {
        for sn in [1, 64, 1 << 60, u64::MAX] {
            assert_eq!(decode_seqner(&encode_seqner(sn)).unwrap(), sn);
        }
        assert_eq!(encode_seqner(u64::MAX), "0AAAAAAAAAAAAP__________");
    }

    #[test]
    fn test_controller_sigs() {
        let atc = AttachmentsBuilder::new()
            .controller_sigs([SIG.to_string()])
            .build()
            .unwrap();
        assert_eq!(atc, format!("-AAB{SIG}"));
    }

    #[test]
    fn test_grouped_counts_quadlets() {
        let atc = AttachmentsBuilder::new()
            .controller_sigs([SIG.to_string()])
            .grouped(true)
            .build()
            .unwrap();
        let wrapper = decode_counter(&atc[..4]).unwrap();
        assert_eq!(wrapper.code, counter::ATTACHMENT_GROUP);
        assert_eq!(wrapper.count as usize * 4, atc.len() - 4);
    }

    #[test]
    fn test_empty_grouped_is_empty() {
        assert_eq!(AttachmentsBuilder::new().grouped(true).build().unwrap(), "");
    }

    #[test]
    fn test_transferable_signature_group() {
        let atc = AttachmentsBuilder::new()
            .signer_seal(EventSeal {
                i: "EFAWQA1ktXrt5BFptVJrx6zKT8n6UIqU1XDP0tSB6yUS".into(),
                s: 0,
                d: "EFAWQA1ktXrt5BFptVJrx6zKT8n6UIqU1XDP0tSB6yUS".into(),
            })
            .controller_sigs([SIG.to_string()])
            .build()
            .unwrap();
        assert!(atc.starts_with("-FAB"));
        assert!(atc.contains(&format!("-AAB{SIG}")));
        assert_eq!(atc.len() % 4, 0);
    }

    #[test]
    fn test_receipts_and_first_seen() {
        let dt = DateTime::parse_from_rfc3339("2024-01-01T00:00:00+00:00")
            .unwrap()
            .with_timezone(&Utc);
        let atc = AttachmentsBuilder::new()
            .receipt(
                "BKN0Oz4YvfPgHUB79WKtIg8xeu4Y0P8lmJn_zCWksR9w",
                "0BDjncC4UZdYY413O2HwAeW8Q0hCe0tgkpNUqBbjgJnvKZ5mG3h2hnYTzwnO896ArtnKNSkIOikWjXy3NUPGFoEB",
            )
            .first_seen(3, &dt)
            .build()
            .unwrap();
        assert!(atc.starts_with("-CAB"));
        let fs_at = atc.find("-EAB").unwrap();
        let seqner = &atc[fs_at + 4..fs_at + 28];
        let date = &atc[fs_at + 28..fs_at + 64];
        let (sn, when) = decode_first_seen(seqner, date).unwrap();
        assert_eq!(sn, 3);
        assert_eq!(when, dt);
    }

    #[test]
    fn test_source_couple() {
        let atc = AttachmentsBuilder::new()
            .source_couple(1, "EMm03oUVeQLMFxyQHx90rYeCI0t2X2vNujpt7Os2jzWI")
            .build()
            .unwrap();
        assert_eq!(
            atc,
            "-GAB0AAAAAAAAAAAAAAAAAAAAAABEMm03oUVeQLMFxyQHx90rYeCI0t2X2vNujpt7Os2jzWI"
        );
    }

    #[test]
    fn test_pathed_material() {
        let nested = AttachmentsBuilder::new().controller_sigs([SIG.to_string()]);
        let atc = AttachmentsBuilder::new()
            .pathed("-a", nested)
            .build()
            .unwrap();
        let group = decode_counter(&atc[..4]).unwrap();
        assert_eq!(group.code, counter::PATHED_MATERIAL_GROUP);
        assert_eq!(group.count as usize * 4, atc.len() - 4);
        assert!(atc[4..].starts_with("5AABAA-a"));
    }

    #[test]
    fn test_group_arity() {
        assert_eq!(group_arity(counter::CONTROLLER_IDX_SIGS), 1);
        assert_eq!(group_arity(counter::NON_TRANS_RECEIPT_COUPLES), 2);
        assert_eq!(group_arity(counter::TRANS_RECEIPT_QUADRUPLES), 4);
    }
}
