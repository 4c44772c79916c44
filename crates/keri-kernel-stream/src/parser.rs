//! The frame parser.
//!
//! [`StreamParser`] recovers frame boundaries from an arbitrarily chunked
//! byte stream. A frame is either a versioned payload (JSON or CBOR) or one
//! self-framing primitive: a counter, an indexed signature, or a plain
//! matter primitive.
//!
//! ## State machine
//!
//! ```text
//!            '{' / CBOR map            version.size bytes buffered
//! AwaitFrame ----------------> ReadPayload ------------------------> AwaitFrame
//!     |
//!     | code matched in <= 4 chars      full size buffered
//!     +----------------------------> ReadPrimitive -----------------> AwaitFrame
//! ```
//!
//! Each state names how many buffered bytes it needs. When the buffer is
//! short the parser pulls one more chunk and retries, so the parser's state
//! and buffer survive a cancelled `next_frame` call intact.
//!
//! ## Code matching
//!
//! After each character the accumulated prefix is checked against the Counter
//! table, then against the Indexer table if the open counter group expects an
//! indexed signature in its next slot, else against the Matter table.

use bytes::{Bytes, BytesMut};
use tracing::{debug, trace};

use keri_kernel_core::b64::{b64_to_int, is_b64_char};
use keri_kernel_core::codec::{decode_counter, CounterFrame};
use keri_kernel_core::codes::{counter, CodeEntry, Family, COUNTER, INDEXER, MATTER};
use keri_kernel_core::version::{is_cbor_map, sniff, sniff_len, Version};

use crate::error::{ParseError, Result};
use crate::source::{ChunkSource, MemorySource};

/// Parser limits.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Largest payload, in bytes, a version string may announce.
    pub max_payload_size: usize,
    /// Largest variable-size primitive, in characters.
    pub max_primitive_size: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_payload_size: 4 * 1024 * 1024,
            max_primitive_size: 1024 * 1024,
        }
    }
}

/// One frame of the stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// A versioned payload, exactly as framed.
    Payload { version: Version, raw: Bytes },
    /// A group counter. Structural; announces the primitives that follow.
    Counter(CounterFrame),
    /// A primitive in text form.
    Primitive {
        code: &'static str,
        family: Family,
        text: String,
    },
}

#[derive(Debug, Clone)]
enum ParseState {
    AwaitFrame,
    ReadPayload {
        version: Version,
    },
    ReadPrimitive {
        entry: &'static CodeEntry,
        family: Family,
        size: usize,
    },
}

enum Step {
    Frame(Frame),
    /// The buffer must hold at least this many bytes to progress.
    Need(usize),
}

/// An open counter group whose slots are not all plain primitives.
#[derive(Debug, Clone)]
struct GroupContext {
    code: &'static str,
    layout: &'static [Family],
    /// Primitives still expected in the group.
    remaining: u64,
    /// Primitives read so far.
    position: usize,
}

impl GroupContext {
    fn slot(&self) -> Family {
        self.layout[self.position % self.layout.len()]
    }
}

const INDEXED: &[Family] = &[Family::Indexer];
const TRANS_RECEIPT: &[Family] = &[Family::Matter, Family::Matter, Family::Matter, Family::Indexer];

/// Slot layout of one counted item, for groups that carry indexed signatures.
fn group_layout(code: &str) -> Option<&'static [Family]> {
    match code {
        counter::CONTROLLER_IDX_SIGS | counter::WITNESS_IDX_SIGS => Some(INDEXED),
        counter::TRANS_RECEIPT_QUADRUPLES => Some(TRANS_RECEIPT),
        _ => None,
    }
}

/// Whether a counter only wraps other groups.
fn is_wrapper(code: &str) -> bool {
    matches!(
        code,
        counter::ATTACHMENT_GROUP | counter::BIG_ATTACHMENT_GROUP
    )
}

/// Incremental frame parser over a chunk source.
pub struct StreamParser<S> {
    source: S,
    config: ParserConfig,
    buffer: BytesMut,
    state: ParseState,
    group: Option<GroupContext>,
    /// Bytes consumed into frames so far.
    offset: u64,
    exhausted: bool,
}

impl<S> StreamParser<S> {
    pub fn new(source: S) -> Self {
        Self::with_config(source, ParserConfig::default())
    }

    pub fn with_config(source: S, config: ParserConfig) -> Self {
        Self {
            source,
            config,
            buffer: BytesMut::new(),
            state: ParseState::AwaitFrame,
            group: None,
            offset: 0,
            exhausted: false,
        }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Bytes consumed into complete frames.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Bytes buffered but not yet framed.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Append bytes directly, bypassing the source.
    pub fn feed(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Parse one frame from buffered bytes only.
    ///
    /// Returns `Ok(None)` when more bytes are needed.
    pub fn try_frame(&mut self) -> Result<Option<Frame>> {
        match self.step()? {
            Step::Frame(frame) => Ok(Some(frame)),
            Step::Need(_) => Ok(None),
        }
    }

    /// Whether the parser sits on a frame boundary with nothing buffered.
    pub fn is_idle(&self) -> bool {
        self.buffer.is_empty() && matches!(self.state, ParseState::AwaitFrame)
    }

    fn step(&mut self) -> Result<Step> {
        loop {
            match &self.state {
                ParseState::AwaitFrame => {
                    let Some(&first) = self.buffer.first() else {
                        return Ok(Step::Need(1));
                    };
                    let next = if first == b'{' || is_cbor_map(first) {
                        self.start_payload(first)?
                    } else if is_b64_char(first) {
                        self.match_code()?
                    } else {
                        return Err(ParseError::UnexpectedStartByte(first));
                    };
                    match next {
                        Ok(state) => self.state = state,
                        Err(needed) => return Ok(Step::Need(needed)),
                    }
                }
                ParseState::ReadPayload { version } => {
                    let size = version.size;
                    if self.buffer.len() < size {
                        return Ok(Step::Need(size));
                    }
                    let version = version.clone();
                    let raw = self.buffer.split_to(size).freeze();
                    self.finish(size);
                    // a new payload closes any open group
                    self.group = None;
                    trace!(size, kind = %version.kind, "payload frame");
                    return Ok(Step::Frame(Frame::Payload { version, raw }));
                }
                ParseState::ReadPrimitive {
                    entry,
                    family,
                    size,
                } => {
                    let (entry, family, size) = (*entry, *family, *size);
                    if self.buffer.len() < size {
                        return Ok(Step::Need(size));
                    }
                    let bytes = self.buffer.split_to(size);
                    self.finish(size);
                    return self.primitive_frame(entry, family, &bytes).map(Step::Frame);
                }
            }
        }
    }

    /// Read the version string of a payload. `Err(n)` asks for `n` bytes.
    fn start_payload(&self, first: u8) -> Result<std::result::Result<ParseState, usize>> {
        let Some(head) = sniff_len(first) else {
            return Err(ParseError::UnexpectedStartByte(first));
        };
        if self.buffer.len() < head {
            return Ok(Err(head));
        }
        let version =
            sniff(&self.buffer[..head]).map_err(|e| ParseError::InvalidVersion(e.to_string()))?;
        if version.size > self.config.max_payload_size {
            return Err(ParseError::PayloadTooLarge {
                size: version.size,
                max: self.config.max_payload_size,
            });
        }
        if version.size < head {
            return Err(ParseError::InvalidVersion(format!(
                "declared size {} is shorter than the version region",
                version.size
            )));
        }
        Ok(Ok(ParseState::ReadPayload { version }))
    }

    /// Match a code one character at a time. `Err(n)` asks for `n` bytes.
    fn match_code(&self) -> Result<std::result::Result<ParseState, usize>> {
        let indexed_slot = self
            .group
            .as_ref()
            .map(|g| g.remaining > 0 && g.slot() == Family::Indexer)
            .unwrap_or(false);

        for n in 1..=4 {
            if self.buffer.len() < n {
                return Ok(Err(n));
            }
            let prefix = &self.buffer[..n];
            if !prefix.iter().all(|&b| is_b64_char(b)) {
                break;
            }
            // all bytes are base64 characters, so this cannot fail
            let prefix = std::str::from_utf8(prefix).unwrap_or_default();

            let found = if let Some(entry) = COUNTER.get(prefix) {
                Some((entry, Family::Counter))
            } else if indexed_slot {
                INDEXER.get(prefix).map(|e| (e, Family::Indexer))
            } else {
                MATTER.get(prefix).map(|e| (e, Family::Matter))
            };

            if let Some((entry, family)) = found {
                return self.frame_size(entry).map(|size| {
                    size.map(|size| ParseState::ReadPrimitive {
                        entry,
                        family,
                        size,
                    })
                });
            }
        }

        let seen = self.buffer.len().min(4);
        Err(ParseError::UnknownCode(
            String::from_utf8_lossy(&self.buffer[..seen]).into_owned(),
        ))
    }

    /// Full size of a primitive. Variable-size codes read their soft size.
    fn frame_size(&self, entry: &'static CodeEntry) -> Result<std::result::Result<usize, usize>> {
        let sz = entry.sizage;
        if let Some(fs) = sz.fs {
            return Ok(Ok(fs));
        }
        let cs = sz.cs();
        if self.buffer.len() < cs {
            return Ok(Err(cs));
        }
        let soft = std::str::from_utf8(&self.buffer[sz.hs..cs])
            .map_err(|_| ParseError::UnknownCode(entry.code.to_string()))?;
        let quadlets = b64_to_int(soft)?;
        let size = usize::try_from(quadlets)
            .ok()
            .and_then(|q| q.checked_mul(4))
            .and_then(|b| b.checked_add(cs))
            .unwrap_or(usize::MAX);
        if size > self.config.max_primitive_size {
            return Err(ParseError::PrimitiveTooLarge {
                size,
                max: self.config.max_primitive_size,
            });
        }
        Ok(Ok(size))
    }

    fn primitive_frame(
        &mut self,
        entry: &'static CodeEntry,
        family: Family,
        bytes: &[u8],
    ) -> Result<Frame> {
        if !bytes.iter().all(|&b| is_b64_char(b)) {
            return Err(ParseError::Codec(
                keri_kernel_core::CodecError::InvalidBase64(
                    String::from_utf8_lossy(bytes).into_owned(),
                ),
            ));
        }
        let text = String::from_utf8_lossy(bytes).into_owned();

        if family == Family::Counter {
            let frame = decode_counter(&text)?;
            self.open_group(frame);
            return Ok(Frame::Counter(frame));
        }

        if let Some(group) = self.group.as_mut() {
            group.remaining = group.remaining.saturating_sub(1);
            group.position += 1;
            if group.remaining == 0 {
                debug!(code = group.code, "closed counter group");
                self.group = None;
            }
        }
        trace!(code = entry.code, %family, len = text.len(), "primitive frame");
        Ok(Frame::Primitive {
            code: entry.code,
            family,
            text,
        })
    }

    fn open_group(&mut self, frame: CounterFrame) {
        if is_wrapper(frame.code) {
            trace!(code = frame.code, count = frame.count, "attachment group wrapper");
            return;
        }
        self.group = group_layout(frame.code).map(|layout| GroupContext {
            code: frame.code,
            layout,
            remaining: frame.count.saturating_mul(layout.len() as u64),
            position: 0,
        });
        debug!(code = frame.code, count = frame.count, "opened counter group");
    }

    fn finish(&mut self, size: usize) {
        self.state = ParseState::AwaitFrame;
        self.offset += size as u64;
    }
}

impl<S: ChunkSource> StreamParser<S> {
    /// Read the next frame, pulling chunks as needed.
    ///
    /// Returns `Ok(None)` when the source ends on a frame boundary.
    pub async fn next_frame(&mut self) -> Result<Option<Frame>> {
        loop {
            let needed = match self.step()? {
                Step::Frame(frame) => return Ok(Some(frame)),
                Step::Need(needed) => needed,
            };
            if self.exhausted || !self.pull().await? {
                if self.is_idle() {
                    return Ok(None);
                }
                return Err(ParseError::UnexpectedEndOfStream {
                    buffered: self.buffer.len(),
                    needed,
                });
            }
        }
    }

    /// Pull one chunk into the buffer. `false` once the source is done.
    async fn pull(&mut self) -> Result<bool> {
        match self.source.next_chunk().await? {
            Some(chunk) => {
                trace!(len = chunk.len(), "pulled chunk");
                self.buffer.extend_from_slice(&chunk);
                Ok(true)
            }
            None => {
                self.exhausted = true;
                Ok(false)
            }
        }
    }
}

/// Split complete bytes into frames.
pub fn decode_frames(data: &[u8]) -> Result<Vec<Frame>> {
    let mut parser = StreamParser::new(MemorySource::default());
    parser.feed(data);
    let mut frames = Vec::new();
    while let Some(frame) = parser.try_frame()? {
        frames.push(frame);
    }
    if !parser.is_idle() {
        return Err(ParseError::UnexpectedEndOfStream {
            buffered: parser.buffered(),
            needed: match parser.step()? {
                Step::Need(n) => n,
                Step::Frame(_) => 0,
            },
        });
    }
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use keri_kernel_core::codes::{indexer, matter};
    use keri_kernel_core::version::Kind;
    use proptest::prelude::*;

    const ICP: &str = r#"{"v":"KERI10JSON0000fd_","t":"icp","d":"EFAWQA1ktXrt5BFptVJrx6zKT8n6UIqU1XDP0tSB6yUS","i":"BKN0Oz4YvfPgHUB79WKtIg8xeu4Y0P8lmJn_zCWksR9w","s":"0","kt":"1","k":["BKN0Oz4YvfPgHUB79WKtIg8xeu4Y0P8lmJn_zCWksR9w"],"nt":"0","n":[],"bt":"0","b":[],"c":[],"a":[]}"#;
    const SIG: &str = "AADjncC4UZdYY413O2HwAeW8Q0hCe0tgkpNUqBbjgJnvKZ5mG3h2hnYTzwnO896ArtnKNSkIOikWjXy3NUPGFoEB";
    const DIGEST: &str = "EFAWQA1ktXrt5BFptVJrx6zKT8n6UIqU1XDP0tSB6yUS";
    const SEQNER: &str = "0AAAAAAAAAAAAAAAAAAAAAAA";

    fn signed_icp() -> String {
        format!("{ICP}-AAB{SIG}")
    }

    async fn collect(source: MemorySource) -> Result<Vec<Frame>> {
        let mut parser = StreamParser::new(source);
        let mut frames = Vec::new();
        while let Some(frame) = parser.next_frame().await? {
            frames.push(frame);
        }
        Ok(frames)
    }

    #[tokio::test]
    async fn test_payload_counter_and_indexed_signature() {
        let frames = collect(MemorySource::from_bytes(signed_icp())).await.unwrap();
        assert_eq!(frames.len(), 3);

        let Frame::Payload { version, raw } = &frames[0] else {
            panic!("expected payload, got {:?}", frames[0]);
        };
        assert_eq!(version.kind, Kind::Json);
        assert_eq!(raw.as_ref(), ICP.as_bytes());

        assert_eq!(
            frames[1],
            Frame::Counter(CounterFrame {
                code: counter::CONTROLLER_IDX_SIGS,
                count: 1
            })
        );
        assert_eq!(
            frames[2],
            Frame::Primitive {
                code: indexer::ED25519_SIG,
                family: Family::Indexer,
                text: SIG.to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_single_byte_chunks() {
        let whole = collect(MemorySource::from_bytes(signed_icp())).await.unwrap();
        let split = collect(MemorySource::chunked(signed_icp(), 1)).await.unwrap();
        assert_eq!(whole, split);
    }

    #[test]
    fn test_matter_outside_indexed_group() {
        // outside an indexed group, 'A' is a 44-character seed
        let seed = format!("A{}", "A".repeat(43));
        let frames = decode_frames(format!("{ICP}{seed}").as_bytes()).unwrap();
        assert!(matches!(
            &frames[1],
            Frame::Primitive { code, family: Family::Matter, .. } if *code == matter::ED25519_SEED
        ));
    }

    #[test]
    fn test_group_closes_after_count() {
        // after one indexed signature, the next 'A' reads as matter again
        let seed = format!("A{}", "A".repeat(43));
        let frames = decode_frames(format!("{}{seed}", signed_icp()).as_bytes()).unwrap();
        assert_eq!(frames.len(), 4);
        assert!(matches!(
            &frames[3],
            Frame::Primitive { family: Family::Matter, .. }
        ));
    }

    #[test]
    fn test_trans_receipt_quadruple_layout() {
        let stream = format!("{ICP}-DAB{DIGEST}{SEQNER}{DIGEST}{SIG}");
        let frames = decode_frames(stream.as_bytes()).unwrap();
        let families: Vec<_> = frames
            .iter()
            .filter_map(|f| match f {
                Frame::Primitive { family, .. } => Some(*family),
                _ => None,
            })
            .collect();
        assert_eq!(
            families,
            vec![Family::Matter, Family::Matter, Family::Matter, Family::Indexer]
        );
    }

    #[test]
    fn test_attachment_group_wrapper_is_transparent() {
        let stream = format!("{ICP}-VAX-AAB{SIG}");
        let frames = decode_frames(stream.as_bytes()).unwrap();
        assert_eq!(frames.len(), 4);
        assert!(matches!(
            &frames[3],
            Frame::Primitive { family: Family::Indexer, .. }
        ));
    }

    #[test]
    fn test_variable_size_primitive() {
        // "4A" string with a one-quadlet body
        let stream = format!("{ICP}-LAC4AABabcd");
        let frames = decode_frames(stream.as_bytes()).unwrap();
        assert_eq!(
            frames[2],
            Frame::Primitive {
                code: matter::STR_B64_L0,
                family: Family::Matter,
                text: "4AABabcd".into(),
            }
        );
    }

    #[test]
    fn test_variable_size_limit() {
        let mut parser = StreamParser::with_config(
            MemorySource::default(),
            ParserConfig {
                max_primitive_size: 8,
                ..ParserConfig::default()
            },
        );
        parser.feed(b"4AAC");
        assert!(matches!(
            parser.try_frame(),
            Err(ParseError::PrimitiveTooLarge { size: 12, max: 8 })
        ));
    }

    #[test]
    fn test_payload_limit() {
        let mut parser = StreamParser::with_config(
            MemorySource::default(),
            ParserConfig {
                max_payload_size: 16,
                ..ParserConfig::default()
            },
        );
        parser.feed(ICP.as_bytes());
        assert!(matches!(
            parser.try_frame(),
            Err(ParseError::PayloadTooLarge { size: 0xfd, max: 16 })
        ));
    }

    #[tokio::test]
    async fn test_eof_mid_frame() {
        let stream = signed_icp();
        let truncated = stream[..stream.len() - 10].to_string();
        let err = collect(MemorySource::from_bytes(truncated))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ParseError::UnexpectedEndOfStream { buffered: 78, needed: 88 }
        ));
    }

    #[tokio::test]
    async fn test_eof_mid_payload() {
        let err = collect(MemorySource::from_bytes(ICP[..50].to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedEndOfStream { .. }));
    }

    #[tokio::test]
    async fn test_empty_stream() {
        assert!(collect(MemorySource::default()).await.unwrap().is_empty());
    }

    #[test]
    fn test_unknown_code() {
        let err = decode_frames(b"-zzz").unwrap_err();
        assert!(matches!(err, ParseError::UnknownCode(ref c) if c == "-zzz"));
    }

    #[test]
    fn test_unexpected_start_byte() {
        let err = decode_frames(b"\x01abc").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedStartByte(0x01)));
    }

    #[test]
    fn test_invalid_version() {
        let err = decode_frames(br#"{"v":"KERI10XXXX0000fd_","t":"icp"}"#).unwrap_err();
        assert!(matches!(err, ParseError::InvalidVersion(_)));
    }

    #[test]
    fn test_offset_tracks_frames() {
        let mut parser = StreamParser::new(MemorySource::default());
        parser.feed(signed_icp().as_bytes());
        while parser.try_frame().unwrap().is_some() {}
        assert_eq!(parser.offset() as usize, signed_icp().len());
        assert!(parser.is_idle());
    }

    proptest! {
        #[test]
        fn prop_chunk_invariance(cuts in proptest::collection::vec(1usize..64, 1..32)) {
            let stream = format!("{}{}-VAX-AAB{SIG}", signed_icp(), ICP);
            let expected = decode_frames(stream.as_bytes()).unwrap();

            let mut parser = StreamParser::new(MemorySource::default());
            let mut frames = Vec::new();
            let mut rest = stream.as_bytes();
            let mut cuts = cuts.into_iter().cycle();
            while !rest.is_empty() {
                let n = cuts.next().unwrap_or(1).min(rest.len());
                parser.feed(&rest[..n]);
                rest = &rest[n..];
                while let Some(frame) = parser.try_frame().unwrap() {
                    frames.push(frame);
                }
            }
            prop_assert!(parser.is_idle());
            prop_assert_eq!(frames, expected);
        }
    }
}
