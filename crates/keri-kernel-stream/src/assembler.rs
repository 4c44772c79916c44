//! Message assembly.
//!
//! Groups the frames of a stream into messages: each payload collects the
//! primitives that follow it, keyed by the most recent counter code, until
//! the next payload or the end of the stream.

use futures::stream::{self, Stream};
use tracing::{debug, warn};

use keri_kernel_core::Message;

use crate::error::{ParseError, Result};
use crate::parser::{Frame, ParserConfig, StreamParser};
use crate::source::ChunkSource;

/// Assembles messages from a frame parser.
pub struct MessageAssembler<S> {
    parser: StreamParser<S>,
    pending: Option<Message>,
    group: Option<&'static str>,
    /// Set after the end of the stream or the first error.
    done: bool,
}

impl<S: ChunkSource> MessageAssembler<S> {
    pub fn new(parser: StreamParser<S>) -> Self {
        Self {
            parser,
            pending: None,
            group: None,
            done: false,
        }
    }

    /// Read the next complete message.
    ///
    /// Returns `Ok(None)` at the end of the stream. After an error the
    /// assembler yields nothing further.
    pub async fn next_message(&mut self) -> Result<Option<Message>> {
        if self.done {
            return Ok(None);
        }
        let result = self.advance().await;
        if !matches!(result, Ok(Some(_))) {
            self.done = true;
        }
        result
    }

    async fn advance(&mut self) -> Result<Option<Message>> {
        loop {
            match self.parser.next_frame().await? {
                Some(Frame::Payload { version, raw }) => {
                    let message = Message::from_raw(version, raw)
                        .map_err(|e| ParseError::InvalidPayload(e.to_string()))?;
                    debug!(
                        ilk = message.payload.ilk_str(),
                        said = message.payload.said(),
                        "payload"
                    );
                    self.group = None;
                    if let Some(complete) = self.pending.replace(message) {
                        return Ok(Some(complete));
                    }
                }
                Some(Frame::Counter(frame)) => {
                    self.group = Some(frame.code);
                }
                Some(Frame::Primitive { text, .. }) => match (self.pending.as_mut(), self.group) {
                    (Some(message), Some(group)) => message.attach(group, text),
                    (None, _) => warn!(primitive = %text, "dropping attachment with no payload"),
                    (Some(_), None) => warn!(primitive = %text, "dropping attachment with no group"),
                },
                None => return Ok(self.pending.take()),
            }
        }
    }

    /// Collect every remaining message.
    pub async fn collect(mut self) -> Result<Vec<Message>> {
        let mut messages = Vec::new();
        while let Some(message) = self.next_message().await? {
            messages.push(message);
        }
        Ok(messages)
    }

    /// Consume the assembler as a stream of messages.
    pub fn into_stream(self) -> impl Stream<Item = Result<Message>> {
        stream::unfold(self, |mut assembler| async move {
            match assembler.next_message().await {
                Ok(Some(message)) => Some((Ok(message), assembler)),
                Ok(None) => None,
                Err(e) => Some((Err(e), assembler)),
            }
        })
    }
}

/// Assemble messages from a chunk source with default limits.
pub fn parse<S: ChunkSource>(source: S) -> MessageAssembler<S> {
    MessageAssembler::new(StreamParser::new(source))
}

/// Assemble messages from a chunk source with the given limits.
pub fn parse_with_config<S: ChunkSource>(source: S, config: ParserConfig) -> MessageAssembler<S> {
    MessageAssembler::new(StreamParser::with_config(source, config))
}
