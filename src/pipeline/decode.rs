//! Streaming decoders (bytes -> chunks)
//!
//! Splits a raw response body into event payloads by wire framing (SSE or NDJSON) and hands
//! each payload to a vendor event decoder such as [`crate::drivers::openai::decode_event`].

use futures::{stream, Stream, StreamExt};

use crate::classify::ProviderFailure;
use crate::drivers::ChunkStream;
use crate::types::Chunk;

/// Terminal SSE payload sent by OpenAI-compatible vendors.
const DONE_SIGNAL: &str = "[DONE]";

/// Decodes one event payload; `Ok(None)` skips payloads that carry nothing.
pub type EventDecoder = fn(&str) -> Result<Option<Chunk>, ProviderFailure>;

/// How events are delimited on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// Server-sent events: blank-line separated frames of `data:` lines.
    Sse,
    /// One JSON document per line.
    Ndjson,
}

impl Framing {
    fn delimiter(&self) -> &'static [u8] {
        match self {
            Framing::Sse => b"\n\n",
            Framing::Ndjson => b"\n",
        }
    }

    /// The event payload of one frame; `None` for frames carrying no data
    /// (SSE comments, bare `event:` lines, blank lines).
    fn payload(&self, frame: &str) -> Option<String> {
        match self {
            Framing::Ndjson => {
                let line = frame.trim();
                (!line.is_empty()).then(|| line.to_string())
            }
            Framing::Sse => {
                let data: Vec<&str> = frame
                    .lines()
                    .filter_map(|line| line.strip_prefix("data:"))
                    .map(|d| d.strip_prefix(' ').unwrap_or(d))
                    .collect();
                (!data.is_empty()).then(|| data.join("\n"))
            }
        }
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Turn a byte stream into a [`ChunkStream`].
///
/// Bytes are buffered until a full frame is available, so frames and multi-byte characters may
/// be split across reads. The stream ends at the source's end or at a `[DONE]` payload; a
/// trailing frame without delimiter is still decoded. Transport failures and decoder failures
/// are yielded in place.
///
/// An HTTP body plugs in as `response.bytes_stream().map_err(ProviderFailure::from)`.
///
/// ```
/// use ai_lib_unify::classify::ProviderFailure;
/// use ai_lib_unify::drivers::openai;
/// use ai_lib_unify::pipeline::{collect, decode_stream, Framing};
///
/// # tokio_test::block_on(async {
/// let body = futures::stream::iter(vec![Ok::<_, ProviderFailure>(
///     b"data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\ndata: [DONE]\n\n".to_vec(),
/// )]);
/// let completion = collect(decode_stream(body, Framing::Sse, openai::decode_event)).await.unwrap();
/// assert_eq!(completion.text(), "Hi");
/// # });
/// ```
pub fn decode_stream<S, B>(input: S, framing: Framing, decoder: EventDecoder) -> ChunkStream
where
    S: Stream<Item = Result<B, ProviderFailure>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    let input = Box::pin(input);
    let stream = stream::unfold(
        (input, Vec::<u8>::new(), false),
        move |(mut input, mut buf, mut eof)| async move {
            loop {
                let delimiter = framing.delimiter();
                let frame = match find(&buf, delimiter) {
                    Some(idx) => {
                        let frame = String::from_utf8_lossy(&buf[..idx]).into_owned();
                        buf.drain(..idx + delimiter.len());
                        Some(frame)
                    }
                    None if eof => {
                        if buf.iter().all(u8::is_ascii_whitespace) {
                            return None;
                        }
                        let rest = std::mem::take(&mut buf);
                        Some(String::from_utf8_lossy(&rest).into_owned())
                    }
                    None => None,
                };

                if let Some(frame) = frame {
                    let Some(payload) = framing.payload(&frame) else {
                        continue;
                    };
                    if payload.trim() == DONE_SIGNAL {
                        return None;
                    }
                    match decoder(&payload) {
                        Ok(Some(chunk)) => return Some((Ok(chunk), (input, buf, eof))),
                        Ok(None) => continue,
                        Err(failure) => return Some((Err(failure), (input, buf, eof))),
                    }
                }

                match input.next().await {
                    // CR is dropped so CRLF framing splits like LF framing.
                    Some(Ok(bytes)) => buf.extend(bytes.as_ref().iter().filter(|b| **b != b'\r')),
                    Some(Err(failure)) => return Some((Err(failure), (input, buf, eof))),
                    None => eof = true,
                }
            }
        },
    );
    Box::pin(stream)
}
