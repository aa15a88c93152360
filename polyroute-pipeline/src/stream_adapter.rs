use std::pin::Pin;

use async_stream::stream;
use futures::{Stream, StreamExt};
use polyroute_core::{Error, Result, StreamChunk};
use polyroute_model::GenerateStream;

/// Number of consecutive identical non-empty fragments that trips the
/// repetition guard (spec §4.6 "Validation of streaming health").
const REPETITION_THRESHOLD: usize = 3;

fn has_control_character_corruption(text: &str) -> bool {
    text.chars().any(|c| c.is_control() && c != '\n' && c != '\t' && c != '\r')
}

/// Adapts a `Model::stream` sequence into the transport-level `StreamChunk`
/// sequence, running the optional health checks and guaranteeing a
/// `finished: true` terminator on every exit path — completion, abort, or a
/// detected corruption (spec §4.6 step 3).
pub fn adapt_stream(inner: GenerateStream) -> Pin<Box<dyn Stream<Item = Result<StreamChunk>> + Send>> {
    Box::pin(stream! {
        let mut inner = inner;
        let mut total_len = 0usize;
        let mut last_fragment: Option<String> = None;
        let mut repeat_count = 0usize;

        loop {
            match inner.next().await {
                None => {
                    yield Ok(StreamChunk::terminator(total_len));
                    break;
                }
                Some(Err(err)) => {
                    yield Ok(StreamChunk::aborted(err.to_string()));
                    break;
                }
                Some(Ok(fragment)) => {
                    if fragment.text.is_empty() {
                        continue;
                    }
                    if has_control_character_corruption(&fragment.text) {
                        yield Err(Error::CorruptedStream { reason: "control character detected".into() });
                        yield Ok(StreamChunk::aborted("corrupted stream"));
                        break;
                    }
                    match &last_fragment {
                        Some(prev) if prev == &fragment.text => {
                            repeat_count += 1;
                        }
                        _ => {
                            repeat_count = 1;
                        }
                    }
                    last_fragment = Some(fragment.text.clone());
                    if repeat_count >= REPETITION_THRESHOLD {
                        yield Err(Error::CorruptedStream { reason: "repeated fragment detected".into() });
                        yield Ok(StreamChunk::aborted("corrupted stream"));
                        break;
                    }

                    total_len += fragment.text.len();
                    yield Ok(StreamChunk::fragment(fragment.text));
                }
            }
        }
    })
}
