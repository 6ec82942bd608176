//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::Once;

use ai_lib_unify::types::Chunk;
use ai_lib_unify::Error;
use futures::Stream;

static INIT: Once = Once::new();

/// Install a test-writer subscriber once; `RUST_LOG` selects what is shown.
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A successful stream over `chunks`.
pub fn source(chunks: Vec<Chunk>) -> impl Stream<Item = Result<Chunk, Error>> {
    futures::stream::iter(chunks.into_iter().map(Ok))
}

/// Split `text` into chunks of `size` characters.
pub fn rechunk(text: &str, size: usize) -> Vec<Chunk> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(size.max(1))
        .map(|c| Chunk::Text(c.iter().collect()))
        .collect()
}
