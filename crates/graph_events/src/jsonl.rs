//! Line-delimited JSON chunk sources: one raw item per non-blank line.
//!
//! Both readers yield `Result<Value, ChunkReadError>` so they plug straight
//! into [`crate::StreamParser::parse`] and [`crate::StreamParser::parse_stream`].

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde_json::Value;

use crate::error::ChunkReadError;

/// Parses one line. `Ok(None)` for blank lines.
fn parse_line(line: &str, line_number: usize) -> Result<Option<Value>, ChunkReadError> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    if line.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(line)
        .map(Some)
        .map_err(|source| ChunkReadError::Json {
            line_number,
            source,
        })
}

pub struct ChunkJsonlReader<R: BufRead> {
    reader: R,
    line_number: usize,
    buffer: String,
    done: bool,
}

impl<R: BufRead> ChunkJsonlReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_number: 0,
            buffer: String::new(),
            done: false,
        }
    }

    /// Consumes the iterator and returns the wrapped reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: BufRead> Iterator for ChunkJsonlReader<R> {
    type Item = Result<Value, ChunkReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            self.buffer.clear();
            let line_number = self.line_number.saturating_add(1);

            match self.reader.read_line(&mut self.buffer) {
                Ok(0) => {
                    self.done = true;
                    return None;
                }
                Ok(_) => {
                    self.line_number = line_number;
                    if self.buffer.ends_with('\n') {
                        self.buffer.pop();
                    }
                    match parse_line(&self.buffer, line_number) {
                        Ok(None) => continue,
                        Ok(Some(value)) => return Some(Ok(value)),
                        Err(err) => return Some(Err(err)),
                    }
                }
                Err(source) => {
                    self.done = true;
                    self.line_number = line_number;
                    return Some(Err(ChunkReadError::Io {
                        line_number,
                        source,
                    }));
                }
            }
        }
    }
}

pub type ChunkJsonlFileReader = ChunkJsonlReader<BufReader<File>>;

/// Convenience constructor for file-backed reading.
pub fn chunk_jsonl_file(path: impl AsRef<Path>) -> Result<ChunkJsonlFileReader, ChunkReadError> {
    let file = File::open(path.as_ref()).map_err(|source| ChunkReadError::Io {
        line_number: 0,
        source,
    })?;
    Ok(ChunkJsonlReader::new(BufReader::new(file)))
}

#[cfg(feature = "tokio")]
mod tokio_reader {
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use futures_core::Stream;
    use serde_json::Value;
    use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

    use super::parse_line;
    use crate::error::ChunkReadError;

    /// Async counterpart of [`super::ChunkJsonlReader`].
    pub struct AsyncChunkJsonlReader<R> {
        lines: Lines<R>,
        line_number: usize,
        done: bool,
    }

    impl<R: AsyncBufRead + Unpin> AsyncChunkJsonlReader<R> {
        pub fn new(reader: R) -> Self {
            Self {
                lines: reader.lines(),
                line_number: 0,
                done: false,
            }
        }
    }

    impl<R: AsyncBufRead + Unpin> Stream for AsyncChunkJsonlReader<R> {
        type Item = Result<Value, ChunkReadError>;

        fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
            let this = self.get_mut();
            if this.done {
                return Poll::Ready(None);
            }

            loop {
                let line_number = this.line_number.saturating_add(1);
                match Pin::new(&mut this.lines).poll_next_line(cx) {
                    Poll::Ready(Ok(Some(line))) => {
                        this.line_number = line_number;
                        match parse_line(&line, line_number) {
                            Ok(None) => continue,
                            Ok(Some(value)) => return Poll::Ready(Some(Ok(value))),
                            Err(err) => return Poll::Ready(Some(Err(err))),
                        }
                    }
                    Poll::Ready(Ok(None)) => {
                        this.done = true;
                        return Poll::Ready(None);
                    }
                    Poll::Ready(Err(source)) => {
                        this.done = true;
                        this.line_number = line_number;
                        return Poll::Ready(Some(Err(ChunkReadError::Io {
                            line_number,
                            source,
                        })));
                    }
                    Poll::Pending => return Poll::Pending,
                }
            }
        }
    }
}

#[cfg(feature = "tokio")]
pub use tokio_reader::AsyncChunkJsonlReader;
