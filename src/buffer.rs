//! Limited line buffer implementations.

use crate::budget::MemoryBudget;
use crate::error::SortError;
use crate::line::{compare_lines, line_size, Line};

/// Buffer builder.
pub trait ChunkBufferBuilder: Default {
    type Buffer: ChunkBuffer;

    /// Creates a new buffer.
    fn build(&self) -> Self::Buffer;

    /// Checks that the builder produces bounded buffers.
    fn validate(&self) -> Result<(), SortError> {
        Ok(())
    }
}

/// Base limited buffer interface.
pub trait ChunkBuffer: IntoIterator<Item = Line> {
    /// Adds a new line to the buffer.
    fn push(&mut self, line: Line);

    /// Returns buffer length in lines.
    fn len(&self) -> usize;

    /// Returns the accumulated size of the buffered lines in bytes.
    fn byte_size(&self) -> u64;

    /// Checks if the buffer reached the limit.
    fn is_full(&self) -> bool;

    /// Sorts buffered lines in ascending order.
    fn sort(&mut self);

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Builder of buffers holding a fixed number of lines.
#[derive(Debug, Clone)]
pub struct LimitedBufferBuilder {
    buffer_limit: usize,
    preallocate: bool,
}

impl LimitedBufferBuilder {
    pub fn new(buffer_limit: usize, preallocate: bool) -> Self {
        LimitedBufferBuilder {
            buffer_limit,
            preallocate,
        }
    }
}

impl ChunkBufferBuilder for LimitedBufferBuilder {
    type Buffer = LimitedBuffer;

    fn build(&self) -> Self::Buffer {
        if self.preallocate {
            LimitedBuffer::with_capacity(self.buffer_limit)
        } else {
            LimitedBuffer::new(self.buffer_limit)
        }
    }
}

impl Default for LimitedBufferBuilder {
    fn default() -> Self {
        LimitedBufferBuilder {
            buffer_limit: usize::MAX,
            preallocate: false,
        }
    }
}

/// Buffer limited by lines count.
pub struct LimitedBuffer {
    limit: usize,
    current_size: u64,
    inner: Vec<Line>,
}

impl LimitedBuffer {
    pub fn new(limit: usize) -> Self {
        LimitedBuffer {
            limit,
            current_size: 0,
            inner: Vec::new(),
        }
    }

    pub fn with_capacity(limit: usize) -> Self {
        LimitedBuffer {
            limit,
            current_size: 0,
            inner: Vec::with_capacity(limit),
        }
    }
}

impl ChunkBuffer for LimitedBuffer {
    fn push(&mut self, line: Line) {
        self.current_size += line_size(&line);
        self.inner.push(line);
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn byte_size(&self) -> u64 {
        self.current_size
    }

    fn is_full(&self) -> bool {
        self.inner.len() >= self.limit
    }

    fn sort(&mut self) {
        self.inner.sort_unstable_by(|a, b| compare_lines(a, b));
    }
}

impl IntoIterator for LimitedBuffer {
    type Item = Line;
    type IntoIter = <Vec<Line> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

/// Builder of buffers bounded by a memory budget.
/// The default builder has no budget and fails validation.
#[derive(Debug, Clone)]
pub struct ByteLimitedBufferBuilder {
    buffer_limit: Option<u64>,
}

impl ByteLimitedBufferBuilder {
    /// Creates a builder whose buffers hold `buffer_limit` bytes of line data.
    pub fn new(buffer_limit: u64) -> Self {
        ByteLimitedBufferBuilder {
            buffer_limit: Some(buffer_limit),
        }
    }

    /// Creates a builder whose buffers hold the partition share of `budget`.
    pub fn from_budget(budget: MemoryBudget) -> Self {
        ByteLimitedBufferBuilder::new(budget.chunk_byte_limit())
    }

    pub fn limit(&self) -> Option<u64> {
        self.buffer_limit
    }
}

impl ChunkBufferBuilder for ByteLimitedBufferBuilder {
    type Buffer = ByteLimitedBuffer;

    fn build(&self) -> Self::Buffer {
        ByteLimitedBuffer::new(self.buffer_limit.unwrap_or(u64::MAX))
    }

    fn validate(&self) -> Result<(), SortError> {
        match self.buffer_limit {
            Some(_) => Ok(()),
            None => Err(SortError::InvalidBudget {
                budget: 0,
                reason: "memory budget is not set",
            }),
        }
    }
}

impl Default for ByteLimitedBufferBuilder {
    fn default() -> Self {
        ByteLimitedBufferBuilder { buffer_limit: None }
    }
}

/// Buffer limited by the accumulated byte size of its lines.
///
/// The limit is checked after every push, so a single line larger than the limit
/// still makes a complete buffer.
pub struct ByteLimitedBuffer {
    limit: u64,
    current_size: u64,
    inner: Vec<Line>,
}

impl ByteLimitedBuffer {
    pub fn new(limit: u64) -> Self {
        ByteLimitedBuffer {
            limit,
            current_size: 0,
            inner: Vec::new(),
        }
    }
}

impl ChunkBuffer for ByteLimitedBuffer {
    fn push(&mut self, line: Line) {
        self.current_size += line_size(&line);
        self.inner.push(line);
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn byte_size(&self) -> u64 {
        self.current_size
    }

    fn is_full(&self) -> bool {
        self.current_size >= self.limit
    }

    fn sort(&mut self) {
        self.inner.sort_unstable_by(|a, b| compare_lines(a, b));
    }
}

impl IntoIterator for ByteLimitedBuffer {
    type Item = Line;
    type IntoIter = <Vec<Line> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}
