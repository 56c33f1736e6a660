//! `ext-line-sort` sorts line-oriented text files that do not fit into memory.
//!
//! External sorting is a class of sorting algorithms that can handle massive amounts of data. External sorting
//! is required when the data being sorted do not fit into the main memory (RAM) of a computer and instead must be
//! resided in slower external memory, usually a hard disk drive. Sorting is achieved in two passes. During the
//! first pass it splits the input into partitions bounded by a memory budget, sorts each of them and spills it to
//! a temporary file. During the second pass it merges the sorted partitions together using a binary heap.
//! For more information see [External Sorting](https://en.wikipedia.org/wiki/External_sorting).
//!
//! # Overview
//!
//! * **Memory budget:**
//!   a partition accumulates lines until their byte size reaches 40% of the memory budget,
//!   the rest is left for allocation overhead, sort workspace and the rest of the system.
//! * **Lexicographic order:**
//!   lines are compared by their raw bytes, which is Unicode code point order for UTF-8 text.
//!   Any encoding is accepted, a line is whatever lies between two `\n` terminators.
//! * **Clean up:**
//!   partition files live in a private temporary directory which is removed after the merge,
//!   whether it succeeds or not.
//! * **Atomic output:**
//!   [`ExternalSorter::sort_file`] renames the result into place only after a successful merge.
//!
//! # Example
//!
//! ```no_run
//! use std::path;
//!
//! use ext_line_sort::{ExternalSorter, ExternalSorterBuilder, MemoryBudget};
//!
//! fn main() {
//!     let sorter: ExternalSorter = ExternalSorterBuilder::new()
//!         .with_tmp_dir(path::Path::new("./"))
//!         .with_memory_budget(MemoryBudget::new(16 * 1024 * 1024).unwrap())
//!         .build()
//!         .unwrap();
//!
//!     let summary = sorter
//!         .sort_file(path::Path::new("input.txt"), path::Path::new("output.txt"))
//!         .unwrap();
//!     println!("sorted {} lines", summary.lines);
//! }
//! ```

pub mod budget;
pub mod buffer;
pub mod chunk;
pub mod error;
pub mod line;
pub mod merger;
pub mod sort;

pub use budget::MemoryBudget;
pub use buffer::{ByteLimitedBuffer, ByteLimitedBufferBuilder, ChunkBuffer, ChunkBufferBuilder, LimitedBuffer, LimitedBufferBuilder};
pub use chunk::{PartitionFile, PartitionNaming, Partitions, StreamCursor};
pub use error::SortError;
pub use merger::BinaryHeapMerger;
pub use sort::{ExternalSorter, ExternalSorterBuilder, SortSummary};
