//! Binary heap merger.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::line::{compare_lines, Line};

/// Head line of a partition stream waiting in the merge heap.
/// Entries are ordered by line only; the partition index just routes the refill.
#[derive(Debug)]
pub struct HeapEntry {
    line: Line,
    partition: usize,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_lines(&self.line, &other.line)
    }
}

/// Binary heap merger implementation.
/// Merges multiple sorted line streams into a single sorted stream.
/// Time complexity is *m* \* log(*n*) in worst case where *m* is the number of lines,
/// *n* is the number of streams.
///
/// The first error returned by a stream is passed through and ends the merge.
pub struct BinaryHeapMerger<C, E>
where
    C: Iterator<Item = Result<Line, E>>,
{
    // binary heap is max-heap by default so we reverse it to convert it to min-heap
    items: BinaryHeap<Reverse<HeapEntry>>,
    cursors: Vec<C>,
    initiated: bool,
    failed: bool,
}

impl<C, E> BinaryHeapMerger<C, E>
where
    C: Iterator<Item = Result<Line, E>>,
{
    /// Creates an instance of a binary heap merger using line streams as inputs.
    /// Stream lines should be sorted in ascending order otherwise the result is undefined.
    ///
    /// # Arguments
    /// * `cursors` - Streams to be merged in a single sorted one
    pub fn new<I>(cursors: I) -> Self
    where
        I: IntoIterator<Item = C>,
    {
        let cursors = Vec::from_iter(cursors);
        let items = BinaryHeap::with_capacity(cursors.len());

        BinaryHeapMerger {
            cursors,
            items,
            initiated: false,
            failed: false,
        }
    }

    /// Reads the next line of stream `idx` into the heap. An exhausted stream adds nothing.
    fn refill(&mut self, idx: usize) -> Result<(), E> {
        if let Some(line) = self.cursors[idx].next() {
            self.items.push(Reverse(HeapEntry {
                line: line?,
                partition: idx,
            }));
        }

        Ok(())
    }

    fn init(&mut self) -> Result<(), E> {
        for idx in 0..self.cursors.len() {
            self.refill(idx)?;
        }

        Ok(())
    }
}

impl<C, E> Iterator for BinaryHeapMerger<C, E>
where
    C: Iterator<Item = Result<Line, E>>,
{
    type Item = Result<Line, E>;

    /// Returns the next line from the inputs in ascending order.
    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        if !self.initiated {
            self.initiated = true;
            if let Err(err) = self.init() {
                self.failed = true;
                return Some(Err(err));
            }
        }

        let Reverse(entry) = self.items.pop()?;
        if let Err(err) = self.refill(entry.partition) {
            self.failed = true;
            return Some(Err(err));
        }

        Some(Ok(entry.line))
    }
}

#[cfg(test)]
mod test {
    use rstest::*;
    use std::error::Error;
    use std::io::{self, ErrorKind};

    use super::BinaryHeapMerger;
    use crate::line::Line;

    fn lines(items: &[&str]) -> Vec<Result<Line, io::Error>> {
        items.iter().map(|item| Ok(item.as_bytes().to_vec())).collect()
    }

    fn line(item: &str) -> Result<Line, io::Error> {
        Ok(item.as_bytes().to_vec())
    }

    fn test_error() -> io::Error {
        io::Error::new(ErrorKind::Other, "test error")
    }

    #[rstest]
    #[case(
        vec![],
        vec![],
    )]
    #[case(
        vec![
            vec![],
            vec![]
        ],
        vec![],
    )]
    #[case(
        vec![
            lines(&["d", "e", "g"]),
            lines(&["a", "f"]),
            lines(&["c"]),
            vec![],
        ],
        lines(&["a", "c", "d", "e", "f", "g"]),
    )]
    #[case(
        vec![
            lines(&["apple", "banana"]),
            lines(&["apple", "cherry"]),
        ],
        lines(&["apple", "apple", "banana", "cherry"]),
    )]
    #[case(
        vec![
            vec![Err(test_error())]
        ],
        vec![Err(test_error())],
    )]
    #[case(
        vec![
            vec![line("c"), Err(test_error()), line("d")],
            lines(&["a", "b"]),
        ],
        vec![
            line("a"),
            line("b"),
            Err(test_error()),
        ],
    )]
    fn test_merger(
        #[case] cursors: Vec<Vec<Result<Line, io::Error>>>,
        #[case] expected_result: Vec<Result<Line, io::Error>>,
    ) {
        let merger = BinaryHeapMerger::new(cursors.into_iter().map(|c| c.into_iter()));
        let actual_result: Vec<Result<Line, io::Error>> = merger.collect();
        assert!(
            compare_vectors_of_result::<_, io::Error>(&actual_result, &expected_result),
            "actual={:?}, expected={:?}",
            actual_result,
            expected_result
        );
    }

    #[test]
    fn test_merger_stops_after_error() {
        let cursors = vec![
            vec![line("a"), Err(test_error())].into_iter(),
            lines(&["b", "c"]).into_iter(),
        ];
        let mut merger = BinaryHeapMerger::new(cursors);

        assert!(merger.next().unwrap().is_err());
        assert!(merger.next().is_none());
    }

    fn compare_vectors_of_result<T: PartialEq, E: Error + 'static>(
        actual: &Vec<Result<T, E>>,
        expected: &Vec<Result<T, E>>,
    ) -> bool {
        actual.len() == expected.len()
            && actual
                .into_iter()
                .zip(expected)
                .all(
                    |(actual_result, expected_result)| match (actual_result, expected_result) {
                        (Ok(actual_result), Ok(expected_result)) if actual_result == expected_result => true,
                        (Err(actual_err), Err(expected_err)) => actual_err.to_string() == expected_err.to_string(),
                        _ => false,
                    },
                )
    }
}
