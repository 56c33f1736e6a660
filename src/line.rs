//! Line ordering and record terminators.

use std::cmp::Ordering;
use std::io;
use std::io::prelude::*;

/// A single record: raw bytes without terminator. Any encoding is accepted.
pub type Line = Vec<u8>;

/// Record terminator written after every line.
#[cfg(windows)]
pub const LINE_SEPARATOR: &[u8] = b"\r\n";
/// Record terminator written after every line.
#[cfg(not(windows))]
pub const LINE_SEPARATOR: &[u8] = b"\n";

/// Compares two lines lexicographically by their bytes (code point order for UTF-8 text).
pub fn compare_lines(a: &[u8], b: &[u8]) -> Ordering {
    a.cmp(b)
}

/// Size of a line as counted against the partition threshold. The terminator is not included.
pub fn line_size(line: &[u8]) -> u64 {
    line.len() as u64
}

/// Reads the next input record, dropping a trailing `\n` or `\r\n`.
/// Returns [`None`] at end of input.
pub(crate) fn read_input_line<R: BufRead>(reader: &mut R) -> io::Result<Option<Line>> {
    let mut line = Vec::new();
    if reader.read_until(b'\n', &mut line)? == 0 {
        return Ok(None);
    }

    if line.ends_with(b"\n") {
        line.pop();
        if line.ends_with(b"\r") {
            line.pop();
        }
    }

    Ok(Some(line))
}

/// Reads the next record of a partition file, dropping exactly one [`LINE_SEPARATOR`].
/// Returns [`None`] at end of file.
pub(crate) fn read_partition_line<R: BufRead>(reader: &mut R) -> io::Result<Option<Line>> {
    let mut line = Vec::new();
    if reader.read_until(b'\n', &mut line)? == 0 {
        return Ok(None);
    }

    if line.ends_with(LINE_SEPARATOR) {
        line.truncate(line.len() - LINE_SEPARATOR.len());
    }

    Ok(Some(line))
}

#[cfg(test)]
mod test {
    use std::cmp::Ordering;

    use rstest::*;

    use super::{compare_lines, line_size, read_input_line, read_partition_line, Line};

    #[rstest]
    #[case(b"apple", b"banana", Ordering::Less)]
    #[case(b"apple", b"apple", Ordering::Equal)]
    #[case(b"apple", b"Apple", Ordering::Greater)]
    #[case(b"", b"a", Ordering::Less)]
    #[case(b"ab", b"a", Ordering::Greater)]
    #[case("z".as_bytes(), "é".as_bytes(), Ordering::Less)]
    #[case(b"caf\xe9", b"cafe", Ordering::Greater)]
    fn test_compare_lines(#[case] a: &[u8], #[case] b: &[u8], #[case] expected: Ordering) {
        assert_eq!(compare_lines(a, b), expected);
    }

    #[test]
    fn test_line_size_counts_bytes() {
        assert_eq!(line_size(b"cherry"), 6);
        assert_eq!(line_size("é".as_bytes()), 2);
        assert_eq!(line_size(b"caf\xe9"), 4);
        assert_eq!(line_size(b""), 0);
    }

    fn read_all<F>(mut input: &[u8], read: F) -> Vec<Line>
    where
        F: Fn(&mut &[u8]) -> std::io::Result<Option<Line>>,
    {
        let mut lines = Vec::new();
        while let Some(line) = read(&mut input).unwrap() {
            lines.push(line);
        }
        lines
    }

    #[rstest]
    #[case(b"line\n", vec![b"line".to_vec()])]
    #[case(b"line\r\n", vec![b"line".to_vec()])]
    #[case(b"line", vec![b"line".to_vec()])]
    #[case(b"\n", vec![b"".to_vec()])]
    #[case(b"x\r\r\na\r", vec![b"x\r".to_vec(), b"a\r".to_vec()])]
    #[case(b"", vec![])]
    fn test_read_input_line(#[case] input: &[u8], #[case] expected: Vec<Line>) {
        assert_eq!(read_all(input, |reader| read_input_line(reader)), expected);
    }

    #[cfg(not(windows))]
    #[rstest]
    #[case(b"line\n", vec![b"line".to_vec()])]
    #[case(b"x\r\n", vec![b"x\r".to_vec()])]
    #[case(b"a\r\r\n\n", vec![b"a\r\r".to_vec(), b"".to_vec()])]
    fn test_read_partition_line(#[case] input: &[u8], #[case] expected: Vec<Line>) {
        assert_eq!(read_all(input, |reader| read_partition_line(reader)), expected);
    }
}
