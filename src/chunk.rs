//! Partition files: creation during the partition pass and line streams over them during the merge pass.

use std::fs;
use std::io;
use std::io::prelude::*;
use std::path::{Path, PathBuf};

use crate::error::SortError;
use crate::line::{line_size, read_partition_line, Line, LINE_SEPARATOR};

/// Partition file naming scheme: `<namespace>.tmp.part<index>.<extension>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionNaming {
    namespace: String,
    extension: String,
}

impl PartitionNaming {
    pub fn new(namespace: &str, extension: &str) -> Self {
        PartitionNaming {
            namespace: namespace.to_string(),
            extension: extension.to_string(),
        }
    }

    /// Returns the file name of the partition with index `index`.
    pub fn file_name(&self, index: usize) -> String {
        format!("{}.tmp.part{}.{}", self.namespace, index, self.extension)
    }
}

impl Default for PartitionNaming {
    fn default() -> Self {
        PartitionNaming::new("ext-line-sort", "txt")
    }
}

/// Handle of a sorted partition persisted to the file system.
#[derive(Debug, Clone)]
pub struct PartitionFile {
    index: usize,
    path: PathBuf,
    lines: u64,
    bytes: u64,
}

impl PartitionFile {
    /// Writes `lines` to a new partition file inside `dir`. Lines must already be sorted.
    ///
    /// # Arguments
    /// * `dir` - Directory the partition file is created in
    /// * `naming` - Partition file naming scheme
    /// * `index` - Sequential partition index
    /// * `lines` - Sorted partition lines
    /// * `buf_size` - Write buffer size
    pub fn create(
        dir: &Path,
        naming: &PartitionNaming,
        index: usize,
        lines: impl IntoIterator<Item = Line>,
        buf_size: Option<usize>,
    ) -> Result<Self, SortError> {
        let path = dir.join(naming.file_name(index));
        let write_err = |err: io::Error| SortError::PartitionWrite {
            path: path.clone(),
            source: err,
        };

        let file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(write_err)?;

        let mut chunk_writer = match buf_size {
            Some(buf_size) => io::BufWriter::with_capacity(buf_size, file),
            None => io::BufWriter::new(file),
        };

        let mut line_count = 0;
        let mut byte_count = 0;
        for line in lines {
            chunk_writer.write_all(&line).map_err(write_err)?;
            chunk_writer.write_all(LINE_SEPARATOR).map_err(write_err)?;
            line_count += 1;
            byte_count += line_size(&line);
        }

        chunk_writer.flush().map_err(write_err)?;

        Ok(PartitionFile {
            index,
            path,
            lines: line_count,
            bytes: byte_count,
        })
    }

    /// Opens a line stream positioned at the first line of the partition.
    pub fn open(&self, buf_size: Option<usize>) -> Result<StreamCursor, SortError> {
        let file = fs::File::open(&self.path).map_err(|err| SortError::MergeRead {
            path: self.path.clone(),
            source: err,
        })?;

        let reader = match buf_size {
            Some(buf_size) => io::BufReader::with_capacity(buf_size, file),
            None => io::BufReader::new(file),
        };

        Ok(StreamCursor {
            path: self.path.clone(),
            reader,
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of lines in the partition.
    pub fn lines(&self) -> u64 {
        self.lines
    }

    /// Line bytes in the partition, terminators excluded.
    pub fn bytes(&self) -> u64 {
        self.bytes
    }
}

/// Live read position over one partition file.
/// The file handle is released when the cursor is dropped.
pub struct StreamCursor {
    path: PathBuf,
    reader: io::BufReader<fs::File>,
}

impl StreamCursor {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Iterator for StreamCursor {
    type Item = Result<Line, SortError>;

    fn next(&mut self) -> Option<Self::Item> {
        match read_partition_line(&mut self.reader) {
            Ok(line) => line.map(Ok),
            Err(err) => Some(Err(SortError::MergeRead {
                path: self.path.clone(),
                source: err,
            })),
        }
    }
}

/// Partitions of a single sort run together with the private directory holding them.
/// Dropping the set removes the directory and every partition file in it.
pub struct Partitions {
    dir: tempfile::TempDir,
    files: Vec<PartitionFile>,
}

impl Partitions {
    pub(crate) fn new(dir: tempfile::TempDir) -> Self {
        Partitions { dir, files: Vec::new() }
    }

    pub(crate) fn push(&mut self, file: PartitionFile) {
        self.files.push(file);
    }

    /// Directory holding the partition files.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn files(&self) -> &[PartitionFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total number of lines across all partitions.
    pub fn total_lines(&self) -> u64 {
        self.files.iter().map(PartitionFile::lines).sum()
    }

    /// Total line bytes across all partitions.
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(PartitionFile::bytes).sum()
    }

    /// Removes the partition files. Failures are logged, not returned.
    pub fn close(self) {
        let dir_path = self.dir.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => log::debug!("removed temporary directory {}", dir_path.display()),
            Err(err) => log::warn!("temporary directory {} not removed: {}", dir_path.display(), err),
        }
    }
}

#[cfg(test)]
mod test {
    use std::fs;

    use rstest::*;

    use super::{PartitionFile, PartitionNaming, Partitions};
    use crate::line::Line;
    use crate::SortError;

    #[fixture]
    fn tmp_dir() -> tempfile::TempDir {
        tempfile::tempdir().unwrap()
    }

    #[rstest]
    #[case(PartitionNaming::default(), 0, "ext-line-sort.tmp.part0.txt")]
    #[case(PartitionNaming::new("thangnq", "txt"), 12, "thangnq.tmp.part12.txt")]
    #[case(PartitionNaming::new("run", "lines"), 3, "run.tmp.part3.lines")]
    fn test_naming(#[case] naming: PartitionNaming, #[case] index: usize, #[case] expected: &str) {
        assert_eq!(naming.file_name(index), expected);
    }

    #[rstest]
    fn test_partition_file(tmp_dir: tempfile::TempDir) {
        let saved = vec![b"apple".to_vec(), b"".to_vec(), b"caf\xe9".to_vec(), b"x\r".to_vec()];

        let partition =
            PartitionFile::create(tmp_dir.path(), &PartitionNaming::default(), 4, saved.clone(), Some(16)).unwrap();
        assert_eq!(partition.index(), 4);
        assert_eq!(partition.lines(), 4);
        assert_eq!(partition.bytes(), 11);
        assert_eq!(partition.path(), tmp_dir.path().join("ext-line-sort.tmp.part4.txt"));

        let cursor = partition.open(Some(16)).unwrap();
        let restored: Result<Vec<Line>, SortError> = cursor.collect();
        assert_eq!(restored.unwrap(), saved);
    }

    #[rstest]
    fn test_partition_file_collision(tmp_dir: tempfile::TempDir) {
        let naming = PartitionNaming::default();
        PartitionFile::create(tmp_dir.path(), &naming, 0, vec![b"a".to_vec()], None).unwrap();

        let result = PartitionFile::create(tmp_dir.path(), &naming, 0, vec![b"b".to_vec()], None);
        assert!(matches!(result, Err(SortError::PartitionWrite { .. })));
    }

    #[cfg(not(windows))]
    #[rstest]
    fn test_cursor_keeps_carriage_returns(tmp_dir: tempfile::TempDir) {
        let naming = PartitionNaming::default();
        let partition = PartitionFile::create(tmp_dir.path(), &naming, 0, Vec::new(), None).unwrap();
        fs::write(partition.path(), "a\r\nb\r\r\n\r\n").unwrap();

        let restored: Result<Vec<Line>, SortError> = partition.open(None).unwrap().collect();
        assert_eq!(restored.unwrap(), vec![b"a\r".to_vec(), b"b\r\r".to_vec(), b"\r".to_vec()]);
    }

    #[rstest]
    fn test_cursor_missing_file(tmp_dir: tempfile::TempDir) {
        let partition =
            PartitionFile::create(tmp_dir.path(), &PartitionNaming::default(), 0, Vec::new(), None).unwrap();
        fs::remove_file(partition.path()).unwrap();

        assert!(matches!(partition.open(None), Err(SortError::MergeRead { .. })));
    }

    #[test]
    fn test_partitions_removed_on_close() {
        let root = tempfile::tempdir().unwrap();
        let mut partitions = Partitions::new(tempfile::tempdir_in(root.path()).unwrap());
        let naming = PartitionNaming::default();
        for index in 0..3 {
            let lines = vec![format!("line{}", index).into_bytes()];
            let partition = PartitionFile::create(partitions.dir(), &naming, index, lines, None).unwrap();
            partitions.push(partition);
        }
        assert_eq!(partitions.len(), 3);
        assert_eq!(partitions.total_lines(), 3);
        assert_eq!(partitions.total_bytes(), 15);

        partitions.close();
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
    }
}
