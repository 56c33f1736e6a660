//! External sorter.

use std::fs;
use std::io;
use std::io::prelude::*;
use std::mem;
use std::path::{Path, PathBuf};

use crate::budget::MemoryBudget;
use crate::chunk::{PartitionFile, PartitionNaming, Partitions};
use crate::error::SortError;
use crate::line::{read_input_line, LINE_SEPARATOR};
use crate::merger::BinaryHeapMerger;
use crate::{ByteLimitedBufferBuilder, ChunkBuffer, ChunkBufferBuilder};

/// Outcome of a completed sort run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSummary {
    /// Number of partitions spilled to disk.
    pub partitions: usize,
    /// Number of lines written to the output.
    pub lines: u64,
    /// Line bytes written to the output, terminators excluded.
    pub bytes: u64,
}

impl SortSummary {
    fn of(partitions: &Partitions) -> Self {
        SortSummary {
            partitions: partitions.len(),
            lines: partitions.total_lines(),
            bytes: partitions.total_bytes(),
        }
    }
}

/// External sorter builder. Provides methods for [`ExternalSorter`] initialization.
#[derive(Clone)]
pub struct ExternalSorterBuilder<B = ByteLimitedBufferBuilder>
where
    B: ChunkBufferBuilder,
{
    /// Directory to be used to store temporary data.
    tmp_dir: Option<Box<Path>>,
    /// Partition file read/write buffer size.
    rw_buf_size: Option<usize>,
    /// Partition file naming scheme.
    naming: PartitionNaming,
    /// Chunk buffer builder.
    buffer_builder: B,
}

impl ExternalSorterBuilder<ByteLimitedBufferBuilder> {
    /// Creates an instance of a builder with default parameters.
    /// A memory budget (or another buffer) must be set before [`ExternalSorterBuilder::build`].
    pub fn new() -> Self {
        ExternalSorterBuilder::default()
    }

    /// Bounds partitions by the memory budget.
    pub fn with_memory_budget(self, budget: MemoryBudget) -> ExternalSorterBuilder<ByteLimitedBufferBuilder> {
        self.with_buffer(ByteLimitedBufferBuilder::from_budget(budget))
    }
}

impl<B> ExternalSorterBuilder<B>
where
    B: ChunkBufferBuilder,
{
    /// Builds an [`ExternalSorter`] instance using provided configuration.
    /// Fails with [`SortError::InvalidBudget`] if the memory budget was not set.
    pub fn build(self) -> Result<ExternalSorter<B>, SortError> {
        ExternalSorter::new(
            self.tmp_dir.as_deref(),
            self.buffer_builder,
            self.rw_buf_size,
            self.naming,
        )
    }

    /// Sets directory to be used to store temporary data.
    pub fn with_tmp_dir(mut self, path: &Path) -> ExternalSorterBuilder<B> {
        self.tmp_dir = Some(path.into());
        self
    }

    /// Sets buffer builder.
    pub fn with_buffer<N: ChunkBufferBuilder>(self, buffer_builder: N) -> ExternalSorterBuilder<N> {
        ExternalSorterBuilder {
            tmp_dir: self.tmp_dir,
            rw_buf_size: self.rw_buf_size,
            naming: self.naming,
            buffer_builder,
        }
    }

    /// Sets partition file read/write buffer size.
    pub fn with_rw_buf_size(mut self, buf_size: usize) -> ExternalSorterBuilder<B> {
        self.rw_buf_size = Some(buf_size);
        self
    }

    /// Sets the namespace partition file names start with.
    pub fn with_namespace(mut self, namespace: &str) -> ExternalSorterBuilder<B> {
        self.naming = PartitionNaming::new(namespace, "txt");
        self
    }
}

impl<B> Default for ExternalSorterBuilder<B>
where
    B: ChunkBufferBuilder,
{
    fn default() -> Self {
        ExternalSorterBuilder {
            tmp_dir: None,
            rw_buf_size: None,
            naming: PartitionNaming::default(),
            buffer_builder: B::default(),
        }
    }
}

/// External sorter.
pub struct ExternalSorter<B = ByteLimitedBufferBuilder>
where
    B: ChunkBufferBuilder,
{
    /// Directory each run creates its private partition directory in.
    tmp_path: Option<PathBuf>,
    /// Chunk buffer builder.
    buffer_builder: B,
    /// Partition file read/write buffer size.
    rw_buf_size: Option<usize>,
    /// Partition file naming scheme.
    naming: PartitionNaming,
}

impl<B> ExternalSorter<B>
where
    B: ChunkBufferBuilder,
{
    /// Creates a new external sorter instance.
    ///
    /// # Arguments
    /// * `tmp_path` - Directory to be used to store temporary data. If paramater is [`None`] default OS temporary
    ///   directory will be used.
    /// * `buffer_builder` - An instance of a buffer builder that will be used for partition buffer creation.
    /// * `rw_buf_size` - Partition file read/write buffer size.
    /// * `naming` - Partition file naming scheme.
    pub fn new(
        tmp_path: Option<&Path>,
        buffer_builder: B,
        rw_buf_size: Option<usize>,
        naming: PartitionNaming,
    ) -> Result<Self, SortError> {
        buffer_builder.validate()?;

        if let Some(tmp_path) = tmp_path {
            let metadata = fs::metadata(tmp_path).map_err(SortError::TempDir)?;
            if !metadata.is_dir() {
                return Err(SortError::TempDir(io::Error::new(
                    io::ErrorKind::Other,
                    format!("{} is not a directory", tmp_path.display()),
                )));
            }
        }

        Ok(ExternalSorter {
            tmp_path: tmp_path.map(Path::to_path_buf),
            buffer_builder,
            rw_buf_size,
            naming,
        })
    }

    fn init_tmp_directory(&self) -> Result<tempfile::TempDir, SortError> {
        let tmp_dir = if let Some(tmp_path) = &self.tmp_path {
            tempfile::tempdir_in(tmp_path)
        } else {
            tempfile::tempdir()
        }
        .map_err(SortError::TempDir)?;

        log::info!("using {} as a temporary directory", tmp_dir.path().display());

        Ok(tmp_dir)
    }

    /// Splits the input into sorted partitions spilled to a private temporary directory.
    /// On error every partition written so far is removed.
    ///
    /// # Arguments
    /// * `input` - Input stream lines to be fetched from
    pub fn partition<R: BufRead>(&self, mut input: R) -> Result<Partitions, SortError> {
        let mut partitions = Partitions::new(self.init_tmp_directory()?);
        let mut chunk_buf = self.buffer_builder.build();
        let mut single_line_partitions = 0;

        while let Some(line) =
            read_input_line(&mut input).map_err(|err| SortError::InputRead { path: None, source: err })?
        {
            chunk_buf.push(line);

            if chunk_buf.is_full() {
                let full_buf = mem::replace(&mut chunk_buf, self.buffer_builder.build());
                if full_buf.len() == 1 {
                    single_line_partitions += 1;
                }
                let partition = self.create_partition(&partitions, full_buf)?;
                partitions.push(partition);
            }
        }

        if !chunk_buf.is_empty() {
            if chunk_buf.len() == 1 {
                single_line_partitions += 1;
            }
            let partition = self.create_partition(&partitions, chunk_buf)?;
            partitions.push(partition);
        }

        if partitions.len() > 1 && single_line_partitions == partitions.len() {
            log::warn!(
                "every partition holds a single line, the memory budget is too small for this input ({} partitions)",
                partitions.len()
            );
        }

        log::info!(
            "partition pass done (partitions: {}, lines: {}, bytes: {})",
            partitions.len(),
            partitions.total_lines(),
            partitions.total_bytes()
        );

        Ok(partitions)
    }

    fn create_partition(&self, partitions: &Partitions, mut buffer: B::Buffer) -> Result<PartitionFile, SortError> {
        let index = partitions.len();

        log::debug!(
            "sorting partition {} (lines: {}, bytes: {}) ...",
            index,
            buffer.len(),
            buffer.byte_size()
        );
        buffer.sort();

        let partition = PartitionFile::create(partitions.dir(), &self.naming, index, buffer, self.rw_buf_size)?;
        log::debug!("partition {} saved to {}", index, partition.path().display());

        Ok(partition)
    }

    /// Merges sorted partitions into the output and removes the partition files afterwards,
    /// whether the merge succeeds or not.
    /// Returns the number of lines written.
    ///
    /// # Arguments
    /// * `partitions` - Partitions produced by [`ExternalSorter::partition`]
    /// * `output` - Output stream sorted lines are written to
    pub fn merge<W: Write>(&self, partitions: Partitions, output: W) -> Result<u64, SortError> {
        let result = self.merge_partitions(&partitions, output);
        partitions.close();

        result
    }

    fn merge_partitions<W: Write>(&self, partitions: &Partitions, mut output: W) -> Result<u64, SortError> {
        let write_err = |err: io::Error| SortError::MergeWrite { path: None, source: err };

        let cursors = partitions
            .files()
            .iter()
            .map(|partition| partition.open(self.rw_buf_size))
            .collect::<Result<Vec<_>, _>>()?;

        log::debug!("merging {} partitions ...", cursors.len());

        let mut written = 0;
        for line in BinaryHeapMerger::new(cursors) {
            let line = line?;
            output.write_all(&line).map_err(write_err)?;
            output.write_all(LINE_SEPARATOR).map_err(write_err)?;
            written += 1;
        }
        output.flush().map_err(write_err)?;

        debug_assert_eq!(written, partitions.total_lines());
        log::info!("merge pass done (lines: {})", written);

        Ok(written)
    }

    /// Sorts lines from the input stream and writes them to the output stream.
    ///
    /// # Arguments
    /// * `input` - Input stream lines to be fetched from
    /// * `output` - Output stream sorted lines are written to
    pub fn sort<R: BufRead, W: Write>(&self, input: R, output: W) -> Result<SortSummary, SortError> {
        let partitions = self.partition(input)?;
        if partitions.is_empty() {
            log::info!("input is empty, output will be empty");
        }

        let summary = SortSummary::of(&partitions);
        self.merge(partitions, output)?;

        Ok(summary)
    }

    /// Sorts the file at `input` into the file at `output`.
    ///
    /// The output is written to a temporary file next to `output` and renamed into place only
    /// after the merge completes, so a failed run never leaves a partial file at `output`.
    /// An existing output keeps its permissions, a new one gets the permissions of a freshly
    /// created file. `input` and `output` may be the same path.
    pub fn sort_file(&self, input: &Path, output: &Path) -> Result<SortSummary, SortError> {
        let input_file = fs::File::open(input).map_err(|err| SortError::InputRead {
            path: Some(input.to_path_buf()),
            source: err,
        })?;
        let input_stream = match self.rw_buf_size {
            Some(buf_size) => io::BufReader::with_capacity(buf_size, input_file),
            None => io::BufReader::new(input_file),
        };

        let partitions = self.partition(input_stream).map_err(|err| err.at_input(input))?;

        let output_dir = match output.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let output_err = |err: io::Error| SortError::MergeWrite {
            path: Some(output.to_path_buf()),
            source: err,
        };
        let output_file = tempfile::NamedTempFile::new_in(output_dir).map_err(output_err)?;
        let permissions = match fs::metadata(output) {
            Ok(metadata) => metadata.permissions(),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                new_file_permissions(partitions.dir()).map_err(output_err)?
            }
            Err(err) => return Err(output_err(err)),
        };
        output_file.as_file().set_permissions(permissions).map_err(output_err)?;

        let summary = {
            let mut output_stream = match self.rw_buf_size {
                Some(buf_size) => io::BufWriter::with_capacity(buf_size, output_file.as_file()),
                None => io::BufWriter::new(output_file.as_file()),
            };

            let summary = SortSummary::of(&partitions);
            self.merge(partitions, &mut output_stream)
                .map_err(|err| err.at_output(output))?;

            summary
        };

        output_file.persist(output).map_err(|err| output_err(err.error))?;
        log::info!(
            "sorted {} into {} (partitions: {}, lines: {})",
            input.display(),
            output.display(),
            summary.partitions,
            summary.lines
        );

        Ok(summary)
    }
}

/// Returns the permissions a file created in `dir` gets by default (`0o666` minus umask on unix).
fn new_file_permissions(dir: &Path) -> io::Result<fs::Permissions> {
    let path = dir.join("output-permissions");
    let file = fs::OpenOptions::new().write(true).create_new(true).open(&path)?;
    let permissions = file.metadata()?.permissions();
    drop(file);
    fs::remove_file(&path)?;

    Ok(permissions)
}
