//! Record files for a simulation output directory
//!
//! Directory structure:
//! out/
//!   config.yaml      # Config the grid was built from
//!   grid.jsonl       # One GridRow per line, written atomically
//!   results.jsonl    # One EstimationResult per line, append-only
//!   summary.jsonl    # One AggregateSummary per line, written atomically
//!   powersim.log

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;
use serde::Serialize;
use serde::de::DeserializeOwned;

use powersim_core::SimulationConfig;
use powersim_core::model::{AggregateSummary, EstimationResult, GridRow};

/// Error types for storage operations
#[derive(Debug)]
pub enum StorageError {
    Io(String),
    Parse(String),
    Serialize(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(msg) => write!(f, "IO error: {}", msg),
            StorageError::Parse(msg) => write!(f, "Parse error: {}", msg),
            StorageError::Serialize(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

/// Write content to a file atomically using write-then-rename.
///
/// The content goes to a sibling `.tmp` file first, which is then renamed
/// over the target, so readers never see a half-written file.
pub fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut temp_path = path.as_os_str().to_owned();
    temp_path.push(".tmp");
    let temp_path = PathBuf::from(temp_path);

    fs::write(&temp_path, content)?;
    fs::rename(&temp_path, path)?;
    Ok(())
}

/// Serialize records as JSON Lines
fn to_jsonl<T: Serialize>(records: &[T]) -> Result<Vec<u8>, StorageError> {
    let mut buffer = Vec::new();
    for record in records {
        serde_json::to_writer(&mut buffer, record)
            .map_err(|e| StorageError::Serialize(e.to_string()))?;
        buffer.push(b'\n');
    }
    Ok(buffer)
}

/// Read every line of a JSON Lines file. Blank lines are skipped; any other
/// malformed line is an error.
fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StorageError> {
    let file = File::open(path)
        .map_err(|e| StorageError::Io(format!("Failed to open {}: {}", path.display(), e)))?;

    let mut records = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| StorageError::Io(e.to_string()))?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).map_err(|e| {
            StorageError::Parse(format!("{}:{}: {}", path.display(), index + 1, e))
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Length of the prefix of `bytes` made of newline-terminated lines
fn terminated_len(bytes: &[u8]) -> usize {
    bytes
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |i| i + 1)
}

/// Manages the files of one simulation output directory
#[derive(Debug, Clone)]
pub struct OutputDirectory {
    root: PathBuf,
}

impl OutputDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.yaml")
    }

    pub fn grid_path(&self) -> PathBuf {
        self.root.join("grid.jsonl")
    }

    pub fn results_path(&self) -> PathBuf {
        self.root.join("results.jsonl")
    }

    pub fn summary_path(&self) -> PathBuf {
        self.root.join("summary.jsonl")
    }

    /// Create the directory if it does not exist yet
    pub fn init(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root)
            .map_err(|e| StorageError::Io(format!("Failed to create output directory: {}", e)))
    }

    /// Save the config a grid was built from next to the grid
    pub fn save_config(&self, config: &SimulationConfig) -> Result<(), StorageError> {
        let yaml =
            serde_saphyr::to_string(config).map_err(|e| StorageError::Serialize(e.to_string()))?;
        atomic_write(&self.config_path(), yaml.as_bytes())
            .map_err(|e| StorageError::Io(format!("Failed to write config: {}", e)))
    }

    pub fn save_grid(&self, grid: &[GridRow]) -> Result<(), StorageError> {
        atomic_write(&self.grid_path(), &to_jsonl(grid)?)
            .map_err(|e| StorageError::Io(format!("Failed to write grid: {}", e)))
    }

    pub fn load_grid(&self) -> Result<Vec<GridRow>, StorageError> {
        read_jsonl(&self.grid_path())
    }

    pub fn save_summary(&self, summaries: &[AggregateSummary]) -> Result<(), StorageError> {
        atomic_write(&self.summary_path(), &to_jsonl(summaries)?)
            .map_err(|e| StorageError::Io(format!("Failed to write summary: {}", e)))
    }

    pub fn load_summary(&self) -> Result<Vec<AggregateSummary>, StorageError> {
        read_jsonl(&self.summary_path())
    }

    /// Load the results written so far.
    ///
    /// A missing file means no results yet. Only newline-terminated lines
    /// count: an unterminated final line is what an interrupted append
    /// leaves behind, and `ResultWriter::open` cuts it off, so it is ignored
    /// here even when it happens to parse. A bad terminated line is an error.
    pub fn load_results(&self) -> Result<Vec<EstimationResult>, StorageError> {
        let path = self.results_path();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StorageError::Io(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let terminated = &content[..terminated_len(content.as_bytes())];
        let tail = &content[terminated.len()..];
        if !tail.trim().is_empty() {
            tracing::warn!(
                bytes = tail.len(),
                "ignoring unterminated trailing result line"
            );
        }

        let mut results = Vec::new();
        for (index, line) in terminated.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let result = serde_json::from_str(line).map_err(|e| {
                StorageError::Parse(format!("{}:{}: {}", path.display(), index + 1, e))
            })?;
            results.push(result);
        }
        Ok(results)
    }

    /// Row ids that already have a result
    pub fn completed_rows(&self) -> Result<FxHashSet<usize>, StorageError> {
        Ok(self.load_results()?.iter().map(|r| r.row_id).collect())
    }

    /// Open the results file for appending
    pub fn result_writer(&self) -> Result<ResultWriter, StorageError> {
        ResultWriter::open(&self.results_path())
    }
}

/// Appends results to a JSON Lines file, one flushed line per result.
///
/// An interrupted append can leave at most one partial line at the end of
/// the file. Opening the writer cuts that line off so the next append
/// starts on a clean line.
pub struct ResultWriter {
    writer: BufWriter<File>,
    written: usize,
}

impl ResultWriter {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)
            .map_err(|e| StorageError::Io(format!("Failed to open {}: {}", path.display(), e)))?;

        let bytes = fs::read(path).map_err(|e| StorageError::Io(e.to_string()))?;
        let keep = terminated_len(&bytes);
        if keep < bytes.len() {
            tracing::warn!(
                dropped_bytes = bytes.len() - keep,
                "dropping unterminated trailing line from results file"
            );
            file.set_len(keep as u64)
                .map_err(|e| StorageError::Io(e.to_string()))?;
        }

        Ok(Self {
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    pub fn append(&mut self, result: &EstimationResult) -> Result<(), StorageError> {
        serde_json::to_writer(&mut self.writer, result)
            .map_err(|e| StorageError::Serialize(e.to_string()))?;
        self.writer
            .write_all(b"\n")
            .and_then(|_| self.writer.flush())
            .map_err(|e| StorageError::Io(e.to_string()))?;
        self.written += 1;
        Ok(())
    }

    pub fn append_all(&mut self, results: &[EstimationResult]) -> Result<(), StorageError> {
        results.iter().try_for_each(|r| self.append(r))
    }

    /// Number of results appended through this writer
    pub fn written(&self) -> usize {
        self.written
    }
}
