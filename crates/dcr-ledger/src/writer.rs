use std::collections::BTreeSet;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{read_ledger, LedgerEntries, LedgerError};

/// Placeholder written when a ledger is created: an empty JSON object.
const EMPTY_LEDGER: &str = "{\n}";

/// Fresh suffixes tried before giving up on finding an unused file name.
const MAX_NAME_ATTEMPTS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushKind {
    /// Periodic save while batches are still running.
    Interim,
    /// Last save of a run.
    Final,
}

impl FlushKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlushKind::Interim => "interim",
            FlushKind::Final => "final",
        }
    }
}

/// What a single flush did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Entries written by this flush.
    pub written: usize,
    /// Codes that had already been written to this ledger and now carry a newer value.
    pub superseded: Vec<String>,
    /// The on-disk object was unreadable and the file was rewritten with only
    /// this flush's entries.
    pub rewrote: bool,
}

/// Single writer of one ledger file.
///
/// Owned by exactly one run; the file is never opened for writing by anything else.
#[derive(Debug)]
pub struct LedgerWriter {
    path: PathBuf,
    flush_count: usize,
    entries_written: usize,
    /// Keys present in the file (loaded on resume, extended on every flush).
    known_keys: BTreeSet<String>,
}

impl LedgerWriter {
    /// Create a new ledger `{base_filename}_{suffix}.json` under `dir`.
    ///
    /// The suffix is `suffix_len` random lowercase letters; an existing file
    /// is never reused or overwritten. `suffix_len == 0` drops the suffix.
    pub fn create(
        dir: impl AsRef<Path>,
        base_filename: &str,
        suffix_len: usize,
    ) -> Result<Self, LedgerError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|source| LedgerError::Create {
            path: dir.to_path_buf(),
            source,
        })?;

        let attempts = if suffix_len == 0 { 1 } else { MAX_NAME_ATTEMPTS };
        let mut last_path = dir.join(format!("{base_filename}.json"));
        for _ in 0..attempts {
            let name = if suffix_len == 0 {
                format!("{base_filename}.json")
            } else {
                format!("{base_filename}_{}.json", random_suffix(suffix_len))
            };
            let path = dir.join(name);

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut f) => {
                    write_and_sync(&mut f, EMPTY_LEDGER.as_bytes()).map_err(|source| {
                        LedgerError::Create {
                            path: path.clone(),
                            source,
                        }
                    })?;
                    let writer = Self::with_keys(path, BTreeSet::new());
                    info!(path = %writer.path.display(), "ledger created");
                    writer.log_file_size();
                    return Ok(writer);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    last_path = path;
                    continue;
                }
                Err(source) => return Err(LedgerError::Create { path, source }),
            }
        }

        Err(LedgerError::Create {
            path: last_path,
            source: std::io::Error::new(
                ErrorKind::AlreadyExists,
                "no unused ledger file name found",
            ),
        })
    }

    /// Continue an existing ledger.
    ///
    /// A missing or blank file is initialized with the empty placeholder.
    /// A file that is not a JSON object of strings is refused rather than
    /// rewritten, so prior results are never silently dropped.
    pub fn resume(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref().to_path_buf();

        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
            Err(source) => return Err(LedgerError::Read { path, source }),
        };

        if raw.trim().is_empty() {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|source| LedgerError::Create {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            fs::write(&path, EMPTY_LEDGER).map_err(|source| LedgerError::Create {
                path: path.clone(),
                source,
            })?;
            info!(path = %path.display(), "ledger initialized for resume");
            return Ok(Self::with_keys(path, BTreeSet::new()));
        }

        let entries: LedgerEntries =
            serde_json::from_str(&raw).map_err(|e| LedgerError::Corrupt {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        info!(
            path = %path.display(),
            existing_entries = entries.len(),
            "ledger resumed"
        );
        Ok(Self::with_keys(path, entries.into_keys().collect()))
    }

    fn with_keys(path: PathBuf, known_keys: BTreeSet<String>) -> Self {
        Self {
            path,
            flush_count: 0,
            entries_written: 0,
            known_keys,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flushes that wrote at least one entry.
    pub fn flush_count(&self) -> usize {
        self.flush_count
    }

    /// Entries written by this writer across all flushes.
    pub fn entries_written(&self) -> usize {
        self.entries_written
    }

    /// Merge `entries` into the on-disk object.
    ///
    /// Prior content is preserved verbatim; the new entries are spliced in
    /// before the closing brace and the file is synced. If the existing file is
    /// not a valid JSON object, it is rewritten with only these entries (the
    /// current batch survives; earlier entries are lost).
    pub fn flush(
        &mut self,
        entries: &LedgerEntries,
        kind: FlushKind,
    ) -> Result<FlushReport, LedgerError> {
        if entries.is_empty() {
            info!(kind = kind.as_str(), "no new results to save");
            return Ok(FlushReport::default());
        }

        let superseded: Vec<String> = entries
            .keys()
            .filter(|k| self.known_keys.contains(*k))
            .cloned()
            .collect();
        for code in &superseded {
            warn!(code = %code, "ledger entry superseded; last write wins");
        }

        let body = render_entries(entries)?;

        let mut f = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.path)
            .map_err(|source| self.write_err(source))?;

        let mut content = String::new();
        f.read_to_string(&mut content).map_err(|source| LedgerError::Read {
            path: self.path.clone(),
            source,
        })?;

        let rewrote = match splice_point(&content) {
            Some((pos, has_entries)) => {
                let sep = if has_entries { ",\n" } else { "\n" };
                let tail = format!("{sep}{body}\n}}\n");
                overwrite_from(&mut f, pos as u64, tail.as_bytes())
                    .map_err(|source| self.write_err(source))?;
                false
            }
            None => {
                warn!(
                    path = %self.path.display(),
                    "ledger format issue; rewriting file with current entries only"
                );
                let full = format!("{{\n{body}\n}}\n");
                overwrite_from(&mut f, 0, full.as_bytes())
                    .map_err(|source| self.write_err(source))?;
                self.known_keys.clear();
                true
            }
        };

        self.known_keys.extend(entries.keys().cloned());
        self.flush_count += 1;
        self.entries_written += entries.len();

        info!(
            kind = kind.as_str(),
            written = entries.len(),
            total_written = self.entries_written,
            path = %self.path.display(),
            "saved results"
        );
        self.log_file_size();

        Ok(FlushReport {
            written: entries.len(),
            superseded,
            rewrote,
        })
    }

    /// Authoritative contents of the ledger as they are on disk.
    pub fn read_all(&self) -> LedgerEntries {
        read_ledger(&self.path)
    }

    fn write_err(&self, source: std::io::Error) -> LedgerError {
        LedgerError::Write {
            path: self.path.clone(),
            source,
        }
    }

    fn log_file_size(&self) {
        if let Ok(meta) = fs::metadata(&self.path) {
            let bytes = meta.len();
            info!(bytes, kb = bytes as f64 / 1024.0, "current ledger file size");
        }
    }
}

/// Where to splice new entries into `content`, and whether the object already
/// has members. `None` when `content` is not a JSON object.
///
/// The splice point is just past the last non-whitespace byte before the
/// closing brace, so the result stays a well-formed object.
fn splice_point(content: &str) -> Option<(usize, bool)> {
    let parsed: Value = serde_json::from_str(content).ok()?;
    let has_entries = !parsed.as_object()?.is_empty();
    let close = content.rfind('}')?;
    let pos = content[..close].trim_end().len();
    Some((pos, has_entries))
}

/// `  "code": "value"` lines joined with `,\n`, keys and values JSON-escaped.
fn render_entries(entries: &LedgerEntries) -> Result<String, LedgerError> {
    let mut lines = Vec::with_capacity(entries.len());
    for (code, value) in entries {
        let k = serde_json::to_string(code).map_err(|e| LedgerError::Encode(e.to_string()))?;
        let v = serde_json::to_string(value).map_err(|e| LedgerError::Encode(e.to_string()))?;
        lines.push(format!("  {k}: {v}"));
    }
    Ok(lines.join(",\n"))
}

/// Write `bytes` at `pos`, then cut the file just past them.
///
/// The old closing brace stays on disk until the new tail has covered it.
fn overwrite_from(f: &mut File, pos: u64, bytes: &[u8]) -> std::io::Result<()> {
    write_at(f, pos, bytes)?;
    f.set_len(pos + bytes.len() as u64)?;
    f.sync_data()
}

fn write_at(f: &mut File, pos: u64, bytes: &[u8]) -> std::io::Result<()> {
    f.seek(SeekFrom::Start(pos))?;
    f.write_all(bytes)
}

fn write_and_sync(f: &mut File, bytes: &[u8]) -> std::io::Result<()> {
    f.write_all(bytes)?;
    f.sync_data()
}

/// `len` lowercase ASCII letters drawn from v4 UUID randomness.
fn random_suffix(len: usize) -> String {
    let mut out = String::with_capacity(len);
    while out.len() < len {
        for b in Uuid::new_v4().as_bytes() {
            if out.len() == len {
                break;
            }
            out.push((b'a' + b % 26) as char);
        }
    }
    out
}
