use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::reader::open_ttyrec;
use crate::record::{HEADER_LEN, read_record};
use crate::timeval::Timeval;

/// The escape sequence that resets the visible terminal (`ESC [ 2 J`).
/// Every record payload containing it is a coherent point to resume
/// playback from, which is what makes seeking possible without a terminal
/// emulator.
pub const CLEAR_SCREEN: [u8; 4] = [0x1B, 0x5B, 0x32, 0x4A];

/// One input file of the session, in command-line order.
#[derive(Debug, Clone, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct FileEntry {
    pub path: PathBuf,
    /// Number of records in the file.
    pub records: u64,
    /// Absolute capture timestamp of the file's first record. `None` for an
    /// empty file.
    pub start_timestamp: Option<Timeval>,
    /// Cumulative elapsed time from the first record of the first file to
    /// the last record of this file.
    pub elapsed_at_end: Timeval,
    /// Index into [`SessionIndex::clears`] of this file's first clear-screen
    /// entry, if it has any.
    pub first_clear: Option<usize>,
    pub last_clear: Option<usize>,
}

/// One clear-screen occurrence. The global chain across all files is the
/// order of the containing `Vec`; neighbours are just adjacent indices.
#[derive(Debug, Clone, Copy, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct ClearEntry {
    /// Index of the owning file in [`SessionIndex::files`].
    pub file: usize,
    /// Byte offset within the file of the header of the record containing
    /// the marker.
    pub record_offset: u64,
    /// Byte offset within the file of the marker itself (diagnostic).
    pub marker_offset: u64,
    /// Cumulative elapsed time from the session start to the containing
    /// record.
    pub elapsed: Timeval,
}

/// Time-addressable index of clear-screen points across a sequence of
/// recordings. Immutable after construction.
#[derive(Debug, Clone, Default, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct SessionIndex {
    pub files: Vec<FileEntry>,
    /// All clear-screen entries in session order; `elapsed` is monotonically
    /// non-decreasing across this chain.
    pub clears: Vec<ClearEntry>,
}

impl SessionIndex {
    /// Total elapsed time of the whole session.
    pub fn duration(&self) -> Timeval {
        self.files
            .last()
            .map(|f| f.elapsed_at_end)
            .unwrap_or(Timeval::ZERO)
    }

    /// Latest clear-screen entry whose elapsed time is at or before
    /// `target`, pinned to the first entry when the target precedes the
    /// whole chain. `None` only when the session has no clear screens.
    pub fn locate(&self, target: Timeval) -> Option<usize> {
        if self.clears.is_empty() {
            return None;
        }
        let at_or_before = self.clears.partition_point(|c| c.elapsed <= target);
        Some(at_or_before.saturating_sub(1))
    }

    /// Elapsed time at which `file` begins (the previous file's end, or zero
    /// for the first file).
    pub fn file_base_elapsed(&self, file: usize) -> Timeval {
        if file == 0 {
            Timeval::ZERO
        } else {
            self.files[file - 1].elapsed_at_end
        }
    }

    /// Last clear-screen entry belonging to any file before `file`.
    pub fn last_clear_before_file(&self, file: usize) -> Option<usize> {
        self.clears
            .partition_point(|c| c.file < file)
            .checked_sub(1)
    }
}

/// Scan every input file once, in order, and build the session index.
///
/// Only offsets and times are retained; file contents are re-read from disk
/// during playback.
pub fn build_index<P: AsRef<Path>>(paths: &[P]) -> Result<SessionIndex> {
    let mut index = SessionIndex::default();
    let mut elapsed = Timeval::ZERO;

    for (file_idx, path) in paths.iter().enumerate() {
        let path = path.as_ref();
        let mut reader = open_ttyrec(path)?;
        let entry = scan_file(
            &mut reader,
            file_idx,
            path.to_path_buf(),
            &mut elapsed,
            &mut index.clears,
        )?;
        index.files.push(entry);
    }

    Ok(index)
}

/// One-pass scan of a single file. `elapsed` carries the cumulative time
/// across files; the first record of each file contributes a zero delta.
fn scan_file<R: Read>(
    reader: &mut R,
    file_idx: usize,
    path: PathBuf,
    elapsed: &mut Timeval,
    clears: &mut Vec<ClearEntry>,
) -> Result<FileEntry> {
    let mut offset = 0u64;
    let mut prev: Option<Timeval> = None;
    let mut start_timestamp = None;
    let mut records = 0u64;
    let mut first_clear = None;
    let mut last_clear = None;

    while let Some(rec) = read_record(reader)? {
        let record_offset = offset;
        offset += rec.disk_len();
        records += 1;

        match prev {
            Some(p) => *elapsed = *elapsed + (rec.timestamp - p),
            None => start_timestamp = Some(rec.timestamp),
        }

        if let Some(pos) = find_clear(&rec.payload) {
            let idx = clears.len();
            clears.push(ClearEntry {
                file: file_idx,
                record_offset,
                marker_offset: record_offset + HEADER_LEN + pos as u64,
                elapsed: *elapsed,
            });
            first_clear.get_or_insert(idx);
            last_clear = Some(idx);
        }

        prev = Some(rec.timestamp);
    }

    Ok(FileEntry {
        path,
        records,
        start_timestamp,
        elapsed_at_end: *elapsed,
        first_clear,
        last_clear,
    })
}

/// Position of the first clear-screen marker in a payload, if any. Later
/// occurrences within the same payload are not navigation points.
pub fn find_clear(payload: &[u8]) -> Option<usize> {
    payload
        .windows(CLEAR_SCREEN.len())
        .position(|w| w == CLEAR_SCREEN)
}
