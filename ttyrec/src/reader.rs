use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use flate2::read::GzDecoder;

/// A reader that transparently handles both plain ttyrec files and
/// gzip-compressed `.gz` archives of them.
pub enum TtyrecReader {
    File(BufReader<File>),
    Memory(Cursor<Vec<u8>>),
}

impl Read for TtyrecReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            TtyrecReader::File(r) => r.read(buf),
            TtyrecReader::Memory(r) => r.read(buf),
        }
    }
}

impl Seek for TtyrecReader {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        match self {
            TtyrecReader::File(r) => r.seek(pos),
            TtyrecReader::Memory(r) => r.seek(pos),
        }
    }
}

/// Open a ttyrec file (or `.gz`-compressed ttyrec) and return a seekable
/// reader.
///
/// Gzip streams are fully decompressed into memory: the indexer and the
/// seek engine both need random access, and archived recordings are small
/// compared to the video formats this technique is usually applied to.
pub fn open_ttyrec(path: &Path) -> std::io::Result<TtyrecReader> {
    let is_gz = path.extension().is_some_and(|e| e == "gz");

    if is_gz {
        let file = File::open(path)?;
        let mut decoder = GzDecoder::new(file);
        let mut buf = Vec::new();
        decoder.read_to_end(&mut buf)?;
        Ok(TtyrecReader::Memory(Cursor::new(buf)))
    } else {
        let file = File::open(path)?;
        Ok(TtyrecReader::File(BufReader::new(file)))
    }
}
