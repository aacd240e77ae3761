//! Player state and the record-by-record playback loop.

use std::io::{self, Read, Seek, SeekFrom, Write};

use ttyrec::error::Result;
use ttyrec::index::SessionIndex;
use ttyrec::reader::{TtyrecReader, open_ttyrec};
use ttyrec::record::read_record;
use ttyrec::timeval::Timeval;

use crate::input::Command;
use crate::term;
use crate::wait::{Pacer, WaitOutcome};

/// Playback rate with pause as an explicit state rather than a sign trick:
/// pausing keeps the multiplier so resume restores it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Speed {
    Running(f64),
    Paused(f64),
}

impl Speed {
    /// The (resume) multiplier, regardless of pause state.
    pub fn rate(&self) -> f64 {
        match self {
            Speed::Running(r) | Speed::Paused(r) => *r,
        }
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, Speed::Paused(_))
    }

    pub fn toggled(self) -> Self {
        match self {
            Speed::Running(r) => Speed::Paused(r),
            Speed::Paused(r) => Speed::Running(r),
        }
    }

    pub fn doubled(self) -> Self {
        self.with_rate(self.rate() * 2.0)
    }

    pub fn halved(self) -> Self {
        self.with_rate(self.rate() / 2.0)
    }

    pub fn reset(self) -> Self {
        self.with_rate(1.0)
    }

    fn with_rate(self, rate: f64) -> Self {
        match self {
            Speed::Running(_) => Speed::Running(rate),
            Speed::Paused(_) => Speed::Paused(rate),
        }
    }
}

/// Where records are read from. Stdin is legal but not seekable, which is
/// why navigation is disabled without an index.
pub enum Source {
    File(TtyrecReader),
    Stdin(io::Stdin),
}

impl Read for Source {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Source::File(r) => r.read(buf),
            Source::Stdin(r) => r.read(buf),
        }
    }
}

impl Source {
    fn seek_to(&mut self, offset: u64) -> io::Result<()> {
        match self {
            Source::File(r) => r.seek(SeekFrom::Start(offset)).map(|_| ()),
            Source::Stdin(_) => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "stdin is not seekable",
            )),
        }
    }
}

/// The single process-wide playback state, threaded explicitly through the
/// loop and the seek engine.
pub struct Player<'i, W: Write> {
    pub(crate) index: Option<&'i SessionIndex>,
    pub(crate) source: Source,
    pub(crate) out: W,
    pub speed: Speed,
    /// Cumulative playback time since the first record of the first file.
    pub elapsed: Timeval,
    pub(crate) current_file: usize,
    /// Most recently passed or landed-on clear-screen entry.
    pub(crate) current_clear: Option<usize>,
    /// Byte offset in the currently open file of the next unread record.
    pub(crate) stream_position: u64,
    pub(crate) prev_timestamp: Option<Timeval>,
    /// Seconds of outstanding user seek request; zero when none.
    pending_seek: f64,
    pacer: Option<Pacer>,
}

impl<'i, W: Write> Player<'i, W> {
    /// Play an indexed sequence of files, starting from the first. `pacer`
    /// is `None` in no-wait mode.
    pub fn over_files(
        index: &'i SessionIndex,
        out: W,
        speed: Speed,
        pacer: Option<Pacer>,
    ) -> Result<Self> {
        let reader = open_ttyrec(&index.files[0].path)?;
        Ok(Player {
            index: Some(index),
            source: Source::File(reader),
            out,
            speed,
            elapsed: Timeval::ZERO,
            current_file: 0,
            current_clear: None,
            stream_position: 0,
            prev_timestamp: None,
            pending_seek: 0.0,
            pacer,
        })
    }

    /// Play a recording piped to stdin. No index, so no navigation.
    pub fn over_stdin(out: W, speed: Speed, pacer: Option<Pacer>) -> Self {
        Player {
            index: None,
            source: Source::Stdin(io::stdin()),
            out,
            speed,
            elapsed: Timeval::ZERO,
            current_file: 0,
            current_clear: None,
            stream_position: 0,
            prev_timestamp: None,
            pending_seek: 0.0,
            pacer,
        }
    }

    /// The playback loop: runs until `q`, SIGINT, or end of the last file.
    pub fn play(&mut self) -> Result<()> {
        loop {
            if term::interrupted() {
                break;
            }

            let record_start = self.stream_position;
            let rec = match read_record(&mut self.source)? {
                Some(r) => r,
                None => {
                    if self.advance_file()? {
                        continue;
                    }
                    break;
                }
            };

            // Pace every record except the first of each file
            if let (Some(prev), Some(pacer)) = (self.prev_timestamp, self.pacer.as_mut()) {
                let delta = rec.timestamp - prev;
                match pacer.wait(delta, &mut self.speed)? {
                    WaitOutcome::Elapsed => {}
                    WaitOutcome::Command(Command::Quit) => break,
                    WaitOutcome::Command(cmd) => {
                        // Navigation moved us; drop the in-hand record and
                        // re-read at the new position
                        self.rewind_to(record_start)?;
                        self.dispatch(cmd)?;
                        continue;
                    }
                }
            }

            self.out.write_all(&rec.payload)?;
            self.out.flush()?;

            if let Some(prev) = self.prev_timestamp {
                self.elapsed = self.elapsed + (rec.timestamp - prev);
            }
            self.prev_timestamp = Some(rec.timestamp);
            self.stream_position = record_start + rec.disk_len();
            self.note_clear(record_start, &rec.payload);
        }
        Ok(())
    }

    fn dispatch(&mut self, cmd: Command) -> Result<()> {
        match cmd {
            Command::NextFile => self.jump_file(1),
            Command::PrevFile => self.jump_file(-1),
            Command::NextClear => self.jump_clear(1),
            Command::PrevClear => self.jump_clear(-1),
            Command::SeekBy(base_secs) => {
                self.pending_seek += base_secs as f64 * self.speed.rate();
                self.apply_pending_seek()
            }
            Command::SeekToStart => self.restart(),
            Command::SeekToEnd => self.seek_to_last_clear(),
            // Speed and pause changes are applied inside the wait; quit
            // terminates the loop before dispatch
            Command::Quit
            | Command::SpeedDouble
            | Command::SpeedHalve
            | Command::SpeedReset
            | Command::TogglePause => Ok(()),
        }
    }

    /// Resolve an outstanding relative seek into a coarse+fine seek
    /// against the absolute elapsed target.
    fn apply_pending_seek(&mut self) -> Result<()> {
        if self.pending_seek == 0.0 {
            return Ok(());
        }
        let mut target = self.elapsed + Timeval::from_secs_f64(self.pending_seek);
        self.pending_seek = 0.0;
        if target.is_negative() {
            // Before the start pins to the first record
            target = Timeval::ZERO;
        }
        self.seek_to_elapsed(target)
    }

    /// EOF rollover: rebind the stream to the next indexed file. Returns
    /// false when there is none (or when playing from stdin).
    pub(crate) fn advance_file(&mut self) -> Result<bool> {
        let Some(index) = self.index else {
            return Ok(false);
        };
        let next = self.current_file + 1;
        if next >= index.files.len() {
            return Ok(false);
        }
        // The first record of the next file contributes a zero delta, so
        // elapsed carries across unchanged
        self.open_file(next, 0)?;
        Ok(true)
    }

    /// Rebind the source to `file` at `offset` and reset in-file state.
    pub(crate) fn open_file(&mut self, file: usize, offset: u64) -> Result<()> {
        let Some(index) = self.index else {
            return Ok(());
        };
        let mut reader = open_ttyrec(&index.files[file].path)?;
        if offset > 0 {
            reader.seek(SeekFrom::Start(offset))?;
        }
        self.source = Source::File(reader);
        self.current_file = file;
        self.stream_position = offset;
        self.prev_timestamp = None;
        Ok(())
    }

    pub(crate) fn rewind_to(&mut self, offset: u64) -> Result<()> {
        self.source.seek_to(offset)?;
        self.stream_position = offset;
        Ok(())
    }

    /// Track the most recently passed clear-screen entry during normal
    /// forward consumption.
    pub(crate) fn note_clear(&mut self, record_offset: u64, payload: &[u8]) {
        let Some(index) = self.index else {
            return;
        };
        if ttyrec::index::find_clear(payload).is_none() {
            return;
        }
        let key = (self.current_file, record_offset);
        let at = index
            .clears
            .partition_point(|c| (c.file, c.record_offset) < key);
        if index
            .clears
            .get(at)
            .is_some_and(|c| (c.file, c.record_offset) == key)
        {
            self.current_clear = Some(at);
        }
    }
}
