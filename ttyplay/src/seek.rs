//! The seek engine: coarse repositioning to an indexed clear-screen point
//! followed by fine forward replay, plus file and clear-screen jumps.
//!
//! Coarse-then-fine is what keeps a seek visually coherent without a
//! terminal emulator: landing on a clear-screen record guarantees the
//! replayed output rebuilds the whole screen, and the fine phase pushes
//! the state forward to just past the requested time.

use std::io::Write;

use ttyrec::error::Result;
use ttyrec::record::read_record;
use ttyrec::timeval::Timeval;

use crate::player::Player;

/// Grace window for the previous-file key: within this many seconds of
/// entering a file, "previous" means the file before it; after that it
/// means the start of the current one. Without it, one keystroke would
/// skip straight past a file the viewer only just entered.
pub const FILE_SWITCH_GRACE_SECS: i64 = 10;

impl<W: Write> Player<'_, W> {
    /// Coarse seek to `target` elapsed time, then fine replay up to it.
    /// A no-op when playing from stdin. Targets past the end pin to the
    /// last clear-screen; targets before every clear entry pin to the
    /// first one.
    pub fn seek_to_elapsed(&mut self, target: Timeval) -> Result<()> {
        let Some(index) = self.index else {
            return Ok(());
        };

        match index.locate(target) {
            Some(entry) => self.goto_clear(entry)?,
            None => {
                // A session with no clear screens has no chain to walk:
                // backward seeks restart the session, forward seeks just
                // replay ahead from where we are
                if target < self.elapsed {
                    self.restart_position()?;
                }
            }
        }

        self.fine_forward(target)
    }

    /// Forward replay from the current position until the next record
    /// would overshoot `target`. That record is still emitted, so the
    /// screen is current just past the target, but the stream is rewound
    /// to its header and `elapsed` is not advanced: normal playback then
    /// consumes it with its timing intact.
    fn fine_forward(&mut self, target: Timeval) -> Result<()> {
        loop {
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

            if let Some(prev) = self.prev_timestamp {
                let delta = rec.timestamp - prev;
                if self.elapsed + delta > target {
                    self.out.write_all(&rec.payload)?;
                    self.rewind_to(record_start)?;
                    break;
                }
                self.elapsed = self.elapsed + delta;
            }

            self.out.write_all(&rec.payload)?;
            self.prev_timestamp = Some(rec.timestamp);
            self.stream_position = record_start + rec.disk_len();
            self.note_clear(record_start, &rec.payload);
        }
        self.out.flush()?;
        Ok(())
    }

    /// Walk the file chain by `steps`, clamping at both ends, and land at
    /// the target file's first clear screen (or byte 0 when it has none).
    /// A single-step backward jump made within the grace window goes to
    /// the previous file; later it restarts the current one.
    pub fn jump_file(&mut self, steps: i64) -> Result<()> {
        let Some(index) = self.index else {
            return Ok(());
        };

        let mut steps = steps;
        if steps == -1 {
            let in_file = self.elapsed - index.file_base_elapsed(self.current_file);
            if in_file >= Timeval::from_secs(FILE_SWITCH_GRACE_SECS) {
                steps = 0;
            }
        }

        let last = index.files.len() as i64 - 1;
        let target = (self.current_file as i64 + steps).clamp(0, last) as usize;
        self.goto_file_start(target)
    }

    /// Walk the global clear-screen chain by `steps`, clamping at the
    /// ends; crossing a file boundary switches the open stream.
    pub fn jump_clear(&mut self, steps: i64) -> Result<()> {
        let Some(index) = self.index else {
            return Ok(());
        };
        if index.clears.is_empty() {
            return Ok(());
        }

        let last = index.clears.len() as i64 - 1;
        let target = match self.current_clear {
            Some(current) => (current as i64 + steps).clamp(0, last),
            // Before the first entry: stepping forward reaches entry 0
            // first; stepping backward has nowhere to go
            None if steps > 0 => (steps - 1).min(last),
            None => return Ok(()),
        };
        self.goto_clear(target as usize)
    }

    /// Seek to the absolute start of the session.
    pub fn restart(&mut self) -> Result<()> {
        if self.index.is_none() {
            return Ok(());
        }
        self.restart_position()
    }

    /// Seek to the session's final clear-screen entry ("seek to end").
    pub fn seek_to_last_clear(&mut self) -> Result<()> {
        let Some(index) = self.index else {
            return Ok(());
        };
        match index.clears.len().checked_sub(1) {
            Some(last) => self.goto_clear(last),
            None => Ok(()),
        }
    }

    /// Reposition onto a clear-screen entry: switch files if needed, seek
    /// to the containing record and adopt the entry's elapsed time.
    pub(crate) fn goto_clear(&mut self, entry_idx: usize) -> Result<()> {
        let Some(index) = self.index else {
            return Ok(());
        };
        let entry = index.clears[entry_idx];
        self.open_file(entry.file, entry.record_offset)?;
        self.elapsed = entry.elapsed;
        self.current_clear = Some(entry_idx);
        Ok(())
    }

    fn goto_file_start(&mut self, file: usize) -> Result<()> {
        let Some(index) = self.index else {
            return Ok(());
        };
        match index.files[file].first_clear {
            Some(clear) => self.goto_clear(clear),
            None => {
                self.open_file(file, 0)?;
                self.elapsed = index.file_base_elapsed(file);
                self.current_clear = index.last_clear_before_file(file);
                Ok(())
            }
        }
    }

    fn restart_position(&mut self) -> Result<()> {
        self.open_file(0, 0)?;
        self.elapsed = Timeval::ZERO;
        self.current_clear = None;
        Ok(())
    }
}
