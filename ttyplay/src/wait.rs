//! The pacing wait between records: a timed multiplex over stdin with
//! drift correction.
//!
//! This is the player's only suspension point. The requested duration is
//! the inter-record delta scaled by the playback speed; any stdin byte
//! ends the wait early so the player stays responsive. Over thousands of
//! short sleeps the kernel's wakeup latency would add up to an audible
//! slowdown, so the pacer keeps a ledger of how much longer than asked
//! each wait actually took and shaves it off the next one.

use std::io::{self, Read};
use std::os::fd::AsFd;
use std::time::Instant;

use nix::errno::Errno;
use nix::poll::{PollFd, PollFlags, ppoll};
use nix::sys::time::TimeSpec;

use ttyrec::timeval::Timeval;

use crate::input::{self, Command};
use crate::player::Speed;
use crate::term;

/// What a wait resolved to: the full scaled delta passed (or input that
/// only adjusted speed/pause state), or a command the playback loop has
/// to act on.
#[derive(Debug)]
pub enum WaitOutcome {
    Elapsed,
    Command(Command),
}

pub struct Pacer {
    /// Whether stdin carries keyboard input. False when the recording is
    /// piped in or stdin is not a terminal; pacing then degrades to plain
    /// sleeping and no keys are read.
    interactive: bool,
    /// How much longer the previous wait took than requested; subtracted
    /// from the next request. Reset whenever input interrupts a wait,
    /// since time spent handling keys is not playback time.
    drift: Timeval,
}

impl Pacer {
    pub fn new(interactive: bool) -> Self {
        Pacer {
            interactive,
            drift: Timeval::ZERO,
        }
    }

    /// Wait out one inter-record delta, scaled by the current speed.
    /// Speed and pause keys are applied to `speed` in place; pausing
    /// blocks here until resumed or another command arrives.
    pub fn wait(&mut self, delta: Timeval, speed: &mut Speed) -> io::Result<WaitOutcome> {
        loop {
            if term::interrupted() {
                return Ok(WaitOutcome::Command(Command::Quit));
            }

            if speed.is_paused() {
                if !self.interactive {
                    return Ok(WaitOutcome::Elapsed);
                }
                if !poll_stdin(None)? {
                    continue;
                }
                self.drift = Timeval::ZERO;
                match read_command()? {
                    Some(Command::TogglePause) => {
                        *speed = speed.toggled();
                        return Ok(WaitOutcome::Elapsed);
                    }
                    Some(Command::SpeedDouble) => *speed = speed.doubled(),
                    Some(Command::SpeedHalve) => *speed = speed.halved(),
                    Some(Command::SpeedReset) => *speed = speed.reset(),
                    Some(cmd) => return Ok(WaitOutcome::Command(cmd)),
                    None => {}
                }
                continue;
            }

            let requested = delta.div_f64(speed.rate());
            let adjusted = adjust_for_drift(requested, self.drift);

            if !self.interactive {
                let start = Instant::now();
                std::thread::sleep(adjusted.to_duration());
                self.drift = Timeval::from_duration(start.elapsed()) - adjusted;
                return Ok(WaitOutcome::Elapsed);
            }

            let start = Instant::now();
            if !poll_stdin(Some(adjusted))? {
                if term::interrupted() {
                    return Ok(WaitOutcome::Command(Command::Quit));
                }
                self.drift = Timeval::from_duration(start.elapsed()) - adjusted;
                return Ok(WaitOutcome::Elapsed);
            }

            self.drift = Timeval::ZERO;
            match read_command()? {
                Some(Command::SpeedDouble) => {
                    *speed = speed.doubled();
                    return Ok(WaitOutcome::Elapsed);
                }
                Some(Command::SpeedHalve) => {
                    *speed = speed.halved();
                    return Ok(WaitOutcome::Elapsed);
                }
                Some(Command::SpeedReset) => {
                    *speed = speed.reset();
                    return Ok(WaitOutcome::Elapsed);
                }
                Some(Command::TogglePause) => {
                    *speed = speed.toggled();
                    // Now paused; loop back into the indefinite wait
                }
                Some(cmd) => return Ok(WaitOutcome::Command(cmd)),
                None => return Ok(WaitOutcome::Elapsed),
            }
        }
    }
}

/// Requested delta minus accumulated drift, clamped non-negative. Any
/// debt larger than the delta itself is forgiven rather than carried.
fn adjust_for_drift(requested: Timeval, drift: Timeval) -> Timeval {
    let adjusted = requested - drift;
    if adjusted.is_negative() {
        Timeval::ZERO
    } else {
        adjusted
    }
}

/// Block until stdin is readable or the timeout passes; `None` blocks
/// indefinitely (the paused state). Returns whether input is available.
/// EINTR reports as no-input so the caller can notice the SIGINT flag.
fn poll_stdin(timeout: Option<Timeval>) -> io::Result<bool> {
    let stdin = io::stdin();
    let mut fds = [PollFd::new(stdin.as_fd(), PollFlags::POLLIN)];
    let spec = timeout.map(|t| TimeSpec::from(t.to_duration()));
    match ppoll(&mut fds, spec, None) {
        Ok(0) => Ok(false),
        Ok(_) => Ok(true),
        Err(Errno::EINTR) => Ok(false),
        Err(e) => Err(io::Error::from(e)),
    }
}

fn read_byte() -> io::Result<Option<u8>> {
    let mut buf = [0u8; 1];
    loop {
        match io::stdin().read(&mut buf) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(buf[0])),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

fn read_command() -> io::Result<Option<Command>> {
    let Some(first) = read_byte()? else {
        return Ok(None);
    };
    Ok(input::decode(first, || read_byte().ok().flatten()))
}
