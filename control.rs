// Copyright 2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The control script and the loop that executes it.
//!
//! The script holds one command per line. A line starting with `!` runs as the worker; any
//! other line runs as the master. After every command, whatever the command left behind is
//! destroyed before the next line is read.

use crate::config::CONTROL_MAX_LEN;
use crate::error::{Error, ParseError};
use crate::platform::process::ExitStatus;
use crate::shutdown;
use crate::tokenize::{self, ArgumentVector};

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::Path;

/// Marks a line that runs unprivileged.
pub const WORKER_MARKER: u8 = b'!';

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Privilege {
    Master,
    Worker,
}

impl fmt::Display for Privilege {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            Privilege::Master => "master",
            Privilege::Worker => "worker",
        })
    }
}

/// One line of the control script.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Command {
    /// 1-based line number in the script.
    pub line: usize,
    pub privilege: Privilege,
    /// The line without its privilege marker.
    pub raw: Vec<u8>,
}

impl Command {
    pub fn parse(line: usize, text: &[u8]) -> Command {
        let (privilege, raw) = match text.split_first() {
            Some((&WORKER_MARKER, rest)) => (Privilege::Worker, rest),
            _ => (Privilege::Master, text),
        };
        Command {
            line,
            privilege,
            raw: raw.to_vec(),
        }
    }

    pub fn arguments(&self) -> Result<ArgumentVector, Error> {
        tokenize::split(&self.raw).map_err(|source| self.parse_error(source))
    }

    /// The executable named by the command, for diagnostics.
    pub fn program_name(&self) -> String {
        match tokenize::split(&self.raw) {
            Ok(args) => args.program().map(|program| String::from_utf8_lossy(program).into_owned())
                            .unwrap_or_default(),
            Err(_) => String::from_utf8_lossy(&self.raw).into_owned(),
        }
    }

    fn parse_error(&self, source: ParseError) -> Error {
        Error::Parse {
            line: self.line,
            source,
        }
    }
}

/// Runs commands. `control` is the script's descriptor, which the child has to close before
/// doing anything else.
pub trait Launch {
    /// Runs the command to completion and returns how it ended.
    fn launch(&mut self, command: &Command, control: Option<RawFd>) -> Result<ExitStatus, Error>;
}

/// Removes everything a command may have left behind.
pub trait Reap {
    fn reap(&mut self) -> Result<(), Error>;
}

/// The open control script.
pub struct ControlScript<R> {
    reader: R,
    fd: Option<RawFd>,
    lines: usize,
}

impl ControlScript<BufReader<File>> {
    pub fn open(path: &Path) -> Result<ControlScript<BufReader<File>>, Error> {
        let file = File::open(path).map_err(|source| {
            Error::Open {
                path: path.to_owned(),
                source,
            }
        })?;
        let fd = file.as_raw_fd();
        Ok(ControlScript {
            reader: BufReader::new(file),
            fd: Some(fd),
            lines: 0,
        })
    }
}

impl<R> ControlScript<R> where R: BufRead {
    /// Wraps a reader with no descriptor of its own, such as an in-memory script.
    pub fn from_reader(reader: R) -> ControlScript<R> {
        ControlScript {
            reader,
            fd: None,
            lines: 0,
        }
    }

    /// The descriptor children must close, if the script has one.
    pub fn fd(&self) -> Option<RawFd> {
        self.fd
    }

    /// Reads the next command, or `None` at the end of the script.
    pub fn next_command(&mut self) -> Result<Option<Command>, Error> {
        let mut text = Vec::new();
        let count = (&mut self.reader)
            .take(CONTROL_MAX_LEN as u64 + 1)
            .read_until(b'\n', &mut text)
            .map_err(Error::Read)?;
        if count == 0 {
            return Ok(None)
        }
        self.lines += 1;

        if text.last() == Some(&b'\n') {
            text.pop();
        }
        if text.len() > CONTROL_MAX_LEN {
            return Err(Error::LineTooLong {
                line: self.lines,
                max: CONTROL_MAX_LEN,
            })
        }
        Ok(Some(Command::parse(self.lines, &text)))
    }
}

/// Executes the whole script and returns the number of commands run.
///
/// A master command that fails ends the loop with `Error::MasterStep` right away, without
/// cleaning up, since the machine is about to halt. Worker outcomes are ignored.
pub fn run<R, L, P>(script: &mut ControlScript<R>, launcher: &mut L, reaper: &mut P)
                    -> Result<usize, Error>
                    where R: BufRead, L: Launch, P: Reap {
    let mut steps = 0;
    while let Some(command) = script.next_command()? {
        info!("step {} ({}): {}", command.line, command.privilege,
              String::from_utf8_lossy(&command.raw).trim());

        let status = launcher.launch(&command, script.fd())?;
        shutdown::check_step(&command, status)?;
        reaper.reap()?;
        steps += 1;
    }
    info!("control script finished after {} steps", steps);
    Ok(steps)
}
