// Copyright 2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Errors that end the run.
//!
//! Every variant of `Error` is fatal: whoever receives one halts the virtual machine. Failures
//! that only concern one child never become an `Error` in the supervisor; they surface as a
//! failed `ExitStatus`.

use crate::platform::process::ExitStatus;

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// A malformed control line.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    #[error("arguments limit exceeded (at most {limit})")]
    TooManyArguments { limit: usize },
    #[error("unbalanced quotes")]
    UnbalancedQuotes,
    #[error("NUL byte in command")]
    NulByte,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("mount {target}: {source}")]
    Mount { target: PathBuf, source: io::Error },

    #[error("setrlimit: {0}")]
    ResourceLimit(io::Error),

    #[error("disksize: parameter is too long ({len} > {max} characters)")]
    DiskSizeTooLong { len: usize, max: usize },

    #[error("disksize: malformed size parameter {0:?}")]
    DiskSizeMalformed(String),

    #[error("open {path}: {source}")]
    Open { path: PathBuf, source: io::Error },

    #[error("read control script: {0}")]
    Read(io::Error),

    #[error("control line {line} is longer than {max} bytes")]
    LineTooLong { line: usize, max: usize },

    #[error("control line {line}: {source}")]
    Parse { line: usize, source: ParseError },

    #[error("fork: {0}")]
    Fork(io::Error),

    #[error("waitpid: {0}")]
    Wait(io::Error),

    #[error("master step {line} ({program}) {status}")]
    MasterStep { line: usize, program: String, status: ExitStatus },

    #[error("{class} info: {source}")]
    IpcInfo { class: &'static str, source: io::Error },

    #[error("kill stray processes: {0}")]
    Kill(io::Error),
}
