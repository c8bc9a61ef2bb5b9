// Copyright 2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Console logging. Standard error of process 1 is the machine console.

use env_logger::{Builder, Target};
use log::{LevelFilter, SetLoggerError};
use std::io::Write;

/// Prefix of every line, so the host can tell supervisor lines from program output.
pub const PREFIX: &str = "init";

/// Everything the supervisor logs goes to the console. The level is fixed: the host passes no
/// logging configuration.
pub const LEVEL: LevelFilter = LevelFilter::Debug;

/// Installs the console logger. Call once, first thing in `main`.
pub fn init() -> Result<(), SetLoggerError> {
    Builder::new()
        .filter_level(LEVEL)
        .target(Target::Stderr)
        .format(|buf, record| writeln!(buf, "{}: {}", PREFIX, record.args()))
        .try_init()
}
