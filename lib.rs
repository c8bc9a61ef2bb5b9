// Copyright 2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The process 1 supervisor of a single-use grading virtual machine.
//!
//! The supervisor prepares the guest filesystem, reads a short control script and runs each of
//! its lines as either the trusted master identity or the unprivileged worker identity. Between
//! two lines every other process is killed and every System V IPC object is removed.

#![cfg(unix)]

#[macro_use]
extern crate log;

pub mod config;
pub mod control;
pub mod error;
pub mod logger;
pub mod shutdown;
pub mod tokenize;

pub mod platform {
    #[cfg(target_os="linux")]
    pub use self::linux::{bootstrap, ipc, Reaper};
    pub use self::unix::process::{self, ExitStatus, Launcher, Process};

    #[cfg(target_os="linux")]
    pub mod linux;
    pub mod unix;
}

pub use config::{Config, DiskSize, Identity, StreamPolicy};
pub use control::{Command, ControlScript, Launch, Privilege, Reap};
pub use error::{Error, ParseError};
pub use tokenize::ArgumentVector;
