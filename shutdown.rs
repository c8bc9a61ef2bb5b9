// Copyright 2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The two ways a failure ends: the whole machine halts, or only the current child exits.
//!
//! Nothing is ever retried. The virtual machine is disposable and the host recreates it.

use crate::control::{Command, Privilege};
use crate::error::Error;
use crate::platform::process::ExitStatus;

use std::fmt::Display;
use std::io;

/// Halts the virtual machine.
///
/// Exiting process 1 without halting would leave the machine in an undefined state, so this only
/// falls back to exiting when the kernel refuses to halt, in which case exiting panics the
/// kernel and stops the machine all the same.
pub fn halt() -> ! {
    info!("halting");
    log::logger().flush();
    unsafe {
        libc::reboot(libc::RB_HALT_SYSTEM);
    }
    error!("reboot: {}", io::Error::last_os_error());
    log::logger().flush();
    unsafe {
        libc::_exit(1)
    }
}

/// Reports a fatal error and halts the virtual machine.
pub fn die(error: &Error) -> ! {
    error!("{}", error);
    halt()
}

/// Reports a failure inside a freshly forked child and terminates that child only.
///
/// Uses `_exit` so that nothing the child inherited from the supervisor gets flushed or run
/// twice.
pub fn child_die<E>(what: &str, error: E) -> ! where E: Display {
    error!("{}: {}", what, error);
    log::logger().flush();
    unsafe {
        libc::_exit(1)
    }
}

/// Decides whether the run may continue after a command ended with `status`.
///
/// A master command must exit with status 0. Whatever a worker command does is routine.
pub fn check_step(command: &Command, status: ExitStatus) -> Result<(), Error> {
    match command.privilege {
        Privilege::Worker => {
            debug!("worker step {} {}", command.line, status);
            Ok(())
        }
        Privilege::Master if status.success() => Ok(()),
        Privilege::Master => {
            Err(Error::MasterStep {
                line: command.line,
                program: command.program_name(),
                status,
            })
        }
    }
}
