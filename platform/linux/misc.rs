// Copyright 2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Process limits and stray processes.

use crate::platform::unix::check;

use libc::{self, c_int, ECHILD, EINTR, ESRCH};
use std::io;
use std::ptr;

/// Caps the number of processes any single user may own, master and worker alike.
pub fn limit_processes(max: u64) -> io::Result<()> {
    let rlimit = libc::rlimit {
        rlim_cur: max as libc::rlim_t,
        rlim_max: max as libc::rlim_t,
    };
    check(unsafe { libc::setrlimit(libc::RLIMIT_NPROC, &rlimit) })?;
    Ok(())
}

/// Kills every process but the caller and collects them. Returns how many were collected.
///
/// Only sensible as process 1, where every orphan becomes our child: the loop ends once the
/// kernel reports that no child is left. A process forked while the signal was being delivered
/// is caught by the next round.
pub fn kill_all() -> io::Result<usize> {
    let mut collected = 0;
    loop {
        if let Err(err) = check(unsafe { libc::kill(-1, libc::SIGKILL) }) {
            if err.raw_os_error() != Some(ESRCH) {
                return Err(err)
            }
        }

        let result: c_int = unsafe { libc::waitpid(-1, ptr::null_mut(), 0) };
        if result >= 0 {
            collected += 1;
            continue
        }
        let err = io::Error::last_os_error();
        match err.raw_os_error() {
            Some(ECHILD) => return Ok(collected),
            Some(EINTR) => continue,
            _ => return Err(err),
        }
    }
}
