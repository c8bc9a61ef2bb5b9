// Copyright 2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::control::Reap;
use crate::error::Error;

use self::ipc::{MessageQueues, SemaphoreSets, SharedMemory};

pub mod bootstrap;
pub mod ipc;
pub mod misc;

/// Cleans up after a command: kills every other process, then removes every System V shared
/// memory segment, semaphore set and message queue on the system.
///
/// The sweep covers the whole system rather than what the supervisor saw being created, since
/// the guest creates objects from processes the supervisor never hears about.
#[derive(Debug, Default)]
#[allow(missing_copy_implementations)]
pub struct Reaper;

impl Reaper {
    pub fn new() -> Reaper {
        Reaper
    }
}

impl Reap for Reaper {
    fn reap(&mut self) -> Result<(), Error> {
        let killed = misc::kill_all().map_err(Error::Kill)?;
        let removed = ipc::sweep::<SharedMemory>()? +
                      ipc::sweep::<SemaphoreSets>()? +
                      ipc::sweep::<MessageQueues>()?;
        if killed > 0 || removed > 0 {
            info!("cleanup: collected {} processes, removed {} IPC objects", killed, removed);
        }
        Ok(())
    }
}
