// Copyright 2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! System V IPC objects, enumerated through the kernel's per-class tables.
//!
//! Each class answers an `IPC_INFO` query with the highest table index in use. Every index up to
//! and including that one is then queried with the class's `*_STAT` command, which yields the
//! identifier of the object stored there, if any.

use crate::error::Error;
use crate::platform::unix::check;

use libc::{c_int, c_void, IPC_INFO, IPC_RMID, MSG_STAT, SEM_STAT};
use std::io;
use std::ptr;

// `libc` does not export `SHM_STAT` on Linux.
const SHM_STAT: c_int = 13;

/// A class of System V IPC objects.
pub trait IpcClass {
    /// Name used in diagnostics.
    const NAME: &'static str;

    /// The highest index in use in the kernel's table for this class.
    fn max_index() -> io::Result<c_int>;

    /// The identifier of the object at `index`, or `None` if the slot is empty.
    fn describe(index: c_int) -> Option<c_int>;

    /// Removes the object with identifier `id`.
    fn remove(id: c_int) -> io::Result<()>;
}

/// Shared memory segments.
#[allow(missing_copy_implementations)]
pub struct SharedMemory;

/// Semaphore sets.
#[allow(missing_copy_implementations)]
pub struct SemaphoreSets;

/// Message queues.
#[allow(missing_copy_implementations)]
pub struct MessageQueues;

impl IpcClass for SharedMemory {
    const NAME: &'static str = "shared memory";

    fn max_index() -> io::Result<c_int> {
        let mut info = StatBuffer::new();
        check(unsafe { libc::shmctl(0, IPC_INFO, info.as_mut_ptr() as *mut libc::shmid_ds) })
    }

    fn describe(index: c_int) -> Option<c_int> {
        let mut stat = StatBuffer::new();
        check(unsafe { libc::shmctl(index, SHM_STAT, stat.as_mut_ptr() as *mut libc::shmid_ds) })
            .ok()
    }

    fn remove(id: c_int) -> io::Result<()> {
        check(unsafe { libc::shmctl(id, IPC_RMID, ptr::null_mut()) }).map(|_| ())
    }
}

impl IpcClass for SemaphoreSets {
    const NAME: &'static str = "semaphores";

    fn max_index() -> io::Result<c_int> {
        let mut info = StatBuffer::new();
        check(unsafe { libc::semctl(0, 0, IPC_INFO, info.as_mut_ptr()) })
    }

    fn describe(index: c_int) -> Option<c_int> {
        let mut stat = StatBuffer::new();
        check(unsafe { libc::semctl(index, 0, SEM_STAT, stat.as_mut_ptr()) }).ok()
    }

    fn remove(id: c_int) -> io::Result<()> {
        check(unsafe { libc::semctl(id, 0, IPC_RMID, ptr::null_mut::<c_void>()) }).map(|_| ())
    }
}

impl IpcClass for MessageQueues {
    const NAME: &'static str = "message queues";

    fn max_index() -> io::Result<c_int> {
        let mut info = StatBuffer::new();
        check(unsafe { libc::msgctl(0, IPC_INFO, info.as_mut_ptr() as *mut libc::msqid_ds) })
    }

    fn describe(index: c_int) -> Option<c_int> {
        let mut stat = StatBuffer::new();
        check(unsafe { libc::msgctl(index, MSG_STAT, stat.as_mut_ptr() as *mut libc::msqid_ds) })
            .ok()
    }

    fn remove(id: c_int) -> io::Result<()> {
        check(unsafe { libc::msgctl(id, IPC_RMID, ptr::null_mut()) }).map(|_| ())
    }
}

/// Identifiers of every live object of class `C`.
pub fn live<C>() -> Result<Vec<c_int>, Error> where C: IpcClass {
    let max = C::max_index().map_err(|source| {
        Error::IpcInfo {
            class: C::NAME,
            source,
        }
    })?;
    Ok((0..=max).filter_map(C::describe).collect())
}

/// Removes every object of class `C` and returns how many went away.
///
/// An object that vanishes between the lookup and the removal is not an error.
pub fn sweep<C>() -> Result<usize, Error> where C: IpcClass {
    let mut removed = 0;
    for id in live::<C>()? {
        match C::remove(id) {
            Ok(()) => removed += 1,
            Err(err) => debug!("remove {} {}: {}", C::NAME, id, err),
        }
    }
    Ok(removed)
}

/// Room for any of the `*info` and `*id_ds` structures the kernel fills in. Only the return
/// values of the queries are used, never the contents.
#[repr(C, align(8))]
struct StatBuffer([u8; 256]);

impl StatBuffer {
    fn new() -> StatBuffer {
        StatBuffer([0; 256])
    }

    fn as_mut_ptr(&mut self) -> *mut c_void {
        self as *mut StatBuffer as *mut c_void
    }
}
