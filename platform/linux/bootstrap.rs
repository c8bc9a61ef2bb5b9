// Copyright 2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! One-time preparation of the guest, before the first command runs.

use crate::config::Config;
use crate::error::Error;
use crate::platform::linux::misc;
use crate::platform::unix::check;

use libc::{self, c_ulong, c_void};
use std::ffi::CString;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::ptr;

const PSEUDO_FS_FLAGS: c_ulong = libc::MS_NODEV | libc::MS_NOSUID | libc::MS_NOEXEC;

/// A filesystem to mount during boot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mount {
    pub source: PathBuf,
    pub target: PathBuf,
    pub fstype: &'static str,
    pub flags: c_ulong,
    pub data: Option<String>,
}

impl Mount {
    pub fn mount(&self) -> Result<(), Error> {
        self.try_mount().map_err(|source| {
            Error::Mount {
                target: self.target.clone(),
                source,
            }
        })
    }

    fn try_mount(&self) -> io::Result<()> {
        let source = path_cstring(&self.source)?;
        let target = path_cstring(&self.target)?;
        let fstype = CString::new(self.fstype)?;
        let data = match self.data {
            Some(ref data) => Some(CString::new(data.as_str())?),
            None => None,
        };
        let data_ptr = data.as_ref().map_or(ptr::null(), |data| data.as_ptr() as *const c_void);
        check(unsafe {
            libc::mount(source.as_ptr(), target.as_ptr(), fstype.as_ptr(), self.flags, data_ptr)
        })?;
        Ok(())
    }
}

/// The filesystems the guest needs, in mount order: `/proc`, `/sys`, the scratch `/tmp` and the
/// read-only task filesystem.
pub fn mounts(config: &Config) -> Vec<Mount> {
    vec![
        Mount {
            source: PathBuf::from("proc"),
            target: PathBuf::from("/proc"),
            fstype: "proc",
            flags: PSEUDO_FS_FLAGS,
            data: None,
        },
        Mount {
            source: PathBuf::from("sys"),
            target: PathBuf::from("/sys"),
            fstype: "sysfs",
            flags: PSEUDO_FS_FLAGS,
            data: None,
        },
        Mount {
            source: PathBuf::from("none"),
            target: PathBuf::from("/tmp"),
            fstype: "tmpfs",
            flags: libc::MS_NODEV | libc::MS_NOSUID,
            data: Some(config.disk_size.tmpfs_options()),
        },
        Mount {
            source: config.task_device.clone(),
            target: config.task_mount.clone(),
            fstype: "squashfs",
            flags: libc::MS_NODEV | libc::MS_NOSUID | libc::MS_RDONLY,
            data: None,
        },
    ]
}

/// Mounts the filesystems, caps the process count and binds standard input to the input device.
pub fn bootstrap(config: &Config) -> Result<(), Error> {
    for mount in mounts(config) {
        mount.mount()?;
        debug!("mounted {} on {}", mount.fstype, mount.target.display());
    }

    misc::limit_processes(config.max_processes).map_err(Error::ResourceLimit)?;

    bind_stdin(&config.input_device).map_err(|source| {
        Error::Open {
            path: config.input_device.clone(),
            source,
        }
    })?;
    Ok(())
}

/// Replaces standard input with `path`, opened read-only.
fn bind_stdin(path: &Path) -> io::Result<()> {
    let path = path_cstring(path)?;
    let fd = check(unsafe { libc::open(path.as_ptr(), libc::O_RDONLY) })?;
    if fd != libc::STDIN_FILENO {
        let result = check(unsafe { libc::dup2(fd, libc::STDIN_FILENO) });
        unsafe {
            libc::close(fd);
        }
        result?;
    }
    Ok(())
}

fn path_cstring(path: &Path) -> io::Result<CString> {
    Ok(CString::new(path.as_os_str().as_bytes())?)
}
