// Copyright 2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Fixed layout of the guest and the one knob the host may turn.

use crate::error::Error;

use libc::{gid_t, mode_t, uid_t};
use std::env;
use std::fmt;
use std::path::PathBuf;

/// Environment variable holding the scratch filesystem size. The kernel passes unknown
/// `key=value` boot parameters to process 1 as environment variables.
pub const DISK_SIZE_VAR: &str = "disksize";

/// Scratch filesystem size used when the host does not pass one.
pub const DEFAULT_DISK_SIZE: &str = "50%";

/// Maximum length of the scratch filesystem size.
pub const DISK_SIZE_MAX_LEN: usize = 10;

/// Per-user process limit.
pub const MAX_PROCESSES: u64 = 100;

/// Maximum length of a control line, newline excluded.
pub const CONTROL_MAX_LEN: usize = 4096;

/// The size of the scratch filesystem, as understood by the `size=` option of tmpfs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiskSize(String);

impl DiskSize {
    /// Validates a size given as `<digits>%` or `<digits>` with an optional `k`, `m`, `g`, `t`,
    /// `p` or `e` suffix. `None` selects the default of half the memory.
    pub fn parse(value: Option<&str>) -> Result<DiskSize, Error> {
        let value = value.unwrap_or(DEFAULT_DISK_SIZE);
        if value.len() > DISK_SIZE_MAX_LEN {
            return Err(Error::DiskSizeTooLong {
                len: value.len(),
                max: DISK_SIZE_MAX_LEN,
            })
        }

        let digits = value.trim_end_matches(|c: char| "%kKmMgGtTpPeE".contains(c));
        let well_formed = !digits.is_empty() &&
            digits.bytes().all(|byte| byte.is_ascii_digit()) &&
            value.len() - digits.len() <= 1;
        if !well_formed {
            return Err(Error::DiskSizeMalformed(value.to_owned()))
        }
        Ok(DiskSize(value.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The mount data string for the scratch tmpfs.
    pub fn tmpfs_options(&self) -> String {
        format!("mode=777,size={}", self.0)
    }
}

impl Default for DiskSize {
    fn default() -> DiskSize {
        DiskSize(DEFAULT_DISK_SIZE.to_owned())
    }
}

impl fmt::Display for DiskSize {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a launched program gets as standard input, output and error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamPolicy {
    /// The supervisor's own streams.
    Inherit,
    /// `/dev/null` for all three.
    Null,
}

/// A principal commands run as.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Identity {
    pub uid: uid_t,
    pub gid: gid_t,
    pub umask: mode_t,
    pub streams: StreamPolicy,
}

impl Identity {
    /// The trusted grading identity. New files are private to it.
    pub const MASTER: Identity = Identity {
        uid: 1,
        gid: 0,
        umask: 0o077,
        streams: StreamPolicy::Inherit,
    };

    /// The identity of the submission. New files are public and it cannot see the
    /// supervisor's streams.
    pub const WORKER: Identity = Identity {
        uid: 2,
        gid: 2,
        umask: 0o000,
        streams: StreamPolicy::Null,
    };
}

/// Everything the supervisor needs to know about its surroundings.
#[derive(Clone, Debug)]
pub struct Config {
    pub disk_size: DiskSize,
    /// The command script, read from the task filesystem.
    pub control_path: PathBuf,
    /// Block device holding the read-only task filesystem.
    pub task_device: PathBuf,
    pub task_mount: PathBuf,
    /// Block device bound to the supervisor's standard input. Master commands read their input
    /// from it.
    pub input_device: PathBuf,
    pub max_processes: u64,
    pub master: Identity,
    pub worker: Identity,
}

impl Config {
    /// Builds the configuration from the process environment.
    pub fn from_env() -> Result<Config, Error> {
        let disk_size = match env::var_os(DISK_SIZE_VAR) {
            None => DiskSize::parse(None)?,
            Some(value) => {
                match value.to_str() {
                    Some(value) => DiskSize::parse(Some(value))?,
                    None => {
                        return Err(Error::DiskSizeMalformed(value.to_string_lossy().into_owned()))
                    }
                }
            }
        };
        Ok(Config {
            disk_size,
            ..Config::default()
        })
    }
}

impl Default for Config {
    fn default() -> Config {
        Config {
            disk_size: DiskSize::default(),
            control_path: PathBuf::from("/task/control"),
            task_device: PathBuf::from("/dev/ubdb"),
            task_mount: PathBuf::from("/task"),
            input_device: PathBuf::from("/dev/ubdc"),
            max_processes: MAX_PROCESSES,
            master: Identity::MASTER,
            worker: Identity::WORKER,
        }
    }
}
