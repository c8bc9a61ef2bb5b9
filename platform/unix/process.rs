// Copyright 2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Launching commands under the master or worker identity.

use crate::config::{Config, Identity, StreamPolicy};
use crate::control::{Command, Launch, Privilege};
use crate::error::Error;
use crate::platform::unix::check;
use crate::shutdown;

use libc::{c_char, c_int, pid_t};
use std::ffi::CString;
use std::fmt;
use std::io;
use std::os::unix::io::RawFd;
use std::ptr;

/// The complete environment of launched programs. Nothing of the supervisor's own environment
/// reaches them.
pub const ENVIRONMENT: [&str; 3] = ["PATH=/usr/bin:/bin", "LANG=C", "HOME=/tmp"];

const NULL_DEVICE: &str = "/dev/null";

/// Runs control commands, one at a time.
pub struct Launcher {
    master: Identity,
    worker: Identity,
}

impl Launcher {
    pub fn new(master: Identity, worker: Identity) -> Launcher {
        Launcher { master, worker }
    }

    pub fn from_config(config: &Config) -> Launcher {
        Launcher::new(config.master, config.worker)
    }

    pub fn identity(&self, privilege: Privilege) -> &Identity {
        match privilege {
            Privilege::Master => &self.master,
            Privilege::Worker => &self.worker,
        }
    }
}

impl Launch for Launcher {
    fn launch(&mut self, command: &Command, control: Option<RawFd>) -> Result<ExitStatus, Error> {
        let args = command.arguments()?;
        let image = Image::new(args.to_c_strings().map_err(|source| {
            Error::Parse {
                line: command.line,
                source,
            }
        })?);
        let identity = *self.identity(command.privilege);

        let process = spawn(&image, &identity, control)?;
        debug!("step {} is process {}", command.line, process.pid);
        process.wait().map_err(Error::Wait)
    }
}

/// Everything `execve` needs, prepared before forking so the child only makes system calls.
struct Image {
    args: Vec<CString>,
    env: Vec<CString>,
    null_device: CString,
}

impl Image {
    fn new(args: Vec<CString>) -> Image {
        // The constants contain no NUL byte.
        let env = ENVIRONMENT.iter()
                             .filter_map(|entry| CString::new(*entry).ok())
                             .collect();
        Image {
            args,
            env,
            null_device: CString::new(NULL_DEVICE).unwrap_or_default(),
        }
    }
}

/// Forks a child that takes on `identity` and replaces itself with `image`.
///
/// Only this one process is created. The child never returns into the caller: any failure on its
/// side ends it with status 1.
fn spawn(image: &Image, identity: &Identity, control: Option<RawFd>) -> Result<Process, Error> {
    let mut argv: Vec<*const c_char> = image.args.iter().map(|arg| arg.as_ptr()).collect();
    argv.push(ptr::null());
    let mut envp: Vec<*const c_char> = image.env.iter().map(|entry| entry.as_ptr()).collect();
    envp.push(ptr::null());

    let pid = check(unsafe { libc::fork() }).map_err(Error::Fork)?;
    if pid == 0 {
        unsafe {
            enter_child(image, identity, control, &argv, &envp)
        }
    }
    Ok(Process {
        pid,
    })
}

unsafe fn enter_child(image: &Image,
                      identity: &Identity,
                      control: Option<RawFd>,
                      argv: &[*const c_char],
                      envp: &[*const c_char])
                      -> ! {
    // The script is the only thing shared with the supervisor. Close it before anything else.
    if let Some(fd) = control {
        if let Err(err) = check(libc::close(fd)) {
            shutdown::child_die("close control script", err)
        }
    }

    if libc::geteuid() == 0 {
        if let Err(err) = check(libc::setgroups(0, ptr::null())) {
            shutdown::child_die("set groups", err)
        }
    }
    if let Err(err) = check(libc::setgid(identity.gid)) {
        shutdown::child_die("set gid", err)
    }
    if let Err(err) = check(libc::setuid(identity.uid)) {
        shutdown::child_die("set uid", err)
    }
    libc::umask(identity.umask);

    if identity.streams == StreamPolicy::Null {
        if let Err(err) = bind_null_streams(&image.null_device) {
            shutdown::child_die("reopen std streams", err)
        }
    }

    match image.args.first() {
        None => shutdown::child_die("execve", "empty command"),
        Some(program) => {
            let err = exec(program, argv, envp);
            shutdown::child_die(&format!("execve {}", program.to_string_lossy()), err)
        }
    }
}

/// Points standard input, output and error at the null device.
unsafe fn bind_null_streams(null_device: &CString) -> io::Result<()> {
    let fd = check(libc::open(null_device.as_ptr(), libc::O_RDWR))?;
    for target in [libc::STDIN_FILENO, libc::STDOUT_FILENO, libc::STDERR_FILENO] {
        check(libc::dup2(fd, target))?;
    }
    if fd > libc::STDERR_FILENO {
        libc::close(fd);
    }
    Ok(())
}

/// Replaces the process image. Only returns on failure.
unsafe fn exec(program: &CString, argv: &[*const c_char], envp: &[*const c_char]) -> io::Error {
    libc::execve(program.as_ptr(), argv.as_ptr(), envp.as_ptr());
    io::Error::last_os_error()
}

/// A launched child.
#[allow(missing_copy_implementations)]
pub struct Process {
    pub pid: pid_t,
}

impl Process {
    /// Blocks until this process, and no other, terminates.
    pub fn wait(&self) -> io::Result<ExitStatus> {
        let mut stat: c_int = 0;
        loop {
            match check(unsafe { libc::waitpid(self.pid, &mut stat, 0) }) {
                Ok(_) => break,
                Err(ref err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
        Ok(ExitStatus::from_raw(stat))
    }
}

/// How a child ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitStatus {
    /// Normal exit with this status code.
    Code(i32),
    /// Killed by this signal.
    Signal(i32),
}

impl ExitStatus {
    /// Decodes a `waitpid` status of a terminated process.
    pub fn from_raw(stat: c_int) -> ExitStatus {
        if libc::WIFEXITED(stat) {
            ExitStatus::Code(libc::WEXITSTATUS(stat))
        } else {
            ExitStatus::Signal(libc::WTERMSIG(stat))
        }
    }

    #[inline]
    pub fn success(&self) -> bool {
        *self == ExitStatus::Code(0)
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ExitStatus::Code(code) => write!(f, "exited with status {}", code),
            ExitStatus::Signal(signal) => write!(f, "was killed by signal {}", signal),
        }
    }
}
