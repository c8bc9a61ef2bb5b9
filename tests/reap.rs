// Any copyright is dedicated to the Public Domain.
// http://creativecommons.org/publicdomain/zero/1.0/

// Runs without the test harness: the cleanup kills every process it can signal and removes every
// IPC object it can see, so it only runs inside fresh user, IPC and PID namespaces where the test
// process is process 1 and owns everything.

extern crate libc;
extern crate vminit;

use vminit::control::Reap;
use vminit::platform::ipc::{self, MessageQueues, SemaphoreSets, SharedMemory};
use vminit::platform::linux::misc;
use vminit::platform::{ExitStatus, Process, Reaper};

use std::fs;
use std::io;
use std::panic;

const OBJECTS_PER_CLASS: usize = 3;
const SLEEPERS: usize = 3;

fn enter_namespaces() -> io::Result<()> {
    let (uid, gid) = unsafe { (libc::getuid(), libc::getgid()) };
    let flags = libc::CLONE_NEWUSER | libc::CLONE_NEWIPC | libc::CLONE_NEWPID;
    if unsafe { libc::unshare(flags) } != 0 {
        return Err(io::Error::last_os_error())
    }
    fs::write("/proc/self/setgroups", "deny")?;
    fs::write("/proc/self/uid_map", format!("0 {} 1", uid))?;
    fs::write("/proc/self/gid_map", format!("0 {} 1", gid))?;
    Ok(())
}

fn fork_sleeper() -> libc::pid_t {
    let pid = unsafe { libc::fork() };
    assert!(pid >= 0, "fork failed");
    if pid == 0 {
        loop {
            unsafe {
                libc::pause();
            }
        }
    }
    pid
}

/// Leaves behind a sleeper whose parent is gone, so that process 1 inherits it.
fn fork_orphan() {
    let middle = unsafe { libc::fork() };
    assert!(middle >= 0, "fork failed");
    if middle == 0 {
        fork_sleeper();
        unsafe {
            libc::_exit(0);
        }
    }
    assert_eq!(Process { pid: middle }.wait().unwrap(), ExitStatus::Code(0));
}

fn create_objects() {
    for _ in 0..OBJECTS_PER_CLASS {
        unsafe {
            assert!(libc::shmget(libc::IPC_PRIVATE, 4096, libc::IPC_CREAT | 0o600) >= 0);
            assert!(libc::semget(libc::IPC_PRIVATE, 1, libc::IPC_CREAT | 0o600) >= 0);
            assert!(libc::msgget(libc::IPC_PRIVATE, libc::IPC_CREAT | 0o600) >= 0);
        }
    }
}

fn reap_leaves_nothing_behind() {
    assert_eq!(unsafe { libc::getpid() }, 1);

    create_objects();
    assert_eq!(ipc::live::<SharedMemory>().unwrap().len(), OBJECTS_PER_CLASS);
    assert_eq!(ipc::live::<SemaphoreSets>().unwrap().len(), OBJECTS_PER_CLASS);
    assert_eq!(ipc::live::<MessageQueues>().unwrap().len(), OBJECTS_PER_CLASS);

    let sleepers: Vec<_> = (0..SLEEPERS).map(|_| fork_sleeper()).collect();
    fork_orphan();

    Reaper::new().reap().unwrap();

    assert!(ipc::live::<SharedMemory>().unwrap().is_empty());
    assert!(ipc::live::<SemaphoreSets>().unwrap().is_empty());
    assert!(ipc::live::<MessageQueues>().unwrap().is_empty());

    // Nothing is left to signal, the orphan included, and nothing is left to collect.
    for &pid in &sleepers {
        assert_eq!(unsafe { libc::kill(pid, 0) }, -1);
    }
    assert_eq!(unsafe { libc::kill(-1, 0) }, -1);
    assert_eq!(io::Error::last_os_error().raw_os_error(), Some(libc::ESRCH));
    assert_eq!(misc::kill_all().unwrap(), 0);

    // A second pass over an empty system is harmless.
    Reaper::new().reap().unwrap();
}

pub fn main() {
    if let Err(err) = enter_namespaces() {
        println!("reap: skipped, cannot create namespaces: {}", err);
        return
    }

    // The first child is process 1 of the new PID namespace.
    let pid = unsafe { libc::fork() };
    assert!(pid >= 0, "fork failed");
    if pid == 0 {
        let code = match panic::catch_unwind(reap_leaves_nothing_behind) {
            Ok(()) => 0,
            Err(_) => 1,
        };
        unsafe {
            libc::_exit(code);
        }
    }
    assert_eq!(Process { pid }.wait().unwrap(), ExitStatus::Code(0));
}
