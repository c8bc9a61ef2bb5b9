// Any copyright is dedicated to the Public Domain.
// http://creativecommons.org/publicdomain/zero/1.0/

extern crate libc;
extern crate vminit;

use vminit::config::{DEFAULT_DISK_SIZE, DISK_SIZE_MAX_LEN};
use vminit::platform::bootstrap::mounts;
use vminit::{Config, DiskSize, Error, Identity, StreamPolicy};

#[test]
fn disk_size_defaults_to_half() {
    assert_eq!(DiskSize::parse(None).unwrap().as_str(), DEFAULT_DISK_SIZE);
    assert_eq!(DiskSize::default().as_str(), "50%");
}

#[test]
fn disk_size_accepts_percentages_and_units() {
    for value in ["200%", "1", "512m", "2G", "1234567890"] {
        assert_eq!(DiskSize::parse(Some(value)).unwrap().as_str(), value);
    }
}

#[test]
fn disk_size_rejects_long_values() {
    let value = "12345678901";
    assert_eq!(value.len(), DISK_SIZE_MAX_LEN + 1);
    match DiskSize::parse(Some(value)) {
        Err(Error::DiskSizeTooLong { len: 11, max: 10 }) => {}
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn disk_size_rejects_malformed_values() {
    for value in ["", "%", "50%,exec", "5 0%", "50%%", "-1", "0x10"] {
        match DiskSize::parse(Some(value)) {
            Err(Error::DiskSizeMalformed(ref bad)) if bad == value => {}
            other => panic!("{:?} gave {:?}", value, other),
        }
    }
}

#[test]
fn tmpfs_options() {
    let size = DiskSize::parse(Some("200%")).unwrap();
    assert_eq!(size.tmpfs_options(), "mode=777,size=200%");
}

#[test]
fn identities() {
    let config = Config::default();
    assert_eq!(config.master, Identity::MASTER);
    assert_eq!((config.master.uid, config.master.gid, config.master.umask), (1, 0, 0o077));
    assert_eq!(config.master.streams, StreamPolicy::Inherit);
    assert_eq!((config.worker.uid, config.worker.gid, config.worker.umask), (2, 2, 0));
    assert_eq!(config.worker.streams, StreamPolicy::Null);
    assert_eq!(config.max_processes, 100);
}

#[test]
fn mount_table() {
    let mut config = Config::default();
    config.disk_size = DiskSize::parse(Some("75%")).unwrap();
    let table = mounts(&config);
    let targets: Vec<_> = table.iter().map(|mount| mount.target.to_str().unwrap()).collect();
    assert_eq!(targets, vec!["/proc", "/sys", "/tmp", "/task"]);
    assert_eq!(table[2].data.as_deref(), Some("mode=777,size=75%"));
    assert_eq!(table[3].fstype, "squashfs");
    assert_ne!(table[3].flags & libc::MS_RDONLY, 0);
    assert_eq!(table[0].flags & libc::MS_RDONLY, 0);
}
