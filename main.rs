// Copyright 2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! `init`: boots the grading guest, runs its control script, then halts.

#[macro_use]
extern crate log;
extern crate vminit;

use vminit::control::{self, ControlScript};
use vminit::platform::bootstrap;
use vminit::platform::{Launcher, Reaper};
use vminit::{logger, shutdown, Config, Error};

use std::io::{self, Write};
use std::process;

fn run(config: &Config) -> Result<(), Error> {
    bootstrap::bootstrap(config)?;

    let mut script = ControlScript::open(&config.control_path)?;
    let mut launcher = Launcher::from_config(config);
    let mut reaper = Reaper::new();
    control::run(&mut script, &mut launcher, &mut reaper)?;
    Ok(())
}

fn main() {
    // Killing every other process is only sane inside the disposable machine.
    if process::id() != 1 {
        let _ = writeln!(io::stderr(), "{}: must run as process 1", logger::PREFIX);
        process::exit(1);
    }

    if let Err(err) = logger::init() {
        let _ = writeln!(io::stderr(), "{}: {}", logger::PREFIX, err);
    }
    info!("init");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => shutdown::die(&err),
    };
    debug!("scratch size {}", config.disk_size);

    match run(&config) {
        Ok(()) => shutdown::halt(),
        Err(err) => shutdown::die(&err),
    }
}
