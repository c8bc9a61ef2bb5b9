// Any copyright is dedicated to the Public Domain.
// http://creativecommons.org/publicdomain/zero/1.0/

extern crate vminit;

use vminit::control::{self, Command, ControlScript, Launch, Privilege, Reap};
use vminit::platform::ExitStatus;
use vminit::{Error, ParseError};

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Cursor;
use std::os::unix::io::RawFd;
use std::rc::Rc;

#[derive(Debug, PartialEq)]
enum Event {
    Launch(Privilege, Vec<String>),
    Reap,
}

type Log = Rc<RefCell<Vec<Event>>>;

/// Pretends to run commands: looks the program up in a table of outcomes.
struct FakeLauncher {
    outcomes: HashMap<&'static str, ExitStatus>,
    events: Log,
}

struct FakeReaper {
    events: Log,
}

impl Launch for FakeLauncher {
    fn launch(&mut self, command: &Command, control: Option<RawFd>) -> Result<ExitStatus, Error> {
        assert_eq!(control, None);
        let args = command.arguments()?;
        let args: Vec<String> =
            args.iter().map(|arg| String::from_utf8(arg.clone()).unwrap()).collect();
        let status = args.first()
                         .and_then(|program| self.outcomes.get(program.as_str()).cloned())
                         .unwrap_or(ExitStatus::Code(0));
        self.events.borrow_mut().push(Event::Launch(command.privilege, args));
        Ok(status)
    }
}

impl Reap for FakeReaper {
    fn reap(&mut self) -> Result<(), Error> {
        self.events.borrow_mut().push(Event::Reap);
        Ok(())
    }
}

fn outcomes() -> HashMap<&'static str, ExitStatus> {
    let mut outcomes = HashMap::new();
    outcomes.insert("/fail", ExitStatus::Code(3));
    outcomes.insert("/crash", ExitStatus::Signal(11));
    outcomes
}

/// Runs `script` and returns the result with the launches and cleanups in order.
fn run(script: &str) -> (Result<usize, Error>, Vec<Event>) {
    let events = Log::default();
    let mut script = ControlScript::from_reader(Cursor::new(script.as_bytes().to_vec()));
    let mut launcher = FakeLauncher {
        outcomes: outcomes(),
        events: events.clone(),
    };
    let mut reaper = FakeReaper {
        events: events.clone(),
    };
    let result = control::run(&mut script, &mut launcher, &mut reaper);
    let events = events.replace(Vec::new());
    (result, events)
}

fn launch(privilege: Privilege, args: &[&str]) -> Event {
    Event::Launch(privilege, args.iter().map(|arg| arg.to_string()).collect())
}

#[test]
fn master_and_worker_lines() {
    let (result, events) = run("/bin/setup a\n!/task/prog 'x y'\n/bin/grade\n");
    assert_eq!(result.unwrap(), 3);
    assert_eq!(events, vec![
        launch(Privilege::Master, &["/bin/setup", "a"]),
        Event::Reap,
        launch(Privilege::Worker, &["/task/prog", "x y"]),
        Event::Reap,
        launch(Privilege::Master, &["/bin/grade"]),
        Event::Reap,
    ]);
}

#[test]
fn last_line_without_newline() {
    let (result, events) = run("/a\n/b");
    assert_eq!(result.unwrap(), 2);
    assert_eq!(events.len(), 4);
}

#[test]
fn empty_script() {
    let (result, events) = run("");
    assert_eq!(result.unwrap(), 0);
    assert!(events.is_empty());
}

#[test]
fn failing_master_stops_the_run() {
    let (result, events) = run("/ok\n/fail now\n/never\n");
    match result {
        Err(Error::MasterStep { line: 2, ref program, status: ExitStatus::Code(3) })
            if program == "/fail" => {}
        other => panic!("unexpected {:?}", other),
    }
    // No cleanup after the failed step and nothing after it.
    assert_eq!(events, vec![
        launch(Privilege::Master, &["/ok"]),
        Event::Reap,
        launch(Privilege::Master, &["/fail", "now"]),
    ]);
}

#[test]
fn crashing_master_stops_the_run() {
    let (result, _) = run("/crash\n/never\n");
    match result {
        Err(Error::MasterStep { status: ExitStatus::Signal(11), .. }) => {}
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn failing_worker_is_ignored() {
    let (result, events) = run("!/fail\n!/crash\n/ok\n");
    assert_eq!(result.unwrap(), 3);
    assert_eq!(events, vec![
        launch(Privilege::Worker, &["/fail"]),
        Event::Reap,
        launch(Privilege::Worker, &["/crash"]),
        Event::Reap,
        launch(Privilege::Master, &["/ok"]),
        Event::Reap,
    ]);
}

#[test]
fn parse_errors_are_fatal() {
    let (result, events) = run("/ok\n!/prog \"open\n/never\n");
    match result {
        Err(Error::Parse { line: 2, source: ParseError::UnbalancedQuotes }) => {}
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(events.len(), 2);
}

#[test]
fn long_lines_are_fatal() {
    let fits = format!("/ok {}\n", "x".repeat(4096 - 4));
    let (result, _) = run(&fits);
    assert_eq!(result.unwrap(), 1);

    let too_long = format!("/ok\n/ok {}\n/never\n", "x".repeat(4096 - 3));
    let (result, events) = run(&too_long);
    match result {
        Err(Error::LineTooLong { line: 2, max: 4096 }) => {}
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(events.len(), 2);
}

#[test]
fn marker_is_stripped() {
    let command = Command::parse(7, b"!/bin/echo hi");
    assert_eq!(command.privilege, Privilege::Worker);
    assert_eq!(command.raw, b"/bin/echo hi".to_vec());
    assert_eq!(command.program_name(), "/bin/echo");

    let command = Command::parse(1, b" !/bin/echo");
    assert_eq!(command.privilege, Privilege::Master);
    assert_eq!(command.raw, b" !/bin/echo".to_vec());
}
