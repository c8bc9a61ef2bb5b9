// Copyright 2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Splitting of control lines into arguments.
//!
//! The rules follow shell conventions closely enough for grading scripts:
//!
//!    * Arguments are separated by runs of space, tab, carriage return or newline.
//!
//!    * Single or double quotes make whitespace literal. A quoted run ends at the same quote
//!      character that opened it, and quoted runs may be glued to unquoted text.
//!
//!    * Outside single quotes, `\a \b \f \n \r \t \v \\ \' \"` stand for the usual characters.
//!      A backslash followed by anything else is kept as is, together with that character.
//!
//!    * `""` is an argument of its own, even though it is empty.

use crate::error::ParseError;

use std::ffi::CString;
use std::fmt;
use std::slice;

/// Maximum number of arguments in one command.
pub const MAX_ARGS: usize = 100;

/// The arguments of one command. The first one names the executable.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArgumentVector {
    args: Vec<Vec<u8>>,
}

impl ArgumentVector {
    /// The executable path, if the command is not empty.
    pub fn program(&self) -> Option<&[u8]> {
        self.args.first().map(|arg| arg.as_slice())
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, Vec<u8>> {
        self.args.iter()
    }

    pub fn as_slice(&self) -> &[Vec<u8>] {
        &self.args
    }

    /// Converts the arguments for `execve`. `split()` never lets a NUL byte through, so this
    /// only fails for vectors assembled by hand.
    pub fn to_c_strings(&self) -> Result<Vec<CString>, ParseError> {
        self.args
            .iter()
            .map(|arg| CString::new(arg.clone()).map_err(|_| ParseError::NulByte))
            .collect()
    }
}

impl From<Vec<Vec<u8>>> for ArgumentVector {
    fn from(args: Vec<Vec<u8>>) -> ArgumentVector {
        ArgumentVector { args }
    }
}

impl fmt::Display for ArgumentVector {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (index, arg) in self.args.iter().enumerate() {
            if index > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", String::from_utf8_lossy(arg))?;
        }
        Ok(())
    }
}

/// Splits a command line into at most `MAX_ARGS` arguments.
pub fn split(line: &[u8]) -> Result<ArgumentVector, ParseError> {
    split_with_limit(line, MAX_ARGS)
}

/// Splits a command line into at most `limit` arguments. The error is raised as soon as the
/// first argument over the limit begins.
pub fn split_with_limit(line: &[u8], limit: usize) -> Result<ArgumentVector, ParseError> {
    let mut splitter = Splitter {
        args: Vec::new(),
        field: None,
        limit,
    };
    let mut quote: Option<u8> = None;

    let mut index = 0;
    while index < line.len() {
        let byte = line[index];
        match byte {
            b'\0' => return Err(ParseError::NulByte),
            b' ' | b'\t' | b'\r' | b'\n' => {
                if quote.is_some() {
                    splitter.push(byte)?;
                } else {
                    splitter.finish();
                }
            }
            b'"' | b'\'' => {
                match quote {
                    None => {
                        splitter.begin()?;
                        quote = Some(byte);
                    }
                    Some(open) if open == byte => quote = None,
                    Some(_) => splitter.push(byte)?,
                }
            }
            b'\\' if quote != Some(b'\'') => {
                match line.get(index + 1).and_then(|&next| unescape(next)) {
                    Some(replacement) => {
                        splitter.push(replacement)?;
                        index += 1;
                    }
                    None => splitter.push(byte)?,
                }
            }
            _ => splitter.push(byte)?,
        }
        index += 1;
    }

    if quote.is_some() {
        return Err(ParseError::UnbalancedQuotes)
    }
    splitter.finish();
    Ok(ArgumentVector { args: splitter.args })
}

struct Splitter {
    args: Vec<Vec<u8>>,
    /// The argument being read, or `None` between arguments.
    field: Option<Vec<u8>>,
    limit: usize,
}

impl Splitter {
    fn begin(&mut self) -> Result<(), ParseError> {
        if self.field.is_none() {
            if self.args.len() >= self.limit {
                return Err(ParseError::TooManyArguments { limit: self.limit })
            }
            self.field = Some(Vec::new());
        }
        Ok(())
    }

    fn push(&mut self, byte: u8) -> Result<(), ParseError> {
        self.begin()?;
        if let Some(ref mut field) = self.field {
            field.push(byte);
        }
        Ok(())
    }

    fn finish(&mut self) {
        if let Some(field) = self.field.take() {
            self.args.push(field);
        }
    }
}

fn unescape(byte: u8) -> Option<u8> {
    match byte {
        b'a' => Some(0x07),
        b'b' => Some(0x08),
        b'f' => Some(0x0c),
        b'n' => Some(b'\n'),
        b'r' => Some(b'\r'),
        b't' => Some(b'\t'),
        b'v' => Some(0x0b),
        b'\\' | b'\'' | b'"' => Some(byte),
        _ => None,
    }
}
