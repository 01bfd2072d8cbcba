//-
// Copyright (c) 2020, Jason Lingle
//
// This file is part of Postbox.
//
// Postbox is free software: you can  redistribute it and/or modify it under the
// terms of  the GNU General Public  License as published by  the Free Software
// Foundation, either version  3 of the License, or (at  your option) any later
// version.
//
// Postbox is distributed  in the hope that  it will be useful,  but WITHOUT ANY
// WARRANTY; without  even the implied  warranty of MERCHANTABILITY  or FITNESS
// FOR  A PARTICULAR  PURPOSE.  See the  GNU General  Public  License for  more
// details.
//
// You should have received a copy of the GNU General Public License along with
// Postbox. If not, see <http://www.gnu.org/licenses/>.

//! A simple blocking IMAP client at the level of response lines.
//!
//! The client knows how to frame commands (tags, synchronising literals) and
//! how to assemble logical response lines (inline literals), but leaves the
//! meaning of the responses to the caller.

use std::io::{self, BufRead, Read, Write};
use std::str;

use lazy_static::lazy_static;
use log::trace;
use regex::bytes::Regex;
use thiserror::Error;

use super::lex::{CommandLine, Part};
use super::syntax::{RespCond, Response, ResponseLine};

lazy_static! {
    static ref LITERAL_AT_EOL: Regex =
        Regex::new(r#"~?\{([0-9]+)\+?\}\r\n$"#).unwrap();
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("Parse error: {0}")]
    Nom(String),
    #[error("Failed to parse whole response")]
    PartialParse,
    #[error("Server said {cond}: {text}")]
    Rejected { cond: RespCond, text: String },
    #[error("Server closed the connection: {0}")]
    Bye(String),
    #[error("Not connected")]
    NotConnected,
    #[error("Unexpected response: {0}")]
    Unexpected(String),
}

pub struct Client<R, W> {
    read: R,
    write: W,
    trace_prefix: Option<String>,
    next_tag: u64,
}

impl<R: BufRead, W: Write> Client<R, W> {
    /// Create a client over the given streams. If `trace_prefix` is set, the
    /// whole conversation is logged at `trace` level under that prefix.
    pub fn new(read: R, write: W, trace_prefix: Option<String>) -> Self {
        Client {
            read,
            write,
            trace_prefix,
            next_tag: 0,
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> (R, W) {
        (self.read, self.write)
    }

    pub fn read_line_raw(&mut self, dst: &mut Vec<u8>) -> Result<usize, Error> {
        let start = dst.len();
        let nread = self.read.read_until(b'\n', dst)?;
        self.trace(false, "<<[eol]", &dst[start..]);
        Ok(nread)
    }

    pub fn read_data_raw(
        &mut self,
        dst: &mut Vec<u8>,
        n: u32,
    ) -> Result<usize, Error> {
        let start = dst.len();
        let nread = self.read.by_ref().take(n.into()).read_to_end(dst)?;
        self.trace(true, "<<[lit]", &dst[start..]);
        if n as usize > nread {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "Hit EOF before end of literal",
            )));
        }

        Ok(nread)
    }

    /// Read one logical line into `dst`, i.e., a line together with any
    /// literals it announces and the lines following those literals.
    ///
    /// The final CRLF is kept in `dst`.
    pub fn read_logical_line(
        &mut self,
        dst: &mut Vec<u8>,
    ) -> Result<(), Error> {
        loop {
            let nread = self.read_line_raw(dst)?;
            if !dst.ends_with(b"\r\n") {
                return Err(Error::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "Line didn't end with CRLF",
                )));
            }

            let literal_len = LITERAL_AT_EOL
                .captures(&dst[dst.len() - nread..])
                .and_then(|cap| cap.get(1))
                .and_then(|len| str::from_utf8(len.as_bytes()).ok())
                .and_then(|len| len.parse::<u32>().ok());

            match literal_len {
                Some(literal_len) => {
                    self.read_data_raw(dst, literal_len)?;
                }
                None => break,
            }
        }

        Ok(())
    }

    pub fn read_one_response(&mut self) -> Result<ResponseLine, Error> {
        let mut buffer = Vec::new();
        self.read_logical_line(&mut buffer)?;
        parse_line(&buffer[..buffer.len() - 2])
    }

    /// Send `command` and read responses up to and including its tagged
    /// completion, which is always the last element of the result.
    ///
    /// A tagged `NO` or `BAD` is *not* an error at this level.
    pub fn command(
        &mut self,
        command: &CommandLine,
    ) -> Result<Vec<ResponseLine>, Error> {
        let tag = format!("A{}", self.next_tag);
        self.next_tag += 1;

        if command.is_censored() {
            self.trace(
                false,
                ">>[cmd]",
                format!("{} {} <censored>\r\n", tag, command.verb()).as_bytes(),
            );
        }

        let mut responses = Vec::new();
        let mut pending = format!("{} ", tag).into_bytes();
        for part in command.parts() {
            match *part {
                Part::Text(ref text) => {
                    pending.extend_from_slice(text.as_bytes())
                }
                Part::Literal(ref data) => {
                    pending.extend_from_slice(
                        format!("{{{}}}\r\n", data.len()).as_bytes(),
                    );
                    self.send(command, &pending)?;
                    pending.clear();

                    if !self.await_continuation(&tag, &mut responses)? {
                        // The server refused the literal and so the whole
                        // command.
                        return Ok(responses);
                    }

                    if !command.is_censored() {
                        self.trace(true, ">>[lit]", data);
                    }
                    self.write.write_all(data)?;
                }
            }
        }

        pending.extend_from_slice(b"\r\n");
        self.send(command, &pending)?;

        loop {
            let response = self.read_one_response()?;
            let done = self.is_completion(&tag, &response)?;
            responses.push(response);
            if done {
                return Ok(responses);
            }
        }
    }

    fn send(&mut self, command: &CommandLine, data: &[u8]) -> Result<(), Error> {
        if !command.is_censored() {
            self.trace(false, ">>[cmd]", data);
        }
        self.write.write_all(data)?;
        self.write.flush()?;
        Ok(())
    }

    /// Wait for the server to accept a literal. Returns `false` if the server
    /// instead completed the command.
    fn await_continuation(
        &mut self,
        tag: &str,
        responses: &mut Vec<ResponseLine>,
    ) -> Result<bool, Error> {
        loop {
            let response = self.read_one_response()?;
            if let Response::Continuation(_) = response.response {
                return Ok(true);
            }

            let done = self.is_completion(tag, &response)?;
            responses.push(response);
            if done {
                return Ok(false);
            }
        }
    }

    fn is_completion(
        &self,
        tag: &str,
        response: &ResponseLine,
    ) -> Result<bool, Error> {
        match response.tag {
            None => Ok(false),
            Some(ref t) if t == tag => Ok(true),
            Some(ref t) => Err(Error::Unexpected(format!(
                "completion for unknown tag {}",
                t
            ))),
        }
    }

    fn trace(&self, truncate: bool, what: &str, data: &[u8]) {
        let prefix = match self.trace_prefix {
            Some(ref prefix) => prefix,
            None => return,
        };

        if data.is_empty() {
            trace!("{} WIRE {}<empty>", prefix, what);
            return;
        }

        let (data, truncated) = if truncate {
            data.split_at(data.len().min(128))
        } else {
            (data, &[] as &[u8])
        };

        let mut start = 0;
        for split in memchr::memchr_iter(b'\n', data)
            .chain(std::iter::once(data.len() - 1))
        {
            if split < start {
                continue;
            }

            let line = &data[start..=split];
            start = split + 1;
            trace!("{} WIRE {} {}", prefix, what, visible(line));
        }

        if !truncated.is_empty() {
            trace!("{} WIRE {}<{} more bytes>", prefix, what, truncated.len());
        }
    }
}

fn parse_line(line: &[u8]) -> Result<ResponseLine, Error> {
    let (remaining, r) =
        ResponseLine::parse(line).map_err(|e| Error::Nom(format!("{:?}", e)))?;
    if !remaining.is_empty() {
        return Err(Error::PartialParse);
    }

    Ok(r)
}

fn visible(data: &[u8]) -> String {
    let mut vis = String::new();
    for &byte in data {
        match byte {
            b' '..=b'~' => vis.push(byte as char),
            b'\n' => vis.push_str("\\n"),
            b'\r' => vis.push_str("\\r"),
            b => vis.push_str(&format!("\\x{:02X}", b)),
        }
    }
    vis
}
