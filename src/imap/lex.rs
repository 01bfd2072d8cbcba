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

//! Utilities for *writing* commands under IMAP's lexical rules.
//!
//! The only real decision made here is which form to use to encode a string
//! argument (atom, quoted string, or literal). We're pretty conservative:
//!
//! - Atom only if all characters are in the set `a-zA-Z0-9?=+/_.-` and the
//!   string is not "NIL".
//!
//! - Quoted string only if it is printable ASCII with no double-quote or
//!   backslash and is less than 100 bytes long.
//!
//! - Literal for everything else. Literals are sent synchronously, i.e., the
//!   client waits for the server's continuation request before sending the
//!   data, since we do not assume `LITERAL+`.

/// One piece of a command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Part {
    Text(String),
    Literal(Vec<u8>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Encoding {
    Atom,
    Quoted,
    Literal,
}

/// A command without its tag, built up argument by argument.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandLine {
    parts: Vec<Part>,
    censored: bool,
}

impl CommandLine {
    pub fn new(verb: &str) -> Self {
        CommandLine {
            parts: vec![Part::Text(verb.to_owned())],
            censored: false,
        }
    }

    /// Append a pre-formatted argument, e.g. a sequence set or a
    /// parenthesised list.
    pub fn verbatim(mut self, s: &str) -> Self {
        self.push_text(" ");
        self.push_text(s);
        self
    }

    /// Append a string argument (`astring` in the formal syntax) in whatever
    /// form can carry it.
    pub fn astring(mut self, s: &str) -> Self {
        self.push_text(" ");
        match choose_encoding(s) {
            Encoding::Atom => self.push_text(s),
            Encoding::Quoted => {
                self.push_text("\"");
                self.push_text(s);
                self.push_text("\"");
            }
            Encoding::Literal => {
                self.parts.push(Part::Literal(s.as_bytes().to_vec()))
            }
        }
        self
    }

    /// Mark the command as carrying credentials, so that it never shows up
    /// in the wire trace.
    pub fn censored(mut self) -> Self {
        self.censored = true;
        self
    }

    pub fn is_censored(&self) -> bool {
        self.censored
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// The first word of the command, for diagnostics.
    pub fn verb(&self) -> &str {
        match self.parts.first() {
            Some(Part::Text(t)) => t.split(' ').next().unwrap_or(""),
            _ => "",
        }
    }

    fn push_text(&mut self, s: &str) {
        if let Some(Part::Text(last)) = self.parts.last_mut() {
            last.push_str(s);
        } else {
            self.parts.push(Part::Text(s.to_owned()));
        }
    }
}

pub fn choose_encoding(s: &str) -> Encoding {
    if is_conservative_atom(s) {
        Encoding::Atom
    } else if s.len() < 100
        && s.bytes().all(|b| b' ' <= b && b <= b'~' && b'"' != b && b'\\' != b)
    {
        Encoding::Quoted
    } else {
        Encoding::Literal
    }
}

fn is_conservative_atom(s: &str) -> bool {
    !s.is_empty()
        && !"nil".eq_ignore_ascii_case(s)
        && s.bytes().all(|b| match b {
            b'a'..=b'z'
            | b'A'..=b'Z'
            | b'0'..=b'9'
            | b'?'
            | b'='
            | b'+'
            | b'/'
            | b'_'
            | b'.'
            | b'-' => true,
            _ => false,
        })
}
