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

//! The narrow contract between the mailbox model and the wire protocol.

use std::fmt;

use super::uid::Uid;
use crate::imap::syntax::FetchEntry;
use crate::support::error::Error;

/// A sequence-number range. `end` of `None` means `*`, i.e., the last
/// message in the mailbox.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeqRange {
    pub start: u32,
    pub end: Option<u32>,
}

impl SeqRange {
    /// `1:*`, every message in the mailbox.
    pub fn all() -> Self {
        SeqRange {
            start: 1,
            end: None,
        }
    }
}

impl fmt::Display for SeqRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.end {
            Some(end) if end == self.start => write!(f, "{}", self.start),
            Some(end) => write!(f, "{}:{}", self.start, end),
            None => write!(f, "{}:*", self.start),
        }
    }
}

/// Which part of a message a body fetch should return.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SectionSpec {
    /// The whole message (an empty section specifier).
    Full,
    /// Only the named header fields.
    HeaderFields(Vec<String>),
}

impl fmt::Display for SectionSpec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            SectionSpec::Full => Ok(()),
            SectionSpec::HeaderFields(ref fields) => {
                write!(f, "HEADER.FIELDS ({})", fields.join(" "))
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flag {
    Deleted,
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Flag::Deleted => f.write_str("\\Deleted"),
        }
    }
}

/// A blocking connection to one IMAP server.
///
/// Every operation completes (or fails) before returning; implementations
/// never have more than one command in flight. Each failure is reported as
/// the `Error` variant named after the operation.
pub trait Transport {
    fn connect(&mut self, host: &str, port: u16) -> Result<(), Error>;
    fn login(&mut self, user: &str, password: &str) -> Result<(), Error>;
    fn select_mailbox(&mut self, name: &str) -> Result<(), Error>;

    /// Fetch only the UID of every message in `range`.
    fn fetch_identifiers(
        &mut self,
        range: &SeqRange,
    ) -> Result<Vec<FetchEntry>, Error>;

    /// Fetch one body section of the message with the given UID.
    fn fetch_by_identifier(
        &mut self,
        uid: Uid,
        section: &SectionSpec,
    ) -> Result<Vec<FetchEntry>, Error>;

    /// Add `flag` to the message with the given UID.
    fn store_flag(&mut self, uid: Uid, flag: Flag) -> Result<(), Error>;

    /// Permanently remove every message flagged `\Deleted`.
    fn expunge(&mut self) -> Result<(), Error>;

    fn logout(&mut self) -> Result<(), Error>;
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn format_wire_arguments() {
        assert_eq!("1:*", SeqRange::all().to_string());
        assert_eq!(
            "3:9",
            SeqRange {
                start: 3,
                end: Some(9)
            }
            .to_string()
        );
        assert_eq!(
            "4",
            SeqRange {
                start: 4,
                end: Some(4)
            }
            .to_string()
        );

        assert_eq!("", SectionSpec::Full.to_string());
        assert_eq!(
            "HEADER.FIELDS (subject)",
            SectionSpec::HeaderFields(vec!["subject".to_owned()]).to_string()
        );
        assert_eq!("\\Deleted", Flag::Deleted.to_string());
    }
}
