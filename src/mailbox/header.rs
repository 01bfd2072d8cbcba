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

//! Extraction of a single header value from a `HEADER.FIELDS` fetch.
//!
//! The server answers `BODY[HEADER.FIELDS (subject)]` with the matching
//! header lines followed by the blank line that ends a header block, e.g.
//! `Subject: Hello\r\n\r\n`. If the message has no such header, only the
//! blank line (`\r\n`) comes back.

use std::fmt;

use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeaderField {
    Subject,
    From,
}

impl HeaderField {
    /// The name to put in the fetch request.
    pub fn wire_name(self) -> &'static str {
        match self {
            HeaderField::Subject => "subject",
            HeaderField::From => "from",
        }
    }
}

impl fmt::Display for HeaderField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            HeaderField::Subject => "Subject",
            HeaderField::From => "From",
        })
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderError {
    #[error("no \": \" delimiter in header data (field absent?)")]
    MissingDelimiter,
    #[error("header data not terminated by a blank line")]
    MissingTrailer,
}

/// Extract the value of the first header line in `raw`.
///
/// The value is everything after the first `": "` up to the end of the
/// field. Folded continuation lines are unfolded by removing the CRLF before
/// them; later lines that are not continuations (e.g. a second instance of
/// the same field) are ignored.
pub fn parse_value(raw: &str) -> Result<String, HeaderError> {
    let start = raw.find(": ").ok_or(HeaderError::MissingDelimiter)? + 2;
    let body = raw[start..]
        .strip_suffix("\r\n\r\n")
        .ok_or(HeaderError::MissingTrailer)?;

    let mut lines = body.split("\r\n");
    let mut value = lines.next().unwrap_or_default().to_owned();
    for line in lines {
        if !line.starts_with(' ') && !line.starts_with('\t') {
            break;
        }
        value.push_str(line);
    }

    Ok(value)
}
