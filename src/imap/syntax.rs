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

//! Parsing of the IMAP responses the client understands.
//!
//! This is a client-side subset of the RFC 3501 formal syntax. Only the
//! response shapes that the mailbox code actually consumes get a structured
//! representation:
//!
//! - Condition responses (`OK`, `NO`, `BAD`, `BYE`, `PREAUTH`), tagged or
//!   untagged, with their optional response code.
//!
//! - `FETCH` responses, whose attribute items become `MsgAtt` values.
//!
//! - Continuation requests.
//!
//! Any other untagged response (`EXISTS`, `FLAGS`, `CAPABILITY`, ...) is kept
//! as raw text in `Response::Other` since the client has no use for it.
//!
//! Input to the parsers is one *logical* line as assembled by the client,
//! i.e., with any literals inlined and without the final CRLF.

use std::fmt;
use std::str;

use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, tag_no_case as kw, take},
    character::complete::digit1,
    combinator::{map, map_opt, opt, rest},
    multi::{fold_many0, separated_list},
    sequence::{delimited, preceded, tuple},
    IResult,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RespCond {
    Ok,
    No,
    Bad,
    Bye,
    Preauth,
}

impl fmt::Display for RespCond {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            RespCond::Ok => "OK",
            RespCond::No => "NO",
            RespCond::Bad => "BAD",
            RespCond::Bye => "BYE",
            RespCond::Preauth => "PREAUTH",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponseLine {
    /// The command tag, or `None` for untagged and continuation responses.
    pub tag: Option<String>,
    pub response: Response,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Response {
    Cond(CondResponse),
    Fetch(FetchEntry),
    Continuation(String),
    Other(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CondResponse {
    pub cond: RespCond,
    /// The bracketed response code, without the brackets.
    pub code: Option<String>,
    /// The human-readable text.
    pub quip: String,
}

/// One `* n FETCH (...)` response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchEntry {
    /// The message sequence number. This is *not* the UID.
    pub seq: u32,
    pub atts: Vec<MsgAtt>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MsgAtt {
    Uid(u32),
    Flags(Vec<String>),
    Rfc822Size(u32),
    InternalDate(String),
    Body(MsgAttBody),
}

/// A `BODY[section]<origin> data` item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MsgAttBody {
    /// The section specifier as echoed by the server, without brackets.
    /// Empty for the whole message.
    pub section: String,
    pub origin: Option<u32>,
    /// `None` if the server sent `NIL`.
    pub data: Option<Vec<u8>>,
}

impl ResponseLine {
    pub fn parse(i: &[u8]) -> IResult<&[u8], Self> {
        alt((continuation_line, untagged_line, tagged_line))(i)
    }

    /// If this is a tagged or untagged condition response, return it.
    pub fn cond(&self) -> Option<&CondResponse> {
        match self.response {
            Response::Cond(ref c) => Some(c),
            _ => None,
        }
    }
}

fn continuation_line(i: &[u8]) -> IResult<&[u8], ResponseLine> {
    map(preceded(tag("+"), rest), |text: &[u8]| ResponseLine {
        tag: None,
        response: Response::Continuation(
            String::from_utf8_lossy(text).trim_start().to_owned(),
        ),
    })(i)
}

fn untagged_line(i: &[u8]) -> IResult<&[u8], ResponseLine> {
    map(
        preceded(
            tag("* "),
            alt((
                map(fetch_entry, Response::Fetch),
                map(cond_response, Response::Cond),
                map(rest, |text: &[u8]| {
                    Response::Other(String::from_utf8_lossy(text).into_owned())
                }),
            )),
        ),
        |response| ResponseLine {
            tag: None,
            response,
        },
    )(i)
}

fn tagged_line(i: &[u8]) -> IResult<&[u8], ResponseLine> {
    map(
        tuple((is_not(" +*\r\n"), tag(" "), cond_response)),
        |(t, _, cond): (&[u8], _, CondResponse)| ResponseLine {
            tag: Some(String::from_utf8_lossy(t).into_owned()),
            response: Response::Cond(cond),
        },
    )(i)
}

fn resp_cond(i: &[u8]) -> IResult<&[u8], RespCond> {
    alt((
        map(kw("OK"), |_| RespCond::Ok),
        map(kw("NO"), |_| RespCond::No),
        map(kw("BAD"), |_| RespCond::Bad),
        map(kw("BYE"), |_| RespCond::Bye),
        map(kw("PREAUTH"), |_| RespCond::Preauth),
    ))(i)
}

// The condition keyword must be the whole first word, so that e.g. `* NOOP`
// is not mistaken for a `NO` response.
fn cond_response(i: &[u8]) -> IResult<&[u8], CondResponse> {
    map_opt(tuple((resp_cond, rest)), |(cond, tail): (RespCond, &[u8])| {
        if tail.is_empty() {
            Some(CondResponse {
                cond,
                code: None,
                quip: String::new(),
            })
        } else if tail.starts_with(b" ") {
            let (code, quip) = split_resp_text(&tail[1..]);
            Some(CondResponse { cond, code, quip })
        } else {
            None
        }
    })(i)
}

fn split_resp_text(text: &[u8]) -> (Option<String>, String) {
    let text = String::from_utf8_lossy(text);
    if text.starts_with('[') {
        if let Some(end) = text.find(']') {
            return (
                Some(text[1..end].to_owned()),
                text[end + 1..].trim_start().to_owned(),
            );
        }
    }

    (None, text.into_owned())
}

fn fetch_entry(i: &[u8]) -> IResult<&[u8], FetchEntry> {
    map(
        tuple((number, kw(" FETCH "), msg_atts)),
        |(seq, _, atts)| FetchEntry { seq, atts },
    )(i)
}

fn msg_atts(i: &[u8]) -> IResult<&[u8], Vec<MsgAtt>> {
    delimited(tag("("), separated_list(tag(" "), msg_att), tag(")"))(i)
}

fn msg_att(i: &[u8]) -> IResult<&[u8], MsgAtt> {
    alt((
        map(preceded(kw("UID "), number), MsgAtt::Uid),
        map(
            delimited(kw("FLAGS ("), separated_list(tag(" "), flag), tag(")")),
            MsgAtt::Flags,
        ),
        map(preceded(kw("RFC822.SIZE "), number), MsgAtt::Rfc822Size),
        map(preceded(kw("INTERNALDATE "), quoted), |raw| {
            MsgAtt::InternalDate(String::from_utf8_lossy(&raw).into_owned())
        }),
        map(msg_att_body, MsgAtt::Body),
    ))(i)
}

fn msg_att_body(i: &[u8]) -> IResult<&[u8], MsgAttBody> {
    map(
        tuple((
            kw("BODY["),
            opt(is_not("]")),
            tag("]"),
            opt(delimited(tag("<"), number, tag(">"))),
            tag(" "),
            nstring,
        )),
        |(_, section, _, origin, _, data)| MsgAttBody {
            section: section
                .map(|s| String::from_utf8_lossy(s).into_owned())
                .unwrap_or_default(),
            origin,
            data,
        },
    )(i)
}

fn flag(i: &[u8]) -> IResult<&[u8], String> {
    map(is_not(" ()\r\n"), |f: &[u8]| {
        String::from_utf8_lossy(f).into_owned()
    })(i)
}

fn number(i: &[u8]) -> IResult<&[u8], u32> {
    map_opt(digit1, |s| {
        str::from_utf8(s).ok().and_then(|s| s.parse::<u32>().ok())
    })(i)
}

fn literal(i: &[u8]) -> IResult<&[u8], &[u8]> {
    let (i, len) = delimited(
        alt((tag("~{"), tag("{"))),
        number,
        alt((tag("+}\r\n"), tag("}\r\n"))),
    )(i)?;
    take(len)(i)
}

fn quoted_char(i: &[u8]) -> IResult<&[u8], &[u8]> {
    preceded(tag("\\"), alt((tag("\\"), tag("\""))))(i)
}

fn quoted_string_content(i: &[u8]) -> IResult<&[u8], &[u8]> {
    alt((quoted_char, is_not("\r\n\"\\")))(i)
}

pub(crate) fn quoted(i: &[u8]) -> IResult<&[u8], Vec<u8>> {
    delimited(
        tag("\""),
        fold_many0(quoted_string_content, Vec::new(), |mut accum, piece| {
            accum.extend_from_slice(piece);
            accum
        }),
        tag("\""),
    )(i)
}

fn nstring(i: &[u8]) -> IResult<&[u8], Option<Vec<u8>>> {
    alt((
        map(kw("NIL"), |_| None),
        map(quoted, Some),
        map(literal, |data: &[u8]| Some(data.to_vec())),
    ))(i)
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse_all(text: &[u8]) -> ResponseLine {
        match ResponseLine::parse(text) {
            Ok((b"", line)) => line,
            Ok((trailing, _)) => panic!(
                "Didn't parse all of `{}`, `{}` remained",
                String::from_utf8_lossy(text),
                String::from_utf8_lossy(trailing)
            ),
            Err(e) => panic!(
                "Failed to parse `{}`: {:?}",
                String::from_utf8_lossy(text),
                e
            ),
        }
    }

    fn fetch(text: &[u8]) -> FetchEntry {
        match parse_all(text).response {
            Response::Fetch(entry) => entry,
            r => panic!("Expected FETCH, got {:?}", r),
        }
    }

    #[test]
    fn parse_uid_only_fetch() {
        assert_eq!(
            FetchEntry {
                seq: 3,
                atts: vec![MsgAtt::Uid(42)],
            },
            fetch(b"* 3 FETCH (UID 42)")
        );
    }

    #[test]
    fn parse_fetch_with_body_literal() {
        let entry = fetch(b"* 1 FETCH (UID 5 BODY[] {10}\r\nHello\r\nyou)");
        assert_eq!(1, entry.seq);
        assert_eq!(
            vec![
                MsgAtt::Uid(5),
                MsgAtt::Body(MsgAttBody {
                    section: String::new(),
                    origin: None,
                    data: Some(b"Hello\r\nyou".to_vec()),
                }),
            ],
            entry.atts
        );
    }

    #[test]
    fn parse_fetch_with_header_fields() {
        let entry = fetch(
            b"* 2 FETCH (BODY[HEADER.FIELDS (SUBJECT)] {15}\r\n\
              Subject: Hi\r\n\r\n UID 7)",
        );
        assert_eq!(
            vec![
                MsgAtt::Body(MsgAttBody {
                    section: "HEADER.FIELDS (SUBJECT)".to_owned(),
                    origin: None,
                    data: Some(b"Subject: Hi\r\n\r\n".to_vec()),
                }),
                MsgAtt::Uid(7),
            ],
            entry.atts
        );
    }

    #[test]
    fn parse_fetch_misc_atts() {
        let entry = fetch(
            b"* 4 FETCH (FLAGS (\\Seen $Junk) RFC822.SIZE 1234 \
              INTERNALDATE \"17-Jul-1996 02:44:25 -0700\" \
              BODY[]<0> \"quoted \\\"body\\\"\" BODY[TEXT] NIL)",
        );
        assert_eq!(
            vec![
                MsgAtt::Flags(vec!["\\Seen".to_owned(), "$Junk".to_owned()]),
                MsgAtt::Rfc822Size(1234),
                MsgAtt::InternalDate("17-Jul-1996 02:44:25 -0700".to_owned()),
                MsgAtt::Body(MsgAttBody {
                    section: String::new(),
                    origin: Some(0),
                    data: Some(b"quoted \"body\"".to_vec()),
                }),
                MsgAtt::Body(MsgAttBody {
                    section: "TEXT".to_owned(),
                    origin: None,
                    data: None,
                }),
            ],
            entry.atts
        );
    }

    #[test]
    fn parse_empty_flags() {
        assert_eq!(
            vec![MsgAtt::Flags(vec![]), MsgAtt::Uid(1)],
            fetch(b"* 1 FETCH (FLAGS () UID 1)").atts
        );
    }

    #[test]
    fn parse_tagged_completion() {
        assert_eq!(
            ResponseLine {
                tag: Some("A12".to_owned()),
                response: Response::Cond(CondResponse {
                    cond: RespCond::Ok,
                    code: Some("READ-WRITE".to_owned()),
                    quip: "SELECT completed".to_owned(),
                }),
            },
            parse_all(b"A12 OK [READ-WRITE] SELECT completed")
        );

        assert_eq!(
            ResponseLine {
                tag: Some("A0".to_owned()),
                response: Response::Cond(CondResponse {
                    cond: RespCond::No,
                    code: None,
                    quip: String::new(),
                }),
            },
            parse_all(b"A0 NO")
        );
    }

    #[test]
    fn parse_untagged_responses() {
        assert_eq!(
            Response::Cond(CondResponse {
                cond: RespCond::Bye,
                code: None,
                quip: "Logging out".to_owned(),
            }),
            parse_all(b"* BYE Logging out").response
        );
        assert_eq!(
            Response::Other("3 EXISTS".to_owned()),
            parse_all(b"* 3 EXISTS").response
        );
        assert_eq!(
            Response::Other("NOOP-ISH thing".to_owned()),
            parse_all(b"* NOOP-ISH thing").response
        );
        assert_eq!(
            Response::Other("FLAGS (\\Seen \\Deleted)".to_owned()),
            parse_all(b"* FLAGS (\\Seen \\Deleted)").response
        );
    }

    #[test]
    fn parse_continuation() {
        assert_eq!(
            ResponseLine {
                tag: None,
                response: Response::Continuation("Ready".to_owned()),
            },
            parse_all(b"+ Ready")
        );
        assert_eq!(
            Response::Continuation(String::new()),
            parse_all(b"+").response
        );
    }

    #[test]
    fn reject_garbage() {
        assert!(ResponseLine::parse(b"").is_err());
        assert!(ResponseLine::parse(b"A1 MAYBE").is_err());
    }
}
