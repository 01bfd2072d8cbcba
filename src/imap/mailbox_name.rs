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

//! Mailbox names on the wire.
//!
//! IMAP4rev1 servers name mailboxes in "modified UTF-7" (RFC 3501 §5.1.3):
//! printable ASCII stands for itself, `&` is written `&-`, and every run of
//! other characters becomes `&`, the modified base64 of its UTF-16BE form,
//! and `-`.

use std::borrow::Cow;

/// Convert a UTF-8 mailbox name into the form the server knows it by.
pub fn to_wire(name: &str) -> Cow<'_, str> {
    if name.bytes().all(|b| is_direct(b) && b'&' != b) {
        return Cow::Borrowed(name);
    }

    let mut wire = String::with_capacity(name.len() * 2);
    let mut indirect_start = None;
    for (ix, ch) in name.char_indices() {
        let direct = ch.is_ascii() && is_direct(ch as u8);
        match (direct, indirect_start) {
            (true, Some(start)) => {
                push_encoded(&mut wire, &name[start..ix]);
                indirect_start = None;
            }
            (false, None) => indirect_start = Some(ix),
            _ => (),
        }

        if direct {
            wire.push(ch);
            if '&' == ch {
                wire.push('-');
            }
        }
    }

    if let Some(start) = indirect_start {
        push_encoded(&mut wire, &name[start..]);
    }

    Cow::Owned(wire)
}

fn push_encoded(dst: &mut String, run: &str) {
    let mut utf16be = Vec::with_capacity(run.len() * 2);
    for unit in run.encode_utf16() {
        utf16be.extend_from_slice(&unit.to_be_bytes());
    }

    dst.push('&');
    dst.push_str(&base64::encode_config(&utf16be, base64::IMAP_MUTF7));
    dst.push('-');
}

fn is_direct(byte: u8) -> bool {
    byte >= b' ' && byte < 0x7F
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ascii_names_pass_through() {
        assert_eq!(Cow::Borrowed("INBOX"), to_wire("INBOX"));
        assert_eq!("Lost and Found", to_wire("Lost and Found"));
        assert_eq!("Lost &- Found", to_wire("Lost & Found"));
        assert_eq!("&-&-", to_wire("&&"));
    }

    #[test]
    fn non_ascii_runs_are_encoded() {
        assert_eq!("Entw&APw-rfe", to_wire("Entwürfe"));
        assert_eq!(
            "~peter/mail/&U,BTFw-/&ZeVnLIqe-",
            to_wire("~peter/mail/台北/日本語")
        );
        assert_eq!("&Jjo-!", to_wire("☺!"));
        assert_eq!("&U,BTF2XlZyyKng-", to_wire("台北日本語"));
        assert_eq!("&AAk-tab", to_wire("\ttab"));
    }
}
