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

use log::debug;

use super::header::{self, HeaderField};
use super::transport::{Flag, SectionSpec, Transport};
use super::uid::{self, Uid};
use crate::imap::syntax::{FetchEntry, MsgAtt};
use crate::support::error::Error;

/// One message of the selected mailbox.
///
/// The UID is fixed at construction. Sender, subject and body start out
/// empty and are filled in by `set_message_atts`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    uid: Uid,
    from: String,
    subject: String,
    body: String,
}

/// Proof that a message was flagged and expunged on the server. The owning
/// session uses it to invalidate its message list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub struct Deleted {
    pub uid: Uid,
}

impl Message {
    pub fn new(uid: Uid) -> Self {
        Message {
            uid,
            from: String::new(),
            subject: String::new(),
            body: String::new(),
        }
    }

    pub fn uid(&self) -> Uid {
        self.uid
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Return the subject for `"Subject"`, the sender for `"From"`, and the
    /// empty string for any other name, including other spellings of those
    /// two.
    pub fn get_field(&self, name: &str) -> &str {
        match name {
            "Subject" => &self.subject,
            "From" => &self.from,
            _ => "",
        }
    }

    /// Populate body, subject and sender, in that order, with one fetch
    /// each.
    ///
    /// All three fetches are attempted even if one fails; the first failure
    /// is returned and the corresponding attribute stays empty.
    pub fn set_message_atts(
        &mut self,
        transport: &mut dyn Transport,
    ) -> Result<(), Error> {
        let body = self.set_body(transport);
        let subject = self.set_header(transport, HeaderField::Subject);
        let from = self.set_header(transport, HeaderField::From);
        body.and(subject).and(from)
    }

    /// Fetch the whole message and store it as the body.
    ///
    /// If the response carries no section data for this message, the body
    /// stays empty.
    pub fn set_body(
        &mut self,
        transport: &mut dyn Transport,
    ) -> Result<(), Error> {
        let entries =
            transport.fetch_by_identifier(self.uid, &SectionSpec::Full)?;
        match self.section_data(&entries) {
            Some(data) => self.body = String::from_utf8_lossy(data).into_owned(),
            None => debug!("UID {} returned no body", self.uid),
        }
        Ok(())
    }

    /// Fetch one header field and store its value.
    ///
    /// A missing or malformed header leaves the field empty.
    pub fn set_header(
        &mut self,
        transport: &mut dyn Transport,
        field: HeaderField,
    ) -> Result<(), Error> {
        let entries = transport.fetch_by_identifier(
            self.uid,
            &SectionSpec::HeaderFields(vec![field.wire_name().to_owned()]),
        )?;

        let raw = match self.section_data(&entries) {
            Some(data) => String::from_utf8_lossy(data).into_owned(),
            None => {
                debug!("UID {} returned no {} header data", self.uid, field);
                return Ok(());
            }
        };

        match header::parse_value(&raw) {
            Ok(value) => match field {
                HeaderField::Subject => self.subject = value,
                HeaderField::From => self.from = value,
            },
            Err(e) => debug!("UID {} {} header: {}", self.uid, field, e),
        }

        Ok(())
    }

    /// Flag this message `\Deleted` and expunge the mailbox.
    ///
    /// This does not touch the session's message list; the caller must
    /// treat every `Message` it holds as stale once this succeeds.
    pub fn delete_from_mailbox(
        &self,
        transport: &mut dyn Transport,
    ) -> Result<Deleted, Error> {
        transport.store_flag(self.uid, Flag::Deleted)?;
        transport.expunge()?;
        Ok(Deleted { uid: self.uid })
    }

    /// Find the first body section in `entries` that belongs to this
    /// message.
    ///
    /// Entries naming a different UID are unsolicited updates about other
    /// messages and are skipped. Entries without any UID are accepted, since
    /// some servers omit it when answering a single-message fetch.
    fn section_data<'a>(&self, entries: &'a [FetchEntry]) -> Option<&'a [u8]> {
        for entry in entries {
            if let Some(other) = uid::resolve(entry) {
                if other != self.uid {
                    debug!(
                        "Ignoring fetch response for UID {} while fetching {}",
                        other, self.uid
                    );
                    continue;
                }
            }

            for att in &entry.atts {
                match *att {
                    MsgAtt::Body(ref body) => {
                        if let Some(ref data) = body.data {
                            return Some(data.as_slice());
                        }
                    }
                    MsgAtt::Uid(_)
                    | MsgAtt::Flags(_)
                    | MsgAtt::Rfc822Size(_)
                    | MsgAtt::InternalDate(_) => (),
                }
            }
        }

        None
    }
}
