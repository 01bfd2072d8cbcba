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

//! An in-memory `Transport` standing in for an IMAP server in tests.

use std::cell::RefCell;
use std::rc::Rc;

use super::transport::{Flag, SectionSpec, SeqRange, Transport};
use super::uid::Uid;
use crate::imap::client;
use crate::imap::syntax::{FetchEntry, MsgAtt, MsgAttBody, RespCond};
use crate::support::error::Error;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Connect(String, u16),
    Login(String),
    SelectMailbox(String),
    FetchIdentifiers(SeqRange),
    FetchByIdentifier(u32, SectionSpec),
    StoreFlag(u32, Flag),
    Expunge,
    Logout,
}

#[derive(Debug)]
struct StoredMessage {
    uid: u32,
    headers: Vec<(String, String)>,
    text: String,
    deleted: bool,
}

#[derive(Debug, Default)]
struct State {
    messages: Vec<StoredMessage>,
    calls: Vec<Call>,
    identifier_override: Option<Vec<FetchEntry>>,
    failing_sections: Vec<(u32, SectionSpec)>,
    fail_connect: bool,
    fail_login: bool,
    fail_select: bool,
    fail_identifiers: bool,
    fail_store: bool,
    fail_expunge: bool,
    fail_logout: bool,
}

/// Shared handle on the fake server state, kept by the test while a
/// `FakeTransport` is owned by the code under test.
#[derive(Clone, Debug, Default)]
pub struct FakeServer(Rc<RefCell<State>>);

pub struct FakeTransport(Rc<RefCell<State>>);

pub fn rejected(what: &str) -> client::Error {
    client::Error::Rejected {
        cond: RespCond::No,
        text: format!("{} failed", what),
    }
}

impl FakeServer {
    /// Create a server whose mailbox holds `(uid, subject, from, text)`
    /// messages in the given order.
    pub fn with_messages(messages: &[(u32, &str, &str, &str)]) -> Self {
        let server = FakeServer::default();
        server.0.borrow_mut().messages = messages
            .iter()
            .map(|&(uid, subject, from, text)| StoredMessage {
                uid,
                headers: vec![
                    ("Subject".to_owned(), subject.to_owned()),
                    ("From".to_owned(), from.to_owned()),
                ],
                text: text.to_owned(),
                deleted: false,
            })
            .collect();
        server
    }

    pub fn transport(&self) -> FakeTransport {
        FakeTransport(Rc::clone(&self.0))
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.borrow().calls.clone()
    }

    /// The calls made after the most recent `connect`, or all calls if
    /// there never was one.
    pub fn calls_since_connect(&self) -> Vec<Call> {
        let state = self.0.borrow();
        let start = state
            .calls
            .iter()
            .rposition(|c| matches!(*c, Call::Connect(..)))
            .map_or(0, |ix| ix + 1);
        state.calls[start..].to_vec()
    }

    pub fn clear_calls(&self) {
        self.0.borrow_mut().calls.clear();
    }

    /// UIDs of the messages currently in the mailbox.
    pub fn uids(&self) -> Vec<u32> {
        self.0
            .borrow()
            .messages
            .iter()
            .filter(|m| !m.deleted)
            .map(|m| m.uid)
            .collect()
    }

    pub fn strip_header(&self, uid: u32, name: &str) {
        for message in &mut self.0.borrow_mut().messages {
            if uid == message.uid {
                message.headers.retain(|&(ref n, _)| !n.eq_ignore_ascii_case(name));
            }
        }
    }

    /// Make `fetch_identifiers` answer with exactly these entries.
    pub fn override_identifiers(&self, entries: Vec<FetchEntry>) {
        self.0.borrow_mut().identifier_override = Some(entries);
    }

    pub fn fail_section(&self, uid: u32, section: SectionSpec) {
        self.0.borrow_mut().failing_sections.push((uid, section));
    }

    pub fn fail_connect(&self, fail: bool) {
        self.0.borrow_mut().fail_connect = fail;
    }

    pub fn fail_login(&self) {
        self.0.borrow_mut().fail_login = true;
    }

    pub fn fail_select(&self) {
        self.0.borrow_mut().fail_select = true;
    }

    pub fn fail_identifiers(&self) {
        self.0.borrow_mut().fail_identifiers = true;
    }

    pub fn fail_store(&self) {
        self.0.borrow_mut().fail_store = true;
    }

    pub fn fail_expunge(&self) {
        self.0.borrow_mut().fail_expunge = true;
    }

    pub fn fail_logout(&self) {
        self.0.borrow_mut().fail_logout = true;
    }
}

impl FakeTransport {
    fn record(&mut self, call: Call) -> std::cell::RefMut<'_, State> {
        let mut state = self.0.borrow_mut();
        state.calls.push(call);
        state
    }
}

impl Transport for FakeTransport {
    fn connect(&mut self, host: &str, port: u16) -> Result<(), Error> {
        let state = self.record(Call::Connect(host.to_owned(), port));
        if state.fail_connect {
            Err(Error::Connection(rejected("connect")))
        } else {
            Ok(())
        }
    }

    fn login(&mut self, user: &str, _password: &str) -> Result<(), Error> {
        let state = self.record(Call::Login(user.to_owned()));
        if state.fail_login {
            Err(Error::Authentication(rejected("LOGIN")))
        } else {
            Ok(())
        }
    }

    fn select_mailbox(&mut self, name: &str) -> Result<(), Error> {
        let state = self.record(Call::SelectMailbox(name.to_owned()));
        if state.fail_select {
            Err(Error::Mailbox(rejected("SELECT")))
        } else {
            Ok(())
        }
    }

    fn fetch_identifiers(
        &mut self,
        range: &SeqRange,
    ) -> Result<Vec<FetchEntry>, Error> {
        let state = self.record(Call::FetchIdentifiers(*range));
        if state.fail_identifiers {
            return Err(Error::Fetch(rejected("FETCH")));
        }

        if let Some(ref entries) = state.identifier_override {
            return Ok(entries.clone());
        }

        let entries: Vec<FetchEntry> = state
            .messages
            .iter()
            .filter(|m| !m.deleted)
            .enumerate()
            .map(|(ix, m)| FetchEntry {
                seq: ix as u32 + 1,
                atts: vec![MsgAtt::Uid(m.uid)],
            })
            .collect();

        // Like many real servers, refuse `1:*` on an empty mailbox.
        if entries.is_empty() {
            Err(Error::Fetch(client::Error::Rejected {
                cond: RespCond::Bad,
                text: "Invalid sequence set".to_owned(),
            }))
        } else {
            Ok(entries)
        }
    }

    fn fetch_by_identifier(
        &mut self,
        uid: Uid,
        section: &SectionSpec,
    ) -> Result<Vec<FetchEntry>, Error> {
        let state = self.record(Call::FetchByIdentifier(
            uid.get(),
            section.clone(),
        ));
        if state
            .failing_sections
            .iter()
            .any(|&(u, ref s)| u == uid.get() && s == section)
        {
            return Err(Error::Fetch(rejected("UID FETCH")));
        }

        let (ix, message) = match state
            .messages
            .iter()
            .filter(|m| !m.deleted)
            .enumerate()
            .find(|&(_, m)| m.uid == uid.get())
        {
            Some(found) => found,
            None => return Ok(vec![]),
        };

        let data = match *section {
            SectionSpec::Full => {
                let mut data = String::new();
                for &(ref name, ref value) in &message.headers {
                    data.push_str(&format!("{}: {}\r\n", name, value));
                }
                data.push_str("\r\n");
                data.push_str(&message.text);
                data
            }
            SectionSpec::HeaderFields(ref fields) => {
                let mut data = String::new();
                for &(ref name, ref value) in &message.headers {
                    if fields.iter().any(|f| f.eq_ignore_ascii_case(name)) {
                        data.push_str(&format!("{}: {}\r\n", name, value));
                    }
                }
                data.push_str("\r\n");
                data
            }
        };

        Ok(vec![FetchEntry {
            seq: ix as u32 + 1,
            atts: vec![
                MsgAtt::Uid(message.uid),
                MsgAtt::Body(MsgAttBody {
                    section: section.to_string().to_uppercase(),
                    origin: None,
                    data: Some(data.into_bytes()),
                }),
            ],
        }])
    }

    fn store_flag(&mut self, uid: Uid, flag: Flag) -> Result<(), Error> {
        let mut state = self.record(Call::StoreFlag(uid.get(), flag));
        if state.fail_store {
            return Err(Error::Store(rejected("UID STORE")));
        }

        for message in &mut state.messages {
            if uid.get() == message.uid {
                message.deleted = true;
            }
        }
        Ok(())
    }

    fn expunge(&mut self) -> Result<(), Error> {
        let mut state = self.record(Call::Expunge);
        if state.fail_expunge {
            return Err(Error::Expunge(rejected("EXPUNGE")));
        }

        state.messages.retain(|m| !m.deleted);
        Ok(())
    }

    fn logout(&mut self) -> Result<(), Error> {
        let state = self.record(Call::Logout);
        if state.fail_logout {
            Err(Error::Logout(client::Error::Bye("gone".to_owned())))
        } else {
            Ok(())
        }
    }
}
