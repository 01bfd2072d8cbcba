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

use std::fmt;

use log::{debug, info, warn};

use super::message::Message;
use super::transport::{SeqRange, Transport};
use super::uid::{self, Uid};
use crate::support::error::Error;
use crate::support::log_prefix::LogPrefix;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Unconnected,
    Connected,
    Authenticated,
    Selected,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            SessionState::Unconnected => "unconnected",
            SessionState::Connected => "connected",
            SessionState::Authenticated => "authenticated",
            SessionState::Selected => "selected",
        })
    }
}

/// Receives the notification that a session's message list was thrown away
/// and needs to be rebuilt with `Session::get_messages`.
///
/// The notification is delivered while the session is still borrowed, so the
/// observer can't call back into it. It should instead record the request
/// (set a flag, send on a channel, ...) and let its owner re-list.
pub trait Refresh {
    fn refresh(&mut self);
}

impl<F: FnMut()> Refresh for F {
    fn refresh(&mut self) {
        self()
    }
}

/// A connection to one server with (at most) one selected mailbox, and the
/// messages of that mailbox.
///
/// Operations must happen in the order `connect`, `login`,
/// `select_mailbox`; anything else is rejected with `Error::OutOfOrder`
/// without talking to the server.
pub struct Session<T: Transport> {
    transport: T,
    state: SessionState,
    mailbox: String,
    messages: Vec<Message>,
    refresh: Box<dyn Refresh>,
    log_prefix: LogPrefix,
}

impl<T: Transport> Session<T> {
    pub fn new(transport: T, refresh: impl Refresh + 'static) -> Self {
        Session {
            transport,
            state: SessionState::Unconnected,
            mailbox: String::new(),
            messages: Vec::new(),
            refresh: Box::new(refresh),
            log_prefix: LogPrefix::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The selected mailbox, or the empty string if none is selected.
    pub fn mailbox(&self) -> &str {
        &self.mailbox
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn message(&self, index: usize) -> Option<&Message> {
        self.messages.get(index)
    }

    pub fn find(&self, uid: Uid) -> Option<&Message> {
        self.messages.iter().find(|m| uid == m.uid())
    }

    pub fn connect(&mut self, server: &str, port: u16) -> Result<(), Error> {
        self.require("connect", &[SessionState::Unconnected])?;
        self.log_prefix.set_host(server);
        self.transport.connect(server, port)?;
        self.state = SessionState::Connected;
        info!("{} Connected on port {}", self.log_prefix, port);
        Ok(())
    }

    pub fn login(&mut self, userid: &str, password: &str) -> Result<(), Error> {
        self.require("login", &[SessionState::Connected])?;
        self.transport.login(userid, password)?;
        self.log_prefix.set_user(userid);
        self.state = SessionState::Authenticated;
        info!("{} Login successful", self.log_prefix);
        Ok(())
    }

    /// Select `name` for all further message operations.
    ///
    /// `name` is the UTF-8 name; `ImapTransport` converts it to the modified
    /// UTF-7 the server uses.
    ///
    /// Selecting while another mailbox is selected replaces it. If that
    /// fails, the server has already closed the old mailbox, so the session
    /// falls back to the authenticated state.
    pub fn select_mailbox(&mut self, name: &str) -> Result<(), Error> {
        self.require(
            "select",
            &[SessionState::Authenticated, SessionState::Selected],
        )?;
        self.release_messages();

        if let Err(e) = self.transport.select_mailbox(name) {
            if SessionState::Selected == self.state {
                self.state = SessionState::Authenticated;
                self.mailbox.clear();
            }
            return Err(e);
        }

        self.mailbox = name.to_owned();
        self.log_prefix.set_mailbox(name);
        self.state = SessionState::Selected;
        info!("{} Mailbox selected", self.log_prefix);
        Ok(())
    }

    /// Rebuild the message list from the server and return it.
    ///
    /// This never fails. If the server won't list the mailbox (which is
    /// how many servers answer for an empty one) or no mailbox is selected,
    /// the result is empty. Entries the server returns without a usable UID
    /// are skipped, and messages whose attributes can't be fetched are kept
    /// with those attributes empty.
    pub fn get_messages(&mut self) -> &[Message] {
        self.release_messages();

        if SessionState::Selected != self.state {
            warn!(
                "{} Listing messages while {}; no mailbox to list",
                self.log_prefix, self.state
            );
            return &self.messages;
        }

        let entries = match self.transport.fetch_identifiers(&SeqRange::all())
        {
            Ok(entries) => entries,
            Err(e) => {
                info!("{} No messages listed: {}", self.log_prefix, e);
                return &self.messages;
            }
        };

        self.messages.reserve_exact(entries.len());
        for entry in &entries {
            let uid = match uid::resolve(entry) {
                Some(uid) => uid,
                None => {
                    debug!(
                        "{} Skipping message {} without UID",
                        self.log_prefix, entry.seq
                    );
                    continue;
                }
            };

            let mut message = Message::new(uid);
            if let Err(e) = message.set_message_atts(&mut self.transport) {
                warn!("{} UID {}: {}", self.log_prefix, uid, e);
            }
            self.messages.push(message);
        }

        debug!(
            "{} Listed {} messages",
            self.log_prefix,
            self.messages.len()
        );
        &self.messages
    }

    /// Drop every message the session holds.
    pub fn release_messages(&mut self) {
        self.messages = Vec::new();
    }

    /// Delete the message with the given UID from the server.
    ///
    /// On success every message held by the session is released (the
    /// expunge may have changed any of them) and the refresh observer is
    /// notified exactly once. On failure nothing changes locally.
    pub fn delete_message(&mut self, uid: Uid) -> Result<(), Error> {
        self.require("delete", &[SessionState::Selected])?;

        let message = self
            .messages
            .iter()
            .find(|m| uid == m.uid())
            .ok_or(Error::NoSuchMessage(uid))?;
        let deleted = message.delete_from_mailbox(&mut self.transport)?;
        info!("{} Deleted UID {}", self.log_prefix, deleted.uid);

        self.release_messages();
        self.refresh.refresh();
        Ok(())
    }

    /// Log out and close the connection.
    ///
    /// The session can't be used for anything afterwards except `connect`.
    /// Dropping a connected session does this implicitly.
    pub fn logout(&mut self) -> Result<(), Error> {
        self.release_messages();
        if SessionState::Unconnected == self.state {
            return Ok(());
        }

        self.state = SessionState::Unconnected;
        self.mailbox.clear();
        let result = self.transport.logout();
        self.log_prefix = LogPrefix::new();
        result
    }

    fn require(
        &self,
        operation: &'static str,
        allowed: &[SessionState],
    ) -> Result<(), Error> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(Error::OutOfOrder {
                operation,
                state: self.state,
            })
        }
    }
}

impl<T: Transport> Drop for Session<T> {
    fn drop(&mut self) {
        let prefix = self.log_prefix.to_string();
        if let Err(e) = self.logout() {
            warn!("{} {}", prefix, e);
        }
    }
}
