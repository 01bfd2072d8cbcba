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

use thiserror::Error;

use super::sysexits::*;
use crate::imap::client;
use crate::mailbox::{SessionState, Uid};

/// Failures surfaced by the mailbox core.
///
/// Each transport operation has its own variant so that callers can tell
/// which step of the session failed; the wire-level cause is kept as the
/// error source.
#[derive(Error, Debug)]
pub enum Error {
    #[error("couldn't connect to server: {0}")]
    Connection(#[source] client::Error),
    #[error("couldn't log in: {0}")]
    Authentication(#[source] client::Error),
    #[error("mailbox couldn't be selected: {0}")]
    Mailbox(#[source] client::Error),
    #[error("couldn't fetch: {0}")]
    Fetch(#[source] client::Error),
    #[error("couldn't change the flags: {0}")]
    Store(#[source] client::Error),
    #[error("couldn't expunge: {0}")]
    Expunge(#[source] client::Error),
    #[error("couldn't log out: {0}")]
    Logout(#[source] client::Error),
    #[error("{operation} is not possible in the {state} state")]
    OutOfOrder {
        operation: &'static str,
        state: SessionState,
    },
    #[error("no message with UID {0} in the current list")]
    NoSuchMessage(Uid),
}

impl Error {
    /// The exit code a command-line tool should use when dying of this
    /// error.
    pub fn sysexit(&self) -> Sysexit {
        let cause = match *self {
            Error::Connection(ref e)
            | Error::Authentication(ref e)
            | Error::Mailbox(ref e)
            | Error::Fetch(ref e)
            | Error::Store(ref e)
            | Error::Expunge(ref e)
            | Error::Logout(ref e) => e,
            Error::OutOfOrder { .. } => return EX_SOFTWARE,
            Error::NoSuchMessage(_) => return EX_DATAERR,
        };

        match (self, cause) {
            (&Error::Connection(client::Error::Io(_)), _) => EX_UNAVAILABLE,
            (&Error::Authentication(client::Error::Rejected { .. }), _) => {
                EX_NOPERM
            }
            (&Error::Mailbox(client::Error::Rejected { .. }), _) => {
                EX_NOINPUT
            }
            (_, &client::Error::Io(_)) => EX_IOERR,
            _ => EX_PROTOCOL,
        }
    }
}

#[cfg(test)]
mod test {
    use std::io;

    use super::*;
    use crate::imap::syntax::RespCond;

    fn rejected() -> client::Error {
        client::Error::Rejected {
            cond: RespCond::No,
            text: "nope".to_owned(),
        }
    }

    #[test]
    fn sysexits_follow_failed_step() {
        assert_eq!(
            EX_UNAVAILABLE,
            Error::Connection(client::Error::Io(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "refused"
            )))
            .sysexit()
        );
        assert_eq!(EX_NOPERM, Error::Authentication(rejected()).sysexit());
        assert_eq!(EX_NOINPUT, Error::Mailbox(rejected()).sysexit());
        assert_eq!(EX_PROTOCOL, Error::Expunge(rejected()).sysexit());
        assert_eq!(
            EX_IOERR,
            Error::Fetch(client::Error::Io(io::Error::new(
                io::ErrorKind::TimedOut,
                "timed out"
            )))
            .sysexit()
        );
        assert_eq!(
            EX_SOFTWARE,
            Error::OutOfOrder {
                operation: "login",
                state: SessionState::Unconnected,
            }
            .sysexit()
        );
    }

    #[test]
    fn messages_name_operation_and_status() {
        let message = Error::Store(rejected()).to_string();
        assert!(message.starts_with("couldn't change the flags"));
        assert!(message.contains("NO"));
        assert!(message.contains("nope"));
    }
}
