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

/// The prefix put in front of session log lines, identifying who is talking
/// to which server and mailbox.
#[derive(Clone, Debug, Default)]
pub struct LogPrefix {
    host: Option<String>,
    user: Option<String>,
    mailbox: Option<String>,
}

impl LogPrefix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_host(&mut self, host: &str) {
        self.host = Some(sanitise(host));
    }

    pub fn set_user(&mut self, user: &str) {
        self.user = Some(sanitise(user));
    }

    pub fn set_mailbox(&mut self, mailbox: &str) {
        self.mailbox = Some(sanitise(mailbox));
    }
}

impl fmt::Display for LogPrefix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "imap")?;
        if self.host.is_none() && self.user.is_none() {
            return Ok(());
        }

        write!(f, "[")?;
        if let Some(ref user) = self.user {
            write!(f, "{}@", user)?;
        }
        write!(f, "{}", self.host.as_deref().unwrap_or("?"))?;
        if let Some(ref mailbox) = self.mailbox {
            write!(f, "/{}", mailbox)?;
        }
        write!(f, "]")
    }
}

fn sanitise(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_control() || ' ' == c { '_' } else { c })
        .collect()
}
