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

//! Message identifiers and their resolution from fetch responses.

use std::fmt;
use std::num::NonZeroU32;

use crate::imap::syntax::{FetchEntry, MsgAtt};

/// A server-assigned message UID.
///
/// UIDs are never zero; a value of this type is therefore always a real
/// identifier and never a "not found" marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Uid(NonZeroU32);

impl Uid {
    pub fn new(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Uid)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Find the UID carried by one fetch response entry.
///
/// Returns `None` if the entry has no `UID` item (or claims UID 0); such
/// entries can't be tied to a message.
pub fn resolve(entry: &FetchEntry) -> Option<Uid> {
    for att in &entry.atts {
        match *att {
            MsgAtt::Uid(raw) => return Uid::new(raw),
            MsgAtt::Flags(_)
            | MsgAtt::Rfc822Size(_)
            | MsgAtt::InternalDate(_)
            | MsgAtt::Body(_) => continue,
        }
    }

    None
}
