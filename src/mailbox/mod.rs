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

//! The in-memory model of one selected mailbox.

pub mod header;
mod message;
mod session;
mod transport;
mod uid;

#[cfg(test)]
pub(crate) mod test_transport;

pub use self::message::{Deleted, Message};
pub use self::session::{Refresh, Session, SessionState};
pub use self::transport::{Flag, SectionSpec, SeqRange, Transport};
pub use self::uid::{resolve as resolve_uid, Uid};
