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

use std::cell::Cell;
use std::rc::Rc;

use super::main::Action;
use crate::imap::connection::ImapTransport;
use crate::mailbox::{Message, Session};
use crate::support::client_config::ClientConfig;
use crate::support::error::Error;
use crate::support::sysexits::*;

pub(super) fn main(config: ClientConfig, action: Action, trace: bool) {
    if let Err(e) = main_impl(config, action, trace) {
        crate::die!(e.sysexit(), "Error: {}", e);
    }
}

fn main_impl(
    config: ClientConfig,
    action: Action,
    trace: bool,
) -> Result<(), Error> {
    let user = if config.server.user.is_empty() {
        match nix::unistd::User::from_uid(nix::unistd::getuid()) {
            Ok(Some(u)) => u.name,
            Ok(None) => {
                crate::die!(EX_NOUSER, "No passwd entry for current user")
            }
            Err(e) => crate::die!(
                EX_NOUSER,
                "Failed to look up current UNIX user: {}",
                e
            ),
        }
    } else {
        config.server.user.clone()
    };

    let mut transport = ImapTransport::with_config(&config.connection);
    transport.set_trace(trace);

    let stale = Rc::new(Cell::new(false));
    let mut session = {
        let stale = Rc::clone(&stale);
        Session::new(transport, move || stale.set(true))
    };

    session.connect(&config.server.host, config.server.port)?;

    let password = match rpassword::read_password_from_tty(Some("Password: ")) {
        Ok(p) => p,
        Err(e) => crate::die!(EX_NOINPUT, "Failed to read password: {}", e),
    };
    session.login(&user, &password)?;
    session.select_mailbox(&config.server.mailbox)?;

    match action {
        Action::List => print_list(session.get_messages()),
        Action::Show { uid } => {
            session.get_messages();
            match session.find(uid) {
                Some(message) => print_message(message),
                None => return Err(Error::NoSuchMessage(uid)),
            }
        }
        Action::Delete { uid } => {
            session.get_messages();
            session.delete_message(uid)?;
            if stale.replace(false) {
                print_list(session.get_messages());
            }
        }
    }

    session.logout()
}

fn print_list(messages: &[Message]) {
    if messages.is_empty() {
        println!("No messages");
        return;
    }

    for message in messages {
        println!(
            "{:>8}  {}  {}",
            message.uid(),
            message.get_field("From"),
            message.get_field("Subject")
        );
    }
}

fn print_message(message: &Message) {
    println!("UID:     {}", message.uid());
    println!("From:    {}", message.get_field("From"));
    println!("Subject: {}", message.get_field("Subject"));
    println!();
    print!("{}", message.body());
    if !message.body().ends_with('\n') {
        println!();
    }
}
