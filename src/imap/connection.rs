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

//! `Transport` over a plain TCP connection to a real IMAP server.

use std::io::{self, BufReader};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use log::{debug, info, warn};

use super::client::{self, Client};
use super::lex::CommandLine;
use super::mailbox_name;
use super::syntax::{FetchEntry, RespCond, Response, ResponseLine};
use crate::mailbox::{Flag, SectionSpec, SeqRange, Transport, Uid};
use crate::support::client_config::ConnectionConfig;
use crate::support::error::Error;

type TcpClient = Client<BufReader<TcpStream>, TcpStream>;

pub struct ImapTransport {
    client: Option<TcpClient>,
    timeout: Option<Duration>,
    mark_seen: bool,
    trace: bool,
}

impl Default for ImapTransport {
    fn default() -> Self {
        ImapTransport::new()
    }
}

impl ImapTransport {
    pub fn new() -> Self {
        ImapTransport::with_config(&ConnectionConfig::default())
    }

    pub fn with_config(config: &ConnectionConfig) -> Self {
        ImapTransport {
            client: None,
            timeout: config.timeout(),
            mark_seen: config.mark_seen,
            trace: false,
        }
    }

    /// Log the whole conversation (except credentials) at `trace` level.
    /// Takes effect on the next `connect`.
    pub fn set_trace(&mut self, trace: bool) {
        self.trace = trace;
    }

    fn open(&self, host: &str, port: u16) -> Result<TcpStream, client::Error> {
        let timeout = match self.timeout {
            Some(timeout) => timeout,
            None => return Ok(TcpStream::connect((host, port))?),
        };

        let mut last_error = io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} did not resolve to any address", host),
        );
        for addr in (host, port).to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(sock) => return Ok(sock),
                Err(e) => {
                    debug!("Connecting to {} failed: {}", addr, e);
                    last_error = e;
                }
            }
        }

        Err(last_error.into())
    }

    fn establish(
        &self,
        host: &str,
        port: u16,
    ) -> Result<TcpClient, client::Error> {
        let sock = self.open(host, port)?;
        sock.set_read_timeout(self.timeout)?;
        sock.set_write_timeout(self.timeout)?;
        let reader = BufReader::new(sock.try_clone()?);
        let trace_prefix = if self.trace {
            Some(format!("{}:{}", host, port))
        } else {
            None
        };

        let mut client = Client::new(reader, sock, trace_prefix);
        let greeting = client.read_one_response()?;
        match greeting.cond() {
            Some(cond)
                if RespCond::Ok == cond.cond
                    || RespCond::Preauth == cond.cond =>
            {
                info!("{}:{} greeting: {}", host, port, cond.quip);
                Ok(client)
            }
            Some(cond) if RespCond::Bye == cond.cond => {
                Err(client::Error::Bye(cond.quip.clone()))
            }
            _ => Err(client::Error::Unexpected(format!(
                "bad greeting: {:?}",
                greeting.response
            ))),
        }
    }

    /// Run `command` to completion and fail unless it completed with `OK`.
    ///
    /// An untagged `BYE` means the server is going away; the connection is
    /// dropped and the command fails even if it was tagged `OK`.
    fn run(
        &mut self,
        command: CommandLine,
    ) -> Result<Vec<ResponseLine>, client::Error> {
        let client = self.client.as_mut().ok_or(client::Error::NotConnected)?;
        let mut responses = match client.command(&command) {
            Ok(responses) => responses,
            Err(e) => {
                self.client = None;
                return Err(e);
            }
        };

        let bye = responses.iter().find_map(|r| match r.cond() {
            Some(cond) if r.tag.is_none() && RespCond::Bye == cond.cond => {
                Some(cond.quip.clone())
            }
            _ => None,
        });
        if let Some(quip) = bye {
            self.client = None;
            if "LOGOUT" != command.verb() {
                return Err(client::Error::Bye(quip));
            }
        }

        match responses.pop() {
            Some(ResponseLine {
                tag: Some(_),
                response: Response::Cond(cond),
            }) => {
                if RespCond::Ok == cond.cond {
                    Ok(responses)
                } else {
                    Err(client::Error::Rejected {
                        cond: cond.cond,
                        text: cond.quip,
                    })
                }
            }
            other => Err(client::Error::Unexpected(format!(
                "{} completed with {:?}",
                command.verb(),
                other
            ))),
        }
    }

    fn fetch(
        &mut self,
        command: CommandLine,
    ) -> Result<Vec<FetchEntry>, client::Error> {
        Ok(self
            .run(command)?
            .into_iter()
            .filter_map(|r| match r.response {
                Response::Fetch(entry) => Some(entry),
                _ => None,
            })
            .collect())
    }
}

impl Transport for ImapTransport {
    fn connect(&mut self, host: &str, port: u16) -> Result<(), Error> {
        if self.client.is_some() {
            warn!("Replacing existing connection");
            self.client = None;
        }

        self.client =
            Some(self.establish(host, port).map_err(Error::Connection)?);
        Ok(())
    }

    fn login(&mut self, user: &str, password: &str) -> Result<(), Error> {
        self.run(
            CommandLine::new("LOGIN")
                .astring(user)
                .astring(password)
                .censored(),
        )
        .map_err(Error::Authentication)?;
        Ok(())
    }

    fn select_mailbox(&mut self, name: &str) -> Result<(), Error> {
        let wire_name = mailbox_name::to_wire(name);
        self.run(CommandLine::new("SELECT").astring(&wire_name))
            .map_err(Error::Mailbox)?;
        Ok(())
    }

    fn fetch_identifiers(
        &mut self,
        range: &SeqRange,
    ) -> Result<Vec<FetchEntry>, Error> {
        self.fetch(
            CommandLine::new("FETCH")
                .verbatim(&range.to_string())
                .verbatim("(UID)"),
        )
        .map_err(Error::Fetch)
    }

    fn fetch_by_identifier(
        &mut self,
        uid: Uid,
        section: &SectionSpec,
    ) -> Result<Vec<FetchEntry>, Error> {
        let body = if self.mark_seen { "BODY" } else { "BODY.PEEK" };
        self.fetch(
            CommandLine::new("UID FETCH")
                .verbatim(&uid.to_string())
                .verbatim(&format!("(UID {}[{}])", body, section)),
        )
        .map_err(Error::Fetch)
    }

    fn store_flag(&mut self, uid: Uid, flag: Flag) -> Result<(), Error> {
        self.run(
            CommandLine::new("UID STORE")
                .verbatim(&uid.to_string())
                .verbatim(&format!("+FLAGS.SILENT ({})", flag)),
        )
        .map_err(Error::Store)?;
        Ok(())
    }

    fn expunge(&mut self) -> Result<(), Error> {
        self.run(CommandLine::new("EXPUNGE"))
            .map_err(Error::Expunge)?;
        Ok(())
    }

    fn logout(&mut self) -> Result<(), Error> {
        if self.client.is_none() {
            return Ok(());
        }

        let result = self.run(CommandLine::new("LOGOUT"));
        self.client = None;
        result.map_err(Error::Logout)?;
        Ok(())
    }
}
