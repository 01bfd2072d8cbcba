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

use std::env;
use std::path::PathBuf;

use log::LevelFilter;
use structopt::StructOpt;

use crate::mailbox::Uid;
use crate::support::client_config::ClientConfig;
use crate::support::sysexits::*;

#[derive(StructOpt)]
#[structopt(max_term_width = 80)]
/// Inspect and prune a mailbox on an IMAP server.
pub(super) struct Command {
    #[structopt(flatten)]
    pub(super) common: CommonOptions,
    #[structopt(subcommand)]
    pub(super) action: Action,
}

#[derive(StructOpt)]
pub(super) struct CommonOptions {
    /// The configuration file
    /// [default: ~/.config/postbox/postbox.toml if it exists]
    #[structopt(long, short, parse(from_os_str))]
    pub(super) config: Option<PathBuf>,
    /// The host to connect to
    #[structopt(long)]
    pub(super) host: Option<String>,
    /// The port to connect to [default: 143]
    #[structopt(long, short)]
    pub(super) port: Option<u16>,
    /// The user name to log in as [default: current UNIX user name]
    #[structopt(long, short)]
    pub(super) user: Option<String>,
    /// The mailbox to work on [default: INBOX]
    #[structopt(long, short)]
    pub(super) mailbox: Option<String>,
    /// Dump a trace of the IMAP connection to standard error.
    #[structopt(long)]
    pub(super) trace: bool,
}

#[derive(StructOpt, Debug)]
pub(super) enum Action {
    /// List the UID, sender and subject of every message.
    List,
    /// Print the headers and body of one message.
    Show {
        /// The UID of the message
        #[structopt(parse(try_from_str = parse_uid))]
        uid: Uid,
    },
    /// Delete one message, then list what remains.
    ///
    /// The message is flagged \Deleted and the mailbox is expunged, so any
    /// other message already flagged \Deleted is removed as well.
    Delete {
        /// The UID of the message
        #[structopt(parse(try_from_str = parse_uid))]
        uid: Uid,
    },
}

fn parse_uid(s: &str) -> Result<Uid, String> {
    let raw = s.parse::<u32>().map_err(|e| e.to_string())?;
    Uid::new(raw).ok_or_else(|| "UIDs start at 1".to_owned())
}

pub fn main() {
    // Clap exits with status 1 instead of EX_USAGE if we use the more concise
    // API
    let cmd = Command::from_clap(&match Command::clap().get_matches_safe() {
        Ok(matches) => matches,
        Err(
            e @ clap::Error {
                kind: clap::ErrorKind::HelpDisplayed,
                ..
            },
        )
        | Err(
            e @ clap::Error {
                kind: clap::ErrorKind::VersionDisplayed,
                ..
            },
        ) => {
            println!("{}", e.message);
            return;
        }
        Err(e) => {
            eprintln!("{}", e.message);
            EX_USAGE.exit()
        }
    });

    let Command { common, action } = cmd;
    let config_path = common.config.clone().or_else(default_config_path);
    let mut config = match config_path {
        Some(ref path) => match ClientConfig::load(path) {
            Ok(config) => config,
            Err(e) => crate::die!(EX_CONFIG, "{}", e),
        },
        None => ClientConfig::default(),
    };

    apply_overrides(&mut config, &common);
    if config.server.host.is_empty() {
        crate::die!(
            EX_USAGE,
            "No server given; use --host or set server.host in the \
             configuration file"
        );
    }

    init_log(config_path.as_ref(), common.trace);
    super::remote::main(config, action, common.trace);
}

fn default_config_path() -> Option<PathBuf> {
    let config_home = env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| {
            env::var_os("HOME").map(|h| PathBuf::from(h).join(".config"))
        })?;
    let path = config_home.join("postbox").join("postbox.toml");
    if path.is_file() {
        Some(path)
    } else {
        None
    }
}

fn apply_overrides(config: &mut ClientConfig, common: &CommonOptions) {
    if let Some(ref host) = common.host {
        config.server.host = host.clone();
    }
    if let Some(port) = common.port {
        config.server.port = port;
    }
    if let Some(ref user) = common.user {
        config.server.user = user.clone();
    }
    if let Some(ref mailbox) = common.mailbox {
        config.server.mailbox = mailbox.clone();
    }
}

fn init_log(config_path: Option<&PathBuf>, trace: bool) {
    // An explicit logging configuration wins even over --trace; otherwise
    // everything goes to stderr.
    let log_config_file = config_path
        .and_then(|p| p.parent())
        .map(|dir| dir.join("logging.toml"))
        .filter(|f| f.is_file());

    if let Some(log_config_file) = log_config_file {
        if let Err(e) = log4rs::init_file(
            &log_config_file,
            log4rs::file::Deserializers::new(),
        ) {
            crate::die!(
                EX_CONFIG,
                "Error in logging config at '{}': {}",
                log_config_file.display(),
                e
            );
        }
        return;
    }

    let level = if trace {
        LevelFilter::Trace
    } else {
        LevelFilter::Info
    };
    if let Err(e) = crate::init_simple_log(level) {
        crate::die!(EX_SOFTWARE, "Failed to initialise logging: {}", e);
    }
}
