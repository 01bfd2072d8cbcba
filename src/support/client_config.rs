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

use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 143;
pub const DEFAULT_MAILBOX: &str = "INBOX";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("error reading '{0}': {1}")]
    Io(String, #[source] io::Error),
    #[error("error in config file at '{0}': {1}")]
    Toml(String, #[source] toml::de::Error),
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct ClientConfig {
    /// Where to connect and what to open.
    #[serde(default)]
    pub server: ServerConfig,

    /// Tuning of the connection itself.
    ///
    /// The defaults are reasonable for most servers.
    #[serde(default)]
    pub connection: ConnectionConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// The host name of the IMAP server.
    pub host: String,
    /// The port to connect to. 143 is the standard unencrypted IMAP port.
    pub port: u16,
    /// The user name to log in as.
    ///
    /// If empty, the name of the current UNIX user is used.
    pub user: String,
    /// The mailbox to select after login.
    pub mailbox: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: String::new(),
            port: DEFAULT_PORT,
            user: String::new(),
            mailbox: DEFAULT_MAILBOX.to_owned(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// If non-zero, give up on connecting or waiting for the server after
    /// this many seconds.
    pub timeout_secs: u64,

    /// Whether reading a message body marks it `\Seen` on the server.
    ///
    /// When false, bodies and headers are fetched with `BODY.PEEK`, which
    /// leaves the flags untouched.
    pub mark_seen: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        ConnectionConfig {
            timeout_secs: 0,
            mark_seen: true,
        }
    }
}

impl ConnectionConfig {
    pub fn timeout(&self) -> Option<Duration> {
        if 0 == self.timeout_secs {
            None
        } else {
            Some(Duration::from_secs(self.timeout_secs))
        }
    }
}

impl ClientConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.display().to_string(), e))?;
        toml::from_str(&text)
            .map_err(|e| ConfigError::Toml(path.display().to_string(), e))
    }
}

#[cfg(test)]
mod test {
    use std::io::Write;

    use super::*;

    #[test]
    fn load_full_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[server]
host = "imap.example.com"
port = 1143
user = "azure"
mailbox = "Archive"

[connection]
timeout_secs = 30
mark_seen = false
"#
        )
        .unwrap();

        let config = ClientConfig::load(file.path()).unwrap();
        assert_eq!("imap.example.com", config.server.host);
        assert_eq!(1143, config.server.port);
        assert_eq!("azure", config.server.user);
        assert_eq!("Archive", config.server.mailbox);
        assert_eq!(Some(Duration::from_secs(30)), config.connection.timeout());
        assert!(!config.connection.mark_seen);
    }

    #[test]
    fn missing_values_take_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[server]\nhost = \"localhost\"\n").unwrap();

        let config = ClientConfig::load(file.path()).unwrap();
        assert_eq!("localhost", config.server.host);
        assert_eq!(DEFAULT_PORT, config.server.port);
        assert_eq!("", config.server.user);
        assert_eq!(DEFAULT_MAILBOX, config.server.mailbox);
        assert_eq!(None, config.connection.timeout());
        assert!(config.connection.mark_seen);
    }

    #[test]
    fn bad_config_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[server]\nport = \"not a number\"\n").unwrap();

        let err = ClientConfig::load(file.path()).unwrap_err();
        assert_matches!(ConfigError::Toml(..), err);
        assert!(err
            .to_string()
            .contains(&file.path().display().to_string()));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err =
            ClientConfig::load(&dir.path().join("postbox.toml")).unwrap_err();
        assert_matches!(ConfigError::Io(..), err);
    }
}
