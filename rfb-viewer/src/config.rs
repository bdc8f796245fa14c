//! Session configuration.

use crate::errors::ClientError;
use rfb_protocol::messages::types::{
    ENCODING_COPYRECT, ENCODING_CURSOR, ENCODING_RAW, ENCODING_ZRLE,
};
use serde::{Deserialize, Serialize};

/// Everything needed to start a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server hostname or address.
    pub host: String,
    /// Server port, typically 5900 + display number.
    pub port: u16,
    /// Password for VNC authentication; only used when the server asks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Encodings to advertise, most preferred first.
    #[serde(default = "default_encodings")]
    pub encodings: Vec<i32>,
}

fn default_encodings() -> Vec<i32> {
    vec![ENCODING_RAW, ENCODING_COPYRECT, ENCODING_ZRLE, ENCODING_CURSOR]
}

impl Config {
    /// Start building a configuration.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check the configuration is usable before connecting.
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.host.is_empty() {
            return Err(ClientError::Config("host must not be empty".into()));
        }
        if self.port == 0 {
            return Err(ClientError::Config("port must not be zero".into()));
        }
        if self.encodings.is_empty() {
            return Err(ClientError::Config(
                "at least one encoding must be advertised".into(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`Config`].
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    host: Option<String>,
    port: Option<u16>,
    password: Option<String>,
    encodings: Option<Vec<i32>>,
}

impl ConfigBuilder {
    /// Server hostname or address.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Server port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Password for VNC authentication.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Replace the advertised encoding list.
    pub fn encodings(mut self, encodings: Vec<i32>) -> Self {
        self.encodings = Some(encodings);
        self
    }

    /// Finish, validating the result.
    pub fn build(self) -> Result<Config, ClientError> {
        let config = Config {
            host: self.host.unwrap_or_default(),
            port: self.port.unwrap_or(5900),
            password: self.password,
            encodings: self.encodings.unwrap_or_else(default_encodings),
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let config = Config::builder().host("localhost").build().unwrap();
        assert_eq!(config.port, 5900);
        assert_eq!(config.password, None);
        assert_eq!(config.encodings, vec![0, 1, 16, -239]);
    }

    #[test]
    fn empty_host_rejected() {
        assert!(matches!(
            Config::builder().build(),
            Err(ClientError::Config(_))
        ));
    }

    #[test]
    fn zero_port_rejected() {
        assert!(matches!(
            Config::builder().host("h").port(0).build(),
            Err(ClientError::Config(_))
        ));
    }

    #[test]
    fn empty_encodings_rejected() {
        assert!(matches!(
            Config::builder().host("h").encodings(vec![]).build(),
            Err(ClientError::Config(_))
        ));
    }
}
