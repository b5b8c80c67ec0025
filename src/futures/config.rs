use std::env;

use secrecy::SecretString;
use url::Url;

use crate::error::Error;
use crate::signing::RequestSigner;
use crate::signing::abi::parse_address;
use crate::types::Address;
use crate::{ASTER_FUTURES_HOST, DEFAULT_RECV_WINDOW, Result};

pub const ENV_HOST: &str = "ASTER_HOST";
pub const ENV_USER: &str = "ASTER_USER";
pub const ENV_SIGNER: &str = "ASTER_SIGNER";
pub const ENV_PRIVATE_KEY: &str = "ASTER_PRIVATE_KEY";
pub const ENV_RECV_WINDOW: &str = "ASTER_RECV_WINDOW";

/// Raw signing values typically passed from app-level config.
#[derive(Clone, Debug)]
pub struct RawSigningConfig {
    pub user: String,
    pub signer: String,
    pub private_key: SecretString,
}

impl RawSigningConfig {
    /// Reads `ASTER_USER`, `ASTER_SIGNER` and `ASTER_PRIVATE_KEY`.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            user: required_env(ENV_USER)?,
            signer: required_env(ENV_SIGNER)?,
            private_key: SecretString::from(required_env(ENV_PRIVATE_KEY)?),
        })
    }
}

/// Futures client configuration.
#[derive(Clone, Debug)]
pub struct FuturesConfig {
    pub host: Url,
    pub user: Address,
    pub signer: Address,
    pub private_key: SecretString,
    pub recv_window: u64,
}

impl FuturesConfig {
    pub fn from_raw(host: &str, raw: RawSigningConfig) -> Result<Self> {
        let host = Url::parse(host)?;
        let user = parse_address(&raw.user)
            .map_err(|e| Error::configuration(format!("invalid user address: {e}")))?;
        let signer = parse_address(&raw.signer)
            .map_err(|e| Error::configuration(format!("invalid signer address: {e}")))?;

        Self::new(host, user, signer, raw.private_key, DEFAULT_RECV_WINDOW)
    }

    /// Reads the signing values plus optional `ASTER_HOST` and
    /// `ASTER_RECV_WINDOW` from the environment.
    pub fn from_env() -> Result<Self> {
        let host = env::var(ENV_HOST).unwrap_or_else(|_| ASTER_FUTURES_HOST.to_owned());
        let mut config = Self::from_raw(&host, RawSigningConfig::from_env()?)?;

        if let Ok(recv_window) = env::var(ENV_RECV_WINDOW) {
            config.recv_window = recv_window.trim().parse().map_err(|e| {
                Error::configuration(format!("invalid {ENV_RECV_WINDOW} `{recv_window}`: {e}"))
            })?;
            config.validate()?;
        }

        Ok(config)
    }

    pub fn new(
        host: Url,
        user: Address,
        signer: Address,
        private_key: SecretString,
        recv_window: u64,
    ) -> Result<Self> {
        let config = Self {
            host,
            user,
            signer,
            private_key,
            recv_window,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.user == Address::ZERO {
            return Err(Error::configuration("user address must be non-zero"));
        }
        if self.signer == Address::ZERO {
            return Err(Error::configuration("signer address must be non-zero"));
        }
        if self.recv_window == 0 {
            return Err(Error::configuration("recvWindow must be positive"));
        }
        Ok(())
    }

    /// Builds the request signer and checks the key belongs to `signer`.
    pub fn request_signer(&self) -> Result<RequestSigner> {
        let signer = RequestSigner::from_private_key(self.user, &self.private_key)?
            .with_recv_window(self.recv_window);

        if signer.signer_address() != self.signer {
            return Err(Error::configuration(format!(
                "private key controls {}, but signer is configured as {}",
                signer.signer_address(),
                self.signer
            )));
        }

        Ok(signer)
    }
}

fn required_env(name: &str) -> Result<String> {
    env::var(name).map_err(|e| Error::configuration(format!("{name}: {e}")))
}
