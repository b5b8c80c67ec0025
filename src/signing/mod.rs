//! Delegated request signing.
//!
//! A [`RequestSigner`] turns a [`ParameterSet`] into a [`SignedRequest`]:
//! - drop null entries, add `recvWindow` and `timestamp`
//! - canonicalize ([`canonical`]) and ABI-encode with user, signer and nonce ([`abi`])
//! - Keccak-256 the encoding and personal-sign the 32-byte hash
//!
//! The returned request carries the untrimmed parameters plus `nonce`, `user`,
//! `signer` and `signature`.

pub mod abi;
pub mod canonical;
pub mod params;

use std::str::FromStr as _;
use std::sync::Arc;

use alloy::primitives::hex;
use alloy::signers::SignerSync as _;
use alloy::signers::local::PrivateKeySigner;
use secrecy::{ExposeSecret as _, SecretString};

use crate::clock::{self, Clock, Nonce};
use crate::error::{Error, Kind};
use crate::types::{Address, B256, Signature};
use crate::{DEFAULT_RECV_WINDOW, Result};

pub use params::{Number, ParamValue, ParameterSet};

pub const NONCE_KEY: &str = "nonce";
pub const USER_KEY: &str = "user";
pub const SIGNER_KEY: &str = "signer";
pub const SIGNATURE_KEY: &str = "signature";
pub const RECV_WINDOW_KEY: &str = "recvWindow";
pub const TIMESTAMP_KEY: &str = "timestamp";

/// Signs request parameters on behalf of a delegating `user`.
#[derive(Clone, Debug)]
pub struct RequestSigner {
    user: Address,
    signer: PrivateKeySigner,
    recv_window: u64,
    clock: Arc<dyn Clock>,
}

impl RequestSigner {
    #[must_use]
    pub fn new(user: Address, signer: PrivateKeySigner) -> Self {
        Self {
            user,
            signer,
            recv_window: DEFAULT_RECV_WINDOW,
            clock: Arc::new(clock::System),
        }
    }

    /// Parses a hex private key, with or without `0x`.
    pub fn from_private_key(user: Address, private_key: &SecretString) -> Result<Self> {
        let signer = PrivateKeySigner::from_str(private_key.expose_secret())
            .map_err(|e| Error::configuration(format!("invalid private key: {e}")))?;
        Ok(Self::new(user, signer))
    }

    #[must_use]
    pub const fn with_recv_window(mut self, recv_window: u64) -> Self {
        self.recv_window = recv_window;
        self
    }

    #[must_use]
    pub fn with_clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    #[must_use]
    pub const fn user(&self) -> Address {
        self.user
    }

    #[must_use]
    pub fn signer_address(&self) -> Address {
        self.signer.address()
    }

    #[must_use]
    pub const fn recv_window(&self) -> u64 {
        self.recv_window
    }

    /// Nonce for the next request, read from the signer's clock.
    pub fn next_nonce(&self) -> Result<Nonce> {
        Nonce::from_clock(self.clock.as_ref())
    }

    /// Filters nulls and adds `recvWindow` and `timestamp`.
    ///
    /// Caller-provided `recvWindow` or `timestamp` values are overwritten.
    pub fn prepare(&self, mut params: ParameterSet) -> Result<ParameterSet> {
        params.drop_nulls();
        params.insert(RECV_WINDOW_KEY, self.recv_window);
        params.insert(TIMESTAMP_KEY, clock::timestamp_millis(self.clock.as_ref())?);
        Ok(params)
    }

    /// Signs `params` under `nonce`.
    pub fn sign(&self, params: ParameterSet, nonce: Nonce) -> Result<SignedRequest> {
        let params = self.prepare(params)?;
        let payload = canonical::canonicalize(&params)?;
        let hash = self.content_hash(&payload, nonce);
        let signature = self.sign_hash(hash)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            %nonce,
            canonical = %payload,
            %hash,
            signature = %hex::encode_prefixed(signature.as_bytes()),
            "signed request"
        );

        Ok(SignedRequest {
            params,
            nonce,
            user: self.user,
            signer: self.signer.address(),
            signature,
            canonical: payload,
            hash,
        })
    }

    fn content_hash(&self, payload: &str, nonce: Nonce) -> B256 {
        let encoded = abi::encode_payload(payload, self.user, self.signer.address(), nonce.get());

        #[cfg(feature = "tracing")]
        tracing::trace!(encoded = %hex::encode(&encoded), "abi-encoded payload");

        abi::content_hash(&encoded)
    }

    /// EIP-191 personal-sign over the raw 32 hash bytes.
    fn sign_hash(&self, hash: B256) -> Result<Signature> {
        Ok(self.signer.sign_message_sync(hash.as_slice())?)
    }
}

/// Parameters ready for transport.
#[derive(Clone, Debug)]
pub struct SignedRequest {
    params: ParameterSet,
    nonce: Nonce,
    user: Address,
    signer: Address,
    signature: Signature,
    canonical: String,
    hash: B256,
}

impl SignedRequest {
    #[must_use]
    pub const fn nonce(&self) -> Nonce {
        self.nonce
    }

    #[must_use]
    pub const fn user(&self) -> Address {
        self.user
    }

    #[must_use]
    pub const fn signer(&self) -> Address {
        self.signer
    }

    #[must_use]
    pub const fn signature(&self) -> &Signature {
        &self.signature
    }

    /// 65-byte `r || s || v` signature, `0x`-prefixed hex, `v` in `{27, 28}`.
    #[must_use]
    pub fn signature_hex(&self) -> String {
        hex::encode_prefixed(self.signature.as_bytes())
    }

    /// The exact string that was ABI-encoded.
    #[must_use]
    pub fn canonical_payload(&self) -> &str {
        &self.canonical
    }

    /// Keccak-256 content hash that was personal-signed.
    #[must_use]
    pub const fn hash(&self) -> B256 {
        self.hash
    }

    /// Recovers the address that produced the signature.
    pub fn recover_signer(&self) -> Result<Address> {
        self.signature
            .recover_address_from_msg(self.hash.as_slice())
            .map_err(|e| Error::with_source(Kind::Encoding, e))
    }

    /// Filtered and augmented parameters followed by the four auth fields.
    #[must_use]
    pub fn params(&self) -> ParameterSet {
        self.params
            .clone()
            .with(NONCE_KEY, self.nonce.get())
            .with(USER_KEY, self.user.to_string())
            .with(SIGNER_KEY, self.signer.to_string())
            .with(SIGNATURE_KEY, self.signature_hex())
    }

    /// Flat key/value pairs for a form body or query string, in parameter
    /// order. Nested values are sent in their trimmed JSON form.
    pub fn form_pairs(&self) -> Result<Vec<(String, String)>> {
        self.params()
            .iter()
            .map(|(k, v)| Ok((k.to_owned(), canonical::stringify(v)?)))
            .collect()
    }
}
