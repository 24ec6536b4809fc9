use std::fmt;

use anyhow::{anyhow, Result};

/// The public key of the counterparty whose credentials are verified.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKeyWrapper(p256::PublicKey);

impl PublicKeyWrapper {
    /// Parse a public P-256 JWK.
    pub fn from_jwk_str(jwk: &str) -> Result<Self> {
        p256::PublicKey::from_jwk_str(jwk)
            .map(Self)
            .map_err(|e| anyhow!("unable to parse P-256 public JWK: {e}"))
    }

    pub fn to_jwk_string(&self) -> String {
        self.0.to_jwk_string()
    }

    pub fn public_key(&self) -> &p256::PublicKey {
        &self.0
    }
}

impl From<p256::PublicKey> for PublicKeyWrapper {
    fn from(key: p256::PublicKey) -> Self {
        Self(key)
    }
}

impl fmt::Debug for PublicKeyWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PublicKeyWrapper")
            .field(&self.to_jwk_string())
            .finish()
    }
}
