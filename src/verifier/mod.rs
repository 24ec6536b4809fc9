use std::fmt::Debug;

use async_trait::async_trait;

use crate::core::{claims::Claims, key::PublicKeyWrapper};

pub mod mock;

/// Obtains and verifies the credentials of a participant from its identity hub.
#[async_trait]
pub trait CredentialsVerifier: Debug {
    /// Verify the credentials held at `hub_base_url`.
    ///
    /// ## Params
    /// * `hub_base_url` - the URL of the participant's identity hub.
    /// * `others_public_key` - the participant's public key, used to check credential signatures.
    ///
    /// ## Returns
    /// The verified claims, keyed by credential id.
    async fn verify_credentials(
        &self,
        hub_base_url: &str,
        others_public_key: &PublicKeyWrapper,
    ) -> Result<Claims, VerificationError>;
}

#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    /// The identity hub URL could not be parsed.
    #[error("malformed identity hub url `{url}`: {source}")]
    MalformedUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The identity hub URL has no query string to read claims from.
    #[error("identity hub url `{0}` has no query string")]
    MissingQuery(String),

    /// The same claim name was given more than once.
    #[error("duplicate claim `{0}`")]
    DuplicateClaim(String),
}
