use async_trait::async_trait;
use serde_json::{json, Map, Value as Json};
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::core::{
    claims::{Claims, CREDENTIAL_SUBJECT_KEY, ISSUER_KEY, VERIFIABLE_CREDENTIAL_KEY},
    key::PublicKeyWrapper,
};

use super::{CredentialsVerifier, VerificationError};

/// Credentials verifier that reads claims from the identity hub URL instead
/// of contacting the hub.
///
/// # Warning
/// Nothing is verified. Only use this for local development and testing.
#[derive(Debug, Clone, Default)]
pub struct MockCredentialsVerifier;

impl MockCredentialsVerifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CredentialsVerifier for MockCredentialsVerifier {
    /// Returns claims parsed from the query string of `hub_base_url`.
    ///
    /// The URL is never accessed and everything but the query string is ignored.
    /// For `http://dummy.site/foo?region=us&tier=GOLD` the result is a single credential:
    ///
    /// ```json
    /// { "<uuid>": { "vc": { "credentialSubject": { "region": "us", "tier": "GOLD" } }, "iss": "did:web:<uuid>" } }
    /// ```
    async fn verify_credentials(
        &self,
        hub_base_url: &str,
        _others_public_key: &PublicKeyWrapper,
    ) -> Result<Claims, VerificationError> {
        debug!("Starting (mock) credential verification against hub URL {hub_base_url}");

        let subject = parse_query_claims(hub_base_url)?;
        debug!(
            claims = %Json::Object(subject.clone()),
            "Completing (mock) credential verification"
        );

        Ok(to_mapped_verifiable_credentials(subject))
    }
}

fn parse_query_claims(hub_base_url: &str) -> Result<Map<String, Json>, VerificationError> {
    let url = Url::parse(hub_base_url).map_err(|source| VerificationError::MalformedUrl {
        url: hub_base_url.to_owned(),
        source,
    })?;

    if url.query().is_none() {
        return Err(VerificationError::MissingQuery(hub_base_url.to_owned()));
    }

    let mut claims = Map::new();
    for (name, value) in url.query_pairs() {
        if name.is_empty() && value.is_empty() {
            continue;
        }
        if claims.contains_key(name.as_ref()) {
            return Err(VerificationError::DuplicateClaim(name.into_owned()));
        }
        claims.insert(name.into_owned(), Json::String(value.into_owned()));
    }

    Ok(claims)
}

fn to_mapped_verifiable_credentials(subject: Map<String, Json>) -> Claims {
    let credential_id = Uuid::new_v4().to_string();
    // The issuer is not checked during policy evaluation.
    let issuer = format!("did:web:{}", Uuid::new_v4());

    let mut claims = Claims::new();
    claims.insert(
        credential_id,
        json!({
            VERIFIABLE_CREDENTIAL_KEY: { CREDENTIAL_SUBJECT_KEY: subject },
            ISSUER_KEY: issuer,
        }),
    );
    claims
}
