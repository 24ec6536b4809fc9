use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};

/// Key of the verifiable credential inside a claims entry.
pub const VERIFIABLE_CREDENTIAL_KEY: &str = "vc";
/// Key of the subject inside a verifiable credential.
pub const CREDENTIAL_SUBJECT_KEY: &str = "credentialSubject";
/// Key of the issuer inside a claims entry.
pub const ISSUER_KEY: &str = "iss";
/// Credential subject field carrying the participant's region.
pub const REGION_KEY: &str = "region";

const IDENTITY_ATTRIBUTE: &str = "identity";

/// Verified claims, keyed by credential id.
///
/// Each value is expected to be an object of the form
/// `{ "vc": { "credentialSubject": { .. } }, "iss": ".." }`.
pub type Claims = Map<String, Json>;

/// The counterparty of a request, as seen by policy evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParticipantAgent {
    claims: Claims,
    #[serde(default)]
    attributes: BTreeMap<String, String>,
}

impl ParticipantAgent {
    pub fn new(claims: Claims, attributes: BTreeMap<String, String>) -> Self {
        Self { claims, attributes }
    }

    /// Create an agent carrying only verified claims.
    pub fn from_claims(claims: Claims) -> Self {
        Self::new(claims, BTreeMap::new())
    }

    pub fn claims(&self) -> &Claims {
        &self.claims
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    /// The participant identity, if the transport layer supplied one.
    pub fn identity(&self) -> Option<&str> {
        self.attributes.get(IDENTITY_ATTRIBUTE).map(String::as_str)
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}
