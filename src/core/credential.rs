use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};

use super::claims::VERIFIABLE_CREDENTIAL_KEY;

/// A verifiable credential as held by an identity hub.
///
/// Only the parts used for policy evaluation are modeled, other members
/// are ignored on deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiableCredential {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub credential_subject: Map<String, Json>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<Issuer>,
}

/// Credential issuer, either a bare identifier or an object with an `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Issuer {
    Id(String),
    Object {
        id: String,
        #[serde(flatten)]
        properties: Map<String, Json>,
    },
}

impl Issuer {
    pub fn id(&self) -> &str {
        match self {
            Issuer::Id(id) | Issuer::Object { id, .. } => id,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("claim is not a JSON object")]
    NotAnObject,

    #[error("claim has no `vc` entry")]
    MissingCredential,

    #[error("invalid verifiable credential: {0}")]
    Invalid(#[from] serde_json::Error),

    #[error("credential subject field `{0}` is not a string")]
    NotAString(String),
}

impl VerifiableCredential {
    /// Extract the credential wrapped in a single claims entry.
    pub fn from_claim(claim: &Json) -> Result<Self, CredentialError> {
        let credential = claim
            .as_object()
            .ok_or(CredentialError::NotAnObject)?
            .get(VERIFIABLE_CREDENTIAL_KEY)
            .ok_or(CredentialError::MissingCredential)?;

        serde_json::from_value(credential.clone()).map_err(Into::into)
    }

    /// Look up a string field of the credential subject.
    ///
    /// Returns `Ok(None)` when the field is absent or null.
    pub fn subject_str(&self, key: &str) -> Result<Option<&str>, CredentialError> {
        match self.credential_subject.get(key) {
            None | Some(Json::Null) => Ok(None),
            Some(Json::String(s)) => Ok(Some(s)),
            Some(_) => Err(CredentialError::NotAString(key.to_owned())),
        }
    }
}
