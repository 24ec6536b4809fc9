use serde_json::Value as Json;
use tracing::warn;

use crate::core::{
    claims::{Claims, REGION_KEY},
    credential::VerifiableCredential,
};

use super::{AtomicConstraintFunction, Operator, Permission, PolicyContext};

/// Grants a permission based on the region found in the participant's verifiable credentials.
///
/// Only [Operator::Eq] and [Operator::Neq] are supported, any other operator evaluates to `false`.
#[derive(Debug, Clone)]
pub struct RegionConstraintFunction {
    subject_key: String,
}

impl Default for RegionConstraintFunction {
    fn default() -> Self {
        Self::new()
    }
}

impl RegionConstraintFunction {
    pub fn new() -> Self {
        Self::with_subject_key(REGION_KEY)
    }

    /// Read the region from `subject_key` instead of `region`.
    pub fn with_subject_key(subject_key: impl Into<String>) -> Self {
        Self {
            subject_key: subject_key.into(),
        }
    }

    fn regions(&self, claims: &Claims) -> Vec<String> {
        claims
            .values()
            .filter_map(|claim| match VerifiableCredential::from_claim(claim) {
                Ok(vc) => Some(vc),
                Err(e) => {
                    warn!("Error getting verifiable credentials: {e}");
                    None
                }
            })
            .filter_map(|vc| match vc.subject_str(&self.subject_key) {
                Ok(region) => region.map(ToOwned::to_owned),
                Err(e) => {
                    warn!("Error getting region: {e}");
                    None
                }
            })
            .collect()
    }
}

impl AtomicConstraintFunction<Permission> for RegionConstraintFunction {
    fn evaluate(
        &self,
        operator: Operator,
        right_value: &Json,
        _rule: &Permission,
        context: &mut PolicyContext,
    ) -> bool {
        let regions = self.regions(context.participant_agent().claims());
        let matches = || {
            right_value
                .as_str()
                .is_some_and(|expected| regions.iter().any(|region| region == expected))
        };

        match operator {
            Operator::Eq => matches(),
            Operator::Neq => !matches(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use crate::core::claims::ParticipantAgent;

    use super::*;

    fn context(claims: Json) -> PolicyContext {
        let Json::Object(claims) = claims else {
            panic!("claims must be an object")
        };
        PolicyContext::new(ParticipantAgent::from_claims(claims))
    }

    fn evaluate(operator: Operator, right_value: Json, claims: Json) -> bool {
        RegionConstraintFunction::new().evaluate(
            operator,
            &right_value,
            &Permission::default(),
            &mut context(claims),
        )
    }

    fn eu_claims() -> Json {
        json!({
            "a": { "vc": { "credentialSubject": { "region": "eu" } }, "iss": "did:web:a" },
            "b": { "vc": { "credentialSubject": { "tier": "GOLD" } } }
        })
    }

    #[test]
    fn eq() {
        assert!(evaluate(Operator::Eq, json!("eu"), eu_claims()));
        assert!(!evaluate(Operator::Eq, json!("us"), eu_claims()));
    }

    #[test]
    fn neq() {
        assert!(!evaluate(Operator::Neq, json!("eu"), eu_claims()));
        assert!(evaluate(Operator::Neq, json!("us"), eu_claims()));
    }

    #[test]
    fn unsupported_operators_are_false() {
        for op in [Operator::In, Operator::Gt, Operator::IsAnyOf, Operator::HasPart] {
            assert!(!evaluate(op, json!("eu"), eu_claims()));
        }
    }

    #[test]
    fn any_credential_may_match() {
        let claims = json!({
            "a": { "vc": { "credentialSubject": { "region": "us" } } },
            "b": { "vc": { "credentialSubject": { "region": "eu" } } }
        });
        assert!(evaluate(Operator::Eq, json!("eu"), claims.clone()));
        assert!(evaluate(Operator::Eq, json!("us"), claims));
    }

    #[test]
    fn invalid_claims_are_skipped() {
        let claims = json!({
            "not-an-object": "x",
            "no-vc": { "iss": "did:web:x" },
            "bad-vc": { "vc": 42 },
            "numeric-region": { "vc": { "credentialSubject": { "region": 1 } } },
            "good": { "vc": { "credentialSubject": { "region": "eu" } } }
        });
        assert!(evaluate(Operator::Eq, json!("eu"), claims));
    }

    #[test]
    fn no_claims() {
        assert!(!evaluate(Operator::Eq, json!("eu"), json!({})));
        assert!(evaluate(Operator::Neq, json!("eu"), json!({})));
    }

    #[test]
    fn non_string_right_value_never_matches() {
        assert!(!evaluate(Operator::Eq, json!(["eu"]), eu_claims()));
        assert!(evaluate(Operator::Neq, json!(1), eu_claims()));
    }

    #[test]
    fn custom_subject_key() {
        let claims = json!({ "a": { "vc": { "credentialSubject": { "area": "eu" } } } });
        let Json::Object(claims) = claims else {
            unreachable!()
        };
        let mut context = PolicyContext::new(ParticipantAgent::from_claims(claims));

        assert!(RegionConstraintFunction::with_subject_key("area").evaluate(
            Operator::Eq,
            &json!("eu"),
            &Permission::default(),
            &mut context,
        ));
    }
}
