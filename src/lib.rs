//! Mock credentials verification and region-based access policies for a
//! minimum viable dataspace.
//!
//! # Verifier Usage
//!
//! The [`MockCredentialsVerifier`] never contacts an identity hub. It reads
//! the claims from the query string of the hub URL it is handed:
//!
//! ```ignore
//! use mock_credentials_verifier::verifier::{mock::MockCredentialsVerifier, CredentialsVerifier};
//! use mock_credentials_verifier::core::key::PublicKeyWrapper;
//!
//! let verifier = MockCredentialsVerifier::new();
//! let claims = verifier
//!     .verify_credentials("http://hub.example/foo?region=eu&tier=GOLD", &public_key)
//!     .await?;
//! ```
//!
//! Every call returns a single credential keyed by a fresh id:
//!
//! ```json
//! {
//!   "4f5f1c52-...": {
//!     "vc": { "credentialSubject": { "region": "eu", "tier": "GOLD" } },
//!     "iss": "did:web:0d6a8c39-..."
//!   }
//! }
//! ```
//!
//! # Policy Usage
//!
//! The claims are attached to a [`ParticipantAgent`] and evaluated by a
//! [`PolicyEngine`], which dispatches atomic constraints to the functions
//! bound to their left operand:
//!
//! ```ignore
//! use mock_credentials_verifier::core::claims::ParticipantAgent;
//! use mock_credentials_verifier::policy::{engine::PolicyEngine, Constraint, Operator, Permission, Policy};
//!
//! let engine = PolicyEngine::with_region_function();
//! let policy = Policy::default().with_permission(
//!     Permission::default().with_constraint(Constraint::atomic("region", Operator::Eq, "eu")),
//! );
//!
//! engine.evaluate(&policy, &ParticipantAgent::from_claims(claims))?;
//! ```
//!
//! [`MockCredentialsVerifier`]: crate::verifier::mock::MockCredentialsVerifier
//! [`ParticipantAgent`]: crate::core::claims::ParticipantAgent
//! [`PolicyEngine`]: crate::policy::engine::PolicyEngine

pub mod config;
pub mod core;
pub mod policy;
pub mod verifier;
