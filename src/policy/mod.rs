use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::core::claims::ParticipantAgent;

pub mod engine;
pub mod region;

/// Comparison operator of an atomic constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operator {
    Eq,
    Neq,
    Gt,
    Geq,
    Lt,
    Leq,
    In,
    HasPart,
    IsA,
    IsAllOf,
    IsAnyOf,
    IsNoneOf,
}

impl Operator {
    pub const ALL: [Operator; 12] = [
        Operator::Eq,
        Operator::Neq,
        Operator::Gt,
        Operator::Geq,
        Operator::Lt,
        Operator::Leq,
        Operator::In,
        Operator::HasPart,
        Operator::IsA,
        Operator::IsAllOf,
        Operator::IsAnyOf,
        Operator::IsNoneOf,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "EQ",
            Operator::Neq => "NEQ",
            Operator::Gt => "GT",
            Operator::Geq => "GEQ",
            Operator::Lt => "LT",
            Operator::Leq => "LEQ",
            Operator::In => "IN",
            Operator::HasPart => "HAS_PART",
            Operator::IsA => "IS_A",
            Operator::IsAllOf => "IS_ALL_OF",
            Operator::IsAnyOf => "IS_ANY_OF",
            Operator::IsNoneOf => "IS_NONE_OF",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown operator `{0}`")]
pub struct UnknownOperator(String);

impl FromStr for Operator {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operator::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownOperator(s.to_owned()))
    }
}

/// A condition attached to a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum Constraint {
    /// Compares the value bound to `left_operand` with `right_operand`.
    Atomic {
        left_operand: String,
        operator: Operator,
        right_operand: Json,
    },
    /// Satisfied when every constraint is.
    And { constraints: Vec<Constraint> },
    /// Satisfied when at least one constraint is.
    Or { constraints: Vec<Constraint> },
    /// Satisfied when exactly one constraint is.
    Xone { constraints: Vec<Constraint> },
}

impl Constraint {
    pub fn atomic(
        left_operand: impl Into<String>,
        operator: Operator,
        right_operand: impl Into<Json>,
    ) -> Self {
        Self::Atomic {
            left_operand: left_operand.into(),
            operator,
            right_operand: right_operand.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default)]
    pub constraints: Vec<Constraint>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prohibition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default)]
    pub constraints: Vec<Constraint>,
}

impl Permission {
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }
}

impl Prohibition {
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }
}

/// A usage policy, as attached to a contract offer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    #[serde(default)]
    pub permissions: Vec<Permission>,
    #[serde(default)]
    pub prohibitions: Vec<Prohibition>,
}

impl Policy {
    pub fn with_permission(mut self, permission: Permission) -> Self {
        self.permissions.push(permission);
        self
    }

    pub fn with_prohibition(mut self, prohibition: Prohibition) -> Self {
        self.prohibitions.push(prohibition);
        self
    }
}

/// State shared by the constraint functions of a single policy evaluation.
#[derive(Debug, Clone)]
pub struct PolicyContext {
    agent: ParticipantAgent,
    problems: Vec<String>,
}

impl PolicyContext {
    pub fn new(agent: ParticipantAgent) -> Self {
        Self {
            agent,
            problems: Vec::new(),
        }
    }

    pub fn participant_agent(&self) -> &ParticipantAgent {
        &self.agent
    }

    pub fn report_problem(&mut self, problem: impl Into<String>) {
        self.problems.push(problem.into());
    }

    pub fn problems(&self) -> &[String] {
        &self.problems
    }

    pub fn has_problems(&self) -> bool {
        !self.problems.is_empty()
    }

    pub(crate) fn into_problems(self) -> Vec<String> {
        self.problems
    }
}

/// Evaluates an atomic constraint of a rule of type `R`.
pub trait AtomicConstraintFunction<R>: Send + Sync {
    fn evaluate(
        &self,
        operator: Operator,
        right_value: &Json,
        rule: &R,
        context: &mut PolicyContext,
    ) -> bool;
}
