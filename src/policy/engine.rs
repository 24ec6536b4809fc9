use std::{collections::HashMap, fmt, sync::Arc};

use tracing::debug;

use crate::core::claims::{ParticipantAgent, REGION_KEY};

use super::{
    region::RegionConstraintFunction, AtomicConstraintFunction, Constraint, Permission, Policy,
    PolicyContext, Prohibition,
};

type FunctionRegistry<R> = HashMap<String, Arc<dyn AtomicConstraintFunction<R>>>;

#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("policy not satisfied: {}", .0.join("; "))]
    Unsatisfied(Vec<String>),
}

/// Evaluates policies against a participant agent.
///
/// Atomic constraints are dispatched to the function registered for their left operand.
/// Constraints on a left operand without a function are never satisfied and fail the evaluation,
/// even inside an `Or` that is otherwise satisfied.
#[derive(Clone, Default)]
pub struct PolicyEngine {
    permission_functions: FunctionRegistry<Permission>,
    prohibition_functions: FunctionRegistry<Prohibition>,
}

impl fmt::Debug for PolicyEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyEngine")
            .field("permission_functions", &self.permission_functions.keys())
            .field("prohibition_functions", &self.prohibition_functions.keys())
            .finish()
    }
}

impl PolicyEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// An engine with [RegionConstraintFunction] bound to `region` permissions.
    pub fn with_region_function() -> Self {
        Self::with_region_key(REGION_KEY)
    }

    /// An engine with [RegionConstraintFunction] bound to `key`, reading the credential subject field `key`.
    pub fn with_region_key(key: &str) -> Self {
        let mut engine = Self::new();
        engine.register_permission_function(key, RegionConstraintFunction::with_subject_key(key));
        engine
    }

    pub fn register_permission_function(
        &mut self,
        left_operand: impl Into<String>,
        function: impl AtomicConstraintFunction<Permission> + 'static,
    ) {
        self.permission_functions
            .insert(left_operand.into(), Arc::new(function));
    }

    pub fn register_prohibition_function(
        &mut self,
        left_operand: impl Into<String>,
        function: impl AtomicConstraintFunction<Prohibition> + 'static,
    ) {
        self.prohibition_functions
            .insert(left_operand.into(), Arc::new(function));
    }

    /// Evaluate `policy` for `agent`.
    ///
    /// Every permission must have all of its constraints satisfied, and no prohibition may have
    /// all of its constraints satisfied.
    pub fn evaluate(&self, policy: &Policy, agent: &ParticipantAgent) -> Result<(), PolicyError> {
        let mut context = PolicyContext::new(agent.clone());

        for (index, permission) in policy.permissions.iter().enumerate() {
            let satisfied = evaluate_each(
                &self.permission_functions,
                &permission.constraints,
                permission,
                &mut context,
            )
            .into_iter()
            .all(|satisfied| satisfied);
            if !satisfied {
                context.report_problem(format!(
                    "permission {} not satisfied",
                    describe(index, permission.action.as_deref())
                ));
            }
        }

        for (index, prohibition) in policy.prohibitions.iter().enumerate() {
            let applies = evaluate_each(
                &self.prohibition_functions,
                &prohibition.constraints,
                prohibition,
                &mut context,
            )
            .into_iter()
            .all(|satisfied| satisfied);
            if applies {
                context.report_problem(format!(
                    "prohibition {} applies",
                    describe(index, prohibition.action.as_deref())
                ));
            }
        }

        if context.has_problems() {
            debug!(problems = ?context.problems(), "Policy evaluation failed");
            return Err(PolicyError::Unsatisfied(context.into_problems()));
        }

        debug!("Policy evaluation succeeded");
        Ok(())
    }
}

fn describe(index: usize, action: Option<&str>) -> String {
    match action {
        Some(action) => format!("#{index} ({action})"),
        None => format!("#{index}"),
    }
}

fn evaluate_constraint<R>(
    functions: &FunctionRegistry<R>,
    constraint: &Constraint,
    rule: &R,
    context: &mut PolicyContext,
) -> bool {
    match constraint {
        Constraint::Atomic {
            left_operand,
            operator,
            right_operand,
        } => match functions.get(left_operand) {
            Some(function) => function.evaluate(*operator, right_operand, rule, context),
            None => {
                context.report_problem(format!(
                    "left operand `{left_operand}` is not bound to a function"
                ));
                false
            }
        },
        Constraint::And { constraints } => evaluate_each(functions, constraints, rule, context)
            .into_iter()
            .all(|satisfied| satisfied),
        Constraint::Or { constraints } => evaluate_each(functions, constraints, rule, context)
            .into_iter()
            .any(|satisfied| satisfied),
        Constraint::Xone { constraints } => {
            evaluate_each(functions, constraints, rule, context)
                .into_iter()
                .filter(|satisfied| *satisfied)
                .count()
                == 1
        }
    }
}

/// Evaluate every constraint, so that problems are reported regardless of constraint order.
fn evaluate_each<R>(
    functions: &FunctionRegistry<R>,
    constraints: &[Constraint],
    rule: &R,
    context: &mut PolicyContext,
) -> Vec<bool> {
    constraints
        .iter()
        .map(|constraint| evaluate_constraint(functions, constraint, rule, context))
        .collect()
}

#[cfg(test)]
mod test {
    use serde_json::{json, Value as Json};

    use crate::policy::Operator;

    use super::*;

    fn agent(region: &str) -> ParticipantAgent {
        let Json::Object(claims) = json!({
            "id": { "vc": { "credentialSubject": { "region": region } } }
        }) else {
            unreachable!()
        };
        ParticipantAgent::from_claims(claims)
    }

    fn region_permission(constraint: Constraint) -> Policy {
        Policy::default().with_permission(
            Permission::default()
                .with_action("USE")
                .with_constraint(constraint),
        )
    }

    /// Satisfied when the right value is `true`.
    struct Literal;

    impl AtomicConstraintFunction<Prohibition> for Literal {
        fn evaluate(
            &self,
            _operator: Operator,
            right_value: &Json,
            _rule: &Prohibition,
            _context: &mut PolicyContext,
        ) -> bool {
            right_value.as_bool().unwrap_or_default()
        }
    }

    #[test]
    fn empty_policy_is_satisfied() {
        PolicyEngine::new()
            .evaluate(&Policy::default(), &agent("eu"))
            .unwrap();
    }

    #[test]
    fn region_permission_granted() {
        let policy = region_permission(Constraint::atomic("region", Operator::Eq, "eu"));

        PolicyEngine::with_region_function()
            .evaluate(&policy, &agent("eu"))
            .unwrap();
    }

    #[test]
    fn region_permission_denied() {
        let policy = region_permission(Constraint::atomic("region", Operator::Eq, "eu"));

        let PolicyError::Unsatisfied(problems) = PolicyEngine::with_region_function()
            .evaluate(&policy, &agent("us"))
            .unwrap_err();
        assert_eq!(problems, vec!["permission #0 (USE) not satisfied".to_owned()]);
    }

    #[test]
    fn unbound_left_operand() {
        let policy = region_permission(Constraint::atomic("tier", Operator::Eq, "GOLD"));

        let PolicyError::Unsatisfied(problems) = PolicyEngine::with_region_function()
            .evaluate(&policy, &agent("eu"))
            .unwrap_err();
        assert_eq!(problems.len(), 2);
        assert!(problems[0].contains("`tier`"));
    }

    #[test]
    fn unbound_operand_is_reported_in_any_order() {
        let engine = PolicyEngine::with_region_function();
        let eu = Constraint::atomic("region", Operator::Eq, "eu");
        let tier = Constraint::atomic("tier", Operator::Eq, "GOLD");

        for constraints in [vec![eu.clone(), tier.clone()], vec![tier, eu]] {
            let policy = region_permission(Constraint::Or { constraints });

            let PolicyError::Unsatisfied(problems) =
                engine.evaluate(&policy, &agent("eu")).unwrap_err();
            assert_eq!(
                problems,
                vec!["left operand `tier` is not bound to a function".to_owned()]
            );
        }
    }

    #[test]
    fn prohibition_outcome_ignores_constraint_order() {
        let mut engine = PolicyEngine::new();
        engine.register_prohibition_function("literal", Literal);
        let yes = Constraint::atomic("literal", Operator::Eq, true);
        let unbound = Constraint::atomic("tier", Operator::Eq, "GOLD");

        for constraints in [vec![yes.clone(), unbound.clone()], vec![unbound, yes]] {
            let policy = Policy::default().with_prohibition(Prohibition {
                constraints,
                ..Default::default()
            });

            let PolicyError::Unsatisfied(problems) =
                engine.evaluate(&policy, &agent("eu")).unwrap_err();
            assert_eq!(
                problems,
                vec!["left operand `tier` is not bound to a function".to_owned()]
            );
        }
    }

    #[test]
    fn logical_constraints() {
        let engine = PolicyEngine::with_region_function();
        let eu = || Constraint::atomic("region", Operator::Eq, "eu");
        let us = || Constraint::atomic("region", Operator::Eq, "us");
        let not_us = || Constraint::atomic("region", Operator::Neq, "us");

        let or = region_permission(Constraint::Or {
            constraints: vec![us(), eu()],
        });
        assert!(engine.evaluate(&or, &agent("eu")).is_ok());

        let and = region_permission(Constraint::And {
            constraints: vec![eu(), not_us()],
        });
        assert!(engine.evaluate(&and, &agent("eu")).is_ok());
        assert!(engine.evaluate(&and, &agent("us")).is_err());

        let xone = region_permission(Constraint::Xone {
            constraints: vec![eu(), not_us()],
        });
        assert!(engine.evaluate(&xone, &agent("eu")).is_err());
        assert!(engine.evaluate(&xone, &agent("fr")).is_ok());
    }

    #[test]
    fn prohibitions() {
        let mut engine = PolicyEngine::new();
        engine.register_prohibition_function("literal", Literal);

        let applies = Policy::default().with_prohibition(
            Prohibition::default()
                .with_action("DISTRIBUTE")
                .with_constraint(Constraint::atomic("literal", Operator::Eq, true)),
        );
        let PolicyError::Unsatisfied(problems) =
            engine.evaluate(&applies, &agent("eu")).unwrap_err();
        assert_eq!(problems, vec!["prohibition #0 (DISTRIBUTE) applies".to_owned()]);

        let lifted = Policy::default().with_prohibition(
            Prohibition::default().with_constraint(Constraint::atomic(
                "literal",
                Operator::Eq,
                false,
            )),
        );
        assert!(engine.evaluate(&lifted, &agent("eu")).is_ok());

        let unconditional = Policy::default().with_prohibition(Prohibition::default());
        assert!(engine.evaluate(&unconditional, &agent("eu")).is_err());
    }

    #[test]
    fn custom_region_key() {
        let Json::Object(claims) = json!({
            "id": { "vc": { "credentialSubject": { "area": "eu" } } }
        }) else {
            unreachable!()
        };
        let policy = region_permission(Constraint::atomic("area", Operator::Eq, "eu"));

        PolicyEngine::with_region_key("area")
            .evaluate(&policy, &ParticipantAgent::from_claims(claims))
            .unwrap();
    }
}
