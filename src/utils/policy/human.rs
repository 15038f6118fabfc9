//! Parser for the human readable policy language, e.g. `A_0 AND (A_1 OR A_2)`
//! or the threshold form `2 OF (A_0, A_1, A_2)`.
//!
//! Parsing is a pure function of the policy text; the same string always
//! yields the same [`PolicyValue`] tree. Attribute matching is
//! case-sensitive, the keywords `AND`, `OR` and `OF` are reserved.

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use serde::{Deserialize, Serialize};

use crate::error::AbeError;

#[derive(Parser)]
#[grammar = "policy.pest"]
pub struct PolicyParser;

/// A parsed boolean access policy over attribute labels.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub enum PolicyValue {
    And(Vec<PolicyValue>),
    Or(Vec<PolicyValue>),
    /// `k` of the children must be satisfied.
    Threshold(usize, Vec<PolicyValue>),
    Leaf(String),
}

/// Parses policy text into a [`PolicyValue`], or fails with a
/// policy-syntax error on malformed input (empty policy, dangling operator,
/// unbalanced parentheses, duplicate attribute within one clause, ...).
pub fn parse(policy: &str) -> Result<PolicyValue, AbeError> {
    match PolicyParser::parse(Rule::content, policy) {
        Ok(mut pairs) => build(pairs.next().unwrap()),
        Err(e) => Err(e.into()),
    }
}

fn build(pair: Pair<Rule>) -> Result<PolicyValue, AbeError> {
    match pair.as_rule() {
        Rule::content | Rule::expr | Rule::term => build(pair.into_inner().next().unwrap()),
        Rule::orexpr => {
            let children = pair
                .into_inner()
                .filter(|p| p.as_rule() != Rule::or_kw)
                .map(build)
                .collect::<Result<Vec<_>, _>>()?;
            if children.len() == 1 {
                Ok(children.into_iter().next().unwrap())
            } else {
                Ok(PolicyValue::Or(children))
            }
        }
        Rule::andexpr => {
            let children = pair
                .into_inner()
                .filter(|p| p.as_rule() != Rule::and_kw)
                .map(build)
                .collect::<Result<Vec<_>, _>>()?;
            if children.len() == 1 {
                Ok(children.into_iter().next().unwrap())
            } else {
                check_duplicate_leaves(&children, "AND")?;
                Ok(PolicyValue::And(children))
            }
        }
        Rule::threshold => {
            let mut inner = pair.into_inner();
            let count = inner.next().unwrap();
            let k: usize = count
                .as_str()
                .parse()
                .map_err(|_| AbeError::policy_syntax("threshold count out of range"))?;
            let children = inner
                .filter(|p| p.as_rule() != Rule::of_kw)
                .map(build)
                .collect::<Result<Vec<_>, _>>()?;
            if k < 1 || k > children.len() {
                return Err(AbeError::policy_syntax(&format!(
                    "threshold {} OF {} is unsatisfiable",
                    k,
                    children.len()
                )));
            }
            check_duplicate_leaves(&children, "threshold")?;
            Ok(PolicyValue::Threshold(k, children))
        }
        Rule::attribute => Ok(PolicyValue::Leaf(pair.as_str().to_string())),
        rule => unreachable!("unexpected rule {:?}", rule),
    }
}

// A duplicate leaf directly under one AND or threshold clause can never add
// anything and almost always indicates a typo in the policy text.
fn check_duplicate_leaves(children: &[PolicyValue], clause: &str) -> Result<(), AbeError> {
    let mut seen: Vec<&str> = Vec::new();
    for child in children {
        if let PolicyValue::Leaf(name) = child {
            if seen.contains(&name.as_str()) {
                return Err(AbeError::policy_syntax(&format!(
                    "duplicate attribute \"{}\" in {} clause",
                    name, clause
                )));
            }
            seen.push(name);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn single_attribute() {
        assert_eq!(
            parse("A_0").unwrap(),
            PolicyValue::Leaf(String::from("A_0"))
        );
    }

    #[test]
    fn and_or_precedence() {
        let pol = parse("A_0 OR A_1 AND A_2").unwrap();
        assert_eq!(
            pol,
            PolicyValue::Or(vec![
                PolicyValue::Leaf(String::from("A_0")),
                PolicyValue::And(vec![
                    PolicyValue::Leaf(String::from("A_1")),
                    PolicyValue::Leaf(String::from("A_2")),
                ]),
            ])
        );
    }

    #[test]
    fn parenthesized_grouping() {
        let pol = parse("(A_0 OR A_1) AND A_2").unwrap();
        assert_eq!(
            pol,
            PolicyValue::And(vec![
                PolicyValue::Or(vec![
                    PolicyValue::Leaf(String::from("A_0")),
                    PolicyValue::Leaf(String::from("A_1")),
                ]),
                PolicyValue::Leaf(String::from("A_2")),
            ])
        );
    }

    #[test]
    fn threshold_clause() {
        let pol = parse("2 OF (A_0, A_1, A_2)").unwrap();
        match pol {
            PolicyValue::Threshold(k, children) => {
                assert_eq!(k, 2);
                assert_eq!(children.len(), 3);
            }
            _ => panic!("expected a threshold node"),
        }
    }

    #[test]
    fn syntax_errors() {
        for bad in ["", "A_0 AND", "(A_0 AND A_1", "AND A_0", "A_0 OR OR A_1"] {
            let e = parse(bad).unwrap_err();
            assert_eq!(e.kind(), ErrorKind::PolicySyntax, "policy: {:?}", bad);
        }
    }

    #[test]
    fn duplicate_attribute_in_and_clause() {
        let e = parse("A_0 AND A_0").unwrap_err();
        assert_eq!(e.kind(), ErrorKind::PolicySyntax);
        let e = parse("2 OF (A_0, A_0, A_1)").unwrap_err();
        assert_eq!(e.kind(), ErrorKind::PolicySyntax);
        // the same attribute in different clauses is fine
        assert!(parse("(A_0 AND A_1) OR (A_0 AND A_2)").is_ok());
    }

    #[test]
    fn unsatisfiable_threshold() {
        let e = parse("4 OF (A_0, A_1, A_2)").unwrap_err();
        assert_eq!(e.kind(), ErrorKind::PolicySyntax);
        let e = parse("0 OF (A_0, A_1)").unwrap_err();
        assert_eq!(e.kind(), ErrorKind::PolicySyntax);
    }

    #[test]
    fn keywords_are_case_sensitive() {
        // lowercase "and" is not an operator, so this is two dangling tokens
        assert!(parse("A_0 and A_1").is_err());
        // but an attribute merely starting with a keyword is fine
        assert_eq!(
            parse("ANDY").unwrap(),
            PolicyValue::Leaf(String::from("ANDY"))
        );
    }
}
