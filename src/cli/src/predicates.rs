//! Predicates selectable from the command line.
//!
//! Local states in a recorded trace are arbitrary JSON values, so the CLI
//! offers a fixed set of comparisons over a pair of them. A predicate is
//! given as `<id>=<kind>[:<args>]`:
//!
//! - `0=equal`: both local states are equal
//! - `1=differ`: the local states differ
//! - `2=both:"ready",3`: the first state is `"ready"` and the second is `3`
//! - `3=sum:10`: both states are numbers adding up to 10

use anyhow::{anyhow, bail, Context, Result};
use cutline_core::predicate::{Predicate, PredicateId};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// A comparison over the local states of two processes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    Equal,
    Differ,
    Both { first: Value, second: Value },
    Sum { total: f64 },
}

impl Predicate<Value> for Condition {
    fn holds(&self, local_i: &Value, local_j: &Value) -> bool {
        match self {
            Condition::Equal => local_i == local_j,
            Condition::Differ => local_i != local_j,
            Condition::Both { first, second } => local_i == first && local_j == second,
            Condition::Sum { total } => match (local_i.as_f64(), local_j.as_f64()) {
                (Some(a), Some(b)) => a + b == *total,
                _ => false,
            },
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Equal => write!(f, "equal"),
            Condition::Differ => write!(f, "differ"),
            Condition::Both { first, second } => write!(f, "both {} {}", first, second),
            Condition::Sum { total } => write!(f, "sum {}", total),
        }
    }
}

/// Parse an argument as JSON, falling back to a bare string.
fn parse_value(arg: &str) -> Value {
    serde_json::from_str(arg).unwrap_or_else(|_| Value::String(arg.to_string()))
}

impl FromStr for Condition {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (kind, args) = match s.split_once(':') {
            Some((kind, args)) => (kind.trim(), Some(args.trim())),
            None => (s.trim(), None),
        };

        match (kind, args) {
            ("equal", None) => Ok(Condition::Equal),
            ("differ", None) => Ok(Condition::Differ),
            ("both", Some(args)) => {
                let (first, second) = args
                    .split_once(',')
                    .ok_or_else(|| anyhow!("'both' takes two comma-separated values"))?;
                Ok(Condition::Both {
                    first: parse_value(first.trim()),
                    second: parse_value(second.trim()),
                })
            }
            ("sum", Some(total)) => {
                let total = total
                    .parse()
                    .with_context(|| format!("'{}' is not a number", total))?;
                Ok(Condition::Sum { total })
            }
            ("equal" | "differ", Some(_)) => bail!("'{}' takes no arguments", kind),
            ("both" | "sum", None) => bail!("'{}' needs arguments, e.g. {}:...", kind, kind),
            _ => bail!(
                "unknown predicate kind '{}' (expected equal, differ, both or sum)",
                kind
            ),
        }
    }
}

/// A predicate id paired with the condition to register under it.
#[derive(Debug, Clone, PartialEq)]
pub struct PredicateArg {
    pub id: PredicateId,
    pub condition: Condition,
}

impl FromStr for PredicateArg {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (id, condition) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected <id>=<kind>[:<args>], got '{}'", s))?;
        let index: usize = id
            .trim()
            .parse()
            .with_context(|| format!("'{}' is not a predicate id", id))?;
        let id = PredicateId::try_from(index)?;
        Ok(Self {
            id,
            condition: condition.parse()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_kinds() {
        assert_eq!("equal".parse::<Condition>().unwrap(), Condition::Equal);
        assert_eq!("differ".parse::<Condition>().unwrap(), Condition::Differ);
        assert_eq!(
            "both:\"X\",3".parse::<Condition>().unwrap(),
            Condition::Both {
                first: json!("X"),
                second: json!(3)
            }
        );
        assert_eq!(
            "sum:10".parse::<Condition>().unwrap(),
            Condition::Sum { total: 10.0 }
        );
    }

    #[test]
    fn test_bare_words_are_strings() {
        let condition: Condition = "both:ready,done".parse().unwrap();
        assert!(condition.holds(&json!("ready"), &json!("done")));
        assert!(!condition.holds(&json!("done"), &json!("ready")));
    }

    #[test]
    fn test_parse_errors() {
        assert!("equal:1".parse::<Condition>().is_err());
        assert!("both:1".parse::<Condition>().is_err());
        assert!("sum".parse::<Condition>().is_err());
        assert!("sum:many".parse::<Condition>().is_err());
        assert!("greater".parse::<Condition>().is_err());
    }

    #[test]
    fn test_sum_requires_numbers() {
        let sum = Condition::Sum { total: 5.0 };
        assert!(sum.holds(&json!(2), &json!(3)));
        assert!(sum.holds(&json!(2.5), &json!(2.5)));
        assert!(!sum.holds(&json!("2"), &json!(3)));
    }

    #[test]
    fn test_equal_and_differ() {
        assert!(Condition::Equal.holds(&json!({"a": 1}), &json!({"a": 1})));
        assert!(Condition::Differ.holds(&json!(1), &json!(2)));
        assert!(!Condition::Differ.holds(&json!(null), &json!(null)));
    }

    #[test]
    fn test_parse_predicate_arg() {
        let arg: PredicateArg = "3=sum:4".parse().unwrap();
        assert_eq!(arg.id, PredicateId::P3);
        assert_eq!(arg.condition, Condition::Sum { total: 4.0 });

        assert!("4=equal".parse::<PredicateArg>().is_err());
        assert!("equal".parse::<PredicateArg>().is_err());
    }
}
