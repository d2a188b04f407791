//! Record routing
//!
//! Routes are named conditions over record payloads. Each sink declares
//! the route names it accepts; a sink with no routes accepts every record.
//! A record is delivered to every sink whose route set intersects the
//! routes the record matched, so routing is selection, not partitioning.
//!
//! Conditions are a small expression language over dotted field paths:
//!
//! ```text
//! log.level == "error"
//! status != 200
//! message contains "timeout"
//! error.stack exists
//! ```
//!
//! Literals are JSON: strings are quoted, numbers and booleans bare.

use thiserror::Error;

use weir_model::{DataFlowComponent, Record, RouteDeclaration};

/// Errors compiling route conditions
#[derive(Debug, Error)]
pub enum RouterError {
    /// A condition expression is malformed
    #[error("route '{route}': invalid condition '{condition}': {message}")]
    InvalidCondition {
        /// The route being compiled
        route: String,
        /// The offending expression
        condition: String,
        /// What went wrong
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Eq,
    Ne,
    Contains,
    Exists,
}

/// One compiled condition: a field path, an operator, and for binary
/// operators a literal operand
#[derive(Debug)]
struct Condition {
    path: String,
    operator: Operator,
    literal: Option<serde_json::Value>,
}

impl Condition {
    fn parse(expression: &str) -> Result<Self, String> {
        let expression = expression.trim();
        let Some((path, rest)) = expression.split_once(char::is_whitespace) else {
            return Err("expected '<path> <operator> [literal]'".to_string());
        };
        let rest = rest.trim();

        if rest == "exists" {
            return Ok(Self {
                path: path.to_string(),
                operator: Operator::Exists,
                literal: None,
            });
        }

        let Some((operator, literal)) = rest.split_once(char::is_whitespace) else {
            return Err(format!("unknown operator '{rest}'"));
        };
        let operator = match operator {
            "==" => Operator::Eq,
            "!=" => Operator::Ne,
            "contains" => Operator::Contains,
            other => return Err(format!("unknown operator '{other}'")),
        };

        let literal: serde_json::Value = serde_json::from_str(literal.trim())
            .map_err(|e| format!("invalid literal: {e}"))?;
        if operator == Operator::Contains && !literal.is_string() {
            return Err("'contains' requires a string literal".to_string());
        }

        Ok(Self {
            path: path.to_string(),
            operator,
            literal: Some(literal),
        })
    }

    /// Whether `record` satisfies this condition; absent fields satisfy
    /// nothing
    fn matches(&self, record: &Record) -> bool {
        let value = record.get(&self.path);
        match self.operator {
            Operator::Exists => value.is_some(),
            Operator::Eq => value == self.literal.as_ref(),
            Operator::Ne => value.is_some_and(|v| Some(v) != self.literal.as_ref()),
            Operator::Contains => match (value, &self.literal) {
                (Some(serde_json::Value::String(s)), Some(serde_json::Value::String(needle))) => {
                    s.contains(needle.as_str())
                }
                _ => false,
            },
        }
    }
}

#[derive(Debug)]
struct CompiledRoute {
    name: String,
    condition: Condition,
}

/// A pipeline's compiled route table
#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<CompiledRoute>,
}

impl Router {
    /// Whether the pipeline declares no routes
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Declared route names, in declaration order
    pub fn route_names(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(|r| r.name.as_str())
    }

    /// Select the records from `records` destined for `component`
    ///
    /// Unrouted components receive the whole batch. Routed components
    /// receive each record matching at least one of their routes.
    pub fn select<T>(&self, records: &[Record], component: &DataFlowComponent<T>) -> Vec<Record> {
        if component.accepts_all() {
            return records.to_vec();
        }

        records
            .iter()
            .filter(|record| {
                self.routes.iter().any(|route| {
                    component.routes().contains(&route.name) && route.condition.matches(record)
                })
            })
            .cloned()
            .collect()
    }
}

/// Compiles declarations into a [`Router`]
///
/// Swappable so hosts can plug in a richer condition language.
pub trait RouterFactory: Send + Sync {
    fn build(&self, routes: &[RouteDeclaration]) -> Result<Router, RouterError>;
}

/// Factory for the built-in condition language
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultRouterFactory;

impl RouterFactory for DefaultRouterFactory {
    fn build(&self, routes: &[RouteDeclaration]) -> Result<Router, RouterError> {
        let routes = routes
            .iter()
            .map(|declaration| {
                let condition = Condition::parse(&declaration.condition).map_err(|message| {
                    RouterError::InvalidCondition {
                        route: declaration.name.clone(),
                        condition: declaration.condition.clone(),
                        message,
                    }
                })?;
                Ok(CompiledRoute {
                    name: declaration.name.clone(),
                    condition,
                })
            })
            .collect::<Result<Vec<_>, RouterError>>()?;

        Ok(Router { routes })
    }
}

#[cfg(test)]
#[path = "router_test.rs"]
mod tests;
