//! `CommandSpec` / `ArgSpec` (spec §3, §4.4, §4.5).

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use regex::Regex;
use serde_json::Value;

use crate::model::IncomingMessage;
use crate::privileges::Privileges;

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Accepts the raw token, returns the validated/coerced value or `None` on
/// rejection.
pub type Validator = Arc<dyn Fn(&str) -> Option<Value> + Send + Sync>;

/// Gates regex handlers: `pre(recipient_name, pm)`.
pub type Predicate = Arc<dyn Fn(&str, bool) -> bool + Send + Sync>;

/// Handler: receives the source message and the bound arguments, returns
/// zero, one, or many reply lines, or an error the `errors` middleware
/// translates into a user-facing message (spec §4.6, §7).
pub type Handler = Arc<
    dyn Fn(IncomingMessage, std::collections::HashMap<String, Value>) -> BoxFuture<Result<Vec<String>, crate::error::AppError>>
        + Send
        + Sync,
>;

#[derive(Clone)]
pub struct ArgSpec {
    pub key: String,
    pub validator: Validator,
    pub default: Option<Value>,
    pub optional: bool,
    pub rest: bool,
    pub example: Option<String>,
}

impl ArgSpec {
    pub fn required(key: impl Into<String>, validator: Validator) -> Self {
        Self { key: key.into(), validator, default: None, optional: false, rest: false, example: None }
    }

    pub fn optional(key: impl Into<String>, validator: Validator, default: Value) -> Self {
        Self { key: key.into(), validator, default: Some(default), optional: true, rest: false, example: None }
    }

    pub fn rest(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            validator: Arc::new(|s: &str| Some(Value::String(s.to_string()))),
            default: None,
            optional: false,
            rest: true,
            example: None,
        }
    }

    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.example = Some(example.into());
        self
    }

    /// Help-rendering form: `key` or `key=default` or `key(example)`.
    pub fn render(&self) -> String {
        let mut s = self.key.clone();
        if let Some(example) = &self.example {
            s.push('(');
            s.push_str(example);
            s.push(')');
        }
        if self.rest {
            s.push_str("...");
        }
        s
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandKind {
    Command,
    Action,
    Regex,
}

#[derive(Clone)]
pub struct CommandSpec {
    pub name: String,
    pub aliases: Vec<String>,
    pub kind: CommandKind,
    pub args: Vec<ArgSpec>,
    pub regex: Option<Regex>,
    pub predicate: Option<Predicate>,
    pub required_privileges: Privileges,
    pub handler: Handler,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SpecValidationError {
    #[error("at most one `rest` arg is allowed, and it must be last")]
    RestNotLast,
    #[error("optional args must follow all required args")]
    OptionalBeforeRequired,
    #[error("regex command must carry a compiled pattern")]
    MissingRegex,
}

/// Validates the ArgSpec ordering invariants from spec §3/§8 item 5:
/// at most one `rest`, it must be last; optional args follow required ones.
pub fn validate_arg_order(args: &[ArgSpec]) -> Result<(), SpecValidationError> {
    let rest_count = args.iter().filter(|a| a.rest).count();
    if rest_count > 1 {
        return Err(SpecValidationError::RestNotLast);
    }
    if let Some(pos) = args.iter().position(|a| a.rest) {
        if pos != args.len() - 1 {
            return Err(SpecValidationError::RestNotLast);
        }
    }
    let mut seen_optional = false;
    for arg in args {
        if arg.rest {
            continue;
        }
        if arg.optional {
            seen_optional = true;
        } else if seen_optional {
            return Err(SpecValidationError::OptionalBeforeRequired);
        }
    }
    Ok(())
}

impl CommandSpec {
    pub fn validate(&self) -> Result<(), SpecValidationError> {
        validate_arg_order(&self.args)?;
        if self.kind == CommandKind::Regex && self.regex.is_none() {
            return Err(SpecValidationError::MissingRegex);
        }
        Ok(())
    }

    /// `Syntax: !<name> <a> <b> [<c>]` rendering (spec §4.6, §8).
    pub fn syntax_help(&self, prefix: &str) -> String {
        let first_optional = self.args.iter().position(|a| a.optional && !a.rest);
        let mut parts = Vec::new();
        let mut closed_bracket = false;
        for (i, arg) in self.args.iter().enumerate() {
            let rendered = format!("<{}>", arg.render());
            if Some(i) == first_optional {
                parts.push(format!("[{rendered}"));
            } else {
                parts.push(rendered);
            }
        }
        if first_optional.is_some() {
            closed_bracket = true;
        }
        let mut body = parts.join(" ");
        if closed_bracket {
            body.push(']');
        }
        if body.is_empty() {
            format!("Syntax: {prefix}{}", self.name)
        } else {
            format!("Syntax: {prefix}{} {body}", self.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn any_str() -> Validator {
        Arc::new(|s: &str| Some(Value::String(s.to_string())))
    }

    #[test]
    fn rest_must_be_last() {
        let args = vec![ArgSpec::rest("body"), ArgSpec::required("a", any_str())];
        assert_eq!(validate_arg_order(&args), Err(SpecValidationError::RestNotLast));
    }

    #[test]
    fn only_one_rest_allowed() {
        let args = vec![ArgSpec::rest("a"), ArgSpec::rest("b")];
        assert_eq!(validate_arg_order(&args), Err(SpecValidationError::RestNotLast));
    }

    #[test]
    fn optional_must_follow_required() {
        let args = vec![
            ArgSpec::optional("a", any_str(), Value::Null),
            ArgSpec::required("b", any_str()),
        ];
        assert_eq!(validate_arg_order(&args), Err(SpecValidationError::OptionalBeforeRequired));
    }

    #[test]
    fn valid_ordering_passes() {
        let args = vec![
            ArgSpec::required("a", any_str()),
            ArgSpec::optional("b", any_str(), Value::Null),
            ArgSpec::rest("c"),
        ];
        assert!(validate_arg_order(&args).is_ok());
    }

    #[test]
    fn syntax_help_matches_spec_example() {
        let spec = CommandSpec {
            name: "alertuser".into(),
            aliases: vec![],
            kind: CommandKind::Command,
            args: vec![
                ArgSpec::required("a", any_str()),
                ArgSpec::required("b", any_str()),
                ArgSpec::optional("c", any_str(), Value::Null),
            ],
            regex: None,
            predicate: None,
            required_privileges: Privileges::NONE,
            handler: Arc::new(|_msg, _args| Box::pin(async { Ok(vec![]) })),
        };
        assert_eq!(spec.syntax_help("!"), "Syntax: !alertuser <a> <b> [<c>]");
    }
}
