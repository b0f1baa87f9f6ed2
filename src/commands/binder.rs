//! Argument Binder (spec §4.5), grounded on the original plugin base's
//! `arguments()` decorator (zip-with-padding, rest coalescing,
//! `BotSyntaxError` on mismatch).

use std::collections::HashMap;

use serde_json::Value;

use super::spec::ArgSpec;

#[derive(Debug, thiserror::Error)]
#[error("syntax error")]
pub struct SyntaxError;

/// Binds `tokens` (the message split on whitespace, command name already
/// stripped) against `specs`.
pub fn bind(specs: &[ArgSpec], tokens: &[&str]) -> Result<HashMap<String, Value>, SyntaxError> {
    let mut tokens: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();

    // If the last spec is `rest=true`, coalesce tokens [n-1..end] into one
    // string joined by single spaces (spec §4.5).
    if let Some(last) = specs.last() {
        if last.rest && specs.len() >= 1 {
            let split_at = specs.len() - 1;
            if tokens.len() > split_at {
                let joined = tokens[split_at..].join(" ");
                tokens.truncate(split_at);
                tokens.push(joined);
            }
        }
    }

    let mut bound = HashMap::new();
    for (i, spec) in specs.iter().enumerate() {
        let token = tokens.get(i);
        match token {
            Some(t) => match (spec.validator)(t) {
                Some(value) => {
                    bound.insert(spec.key.clone(), value);
                }
                None => {
                    if spec.optional {
                        bound.insert(spec.key.clone(), spec.default.clone().unwrap_or(Value::Null));
                    } else {
                        return Err(SyntaxError);
                    }
                }
            },
            None => {
                if spec.optional {
                    bound.insert(spec.key.clone(), spec.default.clone().unwrap_or(Value::Null));
                } else {
                    return Err(SyntaxError);
                }
            }
        }
    }

    // Excess tokens beyond the declared specs are a syntax error, unless
    // the last spec already absorbed them via `rest`.
    let absorbs_rest = specs.last().map(|s| s.rest).unwrap_or(false);
    if !absorbs_rest && tokens.len() > specs.len() {
        return Err(SyntaxError);
    }

    Ok(bound)
}
