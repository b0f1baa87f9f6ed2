//! Command Runtime (spec §4.6): `errors -> protected(privileges) ->
//! filter(predicate) -> arguments(specs) -> handler` pipeline, grounded on
//! the original plugin base's decorator stack (`errors`, `protected`,
//! `trigger_filter_and`, `arguments`).

use std::collections::HashMap;

use serde_json::Value;
use tracing::error;

use crate::error::AppError;
use crate::model::IncomingMessage;

use super::binder::{bind, SyntaxError};
use super::registry::MatchedCommand;
use super::spec::CommandSpec;

/// Runs the full decorator pipeline for a matched command against an
/// inbound message, returning the reply lines to send (possibly empty).
pub async fn dispatch(matched: &MatchedCommand<'_>, msg: IncomingMessage) -> Vec<String> {
    let spec = &matched.spec;

    // protected(required_privileges)
    if !msg.sender.privileges.has(spec.required_privileges) {
        return vec!["You don't have the required privileges to trigger this command.".to_string()];
    }

    // filter(predicate) — short-circuits (no reply) on rejection.
    if let Some(pred) = &spec.predicate {
        if !pred(&msg.recipient.name, msg.pm) {
            return vec![];
        }
    }

    // arguments(specs), wrapped by errors() below.
    match bind_and_run(spec, matched.remaining_tokens.clone(), msg).await {
        Ok(lines) => lines,
        Err(RuntimeError::Syntax) => vec![spec.syntax_help("!")],
        Err(RuntimeError::Backend(msg)) => vec![msg],
        Err(RuntimeError::GenericBot(msg)) => vec![msg],
        Err(RuntimeError::Internal(e)) => {
            error!(error = %e, command = %spec.name, "uncaught error in command handler");
            vec!["An internal error occurred.".to_string()]
        }
    }
}

enum RuntimeError {
    Syntax,
    Backend(String),
    GenericBot(String),
    Internal(AppError),
}

impl From<SyntaxError> for RuntimeError {
    fn from(_: SyntaxError) -> Self {
        RuntimeError::Syntax
    }
}

impl From<AppError> for RuntimeError {
    fn from(e: AppError) -> Self {
        match e {
            AppError::BackendResponse(m) => RuntimeError::Backend(m),
            AppError::BackendFatal(_) => RuntimeError::Backend("API Error: request failed".to_string()),
            AppError::GenericBot(m) => RuntimeError::GenericBot(m),
            other => RuntimeError::Internal(other),
        }
    }
}

async fn bind_and_run(
    spec: &CommandSpec,
    tokens: Vec<&str>,
    msg: IncomingMessage,
) -> Result<Vec<String>, RuntimeError> {
    let bound: HashMap<String, Value> = bind(&spec.args, &tokens)?;
    let lines = (spec.handler)(msg, bound).await?;
    Ok(lines)
}
