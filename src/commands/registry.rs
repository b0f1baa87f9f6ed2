//! Command Registry (spec §4.4): trie over whitespace tokens for literal
//! and action commands (longest-prefix match), regex fallback tried in
//! registration order.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::AppError;

use super::spec::{CommandKind, CommandSpec};

const ACTION_SENTINEL: &str = "\x01ACTION ";

#[derive(Default)]
struct TrieNode {
    command: Option<Arc<CommandSpec>>,
    children: HashMap<String, TrieNode>,
}

#[derive(Default)]
struct Trie {
    root: TrieNode,
}

impl Trie {
    fn insert(&mut self, tokens: &[&str], spec: Arc<CommandSpec>) {
        let mut node = &mut self.root;
        for tok in tokens {
            node = node.children.entry(tok.to_ascii_lowercase()).or_default();
        }
        node.command = Some(spec);
    }

    /// Longest-prefix match over whitespace-split tokens.
    fn longest_match<'a>(&self, tokens: &[&'a str]) -> Option<(Arc<CommandSpec>, &'a [&'a str])> {
        let mut node = &self.root;
        let mut best: Option<(Arc<CommandSpec>, usize)> = None;
        for (i, tok) in tokens.iter().enumerate() {
            match node.children.get(&tok.to_ascii_lowercase()) {
                Some(next) => {
                    node = next;
                    if let Some(spec) = &node.command {
                        best = Some((spec.clone(), i + 1));
                    }
                }
                None => break,
            }
        }
        best.map(|(spec, consumed)| (spec, &tokens[consumed..]))
    }
}

pub struct MatchedCommand<'a> {
    pub spec: Arc<CommandSpec>,
    pub remaining_tokens: Vec<&'a str>,
}

#[derive(Default)]
pub struct CommandRegistry {
    prefix: String,
    literal_trie: Trie,
    action_trie: Trie,
    regexes: Vec<Arc<CommandSpec>>,
    canonical_names: std::collections::HashSet<String>,
}

impl CommandRegistry {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into(), ..Default::default() }
    }

    /// Registers a command, its aliases, and validates the §3 invariants
    /// (unique canonical names, ArgSpec ordering). Rejections happen here,
    /// at registration time, per spec §8 item 5.
    pub fn register(&mut self, spec: CommandSpec) -> Result<(), AppError> {
        spec.validate().map_err(|e| AppError::Internal(e.to_string()))?;
        if !self.canonical_names.insert(spec.name.clone()) {
            return Err(AppError::Internal(format!("duplicate canonical command name: {}", spec.name)));
        }

        let spec = Arc::new(spec);
        match spec.kind {
            CommandKind::Regex => self.regexes.push(spec),
            CommandKind::Command => self.insert_name_and_aliases(spec, true),
            CommandKind::Action => self.insert_name_and_aliases(spec, false),
        }
        Ok(())
    }

    fn insert_name_and_aliases(&mut self, spec: Arc<CommandSpec>, literal: bool) {
        let trie = if literal { &mut self.literal_trie } else { &mut self.action_trie };
        let name_tokens: Vec<&str> = spec.name.split_whitespace().collect();
        trie.insert(&name_tokens, spec.clone());
        for alias in &spec.aliases {
            let alias_tokens: Vec<&str> = alias.split_whitespace().collect();
            trie.insert(&alias_tokens, spec.clone());
        }
    }

    /// Resolves a message body to at most one handler (spec §4.4: "A
    /// message matches at most one handler; the literal/action tries take
    /// precedence over regex").
    pub fn resolve<'a>(&self, body: &'a str, recipient_name: &str, pm: bool) -> Option<MatchedCommand<'a>> {
        if let Some(rest) = body.strip_prefix(&self.prefix) {
            let tokens: Vec<&str> = rest.split_whitespace().collect();
            if let Some((spec, remaining)) = self.literal_trie.longest_match(&tokens) {
                return Some(MatchedCommand { spec, remaining_tokens: remaining.to_vec() });
            }
        }
        if let Some(rest) = body.strip_prefix(ACTION_SENTINEL) {
            let tokens: Vec<&str> = rest.split_whitespace().collect();
            if let Some((spec, remaining)) = self.action_trie.longest_match(&tokens) {
                return Some(MatchedCommand { spec, remaining_tokens: remaining.to_vec() });
            }
        }
        for spec in &self.regexes {
            let allowed = match &spec.predicate {
                Some(pred) => pred(recipient_name, pm),
                None => true,
            };
            if !allowed {
                continue;
            }
            if let Some(re) = &spec.regex {
                if re.is_match(body) {
                    return Some(MatchedCommand { spec: spec.clone(), remaining_tokens: vec![] });
                }
            }
        }
        None
    }
}
