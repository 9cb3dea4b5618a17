use std::fs;
use std::path::Path;

use crate::errors::LinkError;
use crate::matcher::{EdgeRule, NamePattern};

/// Which way generated edges point relative to the rule's target node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenDirection {
    /// `"REGEX" -> NAME`: each matched node gains an edge to NAME.
    ToTarget,
    /// `"REGEX" <- NAME`: NAME gains an edge to each matched node.
    FromTarget,
}

/// One parsed edge-generation rule.
#[derive(Clone, Debug)]
pub struct GenRule {
    pub pattern: NamePattern,
    pub direction: GenDirection,
    pub target: String,
}

fn read(path: &Path) -> Result<String, LinkError> {
    fs::read_to_string(path).map_err(|err| LinkError::io(path, err))
}

/// Load a name list: one node name per line, trimmed, blank lines skipped.
/// There is no comment syntax here; a node name may legitimately begin
/// with `#`.
pub fn load_name_list(path: &Path) -> Result<Vec<String>, LinkError> {
    let text = read(path)?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Load node-selection patterns: one regex per line, prefix anchored.
pub fn load_patterns(path: &Path) -> Result<Vec<NamePattern>, LinkError> {
    let text = read(path)?;
    let mut patterns = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        patterns.push(NamePattern::prefix(line)?);
    }
    Ok(patterns)
}

/// Load edge-removal rules: two whitespace-separated patterns per line,
/// source first, destination second.
pub fn load_edge_rules(path: &Path) -> Result<Vec<EdgeRule>, LinkError> {
    let text = read(path)?;
    let mut rules = Vec::new();
    for (number, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let &[source, dest] = tokens.as_slice() else {
            return Err(LinkError::config_at(
                path,
                number + 1,
                format!("expected 2 patterns, found {}", tokens.len()),
            ));
        };
        rules.push(EdgeRule::new(source, dest)?);
    }
    Ok(rules)
}

/// Load edge-generation rules: `"REGEX" -> NAME` or `"REGEX" <- NAME` per
/// line. Inside the quotes `\"` stands for a literal quote; every other
/// escape belongs to the regex.
pub fn load_gen_rules(path: &Path) -> Result<Vec<GenRule>, LinkError> {
    let text = read(path)?;
    let mut rules = Vec::new();
    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (pattern_text, direction, target) = split_gen_rule(line)
            .map_err(|message| LinkError::config_at(path, number + 1, message))?;
        let pattern = NamePattern::prefix(pattern_text)?;
        rules.push(GenRule {
            pattern,
            direction,
            target,
        });
    }
    Ok(rules)
}

fn split_gen_rule(line: &str) -> Result<(String, GenDirection, String), String> {
    let Some(rest) = line.strip_prefix('"') else {
        return Err("expected a quoted regex".into());
    };
    let mut pattern = String::new();
    let mut chars = rest.chars();
    let mut closed = false;
    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                closed = true;
                break;
            }
            '\\' => match chars.next() {
                Some('"') => pattern.push('"'),
                Some(other) => {
                    pattern.push('\\');
                    pattern.push(other);
                }
                None => return Err("unterminated escape in quoted regex".into()),
            },
            other => pattern.push(other),
        }
    }
    if !closed {
        return Err("unterminated quoted regex".into());
    }

    let rest = chars.as_str().trim_start();
    let (direction, rest) = if let Some(rest) = rest.strip_prefix("->") {
        (GenDirection::ToTarget, rest)
    } else if let Some(rest) = rest.strip_prefix("<-") {
        (GenDirection::FromTarget, rest)
    } else {
        return Err("expected '->' or '<-' after the quoted regex".into());
    };

    let target = rest.trim();
    if target.is_empty() {
        return Err("expected a target node name".into());
    }
    if target.split_whitespace().count() > 1 {
        return Err("target node name must be a single token".into());
    }
    Ok((pattern, direction, target.to_string()))
}
