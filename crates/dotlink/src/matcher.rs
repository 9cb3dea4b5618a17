use regex::{Captures, Regex};

use crate::errors::LinkError;

/// A compiled pattern over node names.
///
/// Anchoring is positional: a pattern compiled with [`NamePattern::prefix`]
/// matches from the start of the name, one compiled for the destination side
/// of an [`EdgeRule`] matches up to the end. Explicit `^` and `$` inside the
/// pattern compose with the implicit anchor, so `^name$` always means the
/// whole name and nothing else.
#[derive(Clone, Debug)]
pub struct NamePattern {
    raw: String,
    regex: Regex,
}

impl NamePattern {
    /// Compile a pattern that matches a prefix of the node name.
    pub fn prefix(raw: impl Into<String>) -> Result<Self, LinkError> {
        let raw = raw.into();
        let regex = compile_wrapped(&raw, &format!("^(?:{raw})"))?;
        Ok(Self { raw, regex })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    fn captures<'a>(&self, name: &'a str) -> Option<Captures<'a>> {
        self.regex.captures(name)
    }

    fn group_count(&self) -> usize {
        self.regex.captures_len() - 1
    }
}

/// One piece of a destination pattern: either regex text kept verbatim or a
/// `\N` backreference resolved against the source pattern's captures.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Group(usize),
}

#[derive(Clone, Debug)]
enum DestMatcher {
    /// No backreferences: compiled once, suffix anchored.
    Fixed(Regex),
    /// Backreferences present: expanded and recompiled per source match.
    Template(Vec<Segment>),
}

/// A source/destination pattern pair matched against an edge.
///
/// The source side matches a prefix of the tail node name and records its
/// capture groups. The destination side matches a suffix of the head node
/// name and may reference those captures as `\1` through `\9`; captured text
/// is substituted literally, so a captured `a.b` only ever matches `a.b`.
#[derive(Clone, Debug)]
pub struct EdgeRule {
    source: NamePattern,
    dest_raw: String,
    dest: DestMatcher,
}

impl EdgeRule {
    pub fn new(source: impl Into<String>, dest: impl Into<String>) -> Result<Self, LinkError> {
        let source = NamePattern::prefix(source)?;
        let dest_raw = dest.into();
        let segments = parse_segments(&dest_raw);
        let uses_groups = segments
            .iter()
            .any(|segment| matches!(segment, Segment::Group(_)));
        if !uses_groups {
            let regex = compile_wrapped(&dest_raw, &format!("(?:{dest_raw})$"))?;
            return Ok(Self {
                source,
                dest_raw,
                dest: DestMatcher::Fixed(regex),
            });
        }

        let highest = segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Group(index) => Some(*index),
                Segment::Literal(_) => None,
            })
            .max()
            .unwrap_or(0);
        if highest > source.group_count() {
            return Err(LinkError::pattern(
                &dest_raw,
                format!(
                    "backreference \\{highest} exceeds the {} capture group(s) of '{}'",
                    source.group_count(),
                    source.as_str()
                ),
            ));
        }

        // Prove the surrounding regex text is well formed before any edge is
        // matched, by expanding every group to the empty string.
        let probe = expand(&segments, |_| Some(""));
        compile_wrapped(&dest_raw, &format!("(?:{probe})$"))?;

        Ok(Self {
            source,
            dest_raw,
            dest: DestMatcher::Template(segments),
        })
    }

    pub fn source_str(&self) -> &str {
        self.source.as_str()
    }

    pub fn dest_str(&self) -> &str {
        &self.dest_raw
    }

    /// Does this rule select the edge `from -> to`?
    pub fn matches(&self, from: &str, to: &str) -> Result<bool, LinkError> {
        let Some(captures) = self.source.captures(from) else {
            return Ok(false);
        };
        match &self.dest {
            DestMatcher::Fixed(regex) => Ok(regex.is_match(to)),
            DestMatcher::Template(segments) => {
                let expanded = expand(segments, |index| {
                    captures.get(index).map(|group| group.as_str())
                });
                let regex = compile_wrapped(&self.dest_raw, &format!("(?:{expanded})$"))?;
                Ok(regex.is_match(to))
            }
        }
    }
}

/// Split a destination pattern into literal regex text and `\N` group
/// references. Every other escape (`\d`, `\\`, ...) is left in the literal
/// text for the regex engine to interpret.
fn parse_segments(raw: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            literal.push(ch);
            continue;
        }
        match chars.next() {
            Some(digit @ '1'..='9') => {
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Group(digit as usize - '0' as usize));
            }
            Some(other) => {
                literal.push('\\');
                literal.push(other);
            }
            None => literal.push('\\'),
        }
    }
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    segments
}

/// Rebuild the destination pattern text with each group replaced by the
/// escaped captured text. A group the source matched as empty or not at all
/// expands to nothing.
fn expand<'a, F>(segments: &[Segment], mut group: F) -> String
where
    F: FnMut(usize) -> Option<&'a str>,
{
    let mut out = String::new();
    for segment in segments {
        match segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::Group(index) => {
                if let Some(text) = group(*index) {
                    out.push_str(&regex::escape(text));
                }
            }
        }
    }
    out
}

fn compile_wrapped(raw: &str, wrapped: &str) -> Result<Regex, LinkError> {
    Regex::new(wrapped).map_err(|err| LinkError::pattern(raw, err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_pattern_unanchored_expected_prefix_match() {
        let pattern = NamePattern::prefix("foo").expect("pattern compiles");

        assert!(pattern.is_match("foo"));
        assert!(pattern.is_match("foobar"));
        assert!(!pattern.is_match("xfoo"));
    }

    #[test]
    fn prefix_pattern_fully_anchored_expected_exact_match_only() {
        let pattern = NamePattern::prefix("^main$").expect("pattern compiles");

        assert!(pattern.is_match("main"));
        assert!(!pattern.is_match("main_loop"));
        assert!(!pattern.is_match("run_main"));
    }

    #[test]
    fn prefix_pattern_invalid_regex_expected_pattern_error() {
        let err = NamePattern::prefix("fo(o").expect_err("unbalanced paren");
        assert!(matches!(err, LinkError::Pattern { .. }));
    }

    #[test]
    fn edge_rule_fixed_dest_expected_suffix_match() {
        let rule = EdgeRule::new("main", "free").expect("rule compiles");

        assert!(rule.matches("main", "free").expect("match"));
        assert!(rule.matches("main_loop", "my_free").expect("match"));
        assert!(!rule.matches("main", "free_list").expect("match"));
        assert!(!rule.matches("other", "free").expect("match"));
    }

    #[test]
    fn edge_rule_backreference_expected_captured_text_substituted() {
        let rule = EdgeRule::new(r"(\w+)_impl", r"\1").expect("rule compiles");

        assert!(rule.matches("list_impl", "list").expect("match"));
        assert!(rule.matches("list_impl", "my_list").expect("match"));
        assert!(!rule.matches("list_impl", "set").expect("match"));
        assert!(!rule.matches("list", "list").expect("match"));
    }

    #[test]
    fn edge_rule_backreference_expected_captured_metacharacters_literal() {
        let rule = EdgeRule::new(r"(.*)", r"\1").expect("rule compiles");

        assert!(rule.matches("a.b", "a.b").expect("match"));
        assert!(!rule.matches("a.b", "axb").expect("match"));
    }

    #[test]
    fn edge_rule_unmatched_group_expected_empty_substitution() {
        let rule = EdgeRule::new("(xyz)?start", r"end\1").expect("rule compiles");

        assert!(rule.matches("start", "end").expect("match"));
        assert!(rule.matches("xyzstart", "endxyz").expect("match"));
        assert!(!rule.matches("start", "endxyz").expect("match"));
    }

    #[test]
    fn edge_rule_backreference_out_of_range_expected_pattern_error() {
        let err = EdgeRule::new("(a)", r"\2").expect_err("only one group");
        assert!(matches!(err, LinkError::Pattern { .. }));
    }

    #[test]
    fn edge_rule_plain_escape_in_dest_expected_passed_through() {
        let rule = EdgeRule::new("alloc", r"\d+").expect("rule compiles");

        assert!(rule.matches("alloc", "page42").expect("match"));
        assert!(!rule.matches("alloc", "page").expect("match"));
    }

    #[test]
    fn edge_rule_dest_fully_anchored_expected_exact_match_only() {
        let rule = EdgeRule::new("a", "^free$").expect("rule compiles");

        assert!(rule.matches("a", "free").expect("match"));
        assert!(!rule.matches("a", "my_free").expect("match"));
    }
}
