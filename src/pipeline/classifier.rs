//! Lexical classification of statements into mutation intents.
//!
//! Classification looks only at statement text, never at results, so
//! the same intent can be re-derived from logged statements.

use crate::models::MutationIntent;
use once_cell::sync::Lazy;
use regex::Regex;

/// `{rel}` is replaced by the relationship variable pattern.
const MEMBERSHIP_SHAPE: &str = r"\(\s*u(?:\s*:\s*User)?\s*\)\s*-\s*\[\s*{rel}\s*:\s*MEMBER_OF\s*\]\s*->\s*\(\s*g(?:\s*:\s*Group)?\s*\)";

const ROLE_SHAPE: &str = r"\(\s*u(?:\s*:\s*User)?\s*\)\s*-\s*\[\s*{rel}\s*:\s*HAS_ROLE\s*\]\s*->\s*\(\s*r(?:\s*:\s*Role)?\s*\)";

static MUTATING_KEYWORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:CREATE|MERGE|SET|DELETE)\b").expect("valid mutating keyword regex")
});

static STRING_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"'(?:[^'\\]|\\.)*'|"(?:[^"\\]|\\.)*""#).expect("valid string literal regex")
});

static DELETE_TARGETS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bDELETE\s+(\w+(?:\s*,\s*\w+)*)").expect("valid delete target regex")
});

enum IntentPattern {
    /// Shape binding a relationship variable that a later DELETE removes.
    Removal(Regex),
    /// MERGE or CREATE directly in front of the shape.
    Addition(Regex),
}

impl IntentPattern {
    fn removal(shape: &str) -> Self {
        let pattern = format!(r"(?is){}", shape.replace("{rel}", r"(?P<rel>\w+)"));
        Self::Removal(Regex::new(&pattern).expect("valid removal regex"))
    }

    fn addition(shape: &str) -> Self {
        let pattern = format!(r"(?is)\b(?:MERGE|CREATE)\s+{}", shape.replace("{rel}", r"\w*"));
        Self::Addition(Regex::new(&pattern).expect("valid addition regex"))
    }

    fn matches(&self, text: &str) -> bool {
        match self {
            Self::Removal(shape) => shape.captures_iter(text).any(|caps| {
                match (caps.get(0), caps.name("rel")) {
                    (Some(whole), Some(rel)) => deletes_variable(&text[whole.end()..], rel.as_str()),
                    _ => false,
                }
            }),
            Self::Addition(regex) => regex.is_match(text),
        }
    }
}

/// Ordered (pattern, intent) table; the first match wins.
static INTENT_PATTERNS: Lazy<Vec<(IntentPattern, MutationIntent)>> = Lazy::new(|| {
    vec![
        (IntentPattern::removal(MEMBERSHIP_SHAPE), MutationIntent::GroupMembershipRemove),
        (IntentPattern::addition(MEMBERSHIP_SHAPE), MutationIntent::GroupMembershipAdd),
        (IntentPattern::removal(ROLE_SHAPE), MutationIntent::RoleAssignmentRemove),
        (IntentPattern::addition(ROLE_SHAPE), MutationIntent::RoleAssignmentAdd),
    ]
});

fn deletes_variable(text: &str, variable: &str) -> bool {
    DELETE_TARGETS.captures_iter(text).any(|caps| {
        caps[1]
            .split(',')
            .any(|target| target.trim() == variable)
    })
}

/// Statement text with quoted literals emptied.
fn without_literals(statement: &str) -> String {
    STRING_LITERAL.replace_all(statement, "''").into_owned()
}

/// True when the upper-cased statement, literals aside, contains a
/// mutating keyword.
pub fn is_mutation(statement: &str) -> bool {
    MUTATING_KEYWORD.is_match(&without_literals(statement).to_uppercase())
}

/// Classify a statement.
///
/// Read statements and mutations with no identity relationship shape
/// (department CRUD, property updates) are both `NonMutating`: neither
/// is mirrored to the directory.
pub fn classify(statement: &str) -> MutationIntent {
    let text = without_literals(statement);
    if !MUTATING_KEYWORD.is_match(&text.to_uppercase()) {
        return MutationIntent::NonMutating;
    }

    INTENT_PATTERNS
        .iter()
        .find(|(pattern, _)| pattern.matches(&text))
        .map(|(_, intent)| *intent)
        .unwrap_or(MutationIntent::NonMutating)
}
