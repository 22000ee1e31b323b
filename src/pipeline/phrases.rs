//! Fixed phrase tables consulted on the request text.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Requests containing any of these run the full report.
pub const REPORT_TRIGGERS: &[&str] = &[
    "full report",
    "complete report",
    "generate report",
    "governance report",
    "access review report",
];

/// Entity synonyms and the default query listing that entity.
const LIST_ALL_TABLE: &[(&[&str], &str)] = &[
    (&["users", "people", "members", "persons"], "MATCH (u:User) RETURN u"),
    (&["groups", "teams"], "MATCH (g:Group) RETURN g"),
    (&["roles", "permissions", "privileges"], "MATCH (r:Role) RETURN r"),
    (&["departments", "depts", "divisions"], "MATCH (d:Department) RETURN d"),
];

static FALLBACK_BY_SYNONYM: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    LIST_ALL_TABLE
        .iter()
        .flat_map(|(synonyms, statement)| synonyms.iter().map(move |s| (*s, *statement)))
        .collect()
});

fn tokens(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Case-insensitive substring test against the report triggers.
pub fn is_report_request(text: &str) -> bool {
    let lowered = text.to_lowercase();
    REPORT_TRIGGERS.iter().any(|phrase| lowered.contains(phrase))
}

/// Default query for a "list all <entity>" request, if the text has that shape.
pub fn fallback_statement(text: &str) -> Option<&'static str> {
    tokens(text).windows(3).find_map(|window| {
        if window[0] == "list" && window[1] == "all" {
            FALLBACK_BY_SYNONYM.get(window[2].as_str()).copied()
        } else {
            None
        }
    })
}
