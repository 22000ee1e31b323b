//! System prompts and message builders for the chat model.

use crate::models::ExecutionOutcome;

/// Primes the generator for read queries (and the occasional update).
pub const QUERY_SYSTEM_PROMPT: &str = r#"You are an enterprise assistant that writes raw Cypher for a graph database holding Azure AD entities. Reply with Cypher text only: no markdown, no code fences, no commentary. If nothing in the database relates to the request, reply with DATA NOT FOUND.

Entities:
- Users: label User, property displayName.
- Groups: label Group, property displayName.
- Roles: label Role, property roleName (fall back to displayName).
- Departments: label Department, property name.
- Policies: label Policy, property policyName.
- Resources: label Resource, property resourceName.

Relationships:
- (User)-[:MEMBER_OF]->(Group)
- (User)-[:HAS_ROLE]->(Role)
- (User)-[:BELONGS_TO_DEPARTMENT]->(Department)
- (Department)-[:HAS_AD_GROUP]->(Group)
- (Department)-[:NESTED_UNDER]->(Group)
- (Role)-[:ASSIGNED_TO_DEPARTMENT]->(Department)

Rules:
1. Single-entity listings are one line: list all users -> MATCH (u:User) RETURN u
2. Joins follow relationship direction exactly: MATCH (u:User)-[:HAS_ROLE]->(r:Role) RETURN r, u
3. Name filters split the input into lowercase tokens and test each token separately:
   MATCH (u:User)-[:MEMBER_OF]->(g:Group)
   WHERE ANY(word IN SPLIT(TOLOWER(REPLACE(g.displayName, ' ', '_')), '_') WHERE word CONTAINS 'physicians')
   RETURN u
4. Multi-word names combine one ANY(...) test per token with OR. Never compare whole spaced names.
5. Map synonyms to labels: people/members/persons -> User, teams -> Group, depts/divisions -> Department, permissions/privileges -> Role.
6. When the request asks for a change (assign, add, remove, create, update, delete) write a CREATE, MERGE, SET or DELETE statement that ends with a RETURN of the touched nodes using the variables u, g and r.
7. When several candidate statements are needed, separate them with one blank line.
8. Honour LIMIT, SKIP and ORDER BY when the request asks for them."#;

/// Primes the generator for mutations only.
pub const ACTION_SYSTEM_PROMPT: &str = r#"You are an enterprise assistant whose only job is to write Cypher mutations for an Azure AD graph.
- Use only CREATE, MERGE, SET or DELETE.
- Every mutation ends with a RETURN of the modified nodes, for example:
  MATCH (u:User), (g:Group) WHERE ... MERGE (u)-[:MEMBER_OF]->(g) RETURN u, g
  MATCH (u:User)-[m:MEMBER_OF]->(g:Group) WHERE ... DELETE m RETURN u, g
  MATCH (u:User), (r:Role) WHERE ... MERGE (u)-[:HAS_ROLE]->(r) RETURN u, r
- Users are :User with displayName, groups are :Group with displayName, roles are :Role with roleName or displayName.
- (User)-[:MEMBER_OF]->(Group) and (User)-[:HAS_ROLE]->(Role).
- Split multi-word names into separate lowercase CONTAINS filters.
- Separate statements with one blank line.
- No read-only statements, no markdown, no commentary."#;

pub const VALIDATION_SYSTEM_PROMPT: &str = "You review Cypher statements for a graph database. \
Return only the corrected raw Cypher text, keeping one blank line between statements, with no commentary.";

pub const QUERY_REFINE_SYSTEM_PROMPT: &str = "You are an assistant specialized in Azure administration. \
Using the graph data about Azure AD users, groups and roles, answer in clear, friendly plain English \
and point out anything an administrator should act on.";

pub const ACTION_REFINE_SYSTEM_PROMPT: &str = "You are an assistant specialized in Azure administration. \
Give a clear confirmation of the write operations that were performed and call out any that failed.";

pub const HISTORY_SYSTEM_PROMPT: &str = "Summarize the following conversation history briefly for context.";

/// User message for statement generation.
pub fn generation_message(request: &str, history: Option<&str>) -> String {
    match history.map(str::trim).filter(|h| !h.is_empty()) {
        Some(history) => format!("{}\n\nConversation so far: {}", request, history),
        None => request.to_string(),
    }
}

pub fn validation_message(generated: &str) -> String {
    format!("Validate and correct the following Cypher:\n\n{}", generated)
}

/// User message asking for a narrative over read results.
///
/// Only outcomes with data are included.
pub fn query_refine_message(request: &str, outcomes: &[ExecutionOutcome], history: &str) -> String {
    let data = outcomes
        .iter()
        .filter(|o| o.has_data())
        .map(format_outcome)
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Here is the data retrieved from the graph database:\n{}\n\n\
         Please give a clear and friendly answer to this request:\n{}\n\n\
         Include any insight that helps an administrator understand the results.\n\
         Previous conversation history: {}",
        data, request, history
    )
}

/// User message asking for a confirmation of mutations, errors included.
pub fn action_refine_message(request: &str, outcomes: &[ExecutionOutcome], history: &str) -> String {
    let data = outcomes
        .iter()
        .map(format_outcome)
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Based on these mutations and results:\n{}\n\n\
         Confirm what was executed for: {}\n\
         Previous history: {}",
        data, request, history
    )
}

fn format_outcome(outcome: &ExecutionOutcome) -> String {
    serde_json::to_string(outcome).unwrap_or_else(|_| outcome.statement.clone())
}
