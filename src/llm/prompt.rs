//! Prompt construction for the planner and synthesizer calls.
//!
//! Both prompts embed the task database description and the authenticated
//! user verbatim. Nothing is escaped.

use crate::auth::User;
use crate::db::Schema;

/// Template for the decomposition call.
const PLAN_PROMPT_TEMPLATE: &str = r#"Find: {request}
Task: write only the list of sub-queries (in natural language, no SQL) and the order in which to run them
      so they can be combined into one main SQL query. Nothing else, no explanations.

DATABASE STRUCTURE:
{schema}
User who wrote this request:
{user}
Expected answer format:
Sub-query 1:
    Fetch the needed data from table X
    Apply basic filters
    Select key fields
Sub-query 2:
    Fetch related data from table Y
    Apply additional conditions
    Select the needed fields
Execution order:
    Run sub-query 1
    Use the results of sub-query 1 in sub-query 2
    Apply final conditions
Join scheme:
    Join the results of all sub-queries
    State the join conditions
    Select the final fields"#;

/// Template for the SQL synthesis call.
const SQL_PROMPT_TEMPLATE: &str = r#"Find: {request}
Task: write one PostgreSQL query that answers the request, following the plan below.

PLAN:
{plan}

DATABASE STRUCTURE:
{schema}
User who wrote this request:
{user}
OUTPUT FORMAT:
Answer with exactly one code block that starts with ```sql on its own line and ends with ``` on its own line.
Nothing before or after the code block."#;

/// Builds the prompt asking for a list of natural-language sub-steps.
pub fn build_plan_prompt(request: &str, user: &User) -> String {
    let schema = Schema::task_db().format_for_llm();
    let user = user.to_string();
    render(
        PLAN_PROMPT_TEMPLATE,
        &[("{request}", request), ("{schema}", &schema), ("{user}", &user)],
    )
}

/// Builds the prompt asking for one fenced SQL statement.
///
/// An empty plan is embedded as-is.
pub fn build_sql_prompt(request: &str, plan: &str, user: &User) -> String {
    let schema = Schema::task_db().format_for_llm();
    let user = user.to_string();
    render(
        SQL_PROMPT_TEMPLATE,
        &[
            ("{request}", request),
            ("{plan}", plan),
            ("{schema}", &schema),
            ("{user}", &user),
        ],
    )
}

/// Substitutes placeholders found in `template` in a single pass.
///
/// Inserted values are never scanned again, so braces in user text, the
/// request or the plan come through verbatim.
fn render(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        rest = &rest[start..];

        match values.iter().find(|(key, _)| rest.starts_with(key)) {
            Some((key, value)) => {
                out.push_str(value);
                rest = &rest[key.len()..];
            }
            None => {
                out.push('{');
                rest = &rest[1..];
            }
        }
    }

    out.push_str(rest);
    out
}
