//! End-to-end dialogue tests with mock adapters and a mock completion client.

use std::io::Cursor;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use smart_line::app::{Orchestrator, RunOutcome};
use smart_line::auth::{AuthOutcome, Authenticator, Credentials, AUTH_QUERY};
use smart_line::config::LlmConfig;
use smart_line::console::Console;
use smart_line::db::{ColumnInfo, ExecOutcome, MockDatabaseClient, QueryResult, Value};
use smart_line::llm::MockLlmClient;

const ANA: &str = "Ana\nLee\nana@x.com\nalee\n";

/// A `users` table with one active and one deactivated account. The lookup
/// is answered from the bound parameters the way the store would.
fn task_db(answer: QueryResult) -> MockDatabaseClient {
    let users = [
        ("Ana", "Lee", "ana@x.com", "alee", true),
        ("Bo", "Kim", "bo@x.com", "bkim", false),
    ];

    MockDatabaseClient::with_handler(move |query, params| {
        if query != AUTH_QUERY {
            return Ok(ExecOutcome::Rows(answer.clone()));
        }

        let wanted: Vec<&str> = params.iter().filter_map(Value::as_str).collect();
        let rows = users
            .iter()
            .filter(|(first, last, email, username, active)| {
                *active && wanted == [*first, *last, *email, *username]
            })
            .map(|(first, last, email, username, active)| {
                vec![
                    Value::from(*first),
                    Value::from(*last),
                    Value::from(*username),
                    Value::from(*email),
                    Value::Bool(*active),
                ]
            })
            .collect();

        Ok(ExecOutcome::Rows(QueryResult::with_data(
            ["first_name", "last_name", "username", "email", "is_active"]
                .into_iter()
                .map(|c| ColumnInfo::new(c, "VARCHAR"))
                .collect(),
            rows,
        )))
    })
}

fn select_one() -> QueryResult {
    QueryResult::with_data(
        vec![ColumnInfo::new("?column?", "INT4")],
        vec![vec![Value::Int(1)]],
    )
}

async fn run_dialogue(
    db: &MockDatabaseClient,
    llm: &MockLlmClient,
    input: &str,
) -> (RunOutcome, String) {
    let orchestrator = Orchestrator::new(
        Box::new(db.clone()),
        Arc::new(llm.clone()),
        &LlmConfig::default(),
    );
    let mut console = Console::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());
    let outcome = orchestrator.run(&mut console).await.unwrap();
    (outcome, String::from_utf8(console.into_writer()).unwrap())
}

#[tokio::test]
async fn test_active_user_is_authenticated() {
    let db = task_db(QueryResult::new());
    let mut auth = Authenticator::new(Box::new(db));

    let outcome = auth
        .authenticate(&Credentials::new("Ana", "Lee", "ana@x.com", "alee"))
        .await
        .unwrap();

    match outcome {
        AuthOutcome::Found(user) => {
            assert_eq!(user.first_name(), "Ana");
            assert_eq!(user.email(), "ana@x.com");
        }
        AuthOutcome::NotFound => panic!("expected Ana to be found"),
    }
}

#[tokio::test]
async fn test_deactivated_user_is_not_found() {
    let db = task_db(QueryResult::new());
    let llm = MockLlmClient::new();

    let mut auth = Authenticator::new(Box::new(db.clone()));
    let outcome = auth
        .authenticate(&Credentials::new("Bo", "Kim", "bo@x.com", "bkim"))
        .await
        .unwrap();
    assert_eq!(outcome, AuthOutcome::NotFound);

    let (outcome, shown) = run_dialogue(&db, &llm, "Bo\nKim\nbo@x.com\nbkim\n").await;
    assert_eq!(outcome, RunOutcome::AuthenticationFailed);
    assert!(shown.ends_with("Check your data\n"));
}

#[tokio::test]
async fn test_planner_failure_still_synthesizes_with_empty_plan() {
    let db = task_db(select_one());
    let llm = MockLlmClient::new()
        .with_failure("llama", 500)
        .with_response("gpt-4o", "```sql\nSELECT 1\n```");

    let (outcome, _) = run_dialogue(&db, &llm, &format!("{ANA}anything\nconsole\n")).await;

    let requests = llm.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].model, "meta-llama/llama-4-maverick:free");
    assert_eq!(requests[1].model, "openai/gpt-4o-mini");
    assert!(requests[1].prompt().contains("PLAN:\n\n"));
    assert_eq!(outcome, RunOutcome::Printed { rows: 1 });
}

#[tokio::test]
async fn test_both_remote_calls_failing_is_nothing_found() {
    let db = task_db(select_one());
    let llm = MockLlmClient::new()
        .with_failure("llama", 500)
        .with_failure("gpt-4o", 503);

    let (outcome, shown) = run_dialogue(&db, &llm, &format!("{ANA}anything\nconsole\n")).await;

    assert_eq!(outcome, RunOutcome::NothingFound);
    assert!(shown.ends_with("Nothing found\n"));
    assert_eq!(db.executed_queries(), vec![AUTH_QUERY.to_string()]);
}

#[tokio::test]
async fn test_fenced_select_one_is_executed_and_printed() {
    let db = task_db(select_one());
    let llm = MockLlmClient::new()
        .with_response("llama", "Sub-query 1: a constant")
        .with_response("gpt-4o", "```sql\nSELECT 1\n```");

    let (outcome, shown) = run_dialogue(&db, &llm, &format!("{ANA}one\nconsole\n")).await;

    assert_eq!(
        db.executed_queries(),
        vec![AUTH_QUERY.to_string(), "SELECT 1".to_string()]
    );
    assert_eq!(outcome, RunOutcome::Printed { rows: 1 });
    assert!(shown.contains("{?column?: 1}\n"));
}

#[tokio::test]
async fn test_fenced_select_one_is_written_to_csv() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("one.csv");
    let db = task_db(select_one());
    let llm = MockLlmClient::new()
        .with_response("llama", "Sub-query 1: a constant")
        .with_response("gpt-4o", "```sql\nSELECT 1\n```");

    let input = format!("{ANA}one\ncsv\n{}\n", path.display());
    let (outcome, _) = run_dialogue(&db, &llm, &input).await;

    assert_eq!(
        outcome,
        RunOutcome::Written {
            path: path.clone(),
            rows: 1
        }
    );
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "1\n");
}

#[tokio::test]
async fn test_empty_result_prints_nothing_found_for_console() {
    let db = task_db(QueryResult::new());
    let llm = MockLlmClient::new()
        .with_response("llama", "Sub-query 1: nothing")
        .with_response("gpt-4o", "```sql\nSELECT * FROM tasks WHERE false\n```");

    let (outcome, shown) = run_dialogue(&db, &llm, &format!("{ANA}nothing\nconsole\n")).await;

    assert_eq!(outcome, RunOutcome::NothingFound);
    assert!(shown.ends_with("Nothing found\n"));
}

#[tokio::test]
async fn test_empty_result_creates_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.csv");
    let db = task_db(QueryResult::new());
    let llm = MockLlmClient::new()
        .with_response("llama", "Sub-query 1: nothing")
        .with_response("gpt-4o", "```sql\nSELECT * FROM tasks WHERE false\n```");

    let input = format!("{ANA}nothing\ncsv\n{}\n", path.display());
    let (outcome, shown) = run_dialogue(&db, &llm, &input).await;

    assert_eq!(outcome, RunOutcome::NothingFound);
    assert!(shown.ends_with("Nothing found\n"));
    assert!(!path.exists());
}

#[tokio::test]
async fn test_empty_result_leaves_existing_file_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("previous.csv");
    std::fs::write(&path, "kept\n").unwrap();
    let db = task_db(QueryResult::new());
    let llm = MockLlmClient::new()
        .with_response("llama", "Sub-query 1: nothing")
        .with_response("gpt-4o", "```sql\nSELECT * FROM tasks WHERE false\n```");

    let input = format!("{ANA}nothing\ncsv\n{}\n", path.display());
    run_dialogue(&db, &llm, &input).await;

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "kept\n");
}

#[tokio::test]
async fn test_planner_is_called_once_per_dialogue() {
    let db = task_db(select_one());
    let llm = MockLlmClient::new()
        .with_response("llama", "Sub-query 1: a constant")
        .with_response("gpt-4o", "```sql\nSELECT 1\n```");

    run_dialogue(&db, &llm, &format!("{ANA}one\nconsole\n")).await;

    let planner_calls = llm
        .requests()
        .iter()
        .filter(|r| r.model.contains("llama"))
        .count();
    assert_eq!(planner_calls, 1);
}
