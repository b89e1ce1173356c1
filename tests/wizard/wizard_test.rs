//! Integration tests for the wizard controller.
//!
//! Most tests use a scripted backend that counts calls and can be told to
//! fail or to hold a response until released.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use job_creator::auth::{issue_token, AuthToken, Credentials};
use job_creator::config::{Settings, WizardSettings};
use job_creator::model::{
    AggregateFunction, AggregationRow, CumulativeRow, Field, FormData, FormUpdate, QueryRequest,
};
use job_creator::wizard::{
    Action, Backend, BuilderStep, EntryOption, Screen, Wizard, WizardError, WizardResult,
};
use tokio::sync::Notify;

// ============================================================================
// Scripted backend
// ============================================================================

#[derive(Default)]
struct Scripted {
    auth_calls: AtomicUsize,
    generate_calls: AtomicUsize,
    fail_auth: bool,
    generate_error: Option<WizardError>,
    hold: Option<Arc<Notify>>,
    requests: Mutex<Vec<QueryRequest>>,
}

#[async_trait]
impl Backend for Scripted {
    async fn authenticate(&self, credentials: &Credentials) -> WizardResult<AuthToken> {
        self.auth_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_auth {
            return Err(WizardError::Auth("refused".into()));
        }
        Ok(issue_token(&credentials.username, "test", 60))
    }

    async fn generate(&self, _token: &AuthToken, request: &QueryRequest) -> WizardResult<String> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        if let Some(hold) = &self.hold {
            hold.notified().await;
        }
        match &self.generate_error {
            Some(e) => Err(e.clone()),
            None => Ok(format!("SELECT * FROM {}", request.table().unwrap_or("?"))),
        }
    }
}

fn settings() -> WizardSettings {
    WizardSettings {
        transition_delay_ms: 0,
        request_timeout_ms: 0,
    }
}

fn wizard_with(backend: Arc<Scripted>) -> Wizard {
    Wizard::new(backend, Credentials::new("tester", "key"), settings())
}

/// A wizard sitting in the builder with a resolved token.
async fn builder(backend: Arc<Scripted>) -> Wizard {
    let mut wizard = wizard_with(backend);
    wizard.select_option(EntryOption::New).unwrap();
    wizard.select_database("bigquery").unwrap();
    wizard.resolve_token().await.unwrap();
    wizard
}

fn fill(wizard: &mut Wizard) {
    wizard.set_table_name("users").unwrap();
    wizard.add_field(Field::new("id")).unwrap();
    wizard.add_field(Field::aliased("name", "full_name")).unwrap();
}

// ============================================================================
// Navigation
// ============================================================================

#[tokio::test]
async fn test_starts_on_options() {
    let wizard = wizard_with(Arc::new(Scripted::default()));
    assert_eq!(wizard.screen(), Screen::Options);
    assert_eq!(wizard.progress(), 0.0);
    assert!(wizard.generated().is_none());
}

#[tokio::test]
async fn test_guidance_round_trip() {
    let mut wizard = wizard_with(Arc::new(Scripted::default()));
    wizard.select_option(EntryOption::Guidance).unwrap();
    assert_eq!(wizard.screen(), Screen::Guidance);
    wizard.back().unwrap();
    assert_eq!(wizard.screen(), Screen::Options);
}

#[tokio::test]
async fn test_back_edges() {
    let backend = Arc::new(Scripted::default());
    let mut wizard = wizard_with(backend);

    wizard.select_option(EntryOption::New).unwrap();
    wizard.back().unwrap();
    assert_eq!(wizard.screen(), Screen::Options);

    wizard.select_option(EntryOption::New).unwrap();
    wizard.select_database("snowflake").unwrap();
    wizard.back().unwrap();
    assert_eq!(wizard.screen(), Screen::DatabaseSelect);
}

#[tokio::test]
async fn test_invalid_transitions_change_nothing() {
    let mut wizard = wizard_with(Arc::new(Scripted::default()));

    let err = wizard.select_database("bigquery").unwrap_err();
    assert_eq!(
        err,
        WizardError::InvalidTransition {
            from: Screen::Options,
            action: Action::SelectDatabase,
        }
    );
    assert_eq!(wizard.screen(), Screen::Options);

    assert!(matches!(
        wizard.back(),
        Err(WizardError::InvalidTransition { from: Screen::Options, action: Action::Back })
    ));
    assert!(matches!(
        wizard.generate().await,
        Err(WizardError::InvalidTransition { action: Action::Generate, .. })
    ));
    assert!(matches!(
        wizard.back_to_options(),
        Err(WizardError::InvalidTransition { action: Action::BackToOptions, .. })
    ));
    assert!(matches!(
        wizard.set_table_name("t"),
        Err(WizardError::InvalidTransition { action: Action::EditForm, .. })
    ));
    assert_eq!(wizard.screen(), Screen::Options);
    assert_eq!(wizard.form().table_name, "");
}

#[tokio::test]
async fn test_unoffered_database_rejected() {
    let mut wizard = wizard_with(Arc::new(Scripted::default()));
    wizard.select_option(EntryOption::New).unwrap();
    assert!(matches!(
        wizard.select_database("mysql"),
        Err(WizardError::Validation(_))
    ));
    assert_eq!(wizard.screen(), Screen::DatabaseSelect);
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_select_database_authenticates_once() {
    let backend = Arc::new(Scripted::default());
    let mut wizard = wizard_with(backend.clone());

    wizard.select_option(EntryOption::New).unwrap();
    wizard.select_database("bigquery").unwrap();
    assert_eq!(wizard.screen(), Screen::Builder);
    assert_eq!(wizard.form().database, "bigquery");

    let token = wizard.resolve_token().await.unwrap().clone();
    assert!(token.token.starts_with("mock_token_tester_"));
    assert_eq!(backend.auth_calls.load(Ordering::SeqCst), 1);

    wizard.back().unwrap();
    wizard.select_database("snowflake").unwrap();
    wizard.resolve_token().await.unwrap();
    assert_eq!(backend.auth_calls.load(Ordering::SeqCst), 1);
    assert_eq!(wizard.form().database, "snowflake");
}

#[test]
fn test_select_database_outside_runtime_is_an_error() {
    let backend = Arc::new(Scripted::default());
    let mut wizard = wizard_with(backend.clone());
    wizard.select_option(EntryOption::New).unwrap();

    assert!(matches!(
        wizard.select_database("bigquery"),
        Err(WizardError::Runtime(_))
    ));
    assert_eq!(wizard.screen(), Screen::DatabaseSelect);
    assert_eq!(wizard.form().database, "");
    assert_eq!(backend.auth_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_failed_auth_blocks_generation() {
    let backend = Arc::new(Scripted {
        fail_auth: true,
        ..Default::default()
    });
    let mut wizard = wizard_with(backend.clone());
    wizard.select_option(EntryOption::New).unwrap();
    wizard.select_database("bigquery").unwrap();
    assert!(matches!(wizard.resolve_token().await, Err(WizardError::Auth(_))));

    fill(&mut wizard);
    assert!(matches!(wizard.generate().await, Err(WizardError::Auth(_))));
    assert_eq!(backend.generate_calls.load(Ordering::SeqCst), 0);
    assert_eq!(wizard.screen(), Screen::Builder);
}

// ============================================================================
// Form and validation
// ============================================================================

#[tokio::test]
async fn test_validation_runs_before_any_request() {
    let backend = Arc::new(Scripted::default());
    let mut wizard = builder(backend.clone()).await;

    wizard.set_table_name("   ").unwrap();
    wizard.add_field(Field::new("id")).unwrap();
    assert_eq!(
        wizard.generate().await.unwrap_err(),
        WizardError::Validation("Please enter a table name".into())
    );

    wizard.set_table_name("users").unwrap();
    wizard.remove_field(0).unwrap();
    assert_eq!(
        wizard.generate().await.unwrap_err(),
        WizardError::Validation("Please add at least one field".into())
    );

    assert_eq!(backend.generate_calls.load(Ordering::SeqCst), 0);
    assert!(!wizard.is_generating());
}

#[tokio::test]
async fn test_row_edits() {
    let mut wizard = builder(Arc::new(Scripted::default())).await;

    wizard.add_aggregation(AggregationRow::default()).unwrap();
    wizard
        .update_aggregation(
            0,
            AggregationRow::new(AggregateFunction::Max, "price").with_alias("top"),
        )
        .unwrap();
    wizard.add_cumulative(CumulativeRow::default()).unwrap();
    assert_eq!(wizard.form().aggregation[0].function, AggregateFunction::Max);
    assert_eq!(wizard.form().cumulative.len(), 1);

    let removed = wizard.remove_cumulative(0).unwrap();
    assert_eq!(removed, CumulativeRow::default());
    assert!(matches!(
        wizard.update_field(3, Field::new("x")),
        Err(WizardError::Validation(_))
    ));

    wizard
        .update_form(FormUpdate {
            custom_sql: Some("SELECT 1".into()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(wizard.form().custom_sql, "SELECT 1");
}

#[tokio::test]
async fn test_steps() {
    let mut wizard = builder(Arc::new(Scripted::default())).await;

    let steps = wizard.steps();
    assert_eq!(steps.len(), 6);
    assert!(steps.iter().all(|s| !s.completed));
    assert_eq!(steps[4].step, BuilderStep::DateTime);
    assert!(steps[3].disabled && steps[4].disabled);

    fill(&mut wizard);
    wizard.set_custom_sql("SELECT 1").unwrap();
    let steps = wizard.steps();
    assert!(steps[0].completed);
    assert!(!steps[1].completed);
    assert!(steps[5].completed);
    assert_eq!(steps[5].number, 6);
}

// ============================================================================
// Generation
// ============================================================================

#[tokio::test]
async fn test_generate_stores_result_once() {
    let backend = Arc::new(Scripted::default());
    let mut wizard = builder(backend.clone()).await;
    fill(&mut wizard);

    let generated = wizard.generate().await.unwrap().clone();
    assert_eq!(generated.sql, "SELECT * FROM users");
    assert_eq!(generated.request.table(), Some("users"));
    assert_eq!(generated.request.fields.len(), 2);
    assert!(generated.request.aggregation.is_empty());
    assert_eq!(generated.request.custom_sql, None);

    assert_eq!(wizard.screen(), Screen::Generated);
    assert_eq!(wizard.generated(), Some(&generated));
    assert_eq!(backend.generate_calls.load(Ordering::SeqCst), 1);
    assert!(!wizard.is_generating());
    assert_eq!(wizard.progress(), 0.0);
}

#[tokio::test]
async fn test_server_error_stays_in_builder() {
    let backend = Arc::new(Scripted {
        generate_error: Some(WizardError::Server {
            status: 500,
            message: "Failed to generate SQL query".into(),
        }),
        ..Default::default()
    });
    let mut wizard = builder(backend).await;
    fill(&mut wizard);

    let err = wizard.generate().await.unwrap_err();
    assert!(matches!(err, WizardError::Server { status: 500, .. }));
    assert_eq!(wizard.screen(), Screen::Builder);
    assert!(wizard.generated().is_none());
    assert!(!wizard.is_generating());

    wizard.set_table_name("other").unwrap();
}

#[tokio::test]
async fn test_second_generation_rejected_while_in_flight() {
    let backend = Arc::new(Scripted::default());
    let mut wizard = builder(backend.clone()).await;
    fill(&mut wizard);

    let pending = wizard.begin_generation().await.unwrap();
    assert!(wizard.is_generating());
    assert_eq!(
        wizard.begin_generation().await.err(),
        Some(WizardError::GenerationInFlight)
    );

    let response = pending.run().await;
    wizard.complete_generation(response).await.unwrap();
    assert_eq!(backend.generate_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_edits_during_flight_do_not_change_payload() {
    let hold = Arc::new(Notify::new());
    let backend = Arc::new(Scripted {
        hold: Some(hold.clone()),
        ..Default::default()
    });
    let mut wizard = builder(backend.clone()).await;
    fill(&mut wizard);

    let pending = wizard.begin_generation().await.unwrap();
    let task = tokio::spawn(pending.run());

    wizard.set_table_name("edited").unwrap();
    hold.notify_one();
    let response = task.await.unwrap();

    let generated = wizard.complete_generation(response).await.unwrap();
    assert_eq!(generated.sql, "SELECT * FROM users");
    assert_eq!(generated.request.table(), Some("users"));
    assert_eq!(backend.requests.lock().unwrap()[0].table(), Some("users"));
}

#[tokio::test]
async fn test_response_after_leaving_builder_is_discarded() {
    let backend = Arc::new(Scripted::default());
    let mut wizard = builder(backend).await;
    fill(&mut wizard);

    let pending = wizard.begin_generation().await.unwrap();
    let epoch = pending.epoch();
    wizard.back().unwrap();
    assert!(wizard.epoch() > epoch);
    assert!(!wizard.is_generating());

    let response = pending.run().await;
    assert_eq!(
        wizard.complete_generation(response).await.unwrap_err(),
        WizardError::StaleResponse
    );
    assert_eq!(wizard.screen(), Screen::DatabaseSelect);
    assert!(wizard.generated().is_none());
}

#[tokio::test]
async fn test_progress_ramps_and_caps() {
    let mut wizard = builder(Arc::new(Scripted::default())).await;
    fill(&mut wizard);

    assert_eq!(wizard.tick_progress(), 0.0);

    let pending = wizard.begin_generation().await.unwrap();
    let mut last = 0.0;
    for _ in 0..50 {
        let value = wizard.tick_progress();
        assert!(value >= last && value <= 95.0);
        last = value;
    }

    let response = pending.run().await;
    wizard.complete_generation(response).await.unwrap();
    assert_eq!(wizard.progress(), 0.0);
}

// ============================================================================
// Reset
// ============================================================================

#[tokio::test]
async fn test_back_to_options_clears_session() {
    let backend = Arc::new(Scripted::default());
    let mut wizard = builder(backend.clone()).await;
    fill(&mut wizard);
    wizard.generate().await.unwrap();
    let epoch = wizard.epoch();

    wizard.back_to_options().unwrap();
    assert_eq!(wizard.screen(), Screen::Options);
    assert_eq!(wizard.form(), &FormData::default());
    assert!(wizard.generated().is_none());
    assert!(wizard.token().is_none());
    assert!(wizard.epoch() > epoch);

    wizard.select_option(EntryOption::New).unwrap();
    wizard.select_database("bigquery").unwrap();
    wizard.resolve_token().await.unwrap();
    assert_eq!(backend.auth_calls.load(Ordering::SeqCst), 2);
}

// ============================================================================
// In-process server
// ============================================================================

#[tokio::test]
async fn test_end_to_end_with_in_process_server() {
    let mut wizard = Wizard::from_settings(Settings::without_delays()).unwrap();
    wizard.select_option(EntryOption::New).unwrap();
    wizard.select_database("snowflake").unwrap();
    wizard.resolve_token().await.unwrap();
    fill(&mut wizard);
    wizard
        .add_aggregation(AggregationRow::new(AggregateFunction::Count, "id").with_alias("n"))
        .unwrap();

    let generated = wizard.generate().await.unwrap();
    assert_eq!(
        generated.sql,
        "SELECT id, name AS full_name, COUNT(id) AS n FROM users"
    );
}

#[tokio::test]
async fn test_in_process_timeout_is_network_error() {
    let mut settings = Settings::without_delays();
    settings.delays.generate_min_ms = 5_000;
    settings.delays.generate_max_ms = 5_001;
    settings.wizard.request_timeout_ms = 20;

    let mut wizard = Wizard::from_settings(settings).unwrap();
    wizard.select_option(EntryOption::New).unwrap();
    wizard.select_database("bigquery").unwrap();
    wizard.resolve_token().await.unwrap();
    fill(&mut wizard);

    assert!(matches!(
        wizard.generate().await,
        Err(WizardError::Network(_))
    ));
    assert_eq!(wizard.screen(), Screen::Builder);
}
