//! Wizard controller.
//!
//! ```text
//! Options ──new──▶ DatabaseSelect ──select──▶ Builder ──generate──▶ Generated
//!    ▲  │              │   ▲                     │                      │
//!    │  └─guidance─▶ Guidance   └──────back───────┘                      │
//!    └──────────────back / back_to_options───────────────────────────────┘
//! ```
//!
//! A [`Wizard`] owns one session: the screen, the form, the token and the
//! last generated query. Every operation that is not valid on the current
//! screen fails with [`WizardError::InvalidTransition`] and changes nothing.
//!
//! Leaving the builder or resetting bumps the session epoch. A generation
//! response carries the epoch it was dispatched under and is discarded if
//! the two no longer match.

mod backend;
mod error;
mod progress;
mod screen;

pub use backend::{Backend, InProcessBackend};
pub use error::{WizardError, WizardResult};
pub use progress::{Progress, TICK_INTERVAL};
pub use screen::{Action, BuilderStep, EntryOption, Screen, StepStatus};

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::auth::{AuthToken, Credentials};
use crate::config::{Settings, SettingsError, WizardSettings};
use crate::model::{
    AggregationRow, CumulativeRow, Field, FormData, FormUpdate, GeneratedQuery, QueryRequest,
};
use crate::sql::Dialect;
use backend::with_timeout;

/// Databases the wizard offers.
pub const OFFERED_DATABASES: [Dialect; 2] = [Dialect::BigQuery, Dialect::Snowflake];

enum TokenState {
    None,
    Pending(JoinHandle<WizardResult<AuthToken>>),
    Ready(AuthToken),
    Failed(WizardError),
}

impl std::fmt::Debug for TokenState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenState::None => f.write_str("None"),
            TokenState::Pending(_) => f.write_str("Pending"),
            TokenState::Ready(_) => f.write_str("Ready"),
            TokenState::Failed(e) => write!(f, "Failed({e})"),
        }
    }
}

/// A generation request captured by [`Wizard::begin_generation`].
///
/// Owns everything it needs, so the wizard can keep being edited while
/// [`PendingGeneration::run`] is awaited.
pub struct PendingGeneration {
    backend: Arc<dyn Backend>,
    token: AuthToken,
    request: QueryRequest,
    epoch: u64,
    timeout: Option<Duration>,
}

impl PendingGeneration {
    /// The payload being sent.
    pub fn request(&self) -> &QueryRequest {
        &self.request
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Send the request.
    pub async fn run(self) -> GenerationResponse {
        let result = with_timeout(
            self.timeout,
            self.backend.generate(&self.token, &self.request),
        )
        .await;
        GenerationResponse {
            epoch: self.epoch,
            request: self.request,
            result,
        }
    }
}

/// Outcome of a [`PendingGeneration`], to be handed back to
/// [`Wizard::complete_generation`].
#[derive(Debug)]
pub struct GenerationResponse {
    pub epoch: u64,
    pub request: QueryRequest,
    pub result: WizardResult<String>,
}

/// One wizard session.
pub struct Wizard {
    backend: Arc<dyn Backend>,
    credentials: Credentials,
    settings: WizardSettings,
    screen: Screen,
    form: FormData,
    token: TokenState,
    generated: Option<GeneratedQuery>,
    epoch: u64,
    in_flight: bool,
    progress: Progress,
}

impl std::fmt::Debug for Wizard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wizard")
            .field("screen", &self.screen)
            .field("form", &self.form)
            .field("token", &self.token)
            .field("epoch", &self.epoch)
            .field("in_flight", &self.in_flight)
            .finish_non_exhaustive()
    }
}

impl Wizard {
    pub fn new(backend: Arc<dyn Backend>, credentials: Credentials, settings: WizardSettings) -> Self {
        Self {
            backend,
            credentials,
            settings,
            screen: Screen::Options,
            form: FormData::default(),
            token: TokenState::None,
            generated: None,
            epoch: 0,
            in_flight: false,
            progress: Progress::default(),
        }
    }

    /// A wizard talking to an in-process server configured by `settings`.
    pub fn from_settings(settings: Settings) -> Result<Self, SettingsError> {
        let credentials = settings.auth.credentials()?;
        let wizard_settings = settings.wizard.clone();
        let backend = Arc::new(InProcessBackend::new(Arc::new(settings)));
        Ok(Self::new(backend, credentials, wizard_settings))
    }

    // ========================================================================
    // State
    // ========================================================================

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn form(&self) -> &FormData {
        &self.form
    }

    pub fn generated(&self) -> Option<&GeneratedQuery> {
        self.generated.as_ref()
    }

    /// The token, if authentication has finished successfully.
    pub fn token(&self) -> Option<&AuthToken> {
        match &self.token {
            TokenState::Ready(token) => Some(token),
            _ => None,
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_generating(&self) -> bool {
        self.in_flight
    }

    /// Busy-indicator value in `[0, 100]`; 0 when idle.
    pub fn progress(&self) -> f64 {
        self.progress.value()
    }

    /// Advance the busy indicator while a request is in flight.
    pub fn tick_progress(&mut self) -> f64 {
        self.progress.tick()
    }

    /// Builder sidebar entries.
    pub fn steps(&self) -> Vec<StepStatus> {
        BuilderStep::ALL
            .iter()
            .enumerate()
            .map(|(i, &step)| {
                let disabled = step.is_disabled();
                let completed = !disabled
                    && match step {
                        BuilderStep::Fields => {
                            !self.form.table_name.trim().is_empty() && !self.form.fields.is_empty()
                        }
                        BuilderStep::Aggregation => !self.form.aggregation.is_empty(),
                        BuilderStep::Cumulative => !self.form.cumulative.is_empty(),
                        BuilderStep::CustomSql => !self.form.custom_sql.trim().is_empty(),
                        BuilderStep::ComplexData | BuilderStep::DateTime => false,
                    };
                StepStatus {
                    step,
                    number: i + 1,
                    completed,
                    disabled,
                }
            })
            .collect()
    }

    fn require(&self, screen: Screen, action: Action) -> WizardResult<()> {
        if self.screen == screen {
            Ok(())
        } else {
            Err(WizardError::InvalidTransition {
                from: self.screen,
                action,
            })
        }
    }

    fn go(&mut self, screen: Screen) {
        debug!(from = %self.screen, to = %screen, "screen change");
        self.screen = screen;
    }

    /// Invalidate any generation in flight.
    fn bump_epoch(&mut self) {
        self.epoch += 1;
        self.in_flight = false;
        self.progress.reset();
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    pub fn select_option(&mut self, option: EntryOption) -> WizardResult<()> {
        self.require(Screen::Options, Action::SelectOption(option))?;
        match option {
            EntryOption::New => self.go(Screen::DatabaseSelect),
            EntryOption::Guidance => self.go(Screen::Guidance),
        }
        Ok(())
    }

    /// Step back one screen.
    ///
    /// Valid from the guide, the database list and the builder.
    pub fn back(&mut self) -> WizardResult<()> {
        match self.screen {
            Screen::Guidance | Screen::DatabaseSelect => self.go(Screen::Options),
            Screen::Builder => {
                self.bump_epoch();
                self.go(Screen::DatabaseSelect);
            }
            from => {
                return Err(WizardError::InvalidTransition {
                    from,
                    action: Action::Back,
                })
            }
        }
        Ok(())
    }

    /// Choose the target database and open the builder.
    ///
    /// Starts authentication in the background on first entry; the builder
    /// opens without waiting for it. Outside a Tokio runtime the
    /// authentication cannot be started and the wizard stays put.
    pub fn select_database(&mut self, database: &str) -> WizardResult<()> {
        self.require(Screen::DatabaseSelect, Action::SelectDatabase)?;

        let dialect = database
            .parse::<Dialect>()
            .ok()
            .filter(|d| OFFERED_DATABASES.contains(d))
            .ok_or_else(|| WizardError::Validation(format!("Unsupported database: {database}")))?;

        self.spawn_authentication()?;
        self.form.database = dialect.to_string();
        self.go(Screen::Builder);
        Ok(())
    }

    fn spawn_authentication(&mut self) -> WizardResult<()> {
        if matches!(self.token, TokenState::Pending(_) | TokenState::Ready(_)) {
            return Ok(());
        }

        let runtime = Handle::try_current().map_err(|e| WizardError::Runtime(e.to_string()))?;
        let backend = Arc::clone(&self.backend);
        let credentials = self.credentials.clone();
        let timeout = self.settings.request_timeout();
        info!(username = %credentials.username, "requesting token");
        self.token = TokenState::Pending(runtime.spawn(async move {
            with_timeout(timeout, backend.authenticate(&credentials)).await
        }));
        Ok(())
    }

    /// Clear the session and return to the first screen.
    pub fn back_to_options(&mut self) -> WizardResult<()> {
        self.require(Screen::Generated, Action::BackToOptions)?;
        self.reset();
        Ok(())
    }

    fn reset(&mut self) {
        if let TokenState::Pending(handle) = &self.token {
            handle.abort();
        }
        self.token = TokenState::None;
        self.form = FormData::default();
        self.generated = None;
        self.bump_epoch();
        self.go(Screen::Options);
    }

    // ========================================================================
    // Authentication
    // ========================================================================

    fn settle(&mut self, result: Result<WizardResult<AuthToken>, tokio::task::JoinError>) {
        self.token = match result {
            Ok(Ok(token)) => TokenState::Ready(token),
            Ok(Err(e)) => {
                warn!(error = %e, "authentication failed");
                TokenState::Failed(e)
            }
            Err(e) => TokenState::Failed(WizardError::Network(e.to_string())),
        };
    }

    /// Wait for the background authentication to finish.
    pub async fn resolve_token(&mut self) -> WizardResult<&AuthToken> {
        if let TokenState::Pending(handle) = &mut self.token {
            let result = handle.await;
            self.settle(result);
        }
        self.current_token()
    }

    /// The token as it stands now, collecting a finished background request.
    async fn poll_token(&mut self) -> WizardResult<AuthToken> {
        if let TokenState::Pending(handle) = &mut self.token {
            if handle.is_finished() {
                let result = handle.await;
                self.settle(result);
            }
        }
        self.current_token().cloned()
    }

    fn current_token(&self) -> WizardResult<&AuthToken> {
        match &self.token {
            TokenState::Ready(token) => Ok(token),
            TokenState::Failed(e @ WizardError::Auth(_)) => Err(e.clone()),
            TokenState::Failed(e) => Err(WizardError::Auth(e.to_string())),
            TokenState::Pending(_) => Err(WizardError::Auth(
                "authentication is still in progress".into(),
            )),
            TokenState::None => Err(WizardError::Auth("no token".into())),
        }
    }

    // ========================================================================
    // Form
    // ========================================================================

    fn edit(&mut self) -> WizardResult<&mut FormData> {
        self.require(Screen::Builder, Action::EditForm)?;
        Ok(&mut self.form)
    }

    pub fn update_form(&mut self, update: FormUpdate) -> WizardResult<()> {
        self.edit()?.apply(update);
        Ok(())
    }

    pub fn set_table_name(&mut self, table_name: impl Into<String>) -> WizardResult<()> {
        self.edit()?.table_name = table_name.into();
        Ok(())
    }

    pub fn set_custom_sql(&mut self, sql: impl Into<String>) -> WizardResult<()> {
        self.edit()?.custom_sql = sql.into();
        Ok(())
    }

    pub fn add_field(&mut self, field: Field) -> WizardResult<()> {
        self.edit()?.fields.push(field);
        Ok(())
    }

    pub fn update_field(&mut self, index: usize, field: Field) -> WizardResult<()> {
        replace(&mut self.edit()?.fields, index, field, "field")
    }

    pub fn remove_field(&mut self, index: usize) -> WizardResult<Field> {
        remove(&mut self.edit()?.fields, index, "field")
    }

    pub fn add_aggregation(&mut self, row: AggregationRow) -> WizardResult<()> {
        self.edit()?.aggregation.push(row);
        Ok(())
    }

    pub fn update_aggregation(&mut self, index: usize, row: AggregationRow) -> WizardResult<()> {
        replace(&mut self.edit()?.aggregation, index, row, "aggregation")
    }

    pub fn remove_aggregation(&mut self, index: usize) -> WizardResult<AggregationRow> {
        remove(&mut self.edit()?.aggregation, index, "aggregation")
    }

    pub fn add_cumulative(&mut self, row: CumulativeRow) -> WizardResult<()> {
        self.edit()?.cumulative.push(row);
        Ok(())
    }

    pub fn update_cumulative(&mut self, index: usize, row: CumulativeRow) -> WizardResult<()> {
        replace(&mut self.edit()?.cumulative, index, row, "cumulative")
    }

    pub fn remove_cumulative(&mut self, index: usize) -> WizardResult<CumulativeRow> {
        remove(&mut self.edit()?.cumulative, index, "cumulative")
    }

    /// Check the form can be submitted.
    pub fn validate(&self) -> WizardResult<()> {
        if self.form.table_name.trim().is_empty() {
            return Err(WizardError::Validation("Please enter a table name".into()));
        }
        if self.form.fields.is_empty() {
            return Err(WizardError::Validation("Please add at least one field".into()));
        }
        Ok(())
    }

    // ========================================================================
    // Generation
    // ========================================================================

    /// Generate SQL for the current form and show the result.
    pub async fn generate(&mut self) -> WizardResult<&GeneratedQuery> {
        let pending = self.begin_generation().await?;
        let response = pending.run().await;
        self.complete_generation(response).await
    }

    /// Validate, snapshot the form and mark a request in flight.
    ///
    /// Nothing is sent until [`PendingGeneration::run`] is awaited.
    pub async fn begin_generation(&mut self) -> WizardResult<PendingGeneration> {
        self.require(Screen::Builder, Action::Generate)?;
        if self.in_flight {
            return Err(WizardError::GenerationInFlight);
        }
        self.validate()?;
        let token = self.poll_token().await?;

        let request = self.form.to_request();
        self.in_flight = true;
        self.progress.start();
        info!(table = %self.form.table_name, epoch = self.epoch, "generating query");

        Ok(PendingGeneration {
            backend: Arc::clone(&self.backend),
            token,
            request,
            epoch: self.epoch,
            timeout: self.settings.request_timeout(),
        })
    }

    /// Apply a response from [`PendingGeneration::run`].
    ///
    /// Responses from an earlier epoch are discarded. On success the
    /// indicator shows 100 for the transition delay before the result
    /// screen opens; on failure the builder stays open.
    pub async fn complete_generation(
        &mut self,
        response: GenerationResponse,
    ) -> WizardResult<&GeneratedQuery> {
        if response.epoch != self.epoch {
            debug!(
                response = response.epoch,
                current = self.epoch,
                "discarding stale response"
            );
            return Err(WizardError::StaleResponse);
        }

        self.in_flight = false;
        let sql = match response.result {
            Ok(sql) => sql,
            Err(e) => {
                warn!(error = %e, "generation failed");
                self.progress.reset();
                return Err(e);
            }
        };

        self.progress.complete();
        tokio::time::sleep(self.settings.transition_delay()).await;
        self.progress.reset();

        self.go(Screen::Generated);
        Ok(self.generated.insert(GeneratedQuery {
            sql,
            request: response.request,
        }))
    }
}

fn replace<T>(items: &mut [T], index: usize, value: T, what: &str) -> WizardResult<()> {
    let slot = items
        .get_mut(index)
        .ok_or_else(|| WizardError::Validation(format!("No {what} row at index {index}")))?;
    *slot = value;
    Ok(())
}

fn remove<T>(items: &mut Vec<T>, index: usize, what: &str) -> WizardResult<T> {
    if index >= items.len() {
        return Err(WizardError::Validation(format!(
            "No {what} row at index {index}"
        )));
    }
    Ok(items.remove(index))
}
