//! Service context - dependency container for services
//!
//! Holds all repositories, the chat platform, the ephemeral store and the
//! configuration needed by services.

use std::sync::Arc;
use std::time::Duration;

use contest_cache::{InMemoryEphemeralStore, RedisEphemeralStore};
use contest_common::AppConfig;
use contest_core::traits::{
    ChannelLinkRepository, ChatPlatform, ContestRepository, DrawLockRepository,
    EntitlementRepository, EntryRepository, EphemeralStore, GateRepository, InteractionSignal,
    NoInteractionSignal, PurchaseRepository, QuestionRepository, SettingsRepository,
    UserRepository, VoteRepository,
};
use contest_core::ContestId;
use contest_db::{
    PgChannelLinkRepository, PgContestRepository, PgDrawLockRepository, PgEntitlementRepository,
    PgEntryRepository, PgGateRepository, PgPool, PgPurchaseRepository, PgQuestionRepository,
    PgSettingsRepository, PgUserRepository, PgVoteRepository,
};
use dashmap::DashMap;
use tokio::task::JoinHandle;

use super::error::{ServiceError, ServiceResult};

/// Running quiz question loops, keyed by contest
pub type QuizRunners = Arc<DashMap<ContestId, QuizRunner>>;

/// Slot of one contest's quiz loop
#[derive(Debug)]
pub enum QuizRunner {
    /// Claimed by a start that is still loading questions
    Starting,
    Running(JoinHandle<()>),
}

impl QuizRunner {
    pub fn is_starting(&self) -> bool {
        matches!(self, Self::Starting)
    }

    pub fn is_finished(&self) -> bool {
        match self {
            Self::Starting => false,
            Self::Running(handle) => handle.is_finished(),
        }
    }

    pub fn abort(&self) {
        if let Self::Running(handle) = self {
            handle.abort();
        }
    }
}

/// Service context containing all dependencies
///
/// This is the main dependency container that gets passed to all services.
/// It provides access to:
/// - Repositories (durable contest state)
/// - The chat platform
/// - The ephemeral store (drafts, challenges, quiz markers, rate windows)
/// - Application configuration
#[derive(Clone)]
pub struct ServiceContext {
    config: Arc<AppConfig>,

    // Repositories
    user_repo: Arc<dyn UserRepository>,
    channel_link_repo: Arc<dyn ChannelLinkRepository>,
    contest_repo: Arc<dyn ContestRepository>,
    gate_repo: Arc<dyn GateRepository>,
    entry_repo: Arc<dyn EntryRepository>,
    vote_repo: Arc<dyn VoteRepository>,
    entitlement_repo: Arc<dyn EntitlementRepository>,
    question_repo: Arc<dyn QuestionRepository>,
    draw_lock_repo: Arc<dyn DrawLockRepository>,
    purchase_repo: Arc<dyn PurchaseRepository>,
    settings_repo: Arc<dyn SettingsRepository>,

    // Outside world
    platform: Arc<dyn ChatPlatform>,
    ephemeral: Arc<dyn EphemeralStore>,
    interaction: Arc<dyn InteractionSignal>,

    quiz_runners: QuizRunners,
}

impl ServiceContext {
    // === Configuration ===

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Stale threshold of a draw lock
    pub fn draw_lock_ttl(&self) -> Duration {
        Duration::from_secs(self.config.limits.draw_lock_ttl_secs)
    }

    // === Repositories ===

    /// Get the user repository
    pub fn user_repo(&self) -> &dyn UserRepository {
        self.user_repo.as_ref()
    }

    /// Get the channel link repository
    pub fn channel_link_repo(&self) -> &dyn ChannelLinkRepository {
        self.channel_link_repo.as_ref()
    }

    /// Get the contest repository
    pub fn contest_repo(&self) -> &dyn ContestRepository {
        self.contest_repo.as_ref()
    }

    /// Get the gate repository
    pub fn gate_repo(&self) -> &dyn GateRepository {
        self.gate_repo.as_ref()
    }

    /// Get the entry repository
    pub fn entry_repo(&self) -> &dyn EntryRepository {
        self.entry_repo.as_ref()
    }

    /// Get the vote repository
    pub fn vote_repo(&self) -> &dyn VoteRepository {
        self.vote_repo.as_ref()
    }

    /// Get the entitlement repository
    pub fn entitlement_repo(&self) -> &dyn EntitlementRepository {
        self.entitlement_repo.as_ref()
    }

    /// Get the question repository
    pub fn question_repo(&self) -> &dyn QuestionRepository {
        self.question_repo.as_ref()
    }

    /// Get the draw lock repository
    pub fn draw_lock_repo(&self) -> &dyn DrawLockRepository {
        self.draw_lock_repo.as_ref()
    }

    /// Get the purchase repository
    pub fn purchase_repo(&self) -> &dyn PurchaseRepository {
        self.purchase_repo.as_ref()
    }

    /// Get the settings repository
    pub fn settings_repo(&self) -> &dyn SettingsRepository {
        self.settings_repo.as_ref()
    }

    // === Outside world ===

    /// Get the chat platform
    pub fn platform(&self) -> &dyn ChatPlatform {
        self.platform.as_ref()
    }

    /// Get the ephemeral store
    pub fn ephemeral(&self) -> &dyn EphemeralStore {
        self.ephemeral.as_ref()
    }

    /// Get the interaction points source
    pub fn interaction(&self) -> &dyn InteractionSignal {
        self.interaction.as_ref()
    }

    pub fn quiz_runners(&self) -> &QuizRunners {
        &self.quiz_runners
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("app", &self.config.app.name)
            .field("repositories", &"...")
            .field("quiz_runners", &self.quiz_runners.len())
            .finish()
    }
}

/// Builder for creating ServiceContext with custom configuration
#[derive(Default)]
pub struct ServiceContextBuilder {
    config: Option<Arc<AppConfig>>,
    user_repo: Option<Arc<dyn UserRepository>>,
    channel_link_repo: Option<Arc<dyn ChannelLinkRepository>>,
    contest_repo: Option<Arc<dyn ContestRepository>>,
    gate_repo: Option<Arc<dyn GateRepository>>,
    entry_repo: Option<Arc<dyn EntryRepository>>,
    vote_repo: Option<Arc<dyn VoteRepository>>,
    entitlement_repo: Option<Arc<dyn EntitlementRepository>>,
    question_repo: Option<Arc<dyn QuestionRepository>>,
    draw_lock_repo: Option<Arc<dyn DrawLockRepository>>,
    purchase_repo: Option<Arc<dyn PurchaseRepository>>,
    settings_repo: Option<Arc<dyn SettingsRepository>>,
    platform: Option<Arc<dyn ChatPlatform>>,
    ephemeral: Option<Arc<dyn EphemeralStore>>,
    interaction: Option<Arc<dyn InteractionSignal>>,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = Some(Arc::new(config));
        self
    }

    /// Use the PostgreSQL implementation for every repository
    pub fn postgres(self, pool: &PgPool) -> Self {
        self.user_repo(Arc::new(PgUserRepository::new(pool.clone())))
            .channel_link_repo(Arc::new(PgChannelLinkRepository::new(pool.clone())))
            .contest_repo(Arc::new(PgContestRepository::new(pool.clone())))
            .gate_repo(Arc::new(PgGateRepository::new(pool.clone())))
            .entry_repo(Arc::new(PgEntryRepository::new(pool.clone())))
            .vote_repo(Arc::new(PgVoteRepository::new(pool.clone())))
            .entitlement_repo(Arc::new(PgEntitlementRepository::new(pool.clone())))
            .question_repo(Arc::new(PgQuestionRepository::new(pool.clone())))
            .draw_lock_repo(Arc::new(PgDrawLockRepository::new(pool.clone())))
            .purchase_repo(Arc::new(PgPurchaseRepository::new(pool.clone())))
            .settings_repo(Arc::new(PgSettingsRepository::new(pool.clone())))
    }

    pub fn user_repo(mut self, repo: Arc<dyn UserRepository>) -> Self {
        self.user_repo = Some(repo);
        self
    }

    pub fn channel_link_repo(mut self, repo: Arc<dyn ChannelLinkRepository>) -> Self {
        self.channel_link_repo = Some(repo);
        self
    }

    pub fn contest_repo(mut self, repo: Arc<dyn ContestRepository>) -> Self {
        self.contest_repo = Some(repo);
        self
    }

    pub fn gate_repo(mut self, repo: Arc<dyn GateRepository>) -> Self {
        self.gate_repo = Some(repo);
        self
    }

    pub fn entry_repo(mut self, repo: Arc<dyn EntryRepository>) -> Self {
        self.entry_repo = Some(repo);
        self
    }

    pub fn vote_repo(mut self, repo: Arc<dyn VoteRepository>) -> Self {
        self.vote_repo = Some(repo);
        self
    }

    pub fn entitlement_repo(mut self, repo: Arc<dyn EntitlementRepository>) -> Self {
        self.entitlement_repo = Some(repo);
        self
    }

    pub fn question_repo(mut self, repo: Arc<dyn QuestionRepository>) -> Self {
        self.question_repo = Some(repo);
        self
    }

    pub fn draw_lock_repo(mut self, repo: Arc<dyn DrawLockRepository>) -> Self {
        self.draw_lock_repo = Some(repo);
        self
    }

    pub fn purchase_repo(mut self, repo: Arc<dyn PurchaseRepository>) -> Self {
        self.purchase_repo = Some(repo);
        self
    }

    pub fn settings_repo(mut self, repo: Arc<dyn SettingsRepository>) -> Self {
        self.settings_repo = Some(repo);
        self
    }

    pub fn platform(mut self, platform: Arc<dyn ChatPlatform>) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn ephemeral(mut self, store: Arc<dyn EphemeralStore>) -> Self {
        self.ephemeral = Some(store);
        self
    }

    /// Use Redis for the ephemeral store when the config names one
    ///
    /// Must be called after [`Self::config`]. Without `REDIS_URL` the
    /// builder keeps its in-process default.
    pub async fn ephemeral_from_config(self) -> ServiceResult<Self> {
        let Some(redis) = self.config.as_ref().and_then(|c| c.redis.clone()) else {
            return Ok(self);
        };
        let store = RedisEphemeralStore::connect(&redis).await?;
        tracing::info!("Using Redis ephemeral store");
        Ok(self.ephemeral(Arc::new(store)))
    }

    pub fn interaction(mut self, signal: Arc<dyn InteractionSignal>) -> Self {
        self.interaction = Some(signal);
        self
    }

    /// Build the ServiceContext
    ///
    /// The ephemeral store defaults to process memory and the interaction
    /// signal to one that never reports points.
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` if any required dependency is missing
    pub fn build(self) -> ServiceResult<ServiceContext> {
        Ok(ServiceContext {
            config: required(self.config, "config")?,
            user_repo: required(self.user_repo, "user_repo")?,
            channel_link_repo: required(self.channel_link_repo, "channel_link_repo")?,
            contest_repo: required(self.contest_repo, "contest_repo")?,
            gate_repo: required(self.gate_repo, "gate_repo")?,
            entry_repo: required(self.entry_repo, "entry_repo")?,
            vote_repo: required(self.vote_repo, "vote_repo")?,
            entitlement_repo: required(self.entitlement_repo, "entitlement_repo")?,
            question_repo: required(self.question_repo, "question_repo")?,
            draw_lock_repo: required(self.draw_lock_repo, "draw_lock_repo")?,
            purchase_repo: required(self.purchase_repo, "purchase_repo")?,
            settings_repo: required(self.settings_repo, "settings_repo")?,
            platform: required(self.platform, "platform")?,
            ephemeral: self
                .ephemeral
                .unwrap_or_else(|| Arc::new(InMemoryEphemeralStore::new())),
            interaction: self
                .interaction
                .unwrap_or_else(|| Arc::new(NoInteractionSignal)),
            quiz_runners: Arc::new(DashMap::new()),
        })
    }
}

fn required<T>(value: Option<T>, name: &str) -> ServiceResult<T> {
    value.ok_or_else(|| ServiceError::validation(format!("{name} is required")))
}
