//! In-memory repositories
//!
//! One store implements every repository port with the same atomicity the
//! PostgreSQL implementation guarantees: each call holds the lock for its
//! whole read-modify-write.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use contest_core::entities::{
    ChannelLink, Contest, EntitlementRecord, Entry, Gate, GateSpec, NewContest,
    NewEntry, NewPurchase, NewQuestion, NewVote, Purchase, Question, User, Vote, Winner,
};
use contest_core::traits::{
    ChannelLinkRepository, ContestRepository, DrawLockRepository, EntitlementRepository,
    EntryRepository, GateRepository, Insertion, PurchaseRepository, QuestionRepository,
    RepoResult, SettingsRepository, UserRepository, VoteRecord, VoteRepository,
};
use contest_core::{
    ChatId, ContestId, DomainError, EntryId, MessageId, PurchaseStatus, QuestionId, UserId,
};
use parking_lot::Mutex;

#[derive(Default)]
struct State {
    next_id: i64,
    users: HashMap<UserId, User>,
    links: HashMap<(UserId, ChatId), ChannelLink>,
    contests: BTreeMap<ContestId, Contest>,
    gates: Vec<Gate>,
    winners: HashMap<ContestId, Vec<Winner>>,
    entries: BTreeMap<EntryId, Entry>,
    votes: Vec<Vote>,
    vote_guards: HashSet<(ContestId, UserId)>,
    entitlements: HashMap<(UserId, String), EntitlementRecord>,
    questions: BTreeMap<QuestionId, Question>,
    locks: HashMap<ContestId, (String, Instant)>,
    purchases: Vec<Purchase>,
    settings: HashMap<String, String>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn open_contest(&self, id: ContestId) -> RepoResult<&Contest> {
        let contest = self
            .contests
            .get(&id)
            .ok_or(DomainError::ContestNotFound(id))?;
        if contest.is_closed() {
            return Err(DomainError::ContestClosed);
        }
        Ok(contest)
    }
}

/// Every repository port over one in-process state
#[derive(Default)]
pub struct MemoryDb {
    state: Mutex<State>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries of a contest
    pub fn entry_count(&self, contest_id: ContestId) -> usize {
        self.state
            .lock()
            .entries
            .values()
            .filter(|e| e.contest_id == contest_id)
            .count()
    }

    /// Number of stored vote records of a contest
    pub fn vote_count(&self, contest_id: ContestId) -> usize {
        self.state
            .lock()
            .votes
            .iter()
            .filter(|v| v.contest_id == contest_id)
            .count()
    }

    pub fn contest_count(&self) -> usize {
        self.state.lock().contests.len()
    }
}

#[async_trait]
impl UserRepository for MemoryDb {
    async fn find_by_id(&self, id: UserId) -> RepoResult<Option<User>> {
        Ok(self.state.lock().users.get(&id).cloned())
    }

    async fn create_if_absent(&self, user: &User) -> RepoResult<bool> {
        let mut state = self.state.lock();
        if state.users.contains_key(&user.id) {
            return Ok(false);
        }
        state.users.insert(user.id, user.clone());
        Ok(true)
    }

    async fn add_points(&self, id: UserId, points: i64) -> RepoResult<()> {
        let mut state = self.state.lock();
        let user = state.users.get_mut(&id).ok_or(DomainError::UserNotFound(id))?;
        user.points += points;
        Ok(())
    }

    async fn spend_points(&self, id: UserId, points: i64) -> RepoResult<bool> {
        let mut state = self.state.lock();
        match state.users.get_mut(&id) {
            Some(user) if user.can_spend(points) => {
                user.points -= points;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl ChannelLinkRepository for MemoryDb {
    async fn find(&self, owner_id: UserId, chat_id: ChatId) -> RepoResult<Option<ChannelLink>> {
        Ok(self.state.lock().links.get(&(owner_id, chat_id)).cloned())
    }

    async fn list_by_owner(&self, owner_id: UserId) -> RepoResult<Vec<ChannelLink>> {
        let state = self.state.lock();
        let mut links: Vec<ChannelLink> = state
            .links
            .values()
            .filter(|l| l.owner_id == owner_id)
            .cloned()
            .collect();
        links.sort_by_key(|l| l.created_at);
        Ok(links)
    }

    async fn upsert(&self, link: &ChannelLink) -> RepoResult<()> {
        let mut state = self.state.lock();
        state
            .links
            .entry((link.owner_id, link.chat_id))
            .and_modify(|existing| existing.title.clone_from(&link.title))
            .or_insert_with(|| link.clone());
        Ok(())
    }

    async fn delete(&self, owner_id: UserId, chat_id: ChatId) -> RepoResult<bool> {
        Ok(self.state.lock().links.remove(&(owner_id, chat_id)).is_some())
    }
}

#[async_trait]
impl ContestRepository for MemoryDb {
    async fn find_by_id(&self, id: ContestId) -> RepoResult<Option<Contest>> {
        Ok(self.state.lock().contests.get(&id).cloned())
    }

    async fn find_by_code(&self, code: &str) -> RepoResult<Option<Contest>> {
        Ok(self
            .state
            .lock()
            .contests
            .values()
            .find(|c| c.code == code)
            .cloned())
    }

    async fn list_by_owner(&self, owner_id: UserId) -> RepoResult<Vec<Contest>> {
        Ok(self
            .state
            .lock()
            .contests
            .values()
            .filter(|c| c.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn list_by_chat(&self, chat_id: ChatId) -> RepoResult<Vec<Contest>> {
        Ok(self
            .state
            .lock()
            .contests
            .values()
            .filter(|c| c.channel_id == chat_id || c.group_id == Some(chat_id))
            .cloned()
            .collect())
    }

    async fn create(&self, contest: &NewContest, gates: &[GateSpec]) -> RepoResult<Contest> {
        let mut state = self.state.lock();
        if state.contests.values().any(|c| c.code == contest.code) {
            return Err(DomainError::ContestCodeExists);
        }

        let id = ContestId::new(state.next_id());
        let created = Contest {
            id,
            owner_id: contest.owner_id,
            channel_id: contest.channel_id,
            group_id: contest.group_id,
            message_id: None,
            code: contest.code.clone(),
            kind: contest.kind.clone(),
            text: contest.text.clone(),
            winner_count: contest.winner_count,
            flags: contest.flags,
            is_open: true,
            created_at: Utc::now(),
            closed_at: None,
        };
        state.contests.insert(id, created.clone());

        for spec in gates {
            let gate_id = state.next_id();
            state.gates.push(Gate {
                id: gate_id,
                contest_id: id,
                kind: spec.kind.clone(),
                title: spec.title.clone(),
                invite_link: spec.invite_link.clone(),
            });
        }
        Ok(created)
    }

    async fn delete(&self, id: ContestId) -> RepoResult<()> {
        let mut state = self.state.lock();
        state.contests.remove(&id);
        state.gates.retain(|g| g.contest_id != id);
        Ok(())
    }

    async fn set_message_id(&self, id: ContestId, message_id: MessageId) -> RepoResult<()> {
        let mut state = self.state.lock();
        let contest = state
            .contests
            .get_mut(&id)
            .ok_or(DomainError::ContestNotFound(id))?;
        contest.message_id = Some(message_id);
        Ok(())
    }

    async fn set_open(&self, id: ContestId, is_open: bool) -> RepoResult<bool> {
        let mut state = self.state.lock();
        let contest = state
            .contests
            .get_mut(&id)
            .ok_or(DomainError::ContestNotFound(id))?;
        if contest.is_closed() {
            return Ok(false);
        }
        contest.is_open = is_open;
        Ok(true)
    }

    async fn finalize(&self, id: ContestId, winners: &[Winner]) -> RepoResult<bool> {
        let mut state = self.state.lock();
        let contest = state
            .contests
            .get_mut(&id)
            .ok_or(DomainError::ContestNotFound(id))?;
        if contest.is_closed() {
            return Ok(false);
        }
        contest.is_open = false;
        contest.closed_at = Some(Utc::now());
        state.winners.insert(id, winners.to_vec());
        Ok(true)
    }

    async fn winners(&self, id: ContestId) -> RepoResult<Vec<Winner>> {
        Ok(self.state.lock().winners.get(&id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl GateRepository for MemoryDb {
    async fn list_by_contest(&self, contest_id: ContestId) -> RepoResult<Vec<Gate>> {
        Ok(self
            .state
            .lock()
            .gates
            .iter()
            .filter(|g| g.contest_id == contest_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl EntryRepository for MemoryDb {
    async fn find(&self, contest_id: ContestId, user_id: UserId) -> RepoResult<Option<Entry>> {
        Ok(self
            .state
            .lock()
            .entries
            .values()
            .find(|e| e.contest_id == contest_id && e.user_id == user_id)
            .cloned())
    }

    async fn find_by_id(&self, id: EntryId) -> RepoResult<Option<Entry>> {
        Ok(self.state.lock().entries.get(&id).cloned())
    }

    async fn find_by_code(&self, contest_id: ContestId, code: &str) -> RepoResult<Option<Entry>> {
        Ok(self
            .state
            .lock()
            .entries
            .values()
            .find(|e| e.contest_id == contest_id && e.code == code)
            .cloned())
    }

    async fn find_by_name(&self, contest_id: ContestId, name: &str) -> RepoResult<Option<Entry>> {
        let name = name.to_lowercase();
        Ok(self
            .state
            .lock()
            .entries
            .values()
            .find(|e| e.contest_id == contest_id && e.display_name.to_lowercase() == name)
            .cloned())
    }

    async fn join(&self, entry: &NewEntry) -> RepoResult<Insertion<Entry>> {
        let mut state = self.state.lock();
        if let Some(existing) = state
            .entries
            .values()
            .find(|e| e.contest_id == entry.contest_id && e.user_id == entry.user_id)
        {
            return Ok(Insertion::Existing(existing.clone()));
        }
        state.open_contest(entry.contest_id)?;

        let id = EntryId::new(state.next_id());
        let created = Entry {
            id,
            contest_id: entry.contest_id,
            user_id: entry.user_id,
            code: entry.code.clone(),
            display_name: entry.display_name.clone(),
            votes: 0,
            stars_received: 0,
            score: 0,
            created_at: Utc::now(),
        };
        state.entries.insert(id, created.clone());
        Ok(Insertion::Created(created))
    }

    async fn list_by_contest(&self, contest_id: ContestId) -> RepoResult<Vec<Entry>> {
        Ok(self
            .state
            .lock()
            .entries
            .values()
            .filter(|e| e.contest_id == contest_id)
            .cloned()
            .collect())
    }

    async fn count(&self, contest_id: ContestId) -> RepoResult<i64> {
        Ok(self.entry_count(contest_id) as i64)
    }

    async fn add_score(&self, id: EntryId, points: i64) -> RepoResult<Entry> {
        let mut state = self.state.lock();
        let contest_id = state
            .entries
            .get(&id)
            .ok_or(DomainError::EntryNotFound)?
            .contest_id;
        state.open_contest(contest_id)?;

        let entry = state.entries.get_mut(&id).ok_or(DomainError::EntryNotFound)?;
        entry.score += points;
        Ok(entry.clone())
    }

    async fn total_stars(&self, contest_id: ContestId) -> RepoResult<i64> {
        Ok(self
            .state
            .lock()
            .entries
            .values()
            .filter(|e| e.contest_id == contest_id)
            .map(|e| e.stars_received)
            .sum())
    }
}

#[async_trait]
impl VoteRepository for MemoryDb {
    async fn record(&self, vote: &NewVote) -> RepoResult<VoteRecord> {
        let mut state = self.state.lock();
        state.open_contest(vote.contest_id)?;
        if !state.entries.contains_key(&vote.entry_id) {
            return Err(DomainError::EntryNotFound);
        }

        let weight = vote.kind.weight(vote.exchange_ratio)?;
        let votes = state.entries[&vote.entry_id]
            .votes
            .checked_add(weight)
            .ok_or(DomainError::VoteWeightOverflow { stars: vote.kind.stars() })?;

        if vote.claims_guard {
            let inserted = state.vote_guards.insert((vote.contest_id, vote.voter_id));
            if !inserted && vote.enforce_single {
                return Ok(VoteRecord::AlreadyVoted);
            }
        }

        let vote_id = state.next_id();
        state.votes.push(Vote {
            id: vote_id,
            contest_id: vote.contest_id,
            entry_id: vote.entry_id,
            voter_id: vote.voter_id,
            kind: vote.kind,
            weight,
            created_at: Utc::now(),
        });

        let entry = state
            .entries
            .get_mut(&vote.entry_id)
            .ok_or(DomainError::EntryNotFound)?;
        entry.votes = votes;
        entry.stars_received += vote.kind.stars();
        Ok(VoteRecord::Recorded(entry.clone()))
    }

    async fn has_voted_for(
        &self,
        contest_id: ContestId,
        entry_code: &str,
        voter_id: UserId,
    ) -> RepoResult<bool> {
        let state = self.state.lock();
        let Some(entry) = state
            .entries
            .values()
            .find(|e| e.contest_id == contest_id && e.code == entry_code)
        else {
            return Ok(false);
        };
        Ok(state
            .votes
            .iter()
            .any(|v| v.entry_id == entry.id && v.voter_id == voter_id))
    }
}

#[async_trait]
impl EntitlementRepository for MemoryDb {
    async fn find(&self, user_id: UserId, feature: &str) -> RepoResult<Option<EntitlementRecord>> {
        Ok(self
            .state
            .lock()
            .entitlements
            .get(&(user_id, feature.to_string()))
            .cloned())
    }

    async fn grant_monthly(
        &self,
        user_id: UserId,
        feature: &str,
        days: i64,
    ) -> RepoResult<EntitlementRecord> {
        let mut state = self.state.lock();
        let record = state
            .entitlements
            .entry((user_id, feature.to_string()))
            .or_insert_with(|| EntitlementRecord::empty(user_id, feature));
        record.extend(Utc::now(), days);
        Ok(record.clone())
    }

    async fn grant_one_time(
        &self,
        user_id: UserId,
        feature: &str,
        credits: i64,
    ) -> RepoResult<EntitlementRecord> {
        let mut state = self.state.lock();
        let record = state
            .entitlements
            .entry((user_id, feature.to_string()))
            .or_insert_with(|| EntitlementRecord::empty(user_id, feature));
        record.add_credits(credits);
        Ok(record.clone())
    }

    async fn consume_one_time(&self, user_id: UserId, feature: &str) -> RepoResult<bool> {
        let mut state = self.state.lock();
        let Some(record) = state.entitlements.get_mut(&(user_id, feature.to_string())) else {
            return Ok(false);
        };
        let subscribed = record.expires_at.is_some_and(|e| e > Utc::now());
        if subscribed || record.credits <= 0 {
            return Ok(false);
        }
        record.credits -= 1;
        Ok(true)
    }
}

#[async_trait]
impl QuestionRepository for MemoryDb {
    async fn create(&self, question: &NewQuestion) -> RepoResult<Question> {
        let mut state = self.state.lock();
        let id = QuestionId::new(state.next_id());
        let created = Question {
            id,
            contest_id: question.contest_id,
            text: question.text.clone(),
            answers: question.answers.clone(),
            points: question.points,
        };
        state.questions.insert(id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: QuestionId) -> RepoResult<Option<Question>> {
        Ok(self.state.lock().questions.get(&id).cloned())
    }

    async fn list_for_contest(&self, contest_id: ContestId, limit: i64) -> RepoResult<Vec<Question>> {
        // Suspends like a real query, so concurrent quiz starts interleave here
        tokio::task::yield_now().await;
        let state = self.state.lock();
        let own = state
            .questions
            .values()
            .filter(|q| q.contest_id == Some(contest_id));
        let shared = state.questions.values().filter(|q| q.contest_id.is_none());
        Ok(own
            .chain(shared)
            .take(usize::try_from(limit).unwrap_or(0))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl DrawLockRepository for MemoryDb {
    async fn try_acquire(
        &self,
        contest_id: ContestId,
        holder: &str,
        stale_after: Duration,
    ) -> RepoResult<bool> {
        let mut state = self.state.lock();
        if !state.contests.contains_key(&contest_id) {
            return Err(DomainError::ContestNotFound(contest_id));
        }
        if let Some((_, acquired_at)) = state.locks.get(&contest_id) {
            if acquired_at.elapsed() <= stale_after {
                return Ok(false);
            }
        }
        state
            .locks
            .insert(contest_id, (holder.to_string(), Instant::now()));
        Ok(true)
    }

    async fn release(&self, contest_id: ContestId, holder: &str) -> RepoResult<()> {
        let mut state = self.state.lock();
        if state.locks.get(&contest_id).is_some_and(|(h, _)| h == holder) {
            state.locks.remove(&contest_id);
        }
        Ok(())
    }
}

#[async_trait]
impl PurchaseRepository for MemoryDb {
    async fn record(&self, purchase: &NewPurchase) -> RepoResult<Purchase> {
        let mut state = self.state.lock();
        let id = state.next_id();
        let created = Purchase {
            id,
            user_id: purchase.user_id,
            payload: purchase.payload.clone(),
            amount: purchase.amount,
            status: purchase.status,
            created_at: Utc::now(),
        };
        state.purchases.push(created.clone());
        Ok(created)
    }

    async fn list_needing_review(&self) -> RepoResult<Vec<Purchase>> {
        Ok(self
            .state
            .lock()
            .purchases
            .iter()
            .filter(|p| p.status == PurchaseStatus::NeedsReview)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SettingsRepository for MemoryDb {
    async fn get(&self, key: &str) -> RepoResult<Option<String>> {
        Ok(self.state.lock().settings.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> RepoResult<()> {
        self.state
            .lock()
            .settings
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
