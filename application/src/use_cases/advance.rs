//! Advance use case — the phase controller
//!
//! `advance()` is the single public entry point of the orchestration core.
//! Each call performs exactly one step — one participant turn, one human-turn
//! wait, or one phase-transition evaluation — and persists the result, so an
//! external scheduler can drive conversations without the core owning its
//! own clock. Terminal and human-parked conversations are no-ops.
//!
//! Budget and consensus exhaustion are reported as a normal `aborted` status
//! with a human-readable reason, never as errors: only integration bugs
//! (invalid appends, storage failures, a concurrent `advance`) surface as
//! [`AdvanceError`].

use crate::config::ConversationSettings;
use crate::gateway::{GenerationFailure, GenerationGateway};
use crate::ports::conversation_store::{ConversationStore, StoreError};
use crate::ports::event_sink::{EventSink, StepEvent};
use conclave_domain::{
    compile_decision, next_actor, phase_messages, phase_turns, tally, Actor, BallotBox,
    Conversation, ConversationContext, ConversationId, ConversationStatus, InvalidMessageError,
    Message, MessageCategory, MessageDraft, MessageRouter, Participant, Phase,
    PhaseTransitionError, Proposal, Roster, TallyOutcome, TallyResult, Vote,
};
use conclave_domain::prompt::{classify_utterance, extract_proposal, parse_vote};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex as StdMutex};
use thiserror::Error;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

/// Result of one successful step
#[derive(Debug)]
pub struct AdvanceOutcome {
    pub conversation: Conversation,
    /// Messages appended during this step, in sequence order
    pub appended: Vec<Message>,
}

/// Step-level failures
///
/// All of these leave the conversation state unchanged: a failed step commits
/// nothing.
#[derive(Error, Debug)]
pub enum AdvanceError {
    #[error("advance() is already running for conversation {0}; retry after it returns")]
    ConcurrentAdvance(ConversationId),

    #[error(transparent)]
    InvalidMessage(#[from] InvalidMessageError),

    #[error(transparent)]
    PhaseTransition(#[from] PhaseTransitionError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The top-level orchestration state machine
///
/// Holds the fixed roster and settings for the conversations it drives;
/// multiple controllers with different rosters or backend orderings can run
/// in the same process without cross-talk because nothing here is global.
pub struct PhaseController {
    store: Arc<dyn ConversationStore>,
    gateway: Arc<GenerationGateway>,
    sink: Arc<dyn EventSink>,
    roster: Roster,
    settings: ConversationSettings,
    /// Per-conversation exclusion tokens; `try_lock` failure means the caller
    /// violated the one-step-at-a-time contract
    guards: StdMutex<HashMap<ConversationId, Arc<AsyncMutex<()>>>>,
}

impl PhaseController {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        gateway: Arc<GenerationGateway>,
        sink: Arc<dyn EventSink>,
        roster: Roster,
        settings: ConversationSettings,
    ) -> Self {
        Self {
            store,
            gateway,
            sink,
            roster,
            settings,
            guards: StdMutex::new(HashMap::new()),
        }
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Perform exactly one step of the conversation
    pub async fn advance(&self, id: &ConversationId) -> Result<AdvanceOutcome, AdvanceError> {
        let guard = self.guard_for(id);
        let Ok(_lock) = guard.try_lock_owned() else {
            return Err(AdvanceError::ConcurrentAdvance(id.clone()));
        };

        let mut conversation = self.store.load(id).await?;
        if conversation.status() != ConversationStatus::Active {
            debug!(conversation = %id, status = %conversation.status(), "advance is a no-op");
            return Ok(AdvanceOutcome {
                conversation,
                appended: Vec::new(),
            });
        }

        let history = self.store.history(id).await?;
        let mut router = MessageRouter::from_history(id.clone(), history)?;

        let phase_before = conversation.phase();
        let status_before = conversation.status();

        self.run_step(&mut conversation, &mut router).await?;

        // Invariant: the conversation is parked exactly when the latest
        // question to the human is still unanswered.
        if router.pending_human_question().is_some() {
            conversation.await_human();
        }

        let appended = router.appended().to_vec();
        self.store.commit_step(&conversation, &appended).await?;

        for message in &appended {
            self.sink.emit(StepEvent::MessageAppended {
                conversation: id.clone(),
                message: message.clone(),
            });
        }
        if conversation.phase() != phase_before {
            self.sink.emit(StepEvent::PhaseChanged {
                conversation: id.clone(),
                phase: conversation.phase(),
            });
        }
        if conversation.status() != status_before {
            self.sink.emit(StepEvent::StatusChanged {
                conversation: id.clone(),
                status: conversation.status(),
            });
        }

        Ok(AdvanceOutcome {
            conversation,
            appended,
        })
    }

    async fn run_step(
        &self,
        conversation: &mut Conversation,
        router: &mut MessageRouter,
    ) -> Result<(), AdvanceError> {
        let budgets = &self.settings.budgets;

        if conversation.round() >= budgets.max_rounds {
            warn!(conversation = %conversation.id(), "round budget exhausted");
            conversation.abort(format!(
                "Round budget of {} exhausted without a decision",
                budgets.max_rounds
            ));
            return Ok(());
        }
        if router.len() as u64 >= budgets.max_total_messages {
            warn!(conversation = %conversation.id(), "message budget exhausted");
            conversation.abort(format!(
                "Message budget of {} exhausted without a decision",
                budgets.max_total_messages
            ));
            return Ok(());
        }

        // Pending human questions are resolved before anything else may force
        // progress; this step is the human-turn wait.
        if router.pending_human_question().is_some() {
            conversation.await_human();
            return Ok(());
        }

        match conversation.phase() {
            Phase::Initializing => {
                conversation.transition_to(Phase::Exploring, router.last_seq())?;
                info!(conversation = %conversation.id(), "conversation entered exploration");
                Ok(())
            }
            Phase::Exploring => self.step_exploring(conversation, router).await,
            Phase::Discussing => self.step_discussing(conversation, router).await,
            Phase::Voting => self.step_voting(conversation, router).await,
            // Phase and status disagree; nothing sensible to do but wait for
            // the operator to look at the store.
            Phase::Completed => Ok(()),
        }
    }

    async fn step_exploring(
        &self,
        conversation: &mut Conversation,
        router: &mut MessageRouter,
    ) -> Result<(), AdvanceError> {
        let spoken: HashSet<&str> = phase_messages(conversation, router)
            .filter(|m| m.is_from_participant())
            .map(|m| m.sender_id.as_str())
            .collect();
        let everyone_spoke = self
            .roster
            .members()
            .iter()
            .all(|m| spoken.contains(m.id().as_str()));

        if everyone_spoke
            || self.cycles_in_phase(conversation, router) >= self.settings.budgets.exploring_round_cap
        {
            conversation.transition_to(Phase::Discussing, router.last_seq())?;
            info!(conversation = %conversation.id(), "exploration complete, discussion begins");
            return Ok(());
        }

        self.take_turn(conversation, router).await
    }

    async fn step_discussing(
        &self,
        conversation: &mut Conversation,
        router: &mut MessageRouter,
    ) -> Result<(), AdvanceError> {
        if self.latest_proposal(router).is_some() {
            let cycles = self.cycles_in_phase(conversation, router);
            let stuck = self.is_stuck(router);
            if cycles >= self.settings.budgets.min_discussion_rounds || stuck {
                if stuck {
                    info!(conversation = %conversation.id(), "stuck-conversation detector forcing an early vote");
                }
                conversation.transition_to(Phase::Voting, router.last_seq())?;
                info!(conversation = %conversation.id(), "voting begins");
                return Ok(());
            }
        }

        self.take_turn(conversation, router).await
    }

    async fn step_voting(
        &self,
        conversation: &mut Conversation,
        router: &mut MessageRouter,
    ) -> Result<(), AdvanceError> {
        let Some(proposal) = self.latest_proposal(router) else {
            // No proposal survived to the voting phase; only reachable with a
            // corrupted log, so fall back to discussion.
            warn!(conversation = %conversation.id(), "voting phase without a proposal, returning to discussion");
            conversation.transition_to(Phase::Discussing, router.last_seq())?;
            return Ok(());
        };

        let ballots = self.collect_ballots(conversation, router, &proposal);
        if ballots.vote_count() < self.roster.len() {
            return self.take_turn(conversation, router).await;
        }

        let result = tally(&ballots, &self.roster, &self.settings.consensus);
        info!(
            conversation = %conversation.id(),
            outcome = %result.outcome,
            approve = result.approve_weight,
            reject = result.reject_weight,
            abstain = result.abstain_weight,
            "votes tallied"
        );

        match result.outcome {
            TallyOutcome::Approved => {
                self.close_with_summary(conversation, router, &proposal, &result, false)
                    .await
            }
            TallyOutcome::Rejected => {
                info!(conversation = %conversation.id(), "proposal rejected, returning to discussion");
                conversation.transition_to(Phase::Discussing, router.last_seq())?;
                Ok(())
            }
            TallyOutcome::NoQuorum => {
                conversation.bump_voting_round();
                if conversation.voting_rounds() >= self.settings.consensus.max_voting_rounds {
                    self.resolve_voting_exhausted(conversation, router, &proposal, &result)
                        .await
                } else {
                    info!(
                        conversation = %conversation.id(),
                        voting_round = conversation.voting_rounds(),
                        "no quorum, re-running the vote"
                    );
                    conversation.restart_phase(router.last_seq());
                    Ok(())
                }
            }
        }
    }

    async fn resolve_voting_exhausted(
        &self,
        conversation: &mut Conversation,
        router: &mut MessageRouter,
        proposal: &Proposal,
        result: &TallyResult,
    ) -> Result<(), AdvanceError> {
        if !self.settings.consensus.enable_forced_decision {
            conversation.abort(format!(
                "No consensus after {} voting rounds and the forced-decision fallback is disabled",
                conversation.voting_rounds()
            ));
            return Ok(());
        }
        info!(conversation = %conversation.id(), "voting retries exhausted, facilitator casts the forced decision");
        self.close_with_summary(conversation, router, proposal, result, true)
            .await
    }

    /// The facilitator's closing turn: generate the synthesis, append it as
    /// the consensus summary, and complete the conversation
    async fn close_with_summary(
        &self,
        conversation: &mut Conversation,
        router: &mut MessageRouter,
        proposal: &Proposal,
        result: &TallyResult,
        forced: bool,
    ) -> Result<(), AdvanceError> {
        let facilitator = self.roster.facilitator();
        let context = ConversationContext::summarizing(
            conversation.goal(),
            conversation.phase(),
            facilitator,
            router.history(),
            forced,
        );

        match self.gateway.generate(&context).await {
            Ok(utterance) => {
                conversation.reset_turn_failures();
                router.append(
                    MessageDraft::participant(
                        facilitator.id().as_str(),
                        MessageCategory::ConsensusSummary,
                        utterance.text,
                    )
                    .with_parent(proposal.message.clone()),
                )?;
                let decision =
                    compile_decision(conversation.goal(), proposal, result, &self.roster, forced);
                conversation.complete(decision);
                info!(conversation = %conversation.id(), forced, "conversation completed");
                Ok(())
            }
            Err(failure) => {
                let failures = conversation.record_turn_failure();
                if failures <= self.settings.budgets.turn_retry_limit {
                    warn!(
                        conversation = %conversation.id(),
                        attempt = failures,
                        "synthesis generation failed, the closing turn will be retried: {failure}"
                    );
                    return Ok(());
                }
                conversation.reset_turn_failures();
                if forced {
                    // The fallback itself failed: abort, never silently
                    // complete.
                    conversation.abort(format!(
                        "No consensus: voting retries exhausted and the forced-decision synthesis failed ({failure})"
                    ));
                    return Ok(());
                }
                // The tally stands; the compiled voting record replaces the
                // generated prose.
                warn!(conversation = %conversation.id(), "synthesis retries exhausted, completing with the compiled decision record");
                let decision =
                    compile_decision(conversation.goal(), proposal, result, &self.roster, forced);
                router.append(
                    MessageDraft::participant(
                        facilitator.id().as_str(),
                        MessageCategory::ConsensusSummary,
                        decision.clone(),
                    )
                    .with_parent(proposal.message.clone()),
                )?;
                conversation.complete(decision);
                Ok(())
            }
        }
    }

    /// One participant speaking turn through the generation gateway
    async fn take_turn(
        &self,
        conversation: &mut Conversation,
        router: &mut MessageRouter,
    ) -> Result<(), AdvanceError> {
        let actor = next_actor(conversation, &self.roster, router);
        let Actor::Participant(participant_id) = actor else {
            conversation.await_human();
            return Ok(());
        };
        let Some(participant) = self.roster.get(&participant_id) else {
            // The scheduler only hands out roster members; a miss means the
            // roster changed mid-conversation, which configuration forbids.
            warn!(participant = %participant_id, "scheduled participant missing from roster, skipping step");
            return Ok(());
        };

        let context = ConversationContext::speaking(
            conversation.goal(),
            conversation.phase(),
            participant,
            router.history(),
        );

        match self.gateway.generate(&context).await {
            Ok(utterance) => {
                info!(
                    conversation = %conversation.id(),
                    participant = %participant_id,
                    backend = %utterance.backend,
                    latency_ms = utterance.latency.as_millis() as u64,
                    "turn generated"
                );
                conversation.reset_turn_failures();
                let draft = self.draft_for(conversation.phase(), participant, utterance.text, router);
                router.append(draft)?;
                self.after_turn(conversation, router);
                Ok(())
            }
            Err(failure) => self.handle_generation_failure(conversation, router, participant, failure),
        }
    }

    /// Classify a generated utterance into a message draft
    fn draft_for(
        &self,
        phase: Phase,
        participant: &Participant,
        text: String,
        router: &MessageRouter,
    ) -> MessageDraft {
        let category = classify_utterance(phase, &text);
        let mut draft = MessageDraft::participant(participant.id().as_str(), category, text);
        if category == MessageCategory::Vote
            && let Some(proposal_message) = router
                .history()
                .iter()
                .rev()
                .find(|m| m.category == MessageCategory::Proposal)
        {
            draft = draft.with_parent(proposal_message.id.clone());
        }
        draft
    }

    /// Absorb a per-turn generation failure into bounded retries
    ///
    /// Below the retry cap nothing is appended and the same actor's turn runs
    /// again on the next `advance()` call. At the cap a placeholder message is
    /// recorded under the participant's id — in the voting phase it is an
    /// explicit abstention — so the turn is never silently skipped.
    fn handle_generation_failure(
        &self,
        conversation: &mut Conversation,
        router: &mut MessageRouter,
        participant: &Participant,
        failure: GenerationFailure,
    ) -> Result<(), AdvanceError> {
        let failures = conversation.record_turn_failure();
        if failures <= self.settings.budgets.turn_retry_limit {
            warn!(
                conversation = %conversation.id(),
                participant = %participant.id(),
                attempt = failures,
                "generation failed, the turn will be retried on the next advance: {failure}"
            );
            return Ok(());
        }

        warn!(
            conversation = %conversation.id(),
            participant = %participant.id(),
            "turn retry cap exhausted, recording a placeholder message"
        );
        let note = format!(
            "(automatic placeholder) {} could not produce a response after {} attempts; last failure: {}",
            participant.name(),
            failures,
            failure
        );
        let draft = if conversation.phase() == Phase::Voting {
            self.draft_for(
                Phase::Voting,
                participant,
                format!("VOTE: ABSTAIN\n{note}"),
                router,
            )
        } else {
            MessageDraft::participant(participant.id().as_str(), MessageCategory::Discussion, note)
        };
        router.append(draft)?;
        conversation.reset_turn_failures();
        self.after_turn(conversation, router);
        Ok(())
    }

    /// Bookkeeping after an appended turn: count completed cycles
    fn after_turn(&self, conversation: &mut Conversation, router: &MessageRouter) {
        if phase_turns(conversation, router) % self.roster.len() == 0 {
            conversation.bump_round();
        }
    }

    fn cycles_in_phase(&self, conversation: &Conversation, router: &MessageRouter) -> u32 {
        (phase_turns(conversation, router) / self.roster.len()) as u32
    }

    /// The active proposal: the latest `proposal`-category message
    fn latest_proposal(&self, router: &MessageRouter) -> Option<Proposal> {
        let message = router
            .history()
            .iter()
            .rev()
            .find(|m| m.category == MessageCategory::Proposal)?;
        let description =
            extract_proposal(&message.content).unwrap_or_else(|| message.content.clone());
        let round = self.round_at(router, message.seq);
        Some(Proposal::from_message(message, description, round))
    }

    /// Completed cycles before the message at `seq` was appended
    fn round_at(&self, router: &MessageRouter, seq: u64) -> u32 {
        let turns = router
            .history()
            .iter()
            .filter(|m| m.seq <= seq && m.is_from_participant())
            .count();
        (turns / self.roster.len()) as u32
    }

    /// Rebuild the ballot box from the current voting segment
    ///
    /// Votes are parsed from `vote`-category messages; a later vote from the
    /// same participant replaces the earlier one.
    fn collect_ballots(
        &self,
        conversation: &Conversation,
        router: &MessageRouter,
        proposal: &Proposal,
    ) -> BallotBox {
        let mut ballots = BallotBox::new(proposal.id.clone());
        for message in phase_messages(conversation, router) {
            if message.category != MessageCategory::Vote || !message.is_from_participant() {
                continue;
            }
            let (value, rationale) = parse_vote(&message.content);
            let mut vote = Vote::new(proposal.id.clone(), message.sender_id.as_str(), value);
            if let Some(rationale) = rationale {
                vote = vote.with_rationale(rationale);
            }
            ballots.collect(vote);
        }
        ballots
    }

    /// No new proposal or rebuttal for the configured number of cycles
    fn is_stuck(&self, router: &MessageRouter) -> bool {
        let proposal_ids: HashSet<_> = router
            .history()
            .iter()
            .filter(|m| m.category == MessageCategory::Proposal)
            .map(|m| m.id.clone())
            .collect();
        let last_activity = router
            .history()
            .iter()
            .filter(|m| {
                m.category == MessageCategory::Proposal
                    || m.parent.as_ref().is_some_and(|p| proposal_ids.contains(p))
            })
            .map(|m| m.seq)
            .max();
        let Some(last_activity) = last_activity else {
            return false;
        };
        let idle_turns = router
            .history()
            .iter()
            .filter(|m| m.seq > last_activity && m.is_from_participant())
            .count();
        idle_turns >= self.settings.budgets.stall_rounds as usize * self.roster.len()
    }

    fn guard_for(&self, id: &ConversationId) -> Arc<AsyncMutex<()>> {
        let mut guards = self
            .guards
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guards.entry(id.clone()).or_default().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Budgets;
    use crate::ports::event_sink::NoEventSink;
    use crate::use_cases::submit_human_reply::SubmitHumanReply;
    use crate::use_cases::testing::{test_gateway, MemoryStore, QueueBackend};
    use conclave_domain::{ConsensusPolicy, Goal, Role, SenderKind, FORCED_DECISION_MARKER};
    use std::sync::Mutex;

    struct RecordingSink(Mutex<Vec<String>>);

    impl RecordingSink {
        fn new() -> Arc<Self> {
            Arc::new(Self(Mutex::new(Vec::new())))
        }

        fn kinds(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    impl EventSink for RecordingSink {
        fn emit(&self, event: StepEvent) {
            self.0.lock().unwrap().push(event.kind().to_string());
        }
    }

    fn roster3() -> Roster {
        Roster::new(vec![
            conclave_domain::Participant::new("alex", "Alex", Role::Facilitator, "You are Alex."),
            conclave_domain::Participant::new("jordan", "Jordan", Role::Strategist, "You are Jordan."),
            conclave_domain::Participant::new("casey", "Casey", Role::Reviewer, "You are Casey."),
        ])
        .unwrap()
    }

    async fn seeded_store() -> (Arc<MemoryStore>, ConversationId) {
        let store = Arc::new(MemoryStore::default());
        let id = ConversationId::new("c1");
        let conversation = Conversation::new(id.clone(), Goal::new("Pick a cache for the API"));
        store.create(&conversation).await.unwrap();
        (store, id)
    }

    fn controller(
        store: Arc<MemoryStore>,
        backend: Arc<QueueBackend>,
        sink: Arc<dyn EventSink>,
        settings: ConversationSettings,
    ) -> PhaseController {
        PhaseController::new(store, test_gateway(backend), sink, roster3(), settings)
    }

    /// Advance until the conversation leaves `active` or the step allowance
    /// runs out
    async fn drive(controller: &PhaseController, id: &ConversationId, max_steps: usize) -> Conversation {
        let mut last = controller.advance(id).await.unwrap().conversation;
        let mut steps = 1;
        while last.status() == ConversationStatus::Active && steps < max_steps {
            last = controller.advance(id).await.unwrap().conversation;
            steps += 1;
        }
        last
    }

    fn happy_path_script() -> Arc<QueueBackend> {
        QueueBackend::scripted(&[
            // Exploring: alex, jordan, casey
            "We should scope the cache by access pattern.",
            "A read-through cache fits the API shape.",
            "Watch out for stale invalidation bugs.",
            // Discussing: jordan (strategist) first, then alex, casey
            "PROPOSAL: adopt Redis with a read-through layer and 1GB cap",
            "The proposal covers the main risks.",
            "Agreed, invalidation strategy is included.",
            // Voting: jordan, casey, alex (facilitator last)
            "VOTE: APPROVE\nSolves the goal directly.",
            "VOTE: APPROVE\nRisks are addressed.",
            "VOTE: APPROVE\nConsensus is clear.",
            // Closing synthesis
            "The team agreed to adopt Redis with a read-through layer.",
        ])
    }

    #[tokio::test]
    async fn test_full_run_reaches_completed_with_summary() {
        let (store, id) = seeded_store().await;
        let sink = RecordingSink::new();
        let controller = controller(
            store.clone(),
            happy_path_script(),
            sink.clone(),
            ConversationSettings::default(),
        );

        let conversation = drive(&controller, &id, 30).await;

        assert_eq!(conversation.status(), ConversationStatus::Completed);
        assert_eq!(conversation.phase(), Phase::Completed);
        let summary = conversation.final_summary().unwrap();
        assert!(!summary.is_empty());
        assert!(summary.contains("adopt Redis"));
        assert!(!summary.contains(FORCED_DECISION_MARKER));

        // The log ends with the consensus summary and sequence numbers are
        // gap-free from 1.
        let history = store.history(&id).await.unwrap();
        let last = history.last().unwrap();
        assert_eq!(last.category, MessageCategory::ConsensusSummary);
        for (i, message) in history.iter().enumerate() {
            assert_eq!(message.seq, i as u64 + 1);
        }

        // Vote messages are threaded under the proposal.
        let proposal_id = history
            .iter()
            .find(|m| m.category == MessageCategory::Proposal)
            .map(|m| m.id.clone())
            .unwrap();
        for vote in history.iter().filter(|m| m.category == MessageCategory::Vote) {
            assert_eq!(vote.parent.as_ref(), Some(&proposal_id));
        }

        // Phase changes were announced, ending in voting -> completed.
        let kinds = sink.kinds();
        assert!(kinds.iter().any(|k| k == "phase_changed"));
        assert!(kinds.iter().any(|k| k == "status_changed"));
        assert!(kinds.iter().any(|k| k == "message_appended"));
    }

    #[tokio::test]
    async fn test_advance_is_noop_on_terminal_conversation() {
        let (store, id) = seeded_store().await;
        let settings = ConversationSettings {
            budgets: Budgets {
                max_rounds: 0,
                ..Budgets::default()
            },
            ..ConversationSettings::default()
        };
        let controller = controller(
            store.clone(),
            QueueBackend::repeating("irrelevant"),
            Arc::new(NoEventSink),
            settings,
        );

        // First advance aborts on the zero round budget.
        let aborted = controller.advance(&id).await.unwrap().conversation;
        assert_eq!(aborted.status(), ConversationStatus::Aborted);

        // Subsequent advances change nothing and append nothing.
        let outcome = controller.advance(&id).await.unwrap();
        assert_eq!(outcome.conversation, aborted);
        assert!(outcome.appended.is_empty());
    }

    #[tokio::test]
    async fn test_round_budget_aborts_in_discussing() {
        let (store, id) = seeded_store().await;
        let controller = controller(
            store,
            QueueBackend::repeating("We should keep weighing the options."),
            Arc::new(NoEventSink),
            ConversationSettings::default(),
        );

        let conversation = drive(&controller, &id, 300).await;

        assert_eq!(conversation.status(), ConversationStatus::Aborted);
        assert_eq!(conversation.phase(), Phase::Discussing);
        assert_eq!(conversation.round(), 20);
        assert!(conversation.final_summary().unwrap().contains("budget"));
    }

    #[tokio::test]
    async fn test_generation_failure_retries_then_placeholder() {
        let (store, id) = seeded_store().await;
        let controller = controller(
            store.clone(),
            QueueBackend::failing(),
            Arc::new(NoEventSink),
            ConversationSettings::default(),
        );

        // Step 1: initializing -> exploring.
        controller.advance(&id).await.unwrap();

        // Two failed attempts retry the same turn without appending.
        for attempt in 1..=2u32 {
            let outcome = controller.advance(&id).await.unwrap();
            assert!(outcome.appended.is_empty());
            assert_eq!(outcome.conversation.turn_failures(), attempt);
            assert_eq!(outcome.conversation.status(), ConversationStatus::Active);
        }

        // Third failure exceeds the cap: a placeholder is recorded for the
        // facilitator's turn and the rotation moves on.
        let outcome = controller.advance(&id).await.unwrap();
        assert_eq!(outcome.appended.len(), 1);
        let placeholder = &outcome.appended[0];
        assert_eq!(placeholder.sender_id, "alex");
        assert!(placeholder.content.contains("automatic placeholder"));
        assert_eq!(outcome.conversation.turn_failures(), 0);
    }

    #[tokio::test]
    async fn test_human_question_parks_and_reply_resumes() {
        let (store, id) = seeded_store().await;
        let backend = QueueBackend::scripted(&[
            "QUESTION FOR USER: What is the monthly budget?",
            "Good, that narrows it down.",
        ]);
        let controller = controller(
            store.clone(),
            backend,
            Arc::new(NoEventSink),
            ConversationSettings::default(),
        );

        // Transition step, then the facilitator asks the human.
        controller.advance(&id).await.unwrap();
        let outcome = controller.advance(&id).await.unwrap();
        assert_eq!(
            outcome.conversation.status(),
            ConversationStatus::AwaitingHuman
        );
        assert_eq!(
            outcome.appended[0].category,
            MessageCategory::QuestionToHuman
        );

        // Parked conversations do not advance.
        let parked = controller.advance(&id).await.unwrap();
        assert!(parked.appended.is_empty());
        assert_eq!(parked.conversation.status(), ConversationStatus::AwaitingHuman);

        // A human reply releases the pause and the next actor speaks.
        SubmitHumanReply::new(store.clone(), Arc::new(NoEventSink))
            .execute(&id, "About 10k per month")
            .await
            .unwrap();
        let outcome = controller.advance(&id).await.unwrap();
        assert_eq!(outcome.conversation.status(), ConversationStatus::Active);
        assert_eq!(outcome.appended.len(), 1);
        assert_eq!(outcome.appended[0].sender_kind, SenderKind::Participant);
        assert_eq!(outcome.appended[0].sender_id, "jordan");
    }

    #[tokio::test]
    async fn test_no_quorum_exhaustion_forces_flagged_decision() {
        let (store, id) = seeded_store().await;
        let settings = ConversationSettings {
            consensus: ConsensusPolicy {
                max_voting_rounds: 1,
                ..ConsensusPolicy::default()
            },
            ..ConversationSettings::default()
        };
        let backend = QueueBackend::scripted(&[
            // Exploring
            "Initial take from Alex.",
            "Initial take from Jordan.",
            "Initial take from Casey.",
            // Discussing
            "PROPOSAL: rewrite the service in-place",
            "This is risky but plausible.",
            "I remain unconvinced.",
            // Voting: split vote -> no_quorum (1 approve / 1 reject / 1 abstain)
            "VOTE: APPROVE\nWorth it.",
            "VOTE: REJECT\nToo risky.",
            "VOTE: ABSTAIN",
            // Forced synthesis by the facilitator
            "Weighing all positions, we proceed with a phased rewrite.",
        ]);
        let controller = controller(store, backend, Arc::new(NoEventSink), settings);

        let conversation = drive(&controller, &id, 40).await;

        assert_eq!(conversation.status(), ConversationStatus::Completed);
        let summary = conversation.final_summary().unwrap();
        assert!(summary.contains(FORCED_DECISION_MARKER));
    }

    #[tokio::test]
    async fn test_no_quorum_with_fallback_disabled_aborts() {
        let (store, id) = seeded_store().await;
        let settings = ConversationSettings {
            consensus: ConsensusPolicy {
                max_voting_rounds: 1,
                enable_forced_decision: false,
                ..ConsensusPolicy::default()
            },
            ..ConversationSettings::default()
        };
        let backend = QueueBackend::scripted(&[
            "Initial take from Alex.",
            "Initial take from Jordan.",
            "Initial take from Casey.",
            "PROPOSAL: rewrite the service in-place",
            "This is risky but plausible.",
            "I remain unconvinced.",
            "VOTE: APPROVE\nWorth it.",
            "VOTE: REJECT\nToo risky.",
            "VOTE: ABSTAIN",
        ]);
        let controller = controller(store, backend, Arc::new(NoEventSink), settings);

        let conversation = drive(&controller, &id, 40).await;

        assert_eq!(conversation.status(), ConversationStatus::Aborted);
        let summary = conversation.final_summary().unwrap().to_lowercase();
        assert!(summary.contains("no consensus"));
    }

    #[tokio::test]
    async fn test_rejected_vote_returns_to_discussing() {
        let (store, id) = seeded_store().await;
        let backend = QueueBackend::scripted(&[
            "Initial take from Alex.",
            "Initial take from Jordan.",
            "Initial take from Casey.",
            "PROPOSAL: drop the cache entirely",
            "That seems extreme.",
            "Strongly against.",
            // Unanimous rejection is decisive.
            "VOTE: REJECT\nBad idea.",
            "VOTE: REJECT\nAgreed, bad idea.",
            "VOTE: REJECT\nRejected.",
        ]);
        let controller = controller(
            store.clone(),
            backend,
            Arc::new(NoEventSink),
            ConversationSettings::default(),
        );

        // Drive through the vote and the tally evaluation.
        let mut conversation = controller.advance(&id).await.unwrap().conversation;
        let mut steps = 0;
        while conversation.phase() != Phase::Voting && steps < 20 {
            conversation = controller.advance(&id).await.unwrap().conversation;
            steps += 1;
        }
        while conversation.phase() == Phase::Voting && steps < 30 {
            conversation = controller.advance(&id).await.unwrap().conversation;
            steps += 1;
        }

        assert_eq!(conversation.phase(), Phase::Discussing);
        assert_eq!(conversation.status(), ConversationStatus::Active);
    }

    #[tokio::test]
    async fn test_concurrent_advance_is_rejected() {
        let (store, id) = seeded_store().await;
        let controller = Arc::new(controller(
            store,
            QueueBackend::hanging(),
            Arc::new(NoEventSink),
            ConversationSettings::default(),
        ));

        // Step 1 is the cheap phase transition; the second step blocks in
        // generation and holds the per-conversation guard.
        controller.advance(&id).await.unwrap();

        let background = {
            let controller = Arc::clone(&controller);
            let id = id.clone();
            tokio::spawn(async move { controller.advance(&id).await })
        };
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let err = controller.advance(&id).await.unwrap_err();
        assert!(matches!(err, AdvanceError::ConcurrentAdvance(_)));

        background.abort();
    }
}
