//! TurnOrchestrator - drives one turn of conversation against the backend.
//!
//! A turn is: resolve the user's thread, append the message, start a run,
//! poll until the run settles (bounded attempts, fixed interval), then pull
//! the reply out of the run's own step list and sanitize it.
//!
//! Extraction is deliberately scoped to the steps of the run just started:
//! the thread accumulates messages across turns, and "most recent assistant
//! message" would be wrong the moment anything else touched the thread. The
//! run's step list only ever contains this turn's output.

use std::sync::Arc;
use std::time::Duration;

use crate::application::session_directory::{SessionDirectory, SessionDirectoryError};
use crate::domain::foundation::{AssistantId, RunId, ThreadId, UserId};
use crate::domain::sanitizer;
use crate::ports::{AssistantBackend, BackendError, MessageRole, RunStatus, StepDetails};

/// Reply when the backend reports the run failed.
pub const RUN_FAILED_REPLY: &str = "Assistant failed to respond.";
/// Reply when the poll budget is exhausted before the run settles.
pub const TIMEOUT_REPLY: &str = "Timeout waiting for response.";
/// Reply when a completed run recorded no reply message.
pub const NO_ANSWER_REPLY: &str = "No answer found for this question.";

/// Bounded-polling parameters for awaiting a run.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay between consecutive status checks.
    pub interval: Duration,
    /// Maximum number of status checks before giving up.
    pub attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            attempts: 60,
        }
    }
}

/// How a turn ended. Logged at the orchestrator boundary so degraded
/// replies are distinguishable in telemetry even though the HTTP response
/// stays a plain chat answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The assistant produced an answer.
    Answered,
    /// The backend reported the run as failed.
    RunFailed,
    /// The poll budget ran out before the run settled.
    TimedOut,
    /// The run completed without recording a reply message.
    NoAnswer,
}

/// The result of one conversation turn.
#[derive(Debug, Clone)]
pub struct TurnReply {
    /// Sanitized answer text, or a canned degraded-mode reply.
    pub answer: String,
    /// Classification of how the turn ended.
    pub outcome: TurnOutcome,
}

impl TurnReply {
    fn answered(answer: String) -> Self {
        Self {
            answer,
            outcome: TurnOutcome::Answered,
        }
    }

    fn degraded(outcome: TurnOutcome, reply: &str) -> Self {
        Self {
            answer: reply.to_string(),
            outcome,
        }
    }
}

/// Errors that abort a turn. Degraded outcomes (run failure, timeout, no
/// answer) are NOT errors; they come back as a `TurnReply`. Only backend
/// faults that leave the turn in an unknown state surface here.
#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error(transparent)]
    Session(#[from] SessionDirectoryError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Orchestrates conversation turns for all users.
pub struct TurnOrchestrator {
    directory: Arc<SessionDirectory>,
    backend: Arc<dyn AssistantBackend>,
    assistant: AssistantId,
    poll: PollConfig,
}

impl TurnOrchestrator {
    /// Creates an orchestrator for a provisioned assistant.
    pub fn new(
        directory: Arc<SessionDirectory>,
        backend: Arc<dyn AssistantBackend>,
        assistant: AssistantId,
        poll: PollConfig,
    ) -> Self {
        Self {
            directory,
            backend,
            assistant,
            poll,
        }
    }

    /// Runs one turn: resolve thread, append message, await the run,
    /// extract and sanitize the reply.
    ///
    /// Holds the user's turn lock for the whole sequence, so concurrent
    /// requests for the same user are serialized while other users proceed
    /// in parallel.
    pub async fn submit_turn(
        &self,
        user: &UserId,
        message: &str,
    ) -> Result<TurnReply, TurnError> {
        let lock = self.directory.turn_lock(user);
        let _turn = lock.lock().await;

        let thread = self.directory.get_or_create(user).await?;

        self.backend
            .append_message(&thread, MessageRole::User, message)
            .await?;

        let run = self.backend.start_run(&thread, &self.assistant).await?;
        tracing::debug!(user = %user, thread = %thread, run = %run, "started run");

        for attempt in 0..self.poll.attempts {
            match self.backend.get_run_status(&thread, &run).await? {
                RunStatus::Completed => {
                    let reply = self.extract_reply(&thread, &run).await?;
                    tracing::info!(
                        user = %user,
                        run = %run,
                        outcome = ?reply.outcome,
                        polls = attempt + 1,
                        "turn finished"
                    );
                    return Ok(reply);
                }
                RunStatus::Failed => {
                    tracing::warn!(user = %user, run = %run, "run reported failure");
                    return Ok(TurnReply::degraded(TurnOutcome::RunFailed, RUN_FAILED_REPLY));
                }
                RunStatus::Pending => tokio::time::sleep(self.poll.interval).await,
            }
        }

        tracing::warn!(
            user = %user,
            run = %run,
            attempts = self.poll.attempts,
            "run did not settle within the poll budget"
        );
        Ok(TurnReply::degraded(TurnOutcome::TimedOut, TIMEOUT_REPLY))
    }

    /// Pulls the reply for this specific run out of its step list.
    async fn extract_reply(&self, thread: &ThreadId, run: &RunId) -> Result<TurnReply, TurnError> {
        let steps = self.backend.list_run_steps(thread, run).await?;

        let message_id = steps.iter().find_map(|step| match &step.details {
            StepDetails::MessageCreation { message_id } => Some(message_id.clone()),
            StepDetails::ToolCalls => None,
        });

        let Some(message_id) = message_id else {
            return Ok(TurnReply::degraded(TurnOutcome::NoAnswer, NO_ANSWER_REPLY));
        };

        let message = self.backend.get_message(thread, &message_id).await?;
        match message.first_text() {
            Some(text) => Ok(TurnReply::answered(sanitizer::sanitize(text))),
            None => Ok(TurnReply::degraded(TurnOutcome::NoAnswer, NO_ANSWER_REPLY)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemorySessionStore, MockAssistantBackend};
    use crate::domain::foundation::MessageId;
    use crate::ports::{AssistantMessage, RunStep};

    fn fast_poll(attempts: u32) -> PollConfig {
        PollConfig {
            interval: Duration::from_millis(1),
            attempts,
        }
    }

    fn orchestrator(backend: MockAssistantBackend, poll: PollConfig) -> TurnOrchestrator {
        let backend = Arc::new(backend);
        let directory = Arc::new(SessionDirectory::new(
            Arc::new(InMemorySessionStore::new()),
            backend.clone(),
        ));
        TurnOrchestrator::new(directory, backend, AssistantId::new("asst_test"), poll)
    }

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    #[tokio::test]
    async fn answered_turn_returns_sanitized_text() {
        let backend =
            MockAssistantBackend::new().with_answer("The answer is 42【3:1†source.pdf】 and also [2].");
        let orchestrator = orchestrator(backend, fast_poll(60));

        let reply = orchestrator
            .submit_turn(&user("u1"), "what is the answer?")
            .await
            .unwrap();

        assert_eq!(reply.outcome, TurnOutcome::Answered);
        assert_eq!(reply.answer, "The answer is 42 and also .");
    }

    #[tokio::test]
    async fn message_is_appended_verbatim() {
        let backend = MockAssistantBackend::new().with_answer("ok");
        let orchestrator = orchestrator(backend.clone(), fast_poll(60));

        orchestrator
            .submit_turn(&user("u1"), "  raw   text【1:2†x】 ")
            .await
            .unwrap();

        let appended = backend.appended_messages();
        assert_eq!(appended.len(), 1);
        assert_eq!(appended[0].1, MessageRole::User);
        // Input is never pre-sanitized.
        assert_eq!(appended[0].2, "  raw   text【1:2†x】 ");
    }

    #[tokio::test]
    async fn failed_run_short_circuits_with_canned_reply() {
        let backend = MockAssistantBackend::new().with_run_statuses(vec![
            RunStatus::Pending,
            RunStatus::Failed,
            // Would complete if polling continued past the failure.
            RunStatus::Completed,
        ]);
        let orchestrator = orchestrator(backend.clone(), fast_poll(60));

        let reply = orchestrator.submit_turn(&user("u1"), "hi").await.unwrap();

        assert_eq!(reply.outcome, TurnOutcome::RunFailed);
        assert_eq!(reply.answer, RUN_FAILED_REPLY);
        assert_eq!(backend.poll_calls(), 2);
    }

    #[tokio::test]
    async fn exhausted_poll_budget_times_out() {
        let backend = MockAssistantBackend::new().with_run_statuses(vec![RunStatus::Pending]);
        let orchestrator = orchestrator(backend.clone(), fast_poll(5));

        let reply = orchestrator.submit_turn(&user("u1"), "hi").await.unwrap();

        assert_eq!(reply.outcome, TurnOutcome::TimedOut);
        assert_eq!(reply.answer, TIMEOUT_REPLY);
        assert_eq!(backend.poll_calls(), 5);
    }

    #[tokio::test]
    async fn completed_run_without_message_step_yields_no_answer() {
        let backend = MockAssistantBackend::new()
            .with_run_statuses(vec![RunStatus::Completed])
            .with_steps(vec![RunStep::tool_calls()]);
        let orchestrator = orchestrator(backend, fast_poll(60));

        let reply = orchestrator.submit_turn(&user("u1"), "hi").await.unwrap();

        assert_eq!(reply.outcome, TurnOutcome::NoAnswer);
        assert_eq!(reply.answer, NO_ANSWER_REPLY);
    }

    #[tokio::test]
    async fn extraction_is_scoped_to_this_runs_steps() {
        // The thread carries an older assistant message from a previous
        // turn, but the new run's step list only references the new one.
        let old_id = MessageId::new("msg_old");
        let new_id = MessageId::new("msg_new");
        let backend = MockAssistantBackend::new()
            .with_run_statuses(vec![RunStatus::Completed])
            .with_steps(vec![
                RunStep::tool_calls(),
                RunStep::message_creation(new_id.clone()),
            ])
            .with_message(old_id, AssistantMessage::new(vec!["stale answer".into()]))
            .with_message(new_id, AssistantMessage::new(vec!["fresh answer".into()]));
        let orchestrator = orchestrator(backend, fast_poll(60));

        let reply = orchestrator.submit_turn(&user("u1"), "hi").await.unwrap();

        assert_eq!(reply.outcome, TurnOutcome::Answered);
        assert_eq!(reply.answer, "fresh answer");
    }

    #[tokio::test]
    async fn concurrent_turns_for_one_user_are_serialized() {
        // Two simultaneous turns for a brand-new user. Without the per-user
        // turn lock both would race get-or-create (two threads created) and
        // their append/run/poll sequences would interleave.
        let reply_id = MessageId::new("msg_reply");
        let backend = MockAssistantBackend::new()
            .with_run_statuses(vec![
                RunStatus::Pending,
                RunStatus::Pending,
                RunStatus::Completed,
            ])
            .with_steps(vec![RunStep::message_creation(reply_id.clone())])
            .with_message(reply_id, AssistantMessage::new(vec!["done".into()]));
        let orchestrator = Arc::new(orchestrator(backend.clone(), fast_poll(60)));

        let first = tokio::spawn({
            let orchestrator = orchestrator.clone();
            async move { orchestrator.submit_turn(&user("u1"), "first").await }
        });
        let second = tokio::spawn({
            let orchestrator = orchestrator.clone();
            async move { orchestrator.submit_turn(&user("u1"), "second").await }
        });

        assert_eq!(first.await.unwrap().unwrap().outcome, TurnOutcome::Answered);
        assert_eq!(second.await.unwrap().unwrap().outcome, TurnOutcome::Answered);

        // Atomic get-or-create: one thread, shared by both appends.
        assert_eq!(backend.create_thread_calls(), 1);
        let appended = backend.appended_messages();
        assert_eq!(appended.len(), 2);
        assert_eq!(appended[0].0, appended[1].0);

        // The second turn's append only happens once the first turn has
        // fully finished polling and extracting. The first turn drains the
        // scripted Pending statuses; the second sees Completed at once.
        assert_eq!(
            backend.operation_log(),
            vec![
                "create_thread",
                "append_message",
                "start_run",
                "poll",
                "poll",
                "poll",
                "list_run_steps",
                "get_message",
                "append_message",
                "start_run",
                "poll",
                "list_run_steps",
                "get_message",
            ]
        );
    }

    #[tokio::test]
    async fn same_thread_is_reused_across_turns() {
        let backend = MockAssistantBackend::new().with_answer("first");
        let orchestrator = orchestrator(backend.clone(), fast_poll(60));

        orchestrator.submit_turn(&user("u1"), "one").await.unwrap();
        orchestrator.submit_turn(&user("u1"), "two").await.unwrap();

        assert_eq!(backend.create_thread_calls(), 1);
        let appended = backend.appended_messages();
        assert_eq!(appended.len(), 2);
        assert_eq!(appended[0].0, appended[1].0);
    }

    #[tokio::test]
    async fn backend_fault_mid_turn_is_an_error_not_a_reply() {
        let backend = MockAssistantBackend::new().with_answer("unreachable");
        let orchestrator = orchestrator(backend.clone(), fast_poll(60));

        // First call consumed by create_thread.
        let _ = backend.clone().with_failure(BackendError::network("reset"));
        let result = orchestrator.submit_turn(&user("u1"), "hi").await;

        assert!(matches!(result, Err(TurnError::Session(_))));
    }
}
