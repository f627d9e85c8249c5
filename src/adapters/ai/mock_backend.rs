//! Mock Assistant Backend for testing.
//!
//! Scriptable implementation of the AssistantBackend port, allowing
//! orchestrator and HTTP tests to run without a real provider.
//!
//! # Features
//!
//! - Scripted run status sequences (polled statuses consumed in order)
//! - Configurable run steps and message payloads
//! - Error injection on any operation
//! - Call tracking for verification
//!
//! # Example
//!
//! ```ignore
//! let backend = MockAssistantBackend::new()
//!     .with_run_statuses(vec![RunStatus::Pending, RunStatus::Completed])
//!     .with_answer("Hello from the mock!");
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::domain::foundation::{AssistantId, MessageId, RunId, ThreadId};
use crate::ports::{
    AssistantBackend, AssistantMessage, AssistantSpec, BackendError, MessageRole, RunStatus,
    RunStep,
};

/// Scriptable assistant backend for testing.
#[derive(Clone, Default)]
pub struct MockAssistantBackend {
    inner: Arc<MockState>,
}

#[derive(Default)]
struct MockState {
    thread_counter: AtomicUsize,
    run_counter: AtomicUsize,
    assistant_counter: AtomicUsize,
    /// Statuses returned by successive get_run_status calls; the last one
    /// repeats once the script is exhausted.
    statuses: Mutex<VecDeque<RunStatus>>,
    /// Steps returned by list_run_steps.
    steps: Mutex<Vec<RunStep>>,
    /// Messages retrievable by id.
    messages: Mutex<Vec<(MessageId, AssistantMessage)>>,
    /// Appended (thread, role, text) triples, for verification.
    appended: Mutex<Vec<(ThreadId, MessageRole, String)>>,
    /// Error to inject on the next backend call, if any.
    fail_next: Mutex<Option<BackendError>>,
    create_thread_calls: AtomicUsize,
    poll_calls: AtomicUsize,
    /// Every backend call in arrival order, for interleaving checks.
    operations: Mutex<Vec<&'static str>>,
}

impl MockAssistantBackend {
    /// Creates a mock that completes immediately with no steps.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the status sequence returned by successive polls.
    pub fn with_run_statuses(self, statuses: Vec<RunStatus>) -> Self {
        *self.inner.statuses.lock().unwrap() = statuses.into();
        self
    }

    /// Scripts the run steps returned by list_run_steps.
    pub fn with_steps(self, steps: Vec<RunStep>) -> Self {
        *self.inner.steps.lock().unwrap() = steps;
        self
    }

    /// Registers a retrievable message.
    pub fn with_message(self, id: MessageId, message: AssistantMessage) -> Self {
        self.inner.messages.lock().unwrap().push((id, message));
        self
    }

    /// Convenience: a run that completes with a single message-creation
    /// step whose message carries the given text.
    pub fn with_answer(self, text: impl Into<String>) -> Self {
        let id = MessageId::new("msg_mock_answer");
        self.with_run_statuses(vec![RunStatus::Completed])
            .with_steps(vec![RunStep::message_creation(id.clone())])
            .with_message(id, AssistantMessage::new(vec![text.into()]))
    }

    /// Injects an error on the next backend call.
    pub fn with_failure(self, error: BackendError) -> Self {
        *self.inner.fail_next.lock().unwrap() = Some(error);
        self
    }

    /// Number of threads created so far.
    pub fn create_thread_calls(&self) -> usize {
        self.inner.create_thread_calls.load(Ordering::SeqCst)
    }

    /// Number of status polls observed so far.
    pub fn poll_calls(&self) -> usize {
        self.inner.poll_calls.load(Ordering::SeqCst)
    }

    /// Messages appended to threads, in order.
    pub fn appended_messages(&self) -> Vec<(ThreadId, MessageRole, String)> {
        self.inner.appended.lock().unwrap().clone()
    }

    /// Backend calls in arrival order.
    pub fn operation_log(&self) -> Vec<&'static str> {
        self.inner.operations.lock().unwrap().clone()
    }

    fn record(&self, op: &'static str) {
        self.inner.operations.lock().unwrap().push(op);
    }

    fn take_failure(&self) -> Result<(), BackendError> {
        match self.inner.fail_next.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AssistantBackend for MockAssistantBackend {
    async fn create_assistant(&self, _spec: &AssistantSpec) -> Result<AssistantId, BackendError> {
        self.record("create_assistant");
        self.take_failure()?;
        let n = self.inner.assistant_counter.fetch_add(1, Ordering::SeqCst);
        Ok(AssistantId::new(format!("asst_mock_{}", n)))
    }

    async fn create_thread(&self) -> Result<ThreadId, BackendError> {
        self.record("create_thread");
        self.take_failure()?;
        self.inner.create_thread_calls.fetch_add(1, Ordering::SeqCst);
        let n = self.inner.thread_counter.fetch_add(1, Ordering::SeqCst);
        Ok(ThreadId::new(format!("thread_mock_{}", n)))
    }

    async fn append_message(
        &self,
        thread: &ThreadId,
        role: MessageRole,
        text: &str,
    ) -> Result<(), BackendError> {
        self.record("append_message");
        self.take_failure()?;
        self.inner
            .appended
            .lock()
            .unwrap()
            .push((thread.clone(), role, text.to_string()));
        Ok(())
    }

    async fn start_run(
        &self,
        _thread: &ThreadId,
        _assistant: &AssistantId,
    ) -> Result<RunId, BackendError> {
        self.record("start_run");
        self.take_failure()?;
        let n = self.inner.run_counter.fetch_add(1, Ordering::SeqCst);
        Ok(RunId::new(format!("run_mock_{}", n)))
    }

    async fn get_run_status(
        &self,
        _thread: &ThreadId,
        _run: &RunId,
    ) -> Result<RunStatus, BackendError> {
        self.record("poll");
        self.take_failure()?;
        self.inner.poll_calls.fetch_add(1, Ordering::SeqCst);

        let mut statuses = self.inner.statuses.lock().unwrap();
        if statuses.len() > 1 {
            Ok(statuses.pop_front().unwrap_or(RunStatus::Completed))
        } else {
            // Last scripted status repeats; unscripted mocks complete.
            Ok(statuses.front().copied().unwrap_or(RunStatus::Completed))
        }
    }

    async fn list_run_steps(
        &self,
        _thread: &ThreadId,
        _run: &RunId,
    ) -> Result<Vec<RunStep>, BackendError> {
        self.record("list_run_steps");
        self.take_failure()?;
        Ok(self.inner.steps.lock().unwrap().clone())
    }

    async fn get_message(
        &self,
        _thread: &ThreadId,
        message: &MessageId,
    ) -> Result<AssistantMessage, BackendError> {
        self.record("get_message");
        self.take_failure()?;
        self.inner
            .messages
            .lock()
            .unwrap()
            .iter()
            .find(|(id, _)| id == message)
            .map(|(_, msg)| msg.clone())
            .ok_or_else(|| BackendError::InvalidRequest(format!("no such message: {}", message)))
    }
}
