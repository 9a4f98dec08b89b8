// Integration tests for the conversation driver
// Agent calls are served by in-process executors so no CLI or network is needed

#[cfg(test)]
mod driver_integration_tests {
    use async_trait::async_trait;
    use prompt_assist_lib::agents::{AgentError, AgentExecutor, AgentReply, AgentRequest};
    use prompt_assist_lib::commands::{ConversationDriver, IgnoreReason, SendOutcome};
    use prompt_assist_lib::events::{
        AssistEvent, EventBroadcaster, EVENT_ASSIST_CLEARED, EVENT_ASSIST_STATUS_CHANGED,
        EVENT_ASSIST_TURN_APPENDED,
    };
    use prompt_assist_lib::{AssistTarget, ConversationContext, ConversationStatus, MessageRole};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::sync::Notify;

    /// Holds every call until released, then answers with a fixed reply
    struct GatedExecutor {
        calls: AtomicUsize,
        started: Notify,
        release: Notify,
        reply: String,
        requests: Mutex<Vec<AgentRequest>>,
    }

    impl GatedExecutor {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                started: Notify::new(),
                release: Notify::new(),
                reply: reply.to_string(),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AgentExecutor for GatedExecutor {
        async fn execute(&self, request: AgentRequest) -> Result<AgentReply, AgentError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request);
            self.started.notify_one();
            self.release.notified().await;
            Ok(AgentReply::text(self.reply.clone()))
        }
    }

    /// Answers immediately and records what it was asked
    struct RecordingExecutor {
        reply: String,
        requests: Mutex<Vec<AgentRequest>>,
    }

    impl RecordingExecutor {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<AgentRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AgentExecutor for RecordingExecutor {
        async fn execute(&self, request: AgentRequest) -> Result<AgentReply, AgentError> {
            self.requests.lock().unwrap().push(request);
            Ok(AgentReply::text(self.reply.clone()))
        }
    }

    struct FailingExecutor;

    #[async_trait]
    impl AgentExecutor for FailingExecutor {
        async fn execute(&self, _request: AgentRequest) -> Result<AgentReply, AgentError> {
            Err(AgentError::Http {
                status: 503,
                body: "agent offline".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_second_send_while_busy_is_ignored() {
        let executor = GatedExecutor::new("first reply");
        let driver = Arc::new(ConversationDriver::new(executor.clone()));

        let background = Arc::clone(&driver);
        let first = tokio::spawn(async move { background.send("first", None).await });

        executor.started.notified().await;
        assert_eq!(driver.status(), ConversationStatus::Sending);

        let second = driver.send("second", None).await;
        assert_eq!(second, SendOutcome::Ignored(IgnoreReason::Busy));
        assert_eq!(driver.turns().len(), 1);
        assert_eq!(executor.calls(), 1);

        executor.release.notify_one();
        let outcome = first.await.unwrap();
        assert!(matches!(outcome, SendOutcome::Replied(_)));

        let turns = driver.turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].content, "first");
        assert_eq!(turns[1].content, "first reply");
        assert_eq!(executor.calls(), 1);
        assert_eq!(driver.status(), ConversationStatus::Idle);
    }

    #[tokio::test]
    async fn test_start_with_blank_field_requests_draft() {
        let executor = RecordingExecutor::new(r#"{"recommendation": "Answers customer questions."}"#);
        let driver = ConversationDriver::new(executor.clone());

        let context = ConversationContext::new(AssistTarget::Description, "Helper");
        let outcome = driver.start(context).await;
        assert!(matches!(outcome, SendOutcome::Replied(_)));

        let requests = executor.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].user_text.contains("Help me write"));
        assert!(requests[0].user_text.contains("Helper"));
        assert!(!requests[0].user_text.contains("improve"));

        let turns = driver.turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, MessageRole::User);
        assert_eq!(turns[1].role, MessageRole::Assistant);

        let suggestion = driver.suggestion().unwrap();
        assert_eq!(suggestion.recommendation, "Answers customer questions.");
    }

    #[tokio::test]
    async fn test_start_with_existing_value_requests_improvement() {
        let executor = RecordingExecutor::new("Looks good.");
        let driver = ConversationDriver::new(executor.clone());

        let context = ConversationContext::new(AssistTarget::SystemPrompt, "Helper")
            .with_current_value("You are terse.");
        driver.start(context).await;

        let requests = executor.requests();
        assert!(requests[0].user_text.contains("improve"));
        assert!(requests[0].user_text.contains("You are terse."));
        assert_eq!(
            requests[0].context.as_ref().unwrap().assist_target,
            AssistTarget::SystemPrompt
        );
    }

    #[tokio::test]
    async fn test_start_resets_previous_conversation() {
        let executor = RecordingExecutor::new("reply");
        let driver = ConversationDriver::new(executor.clone());

        driver.send("earlier question", None).await;
        assert_eq!(driver.turns().len(), 2);

        driver
            .start(ConversationContext::new(AssistTarget::Description, "Helper"))
            .await;

        let turns = driver.turns();
        assert_eq!(turns.len(), 2);
        assert!(turns[0].content.starts_with("Help me write"));
        assert!(executor.requests()[1].prior_turns.is_empty());
    }

    #[tokio::test]
    async fn test_reply_after_clear_is_dropped() {
        let executor = GatedExecutor::new("late reply");
        let driver = Arc::new(ConversationDriver::new(executor.clone()));

        let background = Arc::clone(&driver);
        let pending = tokio::spawn(async move { background.send("hello", None).await });

        executor.started.notified().await;
        driver.clear();
        assert!(driver.turns().is_empty());
        assert_eq!(driver.status(), ConversationStatus::Idle);

        executor.release.notify_one();
        assert_eq!(pending.await.unwrap(), SendOutcome::Discarded);
        assert!(driver.turns().is_empty());
        assert!(driver.error().is_none());
    }

    #[tokio::test]
    async fn test_dropped_reply_still_ends_sending_status() {
        let broadcaster = Arc::new(EventBroadcaster::new());
        let mut rx = broadcaster.subscribe();
        let executor = GatedExecutor::new("late reply");
        let driver = Arc::new(ConversationDriver::new(executor.clone()).with_emitter(broadcaster));

        let background = Arc::clone(&driver);
        let pending = tokio::spawn(async move { background.send("hello", None).await });

        executor.started.notified().await;
        driver.clear();
        executor.release.notify_one();
        assert_eq!(pending.await.unwrap(), SendOutcome::Discarded);

        let events: Vec<AssistEvent> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
        let names: Vec<&str> = events.iter().map(|e| e.event.as_str()).collect();
        assert_eq!(
            names,
            vec![
                EVENT_ASSIST_TURN_APPENDED,
                EVENT_ASSIST_STATUS_CHANGED,
                EVENT_ASSIST_CLEARED,
                EVENT_ASSIST_STATUS_CHANGED,
            ]
        );
        assert_eq!(events[1].payload["newStatus"], "sending");
        assert_eq!(events[3].payload["oldStatus"], "sending");
        assert_eq!(events[3].payload["newStatus"], "idle");
    }

    #[tokio::test]
    async fn test_target_change_clears_conversation() {
        let executor = RecordingExecutor::new("reply");
        let driver = ConversationDriver::new(executor.clone());

        driver
            .send(
                "about the description",
                Some(ConversationContext::new(AssistTarget::Description, "Helper")),
            )
            .await;
        assert_eq!(driver.turns().len(), 2);

        driver
            .send(
                "about the prompt",
                Some(ConversationContext::new(AssistTarget::SystemPrompt, "Helper")),
            )
            .await;

        let turns = driver.turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].content, "about the prompt");
        assert!(executor.requests()[1].prior_turns.is_empty());
    }

    #[tokio::test]
    async fn test_failure_sets_error_without_reply() {
        let driver = ConversationDriver::new(Arc::new(FailingExecutor));

        let outcome = driver.send("hello", None).await;
        assert_eq!(
            outcome,
            SendOutcome::Failed("Agent API error (503): agent offline".to_string())
        );
        assert_eq!(
            driver.error().as_deref(),
            Some("Agent API error (503): agent offline")
        );
        assert_eq!(driver.turns().len(), 1);
        assert!(driver.suggestion().is_none());

        // The driver is back to idle, so a later send is accepted
        driver.send("again", None).await;
        assert_eq!(driver.turns().len(), 2);
        assert!(driver.error().is_some());
    }
}
