//! Scripted in-process agent for unit tests.

use super::{AgentCapabilities, AgentError, AgentProfile, ChatAgent, ChatTurn, ModelResponse};
use crate::style::StyleConfig;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub(crate) type CallLog = Arc<Mutex<Vec<String>>>;

pub(crate) struct ScriptedAgent {
    name: String,
    available: bool,
    script: Mutex<VecDeque<Result<String, AgentError>>>,
    latency_seconds: f64,
    delay: Option<Duration>,
    calls: AtomicUsize,
    log: Option<CallLog>,
}

impl ScriptedAgent {
    /// Agent that always replies "reply from {name}".
    pub fn ok(name: &str) -> Self {
        Self {
            name: name.to_string(),
            available: true,
            script: Mutex::new(VecDeque::new()),
            latency_seconds: 0.5,
            delay: None,
            calls: AtomicUsize::new(0),
            log: None,
        }
    }

    pub fn failing(name: &str, error: AgentError) -> Self {
        let agent = Self::ok(name);
        agent.script.lock().unwrap().push_back(Err(error));
        agent
    }

    pub fn unavailable(name: &str) -> Self {
        Self {
            available: false,
            ..Self::ok(name)
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = Some(log);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatAgent for ScriptedAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn profile(&self) -> AgentProfile {
        AgentProfile {
            backend_type: "scripted".to_string(),
            model_id: format!("{}-model", self.name),
            capabilities: AgentCapabilities::default(),
        }
    }

    fn is_available(&self) -> bool {
        self.available
    }

    async fn send(
        &self,
        _conversation: &[ChatTurn],
        _style: &StyleConfig,
    ) -> Result<ModelResponse, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(log) = &self.log {
            log.lock().unwrap().push(self.name.clone());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        // Last scripted outcome repeats once the queue is down to one entry.
        let next = {
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                script.pop_front()
            } else {
                script.front().cloned()
            }
        };

        match next {
            Some(Err(e)) => Err(e),
            Some(Ok(content)) => Ok(ModelResponse::new(&self.name, content, self.latency_seconds)),
            None => Ok(ModelResponse::new(
                &self.name,
                format!("reply from {}", self.name),
                self.latency_seconds,
            )),
        }
    }
}
