//! Built-in agent that answers by restating the user's message.

use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::agent::{Agent, AgentError, AgentFactory};
use crate::config::AgentConfig;
use crate::conversation::{Role, Turn};

/// Minimal agent used when no other agent is wired in.
#[derive(Debug, Clone)]
pub struct EchoAgent {
    name: String,
    persona: Option<String>,
}

impl EchoAgent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            persona: None,
        }
    }

    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        let persona = persona.into().trim().to_string();
        self.persona = (!persona.is_empty()).then_some(persona);
        self
    }

    fn reply(&self, history: &[Turn], message: &str) -> String {
        let earlier = history.iter().filter(|t| t.role == Role::User).count();
        let mut reply = match &self.persona {
            Some(persona) => format!("[{}] {}", persona, message),
            None => message.to_string(),
        };
        if earlier > 0 {
            reply.push_str(&format!(" (message {} in this session)", earlier + 1));
        }
        reply
    }
}

impl Agent for EchoAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn respond<'a>(
        &'a self,
        history: &'a [Turn],
        message: &'a str,
    ) -> BoxFuture<'a, Result<String, AgentError>> {
        Box::pin(async move {
            if message.trim().is_empty() {
                return Err(AgentError::Respond("message is empty".into()));
            }
            Ok(self.reply(history, message))
        })
    }
}

/// Builds an [`EchoAgent`] from the `[agent]` config section.
#[derive(Debug, Clone)]
pub struct ConfiguredAgentFactory {
    config: AgentConfig,
}

impl ConfiguredAgentFactory {
    pub fn new(config: AgentConfig) -> Self {
        Self { config }
    }
}

impl AgentFactory for ConfiguredAgentFactory {
    fn create(&self) -> BoxFuture<'_, Result<Arc<dyn Agent>, AgentError>> {
        Box::pin(async move {
            if self.config.name.trim().is_empty() {
                return Err(AgentError::Init("agent.name must not be empty".into()));
            }
            let mut agent = EchoAgent::new(self.config.name.clone());
            if let Some(path) = &self.config.persona_path {
                let persona = tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| AgentError::Persona {
                        path: path.clone(),
                        source,
                    })?;
                agent = agent.with_persona(persona);
            }
            tracing::debug!(agent = %agent.name(), "Agent constructed");
            Ok(Arc::new(agent) as Arc<dyn Agent>)
        })
    }
}
