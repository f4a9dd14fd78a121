//! Chat orchestration
//!
//! One turn: retrieve knowledge for the message, build the system prompt,
//! forward recent history to the generator, and recover locally when the
//! generator fails.

use tracing::{debug, info, warn};

use crate::context::PromptBuilder;
use crate::error::{Error, Result, ServiceError};
use crate::knowledge::Retriever;

use super::conversation::Conversation;
use super::fallback::FallbackResponder;
use super::generator::{GenerationOptions, TextGenerator};
use super::types::{Message, Reply, ReplySource};

/// Number of prior messages forwarded to the generator by default
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Answers user messages with retrieval-augmented prompts
pub struct ChatService<G> {
    retriever: Retriever,
    prompt: PromptBuilder,
    generator: G,
    fallback: FallbackResponder,
    history_limit: usize,
    options: GenerationOptions,
}

impl<G> std::fmt::Debug for ChatService<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatService")
            .field("variant", &self.retriever.variant())
            .field("top_k", &self.retriever.top_k())
            .field("history_limit", &self.history_limit)
            .field("model", &self.options.model)
            .finish()
    }
}

impl<G: TextGenerator> ChatService<G> {
    pub fn new(retriever: Retriever, prompt: PromptBuilder, generator: G) -> Self {
        Self {
            retriever,
            prompt,
            generator,
            fallback: FallbackResponder::new(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            options: GenerationOptions::default(),
        }
    }

    /// Set the model and output budget requested from the generator
    pub fn with_generation_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn generation_options(&self) -> &GenerationOptions {
        &self.options
    }

    /// Set how many prior messages are forwarded to the generator
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub fn history_limit(&self) -> usize {
        self.history_limit
    }

    /// The system prompt that would accompany `message`
    pub fn system_prompt(&self, message: &str) -> String {
        self.prompt.build(&self.retriever.search(message))
    }

    /// Answer one message given the prior turns
    ///
    /// Only an empty message is an error. Generator failures are turned into
    /// a fallback or configuration reply.
    pub async fn respond(&self, history: &[Message], message: &str) -> Result<Reply> {
        if message.trim().is_empty() {
            return Err(Error::InvalidInput("Message is required".to_string()));
        }

        let knowledge = self.retriever.search(message);
        let knowledge_ids: Vec<u32> = knowledge.iter().map(|e| e.id).collect();
        debug!(retrieved = knowledge.len(), ids = ?knowledge_ids, "Retrieved knowledge for message");

        let system = self.prompt.build(&knowledge);
        let start = history.len().saturating_sub(self.history_limit);
        let recent = &history[start..];

        match self
            .generator
            .generate(&self.options, &system, recent, message)
            .await
        {
            Ok(text) => {
                info!(length = text.len(), "Generated reply");
                Ok(Reply {
                    spoken: text.clone(),
                    text,
                    source: ReplySource::Model,
                    knowledge_ids,
                })
            }
            Err(err) => Ok(self.recover(err, message, knowledge_ids)),
        }
    }

    /// Answer a message and record both sides in `conversation`
    pub async fn respond_in(&self, conversation: &mut Conversation, message: &str) -> Result<Reply> {
        let reply = self.respond(conversation.messages(), message).await?;
        conversation.push_user(message);
        conversation.push_assistant(reply.text.clone());
        Ok(reply)
    }

    fn recover(&self, err: ServiceError, message: &str, knowledge_ids: Vec<u32>) -> Reply {
        warn!(code = err.code(), error = %err, "Text generation failed");

        if err.is_configuration() {
            return Reply {
                text: format!("API Configuration Error: {}", err),
                spoken: "There's an API configuration issue. Please check the logs for details."
                    .to_string(),
                source: ReplySource::ConfigurationError,
                knowledge_ids,
            };
        }

        let fallback = self.fallback.reply(message);
        let text = match &err {
            ServiceError::Network(detail) => format!(
                "{} (Network issue - using offline mode. Error: {})",
                fallback, detail
            ),
            _ => format!("{} (Using offline mode)", fallback),
        };

        Reply {
            text,
            spoken: fallback.to_string(),
            source: ReplySource::Fallback,
            knowledge_ids,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;
    use crate::context::ContextFormat;
    use crate::knowledge::{KnowledgeBase, KnowledgeEntry, ScoringVariant};

    /// Records calls and replies with a fixed outcome
    struct ScriptedGenerator {
        outcome: std::result::Result<String, ServiceError>,
        calls: Mutex<Vec<(String, usize, String)>>,
        requested: Mutex<Vec<GenerationOptions>>,
    }

    impl ScriptedGenerator {
        fn new(outcome: std::result::Result<String, ServiceError>) -> Self {
            Self {
                outcome,
                calls: Mutex::new(Vec::new()),
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(
            &self,
            options: &GenerationOptions,
            system: &str,
            history: &[Message],
            message: &str,
        ) -> std::result::Result<String, ServiceError> {
            self.requested.lock().unwrap().push(options.clone());
            self.calls.lock().unwrap().push((
                system.to_string(),
                history.len(),
                message.to_string(),
            ));
            self.outcome.clone()
        }
    }

    fn service(outcome: std::result::Result<String, ServiceError>) -> ChatService<ScriptedGenerator> {
        let knowledge = Arc::new(
            KnowledgeBase::new(vec![
                KnowledgeEntry::new(9, "Common Symptoms", "Headaches", "Headaches track triggers"),
                KnowledgeEntry::new(14, "Appointments", "Clinic Experience", "Book appointments online"),
            ])
            .unwrap(),
        );
        let retriever = Retriever::new(knowledge, ScoringVariant::Keyword);
        let prompt = PromptBuilder::new("Persona.", "Be brief.", ContextFormat::Bulleted);
        ChatService::new(retriever, prompt, ScriptedGenerator::new(outcome))
    }

    #[tokio::test]
    async fn test_model_reply_includes_knowledge() {
        let service = service(Ok("Rest and hydrate.".to_string()));
        let reply = service.respond(&[], "I have headaches").await.unwrap();

        assert_eq!(reply.source, ReplySource::Model);
        assert_eq!(reply.text, "Rest and hydrate.");
        assert_eq!(reply.spoken, reply.text);
        assert_eq!(reply.knowledge_ids, vec![9]);

        let calls = service.generator.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].0.contains("- Headaches: Headaches track triggers"));
        assert_eq!(calls[0].2, "I have headaches");
    }

    #[tokio::test]
    async fn test_generation_options_forwarded() {
        let options = GenerationOptions {
            model: "claude-3-haiku-20240307".to_string(),
            max_tokens: 256,
        };
        let service = service(Ok("ok".to_string())).with_generation_options(options.clone());

        service.respond(&[], "hello").await.unwrap();

        let requested = service.generator.requested.lock().unwrap();
        assert_eq!(requested.as_slice(), &[options]);
    }

    #[tokio::test]
    async fn test_default_generation_options() {
        let service = service(Ok("ok".to_string()));
        service.respond(&[], "hello").await.unwrap();

        let requested = service.generator.requested.lock().unwrap();
        assert_eq!(requested[0], GenerationOptions::default());
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let service = service(Ok("unused".to_string()));
        let err = service.respond(&[], "   ").await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(service.generator.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_history_is_trimmed() {
        let service = service(Ok("ok".to_string())).with_history_limit(4);
        let history: Vec<Message> = (0..9).map(|i| Message::user(format!("m{}", i))).collect();

        service.respond(&history, "hello").await.unwrap();

        let calls = service.generator.calls.lock().unwrap();
        assert_eq!(calls[0].1, 4);
    }

    #[tokio::test]
    async fn test_configuration_error_reply() {
        let service = service(Err(ServiceError::MissingApiKey));
        let reply = service.respond(&[], "hello").await.unwrap();

        assert_eq!(reply.source, ReplySource::ConfigurationError);
        assert!(reply.text.starts_with("API Configuration Error:"));
        assert!(reply.is_fallback());
    }

    #[tokio::test]
    async fn test_network_error_uses_fallback_with_detail() {
        let service = service(Err(ServiceError::Network("connection reset".to_string())));
        let reply = service.respond(&[], "Can I book an appointment?").await.unwrap();

        assert_eq!(reply.source, ReplySource::Fallback);
        assert!(reply.spoken.contains("schedule an appointment"));
        assert!(reply.text.contains("Network issue - using offline mode. Error: connection reset"));
        assert_eq!(reply.knowledge_ids, vec![14]);
    }

    #[tokio::test]
    async fn test_other_error_uses_offline_notice() {
        let service = service(Err(ServiceError::RateLimited));
        let reply = service.respond(&[], "thank you").await.unwrap();

        assert_eq!(reply.source, ReplySource::Fallback);
        assert!(reply.text.ends_with("(Using offline mode)"));
        assert!(!reply.spoken.contains("offline"));
    }

    #[tokio::test]
    async fn test_respond_in_records_turns() {
        let service = service(Ok("Hello!".to_string()));
        let mut conversation = Conversation::new();

        service.respond_in(&mut conversation, "hi").await.unwrap();
        service.respond_in(&mut conversation, "thanks").await.unwrap();

        assert_eq!(conversation.len(), 4);
        assert_eq!(conversation.messages()[1], Message::assistant("Hello!"));
        assert_eq!(service.generator.calls.lock().unwrap()[1].1, 2);
    }

    #[test]
    fn test_system_prompt_without_matches() {
        let service = service(Ok(String::new()));
        assert_eq!(service.system_prompt("zzz"), "Persona.\n\nBe brief.");
    }
}
