//! rig-backed implementation of the chat boundary, talking to OpenRouter.

use anyhow::anyhow;
use async_trait::async_trait;
use dialog_flow::{ChatMessage, ChatRole};
use futures::StreamExt;
use rig::agent::{Agent, MultiTurnStreamItem};
use rig::client::CompletionClient;
use rig::completion::{Chat, Message};
use rig::providers::openrouter;
use rig::streaming::StreamingChat;

use super::{ChatClient, ChatRequest, ChatStream};

pub struct OpenRouterChat {
    client: openrouter::Client,
    model: String,
}

impl OpenRouterChat {
    pub fn new(api_key: &str, model: impl Into<String>) -> Self {
        Self {
            client: openrouter::Client::new(api_key),
            model: model.into(),
        }
    }

    fn agent(&self, request: &ChatRequest) -> Agent<openrouter::CompletionModel> {
        let mut builder = self
            .client
            .agent(&self.model)
            .preamble(request.system.as_deref().unwrap_or_default());
        if let Some(temperature) = request.temperature {
            builder = builder.temperature(temperature);
        }
        builder.build()
    }
}

#[async_trait]
impl ChatClient for OpenRouterChat {
    async fn complete(&self, request: ChatRequest) -> anyhow::Result<String> {
        let agent = self.agent(&request);
        let (prompt, history) = split_prompt(&request.messages)?;
        let response = agent.chat(prompt, history).await?;
        Ok(response)
    }

    async fn stream(&self, request: ChatRequest) -> anyhow::Result<ChatStream> {
        let agent = self.agent(&request);
        let (prompt, history) = split_prompt(&request.messages)?;
        let upstream = agent.stream_chat(prompt, history).await;
        let chunks = upstream.filter_map(|item| async move {
            match item {
                Ok(MultiTurnStreamItem::Text(text)) => Some(Ok(text.text)),
                Ok(_) => None,
                Err(e) => Some(Err(anyhow::Error::from(e))),
            }
        });
        Ok(chunks.boxed())
    }
}

/// Split role-tagged messages into rig's (prompt, history) shape: the last
/// user message is the prompt, everything before it is history.
fn split_prompt(messages: &[ChatMessage]) -> anyhow::Result<(String, Vec<Message>)> {
    let (last, rest) = messages
        .split_last()
        .ok_or_else(|| anyhow!("chat request has no messages"))?;
    if last.role != ChatRole::User {
        return Err(anyhow!("chat request must end with a user message"));
    }
    Ok((last.content.clone(), rest.iter().map(to_rig_message).collect()))
}

fn to_rig_message(message: &ChatMessage) -> Message {
    match message.role {
        ChatRole::User => Message::user(message.content.clone()),
        ChatRole::Assistant => Message::assistant(message.content.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_prompt_takes_last_user_message() {
        let messages = vec![
            ChatMessage::assistant("welcome"),
            ChatMessage::user("hello"),
            ChatMessage::assistant("first question"),
            ChatMessage::user("my answer"),
        ];
        let (prompt, history) = split_prompt(&messages).unwrap();
        assert_eq!(prompt, "my answer");
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn split_prompt_rejects_empty_and_assistant_tails() {
        assert!(split_prompt(&[]).is_err());
        assert!(split_prompt(&[ChatMessage::assistant("hi")]).is_err());
    }
}
