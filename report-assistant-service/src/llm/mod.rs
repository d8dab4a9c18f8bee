pub mod openrouter;

use async_trait::async_trait;
use dialog_flow::ChatMessage;
use futures::stream::BoxStream;

pub use openrouter::OpenRouterChat;

/// Ordered stream of response text fragments. Fragments concatenate, in
/// arrival order, to the full response.
pub type ChatStream = BoxStream<'static, anyhow::Result<String>>;

/// One request against the hosted chat-completion API.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    /// System instruction, assembled per call; never part of the transcript
    pub system: Option<String>,
    /// Role-tagged dialog, ending with the message to answer
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f64>,
}

/// The hosted LLM behind an opaque boundary: a list of role-tagged
/// messages in, generated text out, either complete or as an incremental
/// stream. No retry or backpressure lives at this seam; errors propagate
/// to the caller untouched.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(&self, request: ChatRequest) -> anyhow::Result<String>;

    async fn stream(&self, request: ChatRequest) -> anyhow::Result<ChatStream>;
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use futures::StreamExt;
    use std::sync::Mutex;

    /// Scripted stand-in for the hosted LLM. Pops canned replies in order;
    /// repeats the last one when the script runs out. Records every
    /// request for assertions.
    pub struct FakeChatClient {
        replies: Mutex<Vec<String>>,
        pub requests: Mutex<Vec<ChatRequest>>,
    }

    impl FakeChatClient {
        pub fn new(replies: &[&str]) -> Self {
            Self {
                replies: Mutex::new(replies.iter().rev().map(|r| r.to_string()).collect()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn next_reply(&self) -> String {
            let mut replies = self.replies.lock().unwrap();
            if replies.len() > 1 {
                replies.pop().unwrap()
            } else {
                replies.last().cloned().unwrap_or_default()
            }
        }
    }

    #[async_trait]
    impl ChatClient for FakeChatClient {
        async fn complete(&self, request: ChatRequest) -> anyhow::Result<String> {
            self.requests.lock().unwrap().push(request);
            Ok(self.next_reply())
        }

        async fn stream(&self, request: ChatRequest) -> anyhow::Result<ChatStream> {
            self.requests.lock().unwrap().push(request);
            let reply = self.next_reply();
            // Split the canned reply into a few chunks so consumers have to
            // reassemble in order.
            let chunks: Vec<anyhow::Result<String>> = reply
                .chars()
                .collect::<Vec<_>>()
                .chunks(3)
                .map(|c| Ok(c.iter().collect::<String>()))
                .collect();
            Ok(futures::stream::iter(chunks).boxed())
        }
    }

    /// Client whose every call fails, for exercising the propagate-errors
    /// contract.
    pub struct FailingChatClient;

    #[async_trait]
    impl ChatClient for FailingChatClient {
        async fn complete(&self, _request: ChatRequest) -> anyhow::Result<String> {
            anyhow::bail!("completion backend unavailable")
        }

        async fn stream(&self, _request: ChatRequest) -> anyhow::Result<ChatStream> {
            anyhow::bail!("completion backend unavailable")
        }
    }
}
