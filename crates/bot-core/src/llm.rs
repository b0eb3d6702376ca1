//! Reasoner access: OpenAI-compatible chat completions with tool calling
//! against a locally hosted server (llama.cpp style).

use std::future::Future;
use std::pin::Pin;

use anyhow::Context;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// One tool invocation as the server returned it, before validation.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RawToolCall {
    pub name: String,
    #[serde(default)]
    pub arguments: serde_json::Value,
}

/// The assistant reply: free text plus any tool calls it chose to emit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReasonerReply {
    pub content: String,
    pub tool_calls: Vec<RawToolCall>,
}

/// Config for an OpenAI-compatible `POST /v1/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct ReasonerModelConfig {
    /// Full endpoint URL, e.g. `http://127.0.0.1:8080/v1/chat/completions`.
    pub endpoint: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

/// Boundary the harness uses to ask the reasoner for the turn's order.
pub trait ReasonerClient: Send + Sync {
    fn decide<'a>(
        &'a self,
        system: &'a str,
        user: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<ReasonerReply>> + Send + 'a>>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    tools: &'a [serde_json::Value],
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<WireToolCall>,
}

#[derive(Deserialize)]
struct WireToolCall {
    function: WireFunction,
}

#[derive(Deserialize)]
struct WireFunction {
    name: String,
    /// JSON-encoded argument object, per the OpenAI wire format.
    arguments: String,
}

fn decode_reply(response: ChatResponse) -> anyhow::Result<ReasonerReply> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("reasoner returned no choices"))?;

    let mut tool_calls = Vec::new();
    for call in choice.message.tool_calls {
        let arguments = if call.function.arguments.trim().is_empty() {
            serde_json::Value::Object(serde_json::Map::new())
        } else {
            serde_json::from_str(&call.function.arguments).with_context(|| {
                format!(
                    "tool call {} carried unparseable arguments",
                    call.function.name
                )
            })?
        };
        tool_calls.push(RawToolCall {
            name: call.function.name,
            arguments,
        });
    }

    Ok(ReasonerReply {
        content: choice.message.content.unwrap_or_default(),
        tool_calls,
    })
}

/// Sends a single system+user exchange with tool definitions and returns the
/// decoded assistant reply.
pub async fn query_chat_completions(
    system: &str,
    user: &str,
    tools: &[serde_json::Value],
    cfg: &ReasonerModelConfig,
) -> anyhow::Result<ReasonerReply> {
    let client = Client::new();
    let request = ChatRequest {
        model: &cfg.model,
        messages: vec![
            ChatMessage {
                role: "system",
                content: system,
            },
            ChatMessage {
                role: "user",
                content: user,
            },
        ],
        tools,
        max_tokens: cfg.max_tokens,
        temperature: cfg.temperature,
        top_p: cfg.top_p,
    };

    let response = client
        .post(&cfg.endpoint)
        .json(&request)
        .send()
        .await
        .context("reasoner request failed")?
        .error_for_status()
        .context("reasoner non-2xx response")?
        .json::<ChatResponse>()
        .await
        .context("reasoner response decode failed")?;

    decode_reply(response)
}
