//! OpenAI chat completions with function tools

use super::{ensure_success, PluginError, OPENAI_API_URL};
use crate::domain::agent::{ChatContext, ChatMessage, ChatRole, LanguageModel, LlmReply, ToolCall, ToolSpec};
use crate::domain::shared::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool<'a>>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: ChatRole,
    content: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct WireTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: &'a ToolSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    kind: String,
    function: WireFunction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}

impl<'a> From<&'a ChatMessage> for WireMessage<'a> {
    fn from(message: &'a ChatMessage) -> Self {
        Self {
            role: message.role,
            content: message.content.as_deref(),
            tool_calls: message
                .tool_calls
                .iter()
                .map(|call| WireToolCall {
                    id: call.id.clone(),
                    kind: function_type(),
                    function: WireFunction {
                        name: call.name.clone(),
                        arguments: call.arguments.clone(),
                    },
                })
                .collect(),
            tool_call_id: message.tool_call_id.as_deref(),
        }
    }
}

fn into_reply(response: CompletionResponse) -> std::result::Result<LlmReply, PluginError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| PluginError::Protocol("completion has no choices".to_string()))?;

    Ok(LlmReply {
        content: choice.message.content.filter(|text| !text.trim().is_empty()),
        tool_calls: choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| ToolCall {
                id: call.id,
                name: call.function.name,
                arguments: call.function.arguments,
            })
            .collect(),
    })
}

#[derive(Clone)]
pub struct OpenAiLlm {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiLlm {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: OPENAI_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub async fn complete(
        &self,
        context: &ChatContext,
        tools: &[ToolSpec],
    ) -> std::result::Result<LlmReply, PluginError> {
        let request = CompletionRequest {
            model: &self.model,
            messages: context.messages().iter().map(WireMessage::from).collect(),
            tools: tools
                .iter()
                .map(|spec| WireTool {
                    kind: "function",
                    function: spec,
                })
                .collect(),
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let body: CompletionResponse = ensure_success("OpenAI", response).await?.json().await?;
        into_reply(body)
    }
}

#[async_trait]
impl LanguageModel for OpenAiLlm {
    async fn chat(&self, context: &ChatContext, tools: &[ToolSpec]) -> Result<LlmReply> {
        Ok(self.complete(context, tools).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let mut context = ChatContext::new().append(ChatMessage::system("Be brief."));
        context.push(ChatMessage::assistant_tool_calls(vec![ToolCall {
            id: "call_1".to_string(),
            name: "end_call".to_string(),
            arguments: "{}".to_string(),
        }]));
        context.push(ChatMessage::tool_result("call_1", "The call has been ended."));
        let spec = ToolSpec::without_parameters("end_call", "Called when the user wants to end the call.");

        let request = CompletionRequest {
            model: "gpt-4o",
            messages: context.messages().iter().map(WireMessage::from).collect(),
            tools: vec![WireTool {
                kind: "function",
                function: &spec,
            }],
        };
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["tool_calls"][0]["type"], "function");
        assert_eq!(json["messages"][1]["tool_calls"][0]["function"]["name"], "end_call");
        assert_eq!(json["messages"][2]["tool_call_id"], "call_1");
        assert_eq!(json["tools"][0]["function"]["name"], "end_call");
        assert_eq!(json["tools"][0]["function"]["parameters"]["type"], "object");
    }

    #[test]
    fn test_tool_call_reply() {
        let response: CompletionResponse = serde_json::from_str(
            r#"{"choices":[{"index":0,"message":{"role":"assistant","content":null,
                "tool_calls":[{"id":"call_9","type":"function","function":{"name":"end_call","arguments":"{}"}}]},
                "finish_reason":"tool_calls"}]}"#,
        )
        .unwrap();

        let reply = into_reply(response).unwrap();
        assert_eq!(reply.content, None);
        assert_eq!(reply.tool_calls.len(), 1);
        assert_eq!(reply.tool_calls[0].name, "end_call");
    }

    #[test]
    fn test_text_reply_and_empty_choices() {
        let response: CompletionResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"Hello there"}}]}"#,
        )
        .unwrap();
        assert_eq!(into_reply(response).unwrap().content.as_deref(), Some("Hello there"));

        let empty: CompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(into_reply(empty), Err(PluginError::Protocol(_))));
    }
}
