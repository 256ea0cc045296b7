//! The orchestration loop: request, dispatch tool calls, repeat until the
//! model answers in plain text or a terminating tool fires.

use colored::Colorize;

use crate::api::ChatTransport;
use crate::chat::browse::remove_candidate;
use crate::chat::conversation::{Conversation, RunOutcome, RunOverrides};
use crate::core::recover::recover_arguments;
use crate::core::registry::ToolEntry;
use crate::core::tool::ToolArguments;
use crate::error::ChatError;
use crate::models::{ChatRequest, Message, ToolCall, ToolChoice};
use crate::tools::web::{fetch_page_text, FETCH_TOOL, SEARCH_TOOL};

impl Conversation {
    /// Drive the conversation until the model produces a final result.
    ///
    /// Each iteration issues one completion request (after the budget guard
    /// admits it), then either returns the model's plain answer or dispatches
    /// its tool calls and loops with the results appended. A tool flagged
    /// `ends_conversation` or `arguments_only` short-circuits the loop.
    pub async fn run(
        &mut self,
        transport: &dyn ChatTransport,
        overrides: RunOverrides,
    ) -> Result<RunOutcome, ChatError> {
        if let Some(ceiling) = overrides.call_ceiling {
            self.budget.set_ceiling(ceiling);
        }
        // consumed by the first request it can legally apply to
        let mut forced_tool = overrides.forced_tool.clone();

        loop {
            self.inject_priming().await;

            let request = self.build_request(&overrides, &mut forced_tool);

            self.budget.check()?;
            let response = transport.send(&request).await?;
            self.budget.record_call();

            let message = response
                .choices
                .into_iter()
                .next()
                .map(|choice| choice.message)
                .ok_or_else(|| ChatError::transport(None, "response carried no choices"))?;

            if !message.has_tool_calls() {
                if let Some(logger) = &mut self.logger {
                    logger.log("assistant", &message.content).await;
                }
                self.messages.push(message.clone());
                return Ok(RunOutcome::Answer(message));
            }

            let calls = message.tool_calls.clone().unwrap_or_default();
            let mut first_call = true;

            for call in calls {
                let content = if first_call {
                    message.content.clone()
                } else {
                    String::new()
                };
                first_call = false;

                if let Some(outcome) = self.dispatch_call(call, content).await? {
                    return Ok(outcome);
                }
            }
        }
    }

    /// Execute one tool call from the model. Returns `Some` when the call
    /// terminates the run, `None` when the loop should continue.
    async fn dispatch_call(
        &mut self,
        call: ToolCall,
        content: String,
    ) -> Result<Option<RunOutcome>, ChatError> {
        let name = call.function.name.clone();
        let entry: ToolEntry = self
            .registry
            .get(&name)
            .cloned()
            .ok_or_else(|| ChatError::UnknownTool(name.clone()))?;

        // unusable argument text degrades to an empty argument set
        let args = ToolArguments::new(recover_arguments(&call.function.arguments).unwrap_or_default());

        if self.config.verbose {
            println!(
                "{} {}({})",
                "🔧 Tool call:".bright_yellow(),
                name.cyan(),
                call.function.arguments
            );
        }

        if entry.spec.arguments_only {
            if let Some(logger) = &mut self.logger {
                logger
                    .log_with_tool_calls(
                        &content,
                        vec![(call.id.clone(), name.clone(), call.function.arguments.clone())],
                    )
                    .await;
            }
            self.messages.push(Message::assistant_call(content, call));
            self.messages.push(Message::system(format!(
                "Arguments captured from tool '{}'; conversation closed.",
                name
            )));
            return Ok(Some(RunOutcome::Arguments(args.into_map())));
        }

        if entry.spec.ends_conversation {
            if let Err(e) = entry.handler.call(&args).await {
                eprintln!("{} tool '{}' failed: {}", "⚠️".yellow(), name, e);
            }
            let assistant = Message::assistant_call(content, call.clone());
            if let Some(logger) = &mut self.logger {
                logger
                    .log_with_tool_calls(
                        &assistant.content,
                        vec![(call.id, name.clone(), call.function.arguments)],
                    )
                    .await;
            }
            self.messages.push(assistant.clone());
            self.messages.push(Message::system(format!(
                "Conversation ended by tool '{}'.",
                name
            )));
            return Ok(Some(RunOutcome::Answer(assistant)));
        }

        let result_text = match entry.handler.call(&args).await {
            Ok(output) => output.into_text(),
            Err(e) => format!("Error: {}", e),
        };

        // A fetch that yields nothing is handled transparently: the failed
        // candidate is removed from the search results the model saw, nothing
        // is appended, and the loop re-requests a completion.
        if self.browse.is_enabled() && name == FETCH_TOOL && result_text.trim().is_empty() {
            let url: String = args.get_optional("url").ok().flatten().unwrap_or_default();
            if self.config.verbose {
                println!(
                    "{} {} yielded no content; dropping it and retrying",
                    "♻️".yellow(),
                    url
                );
            }
            self.drop_failed_candidate(&url);
            return Ok(None);
        }

        if let Some(logger) = &mut self.logger {
            logger
                .log_with_tool_calls(
                    &content,
                    vec![(call.id.clone(), name.clone(), call.function.arguments.clone())],
                )
                .await;
            logger.log_tool_result(&result_text, &call.id, &name).await;
        }

        self.messages
            .push(Message::assistant_call(content, call.clone()));
        self.messages
            .push(Message::tool_result(result_text.clone(), call.id, name.clone()));

        if self.browse.is_enabled() {
            if name == SEARCH_TOOL {
                let hit_count = serde_json::from_str::<Vec<serde_json::Value>>(&result_text)
                    .map(|hits| hits.len())
                    .unwrap_or(0);
                self.browse.note_search_result(hit_count);
            } else if name == FETCH_TOOL {
                self.browse.note_fetch_succeeded();
            }
        }

        Ok(None)
    }

    /// Assemble the next completion request. The tool-choice directive is
    /// resolved in priority order: sequencer mandate, then a caller-forced
    /// tool (outside the mandate window), then auto.
    fn build_request(
        &mut self,
        overrides: &RunOverrides,
        forced_tool: &mut Option<String>,
    ) -> ChatRequest {
        let model = overrides
            .model
            .clone()
            .unwrap_or_else(|| self.config.model.clone());
        let temperature = overrides.temperature.or(self.config.temperature);
        let max_tokens = overrides.max_tokens.or(self.config.max_tokens);

        let (tools, tool_choice) = if self.registry.is_empty() {
            (Vec::new(), None)
        } else {
            let choice = if let Some(mandated) = self.browse.mandated_tool() {
                self.browse.note_mandate_issued();
                ToolChoice::Function(mandated.to_string())
            } else if forced_tool.is_some() && self.browse.blocks_forced_tool() {
                // dropped rather than deferred, to avoid a stale directive
                // firing long after the caller meant it
                *forced_tool = None;
                self.browse.note_free_directive();
                ToolChoice::Auto
            } else if let Some(forced) = forced_tool.take() {
                self.browse.note_free_directive();
                ToolChoice::Function(forced)
            } else {
                self.browse.note_free_directive();
                ToolChoice::Auto
            };
            (self.registry.definitions(), Some(choice))
        };

        ChatRequest {
            model,
            temperature,
            max_tokens,
            tool_choice,
            tools,
            messages: self.messages.clone(),
        }
    }

    /// One-shot knowledge priming: fetch the configured URL and inject its
    /// text as a system message. Never attempted twice, even after a failed
    /// fetch.
    async fn inject_priming(&mut self) {
        if self.primed {
            return;
        }
        let Some(url) = self.priming_url.clone() else {
            return;
        };
        self.primed = true;

        match fetch_page_text(&self.web, &url).await {
            Some(text) => {
                self.messages.push(Message::system(format!(
                    "Reference material from {}:\n\n{}",
                    url, text
                )));
            }
            None => {
                eprintln!(
                    "{} priming URL {} yielded no content, continuing without it",
                    "⚠️".yellow(),
                    url
                );
            }
        }
    }

    /// Rewrite the most recent search-result message without the candidate
    /// that failed to fetch. With no candidates left, tool choice relaxes.
    fn drop_failed_candidate(&mut self, url: &str) {
        let Some(pos) = self
            .messages
            .iter()
            .rposition(|m| m.role == "tool" && m.name.as_deref() == Some(SEARCH_TOOL))
        else {
            self.browse.note_search_result(0);
            return;
        };

        if let Some((rewritten, remaining)) = remove_candidate(&self.messages[pos].content, url) {
            self.messages[pos].content = rewritten;
            if remaining == 0 {
                self.browse.note_search_result(0);
            }
        }
    }
}
