use anyhow::Result;
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::models::ChatRequest;

/// Safely truncate a string to a maximum number of characters
pub fn safe_truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let trunc_chars = if max_chars >= 3 { max_chars - 3 } else { 0 };
        format!("{}...", s.chars().take(trunc_chars).collect::<String>())
    }
}

/// Log HTTP request details for debugging (console output)
pub fn log_request(url: &str, request: &ChatRequest, api_key: &str, verbose: bool) {
    if !verbose {
        return;
    }

    println!("\n{}", "═".repeat(60).bright_cyan());
    println!("{}", "🔍 HTTP REQUEST".bright_cyan().bold());
    println!("{}: {}", "URL".bright_yellow(), url);
    println!(
        "{}: Bearer {}***",
        "Authorization".bright_yellow(),
        &api_key.chars().take(8).collect::<String>()
    );
    match serde_json::to_string_pretty(&request) {
        Ok(json) => println!("{}", safe_truncate(&json, 4000)),
        Err(e) => println!("{}", format!("Error serializing request: {}", e).red()),
    }
    println!("{}\n", "═".repeat(60).bright_cyan());
}

/// Log HTTP response details for debugging (console output)
pub fn log_response(status: u16, body: &str, verbose: bool) {
    if !verbose {
        return;
    }

    println!("\n{}", "═".repeat(60).bright_cyan());
    println!("{} {}", "📥 HTTP RESPONSE".bright_cyan().bold(), status);
    println!("{}", safe_truncate(body, 4000));
    println!("{}\n", "═".repeat(60).bright_cyan());
}

#[derive(Serialize)]
struct ToolCallInfo {
    id: String,
    name: String,
    arguments: String,
}

#[derive(Serialize)]
struct LogEntry {
    timestamp: String, // ISO-8601 UTC
    role: String,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ToolCallInfo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

/// Appends one JSONL entry per conversation event to a per-run log file.
pub struct ConversationLogger {
    file_path: PathBuf,
    file: Option<tokio::fs::File>,
}

impl ConversationLogger {
    /// Create a new logger; generates the file name based on the current UTC time.
    pub async fn new(workspace: &Path) -> Result<Self> {
        let logs_dir = workspace.join("logs");
        fs::create_dir_all(&logs_dir).await?;

        let now: DateTime<Utc> = Utc::now();
        let filename = format!("toolchat-{}.jsonl", now.format("%Y-%m-%d-%H%M%S"));
        let file_path = logs_dir.join(filename);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file_path)
            .await?;
        Ok(Self {
            file_path,
            file: Some(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    async fn write_entry(&mut self, entry: LogEntry) {
        if let Some(file) = &mut self.file {
            if let Ok(json) = serde_json::to_string(&entry) {
                if let Err(e) = file.write_all(json.as_bytes()).await {
                    eprintln!("[Logging error] {}", e);
                } else if let Err(e) = file.write_all(b"\n").await {
                    eprintln!("[Logging error] {}", e);
                }
            }
        }
    }

    /// Append a single log entry.
    pub async fn log(&mut self, role: &str, content: &str) {
        self.write_entry(LogEntry {
            timestamp: Utc::now().to_rfc3339(),
            role: role.to_string(),
            content: content.to_string(),
            tool_calls: None,
            tool_call_id: None,
            name: None,
        })
        .await;
    }

    /// Log an assistant message with tool calls
    pub async fn log_with_tool_calls(
        &mut self,
        content: &str,
        tool_calls: Vec<(String, String, String)>, // (id, name, arguments)
    ) {
        let tool_call_info: Vec<ToolCallInfo> = tool_calls
            .into_iter()
            .map(|(id, name, arguments)| ToolCallInfo {
                id,
                name,
                arguments,
            })
            .collect();

        self.write_entry(LogEntry {
            timestamp: Utc::now().to_rfc3339(),
            role: "assistant".to_string(),
            content: content.to_string(),
            tool_calls: Some(tool_call_info),
            tool_call_id: None,
            name: None,
        })
        .await;
    }

    /// Log a tool result
    pub async fn log_tool_result(&mut self, content: &str, tool_call_id: &str, tool_name: &str) {
        self.write_entry(LogEntry {
            timestamp: Utc::now().to_rfc3339(),
            role: "tool".to_string(),
            content: content.to_string(),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.to_string()),
            name: Some(tool_name.to_string()),
        })
        .await;
    }

    /// Close the logger (explicit drop). Called on graceful shutdown.
    pub async fn shutdown(&mut self) {
        if let Some(file) = self.file.take() {
            let _ = file.sync_all().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_truncate_leaves_short_strings_alone() {
        assert_eq!(safe_truncate("hello", 10), "hello");
        assert_eq!(safe_truncate("hello world", 8), "hello...");
    }

    #[tokio::test]
    async fn logger_writes_jsonl_entries() {
        let dir = tempfile::tempdir().unwrap();
        let mut logger = ConversationLogger::new(dir.path()).await.unwrap();
        logger.log("user", "what is the weather").await;
        logger
            .log_with_tool_calls(
                "",
                vec![(
                    "call_1".to_string(),
                    "web_search".to_string(),
                    "{\"query\": \"weather\"}".to_string(),
                )],
            )
            .await;
        logger.log_tool_result("[]", "call_1", "web_search").await;
        let path = logger.path().to_path_buf();
        logger.shutdown().await;

        let contents = std::fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);

        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["role"], "assistant");
        assert_eq!(second["tool_calls"][0]["name"], "web_search");

        let third: serde_json::Value = serde_json::from_str(lines[2]).unwrap();
        assert_eq!(third["tool_call_id"], "call_1");
    }
}
