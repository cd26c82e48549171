//! Console rendering for the chat relay.

use relay_core::RelayEvent;
use relay_types::Usage;
use std::io::{self, Write};

pub const PROMPT: &str = "Query: ";

/// Write one relay event as human-readable text.
pub fn render_event(out: &mut impl Write, event: RelayEvent) -> io::Result<()> {
    match event {
        RelayEvent::AwaitingInput => {
            write!(out, "\n{PROMPT}")?;
        }
        RelayEvent::Text(text) => {
            writeln!(out, "{text}")?;
        }
        RelayEvent::ToolCall { name, arguments } => {
            writeln!(out, "Calling tool {name} with {arguments}")?;
        }
        RelayEvent::ToolResult { name, is_error } => {
            if is_error {
                writeln!(out, "  [tool {name} reported an error]")?;
            }
        }
        RelayEvent::TurnFailed(message) => {
            writeln!(out, "\nError: {message}")?;
        }
        RelayEvent::TurnComplete => {
            writeln!(out)?;
        }
    }
    out.flush()
}

pub fn connected_banner(server: &str, tools: &[&str]) -> String {
    format!("Connected to {server}, available tools: {tools:?}")
}

pub fn started_banner(model: &str, provider: &str) -> String {
    format!("Relay started ({model} via {provider}).")
}

/// Steps that usually fix a failed startup.
pub fn checklist(server_label: &str) -> Vec<String> {
    vec![
        "1. All dependencies are installed (e.g. `uv sync`)".to_string(),
        format!("2. {server_label} exists and is runnable"),
        "3. OPENAI_API_KEY (or OPENAI_KEY) is set".to_string(),
    ]
}

pub fn print_startup_failure(error: &anyhow::Error, server_label: &str) {
    eprintln!("Failed to start relay: {error:#}");
    eprintln!("Please make sure that:");
    for line in checklist(server_label) {
        eprintln!("  {line}");
    }
}

pub fn print_usage(usage: &Usage) {
    eprintln!(
        "Tokens: prompt {}, completion {}, total {}",
        usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_types::ToolArguments;

    fn render(event: RelayEvent) -> String {
        let mut buf = Vec::new();
        render_event(&mut buf, event).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn awaiting_input_prints_prompt_without_newline() {
        assert_eq!(render(RelayEvent::AwaitingInput), "\nQuery: ");
    }

    #[test]
    fn tool_call_echoes_name_and_arguments() {
        let arguments = ToolArguments::parse_lenient(r#"{"topic":"physics"}"#);
        let text = render(RelayEvent::ToolCall {
            name: "search_papers".into(),
            arguments,
        });
        assert_eq!(text, "Calling tool search_papers with {\"topic\":\"physics\"}\n");
    }

    #[test]
    fn successful_tool_result_is_silent() {
        let text = render(RelayEvent::ToolResult {
            name: "search_papers".into(),
            is_error: false,
        });
        assert!(text.is_empty());
    }

    #[test]
    fn turn_failure_is_shown() {
        let text = render(RelayEvent::TurnFailed("API error: Request timeout".into()));
        assert!(text.contains("Error: API error: Request timeout"));
    }

    #[test]
    fn banners_name_server_and_provider() {
        assert_eq!(
            connected_banner("research_server.py", &["search_papers", "extract_info"]),
            "Connected to research_server.py, available tools: [\"search_papers\", \"extract_info\"]"
        );
        assert_eq!(
            started_banner("gpt-4o-mini", "openai"),
            "Relay started (gpt-4o-mini via openai)."
        );
    }

    #[test]
    fn checklist_names_the_server() {
        let lines = checklist("research_server.py");
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("uv sync"));
        assert!(lines[1].contains("research_server.py"));
        assert!(lines[2].contains("OPENAI_API_KEY"));
    }
}
