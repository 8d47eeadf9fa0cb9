use std::sync::Arc;

use agent_relay::agent::{AgentRegistry, LlmQueryAgent, QueryAgent, TaskRunner};
use agent_relay::calendar::{BookingService, CalendarStore};
use agent_relay::classify::ResponseClassifier;
use agent_relay::config::AgentConfig;
use agent_relay::llm::{LlmBackend, LlmConfig, create_provider};
use agent_relay::relay::{EventRelay, EventSink, StreamSink, WebhookSink};
use agent_relay::task::TaskManager;
use agent_relay::tools::builtin::{BookMeetingTool, CancelMeetingTool};
use agent_relay::tools::{Tool, ToolContext, ToolRegistry};
use anyhow::Context;
use tokio::io::AsyncBufReadExt;
use tokio_stream::StreamExt;

/// Capability tag of the single agent this binary serves.
const SCHEDULING_CAPABILITY: &str = "scheduling";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing, optionally into a daily-rolling log file
    let env_filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };
    let _log_guard = match std::env::var("AGENT_RELAY_LOG_DIR") {
        Ok(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "agent-relay.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        Err(_) => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_target(false)
                .init();
            None
        }
    };

    // Read API key from environment; Anthropic preferred, OpenAI fallback
    let (backend, api_key) = if let Ok(key) = std::env::var("ANTHROPIC_API_KEY") {
        (LlmBackend::Anthropic, key)
    } else if let Ok(key) = std::env::var("OPENAI_API_KEY") {
        (LlmBackend::OpenAi, key)
    } else {
        eprintln!("Error: neither ANTHROPIC_API_KEY nor OPENAI_API_KEY is set");
        eprintln!("  export ANTHROPIC_API_KEY=sk-ant-...");
        std::process::exit(1);
    };

    let model = std::env::var("AGENT_RELAY_MODEL")
        .unwrap_or_else(|_| "claude-sonnet-4-20250514".to_string());

    let config = AgentConfig {
        calendar_path: std::env::var("AGENT_RELAY_CALENDAR")
            .map(Into::into)
            .unwrap_or_else(|_| AgentConfig::default().calendar_path),
        webhook_url: std::env::var("AGENT_RELAY_WEBHOOK").ok(),
        ..AgentConfig::default()
    };

    eprintln!("🤖 Agent Relay v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", model);
    eprintln!("   Calendar: {}", config.calendar_path.display());
    eprintln!("   Type a query and press Enter. /quit to exit.\n");

    // ── LLM provider ────────────────────────────────────────────────────
    let llm_config = LlmConfig {
        backend,
        api_key: secrecy::SecretString::from(api_key),
        model,
    };
    let llm = create_provider(&llm_config)?;

    // ── Calendar + booking ──────────────────────────────────────────────
    let store = Arc::new(CalendarStore::new(config.calendar_path.clone()));
    let booking = Arc::new(BookingService::new(store));

    // ── Tools ───────────────────────────────────────────────────────────
    let tools = Arc::new(ToolRegistry::new());
    tools
        .register(Arc::new(BookMeetingTool::new(Arc::clone(&booking))))
        .await;
    tools
        .register(Arc::new(CancelMeetingTool::new(Arc::clone(&booking))))
        .await;
    eprintln!("   Tools: {} registered", tools.count());

    // ── Agent registry ──────────────────────────────────────────────────
    let agents = AgentRegistry::new();
    {
        let llm = Arc::clone(&llm);
        let system_prompt = config.system_prompt.clone();
        let tool_defs = tools.tool_definitions().await;
        agents
            .register(
                SCHEDULING_CAPABILITY,
                Box::new(move || {
                    Arc::new(
                        LlmQueryAgent::new(
                            SCHEDULING_CAPABILITY,
                            Arc::clone(&llm),
                            system_prompt.clone(),
                        )
                        .with_tools(tool_defs.clone()),
                    ) as Arc<dyn QueryAgent>
                }),
            )
            .await;
    }
    let agent = agents
        .create(SCHEDULING_CAPABILITY)
        .await
        .context("scheduling agent not registered")?;

    // ── Event relay ─────────────────────────────────────────────────────
    let (stream_sink, mut events) = StreamSink::channel(256);
    let mut sinks: Vec<Arc<dyn EventSink>> = vec![Arc::new(stream_sink)];
    if let Some(ref url) = config.webhook_url {
        eprintln!("   Webhook: {}", url);
        sinks.push(Arc::new(WebhookSink::new(url.clone())));
    }
    let relay = Arc::new(EventRelay::with_sinks(sinks));

    // Print relayed events as they arrive
    let printer = tokio::spawn(async move {
        while let Some(update) = events.next().await {
            let label = if update.is_task_complete {
                "result"
            } else if update.require_user_input {
                "input needed"
            } else {
                "status"
            };
            match update.content.as_str() {
                Some(text) => println!("[{label}] {text}"),
                None => println!("[{label}] {}", update.content),
            }
        }
    });

    let runner = TaskRunner::new(
        Arc::new(TaskManager::new()),
        Arc::new(ResponseClassifier::new()),
        relay,
    );

    // ── Turn loop ───────────────────────────────────────────────────────
    tracing::info!("Agent {} ready and listening", config.name);
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if query == "/quit" || query == "/exit" {
            break;
        }
        if query == "/tools" {
            println!("tools: {}", tools.list().await.join(", "));
            continue;
        }
        if let Some(args) = query.strip_prefix("/book ") {
            invoke_booking_tool(&tools, "book_meeting", args).await;
            continue;
        }
        if let Some(args) = query.strip_prefix("/cancel ") {
            invoke_booking_tool(&tools, "cancel_meeting", args).await;
            continue;
        }

        if let Err(e) = runner
            .run_turn(agent.as_ref(), query, Some("cli"), None)
            .await
        {
            eprintln!("Error: {}", agent_relay::Error::from(e));
        }
    }

    tracing::info!("Agent shutting down");
    printer.abort();
    Ok(())
}

/// Invoke a booking tool directly, outside the task lifecycle.
async fn invoke_booking_tool(tools: &ToolRegistry, name: &str, args: &str) {
    let mut parts = args.split_whitespace();
    let params = if name == "book_meeting" {
        let (Some(requester), Some(start), Some(duration)) =
            (parts.next(), parts.next(), parts.next())
        else {
            eprintln!("usage: /book <requester> <start> <minutes> [message...]");
            return;
        };
        let Ok(duration) = duration.parse::<i64>() else {
            eprintln!("usage: /book <requester> <start> <minutes> [message...]");
            return;
        };
        let message = parts.collect::<Vec<_>>().join(" ");
        serde_json::json!({
            "requester": requester,
            "start": start,
            "duration": duration,
            "message": message,
        })
    } else {
        let (Some(requester), Some(start)) = (parts.next(), parts.next()) else {
            eprintln!("usage: /cancel <requester> <start>");
            return;
        };
        serde_json::json!({"requester": requester, "start": start})
    };

    let Some(tool) = tools.get(name).await else {
        eprintln!("unknown tool: {name}");
        return;
    };
    match tool.execute(params, &ToolContext::default()).await {
        Ok(output) => match output.result.as_str() {
            Some(token) => println!("{token}"),
            None => println!("{}", output.result),
        },
        Err(e) => eprintln!("Error: {e}"),
    }
}
