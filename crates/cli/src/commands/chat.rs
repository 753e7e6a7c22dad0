use std::io::{self, BufRead, Write};

use crate::commands::CommandResult;
use ordercopilot_agent::AgentRuntime;
use ordercopilot_core::config::{AppConfig, LoadOptions};
use ordercopilot_core::ConversationState;

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "chat",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };
    init_logging(&config);

    let agent = match AgentRuntime::from_config(&config) {
        Ok(agent) => agent,
        Err(error) => {
            return CommandResult::failure("chat", "runtime_init", error.to_string(), 3);
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "chat",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let stdin = io::stdin();
    let stdout = io::stdout();
    match runtime.block_on(run_session(&agent, stdin.lock(), stdout.lock())) {
        Ok(_) => CommandResult { exit_code: 0, output: String::new() },
        Err(error) => CommandResult::failure("chat", "io", error.to_string(), 4),
    }
}

/// Reads one message per line until `exit`, `quit` or end of input. The
/// remembered order carries from one turn to the next.
pub async fn run_session<R, W>(
    agent: &AgentRuntime,
    mut input: R,
    mut output: W,
) -> io::Result<ConversationState>
where
    R: BufRead,
    W: Write,
{
    let mut state = ConversationState::default();

    loop {
        write!(output, "\nYou: ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break;
        }

        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        if matches!(message.to_ascii_lowercase().as_str(), "exit" | "quit") {
            break;
        }

        state = agent.dispatch(state.next_turn(message)).await;
        writeln!(output, "\nAssistant: {}", state.output_or_empty().display_text())?;
    }

    Ok(state)
}

fn init_logging(config: &AppConfig) {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::WARN);
    let _ = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(io::stderr)
        .compact()
        .try_init();
}
