//! Maria CLI — entry point.
//!
//! # Commands
//!
//! - `maria chat [-m MESSAGE]` — talk to Maria (single-shot or REPL)
//! - `maria init` — initialize config + starter policy document
//! - `maria status` — show configuration status

mod helpers;
mod init;
mod repl;
mod status;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::info;

use maria_agent::tools::calendar::CalendarEventTool;
use maria_agent::tools::email::{PolicyEmailTool, SlackInviteTool, WelcomeEmailTool};
use maria_agent::tools::hr::{
    AddEmployeeTool, CancelTimeOffRequestTool, EstimateTimeOffBalanceTool, MakeTimeOffRequestTool,
    ModifyEmployeeTool, ViewTimeOffRequestsTool,
};
use maria_agent::tools::policy::PolicyQaTool;
use maria_agent::{ActionParser, PromptAssembler, ToolRegistry, TurnLoop, TERMINAL_TOOL};
use maria_core::config::{load_config, Config};
use maria_core::events::{self, EventReceiver};
use maria_core::utils::expand_tilde;
use maria_integrations::{BambooClient, CalendarClient, Mailer, PolicyIndex};
use maria_providers::{EmbeddingsClient, LlmRequestConfig, OpenAiChatModel};

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// Maria — your personal HR onboarding assistant
#[derive(Parser)]
#[command(name = "maria", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with Maria (single-shot or interactive REPL)
    Chat {
        /// Single message (non-interactive). Omit for REPL mode.
        #[arg(short, long)]
        message: Option<String>,

        /// Enable debug logging and show the tool trace after each turn
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Initialize configuration and the starter policy document
    Init,

    /// Show configuration status
    Status,
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Chat { message, logs } => {
            init_logging(logs);
            run_chat(message, logs).await
        }
        Commands::Init => init::run(),
        Commands::Status => status::run(),
    }
}

// ─────────────────────────────────────────────
// Chat command
// ─────────────────────────────────────────────

/// Everything one chat session needs.
pub struct Assistant {
    pub turn_loop: TurnLoop,
    pub events: EventReceiver,
    pub greeting: String,
}

async fn run_chat(message: Option<String>, show_logs: bool) -> Result<()> {
    let config = load_config(None);
    let assistant = build_assistant(&config).await?;

    match message {
        Some(text) => {
            // Single-shot mode
            info!("processing single message");
            let result = assistant
                .turn_loop
                .run_turn(&text, &[], &CancellationToken::new())
                .await
                .context("turn failed")?;
            if show_logs {
                helpers::print_steps(&result.steps);
            }
            helpers::print_response(&result.output);
        }
        None => {
            repl::run(assistant, show_logs).await?;
        }
    }

    Ok(())
}

/// Build an [`Assistant`] from the loaded configuration.
///
/// Wires the provider, the integrations, the full tool set, and the event
/// channel into a turn loop.
pub async fn build_assistant(config: &Config) -> Result<Assistant> {
    let assistant_cfg = &config.assistant;

    // Model boundary
    let request_config = LlmRequestConfig {
        max_tokens: assistant_cfg.max_tokens,
        temperature: assistant_cfg.temperature,
    };
    let model = Arc::new(
        OpenAiChatModel::new(
            config.llm.api_base.clone(),
            config.llm.api_key.clone(),
            assistant_cfg.model.clone(),
            request_config,
        )
        .context("failed to create chat model client")?,
    );

    // Integrations
    let bamboo = Arc::new(BambooClient::new(&config.bamboo).context("BambooHR client setup failed")?);
    let mailer = Arc::new(
        Mailer::new(&config.mail)
            .context("mail setup failed (set mail.smtpHost in the config)")?,
    );
    let calendar =
        Arc::new(CalendarClient::new(&config.calendar).context("calendar client setup failed")?);

    // Policy index (embeds the policy document on first run, cached after)
    let policies_path = expand_tilde(&config.policies.path);
    let embeddings = EmbeddingsClient::new(
        config.llm.api_base.clone(),
        config.llm.api_key.clone(),
        config.llm.embedding_model.clone(),
    )
    .context("failed to create embeddings client")?;
    let policy_index = Arc::new(
        PolicyIndex::build(&policies_path, embeddings, true)
            .await
            .context("failed to build the policy index (run `maria init` first)")?,
    );

    // Event channel: side-effecting tools → onboarding checklist
    let (events_tx, events_rx) = events::channel();

    // Tool registry, in prompt order
    let mut tools = ToolRegistry::new();
    tools.register(Arc::new(WelcomeEmailTool::new(
        mailer.clone(),
        Some(events_tx.clone()),
    )));
    tools.register(Arc::new(PolicyEmailTool::new(
        mailer.clone(),
        policies_path.clone(),
        Some(events_tx.clone()),
    )));
    tools.register(Arc::new(SlackInviteTool::new(
        mailer,
        config.slack.invite_url.clone(),
        Some(events_tx.clone()),
    )));
    tools.register(Arc::new(CalendarEventTool::new(
        calendar,
        Some(events_tx.clone()),
    )));
    tools.register(Arc::new(PolicyQaTool::new(policy_index, model.clone())));
    tools.register(Arc::new(AddEmployeeTool::new(
        bamboo.clone(),
        Some(events_tx),
    )));
    tools.register(Arc::new(ModifyEmployeeTool::new(bamboo.clone())));
    tools.register(Arc::new(ViewTimeOffRequestsTool::new(bamboo.clone())));
    tools.register(Arc::new(MakeTimeOffRequestTool::new(bamboo.clone())));
    tools.register(Arc::new(CancelTimeOffRequestTool::new(bamboo.clone())));
    tools.register(Arc::new(EstimateTimeOffBalanceTool::new(bamboo)));

    let parser = ActionParser::new(TERMINAL_TOOL);
    let prompt = PromptAssembler::new(assistant_cfg.name.clone(), &tools);
    let turn_loop = TurnLoop::new(
        model,
        tools,
        parser,
        prompt,
        Some(assistant_cfg.max_iterations),
    );

    Ok(Assistant {
        turn_loop,
        events: events_rx,
        greeting: repl::greeting(&assistant_cfg.name),
    })
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("maria=debug,info")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
