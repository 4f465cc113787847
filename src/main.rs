//! parley CLI entry point

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use anyhow::Result;

use parley::agent::{prompts, request, Context, ConversationLoop, LlmClient, Message, OpenAiClient, Task, TaskConfig, Termination};
use parley::adapters::{CliChannel, StdConsole};
use parley::config::Config;
use parley::tools::{sentiment, CalculatorTool, DelegateTool, DoneTool, ToolRunner};
use parley::ui;

#[derive(Parser)]
#[command(name = "parley")]
#[command(about = "Tool-augmented conversations with chat-completion models")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat with calculator and file tools
    Chat {
        /// Override the configured round limit
        #[arg(short, long)]
        max_rounds: Option<usize>,
    },

    /// Interactive assistant that delegates math to a calculator agent
    Assist {
        #[arg(short, long)]
        max_rounds: Option<usize>,
    },

    /// File assistant working inside the configured workspace
    Files {
        /// Request to run once; omit for an interactive session
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Sentiment analysis through sub-agent tasks
    Sentiment {
        /// Text to analyze; with --batch, one paragraph per argument
        text: Vec<String>,

        /// Label each paragraph and print a combined summary
        #[arg(short, long)]
        batch: bool,
    },

    /// Send a single prompt and print the answer
    Ask {
        #[arg(short, long)]
        message: String,
    },

    /// Print the example chat-completions request bodies
    Requests,

    /// Write the default configuration file
    Init,

    /// Show configuration status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they never mix with the conversation
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // First Ctrl+C warns, a second one within 3 seconds exits
    let exit_flag = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
    let r = exit_flag.clone();

    ctrlc::set_handler(move || {
        if r.load(std::sync::atomic::Ordering::SeqCst) {
            println!("\nGoodbye!");
            std::process::exit(130);
        } else {
            println!("\nPress Ctrl+C again to exit");
            r.store(true, std::sync::atomic::Ordering::SeqCst);

            let r2 = r.clone();
            std::thread::spawn(move || {
                std::thread::sleep(std::time::Duration::from_secs(3));
                r2.store(false, std::sync::atomic::Ordering::SeqCst);
            });
        }
    }).ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Chat { max_rounds } => {
            let config = parley::config::load()?;
            let client = OpenAiClient::from_config(&config)?;
            let tools = ToolRunner::with_file_tools(&config.workspace).with(CalculatorTool::new());
            let context = Context::new(prompts::CHAT_ASSISTANT, tools);

            run_conversation(&config, client, context, max_rounds).await?;
        }

        Commands::Assist { max_rounds } => {
            let config = parley::config::load()?;
            let client = OpenAiClient::from_config(&config)?;

            let calculator = Task::new(
                "CalculatorAgent",
                client.clone(),
                Context::new(prompts::STATEFUL_CALCULATOR, ToolRunner::new()),
                TaskConfig {
                    max_iterations: config.max_iterations,
                    restart: false,
                    ..TaskConfig::default()
                },
            );
            let tools = ToolRunner::new().with(DelegateTool::new(
                "calculator",
                "Perform calculations and remember variables (e.g. 'x = 5', 'x + 1')",
                calculator,
            ));
            let context = Context::new(prompts::DELEGATING_ASSISTANT, tools);

            run_conversation(&config, client, context, max_rounds).await?;
        }

        Commands::Files { message } => {
            let config = parley::config::load()?;
            let client = OpenAiClient::from_config(&config)?;
            let tools = ToolRunner::with_file_tools(&config.workspace).with(DoneTool);
            let task_config = TaskConfig {
                max_iterations: config.max_iterations,
                restart: message.is_some(),
                nudge: Some(prompts::file_assistant_nudge()),
                ..TaskConfig::default()
            };
            let task = Task::new("FileAssistant", client, Context::new(prompts::file_assistant(), tools), task_config);
            let mut channel = CliChannel::new(task);

            if let Some(msg) = message {
                let response = channel.run_once(&msg).await?;
                println!("{}", response.content);
            } else {
                ui::print_header(&config.model, &config.api_base);
                ui::print_step(&format!("Workspace: {}", config.workspace.display()));
                let mut console = StdConsole::new();
                channel.run_interactive(&mut console).await?;
            }
        }

        Commands::Sentiment { text, batch } => {
            let config = parley::config::load()?;
            let client = OpenAiClient::from_config(&config)?;

            let response = if batch {
                let paragraphs = if text.is_empty() { sample_paragraphs() } else { text };
                let mut task = sentiment::batch_processor(client, paragraphs.len());
                task.run(&sentiment::number_paragraphs(&paragraphs)).await?
            } else {
                let text = if text.is_empty() {
                    "This product is amazing! I love it.".to_string()
                } else {
                    text.join(" ")
                };
                let mut task = sentiment::text_processor(client, config.max_iterations);
                task.run(&format!("Analyze this: {text}")).await?
            };
            println!("{}", response.content);
        }

        Commands::Ask { message } => {
            let config = parley::config::load()?;
            let client = OpenAiClient::from_config(&config)?;

            let response = client.chat(&[Message::user(message)], &[]).await?;
            tracing::debug!(
                "Usage: {} prompt + {} completion tokens",
                response.usage.prompt_tokens,
                response.usage.completion_tokens
            );
            println!("{}", response.text_or_empty());
        }

        Commands::Requests => {
            let config = parley::config::load()?;
            let model = config.model.as_str();

            let examples = [
                ("Simple request", request::simple_request(model)),
                ("Conversation with context", request::conversation_request(model)),
                ("Creative (high temperature)", request::temperature_request(model, true)),
                ("Factual (low temperature)", request::temperature_request(model, false)),
                ("Token-limited", request::token_limited_request(model)),
            ];
            for (title, body) in examples {
                ui::print_step(title);
                println!("{}\n", serde_json::to_string_pretty(&body.to_json())?);
            }
        }

        Commands::Init => {
            let path = parley::config::config_path();
            if path.exists() {
                ui::print_warning(&format!("Config already exists at {}", path.display()));
            } else {
                parley::config::save(&Config::default())?;
                ui::print_success(&format!("Wrote {}", path.display()));
            }
            println!("\nNext steps:");
            println!("  1. Set OPENAI_API_KEY (or \"api_key\" in the config file)");
            println!("  2. Chat: parley chat");
        }

        Commands::Status => {
            let config = parley::config::load()?;
            println!("parley status\n");
            println!("Config file: {}", parley::config::config_path().display());
            println!("Endpoint: {}", config.api_base);
            println!("Model: {}", config.model);
            println!("API key: {}", if config.api_key.is_empty() { "not set" } else { "✓" });
            println!("Temperature: {}", config.temperature);
            match config.max_tokens {
                Some(n) => println!("Max tokens: {}", n),
                None => println!("Max tokens: model default"),
            }
            println!("Max rounds: {}", config.max_rounds);
            println!("Workspace: {:?}", config.workspace);
        }
    }

    Ok(())
}

async fn run_conversation<C: LlmClient>(
    config: &Config,
    client: C,
    context: Context,
    max_rounds: Option<usize>,
) -> Result<()> {
    ui::print_header(&config.model, &config.api_base);

    let conversation = ConversationLoop::new(client, context, max_rounds.unwrap_or(config.max_rounds));
    let mut console = StdConsole::new();
    let outcome = conversation.run(&mut console).await?;

    if outcome.reason == Termination::InputClosed {
        println!();
    }
    ui::print_outcome(&outcome);
    Ok(())
}

fn sample_paragraphs() -> Vec<String> {
    [
        "The service was exceptional and the staff were very friendly.",
        "The product broke after one day. Very disappointed.",
        "The weather today is cloudy with a chance of rain.",
    ]
    .iter()
    .map(|p| p.to_string())
    .collect()
}
