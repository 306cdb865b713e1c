mod memory_cmds;
mod samples;

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rendez_agent::{Agent, AgentState};
use rendez_config::AppConfig;
use rendez_memory::{AgentSnapshot, UserProfile, seed_from_profile};
use rendez_runtime::{AgentRuntime, failure_log_entry};

#[derive(Debug, Parser)]
#[command(
    name = "rendez",
    version,
    about = "A personal dating agent that negotiates first dates on your behalf"
)]
struct Cli {
    /// Path to the config file.
    #[arg(long, default_value = ".rendez/config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fill in the questionnaire and seed your agent's first memories.
    Onboard,
    /// Send one learning message to your agent.
    Chat {
        /// What you want to tell your agent.
        message: String,
    },
    /// Run a negotiation session against one of the sample matches.
    Negotiate {
        /// Which match to negotiate with.
        #[arg(default_value = "aria")]
        name: String,
    },
    /// Inspect and curate what your agent remembers.
    Memory {
        #[command(subcommand)]
        command: MemoryCommands,
    },
}

#[derive(Debug, Subcommand)]
pub enum MemoryCommands {
    /// List remembered facts, strongest first.
    List,
    /// Delete a fact by id (or unambiguous id prefix).
    Forget { id: String },
    /// Set a fact's weight (clamped to 0..=1).
    Weigh { id: String, weight: f32 },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load_from(&cli.config)
        .with_context(|| format!("loading config {}", cli.config.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.telemetry.log_level.clone())),
        )
        .init();

    match cli.command {
        Commands::Onboard => onboard(&cli.config, config),
        Commands::Chat { message } => chat(config, &message).await,
        Commands::Negotiate { name } => negotiate(config, &name).await,
        Commands::Memory { command } => memory_cmds::run(&config, command),
    }
}

pub fn snapshot_path(config: &AppConfig) -> PathBuf {
    PathBuf::from(&config.agent.data_dir).join("agent.json")
}

fn load_user_agent(config: &AppConfig) -> Result<Agent> {
    let snapshot = AgentSnapshot::load_from(snapshot_path(config))?;
    let mut agent = Agent::new("user", &config.agent.name);
    agent.profile = snapshot.profile;
    agent.memories = snapshot.memories;
    Ok(agent)
}

// ── onboard ──────────────────────────────────────────────────────────────────

fn onboard(config_path: &PathBuf, mut config: AppConfig) -> Result<()> {
    println!("Let's set up your agent. A few questions:\n");

    let name = ask("Your name")?;
    let age: u32 = ask("Your age")?
        .parse()
        .context("age must be a whole number")?;
    let city = ask("Your city")?;
    let interests: Vec<String> = ask("Interests (comma-separated)")?
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    let partner_prefs = ask("What are you looking for in a partner")?;
    let dealbreakers = ask("Any dealbreakers")?;
    let self_description = ask("Describe yourself in a sentence")?;

    let profile = UserProfile {
        name: name.clone(),
        age,
        city,
        interests,
        partner_prefs,
        dealbreakers,
        self_description,
    };

    let memories = seed_from_profile(&profile);
    let snapshot = AgentSnapshot {
        profile: Some(profile),
        memories,
    };
    snapshot.save_to(snapshot_path(&config))?;

    config.agent.name = format!("{name}'s Agent");
    config.agent.user_name = name;
    config.onboarding.completed = true;
    config.save_to(config_path)?;

    println!(
        "\nDone. {} starts out with {} remembered facts.",
        config.agent.name,
        snapshot.memories.len()
    );
    println!("Teach it more with `rendez chat \"...\"`.");
    Ok(())
}

fn ask(prompt: &str) -> Result<String> {
    print!("{prompt}: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

// ── chat ─────────────────────────────────────────────────────────────────────

async fn chat(config: AppConfig, message: &str) -> Result<()> {
    if config.needs_onboarding() {
        bail!("no profile yet — run `rendez onboard` first");
    }

    let agent = load_user_agent(&config)?;
    let path = snapshot_path(&config);
    let runtime = AgentRuntime::new(config)?;

    let out = runtime.onboarding_turn(&agent, message).await?;
    println!("{}", out.reply);

    if let Some(memory) = out.new_memory {
        println!(
            "\n  + remembered [{:.2}] {}",
            memory.weight, memory.content
        );
        let mut snapshot = AgentSnapshot::load_from(&path)?;
        snapshot.memories.push(memory);
        snapshot.save_to(&path)?;
    }
    Ok(())
}

// ── negotiate ────────────────────────────────────────────────────────────────

async fn negotiate(config: AppConfig, name: &str) -> Result<()> {
    if config.needs_onboarding() {
        bail!("no profile yet — run `rendez onboard` first");
    }

    let user_agent = load_user_agent(&config)?;
    let mut match_agent = samples::find_match(name)?;
    let runtime = AgentRuntime::new(config)?;

    match_agent.state = AgentState::Negotiating;
    println!(
        "{} is negotiating with {}...\n",
        user_agent.name, match_agent.name
    );

    match runtime.negotiate(&user_agent, &match_agent).await {
        Ok(result) => {
            for log in &result.logs {
                println!(
                    "[{:?}/{:?}] {}",
                    log.phase, log.status, log.perception
                );
                println!("    reasoning: {}", log.reasoning);
                println!("    action:    {}", log.action);
            }
            println!("\n{}", result.summary);
            if let Some(plan) = &result.date_plan {
                match_agent.state = AgentState::Confirmed;
                println!(
                    "Plan: {} on {} at {} — {}",
                    plan.venue, plan.date, plan.time, plan.notes
                );
            } else {
                match_agent.state = AgentState::Idle;
            }
            println!("{} is now {}.", match_agent.name, match_agent.state.label());
        }
        Err(err) => {
            let terminal = failure_log_entry(&err);
            println!("Negotiation failed, retry later.");
            println!("[{:?}/{:?}] {}", terminal.phase, terminal.status, terminal.reasoning);
        }
    }
    Ok(())
}
