//! Combat-agent entry point: loads config, wires OS adapters and model
//! clients to the core harness, and runs one combat to resolution.

mod config_loader;
mod input;
mod screen;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use image::RgbaImage;
use tokio::time::sleep;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use kuro_bot_core::agent::harness::{run_combat, CombatAgent, CombatOutcome};
use kuro_bot_core::agent::ports::Screen;
use kuro_bot_core::agent::tools::tool_definitions;
use kuro_bot_core::agent::Controller;
use kuro_bot_core::config::{AgentConfig, LaunchSection};
use kuro_bot_core::llm::{
    query_chat_completions, ReasonerClient, ReasonerModelConfig, ReasonerReply,
};
use kuro_bot_core::vlm::{query_vision_generate, VisionModelConfig, VlmClient};

use config_loader::ConfigLoader;
use input::EnigoInput;
use screen::{FileScreen, MonitorScreen};

struct HttpVlm {
    cfg: VisionModelConfig,
}

impl VlmClient for HttpVlm {
    fn ask<'a>(
        &'a self,
        question: &'a str,
        image: &'a RgbaImage,
        seed: i64,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>> {
        Box::pin(query_vision_generate(question, image, seed, &self.cfg))
    }
}

struct HttpReasoner {
    cfg: ReasonerModelConfig,
    tools: Vec<serde_json::Value>,
}

impl ReasonerClient for HttpReasoner {
    fn decide<'a>(
        &'a self,
        system: &'a str,
        user: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<ReasonerReply>> + Send + 'a>> {
        Box::pin(query_chat_completions(system, user, &self.tools, &self.cfg))
    }
}

/// Spawns the game and/or reasoner server when the config names launch
/// commands, then waits out their startup delay.
async fn launch_processes(launch: &LaunchSection) -> anyhow::Result<()> {
    let mut launched = false;

    if let Some(command) = &launch.game_command {
        info!(%command, "launching game");
        tokio::process::Command::new("sh")
            .arg("-c")
            .arg(command)
            .spawn()
            .context("launch game")?;
        launched = true;
    }

    if let Some(command) = &launch.llm_server_command {
        info!(%command, "launching reasoner server");
        tokio::process::Command::new("sh")
            .arg("-c")
            .arg(command)
            .spawn()
            .context("launch reasoner server")?;
        launched = true;
    }

    if launched {
        info!(secs = launch.startup_wait_secs, "waiting for startup");
        sleep(Duration::from_secs(launch.startup_wait_secs)).await;
    }

    Ok(())
}

fn env_override(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_file =
        env_override("KURO_BOT_CONFIG_FILE").unwrap_or_else(|| "agent.toml".to_string());
    let cfg: AgentConfig = ConfigLoader::parse_from_file(&config_file)
        .with_context(|| format!("load config {config_file}"))?;

    launch_processes(&cfg.launch).await?;

    // KURO_BOT_REPLAY_FRAME replays a saved screenshot instead of capturing
    // the monitor, so regions can be calibrated without the game running.
    let screen: Box<dyn Screen> = match env_override("KURO_BOT_REPLAY_FRAME") {
        Some(path) => {
            info!(%path, "replaying frames from file");
            Box::new(FileScreen::new(path.into()))
        }
        None => Box::new(MonitorScreen::primary(
            cfg.capture.dump_latest_frame_to.clone(),
        )?),
    };

    let input = Arc::new(EnigoInput::new()?);
    let mut controller = Controller::new(input, cfg.timing.clone());

    let vlm = HttpVlm {
        cfg: VisionModelConfig {
            endpoint: cfg.vision.endpoint.clone(),
            model: cfg.vision.model.clone(),
        },
    };
    let reasoner = HttpReasoner {
        cfg: ReasonerModelConfig {
            endpoint: cfg.reasoner.endpoint.clone(),
            model: cfg.reasoner.model.clone(),
            max_tokens: cfg.reasoner.max_tokens,
            temperature: cfg.reasoner.temperature,
            top_p: cfg.reasoner.top_p,
        },
        tools: tool_definitions(),
    };

    let mut agent = CombatAgent::new(
        cfg.reasoner.system_prompt.clone(),
        cfg.regions.party_pools.len(),
    );

    match run_combat(
        &mut agent,
        &mut controller,
        screen.as_ref(),
        &vlm,
        &reasoner,
        &cfg,
    )
    .await?
    {
        CombatOutcome::Victory => info!(turns = agent.turns_taken, "combat won"),
        CombatOutcome::Defeat => info!(turns = agent.turns_taken, "combat lost"),
        CombatOutcome::TurnLimit => {
            error!(
                limit = cfg.limits.max_turns,
                "combat did not resolve within the turn budget"
            );
        }
    }

    Ok(())
}
