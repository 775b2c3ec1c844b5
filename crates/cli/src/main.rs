use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use events::EventBus;
use publisher::{DeployBehavior, DeploymentPreferences, InMemoryServer, LaunchSettings};
use wharf_core::{ModuleDelta, ModulePath, PublishKind};

#[derive(Parser)]
#[command(name = "wharf")]
#[command(about = "Module publish coordination for application servers", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project directory (defaults to the current directory)
    #[arg(short, long)]
    project: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write default deployment preferences into the project
    Init,
    /// Run a publish round over the configured modules
    Publish {
        /// Publish kind: incremental, full, auto or clean
        #[arg(short, long, default_value = "full")]
        kind: String,
    },
    /// Show preferences and deployed content
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let project = match cli.project {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Init => init(&project).await,
        Commands::Publish { kind } => publish(&project, &kind).await,
        Commands::Status => status(&project).await,
    }
}

async fn init(project: &Path) -> Result<()> {
    let prefs_path = DeploymentPreferences::path(project);
    if prefs_path.exists() {
        println!("Project already initialized at {}", prefs_path.display());
        return Ok(());
    }

    DeploymentPreferences::default()
        .write(project)
        .await
        .context("failed to write deployment preferences")?;

    println!("Initialized {}", prefs_path.display());
    println!("Add module entries to publish, e.g.:");
    println!("  {{ \"modules\": [{{ \"name\": \"webapp\", \"path\": \"webapp\" }}] }}");
    Ok(())
}

async fn publish(project: &Path, kind: &str) -> Result<()> {
    let kind = PublishKind::parse(kind)
        .with_context(|| format!("unknown publish kind: {kind}"))?;

    let prefs = DeploymentPreferences::read(project).await;
    if prefs.modules.is_empty() {
        anyhow::bail!(
            "no modules configured; add entries to {}",
            DeploymentPreferences::path(project).display()
        );
    }
    let deploy_root = prefs.deploy_root(project);

    let server_name = project
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "local".to_string());

    let bus = EventBus::new();
    let host = Arc::new(InMemoryServer::new(server_name).with_event_bus(bus.clone()));

    let mut modules = Vec::new();
    for entry in &prefs.modules {
        let module = ModulePath::root(entry.name.clone());
        let root = if entry.path.is_absolute() {
            entry.path.clone()
        } else {
            project.join(&entry.path)
        };
        host.add_module(module.clone(), Some(root));
        modules.push(module);
    }

    let mut behavior =
        DeployBehavior::new(host, prefs, deploy_root.clone()).with_event_bus(bus);

    let mut launch = LaunchSettings::new();
    behavior.setup_launch(&mut launch);
    behavior.set_starting();

    behavior.publish_start().await?;
    let mut failed = 0;
    for module in &modules {
        let delta = if behavior.has_been_published(module) {
            ModuleDelta::Changed
        } else {
            ModuleDelta::Added
        };
        if let Err(e) = behavior.publish_module(kind, delta, module).await {
            error!(module = %module, error = %e, "Module publish failed");
            failed += 1;
        }
    }
    let state = behavior.publish_finish().await?;
    behavior.set_started();

    println!(
        "Published {} module(s) to {} ({})",
        modules.len() - failed,
        deploy_root.display(),
        state.as_str()
    );
    if failed > 0 {
        anyhow::bail!("{failed} module(s) failed to publish");
    }
    Ok(())
}

async fn status(project: &Path) -> Result<()> {
    let prefs_path = DeploymentPreferences::path(project);
    if !prefs_path.exists() {
        println!("Not initialized (no {})", prefs_path.display());
        return Ok(());
    }

    let prefs = DeploymentPreferences::read(project).await;
    println!(
        "Method:      {}",
        prefs.method.as_deref().unwrap_or("local (default)")
    );
    let deploy_root = prefs.deploy_root(project);
    println!("Deploy root: {}", deploy_root.display());
    println!("Modules:     {}", prefs.modules.len());
    for entry in &prefs.modules {
        let deployed = deploy_root.join(&entry.name).exists();
        println!(
            "  {} ({}) {}",
            entry.name,
            entry.path.display(),
            if deployed { "deployed" } else { "not deployed" }
        );
    }
    Ok(())
}
