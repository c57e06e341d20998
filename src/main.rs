use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use packhorse::core::pack::PackInstaller;
use packhorse::core::state::LauncherState;

#[derive(Parser)]
#[command(name = "packhorse", version, about = "CurseForge modpack installer")]
struct Cli {
    /// Override the launcher data directory.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Handle modpacks from curseforge.com.
    Curse {
        #[command(subcommand)]
        command: CurseCommand,
    },
    /// Manage installed instances.
    Instance {
        #[command(subcommand)]
        command: InstanceCommand,
    },
}

#[derive(Subcommand)]
enum CurseCommand {
    /// Install a modpack.
    ///
    /// An instance is created with the pack's Forge version provisioned and
    /// all of its mods installed. LOCATOR can be a path to the pack zip, a
    /// direct zip URL, or a curseforge.com download-page URL.
    Install {
        locator: String,
        /// Name of the resulting instance.
        #[arg(short, long)]
        name: Option<String>,
    },
}

#[derive(Subcommand)]
enum InstanceCommand {
    /// List managed instances.
    List,
    /// Delete an instance and its files.
    Delete { name: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,packhorse=debug")),
        )
        .init();

    let cli = Cli::parse();

    let state = match cli.data_dir {
        Some(dir) => LauncherState::with_data_dir(dir),
        None => LauncherState::new(),
    };
    let state = match state {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to initialize: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Command::Curse {
            command: CurseCommand::Install { locator, name },
        } => install_pack(&state, &locator, name.as_deref()).await,
        Command::Instance {
            command: InstanceCommand::List,
        } => list_instances(&state).await,
        Command::Instance {
            command: InstanceCommand::Delete { name },
        } => state.instance_manager.delete(&name).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn install_pack(
    state: &LauncherState,
    locator: &str,
    name: Option<&str>,
) -> packhorse::InstallerResult<()> {
    let report = PackInstaller::new(state).install(locator, name).await?;

    println!(
        "Installed {} {} as instance '{}'",
        report.pack_name, report.pack_version, report.instance_name
    );
    println!(
        "  {} override files, {}/{} mods downloaded",
        report.overrides_copied, report.mods_downloaded, report.mods_resolved
    );
    for warning in &report.warnings {
        println!("  warning: {}", warning);
    }

    Ok(())
}

async fn list_instances(state: &LauncherState) -> packhorse::InstallerResult<()> {
    let instances = state.instance_manager.list().await?;
    if instances.is_empty() {
        println!("No instances installed.");
        return Ok(());
    }

    for instance in instances {
        let pack = match (&instance.pack_name, &instance.pack_version) {
            (Some(name), Some(version)) => format!(" ({} {})", name, version),
            _ => String::new(),
        };
        println!("{}  {}{}", instance.name, instance.version_id, pack);
    }

    Ok(())
}
