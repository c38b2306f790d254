use clap::Parser;
use std::process;
use tasklist::cli::{Cli, Commands};
use tasklist::cli_handlers::{self, EditArgs};
use tasklist::config::Config;
use tasklist::models::NewTask;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = Config::with_data_dir(&cli.data_dir);

    let result = match cli.command {
        Commands::Serve {
            host,
            port,
            no_backup,
        } => {
            config.host = host;
            config.port = port;
            config.backup_on_start = !no_backup;
            if let Err(e) = run_server(&config).await {
                eprintln!("Server error: {e:#}");
                process::exit(1);
            }
            return;
        }
        Commands::Add {
            content,
            color,
            label,
            due,
            context,
        } => cli_handlers::handle_add(
            &config,
            NewTask {
                content,
                color,
                label,
                due_date: due,
                context,
            },
        ),
        Commands::List { label } => cli_handlers::handle_list(&config, label.as_deref()),
        Commands::Show { id } => cli_handlers::handle_show(&config, id),
        Commands::Edit {
            id,
            content,
            color,
            label,
            due,
            requires,
            context,
            note,
        } => cli_handlers::handle_edit(
            &config,
            id,
            EditArgs {
                content,
                color,
                label,
                due,
                requires,
                context,
                note,
            },
        ),
        Commands::Toggle { id } => cli_handlers::handle_toggle(&config, id),
        Commands::Move { id, direction } => cli_handlers::handle_move(&config, id, &direction),
        Commands::Reorder { ids } => cli_handlers::handle_reorder(&config, &ids),
        Commands::Delete { id } => cli_handlers::handle_delete(&config, id),
        Commands::Sweep => cli_handlers::handle_sweep(&config),
        Commands::Reindex => cli_handlers::handle_reindex(&config),
        Commands::Backup => cli_handlers::handle_backup(&config),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

async fn run_server(config: &Config) -> anyhow::Result<()> {
    use anyhow::Context;

    cli_handlers::handle_serve(config)
        .await
        .with_context(|| format!("serving {}", config.db_path().display()))
}
