use std::net::{Ipv4Addr, SocketAddr};

use anyhow::Context;
use colored::Colorize;
use lexis_protocol::{Message, Request, Status};
use lexis_sdk::DictionaryClient;
use lexis_server::{DictionaryServer, ServerConfig};
use lexis_store::{
    default_vocabulary, load_snapshot, save_snapshot, InMemoryWordStore, SnapshotFormat, WordStore,
};
use tracing::{info, warn};

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    match cli.command {
        Command::Serve(args) => cmd_serve(args).await,
        Command::Search(args) => {
            send(&args.remote, Request::Search { word: args.word }, format).await
        }
        Command::Add(args) => {
            let request = Request::Add {
                word: args.word,
                meanings: args.meanings,
            };
            send(&args.remote, request, format).await
        }
        Command::Remove(args) => {
            send(&args.remote, Request::Remove { word: args.word }, format).await
        }
        Command::AddMeaning(args) => {
            let request = Request::AddMeaning {
                word: args.word,
                meaning: args.meaning,
            };
            send(&args.remote, request, format).await
        }
        Command::UpdateMeaning(args) => {
            let request = Request::UpdateMeaning {
                word: args.word,
                old_meaning: args.old_meaning,
                new_meaning: args.new_meaning,
            };
            send(&args.remote, request, format).await
        }
        Command::Export(args) => cmd_export(args),
    }
}

fn server_config(args: &ServeArgs) -> anyhow::Result<ServerConfig> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(port) = args.port {
        config.bind_addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    }
    if let Some(snapshot) = &args.snapshot {
        config.snapshot_path = Some(snapshot.clone());
    }
    if let Some(workers) = args.workers {
        config.max_connections = workers;
    }
    if args.save_on_stop {
        config.save_on_stop = true;
    }
    config.validate()?;
    Ok(config)
}

async fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = server_config(&args)?;
    let server = DictionaryServer::new(config);
    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for ctrl-c");
                return;
            }
            info!("interrupt received, shutting down");
        })
        .await?;
    println!("{} Server stopped.", "✓".green().bold());
    Ok(())
}

async fn send(remote: &RemoteArgs, request: Request, format: OutputFormat) -> anyhow::Result<()> {
    let mut client = DictionaryClient::connect(remote.addr.as_str()).await?;
    let response = client.request(request).await?;
    client.close().await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&response)?),
        OutputFormat::Text => print_response(&response),
    }
    if response.status == Some(Status::Error) {
        anyhow::bail!(
            "server rejected request: {}",
            response.error_message.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

fn print_response(response: &Message) {
    let word = response.word.as_deref().unwrap_or_default();
    match response.status {
        Some(Status::Success) => {
            println!("{} {}", "✓".green().bold(), word.bold());
            for (i, meaning) in response.meanings.iter().flatten().enumerate() {
                println!("  {}. {}", i + 1, meaning);
            }
        }
        Some(Status::NotFound) => println!("{} {} not found", "✗".yellow(), word.bold()),
        Some(Status::Duplicate) => println!("{} {} already present", "✗".yellow(), word.bold()),
        Some(Status::MeaningNotFound) => {
            println!("{} meaning not found for {}", "✗".yellow(), word.bold())
        }
        Some(Status::Error) => println!(
            "{} {}",
            "error:".red().bold(),
            response.error_message.as_deref().unwrap_or_default()
        ),
        None => println!("{} response carried no status", "?".dimmed()),
    }
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let store = InMemoryWordStore::new();
    match &args.input {
        Some(input) => {
            load_snapshot(&store, input)
                .with_context(|| format!("reading {}", input.display()))?;
        }
        None => {
            for entry in default_vocabulary() {
                store.add(entry.word(), entry.meanings());
            }
        }
    }
    let written = save_snapshot(&store, &args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;
    println!(
        "{} Exported {} words to {} ({})",
        "✓".green().bold(),
        written.to_string().bold(),
        args.output.display(),
        SnapshotFormat::from_path(&args.output).to_string().cyan()
    );
    Ok(())
}
