//! ripr - reason-tagged IPv4 range storage over Redis.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use ripr::cli::{Cli, Commands};
use ripr::{Config, RangeDb, RiprError};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let db = RangeDb::connect(&config).await?;

    match cli.command {
        Commands::Insert { range, reason } => {
            db.insert(&range, &reason).await?;
            println!("inserted {range}");
        }
        Commands::Remove { range } => {
            db.remove(&range).await?;
            println!("removed {range}");
        }
        Commands::Find { ip } => match db.find(&ip).await {
            Ok(reason) => println!("{reason}"),
            Err(e) if e.is_not_found() => {
                println!("not found");
                std::process::exit(1);
            }
            Err(e) => return Err(e.into()),
        },
        Commands::Update { ip, reason } => {
            db.update_reason_of(&ip, |_| reason.clone()).await?;
            println!("updated the interval containing {ip}");
        }
        Commands::List => {
            for entry in db.intervals().await? {
                if entry.start == entry.end {
                    println!("{}\t{}", entry.start, entry.reason);
                } else {
                    println!("{} - {}\t{}", entry.start, entry.end, entry.reason);
                }
            }
        }
        Commands::Import { file, reason } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;

            let mut imported = 0usize;
            let mut skipped = 0usize;
            for line in content.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                match db.insert(line, &reason).await {
                    Ok(()) => imported += 1,
                    Err(e @ (RiprError::InvalidRange | RiprError::Ipv6NotSupported)) => {
                        warn!(line = %line, error = %e, "skipping unparsable line");
                        skipped += 1;
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            info!(imported, skipped, "import finished");
        }
        Commands::Reset => {
            db.reset().await?;
            println!("database reset");
        }
        Commands::Flush => {
            db.flush().await?;
            println!("database flushed");
        }
    }

    Ok(())
}
