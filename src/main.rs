// Main entry point
use bookmap::application::build::run_build;
use bookmap::application::enrich::{run_enrich, EnrichOptions};
use bookmap::infrastructure::config;
use bookmap::infrastructure::config::load_config;
use bookmap::infrastructure::storage::cache::GeocodeStore;
use bookmap::interfaces::books::load_books;
use bookmap::interfaces::cli::Cli;
use bookmap::presentation::summary::format_summary;
use bookmap::state::AppState;
use clap::Parser;
use colored::Colorize;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Setup graceful shutdown handler
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    // Spawn signal handler task
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("Failed to listen for shutdown signal: {}", e);
        } else {
            eprintln!("\nInterrupted, shutting down...");
            let _ = shutdown_tx.send(());
        }
    });

    let cli = Cli::parse();
    let mut config = load_config()?;

    // Initialize logging
    if config.logging.enable {
        init_logging(&config.logging)?;
    }

    // CLI path flags beat the config file
    if let Some(input) = cli.input {
        config.input = input;
    }
    if let Some(output_dir) = cli.output_dir {
        config.output_dir = output_dir;
    }

    // Handle commands (flags)
    if cli.generate_config {
        config::generate_config_sample()?;
        return Ok(());
    }

    let state = AppState::new(config)?;

    if cli.status {
        print_status(&state);
        return Ok(());
    }

    if cli.enrich {
        let options = EnrichOptions {
            locations: cli.locations,
            apply: cli.yes,
            book_title: cli.book_title,
        };
        // Use select! to handle shutdown during the network pass
        tokio::select! {
            result = run_enrich(&state, &options) => {
                if let Err(e) = result {
                    eprintln!("{}", format!("Enrichment failed: {}", e).red());
                    std::process::exit(2);
                }
            }
            _ = shutdown_rx => {
                eprintln!("Enrichment interrupted");
            }
        }
        return Ok(());
    }

    // Default action: build the map
    let report = tokio::select! {
        result = run_build(&state, cli.nocache) => {
            match result {
                Ok(report) => report,
                Err(e) => {
                    eprintln!("{}", format!("Build failed: {}", e).red());
                    std::process::exit(2);
                }
            }
        }
        _ = shutdown_rx => {
            eprintln!("Build interrupted");
            return Ok(());
        }
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report.summary)?);
    } else {
        print!(
            "{}",
            format_summary(&report.summary, report.flush_warning, &report.output_file)
        );
    }

    // The page exists but some lookups failed or the cache was not saved.
    if report.summary.has_failures() || report.flush_warning {
        std::process::exit(1);
    }

    Ok(())
}

/// Initialize logging with path and level configuration
fn init_logging(logging: &config::Logging) -> anyhow::Result<()> {
    use tracing_subscriber::EnvFilter;

    let level = match logging.level.as_str() {
        "DEBUG" => "debug",
        "INFO" => "info",
        "WARN" => "warn",
        "ERROR" => "error",
        _ => "warn",
    };

    // RUST_LOG wins over the config level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if let Some(path) = &logging.path {
        if !path.is_empty() {
            // Log to file
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(file)
                .init();
            return Ok(());
        }
    }

    // Log to stderr (default)
    tracing_subscriber::fmt().with_env_filter(filter).init();

    Ok(())
}

fn print_status(state: &AppState) {
    println!("{}", "bookmap Status".green().bold());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config_path = config::get_config_path();
    if config_path.exists() {
        println!("Config: {}", config_path.display());
    } else {
        println!("Config: defaults ({} not found)", config_path.display());
    }

    let input = &state.config.input;
    if input.exists() {
        match load_books(input) {
            Ok(books) => println!("Input: {} ({} books)", input.display(), books.len()),
            Err(e) => println!("Input: {} (unreadable: {})", input.display(), e),
        }
    } else {
        println!("Input: {} (not found)", input.display());
    }

    let store = GeocodeStore::load(&state.config.cache_file);
    println!(
        "Cache: {} ({} locations)",
        state.config.cache_file.display(),
        store.len()
    );

    println!(
        "Output: {}",
        state.config.output_dir.join("index.html").display()
    );
}
