mod args;
mod http;

use std::sync::Arc;

use services::{AppServices, Clock};
use storage::fixtures::seed_demo;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use args::{Args, Command, prepare_sqlite_file, print_usage};
use http::{AppState, create_router};

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let parsed = Args::parse(argv, |key| std::env::var(key).ok()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    if parsed.command == Command::Help {
        print_usage();
        return Ok(());
    }

    init_tracing(parsed.verbose);

    // Open + migrate SQLite here so the library crates never touch the filesystem directly.
    prepare_sqlite_file(&parsed.db_url)?;
    let clock = Clock::system();
    let services = AppServices::new_sqlite(&parsed.db_url, clock).await?;
    info!(db = %parsed.db_url, "database ready");

    match parsed.command {
        Command::Serve => {
            let state = Arc::new(AppState::from_services(&services));
            let router = create_router(state);
            let listener = TcpListener::bind(parsed.bind).await?;
            info!(addr = %parsed.bind, "listening");
            axum::serve(listener, router).await?;
            Ok(())
        }
        Command::Seed => {
            let summary = seed_demo(services.storage(), clock.now()).await?;
            info!(
                classes = summary.classes,
                students = summary.students,
                exam_results = summary.exam_results,
                assessments = summary.assessments,
                attendance_days = summary.attendance_days,
                "demo data seeded"
            );
            Ok(())
        }
        Command::Help => Ok(()),
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
