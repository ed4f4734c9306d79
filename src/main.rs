use anyhow::Result;
use clap::Parser;
use ragbridge::cli::{Cli, Commands};
use ragbridge::intent::KeywordTable;
use ragbridge::providers::{demo, server};
use ragbridge::{utils, ContextEngine, Settings};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let (settings, skipped) = Settings::load()?;

    // stdout belongs to the wire protocol when serving a demo provider
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    for message in &skipped {
        tracing::warn!("{}", message);
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::ServeDemo { kind } => server::serve_stdio(demo::handler(kind).as_ref()).await,
        Commands::CheckKeywords => handle_check_keywords(),
        command => {
            let engine = ContextEngine::init(settings).await?;
            let result = run(&engine, command).await;
            engine.shutdown().await;
            result
        }
    }
}

async fn run(engine: &ContextEngine, command: Commands) -> Result<()> {
    match command {
        Commands::Context {
            query,
            user,
            session,
            record,
            topic,
        } => handle_context(engine, &query, &user, &session, record, topic).await,
        Commands::Classify { query } => {
            utils::print_header(&format!("Intent for: {}", query));
            utils::print_classification(&engine.classify(&query));
            Ok(())
        }
        Commands::Cleanup { max_age_days } => {
            let days = max_age_days.unwrap_or(engine.settings().session.retention_days);
            let report = engine.cleanup_old_sessions(days).await;
            utils::print_success(&format!(
                "Removed {} cached and {} stored sessions older than {} days",
                report.memory, report.durable, days
            ));
            Ok(())
        }
        Commands::ServeDemo { .. } | Commands::CheckKeywords => Ok(()),
    }
}

async fn handle_context(
    engine: &ContextEngine,
    query: &str,
    user: &str,
    session: &str,
    record: Option<String>,
    topic: Option<String>,
) -> Result<()> {
    utils::print_header(&format!("Context for {} / {}", user, session));
    let text = engine.build_context(query, user, session).await;
    println!("{}", text);

    if let Some(response) = record {
        engine
            .update_context(user, session, query, &response, topic.as_deref())
            .await;
        utils::print_info("Turn recorded");
    }
    Ok(())
}

fn handle_check_keywords() -> Result<()> {
    match KeywordTable::builtin().validate() {
        Ok(()) => {
            utils::print_success("Every gate covers the phrases of its tags");
            Ok(())
        }
        Err(e) => {
            for missing in &e.missing {
                utils::print_error(&missing.to_string());
            }
            Err(e.into())
        }
    }
}
