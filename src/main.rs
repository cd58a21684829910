use homework_helper::agents::StageClient;
use homework_helper::config::HelperConfig;
use homework_helper::llm::{LlmConfig, create_provider};
use homework_helper::pipeline::Orchestrator;
use homework_helper::session::{AppState, StudentProfile};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = HelperConfig::from_env()?;

    // Initialize tracing; the guard flushes the file writer on exit
    let _log_guard = init_tracing(&config);

    eprintln!("📚 Homework Helper v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", config.model);
    eprintln!("   Student: {} ({})", config.student_name, config.learning_style);
    if config.api_key.is_none() {
        eprintln!("   Warning: GEMINI_API_KEY not set; questions will fail until it is.");
        eprintln!("     export GEMINI_API_KEY=...");
    }
    eprintln!("   Type a question and press Enter. /help for commands.\n");

    let llm = create_provider(&LlmConfig::from(&config))?;
    let profile = StudentProfile {
        name: config.student_name.clone(),
        learning_style: config.learning_style.clone(),
        ..StudentProfile::default()
    };

    let orchestrator = Orchestrator::new(StageClient::new(llm), AppState::new(profile));
    homework_helper::cli::run(orchestrator).await?;

    Ok(())
}

fn init_tracing(config: &HelperConfig) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "homework-helper.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            tracing_subscriber::registry()
                .with(filter)
                .with(console)
                .with(file)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(console)
                .init();
            None
        }
    }
}
