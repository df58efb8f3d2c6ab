use anyhow::Context;
use chat_moderation_service::{
    config::{ClassifierBackend, Config},
    console::{self, ConsoleCommand},
    logging,
    services::{
        AuditLog, ClassifierGateway, EscalationEngine, GeminiClassifier, ModerationClassifier,
        MuteClock, SystemTimeSource, TextModerator,
    },
    session::SessionHandle,
};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;

fn build_classifier(config: &Config) -> anyhow::Result<Arc<dyn ModerationClassifier>> {
    match config.classifier_backend {
        ClassifierBackend::Gemini => {
            let api_key = config
                .gemini_api_key
                .as_deref()
                .context("GEMINI_API_KEY must be set for the gemini classifier")?;
            let classifier = GeminiClassifier::new(
                api_key,
                &config.gemini_model,
                &config.gemini_base_url,
                config.classifier_timeout,
            )?;
            Ok(Arc::new(classifier))
        }
        ClassifierBackend::Local => {
            let moderator = TextModerator::new(&config.sensitive_words_path)?;
            tracing::info!(words = moderator.word_count(), "Local text moderator loaded");
            Ok(Arc::new(moderator))
        }
    }
}

fn prompt(text: &str) {
    print!("{}", text);
    let _ = std::io::stdout().flush();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_tracing();

    tracing::info!("Starting chat moderation service...");

    let config = Config::from_env().context("failed to load configuration")?;
    tracing::info!(
        service = %config.service_name,
        environment = %config.environment,
        classifier = config.classifier_backend.as_str(),
        escalation_threshold = config.escalation_threshold,
        mute_clock_interval_secs = config.mute_clock_interval.as_secs(),
        "Configuration loaded"
    );

    let gateway = ClassifierGateway::new(build_classifier(&config)?, config.classifier_timeout);
    let engine = EscalationEngine::new(config.mute_ladder.clone(), config.escalation_threshold);

    let session = SessionHandle::spawn(
        config.registered_roster(),
        engine,
        gateway,
        AuditLog::with_capacity(config.audit_log_capacity),
        Arc::new(SystemTimeSource),
    )?;

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let mute_clock = tokio::spawn(
        MuteClock::new(config.mute_clock_interval).run(session.clone(), shutdown_rx),
    );

    println!("{}", console::render_banner(session.classifier_name()));
    println!("{}", console::HELP);
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let active = session.active_user().await?;
        prompt(&console::render_prompt(&active));

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                println!();
                tracing::info!("Received Ctrl-C");
                None
            }
        };

        let Some(line) = line else {
            break;
        };

        match ConsoleCommand::parse(&line) {
            ConsoleCommand::Empty => {}
            ConsoleCommand::Say(text) => match session.submit_message(&active.user_id, &text).await {
                Ok(outcome) => {
                    let summary = console::render_outcome(&outcome);
                    if !summary.is_empty() {
                        println!("{}", summary);
                    }
                }
                Err(e) => println!("{}", e.user_message()),
            },
            ConsoleCommand::Switch => {
                let next = session.switch_active_user().await?;
                println!("Posting as {}", next.username);
            }
            ConsoleCommand::Users => {
                for standing in session.roster().await? {
                    println!("{}", console::render_standing(&standing));
                }
            }
            ConsoleCommand::Log => {
                let entries = session.audit_log().await?;
                if entries.is_empty() {
                    println!("No moderation actions yet");
                }
                for entry in entries {
                    println!("{}", console::render_entry(&entry));
                }
            }
            ConsoleCommand::Stats => {
                println!("{}", console::render_stats(&session.stats().await?));
            }
            ConsoleCommand::Messages => {
                for message in session.messages().await? {
                    println!("{}", console::render_message(&message));
                }
            }
            ConsoleCommand::Help => println!("{}", console::HELP),
            ConsoleCommand::Quit => break,
            ConsoleCommand::Unknown(command) => {
                println!("Unknown command {}, try /help", command);
            }
        }
    }

    tracing::info!("Shutting down...");
    let _ = shutdown_tx.send(());
    if let Err(e) = mute_clock.await {
        tracing::error!("Mute clock task failed: {}", e);
    }

    Ok(())
}
