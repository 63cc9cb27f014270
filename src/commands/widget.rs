//! Interactive customer widget
//!
//! Readline-based front end over [`ClientSyncEngine`]. A background poll
//! task shares the engine behind a mutex; the loop itself only handles
//! input, slash commands, and rendering.

use crate::backend::HttpBackend;
use crate::commands::{render_event, render_message};
use crate::config::Config;
use crate::engine::{ClientSyncEngine, PollScheduler};
use crate::error::Result;
use crate::events::EventBus;
use crate::notify::{NotificationDispatcher, TerminalNotifier};
use crate::storage::ProfileStore;

use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Start the interactive customer widget
///
/// # Arguments
///
/// * `config` - Global configuration (consumed)
/// * `email` - Optional customer email, skipping the intake prompt
/// * `name` - Optional customer display name
pub async fn run_widget(config: Config, email: Option<String>, name: Option<String>) -> Result<()> {
    let backend = Arc::new(HttpBackend::new(&config.backend)?);
    let events = EventBus::default();
    let notifications =
        NotificationDispatcher::new(Box::new(TerminalNotifier), &config.notifications);
    let store = ProfileStore::new()?;

    let engine = ClientSyncEngine::new(
        backend,
        config.widget.clone(),
        events.clone(),
        notifications,
    )
    .with_store(store);
    let engine = Arc::new(Mutex::new(engine));

    // Status lines from the engine print above the prompt.
    let mut event_rx = events.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = event_rx.recv().await {
            render_event(&event);
        }
    });

    let mut rl = DefaultEditor::new()?;

    {
        let mut engine = engine.lock().await;
        let resumed = engine.resume().await.unwrap_or(false);
        if resumed {
            println!("{}", "Resumed your previous conversation.".dimmed());
            for message in engine.messages() {
                render_message(message);
            }
        } else {
            let (email, name) = intake(&mut rl, email, name)?;
            engine.start_session(&email, name.as_deref()).await?;
            println!(
                "{}",
                "Hi! Ask anything, or ask for a live agent at any time.".dimmed()
            );
        }
        engine.open_widget().await?;
    }

    let mut scheduler = PollScheduler::new(Duration::from_millis(config.widget.poll_interval_ms));
    {
        let engine = Arc::clone(&engine);
        scheduler.start(move || {
            let engine = Arc::clone(&engine);
            Box::pin(async move {
                let mut engine = engine.lock().await;
                if engine.wants_polling() {
                    let _ = engine.poll_once().await;
                }
            })
        });
    }

    loop {
        match rl.readline("you> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                rl.add_history_entry(trimmed)?;

                match trimmed {
                    "/quit" | "/exit" => break,
                    "/help" => print_help(),
                    "/close" => {
                        engine.lock().await.close_widget();
                        println!("{}", "Widget closed; unread will accumulate.".dimmed());
                    }
                    "/open" => {
                        let mut engine = engine.lock().await;
                        engine.open_widget().await?;
                        println!("{}", "Widget open.".dimmed());
                    }
                    "/status" => {
                        let engine = engine.lock().await;
                        println!(
                            "mode: {}  offline: {}  unread: {}  session: {}",
                            engine.mode(),
                            engine.is_offline(),
                            engine.unread(),
                            engine.session_id().unwrap_or_else(|| "-".to_string())
                        );
                    }
                    "/transcript" => {
                        let engine = engine.lock().await;
                        for message in engine.messages() {
                            render_message(message);
                        }
                    }
                    _ => {
                        let mut engine = engine.lock().await;
                        let before = engine.messages().len();
                        match engine.send(trimmed).await {
                            Ok(()) => {
                                // Echo what the send produced beyond the
                                // user's own line.
                                for message in engine.messages().iter().skip(before + 1) {
                                    render_message(message);
                                }
                            }
                            Err(e) => eprintln!("{} {:#}", "error:".red(), e),
                        }
                    }
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }

    scheduler.stop();
    Ok(())
}

/// Prompt for the intake form fields not supplied on the command line
fn intake(
    rl: &mut DefaultEditor,
    email: Option<String>,
    name: Option<String>,
) -> Result<(String, Option<String>)> {
    let email = match email {
        Some(email) => email,
        None => loop {
            let line = rl.readline("email> ")?;
            let trimmed = line.trim();
            if !trimmed.is_empty() && trimmed.contains('@') {
                break trimmed.to_string();
            }
            println!("{}", "Please enter a valid email address.".yellow());
        },
    };
    let name = match name {
        Some(name) => Some(name),
        None => {
            let line = rl.readline("name (optional)> ")?;
            let trimmed = line.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
    };
    Ok((email, name))
}

fn print_help() {
    println!("Commands:");
    println!("  /open        open the widget (resets unread)");
    println!("  /close       close the widget (unread accumulates)");
    println!("  /transcript  show the full conversation");
    println!("  /status      show mode, offline flag, and unread count");
    println!("  /quit        exit");
    println!("Anything else is sent as a chat message.");
}
