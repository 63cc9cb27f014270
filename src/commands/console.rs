//! Interactive agent console
//!
//! Readline-based front end over [`AgentConsoleSyncEngine`]. The console
//! lists sessions, opens one, and joins it as a selected agent identity;
//! a background poll task keeps the displayed transcript converging with
//! whatever the customer side does.

use crate::backend::HttpBackend;
use crate::commands::{render_event, render_message, sessions};
use crate::config::Config;
use crate::engine::{ActionOutcome, AgentConsoleSyncEngine, PollScheduler};
use crate::error::Result;
use crate::events::EventBus;
use crate::storage::ProfileStore;

use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Start the interactive agent console
///
/// # Arguments
///
/// * `config` - Global configuration (consumed)
/// * `agent` - Optional identity to select up front
/// * `session` - Optional session id to open immediately
pub async fn run_console(
    config: Config,
    agent: Option<String>,
    session: Option<String>,
) -> Result<()> {
    let backend = Arc::new(HttpBackend::new(&config.backend)?);
    let events = EventBus::default();
    let store = ProfileStore::new()?;

    let mut console =
        AgentConsoleSyncEngine::new(backend, config.console.clone(), events.clone()).with_store(store);

    if let Some(name) = agent {
        console.select_identity(&name).await?;
    }
    match console.identity() {
        Some(identity) => println!("{}", format!("Acting as {}", identity.name).dimmed()),
        None => println!(
            "{}",
            "No agent identity selected yet; you will be asked before joining.".dimmed()
        ),
    }

    let mut event_rx = events.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = event_rx.recv().await {
            render_event(&event);
        }
    });

    let mut rl = DefaultEditor::new()?;

    if let Some(id) = session {
        console.open_session(&id).await?;
        println!("{}", format!("Opened session {}", id).dimmed());
    } else {
        sessions::print_sessions(&console.list_sessions().await?);
    }

    let console = Arc::new(Mutex::new(console));

    let mut scheduler = PollScheduler::new(Duration::from_millis(config.console.poll_interval_ms));
    {
        let console = Arc::clone(&console);
        scheduler.start(move || {
            let console = Arc::clone(&console);
            Box::pin(async move {
                let mut console = console.lock().await;
                if console.wants_polling() {
                    let _ = console.poll_once().await;
                }
            })
        });
    }

    loop {
        match rl.readline("console> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                rl.add_history_entry(trimmed)?;

                let (command, rest) = match trimmed.split_once(' ') {
                    Some((c, r)) => (c, r.trim()),
                    None => (trimmed, ""),
                };

                match command {
                    "/quit" | "/exit" => break,
                    "/help" => print_help(),
                    "/list" => {
                        let console = console.lock().await;
                        match console.list_sessions().await {
                            Ok(list) => sessions::print_sessions(&list),
                            Err(e) => eprintln!("{} {:#}", "error:".red(), e),
                        }
                    }
                    "/open" => {
                        let mut console = console.lock().await;
                        match console.open_session(rest).await {
                            Ok(()) => {
                                for message in console.messages() {
                                    render_message(message);
                                }
                            }
                            Err(e) => eprintln!("{} {:#}", "error:".red(), e),
                        }
                    }
                    "/back" => {
                        console.lock().await.close_session();
                        println!("{}", "Closed session view.".dimmed());
                    }
                    "/agent" => {
                        let mut console = console.lock().await;
                        if let Err(e) = console.select_identity(rest).await {
                            eprintln!("{} {:#}", "error:".red(), e);
                        }
                    }
                    "/join" => {
                        let mut console = console.lock().await;
                        match console.join().await {
                            Ok(ActionOutcome::Completed) => {}
                            Ok(ActionOutcome::NeedsIdentity) => {
                                if let Err(e) = prompt_identity(&mut rl, &mut console).await {
                                    eprintln!("{} {:#}", "error:".red(), e);
                                }
                            }
                            Err(e) => eprintln!("{} {:#}", "error:".red(), e),
                        }
                    }
                    "/end" => {
                        let mut console = console.lock().await;
                        if let Err(e) = console.end_session().await {
                            eprintln!("{} {:#}", "error:".red(), e);
                        }
                    }
                    "/delete" => {
                        let mut console = console.lock().await;
                        if let Err(e) = console.delete_session().await {
                            eprintln!("{} {:#}", "error:".red(), e);
                        }
                    }
                    "/transcript" => {
                        let console = console.lock().await;
                        for message in console.messages() {
                            render_message(message);
                        }
                    }
                    "/status" => {
                        let console = console.lock().await;
                        println!(
                            "mode: {}  session: {}  identity: {}",
                            console.mode(),
                            console.session_id().unwrap_or_else(|| "-".to_string()),
                            console
                                .identity()
                                .map(|a| a.name.clone())
                                .unwrap_or_else(|| "-".to_string())
                        );
                    }
                    _ => {
                        let mut console = console.lock().await;
                        match console.send_as_agent(trimmed).await {
                            Ok(ActionOutcome::Completed) => {}
                            Ok(ActionOutcome::NeedsIdentity) => {
                                if let Err(e) = prompt_identity(&mut rl, &mut console).await {
                                    eprintln!("{} {:#}", "error:".red(), e);
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

/// Prompt for an identity; selecting one resumes the parked action
async fn prompt_identity(
    rl: &mut DefaultEditor,
    console: &mut AgentConsoleSyncEngine<HttpBackend>,
) -> Result<()> {
    println!("Select an agent identity:");
    for (i, agent) in console.roster().iter().enumerate() {
        println!("  {}. {} <{}>", i + 1, agent.name, agent.email);
    }

    let line = rl.readline("agent> ")?;
    let trimmed = line.trim();
    let name = match trimmed.parse::<usize>() {
        Ok(n) => console
            .roster()
            .get(n.saturating_sub(1))
            .map(|a| a.name.clone())
            .unwrap_or_else(|| trimmed.to_string()),
        Err(_) => trimmed.to_string(),
    };
    console.select_identity(&name).await
}

fn print_help() {
    println!("Commands:");
    println!("  /list          list sessions");
    println!("  /open <id>     display a session");
    println!("  /join          join the displayed session as an agent");
    println!("  /agent <name>  select an agent identity from the roster");
    println!("  /end           end the displayed conversation");
    println!("  /delete        delete the displayed conversation");
    println!("  /transcript    show the displayed conversation");
    println!("  /back          stop displaying the session");
    println!("  /status        show mode, session, and identity");
    println!("  /quit          exit");
    println!("Anything else is sent as an agent message.");
}
