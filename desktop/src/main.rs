//! Handoff desktop shell with a terminal renderer.
//!
//! Commands on stdin: `login`, `logout`, `whoami`, `quit`.

use handoff_desktop::console::{ConsoleWindow, TokenFile, run_console_renderer};
use handoff_desktop::instance::{self, InstanceRole};
use handoff_desktop::renderer::renderer_channel;
use handoff_desktop::scheme::register_scheme;
use handoff_desktop::{DesktopConfig, DesktopShell, Invocation, SystemBrowser};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "handoff_desktop=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = DesktopConfig::from_env()?;
    let invocation = Invocation::current();

    let primary = match instance::acquire(config.instance_addr(), &invocation).await? {
        InstanceRole::Primary(primary) => primary,
        InstanceRole::Secondary => return Ok(()),
    };

    match std::env::current_exe() {
        Ok(exe) => {
            if let Err(e) = register_scheme(&config.scheme, &config.app_name, &exe).await {
                warn!(error = %e, "Continuing without URI scheme registration");
            }
        }
        Err(e) => warn!(error = %e, "Cannot locate executable; skipping scheme registration"),
    }

    let tokens = TokenFile::new(config.token_path());
    let shell = Arc::new(DesktopShell::new(config, ConsoleWindow, SystemBrowser));

    let (link, endpoint) = renderer_channel(16);
    shell.renderer().attach(link).await;
    tokio::spawn(run_console_renderer(endpoint, tokens.clone()));

    // Cold start through an activation URI
    shell.handle_invocation(&invocation).await;

    let invocations = primary.serve();
    tokio::spawn({
        let shell = Arc::clone(&shell);
        async move { shell.run(invocations).await }
    });

    info!("Ready. Commands: login, logout, whoami, quit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "login" => {
                if let Err(e) = shell.begin_login() {
                    warn!(error = %e, "Failed to open login page");
                }
            }
            "logout" => {
                shell.logout().await;
            }
            "whoami" => whoami(&shell, &tokens).await,
            "quit" | "exit" => break,
            "" => {}
            other => println!("Unknown command: {other}"),
        }
    }

    shell.renderer().detach().await;
    Ok(())
}

async fn whoami(shell: &DesktopShell<ConsoleWindow, SystemBrowser>, tokens: &TokenFile) {
    let token = match tokens.load().await {
        Ok(Some(token)) => token,
        Ok(None) => {
            println!("Not logged in.");
            return;
        }
        Err(e) => {
            warn!(error = %e, "Failed to read token");
            return;
        }
    };

    let outcome = shell.backend().verify(&token).await;
    match outcome.user {
        Some(user) if outcome.valid => println!(
            "{} ({}){}",
            user.display_name,
            user.identity,
            user.email.map(|e| format!(" <{e}>")).unwrap_or_default()
        ),
        _ => println!(
            "Session invalid: {}",
            outcome.error.unwrap_or_else(|| "unknown".to_string())
        ),
    }
}
