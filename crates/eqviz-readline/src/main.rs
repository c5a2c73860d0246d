mod render;

use std::borrow::Cow::{self, Borrowed, Owned};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use tokio::sync::broadcast::error::RecvError;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use eqviz_application::{ClientSession, SyncOutcome};
use eqviz_core::dataset::DatasetId;
use eqviz_core::error::ClientError;
use eqviz_core::session::{AuthMode, CredentialRepository, Credentials};
use eqviz_infrastructure::{
    ConfigService, EqvizPaths, InMemoryCredentialRepository, TomlCredentialRepository,
};
use eqviz_interaction::HttpAnalysisApi;

const LOG_ENV: &str = "EQVIZ_LOG";

const COMMANDS: &[(&str, &str)] = &[
    ("/login", "/login <username>        log in (password is prompted)"),
    ("/register", "/register <username> [email]  create an account and log in"),
    ("/logout", "/logout                 end the session and forget it"),
    ("/whoami", "/whoami                 show the logged-in user"),
    ("/list", "/list                   refresh and show the upload history"),
    ("/select", "/select <id>            show a dataset"),
    ("/show", "/show                   summary and items of the selected dataset"),
    ("/charts", "/charts                 type distribution and parameter series"),
    ("/file", "/file <path.csv>        choose a CSV file to upload"),
    ("/upload", "/upload                 upload the chosen file"),
    ("/reset", "/reset                  clear the upload selection"),
    ("/report", "/report                 download the PDF report of the selected dataset"),
    ("/auto", "/auto [on|off]          toggle periodic refresh"),
    ("/status", "/status                 client state at a glance"),
    ("/help", "/help                   this list"),
    ("/quit", "/quit                   exit (the session is kept)"),
];

#[derive(Parser, Debug)]
#[command(name = "eqviz", version, about = "Client for the chemical equipment analysis service")]
struct Args {
    /// Base URL of the analysis service, e.g. http://localhost:8000/api
    #[arg(long)]
    server_url: Option<String>,

    /// Directory holding config.toml, local storage and logs
    #[arg(long, value_name = "DIR")]
    config: Option<PathBuf>,

    /// Keep the session in memory only
    #[arg(long)]
    ephemeral: bool,
}

/// CLI helper for rustyline: command completion, highlighting and hints.
#[derive(Clone)]
struct CliHelper {
    commands: Vec<String>,
}

impl CliHelper {
    fn new() -> Self {
        Self {
            commands: COMMANDS.iter().map(|(c, _)| c.to_string()).collect(),
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];
        if !line.starts_with('/') || line.contains(' ') {
            return Ok((0, vec![]));
        }

        let candidates = self
            .commands
            .iter()
            .filter(|cmd| cmd.starts_with(line))
            .map(|cmd| Pair {
                display: cmd.clone(),
                replacement: cmd.clone(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];
        if !line.starts_with('/') || line.contains(' ') {
            return None;
        }
        self.commands
            .iter()
            .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
            .map(|cmd| cmd[line.len()..].to_string())
    }
}

impl Validator for CliHelper {}

type Repl = Editor<CliHelper, DefaultHistory>;

/// Routes logs to a daily file under `logs_dir`, filtered by `EQVIZ_LOG`.
fn init_logging(logs_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(logs_dir)?;
    let appender = tracing_appender::rolling::daily(logs_dir, "eqviz.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false),
        )
        .init();
    Ok(guard)
}

fn print_error(err: &ClientError) {
    eprintln!("{}", err.user_message().red());
}

fn print_help() {
    for (_, usage) in COMMANDS {
        println!("  {}", usage.bright_black());
    }
}

/// Prompts for the password without adding it to history.
fn read_password(rl: &mut Repl) -> Option<String> {
    match rl.readline("password: ") {
        Ok(password) => Some(password),
        Err(_) => None,
    }
}

enum Flow {
    Continue,
    Quit,
}

async fn run_command(client: &ClientSession, rl: &mut Repl, line: &str) -> Flow {
    let mut parts = line.split_whitespace();
    let command = parts.next().unwrap_or_default();
    let args: Vec<&str> = parts.collect();

    match command {
        "/login" | "/register" => {
            let mode = if command == "/login" {
                AuthMode::Login
            } else {
                AuthMode::Register
            };
            let username = args.first().copied().unwrap_or_default();
            let Some(password) = read_password(rl) else {
                return Flow::Continue;
            };
            let mut credentials = Credentials::new(username, password);
            if let Some(email) = args.get(1) {
                credentials = credentials.with_email(*email);
            }
            if let Err(e) = client.sessions().authenticate(mode, &credentials).await {
                print_error(&e);
            }
        }
        "/logout" => {
            if let Err(e) = client.sessions().logout().await {
                print_error(&e);
            }
        }
        "/whoami" => match client.sessions().current().await {
            Some(session) => println!("{}", session.username.bright_green()),
            None => println!("{}", "Not logged in".bright_black()),
        },
        "/list" => {
            if !client.sessions().is_authenticated().await {
                print_error(&ClientError::Unauthorized);
                return Flow::Continue;
            }
            if client.datasets().refresh_list().await == SyncOutcome::Failed {
                println!("{}", "Showing the last known list.".yellow());
            }
            render::history(&client.snapshot().await);
        }
        "/select" => {
            let Some(id) = args.first().and_then(|a| a.trim_start_matches('#').parse::<DatasetId>().ok())
            else {
                println!("{}", "Usage: /select <id>".yellow());
                return Flow::Continue;
            };
            match client.datasets().select_detail(id).await {
                Ok(SyncOutcome::Applied) => {
                    render::detail(client.snapshot().await.current.as_ref());
                }
                Ok(_) => println!("{}", "Selection superseded".bright_black()),
                Err(e) => print_error(&e),
            }
        }
        "/show" => render::detail(client.snapshot().await.current.as_ref()),
        "/charts" => render::charts(client.snapshot().await.current.as_ref()),
        "/file" => {
            let Some(path) = args.first() else {
                println!("{}", "Usage: /file <path.csv>".yellow());
                return Flow::Continue;
            };
            match client.uploads().select_path(Path::new(path)).await {
                Ok(()) => println!("{}", format!("{path} selected").bright_blue()),
                Err(e) => print_error(&e),
            }
        }
        "/upload" => match client.uploads().submit().await {
            Ok(detail) => {
                println!("{}", format!("Uploaded {}", detail.name).bright_green());
                render::detail(Some(&detail));
            }
            Err(e) => print_error(&e),
        },
        "/reset" => {
            if let Err(e) = client.uploads().reset() {
                print_error(&e);
            }
        }
        "/report" => {
            if let Err(e) = client.datasets().download_report().await {
                print_error(&e);
            }
        }
        "/auto" => {
            let enabled = match args.first().copied() {
                Some("on") => true,
                Some("off") => false,
                None => !client.auto_refresh(),
                Some(_) => {
                    println!("{}", "Usage: /auto [on|off]".yellow());
                    return Flow::Continue;
                }
            };
            client.set_auto_refresh(enabled).await;
        }
        "/status" => render::status(&client.snapshot().await),
        "/help" => print_help(),
        "/quit" | "/exit" => return Flow::Quit,
        other => println!("{}", format!("Unknown command: {other}").bright_black()),
    }
    Flow::Continue
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let paths = match &args.config {
        Some(root) => EqvizPaths::at(root),
        None => EqvizPaths::from_platform()?,
    };
    let _log_guard = init_logging(&paths.logs_dir())?;

    let mut config = ConfigService::from_paths(&paths).get_config()?;
    if let Some(url) = args.server_url {
        config.server_url = url;
    }
    config.download_dir = Some(EqvizPaths::download_dir(config.download_dir.as_deref()));
    tracing::info!(server_url = %config.server_url, "Starting eqviz");

    let api = Arc::new(HttpAnalysisApi::from_config(&config));
    let credentials: Arc<dyn CredentialRepository> = if args.ephemeral {
        Arc::new(InMemoryCredentialRepository::new())
    } else {
        Arc::new(TomlCredentialRepository::from_paths(&paths))
    };
    let client = ClientSession::create(config, api, credentials)?;

    let mut events = client.subscribe();
    let printer = tokio::spawn(async move {
        let mut last_count = None;
        loop {
            match events.recv().await {
                Ok(event) => render::event(&event, &mut last_count),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Event printer lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    println!("{}", "=== eqviz ===".bright_magenta().bold());
    match client.sessions().restore().await {
        Ok(Some(session)) => {
            println!("{}", format!("Welcome back, {}", session.username).bright_green());
        }
        Ok(None) => println!("{}", "Use /login or /register to begin.".bright_black()),
        Err(e) => print_error(&e),
    }
    println!("{}", "Type /help for commands.".bright_black());
    println!();

    let mut rl: Repl = Editor::new()?;
    rl.set_helper(Some(CliHelper::new()));

    loop {
        match rl.readline(">> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);

                if !trimmed.starts_with('/') {
                    println!("{}", "Commands start with '/'. Type /help.".bright_black());
                    continue;
                }
                if let Flow::Quit = run_command(&client, &mut rl, trimmed).await {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type /quit to exit.".yellow());
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{}", format!("Error: {err:?}").red());
                break;
            }
        }
    }

    client.destroy().await;
    drop(client);
    printer.abort();
    println!("{}", "Goodbye!".bright_green());
    Ok(())
}
