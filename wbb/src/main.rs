//! Web Bot Battle bot client.
//!
//! Runs one turn per process: either from an explicit query string
//! (`wbb turn`) or as a CGI program behind a web server (`wbb cgi`). Use
//! `wbb-server` to serve turns from a long-running HTTP process instead.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use rand::Rng;
use rand::distributions::Alphanumeric;
use wbb::core::types::TurnReply;
use wbb::exit_codes;
use wbb::io::config::{BotConfig, DEFAULT_CONFIG_PATH, load_config, write_config};
use wbb::io::game_log::LogBuffer;
use wbb::io::server::HttpGameServer;
use wbb::request::RequestError;
use wbb::turn::{TurnError, handle_query_buffered};

#[derive(Parser)]
#[command(name = "wbb", version, about = "Web Bot Battle bot client")]
struct Cli {
    /// Path to the bot config file.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a default config file.
    Init {
        /// Key shared with the game server (generated when omitted).
        #[arg(long)]
        key: Option<String>,
        /// Overwrite an existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Run one turn from a query string and print the reply body.
    Turn {
        /// Query string as sent by the game server (leading `?` optional).
        #[arg(long)]
        query: String,
    },
    /// Run one turn as a CGI program, reading `QUERY_STRING`.
    Cgi,
}

fn main() {
    wbb::logging::init();
    let code = match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            exit_codes::INVALID
        }
    };
    std::process::exit(code);
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Init { key, force } => cmd_init(&cli.config, key, force),
        Command::Turn { query } => cmd_turn(&cli.config, &query),
        Command::Cgi => cmd_cgi(&cli.config),
    }
}

fn cmd_init(path: &Path, key: Option<String>, force: bool) -> Result<i32> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    let key = key.unwrap_or_else(generate_key);
    let cfg = BotConfig {
        key,
        ..BotConfig::default()
    };
    write_config(path, &cfg)?;
    println!("wrote {}", path.display());
    Ok(exit_codes::OK)
}

fn generate_key() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(24)
        .map(char::from)
        .collect()
}

/// Console bot-log lines are left in `console`; stdout belongs to the reply.
fn run_turn(
    config_path: &Path,
    query: &str,
    console: &LogBuffer,
) -> Result<Result<TurnReply, RequestError>> {
    let cfg = load_config(config_path)?;
    let server = HttpGameServer::new(Duration::from_secs(cfg.server.timeout_secs))?;
    let handler = cfg.strategy.handler();
    match handle_query_buffered(&cfg, query, handler.as_ref(), &server, console) {
        Ok(reply) => Ok(Ok(reply)),
        Err(TurnError::Rejected(err)) => Ok(Err(err)),
        Err(TurnError::Failed(err)) => Err(err),
    }
}

fn cmd_turn(config_path: &Path, query: &str) -> Result<i32> {
    let console = LogBuffer::default();
    let outcome = run_turn(config_path, query, &console);
    console
        .write_to(&mut std::io::stderr().lock())
        .context("print bot log")?;
    match outcome? {
        Ok(reply) => {
            print!("{}", reply.body);
            std::io::stdout().flush().context("flush stdout")?;
            Ok(exit_codes::OK)
        }
        Err(err) => {
            eprintln!("rejected: {err}");
            Ok(exit_codes::REJECTED)
        }
    }
}

fn cmd_cgi(config_path: &Path) -> Result<i32> {
    let query = std::env::var("QUERY_STRING").unwrap_or_default();
    write_cgi(
        config_path,
        &query,
        &mut std::io::stdout().lock(),
        &mut std::io::stderr().lock(),
    )?;
    // The web server reads the status from the headers.
    Ok(exit_codes::OK)
}

/// Run one turn and write the CGI response to `out`. The bot log, when sent
/// to the console, goes to `err` (the web server's error log).
fn write_cgi(
    config_path: &Path,
    query: &str,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<()> {
    let console = LogBuffer::default();
    let response = match run_turn(config_path, query, &console) {
        Ok(Ok(reply)) => render_cgi("200 OK", &reply.body),
        Ok(Err(rejected)) if rejected.is_auth() => {
            render_cgi("403 Forbidden", &rejected.to_string())
        }
        Ok(Err(rejected)) => render_cgi("400 Bad Request", &rejected.to_string()),
        Err(failed) => {
            writeln!(err, "{failed:#}").context("write cgi error")?;
            render_cgi("500 Internal Server Error", "turn failed")
        }
    };
    out.write_all(response.as_bytes()).context("write cgi response")?;
    out.flush().context("flush cgi response")?;
    console.write_to(err).context("print bot log")?;
    Ok(())
}

fn render_cgi(status: &str, body: &str) -> String {
    format!("Status: {status}\r\nContent-Type: text/plain; charset=utf-8\r\n\r\n{body}")
}
