use std::io::{self, Write};
use std::path::Path;

use anyhow::{bail, Context};
use carta_registry::ObjectManager;
use carta_server::{CartaServer, ServerConfig};
use colored::Colorize;
use serde_json::json;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Classes(_) => cmd_classes(&config, cli.format),
        Command::Run(args) => cmd_run(&config, args, cli.format),
        Command::Serve(args) => cmd_serve(config, args),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ServerConfig> {
    match path {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Ok(ServerConfig::default()),
    }
}

/// A registry with every built-in class registered.
fn new_manager(config: &ServerConfig) -> anyhow::Result<ObjectManager> {
    let mut manager = ObjectManager::new(config.manager.clone())?;
    carta_plugins::register_builtin_classes(&mut manager);
    Ok(manager)
}

fn cmd_classes(config: &ServerConfig, format: OutputFormat) -> anyhow::Result<()> {
    let manager = new_manager(config)?;
    match format {
        OutputFormat::Text => {
            for class in manager.class_names() {
                println!("{}", class.as_str().cyan());
            }
        }
        OutputFormat::Json => {
            let names: Vec<&str> = manager.class_names().map(|c| c.as_str()).collect();
            println!("{}", json!({ "classes": names }));
        }
    }
    Ok(())
}

fn cmd_run(config: &ServerConfig, args: RunArgs, format: OutputFormat) -> anyhow::Result<()> {
    let script = match &args.script {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading script {}", path.display()))?,
        None => io::read_to_string(io::stdin()).context("reading script from stdin")?,
    };

    let mut manager = new_manager(config)?;
    let session = uuid::Uuid::now_v7().to_string();
    let summary = run_script(
        &mut manager,
        &script,
        &session,
        format,
        args.keep_going,
        &mut io::stdout().lock(),
    )?;

    if let Some(path) = &args.snapshot {
        let snapshot = manager.snapshot(args.kind)?;
        snapshot.save(path)?;
        if format == OutputFormat::Text {
            println!(
                "{} Saved {} snapshot of {} objects to {}",
                "✓".green().bold(),
                args.kind,
                snapshot.objects.len(),
                path.display().to_string().bold()
            );
        }
    }

    if summary.failed > 0 {
        bail!("{} of {} commands failed", summary.failed, summary.executed);
    }
    Ok(())
}

fn cmd_serve(mut config: ServerConfig, args: ServeArgs) -> anyhow::Result<()> {
    if let Some(bind) = &args.bind {
        config.bind_addr = bind.parse().with_context(|| format!("invalid bind address {bind}"))?;
    }
    config.cors |= args.cors;

    let server = CartaServer::new(config)?;
    println!("CARTA server on {}", server.config().bind_addr.to_string().bold());
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server.serve())?;
    Ok(())
}

/// Counts from one script run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ScriptSummary {
    pub executed: usize,
    pub failed: usize,
}

/// Split a script line into command and parameters.
///
/// Returns `None` for blank lines and `#` comments.
pub fn parse_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    Some(match line.split_once(char::is_whitespace) {
        Some((command, parameters)) => (command, parameters.trim()),
        None => (line, ""),
    })
}

/// Dispatch every command in `script`, writing one reply line per command.
///
/// A failing command stops the run unless `keep_going` is set.
pub fn run_script<W: Write>(
    manager: &mut ObjectManager,
    script: &str,
    session: &str,
    format: OutputFormat,
    keep_going: bool,
    out: &mut W,
) -> anyhow::Result<ScriptSummary> {
    let mut summary = ScriptSummary::default();
    for (number, line) in script.lines().enumerate() {
        let Some((command, parameters)) = parse_line(line) else {
            continue;
        };
        summary.executed += 1;
        let reply = manager.dispatch(command, parameters, session);
        match (&reply, format) {
            (Ok(result), OutputFormat::Text) => {
                writeln!(out, "{} {} {}", "✓".green(), command.dimmed(), result)?;
            }
            (Err(e), OutputFormat::Text) => {
                writeln!(out, "{} {} {}", "✗".red().bold(), command.dimmed(), e.to_string().red())?;
            }
            (Ok(result), OutputFormat::Json) => {
                writeln!(out, "{}", json!({ "line": number + 1, "command": command, "result": result }))?;
            }
            (Err(e), OutputFormat::Json) => {
                writeln!(out, "{}", json!({ "line": number + 1, "command": command, "error": e.to_string() }))?;
            }
        }
        if let Err(e) = reply {
            summary.failed += 1;
            tracing::debug!(line = number + 1, command, error = %e, "command failed");
            if !keep_going {
                bail!("line {}: {e}", number + 1);
            }
        }
    }
    Ok(summary)
}
