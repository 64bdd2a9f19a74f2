//! Interactive session loop.
//!
//! Reads operator commands from stdin and drives the session controller.
//! This layer owns no state of its own.

use std::sync::Arc;

use anyhow::Result;
use courier_session::{SessionController, SessionMode};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use crate::export;

const HELP: &str = "\
commands:
  import <path>             queue numbers from a file (newline/comma/semicolon separated)
  add <numbers>             queue numbers given inline
  start [auto]              start a session (auto = timed advance)
  next                      dispatch the next number
  stop                      stop the running session
  resend                    requeue all completed numbers
  status                    show session state and queue counts
  export [--dated] [path]   write completed numbers as CSV
  help                      show this help
  quit                      exit";

pub async fn run(controller: Arc<SessionController>, flag_value: String) -> Result<()> {
    println!("courier session ready — type 'help' for commands");

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !handle_command(&controller, &flag_value, line.trim()).await {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("received shutdown signal");
                break;
            }
        }
    }

    controller.stop().await;
    Ok(())
}

/// Handle one command line. Returns `false` when the loop should exit.
async fn handle_command(
    controller: &Arc<SessionController>,
    flag_value: &str,
    line: &str,
) -> bool {
    let (cmd, rest) = match line.split_once(char::is_whitespace) {
        Some((cmd, rest)) => (cmd, rest.trim()),
        None => (line, ""),
    };

    match cmd {
        "" => {}
        "import" => {
            if rest.is_empty() {
                println!("usage: import <path>");
                return true;
            }
            match tokio::fs::read_to_string(rest).await {
                Ok(block) => {
                    let added = controller.import(&block).await;
                    println!("queued {added} numbers");
                }
                Err(e) => println!("cannot read {rest}: {e}"),
            }
        }
        "add" => {
            let added = controller.import(rest).await;
            println!("queued {added} numbers");
        }
        "start" => {
            let mode = if rest == "auto" {
                SessionMode::Auto
            } else {
                SessionMode::Manual
            };
            if controller.start(mode).await {
                println!("session started ({})", mode.display_name());
            } else {
                println!("nothing to start (already running or queue empty)");
            }
        }
        "next" => {
            if !controller.advance().await {
                println!("nothing to dispatch (idle or queue empty)");
            }
        }
        "stop" => {
            controller.stop().await;
            println!("session stopped");
        }
        "resend" => {
            let moved = controller.resend().await;
            println!("requeued {moved} numbers");
        }
        "status" => {
            let s = controller.status().await;
            println!(
                "state: {} ({})  batch: {}  pending: {}  completed: {}",
                s.state.display_name(),
                s.mode.display_name(),
                s.batch_count,
                s.pending,
                s.completed
            );
        }
        "export" => {
            let mut dated = false;
            let mut path: Option<String> = None;
            for arg in rest.split_whitespace() {
                if arg == "--dated" {
                    dated = true;
                } else {
                    path = Some(arg.to_string());
                }
            }

            let completed = controller.completed().await;
            if completed.is_empty() {
                println!("no completed numbers to export");
                return true;
            }
            let csv = if dated {
                export::dated_report_csv(&completed, flag_value)
            } else {
                export::crm_import_csv(&completed, flag_value)
            };
            let path = path.unwrap_or_else(|| export::default_export_path(dated));
            match tokio::fs::write(&path, csv).await {
                Ok(()) => println!("wrote {} rows to {path}", completed.len()),
                Err(e) => println!("export failed: {e}"),
            }
        }
        "help" => println!("{HELP}"),
        "quit" | "exit" => return false,
        other => println!("unknown command '{other}' — type 'help'"),
    }

    true
}
