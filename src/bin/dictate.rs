//! Dictation CLI
//!
//! Streams the microphone to the realtime endpoint and prints the text as it
//! is composed and committed.
//!
//! Commands on stdin: `s` stop after the current utterance, `r` restart,
//! `q` quit.

use anyhow::{bail, Context, Result};
use crossbeam_channel::{select, unbounded, Receiver};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use realtime_dictation::{
    audio::list_input_devices,
    config::AppConfig,
    session::{ControllerInput, DictationEvent, LiveSessionFactory, TurnController},
};

struct Args {
    list_devices: bool,
    config: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut args = Args {
        list_devices: false,
        config: None,
    };

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--list-devices" => args.list_devices = true,
            "--config" => {
                let path = iter.next().context("--config needs a path")?;
                args.config = Some(PathBuf::from(path));
            }
            other => bail!("Unknown argument: {}", other),
        }
    }
    Ok(args)
}

fn print_devices() {
    println!("\n=== Input Devices ===");
    for device in list_input_devices() {
        let default_marker = if device.is_default { " [DEFAULT]" } else { "" };
        println!("  {}{}", device.name, default_marker);
        println!("    Sample rates: {:?}", device.sample_rates);
        println!("    Channels: {:?}", device.channels);
    }
    println!();
}

fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = unbounded();
    std::thread::Builder::new()
        .name("stdin".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line.trim().to_string()).is_err() {
                    break;
                }
            }
        })
        .ok();
    rx
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = parse_args()?;
    if args.list_devices {
        print_devices();
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => AppConfig::load_or_default()?,
    };

    let api_key = std::env::var("OPENAI_API_KEY").context("OPENAI_API_KEY is not set")?;
    let model = config.session.model.clone();
    let instructions = config.session.instructions.clone();

    // The websocket lives on the runtime; this thread owns the controller
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("dictate-net")
        .build()?;

    let (inbox_tx, inbox) = unbounded::<ControllerInput>();
    let (output_tx, output) = unbounded::<DictationEvent>();
    let factory = LiveSessionFactory::new(runtime.handle().clone(), config);
    let mut controller = TurnController::new(factory, Arc::new(inbox_tx), output_tx);

    let commands = spawn_stdin_reader();

    tracing::info!("Starting dictation - s: stop, r: restart, q: quit");
    controller.start(&api_key, &model, &instructions);

    let mut stdout = std::io::stdout();
    loop {
        select! {
            recv(inbox) -> input => {
                let Ok(input) = input else { break };
                controller.handle(input);
            }
            recv(output) -> event => {
                let Ok(event) = event else { break };
                match event {
                    DictationEvent::StateChanged(state) => {
                        tracing::info!("State: {}", state);
                    }
                    DictationEvent::ComposingText(text) => {
                        print!("\r\x1b[2K{}", text);
                        stdout.flush().ok();
                    }
                    DictationEvent::CommitText(text) => {
                        println!("\r\x1b[2K{}", text);
                    }
                    DictationEvent::Error(message) => {
                        eprintln!("error: {}", message);
                    }
                }
            }
            recv(commands) -> command => {
                match command.as_deref() {
                    Ok("s") => controller.stop(),
                    Ok("r") => {
                        if !controller.start(&api_key, &model, &instructions) {
                            println!("Session still active ({})", controller.state());
                        }
                    }
                    Ok("q") | Err(_) => break,
                    Ok("") => {}
                    Ok(other) => println!("Unknown command: {}", other),
                }
            }
        }
    }

    controller.cleanup();
    drop(controller);
    runtime.shutdown_timeout(std::time::Duration::from_secs(1));
    tracing::info!("Dictation stopped");
    Ok(())
}
