//! chat-speaker-rs: reads new chat messages aloud as they arrive.

mod chat;
mod config;
mod differ;
mod dispatcher;
mod error;
mod observer;
mod parser;
mod session;
mod speech;
mod voice_map;

use clap::{CommandFactory, Parser};
use std::future::Future;
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::SpeakerError;
use crate::speech::SpeechEngine;
use crate::voice_map::VoiceMode;

#[derive(Parser, Debug)]
#[command(
    name = "chat-speaker-rs",
    about = "Speaks new chat messages, optionally with a voice per speaker"
)]
struct Args {
    /// Speaker/voice pairs: <SpeakerName> <VoiceIdentifier> ... (none speaks everyone)
    #[arg(value_name = "SPEAKER VOICE")]
    pairs: Vec<String>,

    /// Path to config.yaml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the installed voices and exit
    #[arg(long)]
    list_voices: bool,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    verbose: bool,
}

fn print_voices(engine: &dyn SpeechEngine) {
    println!("Installed voices:");
    match engine.installed_voices() {
        Ok(voices) => voices.iter().for_each(|v| println!("{v}")),
        Err(e) => println!("  (unavailable: {e})"),
    }
}

/// Resolves once a line is read from `input`. The read runs on a plain
/// thread so a pending read never holds up runtime shutdown. End of input
/// or a read error leaves the future pending forever.
fn enter_pressed<R>(input: R) -> impl Future<Output = ()>
where
    R: Read + Send + 'static,
{
    let (tx, rx) = oneshot::channel::<()>();
    thread::spawn(move || {
        let mut line = String::new();
        match BufReader::new(input).read_line(&mut line) {
            Ok(n) if n > 0 => {
                let _ = tx.send(());
            }
            Ok(_) => debug!("stdin closed, only Ctrl+C stops the observer"),
            Err(e) => warn!("Failed to read stdin: {e}"),
        }
    });
    async move {
        if rx.await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Resolves on Ctrl+C or when Enter is pressed.
async fn exit_requested() {
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = enter_pressed(std::io::stdin()) => {}
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Logs go to stderr; stdout carries the chat transcript.
    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("chat-speaker-rs starting");

    let config = config::Config::load(args.config.as_deref());
    let engine = speech::from_config(&config.speech);

    if args.list_voices {
        print_voices(engine.as_ref());
        return Ok(());
    }

    let mode = match VoiceMode::from_pairs(&args.pairs) {
        Ok(mode) => mode,
        Err(SpeakerError::OddArguments(n)) => {
            info!("Rejected {n} positional arguments");
            println!("{}", Args::command().render_usage());
            print_voices(engine.as_ref());
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    match &mode {
        VoiceMode::All => info!("Voice mode: all speakers"),
        VoiceMode::Filtered(map) => {
            map.validate(&engine.installed_voices()?)?;
            for pair in args.pairs.chunks_exact(2) {
                println!("{} verbalized with {}", pair[0], pair[1]);
            }
        }
    }

    println!("Attaching to chat window...");
    let source = chat::from_config(&config.chat)?;

    let dispatcher = dispatcher::Dispatcher::new(mode, engine);
    let session = session::Session::new(source, dispatcher);
    let mut observer = observer::Observer::new(
        session,
        Duration::from_millis(config.observer.poll_interval_ms.max(1)),
    );
    observer.start()?;

    println!(
        "Ready for chat events. Set the conversation view type to Compact. \
         Press Enter or Ctrl+C to exit."
    );

    observer.run(exit_requested()).await;

    info!("chat-speaker-rs stopped");
    Ok(())
}
