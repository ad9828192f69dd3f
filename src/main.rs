mod cli;
mod meter;

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

use bandscope::config::{self, SessionConfig};
use bandscope::Session;
use cli::Cli;
use meter::Meter;

enum Command {
    Toggle,
    Load(PathBuf),
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
    match word {
        "t" | "toggle" => Some(Command::Toggle),
        "l" | "load" if !rest.trim().is_empty() => Some(Command::Load(PathBuf::from(rest.trim()))),
        "q" | "quit" => Some(Command::Quit),
        _ => None,
    }
}

/// Reads commands from stdin on its own thread so the display loop never
/// waits on the terminal.
fn spawn_command_reader() -> Receiver<Command> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            match parse_command(&line) {
                Some(cmd) => {
                    if tx.send(cmd).is_err() {
                        break;
                    }
                }
                None => log::warn!("Unknown command {:?} (t = toggle, l <path> = load, q = quit)", line),
            }
        }
    });
    rx
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut cli = Cli::parse();

    // Config values apply only when the CLI is at its default
    let config_path = cli.config.clone().or_else(config::find_config);
    if let Some(ref path) = config_path {
        if let Some(cfg) = config::load_config(path) {
            log::info!("Loaded config from {}", path.display());
            if cli.sample_rate == config::default_sample_rate() { cli.sample_rate = cfg.audio.sample_rate; }
            if cli.frames == config::default_frames_per_block() { cli.frames = cfg.audio.frames_per_block; }
            if cli.channels == config::default_channels() { cli.channels = cfg.audio.channels; }
            if cli.bands == config::default_bands() { cli.bands = cfg.audio.bands; }
            if cli.fps == config::default_fps() { cli.fps = cfg.display.fps; }
        } else {
            log::warn!("Failed to load config from {}", path.display());
        }
    }

    let requested = SessionConfig {
        sample_rate: cli.sample_rate,
        frames_per_block: cli.frames,
        channels: cli.channels,
        bands: cli.bands,
    };

    log::info!("bandscope - live spectrum analyzer");
    log::info!(
        "Requested: {}Hz, {} frames/block ({:.1}ms), {} channel(s), {} bands",
        requested.sample_rate,
        requested.frames_per_block,
        requested.block_duration_secs() * 1000.0,
        requested.channels,
        requested.bands
    );

    let mut session = Session::start(requested).context("Failed to initialize audio processor")?;

    if let Some(ref path) = cli.file {
        match session.processor_mut().load_file(path) {
            Ok(()) => log::info!("Audio file loaded successfully: {}", path.display()),
            Err(err) => log::error!("Failed to load audio file: {}", err),
        }
    }

    let commands = spawn_command_reader();
    let frame_time = Duration::from_secs_f32(1.0 / cli.fps.max(1) as f32);
    let deadline = cli.seconds.map(|s| Instant::now() + Duration::from_secs_f32(s.max(0.0)));
    let mut meter = Meter::new();
    let mut stdout = std::io::stdout();

    loop {
        let frame_start = Instant::now();

        while let Ok(cmd) = commands.try_recv() {
            let processor = session.processor_mut();
            match cmd {
                Command::Toggle => match processor.toggle_source() {
                    Ok(kind) => log::info!("Source: {}", kind),
                    Err(err) => log::warn!("Could not switch source: {}", err),
                },
                Command::Load(path) => match processor.load_file(&path) {
                    Ok(()) => log::info!("Audio file loaded successfully: {}", path.display()),
                    Err(err) => log::error!("Failed to load audio file: {}", err),
                },
                Command::Quit => {
                    writeln!(stdout)?;
                    return session.stop().context("Failed to stop audio session");
                }
            }
        }

        let processor = session.processor_mut();
        let line = meter.render(processor.process());
        write!(stdout, "\r{:<12} |{}|", processor.active_source().to_string(), line)?;
        stdout.flush()?;

        if deadline.is_some_and(|d| Instant::now() >= d) {
            break;
        }

        if let Some(rest) = frame_time.checked_sub(frame_start.elapsed()) {
            thread::sleep(rest);
        }
    }

    writeln!(stdout)?;
    session.stop().context("Failed to stop audio session")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert!(matches!(parse_command("t"), Some(Command::Toggle)));
        assert!(matches!(parse_command(" toggle "), Some(Command::Toggle)));
        assert!(matches!(parse_command("q"), Some(Command::Quit)));
        match parse_command("l /tmp/song one.wav") {
            Some(Command::Load(path)) => assert_eq!(path, PathBuf::from("/tmp/song one.wav")),
            _ => panic!("expected load command"),
        }
        assert!(parse_command("l").is_none());
        assert!(parse_command("dance").is_none());
    }
}
