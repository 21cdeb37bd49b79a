#![windows_subsystem = "windows"]
use std::thread;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use crossbeam_channel::{unbounded, Receiver, Sender};
use event::Event;
use frame_snap::{lens, monitor, util, CaptureEngine, CursorTracker, Settings, SettingsStore};
use log_error::*;
use rdev::{Button, EventType};
use time::{macros::format_description, UtcOffset};
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt::time::OffsetTime, EnvFilter};

mod cli;
mod event;

/// Hooks the mouse globally; the middle button is swallowed.
fn listen(event_tx: Sender<Event>) {
    rdev::grab(move |event| {
        let (mapped, swallow) = match event.event_type {
            EventType::ButtonPress(Button::Middle) => (None, true),
            EventType::ButtonRelease(Button::Middle) => (Some(Event::Capture), true),
            EventType::MouseMove { x, y } => (Some(Event::Move(x, y)), false),
            _ => (None, false),
        };
        if let Some(mouse_event) = mapped {
            event_tx.send(mouse_event).log_error("failed to send mouse event");
        }
        if swallow {
            None
        } else {
            Some(event)
        }
    })
    .log_error_with(|e| format!("mouse hook failed: {e:?}"));
}

fn init_logging() -> WorkerGuard {
    let file_appender = tracing_appender::rolling::never(".", "frame-snap.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    let timer = OffsetTime::new(
        offset,
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    );
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_timer(timer)
        .with_ansi(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    guard
}

/// Persists a frame spec given on the command line.
fn apply_cli(cli: &Cli, store: Option<&SettingsStore>, settings: &mut Settings) {
    let Some(spec) = cli.spec else {
        return;
    };
    settings.set_frame_spec(spec);
    if let Some(store) = store {
        store.save(settings).log_error("failed to save settings");
    }
    info!("frame spec set to {spec}");
}

fn run(events: Receiver<Event>, engine: CaptureEngine, settings: &Settings) {
    let mut tracker = CursorTracker::new(settings.frame_spec());
    info!(
        "frame spec {}, output {:?}",
        tracker.spec(),
        settings.output_mode
    );

    for event in events {
        match event {
            Event::Move(x, y) => {
                let (x, y) = lens::cursor_point(x, y);
                tracker.update(x, y, monitor::resolve(x, y));
            }
            Event::Capture => {
                let Some((rect, monitor)) = tracker.target() else {
                    warn!("capture requested before any cursor position");
                    continue;
                };
                match engine.capture_region(rect, monitor) {
                    Ok(image) => match util::deliver(&image, settings) {
                        Ok(Some(path)) => info!("saved {}", path.display()),
                        Ok(None) => info!("copied {}x{}", image.width(), image.height()),
                        Err(e) => error!("failed to deliver capture: {e:?}"),
                    },
                    Err(e) => error!("{e}"),
                }
            }
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging();
    util::enable_dpi_awareness().log_error("failed to enable DPI awareness");

    let store = SettingsStore::new().log_error("no settings location");
    let mut settings = store.as_ref().map(SettingsStore::load).unwrap_or_default();
    apply_cli(&cli, store.as_ref(), &mut settings);

    let engine = CaptureEngine::new(&settings.engine_config());
    let (event_tx, event_rx) = unbounded();
    let _mouse_handle = thread::spawn(|| listen(event_tx));

    run(event_rx, engine, &settings);
    Ok(())
}
