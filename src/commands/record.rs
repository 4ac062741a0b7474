//! Interactive recorder.
//!
//! Runs the recorder screen: a session controller drives capture, the live
//! waveform and the recordings list, while keys and SIGUSR1 toggle recording.

use crate::config::VoxmemoConfig;
use crate::recording::{CpalMicrophone, SessionController};
use crate::storage;
use crate::ui::{parse_color, ErrorScreen, RecorderScreen, RecorderView, UiAction};
use anyhow::anyhow;
use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Redraw period while idle; also how often SIGUSR1 is checked.
const HOUSEKEEPING_PERIOD: Duration = Duration::from_millis(100);

/// Runs the recorder until the user quits.
///
/// Quitting while recording stops the session and saves the recording first.
///
/// # Errors
/// - If the configuration cannot be loaded (shown on an error screen first)
/// - If the terminal cannot be initialized or drawn
pub async fn handle_record() -> anyhow::Result<()> {
    tracing::info!("=== voxmemo recorder started ===");

    let config = match VoxmemoConfig::load() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("Failed to load configuration: {err}");
            let message = format!(
                "{err}\n\nPlease check your ~/.config/voxmemo/voxmemo.toml file and try again."
            );
            let mut error_screen = ErrorScreen::new()?;
            error_screen.show("Configuration Error", &message)?;
            error_screen.cleanup()?;
            return Err(anyhow!("Configuration error: {err}"));
        }
    };

    tracing::info!(
        "Configuration loaded: device={}, sample_rate={}Hz, fps={}, storage={}",
        config.audio.device,
        config.audio.sample_rate,
        config.waveform.fps,
        config.storage.backend
    );

    let fill = parse_color(&config.waveform.color)
        .ok_or_else(|| anyhow!("Invalid waveform color '{}'", config.waveform.color))?;
    let view = RecorderView::new(
        f32::from(config.waveform.width),
        f32::from(config.waveform.height),
        fill,
    );
    let store = storage::open_store(config.storage.backend, &storage::data_dir()?);
    let microphone = CpalMicrophone::new(config.audio.device.clone(), config.audio.sample_rate);

    let mut controller = SessionController::new(microphone, store, view, config.waveform.fps);
    controller.restore();

    let external_toggle = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGUSR1, external_toggle.clone())
        .map_err(|e| anyhow!("Failed to register signal handler: {e}"))?;

    let mut screen = RecorderScreen::new()?;
    let mut keys = spawn_key_reader();
    let mut housekeeping = tokio::time::interval(HOUSEKEEPING_PERIOD);
    housekeeping.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    screen.draw(controller.presenter_mut())?;

    loop {
        tokio::select! {
            event = controller.next_event() => {
                controller.handle_event(event);
            }
            key = keys.recv() => {
                let Some(key) = key else {
                    tracing::warn!("Terminal input closed");
                    break;
                };
                match controller.presenter_mut().handle_key(key) {
                    Some(UiAction::Toggle) => {
                        controller.toggle().await;
                    }
                    Some(UiAction::Delete(id)) => {
                        controller.delete(id);
                    }
                    Some(UiAction::Quit) => break,
                    None => {}
                }
            }
            _ = housekeeping.tick() => {
                if external_toggle.swap(false, Ordering::Relaxed) {
                    tracing::info!("Received SIGUSR1: toggling recording");
                    controller.toggle().await;
                }
            }
        }
        screen.draw(controller.presenter_mut())?;
    }

    controller.shutdown().await;
    screen.cleanup()?;

    tracing::info!("=== voxmemo recorder exited ===");
    Ok(())
}

/// Forwards key presses from a blocking reader thread.
///
/// The thread ends once the receiver is dropped.
fn spawn_key_reader() -> mpsc::UnboundedReceiver<KeyEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        while !tx.is_closed() {
            match event::poll(HOUSEKEEPING_PERIOD) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                        if tx.send(key).is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::error!("Input handling error: {}", e);
                        break;
                    }
                },
                Ok(false) => {}
                Err(e) => {
                    tracing::error!("Input handling error: {}", e);
                    break;
                }
            }
        }
    });
    rx
}
