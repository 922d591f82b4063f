use std::io::IsTerminal;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use tokio::sync::mpsc;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// `q` or Ctrl-C
    Quit,
    /// `p` or space
    Pause,
}

/// Reads single key presses from a raw-mode terminal on a helper thread.
pub struct InputHandle {
    rx: mpsc::UnboundedReceiver<Key>,
    tx: Option<mpsc::UnboundedSender<Key>>,
    stop: Arc<AtomicBool>,
}

impl InputHandle {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            rx,
            tx: Some(tx),
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Starts listening. Does nothing when stdin isn't a terminal.
    pub fn start(&mut self) {
        if !std::io::stdin().is_terminal() {
            return;
        }
        let Some(tx) = self.tx.take() else {
            return;
        };
        let stop = self.stop.clone();
        thread::spawn(move || {
            if enable_raw_mode().is_err() {
                return;
            }
            while !stop.load(Ordering::Relaxed) && !tx.is_closed() {
                if !event::poll(POLL_INTERVAL).unwrap_or(false) {
                    continue;
                }
                let Ok(Event::Key(key_event)) = event::read() else {
                    continue;
                };
                if key_event.kind != KeyEventKind::Press {
                    continue;
                }
                let key = match key_event.code {
                    KeyCode::Char('q') => Some(Key::Quit),
                    KeyCode::Char('c') if key_event.modifiers.contains(KeyModifiers::CONTROL) => {
                        Some(Key::Quit)
                    }
                    KeyCode::Char('p') | KeyCode::Char(' ') => Some(Key::Pause),
                    _ => None,
                };
                if let Some(key) = key
                    && tx.send(key).is_err()
                {
                    break;
                }
            }
            let _ = disable_raw_mode();
        });
    }

    /// Waits for the next key. Pends forever if input was never started.
    pub async fn next_key(&mut self) -> Key {
        match self.rx.recv().await {
            Some(key) => key,
            None => std::future::pending().await,
        }
    }
}

impl Drop for InputHandle {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        let _ = disable_raw_mode();
    }
}
