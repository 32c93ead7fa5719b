//! Terminal input and frame timing, read on a background task.

use std::time::Duration;

use crossterm::event::{Event as CrosstermEvent, EventStream, KeyEvent, KeyEventKind};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
pub enum Event {
    Key(KeyEvent),
    Resize(u16, u16),
    /// Slow clock for expiring status messages and ageing labels.
    Tick,
    /// Frame clock.
    Render,
}

pub struct EventReader {
    rx: mpsc::UnboundedReceiver<Event>,
    cancel: CancellationToken,
}

impl EventReader {
    /// Spawn the reader. It stops when `parent` is cancelled, when
    /// [`stop`](Self::stop) is called, or when the reader is dropped.
    pub fn spawn(tick_rate: Duration, frame_rate: Duration, parent: &CancellationToken) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = parent.child_token();
        let token = cancel.clone();

        tokio::spawn(async move {
            let mut input = EventStream::new();
            let mut ticks = interval(tick_rate);
            let mut frames = interval(frame_rate);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
            frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                let event = tokio::select! {
                    () = token.cancelled() => break,
                    _ = ticks.tick() => Event::Tick,
                    _ = frames.tick() => Event::Render,
                    maybe = input.next() => match maybe {
                        Some(Ok(CrosstermEvent::Key(key))) if key.kind == KeyEventKind::Press => {
                            Event::Key(key)
                        }
                        Some(Ok(CrosstermEvent::Resize(w, h))) => Event::Resize(w, h),
                        Some(Ok(_)) => continue,
                        Some(Err(e)) => {
                            tracing::warn!(error = %e, "terminal input error");
                            continue;
                        }
                        None => break,
                    },
                };
                if tx.send(event).is_err() {
                    break;
                }
            }
        });

        Self { rx, cancel }
    }

    /// Next event, or `None` once the reader has stopped.
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for EventReader {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
