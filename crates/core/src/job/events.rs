//! Per-job progress log with replaying subscriptions.
//!
//! The log is a `watch` channel over an append-only `Vec` plus a closed
//! flag. The producer never waits on readers; each reader keeps its own
//! cursor, so late subscribers replay the full history before going live.

use futures::Stream;
use std::collections::VecDeque;
use thiserror::Error;
use tokio::sync::watch;

use super::types::ProgressEvent;

/// Errors from appending to an [`EventLog`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventLogError {
    #[error("Event log is closed")]
    Closed,

    #[error("Progress cannot go backwards (last {last}%, got {attempted}%)")]
    Regression { last: u8, attempted: u8 },
}

#[derive(Debug, Default)]
struct LogState {
    events: Vec<ProgressEvent>,
    closed: bool,
}

/// Append-only event log owned by a job.
#[derive(Debug)]
pub struct EventLog {
    tx: watch::Sender<LogState>,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLog {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(LogState::default());
        Self { tx }
    }

    /// Append an event and wake subscribers.
    ///
    /// A terminal event closes the log; later appends fail with
    /// [`EventLogError::Closed`].
    pub fn append(&self, event: ProgressEvent) -> Result<(), EventLogError> {
        let mut result = Ok(());
        self.tx.send_if_modified(|state| {
            if state.closed {
                result = Err(EventLogError::Closed);
                return false;
            }
            if let Some(last) = state.events.last() {
                if event.percent < last.percent {
                    result = Err(EventLogError::Regression {
                        last: last.percent,
                        attempted: event.percent,
                    });
                    return false;
                }
            }
            state.closed = event.is_terminal();
            state.events.push(event);
            true
        });
        result
    }

    pub fn is_closed(&self) -> bool {
        self.tx.borrow().closed
    }

    pub fn len(&self) -> usize {
        self.tx.borrow().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn last(&self) -> Option<ProgressEvent> {
        self.tx.borrow().events.last().cloned()
    }

    /// Copy of every event appended so far.
    pub fn snapshot(&self) -> Vec<ProgressEvent> {
        self.tx.borrow().events.clone()
    }

    /// Subscribe from the beginning of the log.
    pub fn subscribe(&self) -> EventStream {
        EventStream {
            rx: self.tx.subscribe(),
            cursor: 0,
            buffered: VecDeque::new(),
            detached: false,
            finished: false,
        }
    }
}

/// A single reader's view of an [`EventLog`].
///
/// Yields the backlog, then live events, then `None` once the log is
/// closed. If the log is dropped (job reaped) the stream ends after
/// whatever was already appended.
#[derive(Debug)]
pub struct EventStream {
    rx: watch::Receiver<LogState>,
    cursor: usize,
    buffered: VecDeque<ProgressEvent>,
    detached: bool,
    finished: bool,
}

impl EventStream {
    /// Wait for the next event.
    pub async fn next_event(&mut self) -> Option<ProgressEvent> {
        loop {
            if let Some(event) = self.buffered.pop_front() {
                return Some(event);
            }
            if self.finished {
                return None;
            }

            // The borrow guard must not be held across the await below.
            let (fresh, closed) = {
                let state = self.rx.borrow_and_update();
                let fresh = state
                    .events
                    .get(self.cursor..)
                    .map(<[ProgressEvent]>::to_vec)
                    .unwrap_or_default();
                (fresh, state.closed)
            };

            if !fresh.is_empty() {
                self.cursor += fresh.len();
                self.buffered.extend(fresh);
                continue;
            }
            if closed || self.detached {
                self.finished = true;
                continue;
            }
            if self.rx.changed().await.is_err() {
                self.detached = true;
            }
        }
    }

    /// Adapt into a `futures::Stream`.
    pub fn into_stream(self) -> impl Stream<Item = ProgressEvent> + Send {
        futures::stream::unfold(self, |mut events| async move {
            events.next_event().await.map(|event| (event, events))
        })
    }

    /// Drain the stream to completion.
    pub async fn collect_all(mut self) -> Vec<ProgressEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.next_event().await {
            events.push(event);
        }
        events
    }
}
