mod conflict;
mod error;
mod mutations;
mod queries;

pub use conflict::{find_conflict, has_conflict};
pub use error::EngineError;

use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock, mpsc, oneshot};
use tracing::{error, info, warn};

use crate::model::*;
use crate::wal::Wal;

pub type SharedVenueState = Arc<RwLock<VenueState>>;

// ── Group-commit WAL channel ─────────────────────────────

pub(super) enum WalCommand {
    Append {
        event: Event,
        response: oneshot::Sender<io::Result<()>>,
    },
    Compact {
        events: Vec<Event>,
        response: oneshot::Sender<io::Result<()>>,
    },
    AppendsSinceCompact {
        response: oneshot::Sender<u64>,
    },
    Shutdown {
        response: oneshot::Sender<io::Result<()>>,
    },
}

/// Background task that owns the WAL and batches appends for group commit.
/// 1. Block until the first Append arrives.
/// 2. Buffer it (no fsync).
/// 3. Drain all immediately available Appends (the batch window).
/// 4. Single flush_sync for the whole batch.
/// 5. Respond to all senders.
///
/// Exits after answering a Shutdown, or when every sender is gone.
async fn wal_writer_loop(mut wal: Wal, mut rx: mpsc::Receiver<WalCommand>) {
    while let Some(cmd) = rx.recv().await {
        let WalCommand::Append { event, response } = cmd else {
            if !handle_non_append(&mut wal, cmd) {
                return;
            }
            continue;
        };

        let mut batch = vec![(event, response)];
        let mut pending = None;
        loop {
            match rx.try_recv() {
                Ok(WalCommand::Append { event, response }) => batch.push((event, response)),
                Ok(other) => {
                    pending = Some(other);
                    break;
                }
                Err(_) => break,
            }
        }

        commit_batch(&mut wal, &mut batch);
        if let Some(cmd) = pending
            && !handle_non_append(&mut wal, cmd)
        {
            return;
        }
    }
}

fn commit_batch(wal: &mut Wal, batch: &mut Vec<(Event, oneshot::Sender<io::Result<()>>)>) {
    metrics::histogram!(crate::observability::WAL_FLUSH_BATCH_SIZE).record(batch.len() as f64);
    let flush_start = std::time::Instant::now();
    let result = flush_batch(wal, batch);
    metrics::histogram!(crate::observability::WAL_FLUSH_DURATION_SECONDS)
        .record(flush_start.elapsed().as_secs_f64());
    for (_, tx) in batch.drain(..) {
        let r = match &result {
            Ok(()) => Ok(()),
            Err(e) => Err(io::Error::new(e.kind(), e.to_string())),
        };
        let _ = tx.send(r);
    }
}

/// Append and fsync a whole batch. On failure the log is cut back to where the
/// batch started: every caller is told the write failed, so none of it may
/// survive on disk.
fn flush_batch(
    wal: &mut Wal,
    batch: &[(Event, oneshot::Sender<io::Result<()>>)],
) -> io::Result<()> {
    let start = wal.synced_len()?;
    let mut result = Ok(());
    for (event, _) in batch {
        result = wal.append_buffered(event);
        if result.is_err() {
            break;
        }
    }
    let result = result.and_then(|()| wal.flush_sync());
    if result.is_err()
        && let Err(e) = wal.truncate_to(start)
    {
        error!("WAL rollback to {start} bytes failed: {e}");
    }
    result
}

/// Returns false when the writer should stop.
fn handle_non_append(wal: &mut Wal, cmd: WalCommand) -> bool {
    match cmd {
        WalCommand::Compact { events, response } => {
            let result = Wal::write_compact_file(wal.path(), &events)
                .and_then(|()| wal.swap_compact_file());
            let _ = response.send(result);
            true
        }
        WalCommand::AppendsSinceCompact { response } => {
            let _ = response.send(wal.appends_since_compact());
            true
        }
        WalCommand::Shutdown { response } => {
            let _ = response.send(wal.flush_sync());
            false
        }
        WalCommand::Append { .. } => unreachable!(),
    }
}

/// Cloneable handle on the WAL writer task, shared with commit tasks.
#[derive(Clone)]
pub(super) struct WalHandle {
    /// `None` for the in-memory store.
    tx: Option<mpsc::Sender<WalCommand>>,
    closed: Arc<AtomicBool>,
}

impl WalHandle {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Write event to WAL via the background group-commit writer.
    pub(super) async fn append(&self, event: &Event) -> Result<(), EngineError> {
        if self.is_closed() {
            return Err(EngineError::Closed);
        }
        let Some(tx) = &self.tx else {
            return Ok(());
        };
        self.request(tx, |response| WalCommand::Append {
            event: event.clone(),
            response,
        })
        .await?
        .map_err(|e| EngineError::WalError(e.to_string()))
    }

    /// Send one command to the writer and wait for its answer.
    pub(super) async fn request<T>(
        &self,
        tx: &mpsc::Sender<WalCommand>,
        command: impl FnOnce(oneshot::Sender<T>) -> WalCommand,
    ) -> Result<T, EngineError> {
        let (response, rx) = oneshot::channel();
        tx.send(command(response))
            .await
            .map_err(|_| self.writer_gone())?;
        rx.await.map_err(|_| self.writer_gone())
    }

    /// A command racing `close()` can land after the writer has exited.
    fn writer_gone(&self) -> EngineError {
        if self.is_closed() {
            EngineError::Closed
        } else {
            EngineError::WalError("WAL writer shut down".into())
        }
    }
}

/// Run a check, log and apply step on its own task. Dropping the caller's
/// future then cannot leave a logged event missing from memory.
pub(super) async fn commit<T, F>(step: F) -> Result<T, EngineError>
where
    T: Send + 'static,
    F: Future<Output = Result<T, EngineError>> + Send + 'static,
{
    tokio::spawn(step)
        .await
        .map_err(|e| EngineError::WalError(format!("commit task failed: {e}")))?
}

/// The schedule store: venues and their accepted lectures.
///
/// Each venue sits behind its own `RwLock`; a booking holds the venue's write
/// lock across the conflict check, the WAL append and the in-memory insert, so
/// two overlapping requests for the same venue can never both be accepted.
pub struct Engine {
    pub(super) venues: Arc<DashMap<String, SharedVenueState>>,
    /// Serializes venue creation and compaction snapshots.
    pub(super) catalog: Arc<Mutex<()>>,
    pub(super) wal: WalHandle,
}

/// Rebuild venue state from the WAL. Runs before the engine is shared, so no locks.
///
/// A lecture that overlaps one already replayed for its venue and date is
/// dropped: the log may hold writes whose callers were told they failed.
fn replay_events(events: Vec<Event>) -> HashMap<String, VenueState> {
    let mut venues: HashMap<String, VenueState> = HashMap::new();
    for event in events {
        match event {
            Event::VenueCreated { id, name, capacity } => {
                if venues.contains_key(&name) {
                    warn!("replay: duplicate venue {name} ignored");
                    continue;
                }
                venues.insert(name.clone(), VenueState::new(Venue { id, name, capacity }));
            }
            Event::LectureScheduled {
                id,
                venue,
                date,
                span,
                course,
                department,
                level,
            } => {
                let Some(state) = venues.get_mut(&venue) else {
                    warn!("replay: lecture {id} references unknown venue {venue}");
                    continue;
                };
                let slot = Slot::new(venue, date, span);
                if let Some(existing) = find_conflict(state.bookings_on(date), &slot) {
                    warn!(
                        "replay: lecture {id} in {} on {date} overlaps lecture {}, skipped",
                        slot.venue, existing.id
                    );
                    continue;
                }
                state.insert_lecture(Lecture {
                    id,
                    course,
                    department,
                    level,
                    slot,
                });
            }
        }
    }
    venues
}

impl Engine {
    /// Durable store: replay the WAL at `wal_path`, then append to it.
    /// Must be called inside a tokio runtime (spawns the WAL writer).
    pub fn open(wal_path: &Path) -> io::Result<Self> {
        let (wal, events) = Wal::recover(wal_path)?;
        let replayed = events.len();
        let (wal_tx, wal_rx) = mpsc::channel(4096);
        tokio::spawn(wal_writer_loop(wal, wal_rx));

        let engine = Self::from_state(replay_events(events), Some(wal_tx));
        info!(
            "opened {} ({replayed} events, {} venues)",
            wal_path.display(),
            engine.venues.len()
        );
        Ok(engine)
    }

    /// Volatile store with the same semantics and no persistence.
    pub fn in_memory() -> Self {
        Self::from_state(HashMap::new(), None)
    }

    fn from_state(
        state: HashMap<String, VenueState>,
        wal_tx: Option<mpsc::Sender<WalCommand>>,
    ) -> Self {
        let venues = DashMap::new();
        for (name, vs) in state {
            venues.insert(name, Arc::new(RwLock::new(vs)));
        }
        metrics::gauge!(crate::observability::VENUES_ACTIVE).set(venues.len() as f64);
        Self {
            venues: Arc::new(venues),
            catalog: Arc::new(Mutex::new(())),
            wal: WalHandle {
                tx: wal_tx,
                closed: Arc::new(AtomicBool::new(false)),
            },
        }
    }

    pub fn is_durable(&self) -> bool {
        self.wal.tx.is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.wal.is_closed()
    }

    /// Flush and stop the WAL writer. Reads still work afterwards; writes fail
    /// with [`EngineError::Closed`]. Closing twice is a no-op.
    pub async fn close(&self) -> Result<(), EngineError> {
        if self.wal.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let Some(wal_tx) = &self.wal.tx else {
            return Ok(());
        };
        let (tx, rx) = oneshot::channel();
        wal_tx
            .send(WalCommand::Shutdown { response: tx })
            .await
            .map_err(|_| EngineError::WalError("WAL writer shut down".into()))?;
        rx.await
            .map_err(|_| EngineError::WalError("WAL writer dropped response".into()))?
            .map_err(|e| EngineError::WalError(e.to_string()))
    }

    pub fn get_venue(&self, name: &str) -> Option<SharedVenueState> {
        self.venues.get(name).map(|e| e.value().clone())
    }

    pub fn venue_count(&self) -> usize {
        self.venues.len()
    }

    /// Clone out every venue handle so no DashMap shard guard is held across an await.
    pub(super) fn venue_handles(&self) -> Vec<SharedVenueState> {
        self.venues.iter().map(|e| e.value().clone()).collect()
    }
}
