use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;
use ulid::Ulid;

use crate::limits::*;
use crate::model::*;

use super::conflict::{find_conflict, validate_new_lecture, validate_venue};
use super::{Engine, EngineError, WalCommand, commit};

impl Engine {
    pub async fn create_venue(&self, name: &str, capacity: u32) -> Result<Venue, EngineError> {
        let name = name.trim();
        validate_venue(name, capacity)?;

        let catalog = self.catalog.clone().lock_owned().await;
        if self.venues.contains_key(name) {
            return Err(EngineError::VenueExists(name.to_string()));
        }
        if self.venues.len() >= MAX_VENUES {
            return Err(EngineError::LimitExceeded("too many venues"));
        }

        let venue = Venue {
            id: Ulid::new(),
            name: name.to_string(),
            capacity,
        };
        let event = Event::VenueCreated {
            id: venue.id,
            name: venue.name.clone(),
            capacity,
        };
        let venues = self.venues.clone();
        let wal = self.wal.clone();
        commit(async move {
            let _catalog = catalog;
            wal.append(&event).await?;
            venues.insert(
                venue.name.clone(),
                Arc::new(RwLock::new(VenueState::new(venue.clone()))),
            );
            metrics::gauge!(crate::observability::VENUES_ACTIVE).set(venues.len() as f64);
            Ok(venue)
        })
        .await
    }

    /// Check the candidate against the venue's bookings for that date and, if
    /// it is free, persist it. Both happen under the venue's write lock.
    pub async fn schedule_lecture(&self, req: NewLecture) -> Result<Lecture, EngineError> {
        validate_new_lecture(&req)?;
        let rs = self
            .get_venue(&req.venue)
            .ok_or_else(|| EngineError::UnknownVenue(req.venue.clone()))?;
        let mut guard = rs.write_owned().await;
        let wal = self.wal.clone();
        commit(async move {
            if guard.lecture_count() >= MAX_LECTURES_PER_VENUE {
                return Err(EngineError::LimitExceeded("too many lectures on venue"));
            }

            let candidate = req.slot();
            if let Some(existing) = find_conflict(guard.bookings_on(req.date), &candidate) {
                debug!(
                    "rejecting {} in {} on {}: overlaps lecture {}",
                    req.course, req.venue, req.date, existing.id
                );
                return Err(EngineError::Conflict {
                    venue: req.venue,
                    date: req.date,
                    existing: existing.slot.span,
                });
            }

            let lecture = Lecture {
                id: Ulid::new(),
                course: req.course,
                department: req.department,
                level: req.level,
                slot: candidate,
            };
            wal.append(&Event::lecture_scheduled(&lecture)).await?;
            guard.insert_lecture(lecture.clone());
            Ok(lecture)
        })
        .await
    }

    /// Rewrite the WAL with only the events needed to recreate the current state.
    ///
    /// Holds the catalog lock and every venue's read lock until the swap is done,
    /// so no append can land between the snapshot and the rename.
    pub async fn compact_wal(&self) -> Result<(), EngineError> {
        if self.is_closed() {
            return Err(EngineError::Closed);
        }
        let Some(wal_tx) = &self.wal.tx else {
            return Ok(());
        };

        let _catalog = self.catalog.lock().await;
        let mut guards = Vec::with_capacity(self.venues.len());
        for rs in self.venue_handles() {
            guards.push(rs.read_owned().await);
        }
        guards.sort_by_key(|g| g.venue.id);

        let mut events = Vec::new();
        for guard in &guards {
            events.push(Event::VenueCreated {
                id: guard.venue.id,
                name: guard.venue.name.clone(),
                capacity: guard.venue.capacity,
            });
            events.extend(guard.lectures().map(Event::lecture_scheduled));
        }

        self.wal
            .request(wal_tx, |response| WalCommand::Compact { events, response })
            .await?
            .map_err(|e| EngineError::WalError(e.to_string()))
    }

    /// Appends since the last compaction. Always 0 for the in-memory store.
    pub async fn wal_appends_since_compact(&self) -> u64 {
        let Some(wal_tx) = &self.wal.tx else {
            return 0;
        };
        self.wal
            .request(wal_tx, |response| WalCommand::AppendsSinceCompact { response })
            .await
            .unwrap_or(0)
    }
}
