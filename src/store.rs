//! The storage contract the HTTP layer is written against.

use async_trait::async_trait;

use crate::engine::{Engine, EngineError};
use crate::model::*;

/// Venue catalog + lecture bookings with an explicit lifecycle.
///
/// `schedule_lecture` must perform the conflict check and the insert as one
/// atomic step: of two overlapping requests for the same venue and date, at
/// most one may succeed.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    async fn list_venues(&self) -> Result<Vec<Venue>, EngineError>;

    async fn venue_names(&self) -> Result<Vec<String>, EngineError>;

    async fn create_venue(&self, name: &str, capacity: u32) -> Result<Venue, EngineError>;

    async fn list_lectures(&self, filter: &LectureFilter) -> Result<Vec<Lecture>, EngineError>;

    async fn schedule_lecture(&self, req: NewLecture) -> Result<Lecture, EngineError>;

    /// Flush and release the backing storage. Writes fail afterwards.
    async fn close(&self) -> Result<(), EngineError>;
}

#[async_trait]
impl ScheduleStore for Engine {
    async fn list_venues(&self) -> Result<Vec<Venue>, EngineError> {
        Ok(Engine::list_venues(self).await)
    }

    async fn venue_names(&self) -> Result<Vec<String>, EngineError> {
        Ok(Engine::venue_names(self))
    }

    async fn create_venue(&self, name: &str, capacity: u32) -> Result<Venue, EngineError> {
        Engine::create_venue(self, name, capacity).await
    }

    async fn list_lectures(&self, filter: &LectureFilter) -> Result<Vec<Lecture>, EngineError> {
        Ok(Engine::list_lectures(self, filter).await)
    }

    async fn schedule_lecture(&self, req: NewLecture) -> Result<Lecture, EngineError> {
        Engine::schedule_lecture(self, req).await
    }

    async fn close(&self) -> Result<(), EngineError> {
        Engine::close(self).await
    }
}
