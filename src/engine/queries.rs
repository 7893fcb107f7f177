use chrono::NaiveDate;

use crate::model::*;

use super::{Engine, EngineError};

impl Engine {
    /// All venues in creation order.
    pub async fn list_venues(&self) -> Vec<Venue> {
        let mut venues = Vec::with_capacity(self.venues.len());
        for rs in self.venue_handles() {
            venues.push(rs.read().await.venue.clone());
        }
        venues.sort_by_key(|v| v.id);
        venues
    }

    /// Venue names, alphabetically.
    pub fn venue_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.venues.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Lectures matching `filter`, ordered by date then start time.
    pub async fn list_lectures(&self, filter: &LectureFilter) -> Vec<Lecture> {
        let mut lectures = Vec::new();
        for rs in self.venue_handles() {
            let guard = rs.read().await;
            lectures.extend(guard.lectures().filter(|l| filter.matches(l)).cloned());
        }
        lectures.sort_by(|a, b| {
            (a.slot.date, a.slot.span.start, &a.slot.venue, a.id)
                .cmp(&(b.slot.date, b.slot.span.start, &b.slot.venue, b.id))
        });
        lectures
    }

    /// Accepted slots for one venue on one date, sorted by start.
    pub async fn bookings_on(
        &self,
        venue: &str,
        date: NaiveDate,
    ) -> Result<Vec<Slot>, EngineError> {
        let rs = self
            .get_venue(venue)
            .ok_or_else(|| EngineError::UnknownVenue(venue.to_string()))?;
        let guard = rs.read().await;
        Ok(guard.bookings_on(date).iter().map(|l| l.slot.clone()).collect())
    }
}
