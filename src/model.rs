use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Half-open time-of-day interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl Span {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        debug_assert!(start < end, "Span start must be before end");
        Self { start, end }
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// One occupation of a venue: the unit the conflict checker compares.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slot {
    pub venue: String,
    pub date: NaiveDate,
    pub span: Span,
}

impl Slot {
    pub fn new(venue: impl Into<String>, date: NaiveDate, span: Span) -> Self {
        Self {
            venue: venue.into(),
            date,
            span,
        }
    }
}

impl AsRef<Slot> for Slot {
    fn as_ref(&self) -> &Slot {
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Venue {
    pub id: Ulid,
    pub name: String,
    /// Seat count. Informational only; a venue hosts one lecture at a time.
    pub capacity: u32,
}

/// An accepted booking. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lecture {
    pub id: Ulid,
    pub course: String,
    pub department: String,
    pub level: String,
    pub slot: Slot,
}

impl AsRef<Slot> for Lecture {
    fn as_ref(&self) -> &Slot {
        &self.slot
    }
}

/// A validated-shape request to book a venue. Semantic checks happen in the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLecture {
    pub course: String,
    pub venue: String,
    pub date: NaiveDate,
    pub span: Span,
    pub department: String,
    pub level: String,
}

impl NewLecture {
    pub fn slot(&self) -> Slot {
        Slot::new(self.venue.clone(), self.date, self.span)
    }
}

/// Optional filters for listing lectures. Empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LectureFilter {
    pub department: Option<String>,
    pub level: Option<String>,
}

impl LectureFilter {
    pub fn matches(&self, lecture: &Lecture) -> bool {
        self.department
            .as_deref()
            .is_none_or(|d| d == lecture.department)
            && self.level.as_deref().is_none_or(|l| l == lecture.level)
    }
}

#[derive(Debug, Clone)]
pub struct VenueState {
    pub venue: Venue,
    /// Accepted lectures per date, each day sorted by `span.start`.
    pub days: BTreeMap<NaiveDate, Vec<Lecture>>,
    lecture_count: usize,
}

impl VenueState {
    pub fn new(venue: Venue) -> Self {
        Self {
            venue,
            days: BTreeMap::new(),
            lecture_count: 0,
        }
    }

    pub fn lecture_count(&self) -> usize {
        self.lecture_count
    }

    /// Insert a lecture keeping its day sorted by start time.
    pub fn insert_lecture(&mut self, lecture: Lecture) {
        let day = self.days.entry(lecture.slot.date).or_default();
        let pos = day
            .binary_search_by_key(&lecture.slot.span.start, |l| l.slot.span.start)
            .unwrap_or_else(|e| e);
        day.insert(pos, lecture);
        self.lecture_count += 1;
    }

    /// Lectures booked on `date`, sorted by start.
    pub fn bookings_on(&self, date: NaiveDate) -> &[Lecture] {
        self.days.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All lectures in (date, start) order.
    pub fn lectures(&self) -> impl Iterator<Item = &Lecture> {
        self.days.values().flatten()
    }
}

/// The event types: flat, no nesting. This is the WAL record format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    VenueCreated {
        id: Ulid,
        name: String,
        capacity: u32,
    },
    LectureScheduled {
        id: Ulid,
        venue: String,
        date: NaiveDate,
        span: Span,
        course: String,
        department: String,
        level: String,
    },
}

impl Event {
    pub fn lecture_scheduled(lecture: &Lecture) -> Self {
        Event::LectureScheduled {
            id: lecture.id,
            venue: lecture.slot.venue.clone(),
            date: lecture.slot.date,
            span: lecture.slot.span,
            course: lecture.course.clone(),
            department: lecture.department.clone(),
            level: lecture.level.clone(),
        }
    }
}
