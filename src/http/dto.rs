//! Request and response bodies, and their conversion to domain types.

use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::model::{Lecture, LectureFilter, NewLecture, Span, Venue};

use super::error::AppError;

pub const VENUE_FIELDS_REQUIRED: &str = "Name and capacity are required";
pub const LECTURE_FIELDS_REQUIRED: &str = "All fields are required";

/// A field clients send either as a JSON string or a JSON number (`"100"` or `100`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TextOrNumber {
    Text(String),
    Number(serde_json::Number),
}

impl TextOrNumber {
    /// Trimmed text, `None` if blank.
    fn into_text(self) -> Option<String> {
        match self {
            TextOrNumber::Text(s) => non_blank(s),
            TextOrNumber::Number(n) => Some(n.to_string()),
        }
    }
}

fn non_blank(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == s.len() {
        Some(s)
    } else {
        Some(trimmed.to_string())
    }
}

pub fn parse_date(s: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("invalid date {s:?}, expected YYYY-MM-DD")))
}

/// Accepts `HH:MM` and `HH:MM:SS`.
pub fn parse_time(s: &str) -> Result<NaiveTime, AppError> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .map_err(|_| AppError::BadRequest(format!("invalid time {s:?}, expected HH:MM")))
}

/// `HH:MM`, or `HH:MM:SS` when the seconds are not zero.
pub fn format_time(t: NaiveTime) -> String {
    if t.second() == 0 {
        t.format("%H:%M").to_string()
    } else {
        t.format("%H:%M:%S").to_string()
    }
}

// ── Venues ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateVenueRequest {
    pub name: Option<String>,
    pub capacity: Option<TextOrNumber>,
}

impl CreateVenueRequest {
    pub fn into_parts(self) -> Result<(String, u32), AppError> {
        let (Some(name), Some(capacity)) = (
            self.name.and_then(non_blank),
            self.capacity.and_then(TextOrNumber::into_text),
        ) else {
            return Err(AppError::MissingFields(VENUE_FIELDS_REQUIRED));
        };
        let capacity: u32 = capacity
            .parse()
            .ok()
            .filter(|c| *c > 0)
            .ok_or_else(|| AppError::BadRequest("capacity must be a positive integer".into()))?;
        Ok((name, capacity))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VenueCreatedResponse {
    pub message: String,
    pub venue: Venue,
}

// ── Lectures ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateLectureRequest {
    pub course: Option<TextOrNumber>,
    pub venue: Option<String>,
    pub date: Option<String>,
    pub start: Option<String>,
    #[serde(alias = "end_time")]
    pub end: Option<String>,
    pub department: Option<String>,
    pub level: Option<TextOrNumber>,
}

impl CreateLectureRequest {
    /// All seven fields must be present and non-blank before anything is parsed.
    pub fn into_new_lecture(self) -> Result<NewLecture, AppError> {
        let (
            Some(course),
            Some(venue),
            Some(date),
            Some(start),
            Some(end),
            Some(department),
            Some(level),
        ) = (
            self.course.and_then(TextOrNumber::into_text),
            self.venue.and_then(non_blank),
            self.date.and_then(non_blank),
            self.start.and_then(non_blank),
            self.end.and_then(non_blank),
            self.department.and_then(non_blank),
            self.level.and_then(TextOrNumber::into_text),
        )
        else {
            return Err(AppError::MissingFields(LECTURE_FIELDS_REQUIRED));
        };

        let date = parse_date(&date)?;
        let start = parse_time(&start)?;
        let end = parse_time(&end)?;
        if start >= end {
            return Err(AppError::BadRequest("start must be before end".into()));
        }

        Ok(NewLecture {
            course,
            venue,
            date,
            span: Span::new(start, end),
            department,
            level,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LectureDto {
    pub id: Ulid,
    pub course: String,
    pub venue: String,
    pub date: NaiveDate,
    pub start: String,
    pub end_time: String,
    pub department: String,
    pub level: String,
}

impl From<Lecture> for LectureDto {
    fn from(l: Lecture) -> Self {
        Self {
            id: l.id,
            course: l.course,
            start: format_time(l.slot.span.start),
            end_time: format_time(l.slot.span.end),
            venue: l.slot.venue,
            date: l.slot.date,
            department: l.department,
            level: l.level,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LectureCreatedResponse {
    pub message: String,
    pub lecture: LectureDto,
}

#[derive(Debug, Default, Deserialize)]
pub struct LectureQuery {
    pub department: Option<String>,
    pub level: Option<String>,
}

impl From<LectureQuery> for LectureFilter {
    fn from(q: LectureQuery) -> Self {
        Self {
            department: q.department.and_then(non_blank),
            level: q.level.and_then(non_blank),
        }
    }
}

// ── Lecturer token ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct VerifyTokenRequest {
    pub token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyTokenResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ── Health ───────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub venues: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lecture_request(body: serde_json::Value) -> CreateLectureRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn lecture_request_accepts_end_time_alias_and_numeric_level() {
        let req = lecture_request(json!({
            "course": "CSC101",
            "venue": "Lab1",
            "date": "2024-01-10",
            "start": "09:00",
            "end_time": "10:30",
            "department": "Computer Science",
            "level": 100
        }));
        let lecture = req.into_new_lecture().unwrap();
        assert_eq!(lecture.level, "100");
        assert_eq!(lecture.span.end, NaiveTime::from_hms_opt(10, 30, 0).unwrap());
    }

    #[test]
    fn lecture_request_missing_or_blank_field() {
        let missing = lecture_request(json!({
            "course": "CSC101",
            "venue": "Lab1",
            "date": "2024-01-10",
            "start": "09:00",
            "end": "10:00",
            "department": "Computer Science"
        }));
        assert!(matches!(
            missing.into_new_lecture(),
            Err(AppError::MissingFields(LECTURE_FIELDS_REQUIRED))
        ));

        let blank = lecture_request(json!({
            "course": "CSC101",
            "venue": "  ",
            "date": "2024-01-10",
            "start": "09:00",
            "end": "10:00",
            "department": "Computer Science",
            "level": "100"
        }));
        assert!(matches!(blank.into_new_lecture(), Err(AppError::MissingFields(_))));
    }

    #[test]
    fn lecture_request_rejects_bad_formats_and_inverted_times() {
        let bad_date = lecture_request(json!({
            "course": "C", "venue": "Lab1", "date": "10/01/2024",
            "start": "09:00", "end": "10:00", "department": "D", "level": "1"
        }));
        assert!(matches!(bad_date.into_new_lecture(), Err(AppError::BadRequest(_))));

        let bad_time = lecture_request(json!({
            "course": "C", "venue": "Lab1", "date": "2024-01-10",
            "start": "9am", "end": "10:00", "department": "D", "level": "1"
        }));
        assert!(matches!(bad_time.into_new_lecture(), Err(AppError::BadRequest(_))));

        let inverted = lecture_request(json!({
            "course": "C", "venue": "Lab1", "date": "2024-01-10",
            "start": "11:00", "end": "10:00", "department": "D", "level": "1"
        }));
        assert!(matches!(inverted.into_new_lecture(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn times_accept_seconds() {
        assert_eq!(
            parse_time("09:00:00").unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap()
        );
        assert_eq!(format_time(parse_time("09:00:00").unwrap()), "09:00");
        assert_eq!(format_time(parse_time("09:00:30").unwrap()), "09:00:30");
    }

    #[test]
    fn venue_request_capacity_forms() {
        let req: CreateVenueRequest =
            serde_json::from_value(json!({"name": "Lab1", "capacity": "40"})).unwrap();
        assert_eq!(req.into_parts().unwrap(), ("Lab1".to_string(), 40));

        let req: CreateVenueRequest =
            serde_json::from_value(json!({"name": "Lab1", "capacity": 0})).unwrap();
        assert!(matches!(req.into_parts(), Err(AppError::BadRequest(_))));

        let req: CreateVenueRequest = serde_json::from_value(json!({"name": "Lab1"})).unwrap();
        assert!(matches!(
            req.into_parts(),
            Err(AppError::MissingFields(VENUE_FIELDS_REQUIRED))
        ));
    }

    #[test]
    fn lecture_dto_shape() {
        let lecture = Lecture {
            id: Ulid::new(),
            course: "CSC101".into(),
            department: "Computer Science".into(),
            level: "100".into(),
            slot: crate::model::Slot::new(
                "Lab1",
                parse_date("2024-01-10").unwrap(),
                Span::new(parse_time("09:00").unwrap(), parse_time("10:00").unwrap()),
            ),
        };
        let value = serde_json::to_value(LectureDto::from(lecture)).unwrap();
        assert_eq!(value["date"], "2024-01-10");
        assert_eq!(value["start"], "09:00");
        assert_eq!(value["end_time"], "10:00");
        assert_eq!(value["venue"], "Lab1");
    }

    #[test]
    fn blank_query_params_do_not_filter() {
        let filter: LectureFilter = LectureQuery {
            department: Some(" ".into()),
            level: Some("100".into()),
        }
        .into();
        assert_eq!(filter.department, None);
        assert_eq!(filter.level.as_deref(), Some("100"));
    }
}
