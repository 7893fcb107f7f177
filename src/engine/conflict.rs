//! Booking conflict checking.
//!
//! A candidate slot conflicts with an accepted one when both sit in the same
//! venue on the same date and their half-open intervals intersect:
//! `[s1, e1)` and `[s2, e2)` overlap iff `s1 < e2 && s2 < e1`. Back-to-back
//! bookings (one ends exactly when the next starts) do not conflict, and a
//! candidate that swallows an existing booking whole does.

use crate::limits::*;
use crate::model::*;

use super::EngineError;

/// First entry of `existing` that the candidate would overlap, if any.
///
/// Entries for other venues or dates are ignored. Pure: never mutates, never fails.
pub fn find_conflict<'a, T: AsRef<Slot>>(existing: &'a [T], candidate: &Slot) -> Option<&'a T> {
    existing.iter().find(|booked| {
        let booked: &Slot = AsRef::<Slot>::as_ref(*booked);
        booked.venue == candidate.venue
            && booked.date == candidate.date
            && booked.span.overlaps(&candidate.span)
    })
}

/// Would `candidate` overlap anything in `existing`?
pub fn has_conflict<T: AsRef<Slot>>(existing: &[T], candidate: &Slot) -> bool {
    find_conflict(existing, candidate).is_some()
}

/// Checks that must pass before a lecture reaches the conflict checker.
pub(crate) fn validate_new_lecture(req: &NewLecture) -> Result<(), EngineError> {
    for (field, value) in [
        ("course", &req.course),
        ("venue", &req.venue),
        ("department", &req.department),
        ("level", &req.level),
    ] {
        if value.trim().is_empty() {
            return Err(EngineError::EmptyField(field));
        }
        if value.len() > MAX_FIELD_LEN {
            return Err(EngineError::LimitExceeded("field too long"));
        }
    }
    if req.span.start >= req.span.end {
        return Err(EngineError::InvalidSpan(req.span));
    }
    Ok(())
}

pub(crate) fn validate_venue(name: &str, capacity: u32) -> Result<(), EngineError> {
    if name.is_empty() {
        return Err(EngineError::EmptyField("name"));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(EngineError::LimitExceeded("venue name too long"));
    }
    if capacity == 0 {
        return Err(EngineError::InvalidCapacity);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_support::*;

    fn slot(venue: &str, date: &str, start: (u32, u32), end: (u32, u32)) -> Slot {
        Slot::new(venue, d(date), span(start, end))
    }

    fn lab1_nine_to_ten() -> Vec<Slot> {
        vec![slot("Lab1", "2024-01-10", (9, 0), (10, 0))]
    }

    #[test]
    fn no_matching_venue_or_date_never_conflicts() {
        let existing = vec![
            slot("Lab1", "2024-01-10", (9, 0), (10, 0)),
            slot("Lab2", "2024-01-11", (9, 0), (17, 0)),
        ];
        let candidate = slot("Hall A", "2024-01-12", (9, 0), (10, 0));
        assert!(!has_conflict(&existing, &candidate));
    }

    #[test]
    fn identical_interval_conflicts() {
        let existing = lab1_nine_to_ten();
        let candidate = slot("Lab1", "2024-01-10", (9, 0), (10, 0));
        assert!(has_conflict(&existing, &candidate));
    }

    #[test]
    fn disjoint_intervals_do_not_conflict() {
        let existing = lab1_nine_to_ten();
        assert!(!has_conflict(&existing, &slot("Lab1", "2024-01-10", (7, 0), (8, 30))));
        assert!(!has_conflict(&existing, &slot("Lab1", "2024-01-10", (8, 0), (9, 0))));
        assert!(!has_conflict(&existing, &slot("Lab1", "2024-01-10", (10, 0), (12, 0))));
        assert!(!has_conflict(&existing, &slot("Lab1", "2024-01-10", (13, 0), (14, 0))));
    }

    #[test]
    fn strict_containment_conflicts() {
        // The candidate starts before and ends after the existing booking,
        // so neither of its endpoints falls inside it.
        let existing = lab1_nine_to_ten();
        let candidate = slot("Lab1", "2024-01-10", (8, 0), (11, 0));
        assert!(has_conflict(&existing, &candidate));
    }

    #[test]
    fn candidate_inside_existing_conflicts() {
        let existing = vec![slot("Lab1", "2024-01-10", (8, 0), (12, 0))];
        assert!(has_conflict(&existing, &slot("Lab1", "2024-01-10", (9, 0), (10, 0))));
    }

    #[test]
    fn scenario_partial_overlap() {
        let existing = lab1_nine_to_ten();
        let candidate = slot("Lab1", "2024-01-10", (9, 30), (10, 30));
        assert!(has_conflict(&existing, &candidate));
    }

    #[test]
    fn scenario_touching_boundary() {
        let existing = lab1_nine_to_ten();
        let candidate = slot("Lab1", "2024-01-10", (10, 0), (11, 0));
        assert!(!has_conflict(&existing, &candidate));
    }

    #[test]
    fn scenario_other_venue_same_times() {
        let existing = lab1_nine_to_ten();
        let candidate = slot("Lab2", "2024-01-10", (9, 0), (10, 0));
        assert!(!has_conflict(&existing, &candidate));
    }

    #[test]
    fn same_venue_other_date() {
        let existing = lab1_nine_to_ten();
        let candidate = slot("Lab1", "2024-01-11", (9, 0), (10, 0));
        assert!(!has_conflict(&existing, &candidate));
    }

    #[test]
    fn repeated_calls_agree_and_leave_input_untouched() {
        let existing = vec![
            slot("Lab1", "2024-01-10", (9, 0), (10, 0)),
            slot("Lab1", "2024-01-10", (13, 0), (14, 0)),
        ];
        let snapshot = existing.clone();
        let candidate = slot("Lab1", "2024-01-10", (13, 30), (15, 0));

        let first = has_conflict(&existing, &candidate);
        let second = has_conflict(&existing, &candidate);
        assert!(first);
        assert_eq!(first, second);
        assert_eq!(existing, snapshot);
    }

    #[test]
    fn find_conflict_reports_first_overlap() {
        let existing = vec![
            slot("Lab1", "2024-01-10", (8, 0), (9, 0)),
            slot("Lab1", "2024-01-10", (10, 0), (11, 0)),
            slot("Lab1", "2024-01-10", (11, 0), (12, 0)),
        ];
        let candidate = slot("Lab1", "2024-01-10", (10, 30), (11, 30));
        let hit = find_conflict(&existing, &candidate).unwrap();
        assert_eq!(hit.span, span((10, 0), (11, 0)));
    }

    #[test]
    fn works_over_lectures() {
        let existing = vec![lecture("Lab1", "2024-01-10", (9, 0), (10, 0))];
        let candidate = slot("Lab1", "2024-01-10", (9, 59), (10, 30));
        let hit = find_conflict(&existing, &candidate).unwrap();
        assert_eq!(hit.id, existing[0].id);
    }

    #[test]
    fn empty_existing_never_conflicts() {
        let existing: Vec<Slot> = Vec::new();
        assert!(!has_conflict(&existing, &slot("Lab1", "2024-01-10", (9, 0), (10, 0))));
    }

    #[test]
    fn validate_rejects_inverted_and_empty_spans() {
        let base = NewLecture {
            course: "PHY201".into(),
            venue: "Lab1".into(),
            date: d("2024-01-10"),
            span: Span {
                start: t(10, 0),
                end: t(9, 0),
            },
            department: "Physics".into(),
            level: "200".into(),
        };
        assert!(matches!(
            validate_new_lecture(&base),
            Err(EngineError::InvalidSpan(_))
        ));

        let zero = NewLecture {
            span: Span {
                start: t(9, 0),
                end: t(9, 0),
            },
            ..base.clone()
        };
        assert!(matches!(
            validate_new_lecture(&zero),
            Err(EngineError::InvalidSpan(_))
        ));

        let blank = NewLecture {
            course: "   ".into(),
            span: span((9, 0), (10, 0)),
            ..base
        };
        assert!(matches!(
            validate_new_lecture(&blank),
            Err(EngineError::EmptyField("course"))
        ));
    }

    #[test]
    fn validate_venue_limits() {
        assert!(validate_venue("Lab1", 30).is_ok());
        assert!(matches!(validate_venue("", 30), Err(EngineError::EmptyField("name"))));
        assert!(matches!(validate_venue("Lab1", 0), Err(EngineError::InvalidCapacity)));
        let long = "x".repeat(MAX_NAME_LEN + 1);
        assert!(matches!(
            validate_venue(&long, 30),
            Err(EngineError::LimitExceeded(_))
        ));
    }
}
