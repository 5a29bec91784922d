//! End-to-end expansion behavior across components, rules, and ranges.

use chrono::TimeDelta;

use koyomi_model::{
    CalDateTime, CalendarComponent, Event, Journal, ModelError, RecurrenceRule, Schedulable,
    Timespan, ToDo, Weekday, WeekdayNum,
};

fn utc(day: u32, hour: u32, minute: u32) -> CalDateTime {
    CalDateTime::utc(2024, 1, day, hour, minute, 0).unwrap()
}

fn january(from_day: u32, to_day: u32) -> Timespan {
    Timespan::new(utc(from_day, 0, 0), utc(to_day, 0, 0)).unwrap()
}

fn hour_event(rule: Option<RecurrenceRule>) -> Event {
    let mut builder = Event::builder()
        .uid("event-1")
        .dtstamp(utc(1, 0, 0))
        .dtstart(utc(1, 10, 0))
        .dtend(utc(1, 11, 0))
        .summary("sync");
    if let Some(rule) = rule {
        builder = builder.rrule(rule);
    }
    builder.build()
}

#[test_log::test]
fn non_recurring_component_yields_its_single_pair() {
    let event = hour_event(None);
    let got: Vec<_> = event.occurrences(&january(1, 5)).unwrap().collect();
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].start(), &utc(1, 10, 0));
    assert_eq!(got[0].end(), &utc(1, 11, 0));
    assert_eq!(got[0].uid().unwrap(), "event-1");
}

#[test_log::test]
fn daily_count_three_in_window() {
    let event = hour_event(Some(RecurrenceRule::daily().count(3).build().unwrap()));
    let got: Vec<_> = event.occurrences(&january(1, 5)).unwrap().collect();

    let starts: Vec<_> = got.iter().map(|o| o.start().clone()).collect();
    assert_eq!(starts, vec![utc(1, 10, 0), utc(2, 10, 0), utc(3, 10, 0)]);
    for occ in &got {
        assert_eq!(occ.timespan().duration(), TimeDelta::hours(1));
    }
}

#[test_log::test]
fn exdate_removes_the_excluded_instant() {
    let event = Event::builder()
        .dtstart(utc(1, 10, 0))
        .dtend(utc(1, 11, 0))
        .rrule(RecurrenceRule::daily().count(3).build().unwrap())
        .exdate(utc(2, 10, 0))
        .build();
    let starts: Vec<_> = event
        .occurrences(&january(1, 5))
        .unwrap()
        .map(|o| o.start().clone())
        .collect();
    assert_eq!(starts, vec![utc(1, 10, 0), utc(3, 10, 0)]);
}

#[test_log::test]
fn biweekly_until_emits_every_instant_up_to_the_bound() {
    let rule = RecurrenceRule::weekly()
        .interval(2)
        .until(CalDateTime::date(2024, 2, 1).unwrap())
        .build()
        .unwrap();
    let event = Event::builder()
        .dtstart(utc(1, 10, 0))
        .dtend(utc(1, 11, 0))
        .rrule(rule)
        .build();
    let range = Timespan::new(utc(1, 0, 0), CalDateTime::utc(2024, 3, 1, 0, 0, 0).unwrap())
        .unwrap();
    let starts: Vec<_> = event
        .occurrences(&range)
        .unwrap()
        .map(|o| o.start().clone())
        .collect();
    // Jan 29 still precedes the (inclusive, end-of-day) Feb 1 bound.
    assert_eq!(starts, vec![utc(1, 10, 0), utc(15, 10, 0), utc(29, 10, 0)]);
}

#[test_log::test]
fn rdate_instants_are_included_and_merged_in_order() {
    let event = Event::builder()
        .dtstart(utc(1, 10, 0))
        .dtend(utc(1, 11, 0))
        .rrule(RecurrenceRule::daily().count(2).build().unwrap())
        .rdate(utc(1, 18, 0))
        .rdate(utc(5, 8, 0))
        .build();
    let starts: Vec<_> = event
        .occurrences(&january(1, 10))
        .unwrap()
        .map(|o| o.start().clone())
        .collect();
    assert_eq!(
        starts,
        vec![utc(1, 10, 0), utc(1, 18, 0), utc(2, 10, 0), utc(5, 8, 0)]
    );
}

#[test_log::test]
fn sequence_is_strictly_ascending_and_deduplicated() {
    // An RDATE colliding with a rule instant must appear once.
    let event = Event::builder()
        .dtstart(utc(1, 10, 0))
        .dtend(utc(1, 11, 0))
        .rrule(RecurrenceRule::daily().count(4).build().unwrap())
        .rdate(utc(2, 10, 0))
        .rdate(utc(3, 10, 0))
        .build();
    let starts: Vec<_> = event
        .occurrences(&january(1, 10))
        .unwrap()
        .map(|o| o.start().to_utc())
        .collect();
    assert_eq!(starts.len(), 4);
    assert!(starts.windows(2).all(|w| w[0] < w[1]));
}

#[test_log::test]
fn count_is_exact_across_the_whole_rule() {
    let rule = RecurrenceRule::weekly()
        .by_day(vec![
            WeekdayNum::every(Weekday::Monday),
            WeekdayNum::every(Weekday::Thursday),
        ])
        .count(5)
        .build()
        .unwrap();
    let event = Event::builder()
        .dtstart(utc(1, 9, 0))
        .dtend(utc(1, 10, 0))
        .rrule(rule)
        .build();
    let got: Vec<_> = event.occurrences(&january(1, 31)).unwrap().collect();
    // Master pair plus the rule instants after the anchor; the anchor
    // instant itself is merged into the master pair.
    assert_eq!(got.len(), 5);
    assert_eq!(got[4].start(), &utc(15, 9, 0));
}

#[test_log::test]
fn duration_identity_holds_for_every_occurrence() {
    let todo = ToDo::builder()
        .uid("todo-1")
        .dtstamp(utc(1, 0, 0))
        .dtstart(utc(2, 9, 0))
        .duration(TimeDelta::hours(3))
        .rrule(RecurrenceRule::weekly().count(3).build().unwrap())
        .build();
    let duration = todo.computed_duration().unwrap();
    for occ in todo.occurrences(&january(1, 31)).unwrap() {
        assert_eq!(
            occ.start().checked_add(duration).unwrap(),
            occ.end().clone()
        );
    }
}

#[test_log::test]
fn journal_expansion_keeps_zero_extent() {
    let journal = Journal::builder()
        .uid("journal-1")
        .dtstamp(utc(1, 0, 0))
        .dtstart(utc(3, 20, 0))
        .rrule(RecurrenceRule::daily().count(3).build().unwrap())
        .build();
    let got: Vec<_> = journal.occurrences(&january(1, 10)).unwrap().collect();
    assert_eq!(got.len(), 3);
    for occ in &got {
        assert_eq!(occ.start(), occ.end());
    }
}

#[test_log::test]
fn count_and_until_cannot_coexist() {
    let err = RecurrenceRule::daily()
        .count(3)
        .until(utc(5, 0, 0))
        .build();
    assert!(matches!(err, Err(ModelError::InvalidRecurrenceRule(_))));
}

#[test_log::test]
fn occurrence_writes_stay_local_to_the_occurrence() {
    let event = hour_event(Some(RecurrenceRule::daily().count(2).build().unwrap()));
    let mut got: Vec<_> = event.occurrences(&january(1, 5)).unwrap().collect();
    got[1].set_summary("moved to room B");
    assert_eq!(got[0].summary(), Some("sync"));
    assert_eq!(got[1].summary(), Some("moved to room B"));
    assert_eq!(event.core().summary(), Some("sync"));
}
