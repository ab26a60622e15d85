use chrono::{DateTime, Utc};

use crate::calculation::{CalendarEvent, format_ics_timestamp};

const CRLF: &str = "\r\n";

/// Escapes a TEXT property value (backslash, semicolon, comma, newline).
pub fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            c => out.push(c),
        }
    }
    out
}

/// Encodes calendar events as an iCalendar document.
///
/// Every event is stamped with `generated_at`.
///
/// ```
/// use shift_engine::export::calendar_ics;
/// use chrono::Utc;
///
/// let ics = calendar_ics(&[], "-//Shift Engine//NONSGML v1.0//EN", Utc::now());
/// assert!(ics.starts_with("BEGIN:VCALENDAR\r\nVERSION:2.0\r\n"));
/// assert!(ics.ends_with("END:VCALENDAR\r\n"));
/// ```
pub fn calendar_ics(
    events: &[CalendarEvent],
    product_id: &str,
    generated_at: DateTime<Utc>,
) -> String {
    let stamp = format_ics_timestamp(generated_at);
    let mut lines = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        format!("PRODID:{}", product_id),
    ];

    for event in events {
        lines.push("BEGIN:VEVENT".to_string());
        lines.push(format!("UID:{}", event.uid));
        lines.push(format!("DTSTAMP:{}", stamp));
        lines.push(format!("DTSTART:{}", event.start));
        lines.push(format!("DTEND:{}", event.end));
        lines.push(format!("SUMMARY:{}", escape_text(&event.summary)));
        lines.push(format!("DESCRIPTION:{}", escape_text(&event.description)));
        lines.push("END:VEVENT".to_string());
    }
    lines.push("END:VCALENDAR".to_string());

    let mut out = lines.join(CRLF);
    out.push_str(CRLF);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event() -> CalendarEvent {
        CalendarEvent {
            uid: "sch_1@shift-engine.local".to_string(),
            start: "20260119T090000Z".to_string(),
            end: "20260119T170000Z".to_string(),
            summary: "Shift - Dana".to_string(),
            description: "Front desk, then stock".to_string(),
        }
    }

    #[test]
    fn test_event_block() {
        let stamp = Utc.with_ymd_and_hms(2026, 1, 18, 12, 0, 0).unwrap();
        let ics = calendar_ics(&[event()], "-//Test//EN", stamp);
        let lines: Vec<&str> = ics.split("\r\n").collect();

        assert_eq!(
            lines,
            vec![
                "BEGIN:VCALENDAR",
                "VERSION:2.0",
                "PRODID:-//Test//EN",
                "BEGIN:VEVENT",
                "UID:sch_1@shift-engine.local",
                "DTSTAMP:20260118T120000Z",
                "DTSTART:20260119T090000Z",
                "DTEND:20260119T170000Z",
                "SUMMARY:Shift - Dana",
                "DESCRIPTION:Front desk\\, then stock",
                "END:VEVENT",
                "END:VCALENDAR",
                "",
            ]
        );
    }

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("a;b\\c\r\nd"), "a\\;b\\\\c\\nd");
    }
}
