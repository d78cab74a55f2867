use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// A session timestamp as read back from storage.
///
/// Stored sessions may carry dates written by older builds or edited by hand,
/// so an unparseable value is kept verbatim instead of being coerced to "now".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionTime {
    Valid(DateTime<Utc>),
    Invalid(String),
}

impl SessionTime {
    pub fn parse(raw: &str) -> Self {
        DateTime::parse_from_rfc3339(raw.trim())
            .map(|dt| SessionTime::Valid(dt.with_timezone(&Utc)))
            .unwrap_or_else(|_| SessionTime::Invalid(raw.to_string()))
    }

    pub fn from_millis(millis: i64) -> Self {
        match Utc.timestamp_millis_opt(millis).single() {
            Some(dt) => SessionTime::Valid(dt),
            None => SessionTime::Invalid(millis.to_string()),
        }
    }

    fn missing() -> Self {
        SessionTime::Invalid(String::new())
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            SessionTime::Valid(dt) => Some(*dt),
            SessionTime::Invalid(_) => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, SessionTime::Valid(_))
    }
}

impl From<DateTime<Utc>> for SessionTime {
    fn from(value: DateTime<Utc>) -> Self {
        SessionTime::Valid(value)
    }
}

impl Serialize for SessionTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SessionTime::Valid(dt) => {
                serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            SessionTime::Invalid(raw) => serializer.serialize_str(raw),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTime {
    Text(String),
    Millis(i64),
    Other(Value),
}

impl<'de> Deserialize<'de> for SessionTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawTime::deserialize(deserializer)? {
            RawTime::Text(raw) => SessionTime::parse(&raw),
            RawTime::Millis(millis) => SessionTime::from_millis(millis),
            RawTime::Other(value) => SessionTime::Invalid(value.to_string()),
        })
    }
}

/// Metadata ids are written as text, but older payloads may hold numbers.
/// Shapes that cannot be read as text are dropped rather than failing the
/// whole session.
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    })
}

fn lenient_rate<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let rate = match Value::deserialize(deserializer)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().replace(',', ".").parse::<f64>().ok(),
        _ => None,
    };
    Ok(rate.filter(|rate| rate.is_finite()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampIssue {
    InvalidStart,
    InvalidEnd,
    EndBeforeStart,
}

impl TimestampIssue {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimestampIssue::InvalidStart => "session start date invalid",
            TimestampIssue::InvalidEnd => "session end date invalid",
            TimestampIssue::EndBeforeStart => "session end precedes start",
        }
    }
}

/// An active or past parking session. `end: None` means "until stopped".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default = "SessionTime::missing")]
    pub start: SessionTime,
    #[serde(default)]
    pub end: Option<SessionTime>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub zone: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub zone_uid: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub plate: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_rate",
        skip_serializing_if = "Option::is_none"
    )]
    pub rate: Option<f64>,
    /// Metadata written by other callers, carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Session {
    pub fn new(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Self {
        Self {
            id: None,
            start: SessionTime::Valid(start),
            end: end.map(SessionTime::Valid),
            zone: None,
            zone_uid: None,
            plate: None,
            rate: None,
            extra: Map::new(),
        }
    }

    pub fn is_until_stopped(&self) -> bool {
        self.end.is_none()
    }

    pub fn start_at(&self) -> Option<DateTime<Utc>> {
        self.start.as_datetime()
    }

    pub fn end_at(&self) -> Option<DateTime<Utc>> {
        self.end.as_ref().and_then(SessionTime::as_datetime)
    }

    pub fn timestamp_issues(&self) -> Vec<TimestampIssue> {
        let mut issues = Vec::new();
        if !self.start.is_valid() {
            issues.push(TimestampIssue::InvalidStart);
        }
        if let Some(end) = &self.end {
            if !end.is_valid() {
                issues.push(TimestampIssue::InvalidEnd);
            }
        }
        if let (Some(start), Some(end)) = (self.start_at(), self.end_at()) {
            if end < start {
                issues.push(TimestampIssue::EndBeforeStart);
            }
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json_with_millisecond_dates() {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();
        let mut session = Session::new(start, None);
        session.zone = Some("12100".into());

        let raw = serde_json::to_string(&session).expect("serialize");
        assert!(raw.contains("\"start\":\"2025-03-01T09:30:00.000Z\""));
        assert!(raw.contains("\"end\":null"));

        let back: Session = serde_json::from_str(&raw).expect("deserialize");
        assert_eq!(back, session);
        assert!(back.is_until_stopped());
    }

    #[test]
    fn unparseable_dates_are_kept_and_flagged() {
        let session: Session = serde_json::from_str(
            r#"{"start":"yesterday-ish","end":"2025-03-01T10:00:00Z","zone":"A"}"#,
        )
        .expect("lenient parse");

        assert_eq!(session.start, SessionTime::Invalid("yesterday-ish".into()));
        assert_eq!(session.timestamp_issues(), vec![TimestampIssue::InvalidStart]);
    }

    #[test]
    fn epoch_millis_are_accepted() {
        let session: Session =
            serde_json::from_str(r#"{"start":1740821400000}"#).expect("numeric start");
        assert_eq!(
            session.start_at(),
            Some(Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap())
        );
    }

    #[test]
    fn end_before_start_is_reported() {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let session = Session::new(start, Some(end));
        assert_eq!(session.timestamp_issues(), vec![TimestampIssue::EndBeforeStart]);
    }

    #[test]
    fn unknown_metadata_survives() {
        let session: Session =
            serde_json::from_str(r#"{"start":"2025-03-01T09:30:00Z","tariffCode":"T7"}"#)
                .expect("parse");
        assert_eq!(session.extra.get("tariffCode"), Some(&Value::from("T7")));
        let raw = serde_json::to_string(&session).expect("serialize");
        assert!(raw.contains("\"tariffCode\":\"T7\""));
    }

    #[test]
    fn mistyped_metadata_does_not_reject_the_session() {
        let session: Session = serde_json::from_str(
            r#"{"start":"2025-03-01T09:30:00Z","end":null,"zone":12100,"zoneUid":{"n":1},"plate":"XX99ZZ","rate":"2,50","id":7}"#,
        )
        .expect("lenient metadata");

        assert_eq!(session.zone.as_deref(), Some("12100"));
        assert_eq!(session.zone_uid, None);
        assert_eq!(session.plate.as_deref(), Some("XX99ZZ"));
        assert_eq!(session.rate, Some(2.5));
        assert_eq!(session.id.as_deref(), Some("7"));
        assert!(session.timestamp_issues().is_empty());
    }
}
