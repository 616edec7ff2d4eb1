//! Alarm and station records as served by the LightUpPi backend

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Days of the week an alarm repeats on. Flags are independent; any subset is valid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weekdays {
    #[serde(default)]
    pub monday: bool,
    #[serde(default)]
    pub tuesday: bool,
    #[serde(default)]
    pub wednesday: bool,
    #[serde(default)]
    pub thursday: bool,
    #[serde(default)]
    pub friday: bool,
    #[serde(default)]
    pub saturday: bool,
    #[serde(default)]
    pub sunday: bool,
}

impl Weekdays {
    pub const NAMES: [&'static str; 7] = [
        "monday",
        "tuesday",
        "wednesday",
        "thursday",
        "friday",
        "saturday",
        "sunday",
    ];

    pub fn from_array(days: [bool; 7]) -> Self {
        let [monday, tuesday, wednesday, thursday, friday, saturday, sunday] = days;
        Self {
            monday,
            tuesday,
            wednesday,
            thursday,
            friday,
            saturday,
            sunday,
        }
    }

    pub fn as_array(&self) -> [bool; 7] {
        [
            self.monday,
            self.tuesday,
            self.wednesday,
            self.thursday,
            self.friday,
            self.saturday,
            self.sunday,
        ]
    }

    /// Query parameters in the form the backend expects (`monday=true`, ...)
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        Self::NAMES
            .iter()
            .zip(self.as_array())
            .map(|(name, on)| (*name, on.to_string()))
            .collect()
    }

    /// Compact one-letter-per-day rendering, `-` for days the alarm skips
    pub fn summary(&self) -> String {
        "MTWTFSS"
            .chars()
            .zip(self.as_array())
            .map(|(letter, on)| if on { letter } else { '-' })
            .collect()
    }
}

/// An alarm stored on the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alarm {
    pub id: i64,
    pub hour: u8,
    pub minute: u8,
    #[serde(flatten)]
    pub days: Weekdays,
    pub enabled: bool,
    #[serde(default)]
    pub label: String,
    /// Creation time in seconds since the epoch, assigned by the backend
    #[serde(default, deserialize_with = "null_as_zero")]
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub station_id: Option<i64>,
}

impl Alarm {
    /// `HH:MM` rendering of the alarm time
    pub fn time_label(&self) -> String {
        format!("{}:{}", zero_pad(self.hour), zero_pad(self.minute))
    }
}

impl fmt::Display for Alarm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Alarm {} at {} [{}] {}{}",
            self.id,
            self.time_label(),
            self.days.summary(),
            if self.enabled { "on" } else { "off" },
            if self.label.is_empty() {
                String::new()
            } else {
                format!(" \"{}\"", self.label)
            }
        )
    }
}

/// A radio stream the alarms can play
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    pub id: i64,
    pub name: String,
    pub url: String,
}

/// Fields of the add-alarm form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAlarm {
    pub hour: u8,
    pub minute: u8,
    #[serde(flatten)]
    pub days: Weekdays,
    #[serde(default)]
    pub label: String,
}

impl NewAlarm {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("hour", self.hour.to_string()),
            ("minute", self.minute.to_string()),
        ];
        pairs.extend(self.days.query_pairs());
        pairs.push(("label", self.label.clone()));
        pairs
    }
}

/// Partial alarm update; only the fields that are set are sent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmPatch {
    #[serde(default)]
    pub hour: Option<u8>,
    #[serde(default)]
    pub minute: Option<u8>,
    #[serde(default)]
    pub days: Option<Weekdays>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub label: Option<String>,
}

impl AlarmPatch {
    pub fn enabled(enabled: bool) -> Self {
        Self {
            enabled: Some(enabled),
            ..Self::default()
        }
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(hour) = self.hour {
            pairs.push(("hour", hour.to_string()));
        }
        if let Some(minute) = self.minute {
            pairs.push(("minute", minute.to_string()));
        }
        if let Some(days) = &self.days {
            pairs.extend(days.query_pairs());
        }
        if let Some(enabled) = self.enabled {
            pairs.push(("enabled", enabled.to_string()));
        }
        if let Some(label) = &self.label {
            pairs.push(("label", label.clone()));
        }
        pairs
    }
}

/// Input fields of the add-station form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
}

impl StationForm {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    pub fn clear(&mut self) {
        self.name.clear();
        self.url.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.url.is_empty()
    }
}

/// A server-owned collection fetched as a whole from a `get<Name>?id=all` endpoint
pub trait Collection: Send + Sync + 'static {
    type Item: Clone + fmt::Debug + Serialize + DeserializeOwned + PartialEq + Send + Sync + 'static;

    /// Name used in logs
    const NAME: &'static str;
    /// Endpoint that lists the collection
    const ENDPOINT: &'static str;
    /// Response field holding the items
    const FIELD: &'static str;
}

/// Marker for the alarm collection
#[derive(Debug)]
pub struct Alarms;

impl Collection for Alarms {
    type Item = Alarm;
    const NAME: &'static str = "alarms";
    const ENDPOINT: &'static str = "getAlarm";
    const FIELD: &'static str = "alarms";
}

/// Marker for the station collection
#[derive(Debug)]
pub struct Stations;

impl Collection for Stations {
    type Item = Station;
    const NAME: &'static str = "stations";
    const ENDPOINT: &'static str = "getStation";
    const FIELD: &'static str = "stations";
}

/// Render a number with at least two digits (7 -> "07")
pub fn zero_pad<N: fmt::Display>(n: N) -> String {
    format!("{:0>2}", n)
}

/// The two alarms shown when the backend cannot be reached
pub fn demo_alarms() -> Vec<Alarm> {
    vec![
        Alarm {
            id: 1,
            hour: 7,
            minute: 30,
            days: Weekdays::from_array([true, true, true, true, true, false, false]),
            enabled: true,
            label: "Fake default alarm 1".to_string(),
            timestamp: 0,
            station_id: None,
        },
        Alarm {
            id: 2,
            hour: 9,
            minute: 0,
            days: Weekdays::from_array([false, false, false, false, false, true, true]),
            enabled: false,
            label: "Fake default alarm 2".to_string(),
            timestamp: 0,
            station_id: None,
        },
    ]
}

fn null_as_zero<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<i64>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn zero_pad_examples() {
        assert_eq!(zero_pad(7), "07");
        assert_eq!(zero_pad(12), "12");
        assert_eq!(zero_pad(0), "00");
        assert_eq!(zero_pad(123), "123");
    }

    proptest! {
        #[test]
        fn zero_pad_keeps_value_and_pads_to_two(n in 0u32..100_000) {
            let padded = zero_pad(n);
            prop_assert_eq!(padded.parse::<u32>().unwrap(), n);
            prop_assert_eq!(padded.len(), n.to_string().len().max(2));
        }
    }

    #[test]
    fn parse_backend_alarm() {
        let json = r#"{
            "id": 3,
            "hour": 6,
            "minute": 5,
            "enabled": true,
            "label": "Work",
            "timestamp": 1430000000,
            "monday": true,
            "tuesday": false,
            "wednesday": true,
            "thursday": false,
            "friday": true,
            "saturday": false,
            "sunday": false,
            "station_id": 1
        }"#;

        let alarm: Alarm = serde_json::from_str(json).unwrap();
        assert_eq!(alarm.id, 3);
        assert_eq!(alarm.time_label(), "06:05");
        assert_eq!(alarm.days.summary(), "M-W-F--");
        assert_eq!(alarm.timestamp, 1430000000);
        assert_eq!(alarm.station_id, Some(1));
    }

    #[test]
    fn parse_alarm_with_null_timestamp_and_no_station() {
        let json = r#"{
            "id": 1, "hour": 23, "minute": 59, "enabled": false,
            "label": "", "timestamp": null
        }"#;

        let alarm: Alarm = serde_json::from_str(json).unwrap();
        assert_eq!(alarm.timestamp, 0);
        assert_eq!(alarm.station_id, None);
        assert_eq!(alarm.days, Weekdays::default());
    }

    #[test]
    fn weekdays_array_order_starts_on_monday() {
        let days = Weekdays::from_array([true, false, false, false, false, false, true]);
        assert!(days.monday);
        assert!(days.sunday);
        assert!(days.as_array()[6]);
        assert_eq!(days.summary(), "M-----S");
    }

    #[test]
    fn new_alarm_query_has_all_days() {
        let alarm = NewAlarm {
            hour: 7,
            minute: 30,
            days: Weekdays::from_array([true, false, false, false, false, false, false]),
            label: "Test".to_string(),
        };
        let pairs = alarm.query_pairs();
        assert_eq!(pairs.len(), 10);
        assert!(pairs.contains(&("hour", "7".to_string())));
        assert!(pairs.contains(&("minute", "30".to_string())));
        assert!(pairs.contains(&("monday", "true".to_string())));
        assert!(pairs.contains(&("sunday", "false".to_string())));
        assert!(pairs.contains(&("label", "Test".to_string())));
    }

    #[test]
    fn patch_only_sends_present_fields() {
        assert_eq!(
            AlarmPatch::enabled(false).query_pairs(),
            vec![("enabled", "false".to_string())]
        );

        let patch = AlarmPatch {
            minute: Some(15),
            label: Some("Later".to_string()),
            ..AlarmPatch::default()
        };
        assert_eq!(
            patch.query_pairs(),
            vec![
                ("minute", "15".to_string()),
                ("label", "Later".to_string())
            ]
        );
    }

    #[test]
    fn station_form_clear() {
        let mut form = StationForm::new("BBC Radio 4", "http://example.com/r4.mp3");
        assert!(!form.is_empty());
        form.clear();
        assert!(form.is_empty());
    }

    #[test]
    fn demo_alarms_are_the_two_defaults() {
        let demo = demo_alarms();
        assert_eq!(demo.len(), 2);
        assert_eq!(demo[0].id, 1);
        assert_eq!(demo[0].label, "Fake default alarm 1");
        assert_eq!(demo[1].id, 2);
        assert_eq!(demo[1].label, "Fake default alarm 2");
    }

    #[test]
    fn alarm_display() {
        let alarm = &demo_alarms()[0];
        assert_eq!(
            alarm.to_string(),
            "Alarm 1 at 07:30 [MTWTF--] on \"Fake default alarm 1\""
        );
    }
}
