//! Telemetry decoding
//!
//! Maps the gateway's flat list of (code, value) readings into a typed
//! snapshot. Decoding never fails: unknown codes are ignored and values
//! that resist coercion are carried through as text.

use serde::Serialize;

use crate::gwm::models::TelemetryItem;

/// A telemetry value after best-effort numeric coercion
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TelemetryValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl TelemetryValue {
    /// Coerce a raw JSON value: digit-only strings become integers,
    /// numbers pass through, anything else is kept as text.
    pub fn coerce(raw: &serde_json::Value) -> Self {
        match raw {
            serde_json::Value::String(s) => {
                if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) {
                    match s.parse::<i64>() {
                        Ok(n) => TelemetryValue::Integer(n),
                        Err(_) => TelemetryValue::Text(s.clone()),
                    }
                } else {
                    TelemetryValue::Text(s.clone())
                }
            }
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => TelemetryValue::Integer(i),
                None => TelemetryValue::Float(n.as_f64().unwrap_or_default()),
            },
            other => TelemetryValue::Text(other.to_string()),
        }
    }

    /// Integral view used by the boolean and enum transforms
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            TelemetryValue::Integer(i) => Some(*i),
            TelemetryValue::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }
}

impl std::fmt::Display for TelemetryValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TelemetryValue::Integer(i) => write!(f, "{}", i),
            TelemetryValue::Float(v) => write!(f, "{}", v),
            TelemetryValue::Text(s) => f.write_str(s),
        }
    }
}

/// Engine state reported under code 2016001
#[derive(Debug, Clone, PartialEq)]
pub enum EngineState {
    Off,
    Starting,
    Running,
    Unknown(String),
}

impl EngineState {
    pub fn from_value(value: &TelemetryValue) -> Self {
        match value.as_i64() {
            Some(0) => EngineState::Off,
            Some(1) => EngineState::Starting,
            Some(2) => EngineState::Running,
            Some(n) => EngineState::Unknown(n.to_string()),
            None => EngineState::Unknown(value.to_string()),
        }
    }
}

impl std::fmt::Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineState::Off => f.write_str("off"),
            EngineState::Starting => f.write_str("starting"),
            EngineState::Running => f.write_str("running"),
            EngineState::Unknown(raw) => write!(f, "unknown_{}", raw),
        }
    }
}

impl Serialize for EngineState {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Decoded view of one poll's telemetry items.
///
/// Every field defaults to absent; a field only carries a value when its
/// code appeared in the item list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub battery_12v_level: Option<TelemetryValue>,
    pub fuel_volume: Option<TelemetryValue>,
    pub mileage: Option<TelemetryValue>,
    pub fuel_range: Option<TelemetryValue>,

    pub tire_pressure_fl: Option<TelemetryValue>,
    pub tire_pressure_fr: Option<TelemetryValue>,
    pub tire_pressure_rl: Option<TelemetryValue>,
    pub tire_pressure_rr: Option<TelemetryValue>,
    pub tire_temp_fl: Option<TelemetryValue>,
    pub tire_temp_fr: Option<TelemetryValue>,
    pub tire_temp_rl: Option<TelemetryValue>,
    pub tire_temp_rr: Option<TelemetryValue>,

    pub engine_state: Option<EngineState>,
    pub doors_locked: Option<bool>,
    pub door_trunk: Option<bool>,
    pub door_front_left: Option<bool>,
    pub door_rear_left: Option<bool>,
    pub door_front_right: Option<bool>,
    pub door_rear_right: Option<bool>,
    pub hood: Option<bool>,

    pub air_conditioner: Option<bool>,
    pub sunroof_position: Option<TelemetryValue>,

    pub gps_authorized: Option<bool>,
    pub signal_strength: Option<TelemetryValue>,
}

/// Decode a raw item list into a snapshot. Pure; unknown codes are ignored.
pub fn decode(items: &[TelemetryItem]) -> StatusSnapshot {
    let mut snapshot = StatusSnapshot::default();

    for item in items {
        let value = TelemetryValue::coerce(&item.value);

        match item.code.as_str() {
            "2013005" => snapshot.battery_12v_level = Some(value),
            "2017002" => snapshot.fuel_volume = Some(value),
            "2103010" => snapshot.mileage = Some(value),
            "2011007" => snapshot.fuel_range = Some(value),

            "2101001" => snapshot.tire_pressure_fl = Some(value),
            "2101002" => snapshot.tire_pressure_fr = Some(value),
            "2101003" => snapshot.tire_pressure_rl = Some(value),
            "2101004" => snapshot.tire_pressure_rr = Some(value),
            "2101005" => snapshot.tire_temp_fl = Some(value),
            "2101006" => snapshot.tire_temp_fr = Some(value),
            "2101007" => snapshot.tire_temp_rl = Some(value),
            "2101008" => snapshot.tire_temp_rr = Some(value),

            "2016001" => snapshot.engine_state = Some(EngineState::from_value(&value)),
            // 0 means locked on the wire
            "2208001" => snapshot.doors_locked = Some(value.as_i64() == Some(0)),
            "2206001" => snapshot.door_trunk = Some(is_set(&value)),
            "2206002" => snapshot.door_front_left = Some(is_set(&value)),
            "2206003" => snapshot.door_rear_left = Some(is_set(&value)),
            "2206004" => snapshot.door_front_right = Some(is_set(&value)),
            "2206005" => snapshot.door_rear_right = Some(is_set(&value)),
            "2212001" => snapshot.hood = Some(is_set(&value)),

            "2202001" => snapshot.air_conditioner = Some(is_set(&value)),
            // 3 is the closed position; anything else is a percentage
            "2210005" => {
                snapshot.sunroof_position = Some(if value.as_i64() == Some(3) {
                    TelemetryValue::Integer(0)
                } else {
                    value
                })
            }

            "2310001" => snapshot.gps_authorized = Some(is_set(&value)),
            "4105008" => snapshot.signal_strength = Some(value),

            _ => {}
        }
    }

    snapshot
}

fn is_set(value: &TelemetryValue) -> bool {
    value.as_i64() == Some(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(code: &str, value: serde_json::Value) -> TelemetryItem {
        TelemetryItem::new(code, value)
    }

    #[test]
    fn test_unknown_codes_leave_snapshot_empty() {
        let items = vec![item("9999999", json!("42")), item("1234567", json!(1))];
        assert_eq!(decode(&items), StatusSnapshot::default());
    }

    #[test]
    fn test_decode_is_idempotent() {
        let items = vec![
            item("2103010", json!("12345")),
            item("2016001", json!("2")),
            item("2208001", json!("0")),
        ];
        let first = decode(&items);
        let second = decode(&items);
        assert_eq!(first, second);
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(TelemetryValue::coerce(&json!("12345")), TelemetryValue::Integer(12345));
        assert_eq!(TelemetryValue::coerce(&json!(7)), TelemetryValue::Integer(7));
        assert_eq!(TelemetryValue::coerce(&json!(2.5)), TelemetryValue::Float(2.5));
        assert_eq!(
            TelemetryValue::coerce(&json!("12.5")),
            TelemetryValue::Text("12.5".to_string())
        );
        assert_eq!(
            TelemetryValue::coerce(&json!("N/A")),
            TelemetryValue::Text("N/A".to_string())
        );
    }

    #[test]
    fn test_door_lock_polarity() {
        let locked = decode(&[item("2208001", json!("0"))]);
        assert_eq!(locked.doors_locked, Some(true));

        let unlocked = decode(&[item("2208001", json!("1"))]);
        assert_eq!(unlocked.doors_locked, Some(false));
    }

    #[test]
    fn test_door_and_hood_booleans() {
        let snapshot = decode(&[
            item("2206001", json!("1")),
            item("2206002", json!("0")),
            item("2212001", json!(1)),
        ]);
        assert_eq!(snapshot.door_trunk, Some(true));
        assert_eq!(snapshot.door_front_left, Some(false));
        assert_eq!(snapshot.hood, Some(true));
        assert_eq!(snapshot.door_rear_left, None);
    }

    #[test]
    fn test_sunroof_closed_position() {
        let closed = decode(&[item("2210005", json!("3"))]);
        assert_eq!(closed.sunroof_position, Some(TelemetryValue::Integer(0)));

        let open = decode(&[item("2210005", json!("45"))]);
        assert_eq!(open.sunroof_position, Some(TelemetryValue::Integer(45)));
    }

    #[test]
    fn test_engine_state_mapping() {
        assert_eq!(
            decode(&[item("2016001", json!("0"))]).engine_state,
            Some(EngineState::Off)
        );
        assert_eq!(
            decode(&[item("2016001", json!("1"))]).engine_state,
            Some(EngineState::Starting)
        );
        assert_eq!(
            decode(&[item("2016001", json!("2"))]).engine_state,
            Some(EngineState::Running)
        );
        assert_eq!(
            decode(&[item("2016001", json!("9"))]).engine_state.map(|s| s.to_string()),
            Some("unknown_9".to_string())
        );
    }

    #[test]
    fn test_engine_state_serializes_as_text() {
        assert_eq!(
            serde_json::to_value(EngineState::Running).unwrap(),
            json!("running")
        );
    }

    #[test]
    fn test_tires_and_levels() {
        let snapshot = decode(&[
            item("2013005", json!("87")),
            item("2017002", json!(52)),
            item("2011007", json!("430")),
            item("2101001", json!("230")),
            item("2101006", json!("31")),
            item("4105008", json!(4)),
        ]);
        assert_eq!(snapshot.battery_12v_level, Some(TelemetryValue::Integer(87)));
        assert_eq!(snapshot.fuel_volume, Some(TelemetryValue::Integer(52)));
        assert_eq!(snapshot.fuel_range, Some(TelemetryValue::Integer(430)));
        assert_eq!(snapshot.tire_pressure_fl, Some(TelemetryValue::Integer(230)));
        assert_eq!(snapshot.tire_temp_fr, Some(TelemetryValue::Integer(31)));
        assert_eq!(snapshot.signal_strength, Some(TelemetryValue::Integer(4)));
    }

    #[test]
    fn test_malformed_values_pass_through() {
        let snapshot = decode(&[item("2103010", json!("not-a-number"))]);
        assert_eq!(
            snapshot.mileage,
            Some(TelemetryValue::Text("not-a-number".to_string()))
        );

        // Text value never equals 1, so booleans come out false
        let doors = decode(&[item("2206001", json!("open"))]);
        assert_eq!(doors.door_trunk, Some(false));
    }
}
