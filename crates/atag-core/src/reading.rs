// ── Sensor readings ──
//
// Converts a decoded retrieve reply into the flat list of readings pushed
// at the sink. Room temperature, target temperature, and the boiler status
// bitmask are mandatory -- without them the whole batch is rejected (the
// reply is unusable). Extended telemetry is per-field optional: each value
// is pushed when present and silently skipped otherwise.

use serde::Serialize;
use tracing::debug;

use atag_api::{Report, RetrieveReply, flame_on};

use crate::error::CoreError;

/// Logical identity of one published value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKey {
    RoomTemp,
    TargetTemp,
    OutsideTemp,
    BurningHours,
    ChSetpoint,
    DhwWaterTemp,
    ChWaterTemp,
    ChWaterPressure,
    ChReturnTemp,
}

impl SensorKey {
    /// Human-readable label for tables and logs.
    pub fn label(self) -> &'static str {
        match self {
            Self::RoomTemp => "Room temperature",
            Self::TargetTemp => "Target temperature",
            Self::OutsideTemp => "Outside temperature",
            Self::BurningHours => "Burning hours",
            Self::ChSetpoint => "CH setpoint",
            Self::DhwWaterTemp => "DHW water temperature",
            Self::ChWaterTemp => "CH water temperature",
            Self::ChWaterPressure => "CH water pressure",
            Self::ChReturnTemp => "CH return temperature",
        }
    }

    /// Unit suffix for display.
    pub fn unit(self) -> &'static str {
        match self {
            Self::BurningHours => "h",
            Self::ChWaterPressure => "bar",
            _ => "°C",
        }
    }
}

/// One published value, produced per poll cycle and immediately forwarded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub key: SensorKey,
    pub value: f64,
    /// Pre-formatted display string (one decimal).
    pub display: String,
    /// Flame-active flag; attached only to the target-temperature reading.
    pub flame: Option<bool>,
}

impl Reading {
    pub fn new(key: SensorKey, value: f64) -> Self {
        Self {
            key,
            value,
            display: format!("{value:.1}"),
            flame: None,
        }
    }

    pub fn with_flame(mut self, flame: bool) -> Self {
        self.flame = Some(flame);
        self
    }
}

/// Extract the reading batch from a retrieve reply.
///
/// Errors if the mandatory fields (`report.room_temp`, `control.ch_mode_temp`,
/// `report.boiler_status`) are missing; optional telemetry never fails the
/// batch.
pub fn extract_readings(reply: &RetrieveReply) -> Result<Vec<Reading>, CoreError> {
    let report = reply.report.as_ref().ok_or_else(|| missing("report"))?;
    let control = reply.control.as_ref().ok_or_else(|| missing("control"))?;

    let room_temp = report.room_temp.ok_or_else(|| missing("report.room_temp"))?;
    let target_temp = control
        .ch_mode_temp
        .ok_or_else(|| missing("control.ch_mode_temp"))?;
    let boiler_status = report
        .boiler_status
        .ok_or_else(|| missing("report.boiler_status"))?;

    let mut readings = vec![
        Reading::new(SensorKey::TargetTemp, target_temp).with_flame(flame_on(boiler_status)),
        Reading::new(SensorKey::RoomTemp, room_temp),
    ];
    readings.extend(extended_telemetry(report));

    debug!(
        room_temp,
        target_temp, boiler_status, "device state retrieved"
    );
    Ok(readings)
}

/// Optional telemetry, in stable publish order.
fn extended_telemetry(report: &Report) -> Vec<Reading> {
    let fields = [
        (SensorKey::OutsideTemp, report.outside_temp),
        (SensorKey::BurningHours, report.burning_hours),
        (SensorKey::ChSetpoint, report.ch_setpoint),
        (SensorKey::DhwWaterTemp, report.dhw_water_temp),
        (SensorKey::ChWaterTemp, report.ch_water_temp),
        (SensorKey::ChWaterPressure, report.ch_water_pres),
        (SensorKey::ChReturnTemp, report.ch_return_temp),
    ];

    fields
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| Reading::new(key, v)))
        .collect()
}

fn missing(field: &str) -> CoreError {
    CoreError::Protocol {
        message: format!("retrieve reply missing mandatory field {field}"),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use pretty_assertions::assert_eq;

    fn reply(json: serde_json::Value) -> RetrieveReply {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn mandatory_fields_only() {
        let reply = reply(serde_json::json!({
            "acc_status": 2,
            "report": { "room_temp": 19.5, "boiler_status": 8 },
            "control": { "ch_mode_temp": 20.0 }
        }));

        let readings = extract_readings(&reply).unwrap();

        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].key, SensorKey::TargetTemp);
        assert_eq!(readings[0].value, 20.0);
        assert_eq!(readings[0].flame, Some(true));
        assert_eq!(readings[1].key, SensorKey::RoomTemp);
        assert_eq!(readings[1].value, 19.5);
        assert_eq!(readings[1].flame, None);
    }

    #[test]
    fn flame_off_when_bit_clear() {
        let reply = reply(serde_json::json!({
            "report": { "room_temp": 18.0, "boiler_status": 6 },
            "control": { "ch_mode_temp": 18.5 }
        }));

        let readings = extract_readings(&reply).unwrap();
        assert_eq!(readings[0].flame, Some(false));
    }

    #[test]
    fn extended_telemetry_is_independent() {
        let reply = reply(serde_json::json!({
            "report": {
                "room_temp": 19.5,
                "boiler_status": 0,
                "outside_temp": 4.5,
                "ch_water_pres": 1.7
                // burning_hours, water temps, return temp absent
            },
            "control": { "ch_mode_temp": 20.0 }
        }));

        let readings = extract_readings(&reply).unwrap();
        let keys: Vec<SensorKey> = readings.iter().map(|r| r.key).collect();

        assert_eq!(
            keys,
            vec![
                SensorKey::TargetTemp,
                SensorKey::RoomTemp,
                SensorKey::OutsideTemp,
                SensorKey::ChWaterPressure,
            ]
        );
    }

    #[test]
    fn missing_room_temp_rejects_batch() {
        let reply = reply(serde_json::json!({
            "report": { "boiler_status": 8, "outside_temp": 4.5 },
            "control": { "ch_mode_temp": 20.0 }
        }));

        let err = extract_readings(&reply).unwrap_err();
        assert!(matches!(err, CoreError::Protocol { ref message } if message.contains("room_temp")));
    }

    #[test]
    fn missing_control_section_rejects_batch() {
        let reply = reply(serde_json::json!({
            "report": { "room_temp": 19.5, "boiler_status": 8 }
        }));

        assert!(extract_readings(&reply).is_err());
    }

    #[test]
    fn display_uses_one_decimal() {
        let reading = Reading::new(SensorKey::RoomTemp, 19.54);
        assert_eq!(reading.display, "19.5");
        assert_eq!(Reading::new(SensorKey::OutsideTemp, 7.0).display, "7.0");
    }
}
