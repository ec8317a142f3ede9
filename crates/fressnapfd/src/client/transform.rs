//! Pure flattening of the vendor's nested device JSON.
//!
//! Mirrors the upstream API's ad-hoc shape: feature flags in
//! `tracker_settings.features` gate whether the related nested objects exist,
//! and `additional_parameters` is a JSON document embedded in a string.

use serde_json::Value;
use tracing::debug;

use super::record::{DeviceRecord, Trip, WeightEntry};
use super::FetchError;

/// Flatten a device-endpoint body and the raw trip list into a [`DeviceRecord`].
///
/// Keys promised by a feature flag must exist; their absence is a contract
/// violation against the upstream API and fails with [`FetchError::Schema`].
/// The `additional_parameters` payload is explicitly tolerant: an unparseable
/// document or missing weight keys degrade to an empty history.
pub(super) fn flatten_device(
    serial_number: u64,
    body: Value,
    trips: Vec<Value>,
) -> Result<DeviceRecord, FetchError> {
    let fields = match body {
        Value::Object(map) => map,
        _ => return Err(FetchError::Schema("device body object")),
    };

    let features = fields
        .get("tracker_settings")
        .and_then(|v| v.get("features"))
        .ok_or(FetchError::Schema("tracker_settings.features"))?;

    let flash_light = features
        .get("flash_light")
        .and_then(Value::as_bool)
        .ok_or(FetchError::Schema("tracker_settings.features.flash_light"))?;
    let sleep_mode = features
        .get("sleep_mode")
        .and_then(Value::as_bool)
        .ok_or(FetchError::Schema("tracker_settings.features.sleep_mode"))?;

    let mut record = DeviceRecord {
        serial_number,
        flash_light,
        sleep_mode,
        fields,
        ..Default::default()
    };

    if flash_light {
        let value = nested(&record.fields, "led_brightness", "value")
            .ok_or(FetchError::Schema("led_brightness.value"))?;
        let status = nested(&record.fields, "led_brightness", "status")
            .ok_or(FetchError::Schema("led_brightness.status"))?;
        let overall = nested(&record.fields, "led_activatable", "overall")
            .ok_or(FetchError::Schema("led_activatable.overall"))?;
        record.fields.insert("led_brightness_value".to_string(), value);
        record.fields.insert("led_brightness_status".to_string(), status);
        record
            .fields
            .insert("led_activatable_overall".to_string(), overall);
    }

    if sleep_mode {
        let value = nested(&record.fields, "deep_sleep", "value")
            .ok_or(FetchError::Schema("deep_sleep.value"))?;
        let status = nested(&record.fields, "deep_sleep", "status")
            .ok_or(FetchError::Schema("deep_sleep.status"))?;
        record.fields.insert("deep_sleep_value".to_string(), value);
        record.fields.insert("deep_sleep_status".to_string(), status);
    }

    let raw_params = record
        .fields
        .get("additional_parameters")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_owned);
    if let Some(params) = raw_params {
        let params: Value = serde_json::from_str(&params).unwrap_or_else(|e| {
            debug!("unparseable additional_parameters, ignoring: {}", e);
            Value::Object(Default::default())
        });

        if let Some(list) = params.get("weightList").and_then(Value::as_array) {
            record.weight_history = list
                .iter()
                .filter_map(|entry| match serde_json::from_value::<WeightEntry>(entry.clone()) {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        debug!("skipping malformed weight entry: {}", e);
                        None
                    }
                })
                .collect();
        }

        if let Some(weight) = params.get("weight").and_then(Value::as_str) {
            let weight = weight.replace(" kg", "");
            record
                .fields
                .insert("weight_current".to_string(), Value::String(weight.clone()));
            record.weight_current = Some(weight);
        }
    }

    record.trips = trips
        .into_iter()
        .filter_map(|trip| match serde_json::from_value::<Trip>(trip) {
            Ok(trip) => Some(trip),
            Err(e) => {
                debug!("skipping malformed trip: {}", e);
                None
            }
        })
        .collect();

    Ok(record)
}

/// Clone `fields[outer][inner]` if the whole path exists.
fn nested(fields: &serde_json::Map<String, Value>, outer: &str, inner: &str) -> Option<Value> {
    fields.get(outer).and_then(|v| v.get(inner)).cloned()
}
