use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Manifest is malformed: {0}")]
    Malformed(&'static str),
    #[error("Manifest has an unparseable creation time: {0:?}")]
    Timestamp(String),
}

/*
{
   "name": <name>,
   "tag": <tag>,
   "fsLayers": [...],
   "history": [
      {"v1Compatibility": "{\"created\": \"2021-01-02T03:04:05.123456789Z\", ...}"},
      ...
   ],
   "signature": <JWS>
}
*/

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y%m%dT%H%M%S%.f",
];

const ZONED_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    // `%#z` also takes hour-only offsets such as `+00`.
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M%#z",
    "%Y-%m-%d %H:%M%#z",
    "%Y%m%dT%H%M%S%.f%#z",
];

pub(crate) fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts);
    }

    if let Ok(ts) = DateTime::parse_from_rfc2822(value) {
        return Some(ts);
    }

    for format in ZONED_FORMATS {
        if let Ok(ts) = DateTime::parse_from_str(value, format) {
            return Some(ts);
        }
    }

    let value = value
        .strip_suffix(" UTC")
        .or_else(|| value.strip_suffix('Z'))
        .unwrap_or(value);

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc().fixed_offset())
}

pub(crate) fn format_timestamp(ts: &DateTime<FixedOffset>) -> String {
    match ts.offset().local_minus_utc() {
        0 => ts.with_timezone(&Utc).format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        _ => ts.format("%Y-%m-%d %H:%M:%S %z").to_string(),
    }
}

/// Epoch milliseconds, truncating sub-millisecond precision toward zero.
pub(crate) fn epoch_millis(ts: &DateTime<FixedOffset>) -> i64 {
    let nanos = ts.timestamp() as i128 * 1_000_000_000 + ts.timestamp_subsec_nanos() as i128;
    (nanos / 1_000_000) as i64
}

/// Decodes the newest `v1Compatibility` blob into `information` and adds a
/// formatted and a millisecond form of its creation time. Every other field
/// of the manifest is passed through untouched.
pub(crate) fn enrich_manifest(
    mut manifest: Map<String, Value>,
) -> Result<Map<String, Value>, ManifestError> {
    let blob = manifest
        .get("history")
        .and_then(Value::as_array)
        .and_then(|history| history.first())
        .ok_or(ManifestError::Malformed("history is missing or empty"))?
        .get("v1Compatibility")
        .and_then(Value::as_str)
        .ok_or(ManifestError::Malformed(
            "v1Compatibility is missing or not a string",
        ))?;

    let mut information: Map<String, Value> = serde_json::from_str(blob)
        .map_err(|_| ManifestError::Malformed("v1Compatibility is not a JSON object"))?;

    let created = match information.get("created") {
        Some(Value::String(created)) => created.clone(),
        Some(other) => return Err(ManifestError::Timestamp(other.to_string())),
        None => return Err(ManifestError::Timestamp(String::new())),
    };

    let ts = parse_timestamp(&created).ok_or(ManifestError::Timestamp(created))?;

    information.insert(
        "created_formatted".to_string(),
        Value::String(format_timestamp(&ts)),
    );
    information.insert("created_millis".to_string(), Value::from(epoch_millis(&ts)));

    manifest.insert("information".to_string(), Value::Object(information));

    Ok(manifest)
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    fn manifest(created: &str) -> Map<String, Value> {
        let blob = json!({"id": "abc", "created": created}).to_string();
        match json!({
            "schemaVersion": 1,
            "name": "foo/bar",
            "tag": "v1",
            "fsLayers": [{"blobSum": "sha256:a3ed95caeb02ffe68cdd9fd84406680ae93d633cb16422d00e8a7c22955b46d4"}],
            "history": [{"v1Compatibility": blob}, {"v1Compatibility": "{}"}],
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn adds_information() {
        let enriched = enrich_manifest(manifest("2021-01-02T03:04:05Z")).unwrap();
        let information = &enriched["information"];

        assert_eq!(information["created_millis"], json!(1609556645000i64));
        assert_eq!(information["created_formatted"], "2021-01-02 03:04:05 UTC");
        assert_eq!(information["id"], "abc");
        assert_eq!(information["created"], "2021-01-02T03:04:05Z");
    }

    #[test]
    fn preserves_top_level_fields() {
        let original = manifest("2021-01-02T03:04:05Z");
        let enriched = enrich_manifest(original.clone()).unwrap();

        assert_eq!(enriched.len(), original.len() + 1);
        for (key, value) in original.iter() {
            assert_eq!(enriched.get(key), Some(value));
        }
    }

    #[test]
    fn truncates_sub_millisecond_precision() {
        let enriched = enrich_manifest(manifest("2021-01-02T03:04:05.123987654Z")).unwrap();
        assert_eq!(
            enriched["information"]["created_millis"],
            json!(1609556645123i64)
        );
    }

    #[test]
    fn truncates_toward_zero_before_epoch() {
        let ts = parse_timestamp("1969-12-31T23:59:59.9999Z").unwrap();
        assert_eq!(epoch_millis(&ts), 0);
    }

    #[test]
    fn keeps_offsets() {
        let enriched = enrich_manifest(manifest("2021-01-02T05:04:05+02:00")).unwrap();
        let information = &enriched["information"];

        assert_eq!(information["created_formatted"], "2021-01-02 05:04:05 +0200");
        assert_eq!(information["created_millis"], json!(1609556645000i64));
    }

    #[test]
    fn accepts_common_representations() {
        for value in [
            "2021-01-02T03:04:05Z",
            "2021-01-02T03:04:05.000000000Z",
            "2021-01-02T03:04:05+00:00",
            "2021-01-02 03:04:05 UTC",
            "2021-01-02 03:04:05 +0000",
            "2021-01-02T03:04:05",
            "Sat, 02 Jan 2021 03:04:05 +0000",
            "2021-01-02T03:04:05+00",
            "2021-01-02 03:04:05+00",
            "20210102T030405Z",
            "20210102T030405+0000",
            "20210102T030405",
        ] {
            let ts = parse_timestamp(value).unwrap_or_else(|| panic!("{value} should parse"));
            assert_eq!(epoch_millis(&ts), 1609556645000, "{value}");
        }
    }

    #[test]
    fn accepts_minute_precision() {
        for value in [
            "2021-01-02T03:04Z",
            "2021-01-02T03:04+00:00",
            "2021-01-02 03:04+00:00",
            "2021-01-02T05:04+02:00",
        ] {
            let ts = parse_timestamp(value).unwrap_or_else(|| panic!("{value} should parse"));
            assert_eq!(epoch_millis(&ts), 1609556640000, "{value}");
        }
    }

    #[test]
    fn date_only_is_midnight_utc() {
        let ts = parse_timestamp("2021-01-02").unwrap();
        assert_eq!(epoch_millis(&ts), 1609545600000);
        assert_eq!(format_timestamp(&ts), "2021-01-02 00:00:00 UTC");
    }

    #[test]
    fn missing_history() {
        let mut raw = manifest("2021-01-02T03:04:05Z");
        raw.remove("history");
        assert!(matches!(
            enrich_manifest(raw),
            Err(ManifestError::Malformed(_))
        ));
    }

    #[test]
    fn empty_history() {
        let mut raw = manifest("2021-01-02T03:04:05Z");
        raw.insert("history".to_string(), json!([]));
        assert!(matches!(
            enrich_manifest(raw),
            Err(ManifestError::Malformed(_))
        ));
    }

    #[test]
    fn compatibility_blob_not_json() {
        let mut raw = manifest("2021-01-02T03:04:05Z");
        raw.insert(
            "history".to_string(),
            json!([{"v1Compatibility": "not json"}]),
        );
        assert!(matches!(
            enrich_manifest(raw),
            Err(ManifestError::Malformed(_))
        ));
    }

    #[test]
    fn bad_timestamp() {
        assert!(matches!(
            enrich_manifest(manifest("yesterday")),
            Err(ManifestError::Timestamp(_))
        ));
    }
}
