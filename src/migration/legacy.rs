use crate::domain::model::CacheEntry;
use serde::Deserialize;

/// Cache value shape written by earlier generations of this tool.
///
/// Those documents carried the geocoder's display name next to the
/// coordinate and used abbreviated field names. The display name is not
/// carried forward; only the coordinate matters.
#[derive(Debug, Deserialize)]
pub struct LegacyEntry {
    pub lat: f64,
    pub lng: f64,
    #[serde(rename = "name")]
    #[allow(dead_code)]
    pub display_name: Option<String>,
}

impl From<LegacyEntry> for CacheEntry {
    fn from(legacy: LegacyEntry) -> Self {
        CacheEntry {
            latitude: legacy.lat,
            longitude: legacy.lng,
            resolved_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_value_converts_without_timestamp() {
        let legacy: LegacyEntry = serde_json::from_str(
            r#"{"lat": 48.8588897, "lng": 2.3200410, "name": "Paris, Ile-de-France, France"}"#,
        )
        .unwrap();
        let entry: CacheEntry = legacy.into();
        assert_eq!(entry.latitude, 48.8588897);
        assert_eq!(entry.longitude, 2.320041);
        assert!(entry.resolved_at.is_none());
    }

    #[test]
    fn legacy_value_without_name_still_parses() {
        let legacy: LegacyEntry =
            serde_json::from_str(r#"{"lat": 35.6769, "lng": 139.7639}"#).unwrap();
        assert!(legacy.display_name.is_none());
    }
}
