//! Residence resource limits and the declarative field schema behind the
//! generic limits editor.
//!
//! Each editable limit is described by one [`LimitField`] record (label,
//! bounds, step, optional formatter); an editor renders the table instead
//! of carrying per-field code.

use serde::{Deserialize, Serialize};

const MEGABYTE: u64 = 1_048_576;

/// Per-residence capacity limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResidenceLimits {
    pub max_buildings: u64,
    pub max_apartments: u64,
    pub max_members: u64,
    pub max_categories: u64,
    pub max_contacts: u64,
    pub max_storage_bytes: u64,
}

/// Partial limits for create/update payloads; absent fields keep their
/// server-side values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResidenceLimitsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_buildings: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_apartments: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_members: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_categories: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_contacts: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_storage_bytes: Option<u64>,
}

/// Limits applied to regular residences unless overridden.
pub const DEFAULT_LIMITS: ResidenceLimits = ResidenceLimits {
    max_buildings: 15,
    max_apartments: 100,
    max_members: 50,
    max_categories: 20,
    max_contacts: 50,
    max_storage_bytes: 1024 * MEGABYTE,
};

/// Limits applied to demo residences.
pub const DEMO_LIMITS: ResidenceLimits = ResidenceLimits {
    max_buildings: 5,
    max_apartments: 20,
    max_members: 10,
    max_categories: 5,
    max_contacts: 10,
    max_storage_bytes: 100 * MEGABYTE,
};

/// Metadata for one editable limit field.
pub struct LimitField {
    /// Wire field name inside `limits`
    pub key: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub min: u64,
    pub max: u64,
    pub step: u64,
    /// Display formatter; `None` renders the raw number
    pub formatter: Option<fn(u64) -> String>,
}

impl LimitField {
    /// Reads this field's current value out of a limits record.
    pub fn value_of(&self, limits: &ResidenceLimits) -> u64 {
        match self.key {
            "maxBuildings" => limits.max_buildings,
            "maxApartments" => limits.max_apartments,
            "maxMembers" => limits.max_members,
            "maxCategories" => limits.max_categories,
            "maxContacts" => limits.max_contacts,
            "maxStorageBytes" => limits.max_storage_bytes,
            other => unreachable!("unknown limit field {other}"),
        }
    }

    /// Formats a value for display using this field's formatter.
    pub fn display(&self, value: u64) -> String {
        match self.formatter {
            Some(f) => f(value),
            None => value.to_string(),
        }
    }

    /// True when `value` respects this field's bounds.
    pub fn accepts(&self, value: u64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Formats a byte count as whole megabytes, e.g. `1073741824` -> `"1024 MB"`.
pub fn format_storage(bytes: u64) -> String {
    format!("{} MB", bytes.div_ceil(MEGABYTE))
}

/// Parses a `"<n> MB"` display string back into bytes.
pub fn parse_storage(display: &str) -> Option<u64> {
    display
        .trim()
        .trim_end_matches("MB")
        .trim()
        .parse::<u64>()
        .ok()
        .map(|mb| mb * MEGABYTE)
}

/// The editable limit fields, in display order.
pub const LIMIT_FIELDS: [LimitField; 6] = [
    LimitField {
        key: "maxBuildings",
        label: "Max Buildings",
        description: "Maximum number of buildings in the residence",
        min: 1,
        max: 100,
        step: 1,
        formatter: None,
    },
    LimitField {
        key: "maxApartments",
        label: "Max Apartments",
        description: "Maximum total apartments across all buildings",
        min: 1,
        max: 1000,
        step: 10,
        formatter: None,
    },
    LimitField {
        key: "maxMembers",
        label: "Max Members",
        description: "Maximum number of members (syndics + residents)",
        min: 1,
        max: 500,
        step: 5,
        formatter: None,
    },
    LimitField {
        key: "maxCategories",
        label: "Max Categories",
        description: "Maximum number of expense categories",
        min: 1,
        max: 50,
        step: 1,
        formatter: None,
    },
    LimitField {
        key: "maxContacts",
        label: "Max Contacts",
        description: "Maximum number of contacts/suppliers",
        min: 1,
        max: 100,
        step: 5,
        formatter: None,
    },
    LimitField {
        key: "maxStorageBytes",
        label: "Max Storage",
        description: "Maximum storage space for documents",
        min: 10 * MEGABYTE,
        max: 10 * 1024 * MEGABYTE,
        step: 100 * MEGABYTE,
        formatter: Some(format_storage),
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_respect_field_bounds() {
        for field in &LIMIT_FIELDS {
            assert!(
                field.accepts(field.value_of(&DEFAULT_LIMITS)),
                "default {} out of bounds",
                field.key
            );
            assert!(
                field.accepts(field.value_of(&DEMO_LIMITS)),
                "demo {} out of bounds",
                field.key
            );
        }
    }

    #[test]
    fn test_storage_round_trip() {
        assert_eq!(format_storage(DEFAULT_LIMITS.max_storage_bytes), "1024 MB");
        assert_eq!(format_storage(DEMO_LIMITS.max_storage_bytes), "100 MB");
        assert_eq!(parse_storage("1024 MB"), Some(1024 * MEGABYTE));
        assert_eq!(parse_storage("  100 MB "), Some(100 * MEGABYTE));
        assert_eq!(parse_storage("abc"), None);
    }

    #[test]
    fn test_display_uses_field_formatter() {
        let storage = &LIMIT_FIELDS[5];
        assert_eq!(storage.display(DEMO_LIMITS.max_storage_bytes), "100 MB");
        let buildings = &LIMIT_FIELDS[0];
        assert_eq!(buildings.display(15), "15");
    }

    #[test]
    fn test_limits_wire_shape_is_camel_case() {
        let json = serde_json::to_value(DEMO_LIMITS).unwrap();
        assert_eq!(json["maxBuildings"], 5);
        assert_eq!(json["maxStorageBytes"], 104_857_600u64);
    }

    #[test]
    fn test_patch_skips_absent_fields() {
        let patch = ResidenceLimitsPatch {
            max_members: Some(25),
            ..ResidenceLimitsPatch::default()
        };
        let json = serde_json::to_value(patch).unwrap();
        assert_eq!(json, serde_json::json!({ "maxMembers": 25 }));
    }
}
