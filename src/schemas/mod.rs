use std::collections::HashMap;

use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use time::{
    format_description::well_known::Rfc3339, macros::format_description, OffsetDateTime,
    PrimitiveDateTime,
};

pub(crate) mod assignment;
pub(crate) mod attempt;
pub(crate) mod grade;
pub(crate) mod quiz;

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) service: String,
    pub(crate) status: String,
    pub(crate) components: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RootResponse {
    pub(crate) message: String,
    pub(crate) version: String,
    pub(crate) docs_url: String,
}

pub(crate) fn parse_offset_datetime_flexible(raw: &str) -> Option<OffsetDateTime> {
    if let Ok(value) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(value);
    }

    // datetime-local inputs arrive without a timezone; treat them as UTC.
    if let Ok(value) =
        PrimitiveDateTime::parse(raw, &format_description!("[year]-[month]-[day]T[hour]:[minute]"))
    {
        return Some(value.assume_utc());
    }
    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    ) {
        return Some(value.assume_utc());
    }

    None
}

pub(crate) fn deserialize_offset_datetime_flexible<'de, D>(
    deserializer: D,
) -> Result<OffsetDateTime, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_offset_datetime_flexible(&raw)
        .ok_or_else(|| D::Error::custom(format!("invalid datetime: {raw}")))
}

pub(crate) fn deserialize_option_offset_datetime_flexible<'de, D>(
    deserializer: D,
) -> Result<Option<OffsetDateTime>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw {
        Some(value) => parse_offset_datetime_flexible(&value)
            .ok_or_else(|| D::Error::custom(format!("invalid datetime: {value}")))
            .map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::parse_offset_datetime_flexible;
    use time::macros::datetime;

    #[test]
    fn accepts_rfc3339_and_naive_local_forms() {
        assert_eq!(
            parse_offset_datetime_flexible("2025-03-01T10:00:00Z"),
            Some(datetime!(2025-03-01 10:00:00 UTC))
        );
        assert_eq!(
            parse_offset_datetime_flexible("2025-03-01T10:00"),
            Some(datetime!(2025-03-01 10:00:00 UTC))
        );
        assert_eq!(
            parse_offset_datetime_flexible("2025-03-01T10:00:30"),
            Some(datetime!(2025-03-01 10:00:30 UTC))
        );
        assert_eq!(parse_offset_datetime_flexible("yesterday"), None);
    }
}
