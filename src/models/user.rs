use mongodb::bson::{oid::ObjectId, DateTime};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Mobile number as it travels through the import pipeline.
///
/// Integral values (numeric cells, or text that parses as an integer) are
/// numbers; anything else is kept verbatim as text.
///
/// Only magnitudes below [`MobileNumber::EXACT_LIMIT`] become numbers, so the
/// value survives a spreadsheet cell (an `f64`) unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum MobileNumber {
    Number(i64),
    Text(String),
}

impl MobileNumber {
    pub const EXACT_LIMIT: i64 = 1_000_000_000_000_000;

    pub fn from_text(raw: &str) -> Self {
        match raw.trim().parse::<i64>() {
            Ok(n) if Self::is_exact(n) => MobileNumber::Number(n),
            _ => MobileNumber::Text(raw.to_string()),
        }
    }

    pub fn from_f64(n: f64) -> Self {
        if n.fract() == 0.0 && n.abs() < Self::EXACT_LIMIT as f64 {
            MobileNumber::Number(n as i64)
        } else {
            MobileNumber::Text(n.to_string())
        }
    }

    /// True when `n` is representable as an `f64` without rounding.
    pub fn is_exact(n: i64) -> bool {
        n.unsigned_abs() < Self::EXACT_LIMIT as u64
    }
}

impl fmt::Display for MobileNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MobileNumber::Number(n) => write!(f, "{}", n),
            MobileNumber::Text(s) => f.write_str(s),
        }
    }
}

struct MobileNumberVisitor;

impl<'de> Visitor<'de> for MobileNumberVisitor {
    type Value = MobileNumber;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a number or a string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(MobileNumber::Number(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        i64::try_from(v)
            .map(MobileNumber::Number)
            .or_else(|_| Ok(MobileNumber::Text(v.to_string())))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(MobileNumber::from_f64(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(MobileNumber::Text(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(MobileNumber::Text(v))
    }
}

impl<'de> Deserialize<'de> for MobileNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MobileNumberVisitor)
    }
}

/// Documento da collection "users"
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub mobile_number: Option<MobileNumber>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub created_at: Option<DateTime>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub updated_at: Option<DateTime>,
}

impl UserRecord {
    /// Stamps a draft with the store-assigned timestamps.
    pub fn from_draft(draft: UserDraft, now: DateTime) -> Self {
        Self {
            id: None,
            name: draft.name,
            email: draft.email,
            mobile_number: draft.mobile_number,
            city: draft.city,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }
}

/// Normalized row that has not been persisted yet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserDraft {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    #[schema(value_type = Option<String>)]
    pub mobile_number: Option<MobileNumber>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub city: Option<String>,
}

/// Response de usuário
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub mobile_number: Option<MobileNumber>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl From<UserRecord> for UserResponse {
    fn from(user: UserRecord) -> Self {
        UserResponse {
            id: user.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: user.name,
            email: user.email,
            mobile_number: user.mobile_number,
            city: user.city,
            created_at: user.created_at.and_then(|dt| dt.try_to_rfc3339_string().ok()),
            updated_at: user.updated_at.and_then(|dt| dt.try_to_rfc3339_string().ok()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{self, doc};

    #[test]
    fn test_mobile_number_from_text() {
        assert_eq!(MobileNumber::from_text("9876543210"), MobileNumber::Number(9876543210));
        assert_eq!(MobileNumber::from_text(" 111 "), MobileNumber::Number(111));
        assert_eq!(
            MobileNumber::from_text("+1 555-0100"),
            MobileNumber::Text("+1 555-0100".to_string())
        );
    }

    #[test]
    fn test_long_digit_text_stays_text() {
        assert_eq!(
            MobileNumber::from_text("1234567890123456789"),
            MobileNumber::Text("1234567890123456789".to_string())
        );
        assert_eq!(
            MobileNumber::from_text("999999999999999"),
            MobileNumber::Number(999_999_999_999_999)
        );
        assert!(!MobileNumber::is_exact(-MobileNumber::EXACT_LIMIT));
    }

    #[test]
    fn test_mobile_number_from_f64() {
        assert_eq!(MobileNumber::from_f64(111.0), MobileNumber::Number(111));
        assert_eq!(MobileNumber::from_f64(12.5), MobileNumber::Text("12.5".to_string()));
    }

    #[test]
    fn test_record_reads_numeric_variants_from_bson() {
        let docs = [
            doc! { "mobileNumber": 111_i32 },
            doc! { "mobileNumber": 111_i64 },
            doc! { "mobileNumber": 111.0_f64 },
        ];
        for d in docs {
            let user: UserRecord = bson::from_document(d).unwrap();
            assert_eq!(user.mobile_number, Some(MobileNumber::Number(111)));
        }

        let user: UserRecord = bson::from_document(doc! { "mobileNumber": "n/a" }).unwrap();
        assert_eq!(user.mobile_number, Some(MobileNumber::Text("n/a".to_string())));
    }

    #[test]
    fn test_absent_fields_are_not_stored() {
        let draft = UserDraft {
            email: Some("a@x.com".to_string()),
            ..Default::default()
        };
        let record = UserRecord::from_draft(draft, DateTime::now());
        let document = bson::to_document(&record).unwrap();

        assert!(document.get("_id").is_none());
        assert!(document.get("name").is_none());
        assert!(document.get("mobileNumber").is_none());
        assert_eq!(document.get_str("email").unwrap(), "a@x.com");
        assert!(document.get_datetime("createdAt").is_ok());
    }

    #[test]
    fn test_draft_json_shape() {
        let draft = UserDraft {
            name: Some("A".to_string()),
            mobile_number: Some(MobileNumber::Number(111)),
            ..Default::default()
        };
        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json, serde_json::json!({ "name": "A", "mobileNumber": 111 }));
    }
}
