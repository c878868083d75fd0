use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Queryable, Selectable, Insertable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::users)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: NaiveDateTime,
}

#[derive(Queryable, Selectable, Insertable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::devices)]
pub struct Device {
    pub id: Uuid,
    pub name: String,
    pub location: Option<String>,
    pub api_key_hash: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Queryable, Selectable, Insertable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::readings)]
pub struct Reading {
    pub id: Uuid,
    pub device_id: Uuid,
    pub temperature: f64,
    pub humidity: f64,
    pub timestamp: NaiveDateTime,
}

#[derive(Queryable, Selectable, Insertable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::alert_rules)]
pub struct AlertRule {
    pub id: Uuid,
    pub device_id: Uuid,
    pub metric_type: String,
    pub operator: String,
    pub threshold: f64,
    pub is_active: bool,
}

#[derive(Queryable, Selectable, Insertable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::alerts)]
pub struct Alert {
    pub id: Uuid,
    pub alert_rule_id: Uuid,
    pub device_id: Uuid,
    pub value: f64,
    pub message: String,
    pub created_at: NaiveDateTime,
    pub is_acknowledged: bool,
}

/// Which reading metric an alert rule watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricType {
    Temperature,
    Humidity,
}

impl MetricType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Temperature" => Some(MetricType::Temperature),
            "Humidity" => Some(MetricType::Humidity),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::Temperature => "Temperature",
            MetricType::Humidity => "Humidity",
        }
    }
}

/// Comparison applied between an observed metric value and a rule threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOperator {
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
    Equal,
}

impl ComparisonOperator {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "GreaterThan" => Some(ComparisonOperator::GreaterThan),
            "LessThan" => Some(ComparisonOperator::LessThan),
            "GreaterThanOrEqual" => Some(ComparisonOperator::GreaterThanOrEqual),
            "LessThanOrEqual" => Some(ComparisonOperator::LessThanOrEqual),
            "Equal" => Some(ComparisonOperator::Equal),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOperator::GreaterThan => "GreaterThan",
            ComparisonOperator::LessThan => "LessThan",
            ComparisonOperator::GreaterThanOrEqual => "GreaterThanOrEqual",
            ComparisonOperator::LessThanOrEqual => "LessThanOrEqual",
            ComparisonOperator::Equal => "Equal",
        }
    }

    /// Symbol used in alert messages.
    pub fn symbol(&self) -> &'static str {
        match self {
            ComparisonOperator::GreaterThan => ">",
            ComparisonOperator::LessThan => "<",
            ComparisonOperator::GreaterThanOrEqual => ">=",
            ComparisonOperator::LessThanOrEqual => "<=",
            ComparisonOperator::Equal => "==",
        }
    }
}

/// User roles. A user holds exactly one role; assignment replaces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Admin" => Some(Role::Admin),
            "User" => Some(Role::User),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::User => "User",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_type_round_trip() {
        assert_eq!(MetricType::from_str("Temperature"), Some(MetricType::Temperature));
        assert_eq!(MetricType::from_str("Humidity"), Some(MetricType::Humidity));
        assert_eq!(MetricType::Temperature.as_str(), "Temperature");
        assert!(MetricType::from_str("Pressure").is_none());
    }

    #[test]
    fn test_comparison_operator_round_trip() {
        for op in [
            ComparisonOperator::GreaterThan,
            ComparisonOperator::LessThan,
            ComparisonOperator::GreaterThanOrEqual,
            ComparisonOperator::LessThanOrEqual,
            ComparisonOperator::Equal,
        ] {
            assert_eq!(ComparisonOperator::from_str(op.as_str()), Some(op));
        }
        assert!(ComparisonOperator::from_str("NotEqual").is_none());
    }

    #[test]
    fn test_operator_symbols() {
        assert_eq!(ComparisonOperator::GreaterThan.symbol(), ">");
        assert_eq!(ComparisonOperator::LessThan.symbol(), "<");
        assert_eq!(ComparisonOperator::GreaterThanOrEqual.symbol(), ">=");
        assert_eq!(ComparisonOperator::LessThanOrEqual.symbol(), "<=");
        assert_eq!(ComparisonOperator::Equal.symbol(), "==");
    }

    #[test]
    fn test_role_from_str_rejects_unknown() {
        assert_eq!(Role::from_str("Admin"), Some(Role::Admin));
        assert_eq!(Role::from_str("User"), Some(Role::User));
        assert!(Role::from_str("SuperAdmin").is_none());
        assert!(Role::from_str("admin").is_none());
    }

    #[test]
    fn test_metric_type_serde_uses_variant_names() {
        let json = serde_json::to_string(&MetricType::Temperature).unwrap();
        assert_eq!(json, r#""Temperature""#);
        let parsed: ComparisonOperator = serde_json::from_str(r#""GreaterThanOrEqual""#).unwrap();
        assert_eq!(parsed, ComparisonOperator::GreaterThanOrEqual);
    }
}
