use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::models::{Alert, AlertRule, ComparisonOperator, MetricType, Reading};
use crate::schema::{alert_rules, alerts};

/// Tolerance for Equal comparisons; exact float equality is never used.
pub const EQUALITY_EPSILON: f64 = 1e-4;

/// Breach test for one rule against one observed value.
/// An operator string that doesn't parse never matches (fail closed).
pub fn evaluate_rule(rule: &AlertRule, value: f64) -> bool {
    match ComparisonOperator::from_str(&rule.operator) {
        Some(ComparisonOperator::GreaterThan) => value > rule.threshold,
        Some(ComparisonOperator::LessThan) => value < rule.threshold,
        Some(ComparisonOperator::GreaterThanOrEqual) => value >= rule.threshold,
        Some(ComparisonOperator::LessThanOrEqual) => value <= rule.threshold,
        Some(ComparisonOperator::Equal) => (value - rule.threshold).abs() < EQUALITY_EPSILON,
        None => false,
    }
}

/// `"<Metric> value <observed> <symbol> <threshold>"`
pub fn alert_message(rule: &AlertRule, value: f64) -> String {
    let symbol = ComparisonOperator::from_str(&rule.operator)
        .map(|op| op.symbol())
        .unwrap_or("?");
    format!(
        "{} value {} {} {}",
        rule.metric_type, value, symbol, rule.threshold
    )
}

/// Picks the reading field the rule watches. Unknown metric names select
/// nothing, so the rule can never fire.
fn observed_value(rule: &AlertRule, reading: &Reading) -> Option<f64> {
    match MetricType::from_str(&rule.metric_type) {
        Some(MetricType::Temperature) => Some(reading.temperature),
        Some(MetricType::Humidity) => Some(reading.humidity),
        None => None,
    }
}

/// Evaluates every active rule of the reading's device and persists one
/// alert per breach as a single batch insert. No write happens when nothing
/// breaches. Deliberately not idempotent: re-ingesting a breaching value
/// creates another alert.
pub fn evaluate_and_create_alerts(
    conn: &mut PgConnection,
    reading: &Reading,
) -> Result<Vec<Alert>, diesel::result::Error> {
    let rules: Vec<AlertRule> = alert_rules::table
        .filter(alert_rules::device_id.eq(reading.device_id))
        .filter(alert_rules::is_active.eq(true))
        .load(conn)?;

    let now = Utc::now().naive_utc();
    let breached: Vec<Alert> = rules
        .iter()
        .filter_map(|rule| {
            let value = observed_value(rule, reading)?;
            if !evaluate_rule(rule, value) {
                return None;
            }
            Some(Alert {
                id: Uuid::new_v4(),
                alert_rule_id: rule.id,
                device_id: reading.device_id,
                value,
                message: alert_message(rule, value),
                created_at: now,
                is_acknowledged: false,
            })
        })
        .collect();

    if !breached.is_empty() {
        diesel::insert_into(alerts::table)
            .values(&breached)
            .execute(conn)?;
        log::info!(
            "Created {} alert(s) for device {}",
            breached.len(),
            reading.device_id
        );
    }

    Ok(breached)
}
