//! # Notification Rendering
//!
//! The only payload-aware code in the crate. Reporting clients attach an
//! opaque JSON payload to each unit; the core's invariants never look inside
//! it. This module parses the scanner report shape (`finds`, `player_count`)
//! to pick the classification value and to render the webhook embed, and it
//! renders the periodic status summary.

use crate::orchestration::stats::StatsSnapshot;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

/// One detected item inside a scanner report.
#[derive(Debug, Deserialize)]
struct Find {
    name: String,
    #[serde(default)]
    value_per_second: String,
    #[serde(default)]
    value_numeric: f64,
    #[serde(default = "default_count")]
    count: u32,
}

fn default_count() -> u32 {
    1
}

fn parse_finds(payload: &Value) -> Vec<Find> {
    payload
        .get("finds")
        .cloned()
        .and_then(|raw| serde_json::from_value(raw).ok())
        .unwrap_or_default()
}

/// Whether the payload carries anything worth dispatching.
pub fn has_finds(payload: &Value) -> bool {
    !parse_finds(payload).is_empty()
}

/// The maximum `value_numeric` across finds; drives tier classification when
/// the reporter did not supply an explicit value.
pub fn peak_value(payload: &Value) -> Option<f64> {
    parse_finds(payload)
        .iter()
        .map(|find| find.value_numeric)
        .fold(None, |peak, v| Some(peak.map_or(v, |p: f64| p.max(v))))
}

/// Render the detection embed for a unit's report.
pub fn render_report(unit_id: &str, payload: &Value) -> Value {
    let finds = parse_finds(payload);
    let mut listing = String::new();
    for find in &finds {
        listing.push_str(&format!(
            "{}x {} {}\n",
            find.count, find.name, find.value_per_second
        ));
    }

    let player_count = payload
        .get("player_count")
        .and_then(Value::as_u64)
        .unwrap_or(0);

    json!({
        "embeds": [{
            "title": "☠️ Detections",
            "color": 16711680,
            "fields": [
                {
                    "name": "☠️ Finds",
                    "value": format!("```\n{listing}```"),
                    "inline": false
                },
                {
                    "name": "🆔 Server ID",
                    "value": format!("```\n{unit_id}```"),
                    "inline": false
                },
                {
                    "name": "👥 Players",
                    "value": format!("```\n{player_count}```"),
                    "inline": false
                }
            ],
            "timestamp": Utc::now().to_rfc3339()
        }]
    })
}

/// Render the periodic status summary edited in place by the status reporter.
pub fn render_status(stats: &StatsSnapshot) -> Value {
    let tier_lines = stats
        .per_tier
        .iter()
        .map(|entry| format!("{}: {}", entry.label, entry.count))
        .collect::<Vec<_>>()
        .join("\n");

    json!({
        "embeds": [{
            "title": "📡 Scanner Fleet Status",
            "color": 3447003,
            "fields": [
                {
                    "name": "Queue",
                    "value": format!("{} eligible / {} cooling down", stats.queue_size, stats.invalid_count),
                    "inline": true
                },
                {
                    "name": "Active Clients",
                    "value": stats.active_clients.to_string(),
                    "inline": true
                },
                {
                    "name": "Total Results",
                    "value": stats.total_results.to_string(),
                    "inline": true
                },
                {
                    "name": "Per Tier",
                    "value": format!("```\n{tier_lines}\n```"),
                    "inline": false
                }
            ],
            "timestamp": Utc::now().to_rfc3339()
        }]
    })
}
