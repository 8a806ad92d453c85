//! Current time tool

use super::parse_params;
use crate::Tool;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Local, Utc};
use harper_core::{Error, Result};
use harper_llm::tools::schema;
use serde::Deserialize;
use serde_json::{Value, json};

const NAME: &str = "get_current_time";
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Reports the current date and time
#[derive(Debug, Clone, Copy, Default)]
pub struct ClockTool;

#[derive(Debug, Default, Deserialize)]
struct ClockParams {
    #[serde(default, alias = "input")]
    timezone: Option<String>,
}

#[async_trait]
impl Tool for ClockTool {
    async fn execute(&self, params: Value) -> Result<Value> {
        let params: ClockParams = parse_params(NAME, params)?;
        let zone = params.timezone.as_deref().unwrap_or("UTC");
        let now = format_in_zone(Utc::now(), zone).map_err(|msg| Error::tool(NAME, msg))?;
        Ok(json!(now))
    }

    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "Get the current date and time. Optionally pass a timezone: 'UTC' \
         (default), 'local', or a fixed offset such as '+05:30'."
    }

    fn input_schema(&self) -> Value {
        schema::object(
            json!({
                "timezone": schema::string("UTC, local, or an offset like -04:00"),
            }),
            &[],
        )
    }
}

fn format_in_zone(now: DateTime<Utc>, zone: &str) -> std::result::Result<String, String> {
    let zone = zone.trim();

    if zone.is_empty() || zone.eq_ignore_ascii_case("utc") || zone.eq_ignore_ascii_case("gmt") {
        return Ok(format!("{} UTC", now.format(TIME_FORMAT)));
    }

    if zone.eq_ignore_ascii_case("local") {
        let local = now.with_timezone(&Local);
        return Ok(format!("{} {}", local.format(TIME_FORMAT), local.format("%:z")));
    }

    let offset = parse_offset(zone).ok_or_else(|| format!("Unrecognized timezone: {zone}"))?;
    let shifted = now.with_timezone(&offset);
    Ok(format!("{} {}", shifted.format(TIME_FORMAT), shifted.format("%:z")))
}

/// Parse `+HH:MM`, `-HH:MM` or `+HH`, optionally prefixed with `UTC`
fn parse_offset(zone: &str) -> Option<FixedOffset> {
    let rest = zone
        .strip_prefix("UTC")
        .or_else(|| zone.strip_prefix("utc"))
        .unwrap_or(zone);

    let (sign, digits) = match rest.chars().next()? {
        '+' => (1, &rest[1..]),
        '-' => (-1, &rest[1..]),
        _ => return None,
    };

    let (hours, minutes) = match digits.split_once(':') {
        Some((h, m)) => (h.parse::<i32>().ok()?, m.parse::<i32>().ok()?),
        None => (digits.parse::<i32>().ok()?, 0),
    };

    if !(0..=14).contains(&hours) || !(0..60).contains(&minutes) {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
