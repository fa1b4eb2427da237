// Resolution of the datetime extraction group into one timestamp
use crate::schema::DatetimeFields;
use chrono::{DateTime, Duration, FixedOffset, Months, SecondsFormat};
use tracing::{debug, warn};

/// Render a timestamp the way every resolved datetime is reported
pub fn format_timestamp(t: &DateTime<FixedOffset>) -> String {
    t.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

/// Parse an ISO-8601 timestamp with offset, accepting a trailing `Z`
pub fn parse_reference(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value.trim()).ok()
}

/// Resolve a datetime response against `reference`.
///
/// An explicit `time` is returned verbatim. Otherwise the calendar offset
/// (years and months first, then days, hours and minutes) is added or
/// subtracted per `action`. Anything unusable resolves to the reference
/// itself.
pub fn resolve_datetime(response: &str, reference: &DateTime<FixedOffset>) -> String {
    let Some(fields) = DatetimeFields::from_response(response) else {
        warn!("Datetime response unusable, falling back to reference time");
        return format_timestamp(reference);
    };
    if let Some(time) = fields.time {
        return time;
    }
    match apply_offset(&fields, reference) {
        Some(resolved) => {
            debug!(resolved = %format_timestamp(&resolved), "Applied relative datetime offset");
            format_timestamp(&resolved)
        }
        None => {
            warn!(action = ?fields.action, "Datetime offset unusable, falling back to reference time");
            format_timestamp(reference)
        }
    }
}

fn whole(value: f64) -> Option<i64> {
    if value.fract() != 0.0 || value.abs() > f64::from(u32::MAX) {
        return None;
    }
    Some(value as i64)
}

fn apply_offset(
    fields: &DatetimeFields,
    reference: &DateTime<FixedOffset>,
) -> Option<DateTime<FixedOffset>> {
    let sign: i64 = match fields.action.as_deref() {
        Some("+") => 1,
        Some("-") => -1,
        _ => return None,
    };
    // Calendar units must be whole numbers; negative ones flip the direction
    let months = sign * whole(fields.years)?.checked_mul(12)?.checked_add(whole(fields.months)?)?;
    let calendar = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    let seconds = (fields.days * 86_400.0 + fields.hours * 3_600.0 + fields.minutes * 60.0).round();
    if !seconds.is_finite() || seconds.abs() > 1e15 {
        return None;
    }
    let delta = Duration::try_seconds(sign * seconds as i64)?;

    let shifted = if months >= 0 {
        reference.checked_add_months(calendar)?
    } else {
        reference.checked_sub_months(calendar)?
    };
    shifted.checked_add_signed(delta)
}
