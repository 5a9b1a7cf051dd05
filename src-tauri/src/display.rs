//! Pushing usage (or the error state) onto a status surface.
//!
//! The surface is the tray in the running app and a recorder in tests.

use chrono::{DateTime, Utc};

use crate::render::{IconSet, IconStyle};
use crate::usage::{PollError, UsageSnapshot};

/// The three pieces of UI chrome a poll cycle controls.
pub trait StatusSurface {
    fn set_icon(&self, icons: &IconSet) -> Result<(), String>;
    /// Short text shown next to the icon. Empty clears it.
    fn set_badge(&self, text: &str) -> Result<(), String>;
    fn set_tooltip(&self, text: &str) -> Result<(), String>;
}

/// Integer percentage with a `%` suffix, clamped to 0-100.
pub fn badge_text(percent: f64) -> String {
    let percent = if percent.is_nan() { 0.0 } else { percent };
    format!("{}%", percent.clamp(0.0, 100.0).round() as u8)
}

/// Human-readable time until `resets_at`.
pub fn format_reset(resets_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (resets_at - now).num_seconds();
    if secs <= 0 {
        return "Resets soon".to_string();
    }

    let total_minutes = (secs + 59) / 60;
    let days = total_minutes / (24 * 60);
    let hours = (total_minutes / 60) % 24;
    let minutes = total_minutes % 60;

    if days > 0 {
        format!("Resets in {}d {}h", days, hours)
    } else if hours > 0 {
        format!("Resets in {}h {}m", hours, minutes)
    } else {
        format!("Resets in {}m", minutes)
    }
}

pub fn tooltip_text(snapshot: &UsageSnapshot, now: DateTime<Utc>) -> String {
    let mut lines = vec![format!(
        "5-hour usage: {}",
        badge_text(snapshot.five_hour.percent)
    )];

    if let Some(resets_at) = snapshot.five_hour.resets_at {
        lines.push(format_reset(resets_at, now));
    }

    if let Some(seven_day) = &snapshot.seven_day {
        lines.push(format!("7-day usage: {}", badge_text(seven_day.percent)));
    }

    lines.join("\n")
}

pub fn error_tooltip(err: &PollError) -> String {
    format!("Usage unavailable: {}", err)
}

fn apply<S: StatusSurface + ?Sized>(surface: &S, icons: &IconSet, badge: &str, tooltip: &str) {
    if let Err(e) = surface.set_icon(icons) {
        log::warn!("Display: failed to set icon: {}", e);
    }
    if let Err(e) = surface.set_badge(badge) {
        log::warn!("Display: failed to set badge: {}", e);
    }
    if let Err(e) = surface.set_tooltip(tooltip) {
        log::warn!("Display: failed to set tooltip: {}", e);
    }
}

/// Render the gauge, badge and tooltip for a fresh snapshot.
pub fn show_usage<S: StatusSurface + ?Sized>(
    surface: &S,
    snapshot: &UsageSnapshot,
    style: IconStyle,
    now: DateTime<Utc>,
) {
    let percent = snapshot.five_hour.percent;
    apply(
        surface,
        &IconSet::usage(percent, style),
        &badge_text(percent),
        &tooltip_text(snapshot, now),
    );
}

/// Render the gray glyph, clear the badge and explain the failure in the tooltip.
pub fn show_error<S: StatusSurface + ?Sized>(surface: &S, err: &PollError) {
    apply(surface, &IconSet::error(), "", &error_tooltip(err));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usage::WindowUsage;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap()
    }

    #[test]
    fn badge_rounds_and_clamps() {
        assert_eq!(badge_text(0.0), "0%");
        assert_eq!(badge_text(41.6), "42%");
        assert_eq!(badge_text(99.4), "99%");
        assert_eq!(badge_text(100.0), "100%");
        assert_eq!(badge_text(120.0), "100%");
        assert_eq!(badge_text(-3.0), "0%");
        assert_eq!(badge_text(f64::NAN), "0%");
    }

    #[test]
    fn reset_formatting() {
        let now = now();
        assert_eq!(
            format_reset(now + Duration::minutes(133), now),
            "Resets in 2h 13m"
        );
        assert_eq!(format_reset(now + Duration::seconds(30), now), "Resets in 1m");
        assert_eq!(format_reset(now + Duration::minutes(45), now), "Resets in 45m");
        assert_eq!(
            format_reset(now + Duration::hours(50), now),
            "Resets in 2d 2h"
        );
        assert_eq!(format_reset(now - Duration::minutes(1), now), "Resets soon");
    }

    #[test]
    fn tooltip_lists_known_windows() {
        let now = now();
        let snapshot = UsageSnapshot {
            five_hour: WindowUsage {
                percent: 42.0,
                resets_at: Some(now + Duration::minutes(90)),
            },
            seven_day: Some(WindowUsage {
                percent: 12.4,
                resets_at: None,
            }),
        };
        assert_eq!(
            tooltip_text(&snapshot, now),
            "5-hour usage: 42%\nResets in 1h 30m\n7-day usage: 12%"
        );

        let bare = UsageSnapshot {
            five_hour: WindowUsage {
                percent: 5.0,
                resets_at: None,
            },
            seven_day: None,
        };
        assert_eq!(tooltip_text(&bare, now), "5-hour usage: 5%");
    }

    #[test]
    fn error_tooltip_includes_message() {
        assert_eq!(
            error_tooltip(&PollError::MissingField("five_hour.utilization")),
            "Usage unavailable: Usage data missing five_hour.utilization"
        );
    }
}
