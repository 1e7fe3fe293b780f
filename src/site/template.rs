use std::fmt::Display;

use chrono::Local;

/// Placeholder replaced with the current local time.
pub const TIME_PLACEHOLDER: &str = "{time}";

const TIME_FMT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

/// Substitutes every `{time}` in `template` with `now`.
pub fn render(template: &str, now: impl Display) -> String {
    template.replace(TIME_PLACEHOLDER, &now.to_string())
}

/// Renders `template` with the current local time.
pub fn render_now(template: &str) -> String {
    render(template, Local::now().format(TIME_FMT))
}
