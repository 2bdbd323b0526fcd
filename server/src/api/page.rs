//! HTML status page.

use chrono::{DateTime, Utc};

use crate::bot::BotStatus;

/// Escape text for use in HTML element content and attribute values.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Format seconds as `1d 2h 3m 4s`, dropping leading zero units.
pub fn format_uptime(total_secs: i64) -> String {
    let total = total_secs.max(0);
    let (days, hours, minutes, seconds) = (
        total / 86_400,
        (total % 86_400) / 3600,
        (total % 3600) / 60,
        total % 60,
    );

    if days > 0 {
        format!("{days}d {hours}h {minutes}m {seconds}s")
    } else if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}

fn format_time(time: Option<DateTime<Utc>>) -> String {
    time.map_or_else(
        || "-".to_string(),
        |t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

/// Render the status page for `status`.
pub fn render(status: &BotStatus) -> String {
    let heading = if status.running {
        "Telegram Bot is running!"
    } else {
        "Telegram Bot is stopped"
    };
    let color = if status.running { "#1a7f37" } else { "#cf222e" };
    let uptime = status
        .uptime_secs
        .map_or_else(|| "-".to_string(), format_uptime);

    let mut rows = String::new();
    for (label, value) in [
        ("Bot", escape_html(&status.name)),
        ("State", status.state.to_string()),
        ("Uptime", uptime),
        ("Started", format_time(status.started_at)),
        ("Stopped", format_time(status.stopped_at)),
        ("Restarts", status.restarts.to_string()),
        (
            "Last exit",
            escape_html(status.last_exit.as_deref().unwrap_or("-")),
        ),
    ] {
        rows.push_str(&format!("<tr><th>{label}</th><td>{value}</td></tr>"));
    }

    let (action, button) = if status.running {
        ("/stop", "Stop bot")
    } else {
        ("/start", "Start bot")
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>
body {{ font-family: system-ui, sans-serif; max-width: 40rem; margin: 3rem auto; padding: 0 1rem; }}
h1 {{ color: {color}; }}
table {{ border-collapse: collapse; margin: 1.5rem 0; }}
th, td {{ text-align: left; padding: 0.3rem 1rem 0.3rem 0; }}
button {{ font-size: 1rem; padding: 0.4rem 1.2rem; }}
</style>
</head>
<body>
<h1>{heading}</h1>
<table>{rows}</table>
<form method="post" action="{action}"><button type="submit">{button}</button></form>
<p><a href="/status">JSON status</a> &middot; <a href="/health">Health</a></p>
</body>
</html>
"#,
        title = escape_html(&status.name),
    )
}
