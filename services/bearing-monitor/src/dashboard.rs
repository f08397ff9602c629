//! Web dashboard: status indicator, statistics and a chart of recent readings

use axum::extract::State;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::Router;

use crate::color::StatusPalette;
use crate::state::StateHandle;

const CHART_WIDTH: f64 = 600.0;
const CHART_HEIGHT: f64 = 200.0;

/// Dashboard application state
#[derive(Clone)]
pub struct DashboardState {
    pub state: StateHandle,
    pub palette: StatusPalette,
}

/// Build the dashboard axum router
pub fn build_router(state: StateHandle, palette: StatusPalette) -> Router {
    let dashboard_state = DashboardState { state, palette };

    Router::new()
        .route("/", get(index_handler))
        .route("/api/snapshot", get(snapshot_handler))
        .route("/api/history", get(history_handler))
        .route("/health", get(health_handler))
        .with_state(dashboard_state)
}

/// Escape text for inclusion in HTML element content or attribute values
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// One-decimal temperature, or a dash when the backend sent no finite value
pub fn format_temperature(value: f64) -> String {
    if value.is_finite() {
        format!("{:.1}", value)
    } else {
        "-".to_string()
    }
}

/// SVG polyline points for `series`, scaled into the chart box.
///
/// A flat series is drawn along the vertical middle.
pub fn chart_points(series: &[f64], width: f64, height: f64) -> String {
    if series.is_empty() {
        return String::new();
    }

    let min = series.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = series.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;
    let step = if series.len() > 1 {
        width / (series.len() - 1) as f64
    } else {
        0.0
    };

    series
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let x = i as f64 * step;
            let y = if span > 0.0 {
                height - (t - min) / span * height
            } else {
                height / 2.0
            };
            format!("{:.1},{:.1}", x, y)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

async fn index_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let state = dashboard.state.read().await;
    let snapshot = &state.snapshot;
    let color = dashboard.palette.color(snapshot.status);
    let series: Vec<f64> = snapshot
        .temperature_series()
        .into_iter()
        .filter(|t| t.is_finite())
        .collect();
    let points = chart_points(&series, CHART_WIDTH, CHART_HEIGHT);
    let last_error = escape_html(state.last_error.as_deref().unwrap_or("None"));

    let history_rows: String = state
        .history
        .iter()
        .rev()
        .map(|c| {
            format!(
                r#"<tr style="border-bottom: 1px solid #dee2e6;">
                    <td style="padding: 0.5rem;"><script>document.write(new Date({}).toLocaleTimeString())</script></td>
                    <td style="padding: 0.5rem;">{}</td>
                    <td style="padding: 0.5rem;">{}</td>
                </tr>"#,
                c.timestamp_epoch_ms,
                escape_html(&c.previous.to_string()),
                escape_html(&c.current.to_string())
            )
        })
        .collect();

    let html = format!(
        r##"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Bearing Temperature Monitor</title>
    <script>
        function chartPoints(series) {{
            if (series.length === 0) return '';
            const min = Math.min(...series), max = Math.max(...series), span = max - min;
            const step = series.length > 1 ? {width} / (series.length - 1) : 0;
            return series.map((t, i) => {{
                const y = span > 0 ? {height} - (t - min) / span * {height} : {height} / 2;
                return `${{(i * step).toFixed(1)}},${{y.toFixed(1)}}`;
            }}).join(' ');
        }}
        function formatTemperature(value) {{
            return typeof value === 'number' ? value.toFixed(1) : '-';
        }}
        function refreshData() {{
            fetch('/api/snapshot')
                .then(r => r.json())
                .then(data => {{
                    const indicator = document.getElementById('status-indicator');
                    indicator.style.backgroundColor = data.color;
                    document.getElementById('status-label').textContent = data.label;
                    document.getElementById('max-temp').textContent = formatTemperature(data.stats.max_temperature);
                    document.getElementById('min-temp').textContent = formatTemperature(data.stats.min_temperature);
                    document.getElementById('avg-temp').textContent = formatTemperature(data.stats.avg_temperature);
                    document.getElementById('errors').textContent = data.consecutive_errors;
                    document.getElementById('last-error').textContent = data.last_error || 'None';
                    document.getElementById('chart-line').setAttribute('points', chartPoints(data.series));
                }});
        }}
        setInterval(refreshData, 5000);
    </script>
</head>
<body style="font-family: system-ui, sans-serif; max-width: 960px; margin: 0 auto; padding: 1rem;">
    <h1>Bearing Temperature Monitor</h1>
    <section>
        <div id="status-indicator" style="padding: 1rem; border-radius: 0.5rem; color: #fff; background-color: {color};">
            <h2 style="margin: 0;">Current status: <span id="status-label">{label}</span></h2>
        </div>
    </section>
    <section>
        <h2>Statistics</h2>
        <table style="width: 100%; border-collapse: collapse;">
            <tbody>
                <tr><td style="padding: 0.5rem;">Max (&deg;C)</td><td id="max-temp" style="padding: 0.5rem;">{max}</td></tr>
                <tr><td style="padding: 0.5rem;">Min (&deg;C)</td><td id="min-temp" style="padding: 0.5rem;">{min}</td></tr>
                <tr><td style="padding: 0.5rem;">Average (&deg;C)</td><td id="avg-temp" style="padding: 0.5rem;">{avg}</td></tr>
                <tr><td style="padding: 0.5rem;">Consecutive errors</td><td id="errors" style="padding: 0.5rem;">{errors}</td></tr>
                <tr><td style="padding: 0.5rem;">Last error</td><td id="last-error" style="padding: 0.5rem;">{last_error}</td></tr>
            </tbody>
        </table>
    </section>
    <section>
        <h2>Recent Readings</h2>
        <svg viewBox="0 0 {width} {height}" style="width: 100%; height: 200px; background: #f8f9fa;">
            <polyline id="chart-line" fill="none" stroke="#1976d2" stroke-width="2" points="{points}"/>
        </svg>
    </section>
    <section>
        <h2>Status Changes</h2>
        <table style="width: 100%; border-collapse: collapse;">
            <thead>
                <tr style="border-bottom: 2px solid #dee2e6;">
                    <th style="padding: 0.5rem; text-align: left;">Time</th>
                    <th style="padding: 0.5rem; text-align: left;">From</th>
                    <th style="padding: 0.5rem; text-align: left;">To</th>
                </tr>
            </thead>
            <tbody>{history_rows}</tbody>
        </table>
    </section>
</body>
</html>"##,
        color = color,
        label = snapshot.status,
        max = format_temperature(snapshot.stats.max_temperature),
        min = format_temperature(snapshot.stats.min_temperature),
        avg = format_temperature(snapshot.stats.avg_temperature),
        errors = state.consecutive_errors,
        last_error = last_error,
        width = CHART_WIDTH,
        height = CHART_HEIGHT,
        points = points,
        history_rows = history_rows,
    );

    Html(html)
}

async fn snapshot_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let state = dashboard.state.read().await;
    let snapshot = &state.snapshot;

    axum::Json(serde_json::json!({
        "status": snapshot.status,
        "label": snapshot.status.to_string(),
        "color": dashboard.palette.color(snapshot.status),
        "stats": snapshot.stats,
        "last_readings": snapshot.last_readings,
        "series": snapshot
            .temperature_series()
            .into_iter()
            .filter(|t| t.is_finite())
            .collect::<Vec<_>>(),
        "sequence": state.applied_sequence,
        "consecutive_errors": state.consecutive_errors,
        "last_error": state.last_error,
        "last_attempt_epoch_ms": state.last_attempt_epoch_ms,
        "last_success_epoch_ms": state.last_success_epoch_ms,
        "uptime_seconds": state.started_at.elapsed().as_secs(),
    }))
}

async fn history_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let state = dashboard.state.read().await;
    let history: Vec<_> = state.history.iter().cloned().collect();
    axum::Json(history)
}

async fn health_handler() -> impl IntoResponse {
    "OK"
}
