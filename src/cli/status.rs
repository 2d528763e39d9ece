use super::ui;
use crate::coordinator::FetchCoordinator;
use crate::core::DataSource;
use chrono::{DateTime, TimeDelta, Utc};
use comfy_table::{Cell, Color};
use std::time::Duration;

/// Shows when each source was last fetched and whether it would be served
/// from the store right now.
pub fn render(
    entries: &[(DataSource, Option<DateTime<Utc>>)],
    ttl: Duration,
    now: DateTime<Utc>,
) -> String {
    let ttl = TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX);
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Source"),
        ui::header_cell("Last updated"),
        ui::header_cell("Age"),
        ui::header_cell("State"),
    ]);

    for (source, fetched_at) in entries {
        let row = match fetched_at {
            Some(ts) => {
                let (state, color) = if now - *ts < ttl {
                    ("fresh", Color::Green)
                } else {
                    ("stale", Color::Yellow)
                };
                vec![
                    Cell::new(source),
                    Cell::new(ts.format("%Y-%m-%d %H:%M:%S UTC")),
                    Cell::new(ui::format_age(*ts, now)),
                    Cell::new(state).fg(color),
                ]
            }
            None => vec![
                Cell::new(source),
                ui::na_cell(),
                ui::na_cell(),
                Cell::new("empty").fg(Color::DarkGrey),
            ],
        };
        table.add_row(row);
    }
    table.to_string()
}

pub fn run(coordinator: &FetchCoordinator, ttl: Duration) {
    let entries: Vec<_> = DataSource::ALL
        .iter()
        .map(|source| (*source, coordinator.last_fetch_timestamp(*source)))
        .collect();
    println!("{}", render(&entries, ttl, Utc::now()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_render_states() {
        let now = Utc.with_ymd_and_hms(2024, 11, 29, 12, 0, 0).unwrap();
        let entries = vec![
            (DataSource::Myfin, Some(now - TimeDelta::seconds(30))),
            (DataSource::Twelvedata, None),
        ];
        let output = render(&entries, Duration::from_secs(600), now);
        assert!(output.contains("myfin"));
        assert!(output.contains("fresh"));
        assert!(output.contains("empty"));

        let output = render(
            &[(DataSource::Myfin, Some(now - TimeDelta::seconds(601)))],
            Duration::from_secs(600),
            now,
        );
        assert!(output.contains("stale"));
    }
}
