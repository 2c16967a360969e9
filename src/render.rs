//! Rendering of forecasts as text, CSV, JSON, Markdown, or a timeline.

use std::collections::HashSet;
use std::fmt::Write as _;

use chrono::NaiveDate;
use gap_core::{OutputFormat, Result};
use gap_model::forecast::{Forecast, ForecastOptions};

/// Days shown on each side of the reference date in the timeline.
const VIEW_LIMIT: i64 = 28;

const ACTIVITY_MARK: char = '█';
const BAND_MARKS: [char; 3] = ['▓', '▒', '░'];
const TODAY_MARK: char = '│';
const EMPTY_MARK: char = '·';

/// Render `forecasts` in the requested format.
pub fn render(
    forecasts: &[Forecast],
    options: &ForecastOptions,
    format: OutputFormat,
    use_color: bool,
) -> Result<String> {
    let out = match format {
        OutputFormat::Text => to_text(forecasts, &options.probabilities),
        OutputFormat::Csv => to_csv(forecasts, &options.probabilities),
        OutputFormat::Json => to_json(forecasts)?,
        OutputFormat::Markdown => to_markdown(forecasts, &options.probabilities),
        OutputFormat::Timeline => to_timeline(forecasts, options.as_of, use_color),
    };
    Ok(out)
}

fn header(probabilities: &[f64]) -> Vec<String> {
    let mut columns = vec!["author".to_string(), "last".to_string()];
    columns.extend(probabilities.iter().map(|p| p.to_string()));
    columns
}

fn row(forecast: &Forecast, missing: &str) -> Vec<String> {
    let mut cells = vec![
        forecast.author.clone(),
        forecast.last_activity.to_string(),
    ];
    cells.extend(forecast.predictions.iter().map(|prediction| {
        prediction
            .date
            .map_or_else(|| missing.to_string(), |date| date.to_string())
    }));
    cells
}

fn to_text(forecasts: &[Forecast], probabilities: &[f64]) -> String {
    let mut rows = vec![header(probabilities)];
    rows.extend(forecasts.iter().map(|f| row(f, "-")));

    let columns = rows[0].len();
    let widths: Vec<usize> = (0..columns)
        .map(|c| {
            rows.iter()
                .map(|r| r.get(c).map_or(0, |cell| cell.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    for r in &rows {
        let line: Vec<String> = r
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(i, (cell, &width))| {
                if i == 0 {
                    format!("{cell:<width$}")
                } else {
                    format!("{cell:>width$}")
                }
            })
            .collect();
        let _ = writeln!(out, "{}", line.join("  ").trim_end());
    }
    out
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn to_csv(forecasts: &[Forecast], probabilities: &[f64]) -> String {
    let mut out = String::new();
    let rows = std::iter::once(header(probabilities)).chain(forecasts.iter().map(|f| row(f, "")));
    for r in rows {
        let fields: Vec<String> = r.iter().map(|cell| csv_field(cell)).collect();
        let _ = writeln!(out, "{}", fields.join(","));
    }
    out
}

fn to_json(forecasts: &[Forecast]) -> Result<String> {
    let mut authors = serde_json::Map::new();
    for forecast in forecasts {
        let predictions: Vec<serde_json::Value> = forecast
            .predictions
            .iter()
            .map(|prediction| {
                serde_json::json!({
                    "probability": prediction.probability,
                    "date": prediction.date.map(|date| date.to_string()),
                })
            })
            .collect();
        authors.insert(
            forecast.author.clone(),
            serde_json::json!({
                "last": forecast.last_activity.to_string(),
                "predictions": predictions,
            }),
        );
    }
    let mut out = serde_json::to_string_pretty(&serde_json::Value::Object(authors))?;
    out.push('\n');
    Ok(out)
}

fn to_markdown(forecasts: &[Forecast], probabilities: &[f64]) -> String {
    let head = header(probabilities);
    let mut out = String::new();
    let _ = writeln!(out, "| {} |", head.join(" | "));
    let _ = writeln!(
        out,
        "|{}|",
        head.iter()
            .map(|h| "-".repeat(h.len() + 2))
            .collect::<Vec<_>>()
            .join("|")
    );
    for forecast in forecasts {
        let mut cells = row(forecast, "-");
        cells[0] = format!("`{}`", cells[0].replace('|', "\\|"));
        let _ = writeln!(out, "| {} |", cells.join(" | "));
    }
    out
}

/// Day ranges `(from, to]`, relative to `as_of`, covered by each prediction.
///
/// Each band starts where the previous one ended. An unresolved prediction
/// extends its band past the visible range and ends the sequence.
fn forecast_bands(forecast: &Forecast, as_of: NaiveDate) -> Vec<(i64, i64)> {
    let last = forecast.last_activity.signed_duration_since(as_of).num_days();
    let mut bands = Vec::new();
    let mut previous = 0i64;
    for prediction in &forecast.predictions {
        match prediction.quantile.days() {
            Some(days) => {
                let days = i64::try_from(days).unwrap_or(i64::MAX);
                bands.push((last + previous, last.saturating_add(days)));
                previous = days;
            }
            None => {
                bands.push((last + previous, i64::MAX));
                break;
            }
        }
    }
    bands
}

fn paint(mark: char, color: &str, use_color: bool) -> String {
    if use_color {
        format!("\x1b[{color}m{mark}\x1b[0m")
    } else {
        mark.to_string()
    }
}

fn to_timeline(forecasts: &[Forecast], as_of: NaiveDate, use_color: bool) -> String {
    let name_width = forecasts
        .iter()
        .map(|f| f.author.chars().count())
        .max()
        .unwrap_or(0);
    let span = usize::try_from(2 * VIEW_LIMIT + 1).unwrap_or(0);

    let mut out = String::new();
    let left = format!("-{VIEW_LIMIT}d");
    let right = format!("+{VIEW_LIMIT}d");
    let middle = as_of.to_string();
    let gap_left = (span / 2).saturating_sub(left.len() + middle.len() / 2);
    let gap_right = span.saturating_sub(left.len() + gap_left + middle.len() + right.len());
    let _ = writeln!(
        out,
        "{:name_width$}  {left}{}{middle}{}{right}",
        "",
        " ".repeat(gap_left),
        " ".repeat(gap_right),
    );

    for forecast in forecasts {
        let active: HashSet<i64> = forecast
            .activity
            .iter()
            .map(|d| d.signed_duration_since(as_of).num_days())
            .collect();
        let bands = forecast_bands(forecast, as_of);

        let mut line = format!("{:<name_width$}  ", forecast.author);
        for offset in -VIEW_LIMIT..=VIEW_LIMIT {
            let band = bands
                .iter()
                .position(|&(from, to)| offset > from && offset <= to);
            let cell = if active.contains(&offset) {
                paint(ACTIVITY_MARK, "33", use_color)
            } else if let Some(index) = band {
                let mark = BAND_MARKS[index.min(BAND_MARKS.len() - 1)];
                paint(mark, "34", use_color)
            } else if offset == 0 {
                paint(TODAY_MARK, "31", use_color)
            } else {
                EMPTY_MARK.to_string()
            };
            line.push_str(&cell);
        }
        let _ = writeln!(out, "{line}");
    }

    let mut legend = format!("{ACTIVITY_MARK} activity");
    if let Some(first) = forecasts.first() {
        for (prediction, mark) in first.predictions.iter().zip(BAND_MARKS) {
            let _ = write!(legend, "  {mark} p={}", prediction.probability);
        }
    }
    let _ = writeln!(out, "\n{legend}");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;
    use gap_model::forecast::Prediction;
    use gap_model::survival::Quantile;
    use gap_model::window::DurationSample;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn forecast(author: &str, last: NaiveDate, quantiles: &[(f64, Quantile)]) -> Forecast {
        Forecast {
            author: author.into(),
            last_activity: last,
            activity: vec![last - Days::new(2), last],
            gaps: DurationSample::from(vec![1]),
            predictions: quantiles
                .iter()
                .map(|&(probability, quantile)| Prediction {
                    probability,
                    quantile,
                    date: quantile
                        .days()
                        .map(|days| last + Days::new(days)),
                })
                .collect(),
        }
    }

    fn sample() -> (Vec<Forecast>, ForecastOptions) {
        let as_of = day(2024, 6, 10);
        let mut options = ForecastOptions::new(as_of);
        options.probabilities = vec![0.5, 0.9];
        let forecasts = vec![
            forecast(
                "alice",
                day(2024, 6, 9),
                &[(0.5, Quantile::Resolved(1)), (0.9, Quantile::Resolved(4))],
            ),
            forecast(
                "Smith, Bob",
                day(2024, 6, 1),
                &[(0.5, Quantile::Resolved(3)), (0.9, Quantile::Unresolved)],
            ),
        ];
        (forecasts, options)
    }

    #[test]
    fn text_table_aligns_columns() {
        let (forecasts, options) = sample();
        let out = render(&forecasts, &options, OutputFormat::Text, false).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("author"));
        assert!(lines[0].ends_with("0.9"));
        assert!(lines[1].contains("2024-06-09"));
        assert!(lines[1].contains("2024-06-13"));
        assert!(lines[2].ends_with('-'));
    }

    #[test]
    fn csv_quotes_and_leaves_unresolved_empty() {
        let (forecasts, options) = sample();
        let out = render(&forecasts, &options, OutputFormat::Csv, false).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "author,last,0.5,0.9");
        assert_eq!(lines[1], "alice,2024-06-09,2024-06-10,2024-06-13");
        assert_eq!(lines[2], "\"Smith, Bob\",2024-06-01,2024-06-04,");
    }

    #[test]
    fn json_is_keyed_by_author() {
        let (forecasts, options) = sample();
        let out = render(&forecasts, &options, OutputFormat::Json, false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["alice"]["last"], "2024-06-09");
        assert_eq!(value["alice"]["predictions"][0]["probability"], 0.5);
        assert_eq!(value["alice"]["predictions"][0]["date"], "2024-06-10");
        assert!(value["Smith, Bob"]["predictions"][1]["date"].is_null());
    }

    #[test]
    fn json_keeps_repeated_probabilities() {
        let as_of = day(2024, 6, 10);
        let mut options = ForecastOptions::new(as_of);
        options.probabilities = vec![0.5, 0.5];
        let forecasts = vec![forecast(
            "alice",
            day(2024, 6, 9),
            &[(0.5, Quantile::Resolved(1)), (0.5, Quantile::Resolved(1))],
        )];
        let out = render(&forecasts, &options, OutputFormat::Json, false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        let predictions = value["alice"]["predictions"].as_array().unwrap();
        assert_eq!(predictions.len(), 2);
        assert!(predictions.iter().all(|p| p["date"] == "2024-06-10"));
    }

    #[test]
    fn markdown_has_header_separator() {
        let (forecasts, options) = sample();
        let out = render(&forecasts, &options, OutputFormat::Markdown, false).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "| author | last | 0.5 | 0.9 |");
        assert!(lines[1].starts_with("|--"));
        assert!(lines[2].starts_with("| `alice` |"));
    }

    #[test]
    fn bands_chain_from_previous_quantile() {
        let (forecasts, _) = sample();
        let as_of = day(2024, 6, 10);
        assert_eq!(forecast_bands(&forecasts[0], as_of), vec![(-1, 0), (0, 3)]);
        assert_eq!(
            forecast_bands(&forecasts[1], as_of),
            vec![(-9, -6), (-6, i64::MAX)]
        );
    }

    #[test]
    fn timeline_marks_activity_and_bands() {
        let (forecasts, options) = sample();
        let out = render(&forecasts, &options, OutputFormat::Timeline, false).unwrap();
        let alice = out.lines().find(|l| l.starts_with("alice")).unwrap();
        let cells: Vec<char> = alice.chars().skip("Smith, Bob".len() + 2).collect();
        assert_eq!(cells.len(), 57);

        let at = |offset: i64| cells[usize::try_from(offset + VIEW_LIMIT).unwrap()];
        assert_eq!(at(-1), ACTIVITY_MARK);
        assert_eq!(at(-3), ACTIVITY_MARK);
        assert_eq!(at(0), BAND_MARKS[0]);
        assert_eq!(at(1), BAND_MARKS[1]);
        assert_eq!(at(3), BAND_MARKS[1]);
        assert_eq!(at(4), EMPTY_MARK);
        assert!(out.contains("p=0.5"));
    }

    #[test]
    fn timeline_colors_only_when_asked() {
        let (forecasts, options) = sample();
        let plain = render(&forecasts, &options, OutputFormat::Timeline, false).unwrap();
        let colored = render(&forecasts, &options, OutputFormat::Timeline, true).unwrap();
        assert!(!plain.contains('\x1b'));
        assert!(colored.contains("\x1b[33m"));
    }
}
