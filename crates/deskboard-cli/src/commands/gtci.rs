use std::collections::HashMap;
use std::path::Path;

use deskboard_core::gtci::{self, GtciPillar, GtciReport, GtciScore};
use deskboard_core::storage::RecordFilter;
use deskboard_core::StorageEngine;
use uuid::Uuid;

use crate::app::AppContext;
use crate::cli::{GtciCommand, OutputArgs};
use crate::errors::CliError;
use crate::output::{print_json, print_receipt};
use crate::ui::format::format_change;
use crate::ui::{blank_line, columns, kv, print, section, table, UiContext};

use super::print_header;

const IMPORT_HINT: &str = "Hint: Import scores with `deskboard gtci import <FILE>`.";

pub fn handle(ctx: &AppContext, command: &GtciCommand) -> anyhow::Result<()> {
    match command {
        GtciCommand::Import { file } => handle_import(ctx, file),
        GtciCommand::Report {
            year,
            top,
            country,
            output,
        } => handle_report(ctx, *year, *top, country.as_deref(), output),
    }
}

/// Scores are unique per (country, year, pillar); country names compare
/// case-insensitively.
fn score_key(score: &GtciScore) -> (String, i32, GtciPillar) {
    (score.country.trim().to_lowercase(), score.year, score.pillar)
}

fn handle_import(ctx: &AppContext, file: &str) -> anyhow::Result<()> {
    let ui = ctx.ui_context(false, None);
    let path = Path::new(file);
    let contents = std::fs::read_to_string(path).map_err(|e| {
        CliError::not_found(
            format!("Cannot read {}: {}", path.display(), e),
            "Hint: Pass the path to a JSON array of {country, year, pillar, score} objects.",
        )
    })?;
    let scores =
        gtci::parse_scores(&contents).map_err(|e| CliError::invalid_input(e.to_string()))?;

    let mut store = ctx.open_store()?;
    let mut existing: HashMap<(String, i32, GtciPillar), Uuid> = store
        .storage
        .list::<GtciScore>(&store.session, &RecordFilter::new())?
        .into_iter()
        .map(|s| (score_key(&s.record), s.id))
        .collect();

    let (mut added, mut replaced) = (0usize, 0usize);
    for score in &scores {
        let score = GtciScore {
            country: score.country.trim().to_string(),
            ..score.clone()
        };
        match existing.get(&score_key(&score)).copied() {
            Some(id) => {
                store.storage.update(&store.session, &id, &score)?;
                replaced += 1;
            }
            None => {
                let id = store.storage.insert(&store.session, &score)?;
                existing.insert(score_key(&score), id);
                added += 1;
            }
        }
    }
    store.close()?;
    log::debug!(
        "imported {} gtci scores ({} new, {} replaced)",
        scores.len(),
        added,
        replaced
    );

    let added = added.to_string();
    let replaced = replaced.to_string();
    print_receipt(
        &ui,
        ctx.quiet(),
        "Imported GTCI scores",
        &[("Added", &added), ("Replaced", &replaced)],
    );
    Ok(())
}

fn optional(value: Option<f64>, decimals: usize) -> String {
    value
        .map(|v| format!("{:.*}", decimals, v))
        .unwrap_or_else(|| "-".to_string())
}

fn handle_report(
    ctx: &AppContext,
    year: Option<i32>,
    top: Option<usize>,
    country: Option<&str>,
    output: &OutputArgs,
) -> anyhow::Result<()> {
    let ui = ctx.ui(output);
    let store = ctx.open_store()?;
    let scores: Vec<GtciScore> = store
        .storage
        .list::<GtciScore>(&store.session, &RecordFilter::new())?
        .into_iter()
        .map(|s| s.record)
        .collect();

    let years = gtci::years(&scores);
    let year = match year {
        Some(year) if years.contains(&year) => year,
        Some(year) => {
            return Err(
                CliError::not_found(format!("No GTCI scores for {}", year), IMPORT_HINT).into(),
            );
        }
        None => *years
            .first()
            .ok_or_else(|| CliError::not_found("No GTCI scores imported yet", IMPORT_HINT))?,
    };

    let mut report = GtciReport::build(&scores, year);

    if let Some(name) = country {
        let ranking = report.country(name).cloned().ok_or_else(|| {
            CliError::not_found(
                format!("{} is not ranked in {}", name, year),
                "Hint: Run `deskboard gtci report` to see ranked countries.",
            )
        })?;
        if ui.mode.is_json() {
            return print_json(&ranking);
        }
        print_header(ctx, &ui, "gtci report", Some(&format!("{} {}", ranking.country, year)));
        print(&ui, &kv(&ui, "Rank", &ranking.rank.to_string()));
        print(&ui, &kv(&ui, "Score", &format!("{:.2}", ranking.score)));
        let previous_rank = ranking
            .previous_rank
            .map(|r| r.to_string())
            .unwrap_or_else(|| "-".to_string());
        print(&ui, &kv(&ui, "Previous Rank", &previous_rank));
        print(&ui, &kv(&ui, "Previous Score", &optional(ranking.previous_score, 2)));
        print(
            &ui,
            &kv(
                &ui,
                "Score Change",
                &ranking
                    .score_change
                    .map(|c| format_change(c, 2))
                    .unwrap_or_else(|| "-".to_string()),
            ),
        );
        blank_line(&ui);
        print(&ui, &section(&ui, "Pillars"));
        let rows: Vec<Vec<String>> = GtciPillar::INPUTS
            .iter()
            .map(|pillar| {
                vec![
                    pillar.label().to_string(),
                    optional(ranking.pillars.get(pillar).copied(), 2),
                    optional(report.pillar_averages.get(pillar).copied(), 2),
                ]
            })
            .collect();
        print(&ui, &table(&ui, &columns(&["Pillar", "Score", "Average"]), &rows));
        return Ok(());
    }

    if let Some(n) = top {
        report = report.top(n);
    }

    if ui.mode.is_json() {
        return print_json(&report);
    }
    print_rankings(ctx, &ui, &report);
    Ok(())
}

fn print_rankings(ctx: &AppContext, ui: &UiContext, report: &GtciReport) {
    print_header(ctx, ui, "gtci report", Some(&report.year.to_string()));
    let rows: Vec<Vec<String>> = report
        .rankings
        .iter()
        .map(|r| {
            vec![
                r.rank.to_string(),
                r.country.clone(),
                format!("{:.2}", r.score),
                r.score_change
                    .map(|c| format_change(c, 2))
                    .unwrap_or_else(|| "-".to_string()),
                r.rank_change
                    .map(|c| format_change(c as f64, 0))
                    .unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect();
    print(
        ui,
        &table(ui, &columns(&["Rank", "Country", "Score", "Change", "Rank Change"]), &rows),
    );

    if !report.pillar_averages.is_empty() {
        blank_line(ui);
        print(ui, &section(ui, "Pillar Averages"));
        let rows: Vec<Vec<String>> = report
            .pillar_averages
            .iter()
            .map(|(pillar, avg)| vec![pillar.label().to_string(), format!("{:.2}", avg)])
            .collect();
        print(ui, &table(ui, &columns(&["Pillar", "Average"]), &rows));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_key_folds_country_case() {
        let a = GtciScore {
            country: " Switzerland".to_string(),
            year: 2023,
            pillar: GtciPillar::Overall,
            score: 78.9,
        };
        let b = GtciScore {
            country: "switzerland".to_string(),
            ..a.clone()
        };
        assert_eq!(score_key(&a), score_key(&b));
    }
}
