//! Global Talent Competitiveness Index scores and the yearly report.
//!
//! Scores are stored one per (country, year, pillar). The report ranks
//! countries by their overall score: the `Overall` pillar when recorded,
//! otherwise the mean of the pillars that are.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DeskError, Result};
use crate::record::{parse_choice, Record, RecordKind};
use crate::validation::require_text;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GtciPillar {
    Enable,
    Attract,
    Grow,
    Retain,
    VocationalSkills,
    GlobalKnowledgeSkills,
    Overall,
}

const PILLARS: [(GtciPillar, &str, &str); 7] = [
    (GtciPillar::Enable, "enable", "Enable"),
    (GtciPillar::Attract, "attract", "Attract"),
    (GtciPillar::Grow, "grow", "Grow"),
    (GtciPillar::Retain, "retain", "Retain"),
    (
        GtciPillar::VocationalSkills,
        "vocational_skills",
        "Vocational and Technical Skills",
    ),
    (
        GtciPillar::GlobalKnowledgeSkills,
        "global_knowledge_skills",
        "Global Knowledge Skills",
    ),
    (GtciPillar::Overall, "overall", "Overall"),
];

impl GtciPillar {
    /// The six input pillars, without `Overall`.
    pub const INPUTS: [GtciPillar; 6] = [
        GtciPillar::Enable,
        GtciPillar::Attract,
        GtciPillar::Grow,
        GtciPillar::Retain,
        GtciPillar::VocationalSkills,
        GtciPillar::GlobalKnowledgeSkills,
    ];

    pub fn label(&self) -> &'static str {
        PILLARS
            .iter()
            .find(|(pillar, _, _)| pillar == self)
            .map(|(_, _, label)| *label)
            .unwrap_or("Unknown")
    }
}

impl fmt::Display for GtciPillar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for GtciPillar {
    type Err = DeskError;

    fn from_str(value: &str) -> Result<Self> {
        parse_choice(value, &PILLARS, "pillar")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GtciScore {
    pub country: String,
    pub year: i32,
    pub pillar: GtciPillar,
    pub score: f64,
}

impl Record for GtciScore {
    const KIND: RecordKind = RecordKind::GtciScore;

    fn validate(&self) -> Result<()> {
        require_text("Country", &self.country)?;
        if !self.score.is_finite() || !(0.0..=100.0).contains(&self.score) {
            return Err(DeskError::Validation(format!(
                "Score must be between 0 and 100 (got {})",
                self.score
            )));
        }
        if !(1900..=2200).contains(&self.year) {
            return Err(DeskError::Validation(format!("Implausible year {}", self.year)));
        }
        Ok(())
    }

    fn search_text(&self) -> String {
        format!("{} {} gtci {}", self.country, self.year, self.pillar.label())
    }
}

/// Parse a JSON array of scores, validating each one.
pub fn parse_scores(json: &str) -> Result<Vec<GtciScore>> {
    let scores: Vec<GtciScore> = serde_json::from_str(json)
        .map_err(|e| DeskError::InvalidInput(format!("Invalid GTCI score file: {}", e)))?;
    for (index, score) in scores.iter().enumerate() {
        score
            .validate()
            .map_err(|e| DeskError::InvalidInput(format!("Score #{}: {}", index + 1, e)))?;
    }
    Ok(scores)
}

/// One ranked country in a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryRanking {
    pub rank: usize,
    pub country: String,
    pub score: f64,
    pub pillars: BTreeMap<GtciPillar, f64>,
    pub previous_score: Option<f64>,
    pub previous_rank: Option<usize>,
    /// score - previous score
    pub score_change: Option<f64>,
    /// previous rank - rank, positive when the country climbed
    pub rank_change: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GtciReport {
    pub year: i32,
    pub rankings: Vec<CountryRanking>,
    /// Mean score per input pillar across countries
    pub pillar_averages: BTreeMap<GtciPillar, f64>,
}

/// Country display name keyed by its case-folded form, with pillar scores.
/// Later duplicates of the same pillar replace earlier ones.
fn collect_year<'a, I>(scores: I, year: i32) -> BTreeMap<String, (String, BTreeMap<GtciPillar, f64>)>
where
    I: IntoIterator<Item = &'a GtciScore>,
{
    let mut countries: BTreeMap<String, (String, BTreeMap<GtciPillar, f64>)> = BTreeMap::new();
    for score in scores.into_iter().filter(|s| s.year == year) {
        let name = score.country.trim();
        let entry = countries
            .entry(name.to_lowercase())
            .or_insert_with(|| (name.to_string(), BTreeMap::new()));
        entry.1.insert(score.pillar, score.score);
    }
    countries
}

fn overall_score(pillars: &BTreeMap<GtciPillar, f64>) -> Option<f64> {
    if let Some(overall) = pillars.get(&GtciPillar::Overall) {
        return Some(*overall);
    }
    let inputs: Vec<f64> = pillars
        .iter()
        .filter(|(pillar, _)| **pillar != GtciPillar::Overall)
        .map(|(_, score)| *score)
        .collect();
    if inputs.is_empty() {
        None
    } else {
        Some(inputs.iter().sum::<f64>() / inputs.len() as f64)
    }
}

/// Rank by score descending with competition ranking (1, 2, 2, 4).
/// Equal scores are listed by country name.
fn rank(scored: Vec<(String, String, f64)>) -> Vec<(usize, String, String, f64)> {
    let mut scored = scored;
    scored.sort_by(|a, b| b.2.total_cmp(&a.2).then_with(|| a.0.cmp(&b.0)));

    let mut ranked = Vec::with_capacity(scored.len());
    let mut previous: Option<f64> = None;
    let mut current_rank = 0;
    for (position, (key, name, score)) in scored.into_iter().enumerate() {
        if previous != Some(score) {
            current_rank = position + 1;
            previous = Some(score);
        }
        ranked.push((current_rank, key, name, score));
    }
    ranked
}

impl GtciReport {
    pub fn build<'a, I>(scores: I, year: i32) -> Self
    where
        I: IntoIterator<Item = &'a GtciScore> + Clone,
    {
        let current = collect_year(scores.clone(), year);
        let previous = collect_year(scores, year - 1);

        let previous_ranks: BTreeMap<String, (usize, f64)> = rank(
            previous
                .iter()
                .filter_map(|(key, (name, pillars))| {
                    overall_score(pillars).map(|s| (key.clone(), name.clone(), s))
                })
                .collect(),
        )
        .into_iter()
        .map(|(rank, key, _, score)| (key, (rank, score)))
        .collect();

        let ranked = rank(
            current
                .iter()
                .filter_map(|(key, (name, pillars))| {
                    overall_score(pillars).map(|s| (key.clone(), name.clone(), s))
                })
                .collect(),
        );

        let rankings = ranked
            .into_iter()
            .map(|(rank, key, country, score)| {
                let prior = previous_ranks.get(&key);
                CountryRanking {
                    rank,
                    country,
                    score,
                    pillars: current.get(&key).map(|(_, p)| p.clone()).unwrap_or_default(),
                    previous_score: prior.map(|(_, s)| *s),
                    previous_rank: prior.map(|(r, _)| *r),
                    score_change: prior.map(|(_, s)| score - s),
                    rank_change: prior.map(|(r, _)| *r as i64 - rank as i64),
                }
            })
            .collect();

        let mut pillar_averages = BTreeMap::new();
        for pillar in GtciPillar::INPUTS {
            let values: Vec<f64> = current
                .values()
                .filter_map(|(_, pillars)| pillars.get(&pillar).copied())
                .collect();
            if !values.is_empty() {
                pillar_averages.insert(pillar, values.iter().sum::<f64>() / values.len() as f64);
            }
        }

        Self {
            year,
            rankings,
            pillar_averages,
        }
    }

    /// Keep the first `n` ranked entries.
    pub fn top(mut self, n: usize) -> Self {
        self.rankings.truncate(n);
        self
    }

    pub fn country(&self, name: &str) -> Option<&CountryRanking> {
        let needle = name.trim().to_lowercase();
        self.rankings
            .iter()
            .find(|r| r.country.to_lowercase() == needle)
    }
}

/// Distinct years present, newest first.
pub fn years(scores: &[GtciScore]) -> Vec<i32> {
    let mut years: Vec<i32> = scores.iter().map(|s| s.year).collect();
    years.sort_unstable_by(|a, b| b.cmp(a));
    years.dedup();
    years
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(country: &str, year: i32, pillar: GtciPillar, value: f64) -> GtciScore {
        GtciScore {
            country: country.to_string(),
            year,
            pillar,
            score: value,
        }
    }

    #[test]
    fn test_overall_pillar_takes_precedence() {
        let scores = vec![
            score("Norway", 2024, GtciPillar::Enable, 10.0),
            score("Norway", 2024, GtciPillar::Overall, 70.0),
        ];
        let report = GtciReport::build(&scores, 2024);
        assert_eq!(report.rankings[0].score, 70.0);
    }

    #[test]
    fn test_mean_of_pillars_without_overall() {
        let scores = vec![
            score("Chile", 2024, GtciPillar::Grow, 40.0),
            score("Chile", 2024, GtciPillar::Retain, 60.0),
        ];
        let report = GtciReport::build(&scores, 2024);
        assert_eq!(report.rankings[0].score, 50.0);
        assert_eq!(report.pillar_averages[&GtciPillar::Grow], 40.0);
    }

    #[test]
    fn test_competition_ranking_with_ties() {
        let scores = vec![
            score("Denmark", 2024, GtciPillar::Overall, 75.0),
            score("Austria", 2024, GtciPillar::Overall, 75.0),
            score("Brazil", 2024, GtciPillar::Overall, 40.0),
            score("Sweden", 2024, GtciPillar::Overall, 80.0),
        ];
        let report = GtciReport::build(&scores, 2024);
        let ranks: Vec<(usize, &str)> = report
            .rankings
            .iter()
            .map(|r| (r.rank, r.country.as_str()))
            .collect();
        assert_eq!(
            ranks,
            vec![(1, "Sweden"), (2, "Austria"), (2, "Denmark"), (4, "Brazil")]
        );
    }

    #[test]
    fn test_year_over_year_deltas() {
        let scores = vec![
            score("Japan", 2023, GtciPillar::Overall, 60.0),
            score("Korea", 2023, GtciPillar::Overall, 65.0),
            score("Japan", 2024, GtciPillar::Overall, 68.0),
            score("Korea", 2024, GtciPillar::Overall, 66.0),
            score("Peru", 2024, GtciPillar::Overall, 30.0),
        ];
        let report = GtciReport::build(&scores, 2024);

        let japan = report.country("japan").unwrap();
        assert_eq!(japan.rank, 1);
        assert_eq!(japan.previous_rank, Some(2));
        assert_eq!(japan.rank_change, Some(1));
        assert_eq!(japan.score_change, Some(8.0));

        let peru = report.country("Peru").unwrap();
        assert_eq!(peru.previous_score, None);
        assert_eq!(peru.rank_change, None);

        assert_eq!(report.top(2).rankings.len(), 2);
    }

    #[test]
    fn test_country_names_merge_case_insensitively() {
        let scores = vec![
            score("France", 2024, GtciPillar::Enable, 50.0),
            score("france ", 2024, GtciPillar::Attract, 70.0),
        ];
        let report = GtciReport::build(&scores, 2024);
        assert_eq!(report.rankings.len(), 1);
        assert_eq!(report.rankings[0].score, 60.0);
    }

    #[test]
    fn test_parse_scores_validates() {
        let ok = r#"[{"country":"Italy","year":2024,"pillar":"grow","score":55.5}]"#;
        assert_eq!(parse_scores(ok).unwrap().len(), 1);

        let out_of_range = r#"[{"country":"Italy","year":2024,"pillar":"grow","score":155}]"#;
        assert!(parse_scores(out_of_range).is_err());
        assert!(parse_scores("{not json").is_err());
    }

    #[test]
    fn test_years_newest_first() {
        let scores = vec![
            score("A", 2022, GtciPillar::Overall, 1.0),
            score("B", 2024, GtciPillar::Overall, 1.0),
            score("C", 2022, GtciPillar::Overall, 1.0),
        ];
        assert_eq!(years(&scores), vec![2024, 2022]);
    }
}
