//! Built-in judge comparing experiment and control means.
//!
//! Each metric is classified by the relative change of the experiment mean
//! against the control mean, within the metric's tolerance and direction.
//! Metric classifications roll up into group scores and an overall score,
//! which the thresholds turn into `Pass`, `Marginal` or `Fail`.

use std::collections::BTreeMap;

use crate::domain::{
    CanaryConfig, CanaryJudgeResult, ClassifierThresholds, GroupScore, JudgementScore,
    MetricAnalysisConfig, MetricAnalysisResult, MetricClassification, MetricSetPair, Result,
    ScoreClassification,
};
use crate::judge::CanaryJudge;

pub const DEFAULT_MEAN_DELTA_JUDGE: &str = "mean-delta-v1";

/// Metrics with no group are scored under this name.
const UNGROUPED: &str = "default";

#[derive(Debug, Clone)]
pub struct MeanDeltaJudge {
    name: String,
}

impl MeanDeltaJudge {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for MeanDeltaJudge {
    fn default() -> Self {
        Self::new(DEFAULT_MEAN_DELTA_JUDGE)
    }
}

fn mean(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        None
    } else {
        Some(samples.iter().sum::<f64>() / samples.len() as f64)
    }
}

fn classify_metric(
    pair: &MetricSetPair,
    analysis: &MetricAnalysisConfig,
    groups: Vec<String>,
) -> MetricAnalysisResult {
    let control_mean = mean(&pair.control());
    let experiment_mean = mean(&pair.experiment());

    let mut result = MetricAnalysisResult {
        name: pair.name.clone(),
        id: pair.id.clone(),
        classification: MetricClassification::Nodata,
        classification_reason: None,
        groups,
        critical: analysis.critical,
        control_mean,
        experiment_mean,
        relative_delta: None,
    };

    let (Some(control), Some(experiment)) = (control_mean, experiment_mean) else {
        result.classification_reason = Some("missing control or experiment data".to_string());
        return result;
    };

    let delta = if control == 0.0 {
        if experiment == 0.0 {
            0.0
        } else {
            experiment.signum() * f64::INFINITY
        }
    } else {
        (experiment - control) / control.abs()
    };
    result.relative_delta = delta.is_finite().then_some(delta);

    result.classification = if delta > analysis.tolerance && analysis.direction.flags_increase() {
        result.classification_reason = Some(format!(
            "experiment mean {experiment} exceeds control mean {control} beyond tolerance {}",
            analysis.tolerance
        ));
        MetricClassification::High
    } else if delta < -analysis.tolerance && analysis.direction.flags_decrease() {
        result.classification_reason = Some(format!(
            "experiment mean {experiment} falls below control mean {control} beyond tolerance {}",
            analysis.tolerance
        ));
        MetricClassification::Low
    } else {
        MetricClassification::Pass
    };
    result
}

fn group_scores(results: &[MetricAnalysisResult]) -> Vec<GroupScore> {
    let mut counts: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for result in results.iter().filter(|r| r.classification.is_classified()) {
        let passed = usize::from(result.classification == MetricClassification::Pass);
        if result.groups.is_empty() {
            let entry = counts.entry(UNGROUPED).or_default();
            entry.0 += passed;
            entry.1 += 1;
        }
        for group in &result.groups {
            let entry = counts.entry(group.as_str()).or_default();
            entry.0 += passed;
            entry.1 += 1;
        }
    }

    counts
        .into_iter()
        .map(|(name, (passing, classified))| GroupScore {
            name: name.to_string(),
            score: 100.0 * passing as f64 / classified as f64,
            classified_metrics: classified,
            passing_metrics: passing,
        })
        .collect()
}

fn overall_score(
    config: &CanaryConfig,
    results: &[MetricAnalysisResult],
    groups: &[GroupScore],
) -> f64 {
    if let Some(weights) = config.group_weights() {
        let (weighted, total) = groups
            .iter()
            .filter_map(|g| weights.get(&g.name).map(|w| (g.score, *w)))
            .filter(|(_, w)| *w > 0.0)
            .fold((0.0, 0.0), |(acc, sum), (score, w)| (acc + score * w, sum + w));
        if total > 0.0 {
            return weighted / total;
        }
    }

    let classified = results
        .iter()
        .filter(|r| r.classification.is_classified())
        .count();
    let passing = results
        .iter()
        .filter(|r| r.classification == MetricClassification::Pass)
        .count();
    100.0 * passing as f64 / classified as f64
}

impl CanaryJudge for MeanDeltaJudge {
    fn name(&self) -> &str {
        &self.name
    }

    fn judge(
        &self,
        config: &CanaryConfig,
        thresholds: &ClassifierThresholds,
        metric_set_pairs: &[MetricSetPair],
    ) -> Result<CanaryJudgeResult> {
        let results: Vec<MetricAnalysisResult> = metric_set_pairs
            .iter()
            .map(|pair| match config.metric(&pair.name) {
                Some(metric) => classify_metric(pair, &metric.analysis, metric.groups.clone()),
                None => classify_metric(pair, &MetricAnalysisConfig::default(), Vec::new()),
            })
            .collect();

        if !results.iter().any(|r| r.classification.is_classified()) {
            return Ok(CanaryJudgeResult {
                judge_name: self.name.clone(),
                results,
                group_scores: Vec::new(),
                score: JudgementScore {
                    score: 0.0,
                    classification: ScoreClassification::Nodata,
                    classification_reason: Some("no metric has data".to_string()),
                },
            });
        }

        let groups = group_scores(&results);
        let score = overall_score(config, &results, &groups);

        let failed_critical = results.iter().find(|r| {
            r.critical
                && matches!(
                    r.classification,
                    MetricClassification::High | MetricClassification::Low
                )
        });

        let (classification, reason) = if let Some(metric) = failed_critical {
            (
                ScoreClassification::Fail,
                Some(format!("critical metric {} failed", metric.name)),
            )
        } else if score >= thresholds.pass {
            (ScoreClassification::Pass, None)
        } else if score >= thresholds.marginal {
            (
                ScoreClassification::Marginal,
                Some(format!("score {score:.2} is below pass threshold {}", thresholds.pass)),
            )
        } else {
            (
                ScoreClassification::Fail,
                Some(format!(
                    "score {score:.2} is below marginal threshold {}",
                    thresholds.marginal
                )),
            )
        };

        Ok(CanaryJudgeResult {
            judge_name: self.name.clone(),
            results,
            group_scores: groups,
            score: JudgementScore {
                score,
                classification,
                classification_reason: reason,
            },
        })
    }
}
