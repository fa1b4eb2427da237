//! Aggregate accuracy over evaluation results.

use crate::result::EvalResult;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Metric {
    TimeAccuracy,
    DescriptionAccuracy,
    CurrencyAccuracy,
    AmountAccuracy,
    BusinessAccuracy,
    BusinessPrecision,
    BestMatchAccuracy,
}

impl Metric {
    pub const ALL: [Metric; 7] = [
        Metric::TimeAccuracy,
        Metric::DescriptionAccuracy,
        Metric::CurrencyAccuracy,
        Metric::AmountAccuracy,
        Metric::BusinessAccuracy,
        Metric::BusinessPrecision,
        Metric::BestMatchAccuracy,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Metric::TimeAccuracy => "e_t_accuracy",
            Metric::DescriptionAccuracy => "e_d_accuracy",
            Metric::CurrencyAccuracy => "e_c_accuracy",
            Metric::AmountAccuracy => "e_a_accuracy",
            Metric::BusinessAccuracy => "e_b_accuracy",
            Metric::BusinessPrecision => "e_b_precision",
            Metric::BestMatchAccuracy => "is_b_best_match_accuracy",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Metric::TimeAccuracy => "Time accuracy",
            Metric::DescriptionAccuracy => "Description accuracy",
            Metric::CurrencyAccuracy => "Currency accuracy",
            Metric::AmountAccuracy => "Amount accuracy",
            Metric::BusinessAccuracy => "Business accuracy",
            Metric::BusinessPrecision => "Business average precision",
            Metric::BestMatchAccuracy => "LLM business match precision",
        }
    }
}

/// Fractional metric values in [0, 1]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "BTreeMap<&'static str, f64>")]
pub struct MetricsReport {
    values: [f64; 7],
}

impl MetricsReport {
    pub fn get(&self, metric: Metric) -> f64 {
        self.values[metric as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Metric, f64)> + '_ {
        Metric::ALL.iter().map(move |m| (*m, self.get(*m)))
    }

    /// Human-readable listing; percentages are display only
    pub fn render(&self) -> String {
        let mut out = String::from("Metrics:\n");
        for (metric, value) in self.iter() {
            out.push_str(&format!(
                "  {}: {:.4} ({:.2}%)\n",
                metric.display_name(),
                value,
                value * 100.0
            ));
        }
        out
    }
}

impl From<MetricsReport> for BTreeMap<&'static str, f64> {
    fn from(report: MetricsReport) -> Self {
        report.iter().map(|(m, v)| (m.key(), v)).collect()
    }
}

impl fmt::Display for MetricsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Fold results into metrics. Every metric divides by the total row count;
/// an empty input yields all zeros.
///
/// Business precision adds `1 / candidate_count` for each matched row, or
/// `1` when the count is zero.
pub fn aggregate(results: &[EvalResult]) -> MetricsReport {
    let total = results.len();
    if total == 0 {
        return MetricsReport { values: [0.0; 7] };
    }

    let mut sums = [0.0f64; 7];
    for r in results {
        let flags = [
            (Metric::TimeAccuracy, r.datetime_matched),
            (Metric::DescriptionAccuracy, r.description_matched),
            (Metric::CurrencyAccuracy, r.currency_matched),
            (Metric::AmountAccuracy, r.amount_matched),
            (Metric::BusinessAccuracy, r.business_matched),
            (Metric::BestMatchAccuracy, r.best_candidate_matched),
        ];
        for (metric, flag) in flags {
            if flag {
                sums[metric as usize] += 1.0;
            }
        }
        if r.business_matched {
            sums[Metric::BusinessPrecision as usize] += match r.candidate_count {
                0 => 1.0,
                n => 1.0 / n as f64,
            };
        }
    }

    let values = sums.map(|s| s / total as f64);
    MetricsReport { values }
}
