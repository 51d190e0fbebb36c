//! Natural-breaks classification.
//!
//! Values are partitioned into k contiguous clusters minimizing the
//! within-cluster sum of squares (exact 1-D optimal clustering, not
//! quantiles or equal intervals). The minimum of each cluster after the
//! first becomes a breakpoint of a threshold scale mapping values onto an
//! ordered palette.

use crate::config::Rgb;
use crate::load::Record;

/// Partition `values` into at most `k` contiguous clusters of sorted
/// values, minimizing within-cluster variance.
///
/// Non-finite inputs are excluded. When there are fewer distinct values
/// than clusters the partition degenerates gracefully: every cluster holds
/// one distinct run, down to a single cluster when all values are equal.
pub fn ckmeans(values: &[f64], k: usize) -> Vec<Vec<f64>> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    if sorted.is_empty() || k == 0 {
        return Vec::new();
    }

    let distinct = 1 + sorted.windows(2).filter(|w| w[0] != w[1]).count();
    let k = k.min(distinct);
    if k == 1 {
        return vec![sorted];
    }

    let n = sorted.len();

    // Prefix sums for O(1) within-cluster sum-of-squares queries.
    let mut sum = vec![0.0; n + 1];
    let mut sum_sq = vec![0.0; n + 1];
    for (i, &v) in sorted.iter().enumerate() {
        sum[i + 1] = sum[i] + v;
        sum_sq[i + 1] = sum_sq[i] + v * v;
    }
    // Cost of the cluster sorted[lo..hi]
    let ssq = |lo: usize, hi: usize| -> f64 {
        let s = sum[hi] - sum[lo];
        let s2 = sum_sq[hi] - sum_sq[lo];
        let count = (hi - lo) as f64;
        (s2 - s * s / count).max(0.0)
    };

    // cost[j][i]: minimal cost of the first i values split into j clusters.
    // back[j][i]: start index of the last cluster in that optimum.
    let mut cost = vec![vec![f64::INFINITY; n + 1]; k + 1];
    let mut back = vec![vec![0usize; n + 1]; k + 1];
    for i in 1..=n {
        cost[1][i] = ssq(0, i);
    }
    for j in 2..=k {
        for i in j..=n {
            for split in (j - 1)..i {
                let c = cost[j - 1][split] + ssq(split, i);
                if c < cost[j][i] {
                    cost[j][i] = c;
                    back[j][i] = split;
                }
            }
        }
    }

    // Backtrack cluster boundaries.
    let mut bounds = vec![n];
    let mut i = n;
    for j in (2..=k).rev() {
        i = back[j][i];
        bounds.push(i);
    }
    bounds.push(0);
    bounds.reverse();

    bounds
        .windows(2)
        .map(|w| sorted[w[0]..w[1]].to_vec())
        .collect()
}

/// Step function mapping numeric ranges onto successive output indices.
///
/// For breakpoints b1 <= b2 <= ... a value maps to the count of
/// breakpoints at or below it: index 0 below b1, the last index at or
/// above the final breakpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdScale {
    breaks: Vec<f64>,
}

impl ThresholdScale {
    pub fn new(breaks: Vec<f64>) -> Self {
        Self { breaks }
    }

    pub fn breaks(&self) -> &[f64] {
        &self.breaks
    }

    /// Output index for a value; None for non-finite input.
    pub fn index(&self, value: f64) -> Option<usize> {
        if !value.is_finite() {
            return None;
        }
        Some(self.breaks.partition_point(|b| *b <= value))
    }
}

/// A threshold scale bound to an ordered palette, rebuilt from scratch
/// whenever the active attribute changes.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScale {
    scale: ThresholdScale,
    palette: Vec<Rgb>,
    no_data: Rgb,
}

impl ColorScale {
    /// Classify one attribute across all records into a color scale.
    pub fn build(
        records: &[Record],
        attribute: &str,
        palette: &[Rgb],
        no_data: Rgb,
        classes: usize,
    ) -> Self {
        let values: Vec<f64> = records.iter().map(|r| r.value(attribute)).collect();
        let clusters = ckmeans(&values, classes.min(palette.len()));
        // Breakpoints are the minimums of every cluster after the first.
        let breaks = clusters.iter().skip(1).map(|c| c[0]).collect();
        Self {
            scale: ThresholdScale::new(breaks),
            palette: palette.to_vec(),
            no_data,
        }
    }

    pub fn breaks(&self) -> &[f64] {
        self.scale.breaks()
    }

    pub fn no_data(&self) -> Rgb {
        self.no_data
    }

    /// Color for a value; missing / unparseable values get the neutral
    /// no-data color, never a palette entry.
    pub fn color(&self, value: f64) -> Rgb {
        match self.scale.index(value) {
            Some(i) => self.palette[i.min(self.palette.len() - 1)],
            None => self.no_data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const PALETTE: [Rgb; 5] = [
        Rgb(0x91, 0xC4, 0xD9),
        Rgb(0x4B, 0x8C, 0xA6),
        Rgb(0x24, 0x5C, 0x73),
        Rgb(0x0A, 0x31, 0x40),
        Rgb(0x02, 0x18, 0x26),
    ];
    const NO_DATA: Rgb = Rgb(0xCC, 0xCC, 0xCC);

    fn record(label: &str, attr: &str, value: &str) -> Record {
        let mut fields = HashMap::new();
        fields.insert(attr.to_string(), value.to_string());
        Record {
            label: label.to_string(),
            fields,
        }
    }

    fn scale_over(values: &[&str], k: usize) -> ColorScale {
        let records: Vec<Record> = values
            .iter()
            .enumerate()
            .map(|(i, v)| record(&format!("r{}", i), "x", v))
            .collect();
        ColorScale::build(&records, "x", &PALETTE[..], NO_DATA, k)
    }

    #[test]
    fn separates_two_obvious_clusters() {
        let clusters = ckmeans(&[10.0, 12.0, 11.0, 100.0, 102.0, 101.0], 2);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0], vec![10.0, 11.0, 12.0]);
        assert_eq!(clusters[1], vec![100.0, 101.0, 102.0]);

        let scale = scale_over(&["10", "12", "11", "100", "102", "101"], 2);
        assert_ne!(scale.color(50.0), scale.color(105.0));
    }

    #[test]
    fn three_region_scenario() {
        // Values 5, 7, 50 with two classes: breakpoint at 50.
        let scale = scale_over(&["5", "7", "50"], 2);
        assert_eq!(scale.breaks(), &[50.0]);
        assert_eq!(scale.color(6.0), PALETTE[0]);
        assert_eq!(scale.color(50.0), PALETTE[1]);
    }

    #[test]
    fn breaks_are_nondecreasing_and_k_minus_one() {
        let values = ["3", "8", "1", "42", "17", "99", "23", "5", "61", "74"];
        let scale = scale_over(&values, 5);
        assert_eq!(scale.breaks().len(), 4);
        for pair in scale.breaks().windows(2) {
            assert!(pair[0] <= pair[1]);
        }
    }

    #[test]
    fn identical_values_resolve_to_one_color() {
        let scale = scale_over(&["7", "7", "7", "7"], 5);
        assert!(scale.breaks().is_empty());
        assert_eq!(scale.color(7.0), PALETTE[0]);
    }

    #[test]
    fn empty_input_does_not_panic() {
        let scale = scale_over(&[], 5);
        assert!(scale.breaks().is_empty());
        assert_eq!(scale.color(1.0), PALETTE[0]);
        assert_eq!(scale.color(f64::NAN), NO_DATA);
    }

    #[test]
    fn missing_values_classify_as_no_data() {
        let scale = scale_over(&["N/A", "", "5", "7", "50"], 2);
        assert_eq!(scale.color(f64::NAN), NO_DATA);
        assert_ne!(scale.color(f64::NAN), PALETTE[0]);
        // Non-finite inputs never shift the breakpoints either.
        assert_eq!(scale.breaks(), &[50.0]);
    }

    #[test]
    fn rebuilding_over_unchanged_data_is_idempotent() {
        let values = ["3", "8", "1", "42", "17", "99", "23", "5", "61", "74"];
        let first = scale_over(&values, 5);
        let second = scale_over(&values, 5);
        assert_eq!(first.breaks(), second.breaks());
    }

    #[test]
    fn ckmeans_handles_fewer_distinct_than_k() {
        let clusters = ckmeans(&[1.0, 1.0, 2.0], 5);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0], vec![1.0, 1.0]);
        assert_eq!(clusters[1], vec![2.0]);
    }
}
