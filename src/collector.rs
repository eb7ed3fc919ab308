use std::collections::BTreeMap;

use hashbrown::HashSet;

use crate::options::LookupOptions;
use crate::types::Weight;

/// One analysis: the sequence of non-empty printable symbol strings the search
/// wrote along a path to a final state. Epsilon and flag-diacritic symbols print
/// as the empty string and are never pushed onto this vector.
pub type Analysis = Vec<String>;

fn joined(analysis: &Analysis) -> String {
    analysis.concat()
}

/// Accumulates emissions from the search in one of the four variants selected by
/// `weighted x unique`, then applies `n_best`/`beam` filtering at `finish` time.
pub enum Collector {
    PlainAll(Vec<Analysis>),
    PlainUnique { seen: HashSet<String>, order: Vec<Analysis> },
    WeightedAll(Vec<(Weight, Analysis)>),
    /// Keyed by the concatenated analysis string in a `BTreeMap`, not a `HashMap`:
    /// `finish` sorts by weight only, so ties need a deterministic fallback order,
    /// and iterating a `BTreeMap` already yields keys in ascending string order.
    WeightedUnique(BTreeMap<String, (Weight, Analysis)>),
}

impl Collector {
    pub fn new(weighted: bool, unique: bool) -> Collector {
        match (weighted, unique) {
            (false, false) => Collector::PlainAll(Vec::new()),
            (false, true) => Collector::PlainUnique { seen: HashSet::new(), order: Vec::new() },
            (true, false) => Collector::WeightedAll(Vec::new()),
            (true, true) => Collector::WeightedUnique(BTreeMap::new()),
        }
    }

    pub fn emit(&mut self, analysis: Analysis, weight: Weight) {
        match self {
            Collector::PlainAll(all) => all.push(analysis),
            Collector::PlainUnique { seen, order } => {
                let key = joined(&analysis);
                if seen.insert(key) {
                    order.push(analysis);
                }
            }
            Collector::WeightedAll(all) => all.push((weight, analysis)),
            Collector::WeightedUnique(best) => {
                let key = joined(&analysis);
                best.entry(key)
                    .and_modify(|(w, a)| {
                        if weight < *w {
                            *w = weight;
                            *a = analysis.clone();
                        }
                    })
                    .or_insert((weight, analysis));
            }
        }
    }

    pub fn finish(self, options: &LookupOptions) -> Vec<Analysis> {
        match self {
            Collector::PlainAll(all) => truncate(all, options.n_best),
            Collector::PlainUnique { order, .. } => truncate(order, options.n_best),
            Collector::WeightedAll(mut all) => {
                all.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
                finish_weighted(all, options)
            }
            Collector::WeightedUnique(best) => {
                let mut all: Vec<(Weight, Analysis)> = best.into_iter().map(|(_, v)| v).collect();
                all.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
                finish_weighted(all, options)
            }
        }
    }
}

fn truncate(mut items: Vec<Analysis>, n_best: Option<usize>) -> Vec<Analysis> {
    if let Some(n) = n_best {
        items.truncate(n);
    }
    items
}

fn finish_weighted(all: Vec<(Weight, Analysis)>, options: &LookupOptions) -> Vec<Analysis> {
    let min_weight = all.first().map(|(w, _)| *w);
    let beamed: Vec<(Weight, Analysis)> = match (min_weight, options.beam) {
        (Some(min), Some(beam)) => all.into_iter().filter(|(w, _)| *w <= min + beam).collect(),
        _ => all,
    };
    let mut analyses: Vec<Analysis> = beamed.into_iter().map(|(_, a)| a).collect();
    if let Some(n) = options.n_best {
        analyses.truncate(n);
    }
    analyses
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_unique_dedups_by_concatenation() {
        let mut c = Collector::new(false, true);
        c.emit(vec!["a".into(), "b".into()], 0.0);
        c.emit(vec!["ab".into()], 0.0);
        c.emit(vec!["c".into()], 0.0);
        let options = LookupOptions::default();
        let out = c.finish(&options);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn weighted_all_sorts_ascending_and_applies_n_best() {
        let mut c = Collector::new(true, false);
        c.emit(vec!["heavy".into()], 3.0);
        c.emit(vec!["light".into()], 1.0);
        let mut options = LookupOptions::default();
        options.n_best = Some(1);
        let out = c.finish(&options);
        assert_eq!(out, vec![vec!["light".to_string()]]);
    }

    #[test]
    fn beam_keeps_everything_within_threshold_of_the_minimum() {
        let mut c = Collector::new(true, false);
        c.emit(vec!["a".into()], 1.0);
        c.emit(vec!["b".into()], 3.0);
        let mut options = LookupOptions::default();
        options.beam = Some(1.5);
        let out = c.finish(&options);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn n_best_and_beam_combine() {
        let mut c = Collector::new(true, false);
        c.emit(vec!["a".into()], 1.0);
        c.emit(vec!["b".into()], 3.0);
        let mut options = LookupOptions::default();
        options.beam = Some(1.5);
        options.n_best = Some(1);
        let out = c.finish(&options);
        assert_eq!(out, vec![vec!["a".to_string()]]);
    }

    #[test]
    fn weighted_unique_keeps_minimum_weight_per_string() {
        let mut c = Collector::new(true, true);
        c.emit(vec!["x".into()], 3.0);
        c.emit(vec!["x".into()], 1.0);
        let options = LookupOptions::default();
        let out = c.finish(&options);
        assert_eq!(out, vec![vec!["x".to_string()]]);
    }

    #[test]
    fn weighted_unique_breaks_weight_ties_by_string_order() {
        // Insertion order deliberately reversed relative to string order: if `finish`
        // fed HashMap iteration order into a weight-only sort, a tie like this would
        // come out in whatever order the map happened to iterate, varying run to run.
        let mut c = Collector::new(true, true);
        c.emit(vec!["zebra".into()], 1.0);
        c.emit(vec!["apple".into()], 1.0);
        c.emit(vec!["mango".into()], 1.0);
        let options = LookupOptions::default();
        let out = c.finish(&options);
        assert_eq!(
            out,
            vec![vec!["apple".to_string()], vec!["mango".to_string()], vec!["zebra".to_string()]]
        );
    }
}
