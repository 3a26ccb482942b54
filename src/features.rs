// Constrained random selection over business feature lists

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Prefix that pins a feature so it always survives down-selection.
pub const REQUIRED_TAG: &str = "[필수]";

/// Picks a bounded, partly-randomized subset of a business's feature list.
///
/// Features tagged with [`REQUIRED_TAG`] are always kept (tag stripped);
/// the rest are sampled without replacement. This is the only place
/// randomness enters the conversion pipeline, and the generator is threaded
/// in explicitly so tests can pin a seed.
#[derive(Debug, Clone)]
pub struct FeatureSelector {
    min_count: usize,
    max_count: usize,
}

impl FeatureSelector {
    pub fn new(min_count: usize, max_count: usize) -> Self {
        Self {
            min_count,
            max_count,
        }
    }

    /// Build the generator for a selection pass: seeded when reproducibility
    /// is wanted, entropy otherwise.
    pub fn rng(seed: Option<u64>) -> StdRng {
        match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    pub fn select(&self, features: &[String], rng: &mut StdRng) -> Vec<String> {
        if features.is_empty() {
            return Vec::new();
        }

        // Partition into required and optional, preserving relative order
        let mut required = Vec::new();
        let mut optional = Vec::new();
        for feature in features {
            let trimmed = feature.trim();
            if let Some(stripped) = trimmed.strip_prefix(REQUIRED_TAG) {
                required.push(stripped.trim().to_string());
            } else {
                optional.push(trimmed.to_string());
            }
        }

        // Required items alone can exceed the budget; truncate rather than
        // drop the concept of "required"
        if required.len() >= self.max_count {
            required.truncate(self.max_count);
            return required;
        }

        // Too few features overall: keep everything
        if required.len() + optional.len() <= self.min_count {
            required.extend(optional);
            return required;
        }

        let lower = self.min_count.saturating_sub(required.len());
        let upper = self.max_count - required.len();
        let remaining = rng.gen_range(lower..=upper);

        let sampled: Vec<String> = if remaining >= optional.len() {
            optional
        } else {
            optional
                .choose_multiple(rng, remaining)
                .cloned()
                .collect()
        };

        required.extend(sampled);
        required
    }
}

impl Default for FeatureSelector {
    fn default() -> Self {
        Self::new(7, 8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(required: usize, optional: usize) -> Vec<String> {
        let mut list = Vec::new();
        for i in 0..required {
            list.push(format!("[필수] 필수특징{}", i));
        }
        for i in 0..optional {
            list.push(format!("선택특징{}", i));
        }
        list
    }

    #[test]
    fn test_empty_list() {
        let selector = FeatureSelector::default();
        let mut rng = FeatureSelector::rng(Some(1));
        assert!(selector.select(&[], &mut rng).is_empty());
    }

    #[test]
    fn test_selection_stays_within_bounds_and_keeps_required() {
        let selector = FeatureSelector::new(7, 8);
        let list = features(3, 20);
        for seed in 0..50 {
            let mut rng = FeatureSelector::rng(Some(seed));
            let selected = selector.select(&list, &mut rng);
            assert!(
                selected.len() >= 7 && selected.len() <= 8,
                "seed {}: got {} items",
                seed,
                selected.len()
            );
            for i in 0..3 {
                let required = format!("필수특징{}", i);
                assert!(
                    selected.contains(&required),
                    "seed {}: required item {} missing",
                    seed,
                    required
                );
            }
        }
    }

    #[test]
    fn test_required_overflow_truncates_to_max() {
        let selector = FeatureSelector::new(7, 8);
        let list = features(12, 5);
        let mut rng = FeatureSelector::rng(Some(7));
        let selected = selector.select(&list, &mut rng);
        assert_eq!(selected.len(), 8);
        // All drawn from required items, in original order, tags stripped
        for (i, item) in selected.iter().enumerate() {
            assert_eq!(item, &format!("필수특징{}", i));
        }
    }

    #[test]
    fn test_small_list_returned_whole() {
        let selector = FeatureSelector::new(7, 8);
        let list = features(2, 3);
        let mut rng = FeatureSelector::rng(Some(9));
        let selected = selector.select(&list, &mut rng);
        assert_eq!(selected.len(), 5);
        assert_eq!(selected[0], "필수특징0");
        assert_eq!(selected[1], "필수특징1");
        assert_eq!(selected[2], "선택특징0");
    }

    #[test]
    fn test_same_seed_is_reproducible() {
        let selector = FeatureSelector::new(7, 8);
        let list = features(2, 25);
        let mut rng_a = FeatureSelector::rng(Some(42));
        let mut rng_b = FeatureSelector::rng(Some(42));
        let a = selector.select(&list, &mut rng_a);
        let b = selector.select(&list, &mut rng_b);
        assert_eq!(a, b);
    }

    #[test]
    fn test_required_tag_stripped_with_whitespace() {
        let selector = FeatureSelector::new(1, 2);
        let list = vec!["  [필수] 14시간 우려낸 사골 육수  ".to_string()];
        let mut rng = FeatureSelector::rng(Some(0));
        let selected = selector.select(&list, &mut rng);
        assert_eq!(selected, vec!["14시간 우려낸 사골 육수".to_string()]);
    }
}
