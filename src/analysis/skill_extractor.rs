use std::collections::BTreeSet;

use indicatif::ProgressBar;
use rayon::prelude::*;

use crate::taxonomy::SkillMatcher;

pub struct SkillExtractor {
    batch_size: usize,
}

impl SkillExtractor {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Extracts a batch sequentially, sharing one token buffer across it.
    pub fn extract_batch<S: AsRef<str>>(
        &self,
        matcher: &SkillMatcher,
        texts: &[S],
    ) -> Vec<BTreeSet<String>> {
        let mut spans = Vec::new();
        texts
            .iter()
            .map(|text| matcher.find_with_buffer(text.as_ref(), &mut spans))
            .collect()
    }

    /// Extracts every document, running batches in parallel on the current
    /// rayon pool. The output is in input order and does not depend on the
    /// batch size.
    pub fn extract_all<S: AsRef<str> + Sync>(
        &self,
        matcher: &SkillMatcher,
        texts: &[S],
        progress: &ProgressBar,
    ) -> Vec<BTreeSet<String>> {
        let batches: Vec<Vec<BTreeSet<String>>> = texts
            .par_chunks(self.batch_size)
            .map(|batch| {
                let skills = self.extract_batch(matcher, batch);
                progress.inc(batch.len() as u64);
                skills
            })
            .collect();

        batches.into_iter().flatten().collect()
    }
}

impl Default for SkillExtractor {
    fn default() -> Self {
        Self::new(512)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::SkillVocabulary;

    fn documents() -> Vec<String> {
        vec![
            "python and sql, python again".to_string(),
            String::new(),
            "power bi dashboards with excel".to_string(),
            "rust, go and c++".to_string(),
            "docker; kubernetes on aws".to_string(),
            "r programming and scikit-learn".to_string(),
            "react or vue or angular".to_string(),
        ]
    }

    #[test]
    fn test_extraction_is_batch_size_invariant() {
        let matcher = SkillMatcher::new(SkillVocabulary::default()).unwrap();
        let docs = documents();
        let progress = ProgressBar::hidden();

        let baseline: Vec<_> = docs.iter().map(|d| matcher.find(d)).collect();

        for batch_size in [0, 1, 2, 3, 7, 100] {
            let extracted = SkillExtractor::new(batch_size).extract_all(&matcher, &docs, &progress);
            assert_eq!(extracted, baseline, "batch size {}", batch_size);
        }
    }

    #[test]
    fn test_extraction_deduplicates_mentions() {
        let matcher = SkillMatcher::new(SkillVocabulary::default()).unwrap();
        let skills =
            SkillExtractor::default().extract_batch(&matcher, &["python and sql, python again"]);
        assert_eq!(
            skills[0].iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["python", "sql"]
        );
    }

    #[test]
    fn test_no_match_yields_empty_set() {
        let matcher = SkillMatcher::new(SkillVocabulary::default()).unwrap();
        let extractor = SkillExtractor::default();
        let skills = extractor.extract_batch(&matcher, &["", "rust, go and c++"]);
        assert!(skills.iter().all(BTreeSet::is_empty));
    }

    #[test]
    fn test_zero_batch_size_is_clamped() {
        assert_eq!(SkillExtractor::new(0).batch_size(), 1);
    }
}
