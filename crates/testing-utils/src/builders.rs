//! Test data builders for evaluation samples and worker replies

use gateway_domain::{Endpoint, Sample};
use serde_json::{json, Value};

/// Endpoints named after `names`, on localhost with consecutive ports
pub fn endpoints(names: &[&str]) -> Vec<Endpoint> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| Endpoint::new(*name, "127.0.0.1", 9000 + i as u16))
        .collect()
}

/// A worker reply for a single-element batch whose mentions resolve to `tops`
pub fn reply(tops: &[&str]) -> Value {
    let ids: Vec<Vec<&str>> = tops.iter().map(|top| vec![*top]).collect();
    let confidences: Vec<Vec<f64>> = tops.iter().map(|_| vec![1.0]).collect();
    json!([[
        tops,
        confidences,
        tops.iter().map(|_| [0, 1]).collect::<Vec<_>>(),
        ids,
        tops.iter().map(|_| vec!["LOC"]).collect::<Vec<_>>(),
        ids,
        tops.iter().map(|_| "ok").collect::<Vec<_>>()
    ]])
}

/// Builder for creating test Sample entities
pub struct SampleBuilder {
    sample: Sample,
}

impl SampleBuilder {
    pub fn new() -> Self {
        Self {
            sample: Sample {
                entity_substr: vec![],
                entity_offsets: vec![],
                tags: vec![],
                probas: json!([]),
                sentences: vec!["test sentence".to_string()],
                sentences_offsets: vec![[0, 13]],
                gold_entities: vec![],
            },
        }
    }

    /// Adds a mention with its gold entity id
    pub fn mention(mut self, surface: &str, gold: &str) -> Self {
        let start = self
            .sample
            .entity_offsets
            .last()
            .map(|[_, end]| end + 1)
            .unwrap_or(0);
        self.sample.entity_substr.push(surface.to_string());
        self.sample
            .entity_offsets
            .push([start, start + surface.chars().count()]);
        self.sample.tags.push("LOC".to_string());
        self.sample.gold_entities.push(gold.to_string());
        self
    }

    pub fn with_sentence(mut self, sentence: &str) -> Self {
        self.sample.sentences = vec![sentence.to_string()];
        self.sample.sentences_offsets = vec![[0, sentence.chars().count()]];
        self
    }

    pub fn build(self) -> Sample {
        self.sample
    }
}

impl Default for SampleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_domain::InferenceResponse;

    #[test]
    fn test_reply_parses_as_linked_batch() {
        let batches = InferenceResponse::new(reply(&["Q1", "not in wiki"]))
            .linked_batches()
            .unwrap();
        let tops: Vec<Option<&str>> = batches[0].top_candidates().collect();
        assert_eq!(tops, vec![Some("Q1"), Some("not in wiki")]);
    }

    #[test]
    fn test_sample_builder_offsets() {
        let sample = SampleBuilder::new()
            .mention("москва", "Q649")
            .mention("россии", "Q159")
            .build();
        assert_eq!(sample.entity_offsets, vec![[0, 6], [7, 13]]);
        assert_eq!(sample.gold_entities, vec!["Q649", "Q159"]);
    }
}
