//! Token usage as reported by providers.

use serde::{Deserialize, Serialize};

/// Token counts for one call.
///
/// `total` is only ever set together with `result`. Values come from the provider and are
/// not cross-checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

impl TokenUsage {
    pub fn new(prompt: u64, result: u64) -> Self {
        Self {
            prompt: Some(prompt),
            result: Some(result),
            total: None,
        }
    }

    /// Fold a partial report into the running counts.
    ///
    /// Providers either repeat a final count mid-stream or grow it chunk by chunk, so each
    /// side keeps the larger of the two values.
    pub fn absorb(&mut self, partial: &TokenUsage) {
        self.prompt = max_opt(self.prompt, partial.prompt);
        self.result = max_opt(self.result, partial.result);
    }

    /// Compute `total` from the observed counts. No-op unless `result` was observed.
    pub fn finalize(mut self) -> Self {
        self.total = self
            .result
            .map(|result| self.prompt.unwrap_or(0).saturating_add(result));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.prompt.is_none() && self.result.is_none() && self.total.is_none()
    }
}

fn max_opt(a: Option<u64>, b: Option<u64>) -> Option<u64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_reduction() {
        let mut usage = TokenUsage::default();
        usage.absorb(&TokenUsage::new(5, 10));
        usage.absorb(&TokenUsage::new(5, 25));
        usage.absorb(&TokenUsage::new(0, 0));
        let usage = usage.finalize();
        assert_eq!(usage.prompt, Some(5));
        assert_eq!(usage.result, Some(25));
        assert_eq!(usage.total, Some(30));
    }

    #[test]
    fn test_total_requires_result() {
        let usage = TokenUsage {
            prompt: Some(7),
            ..Default::default()
        }
        .finalize();
        assert_eq!(usage.total, None);
    }

    #[test]
    fn test_partial_sides_are_independent() {
        let mut usage = TokenUsage::default();
        usage.absorb(&TokenUsage {
            prompt: Some(12),
            ..Default::default()
        });
        usage.absorb(&TokenUsage {
            result: Some(4),
            ..Default::default()
        });
        assert_eq!(usage.finalize(), TokenUsage {
            prompt: Some(12),
            result: Some(4),
            total: Some(16),
        });
    }
}
