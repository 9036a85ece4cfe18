//! Recoverable diagnostics raised during synthesis.
//!
//! Warnings never block production of the statement batch. They are
//! aggregated per model and reported after a successful run.

use schemars::JsonSchema;
use serde::Serialize;

/// Warning types that can occur during synthesis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SynthesisWarning {
    /// Deferred relation columns could not be patched because the rows have
    /// no usable id; the columns stay NULL.
    MissingPrimaryKeyForUpdate { model: String, rows: usize },
}

impl std::fmt::Display for SynthesisWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SynthesisWarning::MissingPrimaryKeyForUpdate { model, rows } => write!(
                f,
                "Model '{}' has no primary key to target: deferred relation columns left NULL in {} row{}",
                model,
                rows,
                if *rows == 1 { "" } else { "s" }
            ),
        }
    }
}

/// Collects warnings during synthesis
#[derive(Debug, Default)]
pub struct WarningCollector {
    warnings: Vec<SynthesisWarning>,
}

impl WarningCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more dropped patch for a model
    pub fn missing_primary_key(&mut self, model: &str) {
        for warning in &mut self.warnings {
            let SynthesisWarning::MissingPrimaryKeyForUpdate { model: m, rows } = warning;
            if m == model {
                *rows += 1;
                return;
            }
        }
        self.warnings
            .push(SynthesisWarning::MissingPrimaryKeyForUpdate {
                model: model.to_string(),
                rows: 1,
            });
    }

    /// Get all collected warnings
    pub fn warnings(&self) -> &[SynthesisWarning] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<SynthesisWarning> {
        self.warnings
    }

    /// Check if any warnings were collected
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Print summary of warnings
pub fn print_summary(warnings: &[SynthesisWarning]) {
    if warnings.is_empty() {
        return;
    }

    eprintln!("\nSynthesis warnings ({}):", warnings.len());
    for warning in warnings {
        eprintln!("  ⚠ {}", warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_pk_aggregates_per_model() {
        let mut collector = WarningCollector::new();
        collector.missing_primary_key("edge");
        collector.missing_primary_key("tag");
        collector.missing_primary_key("edge");

        assert!(collector.has_warnings());
        assert_eq!(
            collector.warnings(),
            &[
                SynthesisWarning::MissingPrimaryKeyForUpdate {
                    model: "edge".to_string(),
                    rows: 2
                },
                SynthesisWarning::MissingPrimaryKeyForUpdate {
                    model: "tag".to_string(),
                    rows: 1
                },
            ]
        );
    }

    #[test]
    fn test_display_pluralizes() {
        let w = SynthesisWarning::MissingPrimaryKeyForUpdate {
            model: "edge".to_string(),
            rows: 1,
        };
        assert!(w.to_string().ends_with("in 1 row"));
    }
}
