//! Model dependency graph for insert sequencing.
//!
//! Provides:
//! - Dependency graph construction from relation fields
//! - A deterministic insertion order that tolerates cycles
//! - Cycle reporting for models that could not be ordered cleanly

use super::{ModelId, Schema};

/// Model dependency graph built from relation fields.
///
/// The graph represents parent → child relationships where:
/// - A parent is a model referenced by another model's relation
/// - A child is a model that has a relation referencing another model
///
/// Self references are left out of the graph; they never influence the
/// model order and are handled row by row during synthesis.
#[derive(Debug)]
pub struct ModelGraph<'a> {
    /// The underlying schema
    pub schema: &'a Schema,
    /// For each model, list of parent models (models it references)
    pub parents: Vec<Vec<ModelId>>,
    /// For each model, list of child models (models that reference it)
    pub children: Vec<Vec<ModelId>>,
}

/// Result of model sequencing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceResult {
    /// Every model, parents before children where possible
    pub order: Vec<ModelId>,
    /// Models placed while some of their parents were still unplaced
    pub cyclic_models: Vec<ModelId>,
}

impl<'a> ModelGraph<'a> {
    /// Build a dependency graph from a schema
    pub fn from_schema(schema: &'a Schema) -> Self {
        let n = schema.len();
        let mut parents: Vec<Vec<ModelId>> = vec![Vec::new(); n];
        let mut children: Vec<Vec<ModelId>> = vec![Vec::new(); n];

        for (child_id, model) in schema.iter() {
            for rel in model.relations() {
                let Some(parent_id) = schema.get_model_id(&rel.target) else {
                    continue;
                };
                if parent_id == child_id {
                    continue;
                }
                if !parents[child_id.0 as usize].contains(&parent_id) {
                    parents[child_id.0 as usize].push(parent_id);
                }
                if !children[parent_id.0 as usize].contains(&child_id) {
                    children[parent_id.0 as usize].push(child_id);
                }
            }
        }

        Self {
            schema,
            parents,
            children,
        }
    }

    /// Get the number of models in the graph
    pub fn len(&self) -> usize {
        self.schema.len()
    }

    /// Check if the graph is empty
    pub fn is_empty(&self) -> bool {
        self.schema.is_empty()
    }

    /// Get the model name for a model ID
    pub fn model_name(&self, id: ModelId) -> Option<&'a str> {
        self.schema.model(id).map(|m| m.name.as_str())
    }

    /// Order models so that as few as possible are placed before a model
    /// they reference.
    ///
    /// Kahn's algorithm, always taking the ready model declared first. When
    /// every remaining model still waits on a parent, one model is placed
    /// early and recorded as cyclic. Preference goes to a model that no
    /// unplaced model references through a non-nullable relation, since row
    /// resolution starting there can close the cycle with a deferred column;
    /// then to the fewest unplaced parents; then to declaration order.
    pub fn sequence(&self) -> SequenceResult {
        let n = self.len();
        let mut waiting: Vec<usize> = self.parents.iter().map(|p| p.len()).collect();
        let mut placed = vec![false; n];
        let mut order = Vec::with_capacity(n);
        let mut cyclic_models = Vec::new();

        while order.len() < n {
            let ready = (0..n).find(|&i| !placed[i] && waiting[i] == 0);
            let next = match ready {
                Some(i) => i,
                None => {
                    let Some(i) = (0..n)
                        .filter(|&i| !placed[i])
                        .min_by_key(|&i| (self.has_strict_referrer(i, &placed), waiting[i], i))
                    else {
                        break;
                    };
                    cyclic_models.push(ModelId(i as u32));
                    i
                }
            };

            placed[next] = true;
            order.push(ModelId(next as u32));
            for &child in &self.children[next] {
                let c = child.0 as usize;
                waiting[c] = waiting[c].saturating_sub(1);
            }
        }

        SequenceResult {
            order,
            cyclic_models,
        }
    }

    /// Whether an unplaced model other than `target` references it through
    /// a non-nullable relation.
    fn has_strict_referrer(&self, target: usize, placed: &[bool]) -> bool {
        self.children[target].iter().any(|&child| {
            !placed[child.0 as usize]
                && self.schema.model(child).is_some_and(|m| {
                    m.relations().any(|r| {
                        !r.is_nullable
                            && self.schema.get_model_id(&r.target) == Some(ModelId(target as u32))
                    })
                })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldType, Model, RelationField, ScalarField};

    fn model_with_ref(name: &str, target: Option<&str>) -> Model {
        let mut model = Model::new(name).field(ScalarField::new("id", FieldType::Int).id());
        if let Some(t) = target {
            model = model
                .field(ScalarField::new("ref_id", FieldType::Int))
                .field(RelationField::new("ref", t, &["ref_id"], &["id"]).nullable());
        }
        model
    }

    #[test]
    fn test_parents_before_children() {
        let schema = Schema::new(vec![
            model_with_ref("order", Some("customer")),
            model_with_ref("customer", None),
        ])
        .unwrap();
        let graph = ModelGraph::from_schema(&schema);
        let result = graph.sequence();

        let names: Vec<_> = result
            .order
            .iter()
            .map(|id| graph.model_name(*id).unwrap())
            .collect();
        assert_eq!(names, vec!["customer", "order"]);
        assert!(result.cyclic_models.is_empty());
    }

    #[test]
    fn test_cycle_is_deterministic() {
        let schema = Schema::new(vec![
            model_with_ref("a", Some("c")),
            model_with_ref("b", Some("a")),
            model_with_ref("c", Some("b")),
        ])
        .unwrap();
        let graph = ModelGraph::from_schema(&schema);
        let first = graph.sequence();
        let second = graph.sequence();

        assert_eq!(first, second);
        assert_eq!(first.order, vec![ModelId(0), ModelId(1), ModelId(2)]);
        assert_eq!(first.cyclic_models, vec![ModelId(0)]);
    }

    #[test]
    fn test_cycle_prefers_nullable_back_edge() {
        // draft -> author is nullable, author -> draft is NOT NULL, so rows
        // have to start from author for the cycle to close on draft.
        let draft = Model::new("draft")
            .field(ScalarField::new("id", FieldType::Int).id())
            .field(ScalarField::new("author_id", FieldType::Int))
            .field(RelationField::new("author", "author", &["author_id"], &["id"]).nullable());
        let author = Model::new("author")
            .field(ScalarField::new("id", FieldType::Int).id())
            .field(ScalarField::new("draft_id", FieldType::Int).not_null())
            .field(RelationField::new("draft", "draft", &["draft_id"], &["id"]));
        let schema = Schema::new(vec![draft, author]).unwrap();
        let result = ModelGraph::from_schema(&schema).sequence();

        assert_eq!(result.order, vec![ModelId(1), ModelId(0)]);
        assert_eq!(result.cyclic_models, vec![ModelId(1)]);
    }

    #[test]
    fn test_self_reference_ignored_for_order() {
        let schema = Schema::new(vec![model_with_ref("node", Some("node"))]).unwrap();
        let graph = ModelGraph::from_schema(&schema);
        assert_eq!(graph.sequence().order, vec![ModelId(0)]);
        assert!(graph.sequence().cyclic_models.is_empty());
    }
}
