//! Statement synthesis: turn the rows of a [`Store`] into an ordered batch
//! of SQL statements that satisfies every foreign key.
//!
//! Rows are visited in model sequence order. Before a row is inserted, every
//! row it references inside the batch is inserted first. A reference back to
//! a row that is still being resolved closes a cycle: a nullable relation is
//! written as NULL and patched with an UPDATE after all INSERTs, a
//! non-nullable one aborts synthesis.
//!
//! The traversal runs on an explicit frame stack, so the depth of a
//! relation chain is bounded by memory rather than the call stack.

pub mod sequence;
mod statement;
pub mod warnings;

pub use warnings::{print_summary, SynthesisWarning, WarningCollector};

use crate::codec::{KeyPart, KeyTuple, SqlDialect};
use crate::schema::{Model, ModelGraph, ModelId, RelationField, Schema};
use crate::store::{Row, Store};
use ahash::{AHashMap, AHashSet};
use statement::{field_value, render_insert, render_patch};
use std::fmt;

/// Fatal synthesis errors. No statements are returned when one occurs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SynthesisError {
    #[error("circular dependency: row {row} of model '{model}' is referenced through a non-nullable relation while it is still being inserted")]
    CircularDependency { model: String, row: String },
    #[error("rows were added for unknown model '{0}'")]
    UnknownModel(String),
}

/// The three ordered parts of a synthesized batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementBatch {
    pub inserts: Vec<String>,
    pub updates: Vec<String>,
    pub sequence_fixes: Vec<String>,
}

impl StatementBatch {
    /// Statements in execution order: INSERTs, patch UPDATEs, sequence fixes
    pub fn statements(&self) -> impl Iterator<Item = &str> {
        self.inserts
            .iter()
            .chain(&self.updates)
            .chain(&self.sequence_fixes)
            .map(String::as_str)
    }

    pub fn into_statements(self) -> Vec<String> {
        let mut all = self.inserts;
        all.extend(self.updates);
        all.extend(self.sequence_fixes);
        all
    }

    pub fn len(&self) -> usize {
        self.inserts.len() + self.updates.len() + self.sequence_fixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Successful synthesis result.
#[derive(Debug, Clone)]
pub struct Synthesis {
    pub batch: StatementBatch,
    pub warnings: Vec<SynthesisWarning>,
    /// Models in the order their rows were visited
    pub model_order: Vec<String>,
}

impl Synthesis {
    pub fn statements(&self) -> impl Iterator<Item = &str> {
        self.batch.statements()
    }
}

/// Identity of a row within its model.
///
/// Rows with a complete id are the same entity when their keys match. Rows
/// without one (no id fields, or id values left to the database) are only
/// ever the same as themselves.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum RowIdentity {
    Key(KeyTuple),
    Position(usize),
}

impl RowIdentity {
    fn is_keyed(&self) -> bool {
        matches!(self, RowIdentity::Key(_))
    }
}

/// A row awaiting insertion, with its progress through its relations.
struct Frame {
    model: ModelId,
    row: usize,
    identity: RowIdentity,
    next_relation: usize,
    deferred: Vec<usize>,
}

/// Outcome of inspecting one relation of a pending row.
enum Step {
    Skip,
    Defer,
    Descend(Frame),
}

/// Per-run synthesis state. Created fresh by [`Synthesizer::run`].
struct Context<'s> {
    schema: &'s Schema,
    dialect: SqlDialect,
    rows: Vec<&'s [Row]>,
    inserted: Vec<AHashSet<RowIdentity>>,
    pending: Vec<AHashSet<RowIdentity>>,
    /// (model, referenced columns) → key values → first matching row
    lookups: AHashMap<(ModelId, Vec<String>), AHashMap<KeyTuple, usize>>,
    batch: StatementBatch,
    warnings: WarningCollector,
}

/// Drives one synthesis pass over a store.
pub struct Synthesizer<'s, 'a> {
    store: &'s Store<'a>,
    reconcile_sequences: bool,
}

impl<'s, 'a> Synthesizer<'s, 'a> {
    pub fn new(store: &'s Store<'a>) -> Self {
        Self {
            store,
            reconcile_sequences: true,
        }
    }

    pub fn with_sequences(mut self, reconcile: bool) -> Self {
        self.reconcile_sequences = reconcile;
        self
    }

    /// Run synthesis. All-or-nothing: on error no statements are returned.
    pub fn run(self) -> Result<Synthesis, SynthesisError> {
        let schema = self.store.schema();
        let n = schema.len();

        let empty: &[Row] = &[];
        let mut rows: Vec<&[Row]> = vec![empty; n];
        let mut names: Vec<&str> = self.store.model_names().collect();
        names.sort_unstable();
        for name in names {
            if self.store.is_skipped(name) {
                continue;
            }
            let id = schema
                .get_model_id(name)
                .ok_or_else(|| SynthesisError::UnknownModel(name.to_string()))?;
            rows[id.0 as usize] = self.store.rows(name);
        }

        let order = ModelGraph::from_schema(schema).sequence().order;

        let mut ctx = Context {
            schema,
            dialect: self.store.dialect(),
            rows,
            inserted: vec![AHashSet::new(); n],
            pending: vec![AHashSet::new(); n],
            lookups: AHashMap::new(),
            batch: StatementBatch::default(),
            warnings: WarningCollector::new(),
        };

        let mut model_order = Vec::new();
        for &model in &order {
            let count = ctx.rows[model.0 as usize].len();
            if count == 0 {
                continue;
            }
            if let Some(m) = schema.model(model) {
                model_order.push(m.name.clone());
            }
            for row in 0..count {
                ctx.resolve(model, row)?;
            }
        }

        if self.reconcile_sequences {
            let seeded = order
                .iter()
                .filter(|m| !ctx.rows[m.0 as usize].is_empty())
                .filter_map(|&m| schema.model(m));
            ctx.batch.sequence_fixes = sequence::reconcile(ctx.dialect, seeded);
        }

        Ok(Synthesis {
            batch: ctx.batch,
            warnings: ctx.warnings.into_warnings(),
            model_order,
        })
    }
}

impl<'s> Context<'s> {
    fn model(&self, id: ModelId) -> &'s Model {
        let schema: &'s Schema = self.schema;
        &schema.models()[id.0 as usize]
    }

    fn row(&self, model: ModelId, row: usize) -> &'s Row {
        let rows: &'s [Row] = self.rows[model.0 as usize];
        &rows[row]
    }

    fn identity(&self, model: ModelId, row: usize) -> RowIdentity {
        let r = self.row(model, row);
        let mut key = KeyTuple::new();
        for field in self.model(model).id_fields() {
            match field_value(r, field).flatten() {
                Some(value) => key.push(value.key_part()),
                None => return RowIdentity::Position(row),
            }
        }
        if key.is_empty() {
            RowIdentity::Position(row)
        } else {
            RowIdentity::Key(key)
        }
    }

    /// Insert a row after everything it depends on.
    fn resolve(&mut self, model: ModelId, row: usize) -> Result<(), SynthesisError> {
        let identity = self.identity(model, row);
        if self.inserted[model.0 as usize].contains(&identity) {
            return Ok(());
        }
        self.pending[model.0 as usize].insert(identity.clone());

        let mut stack = vec![Frame {
            model,
            row,
            identity,
            next_relation: 0,
            deferred: Vec::new(),
        }];

        while let Some(frame) = stack.last_mut() {
            let relation = self.model(frame.model).relations().nth(frame.next_relation);
            let Some(relation) = relation else {
                if let Some(done) = stack.pop() {
                    self.finish(done);
                }
                continue;
            };

            let relation_index = frame.next_relation;
            frame.next_relation += 1;
            let (child_model, child_row) = (frame.model, frame.row);

            match self.step(child_model, child_row, relation)? {
                Step::Skip => {}
                Step::Defer => {
                    if let Some(frame) = stack.last_mut() {
                        frame.deferred.push(relation_index);
                    }
                }
                Step::Descend(parent) => stack.push(parent),
            }
        }

        Ok(())
    }

    /// Inspect one relation of a pending row.
    fn step(
        &mut self,
        model: ModelId,
        row: usize,
        relation: &'s RelationField,
    ) -> Result<Step, SynthesisError> {
        let Some(target) = self.schema.get_model_id(&relation.target) else {
            return Ok(Step::Skip);
        };
        let Some(parent_row) = self.locate_parent(model, row, relation, target) else {
            return Ok(Step::Skip);
        };

        let parent_identity = self.identity(target, parent_row);
        if self.inserted[target.0 as usize].contains(&parent_identity) {
            return Ok(Step::Skip);
        }

        if self.pending[target.0 as usize].contains(&parent_identity) {
            if relation.is_nullable {
                return Ok(Step::Defer);
            }
            let identity = self.identity(model, row);
            return Err(SynthesisError::CircularDependency {
                model: self.model(model).name.clone(),
                row: describe_row(self.model(model), &identity),
            });
        }

        self.pending[target.0 as usize].insert(parent_identity.clone());
        Ok(Step::Descend(Frame {
            model: target,
            row: parent_row,
            identity: parent_identity,
            next_relation: 0,
            deferred: Vec::new(),
        }))
    }

    /// Find the row in the batch a relation of `row` points at.
    ///
    /// `None` when every local column is null, or when no row in the batch
    /// matches (the reference is assumed to point outside the batch).
    fn locate_parent(
        &mut self,
        model: ModelId,
        row: usize,
        relation: &RelationField,
        target: ModelId,
    ) -> Option<usize> {
        let child = self.model(model);
        let r = self.row(model, row);

        let mut key = KeyTuple::new();
        let mut all_null = true;
        for column in &relation.from {
            let value = child
                .scalar_by_column(column)
                .and_then(|f| field_value(r, f).flatten());
            match value {
                Some(v) => {
                    all_null = false;
                    key.push(v.key_part());
                }
                None => key.push(KeyPart::Null),
            }
        }
        if all_null || self.rows[target.0 as usize].is_empty() {
            return None;
        }

        let index = self.lookup_index(target, &relation.to);
        index.get(&key).copied()
    }

    /// Key index over a model's rows for a list of columns, built on first use.
    fn lookup_index(&mut self, target: ModelId, columns: &[String]) -> &AHashMap<KeyTuple, usize> {
        let model = self.model(target);
        let rows = self.rows[target.0 as usize];

        self.lookups
            .entry((target, columns.to_vec()))
            .or_insert_with(|| {
                let mut index = AHashMap::with_capacity(rows.len());
                'rows: for (i, r) in rows.iter().enumerate() {
                    let mut key = KeyTuple::new();
                    for column in columns {
                        let field = model.scalar_by_column(column);
                        match field.and_then(|f| field_value(r, f)) {
                            Some(Some(v)) => key.push(v.key_part()),
                            Some(None) => key.push(KeyPart::Null),
                            // Value left to the database; it cannot be matched here.
                            None => continue 'rows,
                        }
                    }
                    index.entry(key).or_insert(i);
                }
                index
            })
    }

    /// Emit the row's INSERT, mark it inserted and queue its patch.
    fn finish(&mut self, frame: Frame) {
        let model = self.model(frame.model);
        let row = self.row(frame.model, frame.row);

        let relations: Vec<&RelationField> = model.relations().collect();
        let mut deferred_columns: Vec<&str> = Vec::new();
        for &i in &frame.deferred {
            for column in &relations[i].from {
                if !deferred_columns.contains(&column.as_str()) {
                    deferred_columns.push(column);
                }
            }
        }

        self.batch
            .inserts
            .push(render_insert(self.dialect, model, row, &deferred_columns));

        let slot = frame.model.0 as usize;
        self.pending[slot].remove(&frame.identity);

        if !deferred_columns.is_empty() {
            let patch = if frame.identity.is_keyed() {
                render_patch(self.dialect, model, row, &deferred_columns)
            } else {
                None
            };
            match patch {
                Some(update) => self.batch.updates.push(update),
                None => self.warnings.missing_primary_key(&model.name),
            }
        }

        self.inserted[slot].insert(frame.identity);
    }
}

/// Human-readable description of a row for error messages.
fn describe_row(model: &Model, identity: &RowIdentity) -> String {
    match identity {
        RowIdentity::Key(key) => {
            let parts: Vec<String> = model
                .id_fields()
                .zip(key.iter())
                .map(|(f, k)| format!("{}={}", f.name, KeyDisplay(k)))
                .collect();
            format!("({})", parts.join(", "))
        }
        RowIdentity::Position(i) => format!("#{}", i + 1),
    }
}

struct KeyDisplay<'k>(&'k KeyPart);

impl fmt::Display for KeyDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            KeyPart::Null => write!(f, "NULL"),
            KeyPart::Bool(b) => write!(f, "{}", b),
            KeyPart::Int(i) => write!(f, "{}", i),
            KeyPart::Float(bits) => write!(f, "{}", f64::from_bits(*bits)),
            KeyPart::Text(s) => write!(f, "{:?}", s),
            KeyPart::Bytes(b) => write!(f, "0x{}", hex::encode(b)),
        }
    }
}
