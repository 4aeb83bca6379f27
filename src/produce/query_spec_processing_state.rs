use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::{
    produce::{ActiveCell, CompileError, ProcessingState, SelectionObserver},
    sql_ast::{Expression, QuerySpec, SelectionKey, SqlSelection},
    types::{TypeConfiguration, ValueKind},
};

/// Projection resolver of one query block.
///
/// Decides for every expression the block needs which select-list slot it
/// occupies. Each distinct expression gets exactly one slot: real slots take
/// the next column ordinal (1-based, dense), and every slot, the placeholder
/// included, takes the next buffer index (0-based, dense). New slots are
/// appended to the in-flight query's select clause and reported to the
/// selection observer installed at that moment.
///
/// The map is created on the first resolution. The block is handed off with
/// [`QuerySpecProcessingState::into_query_spec`], which consumes the resolver.
pub struct QuerySpecProcessingState<'a> {
    state: ProcessingState<'a>,
    query_spec: QuerySpec,
    selection_observer: &'a ActiveCell<Option<SelectionObserver>>,
    sql_selection_map: Option<IndexMap<SelectionKey, SqlSelection>>,
    non_empty_selections: usize,
}

impl<'a> QuerySpecProcessingState<'a> {
    pub fn new(
        query_spec: QuerySpec,
        state: ProcessingState<'a>,
        selection_observer: &'a ActiveCell<Option<SelectionObserver>>,
    ) -> Self {
        Self {
            state,
            query_spec,
            selection_observer,
            sql_selection_map: None,
            non_empty_selections: 0,
        }
    }

    pub fn processing_state(&self) -> &ProcessingState<'a> {
        &self.state
    }

    pub fn inflight_query_spec(&self) -> &QuerySpec {
        &self.query_spec
    }

    pub fn inflight_query_spec_mut(&mut self) -> &mut QuerySpec {
        &mut self.query_spec
    }

    /// Slot for `expression`, created on first request.
    ///
    /// Repeated requests return the existing slot and have no effect.
    pub fn resolve_sql_selection(
        &mut self,
        expression: &Expression,
        value_kind: ValueKind,
        types: &TypeConfiguration,
    ) -> SqlSelection {
        let key = SelectionKey::Expression(expression.clone());
        if let Some(existing) = self.sql_selection_map.as_ref().and_then(|m| m.get(&key)) {
            trace!(block = self.query_spec.id, %expression, "reusing sql selection");
            return existing.clone();
        }
        self.create_sql_selection(key, value_kind, types)
    }

    /// The block's placeholder slot: a buffer entry with no result column.
    ///
    /// Requires a prior [`resolve_sql_selection`](Self::resolve_sql_selection)
    /// and may be requested once per block. A refused request changes nothing.
    pub fn empty_sql_selection(&mut self) -> Result<SqlSelection, CompileError> {
        let query_block = self.query_spec.id;
        match &self.sql_selection_map {
            None => return Err(CompileError::PlaceholderBeforeSelection { query_block }),
            Some(map) if map.contains_key(&SelectionKey::Empty) => {
                return Err(CompileError::PlaceholderAlreadyResolved { query_block });
            }
            Some(_) => {}
        }
        // neither ordinal nor kind apply to the placeholder
        Ok(self.create_sql_selection(SelectionKey::Empty, ValueKind::Null, &TypeConfiguration::default()))
    }

    fn create_sql_selection(
        &mut self,
        key: SelectionKey,
        value_kind: ValueKind,
        types: &TypeConfiguration,
    ) -> SqlSelection {
        let map = self.sql_selection_map.get_or_insert_with(IndexMap::new);
        let selection = key.create_sql_selection(self.non_empty_selections + 1, map.len(), value_kind, types);
        map.insert(key, selection.clone());

        if !selection.is_empty() {
            self.non_empty_selections += 1;
        }
        self.query_spec.select_clause_mut().add_sql_selection(selection.clone());

        debug!(
            block = self.query_spec.id,
            clause = %self.state.current_clause(),
            column_ordinal = ?selection.column_ordinal(),
            buffer_index = selection.buffer_index(),
            "created sql selection"
        );

        if let Some(observer) = self.selection_observer.get() {
            observer(&selection);
        }
        selection
    }

    /// Slot already assigned to `expression`, if any.
    pub fn resolved(&self, expression: &Expression) -> Option<&SqlSelection> {
        self.sql_selection_map.as_ref()?.get(&SelectionKey::Expression(expression.clone()))
    }

    /// Number of slots, placeholder included.
    pub fn selection_count(&self) -> usize {
        self.sql_selection_map.as_ref().map_or(0, IndexMap::len)
    }

    /// Number of slots that produce a result column.
    pub fn non_empty_selections(&self) -> usize {
        self.non_empty_selections
    }

    pub fn into_query_spec(self) -> QuerySpec {
        self.query_spec
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::{produce::ActiveCell, sql_ast::{Clause, Literal, TableReference}};

    struct Fixture {
        clause: ActiveCell<Clause>,
        expressions: ActiveCell<Option<crate::produce::ExpressionObserver>>,
        selections: ActiveCell<Option<SelectionObserver>>,
        notified: Rc<RefCell<Vec<SqlSelection>>>,
        types: TypeConfiguration,
    }

    impl Fixture {
        fn new() -> Self {
            let notified = Rc::new(RefCell::new(Vec::new()));
            let sink = Rc::clone(&notified);
            let observer: SelectionObserver = Rc::new(move |s: &SqlSelection| sink.borrow_mut().push(s.clone()));
            Self {
                clause: ActiveCell::new(Clause::Select),
                expressions: ActiveCell::new(None),
                selections: ActiveCell::new(Some(observer)),
                notified,
                types: TypeConfiguration::new(),
            }
        }

        fn resolver(&self) -> QuerySpecProcessingState<'_> {
            let state = ProcessingState::new(None, &self.clause, &self.expressions);
            QuerySpecProcessingState::new(QuerySpec::new(0, TableReference::new("EMP", "e1_0")), state, &self.selections)
        }
    }

    fn col(name: &str) -> Expression {
        Expression::column("e1_0", name, ValueKind::Int)
    }

    fn assert_list_matches_map(r: &QuerySpecProcessingState<'_>) {
        let list = r.inflight_query_spec().select_clause().sql_selections();
        assert_eq!(list.len(), r.selection_count());
        let from_map: Vec<SqlSelection> = r.sql_selection_map.as_ref()
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default();
        assert_eq!(list, from_map.as_slice());
    }

    #[test]
    fn map_is_absent_until_first_resolution() {
        let fx = Fixture::new();
        let r = fx.resolver();
        assert!(r.sql_selection_map.is_none());
        assert_eq!(r.selection_count(), 0);
        assert!(r.inflight_query_spec().select_clause().is_empty());
    }

    #[test]
    fn repeated_resolution_is_idempotent() {
        let fx = Fixture::new();
        let mut r = fx.resolver();
        let a = col("id");

        let first = r.resolve_sql_selection(&a, ValueKind::Int, &fx.types);
        let second = r.resolve_sql_selection(&a, ValueKind::Int, &fx.types);

        assert_eq!(first, second);
        assert_eq!(r.non_empty_selections(), 1);
        assert_eq!(r.selection_count(), 1);
        assert_eq!(r.inflight_query_spec().select_clause().len(), 1);
        assert_eq!(fx.notified.borrow().len(), 1);
        assert_eq!(r.resolved(&a), Some(&first));
    }

    #[test]
    fn real_ordinals_are_dense_in_creation_order() {
        let fx = Fixture::new();
        let mut r = fx.resolver();
        let names = ["id", "salary", "active", "first_name", "last_name"];

        for (i, name) in names.iter().enumerate() {
            let slot = r.resolve_sql_selection(&col(name), ValueKind::Int, &fx.types);
            assert_eq!(slot.column_ordinal(), Some(i + 1));
            assert_eq!(slot.buffer_index(), i);
            // asking again in between changes nothing
            r.resolve_sql_selection(&col(names[0]), ValueKind::Int, &fx.types);
        }
        assert_eq!(r.non_empty_selections(), names.len());
        assert_list_matches_map(&r);
    }

    #[test]
    fn buffer_indices_are_dense_across_placeholder() {
        let fx = Fixture::new();
        let mut r = fx.resolver();

        let a = r.resolve_sql_selection(&col("a"), ValueKind::Int, &fx.types);
        let b = r.resolve_sql_selection(&col("b"), ValueKind::Int, &fx.types);
        let empty = r.empty_sql_selection().unwrap();
        let c = r.resolve_sql_selection(&col("c"), ValueKind::Int, &fx.types);
        let d = r.resolve_sql_selection(&Expression::Literal(Literal::Int(1)), ValueKind::Int, &fx.types);

        let indices: Vec<usize> = [&a, &b, &empty, &c, &d].iter().map(|s| s.buffer_index()).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
        // placeholder does not consume an ordinal
        let ordinals: Vec<Option<usize>> = [&a, &b, &empty, &c, &d].iter().map(|s| s.column_ordinal()).collect();
        assert_eq!(ordinals, vec![Some(1), Some(2), None, Some(3), Some(4)]);
        assert_eq!(r.non_empty_selections(), 4);
        assert_list_matches_map(&r);
    }

    #[test]
    fn resolution_scenario_with_placeholder() {
        let fx = Fixture::new();
        let mut r = fx.resolver();
        let a = col("a");
        let b = col("b");

        let a_slot = r.resolve_sql_selection(&a, ValueKind::Int, &fx.types);
        assert_eq!((a_slot.column_ordinal(), a_slot.buffer_index()), (Some(1), 0));

        assert_eq!(r.resolve_sql_selection(&a, ValueKind::Int, &fx.types), a_slot);
        assert_eq!(r.selection_count(), 1);

        let empty = r.empty_sql_selection().unwrap();
        assert_eq!((empty.column_ordinal(), empty.buffer_index()), (None, 1));

        let b_slot = r.resolve_sql_selection(&b, ValueKind::Int, &fx.types);
        assert_eq!((b_slot.column_ordinal(), b_slot.buffer_index()), (Some(2), 2));

        assert_eq!(
            r.inflight_query_spec().select_clause().sql_selections(),
            &[a_slot, empty, b_slot][..]
        );
        assert_eq!(r.non_empty_selections(), 2);
        assert_eq!(r.selection_count(), 3);
        assert_eq!(fx.notified.borrow().len(), 3);
    }

    #[test]
    fn placeholder_first_is_refused_without_side_effects() {
        let fx = Fixture::new();
        let mut r = fx.resolver();

        assert_eq!(r.empty_sql_selection(), Err(CompileError::PlaceholderBeforeSelection { query_block: 0 }));
        assert!(r.sql_selection_map.is_none());
        assert!(r.inflight_query_spec().select_clause().is_empty());
        assert!(fx.notified.borrow().is_empty());

        // later correct use starts from a clean slate
        let slot = r.resolve_sql_selection(&col("id"), ValueKind::Int, &fx.types);
        assert_eq!((slot.column_ordinal(), slot.buffer_index()), (Some(1), 0));
    }

    #[test]
    fn second_placeholder_is_refused() {
        let fx = Fixture::new();
        let mut r = fx.resolver();
        r.resolve_sql_selection(&col("id"), ValueKind::Int, &fx.types);
        let first = r.empty_sql_selection().unwrap();

        assert_eq!(r.empty_sql_selection(), Err(CompileError::PlaceholderAlreadyResolved { query_block: 0 }));
        assert_eq!(r.selection_count(), 2);
        assert_eq!(r.inflight_query_spec().select_clause().sql_selections()[1], first);
    }

    #[test]
    fn observer_is_looked_up_at_each_creation() {
        let fx = Fixture::new();
        let mut r = fx.resolver();
        r.resolve_sql_selection(&col("a"), ValueKind::Int, &fx.types);
        {
            let _quiet = fx.selections.swap(None);
            r.resolve_sql_selection(&col("b"), ValueKind::Int, &fx.types);
        }
        r.resolve_sql_selection(&col("c"), ValueKind::Int, &fx.types);

        let seen: Vec<usize> = fx.notified.borrow().iter().map(|s| s.buffer_index()).collect();
        assert_eq!(seen, vec![0, 2]);
    }

    #[test]
    fn hand_off_keeps_the_select_clause() {
        let fx = Fixture::new();
        let mut r = fx.resolver();
        r.resolve_sql_selection(&col("a"), ValueKind::Int, &fx.types);
        r.resolve_sql_selection(&col("b"), ValueKind::Int, &fx.types);

        let spec = r.into_query_spec();
        let ordinals: Vec<Option<usize>> = spec.select_clause().sql_selections().iter().map(|s| s.column_ordinal()).collect();
        assert_eq!(ordinals, vec![Some(1), Some(2)]);
    }
}
