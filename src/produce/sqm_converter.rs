use std::{cell::{Cell, RefCell}, rc::Rc, sync::Arc};

use tracing::debug;

use crate::{
    config::Config,
    mapping::{AttributeMapping, BasicAttribute, DomainModel, EntityMapping},
    produce::{
        ActiveCell, ActiveGuard, AliasEntry, AliasScope, ColumnUsage, CompileError, CompiledDelete,
        CompiledSelect, DomainResult, ExpressionObserver, FieldAssembler, ProcessingState,
        QuerySpecProcessingState, SelectionObserver,
    },
    sql_ast::{
        Clause, DeleteStatement, Expression, Literal, Predicate, QuerySpec, SortSpecification,
        SqlSelection, TableReference,
    },
    sqm::{SqmDeleteStatement, SqmExpression, SqmPath, SqmPredicate, SqmQuerySpec, SqmSelectStatement},
    types::{AttributeConverter, TypeConfiguration, ValueKind},
};

type Converter = Option<Arc<dyn AttributeConverter>>;

/// Translates domain-level statements into the SQL AST.
///
/// One converter compiles one statement: SQL aliases and query block ids are
/// numbered per converter.
pub struct SqmConverter<'m> {
    model: &'m DomainModel,
    types: &'m TypeConfiguration,
    config: &'m Config,
    expression_observer: ActiveCell<Option<ExpressionObserver>>,
    selection_observer: ActiveCell<Option<SelectionObserver>>,
    alias_counter: Cell<usize>,
    block_counter: Cell<usize>,
}

impl<'m> SqmConverter<'m> {
    pub fn new(model: &'m DomainModel, types: &'m TypeConfiguration, config: &'m Config) -> Self {
        Self {
            model,
            types,
            config,
            expression_observer: ActiveCell::new(None),
            selection_observer: ActiveCell::new(None),
            alias_counter: Cell::new(0),
            block_counter: Cell::new(0),
        }
    }

    pub fn convert_select(&self, statement: &SqmSelectStatement) -> Result<CompiledSelect, CompileError> {
        let values_mapping: Rc<RefCell<Vec<SqlSelection>>> = Rc::default();
        let column_usage: Rc<RefCell<ColumnUsage>> = Rc::default();

        let (query_spec, domain_results) = {
            let sink = Rc::clone(&values_mapping);
            let _selections = self.selection_observer.swap(Some(Rc::new(move |s: &SqlSelection| {
                sink.borrow_mut().push(s.clone());
            })));
            let _expressions = self.observe_columns(&column_usage);
            self.convert_query_spec(&statement.query_spec, None, None)?
        };

        debug!(
            blocks = self.block_counter.get(),
            selections = query_spec.select_clause().len(),
            "compiled select statement"
        );
        Ok(CompiledSelect {
            query_spec,
            values_mapping: values_mapping.take(),
            domain_results,
            column_usage: column_usage.take(),
        })
    }

    pub fn convert_delete(&self, statement: &SqmDeleteStatement) -> Result<CompiledDelete, CompileError> {
        let column_usage: Rc<RefCell<ColumnUsage>> = Rc::default();
        let entity = self.entity(&statement.target.entity)?;
        let target = TableReference::new(&entity.table, &self.next_sql_alias(entity));

        let mut scope = AliasScope::new(None);
        scope.register(&statement.target.alias, entity, target.clone());

        let clause = ActiveCell::new(Clause::Delete);
        let restriction = match &statement.restriction {
            Some(predicate) => {
                let _expressions = self.observe_columns(&column_usage);
                let state = ProcessingState::new(None, &clause, &self.expression_observer);
                let _where = clause.swap(Clause::Where);
                Some(self.convert_predicate(predicate, &scope, &state)?)
            }
            None => None,
        };

        debug!(table = %target.table, "compiled delete statement");
        Ok(CompiledDelete {
            statement: DeleteStatement { target, restriction },
            column_usage: column_usage.take(),
        })
    }

    fn observe_columns(&self, usage: &Rc<RefCell<ColumnUsage>>) -> ActiveGuard<'_, Option<ExpressionObserver>> {
        let sink = Rc::clone(usage);
        self.expression_observer.swap(Some(Rc::new(move |e: &Expression| sink.borrow_mut().record(e))))
    }

    fn convert_query_spec(
        &self,
        sqm: &SqmQuerySpec,
        parent: Option<&ProcessingState<'_>>,
        outer_scope: Option<&AliasScope<'_>>,
    ) -> Result<(QuerySpec, Vec<DomainResult>), CompileError> {
        let depth = parent.map_or(0, |p| p.depth() + 1);
        if depth > self.config.max_query_depth {
            return Err(CompileError::QueryTooDeep { max: self.config.max_query_depth });
        }

        let entity = self.entity(&sqm.root.entity)?;
        let block = self.block_counter.replace(self.block_counter.get() + 1);
        let table = TableReference::new(&entity.table, &self.next_sql_alias(entity));
        debug!(block, depth, entity = %entity.name, alias = %table.alias, "compiling query block");

        let mut scope = AliasScope::new(outer_scope);
        scope.register(&sqm.root.alias, entity, table.clone());

        let clause = ActiveCell::new(Clause::From);
        let state = ProcessingState::new(parent, &clause, &self.expression_observer);
        let mut spec_state = QuerySpecProcessingState::new(QuerySpec::new(block, table), state, &self.selection_observer);

        let domain_results = {
            let _select = clause.swap(Clause::Select);
            self.convert_selections(sqm, &scope, &mut spec_state)?
        };

        if let Some(restriction) = &sqm.restriction {
            let _where = clause.swap(Clause::Where);
            let predicate = self.convert_predicate(restriction, &scope, spec_state.processing_state())?;
            spec_state.inflight_query_spec_mut().where_clause = Some(predicate);
        }

        if !sqm.order_by.is_empty() {
            let _order = clause.swap(Clause::OrderBy);
            let mut sorts = Vec::with_capacity(sqm.order_by.len());
            for sort in &sqm.order_by {
                let expression = self.convert_sort_expression(&sort.expression, sqm, &scope, spec_state.processing_state())?;
                sorts.push(SortSpecification { expression, ascending: sort.ascending });
            }
            spec_state.inflight_query_spec_mut().sort_specifications = sorts;
        }

        if sqm.limit.is_some() || sqm.offset.is_some() {
            let _limit = clause.swap(Clause::Limit);
            let spec = spec_state.inflight_query_spec_mut();
            spec.limit = sqm.limit;
            spec.offset = sqm.offset;
        }

        Ok((spec_state.into_query_spec(), domain_results))
    }

    // ---- SELECT ----

    fn convert_selections(
        &self,
        sqm: &SqmQuerySpec,
        scope: &AliasScope<'_>,
        st: &mut QuerySpecProcessingState<'_>,
    ) -> Result<Vec<DomainResult>, CompileError> {
        let mut placeholder = None;

        if sqm.selections.is_empty() {
            let root = self.resolve_alias(scope, &sqm.root.alias)?;
            // a sub-query inside a predicate only needs its key column
            let under_predicate = st.processing_state().parent()
                .is_some_and(|p| p.current_clause() == Clause::Where);
            let path = SqmPath {
                alias: sqm.root.alias.clone(),
                attribute_path: if under_predicate { vec![root.entity.id_attribute.clone()] } else { Vec::new() },
            };
            return Ok(vec![self.convert_path_selection(&path, None, scope, st, &mut placeholder)?]);
        }

        let mut results = Vec::with_capacity(sqm.selections.len());
        for selection in &sqm.selections {
            let alias = selection.alias.clone();
            let result = match &selection.expression {
                SqmExpression::Path(path) => {
                    self.convert_path_selection(path, alias, scope, st, &mut placeholder)?
                }
                other => {
                    let expression = self.convert_expression(other, scope, st.processing_state())?;
                    let kind = self.types.expressable_kind(&expression, ValueKind::Null);
                    let slot = st.resolve_sql_selection(&expression, kind, self.types);
                    DomainResult::Basic { alias, buffer_index: slot.buffer_index(), converter: None }
                }
            };
            results.push(result);
        }
        Ok(results)
    }

    fn convert_path_selection(
        &self,
        path: &SqmPath,
        alias: Option<String>,
        scope: &AliasScope<'_>,
        st: &mut QuerySpecProcessingState<'_>,
        placeholder: &mut Option<SqlSelection>,
    ) -> Result<DomainResult, CompileError> {
        let entry = self.resolve_alias(scope, &path.alias)?;

        if path.is_entity() {
            let mut fields = Vec::new();
            for (leaf_path, mapping) in entry.entity.flatten() {
                fields.push(self.select_leaf(entry, leaf_path, mapping, st, placeholder)?);
            }
            return Ok(DomainResult::Composite { alias, fields });
        }

        let mapping = entry.entity.attribute_at(&path.attribute_path)
            .ok_or_else(|| Self::unknown_attribute(entry.entity, &path.attribute_path))?;

        match mapping {
            AttributeMapping::Embedded(embedded) => {
                let mut leaves = Vec::new();
                EntityMapping::flatten_into(&embedded.attributes, &mut Vec::new(), &mut leaves);
                let mut fields = Vec::with_capacity(leaves.len());
                for (leaf_path, leaf) in leaves {
                    fields.push(self.select_leaf(entry, leaf_path, leaf, st, placeholder)?);
                }
                Ok(DomainResult::Composite { alias, fields })
            }
            leaf => {
                let field = self.select_leaf(entry, path.attribute_path.clone(), leaf, st, placeholder)?;
                Ok(DomainResult::Basic { alias, buffer_index: field.buffer_index, converter: field.converter })
            }
        }
    }

    fn select_leaf(
        &self,
        entry: &AliasEntry<'_>,
        path: Vec<String>,
        mapping: &AttributeMapping,
        st: &mut QuerySpecProcessingState<'_>,
        placeholder: &mut Option<SqlSelection>,
    ) -> Result<FieldAssembler, CompileError> {
        match mapping {
            AttributeMapping::Basic(basic) => {
                let converter = self.converter_for(basic, &path)?;
                let expression = self.column_expression(&entry.table, basic, st.processing_state());
                let slot = st.resolve_sql_selection(&expression, basic.kind, self.types);
                Ok(FieldAssembler { path, buffer_index: slot.buffer_index(), converter })
            }
            AttributeMapping::Transient { .. } => {
                let slot = match placeholder.clone() {
                    Some(slot) => slot,
                    None => {
                        let slot = st.empty_sql_selection()?;
                        *placeholder = Some(slot.clone());
                        slot
                    }
                };
                Ok(FieldAssembler { path, buffer_index: slot.buffer_index(), converter: None })
            }
            AttributeMapping::Embedded(_) => Err(CompileError::NotABasicAttribute {
                path: path.join("."),
                clause: st.processing_state().current_clause(),
            }),
        }
    }

    // ---- expressions ----

    fn column_expression(&self, table: &TableReference, basic: &BasicAttribute, state: &ProcessingState<'_>) -> Expression {
        let expression = Expression::column(&table.alias, &basic.column, self.types.stored_kind(basic));
        state.notify_resolved(&expression);
        expression
    }

    fn convert_expression(
        &self,
        expression: &SqmExpression,
        scope: &AliasScope<'_>,
        state: &ProcessingState<'_>,
    ) -> Result<Expression, CompileError> {
        Ok(self.convert_operand(expression, scope, state)?.0)
    }

    /// Converted expression plus the converter of the attribute it reads, if any.
    fn convert_operand(
        &self,
        expression: &SqmExpression,
        scope: &AliasScope<'_>,
        state: &ProcessingState<'_>,
    ) -> Result<(Expression, Converter), CompileError> {
        match expression {
            SqmExpression::Path(path) => self.convert_basic_path(path, scope, state),
            SqmExpression::Literal(literal) => Ok((Expression::Literal(literal.clone()), None)),
            SqmExpression::Function { name, args } => {
                let args = args.iter()
                    .map(|a| self.convert_expression(a, scope, state))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok((Expression::function(name, args), None))
            }
        }
    }

    /// A path that must land on one column; an entity path means its id.
    fn convert_basic_path(
        &self,
        path: &SqmPath,
        scope: &AliasScope<'_>,
        state: &ProcessingState<'_>,
    ) -> Result<(Expression, Converter), CompileError> {
        let entry = self.resolve_alias(scope, &path.alias)?;
        let attribute_path = if path.is_entity() {
            vec![entry.entity.id_attribute.clone()]
        } else {
            path.attribute_path.clone()
        };

        match entry.entity.attribute_at(&attribute_path) {
            Some(AttributeMapping::Basic(basic)) => {
                let converter = self.converter_for(basic, &attribute_path)?;
                Ok((self.column_expression(&entry.table, basic, state), converter))
            }
            Some(_) => Err(CompileError::NotABasicAttribute {
                path: path.to_string(),
                clause: state.current_clause(),
            }),
            None => Err(Self::unknown_attribute(entry.entity, &attribute_path)),
        }
    }

    fn convert_sort_expression(
        &self,
        expression: &SqmExpression,
        sqm: &SqmQuerySpec,
        scope: &AliasScope<'_>,
        state: &ProcessingState<'_>,
    ) -> Result<Expression, CompileError> {
        if let SqmExpression::Path(path) = expression {
            if path.is_entity() && scope.resolve(&path.alias).is_none() {
                let by_alias = sqm.selections.iter().find(|s| s.alias.as_deref() == Some(path.alias.as_str()));
                if let Some(selection) = by_alias {
                    return self.convert_expression(&selection.expression, scope, state);
                }
            }
        }
        self.convert_expression(expression, scope, state)
    }

    // ---- predicates ----

    fn convert_predicate(
        &self,
        predicate: &SqmPredicate,
        scope: &AliasScope<'_>,
        state: &ProcessingState<'_>,
    ) -> Result<Predicate, CompileError> {
        let all = |items: &[SqmPredicate]| -> Result<Vec<Predicate>, CompileError> {
            items.iter().map(|p| self.convert_predicate(p, scope, state)).collect()
        };

        match predicate {
            SqmPredicate::Compare { left, op, right } => {
                let (left, left_converter) = self.convert_operand(left, scope, state)?;
                let (right, right_converter) = self.convert_operand(right, scope, state)?;
                // literals meet converted attributes in stored form
                Ok(Predicate::Compare {
                    left: Self::to_stored_form(left, right_converter.as_deref())?,
                    op: *op,
                    right: Self::to_stored_form(right, left_converter.as_deref())?,
                })
            }
            SqmPredicate::And(items) => Ok(Predicate::And(all(items.as_slice())?)),
            SqmPredicate::Or(items) => Ok(Predicate::Or(all(items.as_slice())?)),
            SqmPredicate::Not(inner) => Ok(Predicate::Not(Box::new(self.convert_predicate(inner, scope, state)?))),
            SqmPredicate::IsNull { expr, negated } => Ok(Predicate::IsNull {
                expr: self.convert_expression(expr, scope, state)?,
                negated: *negated,
            }),
            SqmPredicate::Like { expr, pattern, negated } => {
                let (expr, converter) = self.convert_operand(expr, scope, state)?;
                let pattern = self.convert_expression(pattern, scope, state)?;
                if converter.is_some() {
                    return Err(CompileError::Other(format!("LIKE is not supported on converted attribute {expr}")));
                }
                Ok(Predicate::Like { expr, pattern, negated: *negated })
            }
            SqmPredicate::Exists { query, negated } => Ok(Predicate::Exists {
                query: Box::new(self.convert_sub_query(query, scope, state)?),
                negated: *negated,
            }),
            SqmPredicate::InSubQuery { expr, query, negated } => {
                let expr = self.convert_expression(expr, scope, state)?;
                Ok(Predicate::InSubQuery {
                    expr,
                    query: Box::new(self.convert_sub_query(query, scope, state)?),
                    negated: *negated,
                })
            }
        }
    }

    fn convert_sub_query(
        &self,
        query: &SqmQuerySpec,
        scope: &AliasScope<'_>,
        state: &ProcessingState<'_>,
    ) -> Result<QuerySpec, CompileError> {
        // sub-query slots are not read back by the statement's row reader
        let _quiet = self.selection_observer.swap(None);
        debug!(parent_clause = %state.current_clause(), "compiling sub-query");
        let (spec, _) = self.convert_query_spec(query, Some(state), Some(scope))?;
        Ok(spec)
    }

    fn to_stored_form(expression: Expression, converter: Option<&dyn AttributeConverter>) -> Result<Expression, CompileError> {
        match (expression, converter) {
            (Expression::Literal(literal), Some(converter)) => {
                let stored = converter.to_database(&literal.to_value())?;
                Literal::from_value(&stored)
                    .map(Expression::Literal)
                    .ok_or_else(|| CompileError::Other(format!(
                        "converter '{}' produced {stored}, which has no literal form",
                        converter.name()
                    )))
            }
            (expression, _) => Ok(expression),
        }
    }

    // ---- lookups ----

    fn entity(&self, name: &str) -> Result<&'m EntityMapping, CompileError> {
        self.model.entity(name).ok_or_else(|| CompileError::UnknownEntity(name.to_string()))
    }

    fn resolve_alias<'s, 'a>(&self, scope: &'s AliasScope<'a>, alias: &str) -> Result<&'s AliasEntry<'a>, CompileError> {
        scope.resolve(alias).ok_or_else(|| CompileError::UnknownAlias(alias.to_string()))
    }

    fn converter_for(&self, basic: &BasicAttribute, path: &[String]) -> Result<Converter, CompileError> {
        self.types.converter_for(basic).map_err(|converter| CompileError::UnknownConverter {
            attribute: path.join("."),
            converter,
        })
    }

    fn unknown_attribute(entity: &EntityMapping, path: &[String]) -> CompileError {
        CompileError::UnknownAttribute { entity: entity.name.clone(), path: path.join(".") }
    }

    fn next_sql_alias(&self, entity: &EntityMapping) -> String {
        let n = self.alias_counter.get() + 1;
        self.alias_counter.set(n);
        // letters only, so the counter cannot run into a digit of the stem
        let stem: String = entity.name.chars()
            .filter(char::is_ascii_alphabetic)
            .take(self.config.alias_stem_length.max(1))
            .collect::<String>()
            .to_ascii_lowercase();
        let stem = if stem.is_empty() { "t".to_string() } else { stem };
        format!("{stem}{n}_0")
    }
}
