use serde_json::Value;
use tracing::{debug, trace};

use crate::{
    exec::{Eval, ExecutionError, Helpers, InternalStore, Row, Store, StoreCommon},
    produce::ColumnUsage,
    sql_ast::{DeleteStatement, Predicate, QuerySpec, TableReference, Truth},
};

/// Runs SQL AST statements against a [`Store`].
///
/// Scanned rows are keyed `alias.column`. With a [`ColumnUsage`] only the
/// recorded columns of each table alias are copied out of the store.
/// A statement sees one consistent state of the store: a select holds the
/// read lock throughout, a delete holds the write lock from the first scan
/// to the removal.
pub struct AstExecutor<'s> {
    store: &'s Store,
    usage: Option<&'s ColumnUsage>,
}

impl<'s> AstExecutor<'s> {
    pub fn new(store: &'s Store, usage: Option<&'s ColumnUsage>) -> Self {
        Self { store, usage }
    }

    /// Result rows hold the real selections' values in column-ordinal order.
    pub fn execute_select(&self, spec: &QuerySpec) -> Result<Vec<Vec<Value>>, ExecutionError> {
        let tables = self.store.read_tables()?;
        let rows = self.run_query_spec(&tables, spec, None)?;
        debug!(table = %spec.from.table, rows = rows.len(), "executed select");
        Ok(rows)
    }

    /// Deletes the matching rows and returns how many went away.
    pub fn execute_delete(&self, statement: &DeleteStatement) -> Result<usize, ExecutionError> {
        let mut tables = self.store.write_tables()?;
        let positions = self.matching_positions(&tables, statement)?;
        let removed = tables.remove_positions(&statement.target.table, &positions);
        debug!(table = %statement.target.table, removed, "executed delete");
        Ok(removed)
    }

    fn matching_positions(&self, tables: &InternalStore, statement: &DeleteStatement) -> Result<Vec<usize>, ExecutionError> {
        let rows = self.scan(tables, &statement.target, None)?;
        let mut positions = Vec::new();
        for (position, row) in rows.iter().enumerate() {
            let matched = match &statement.restriction {
                Some(predicate) => self.eval_predicate3(tables, predicate, row)?.is_true(),
                None => true,
            };
            if matched {
                positions.push(position);
            }
        }
        Ok(positions)
    }

    fn run_query_spec(&self, tables: &InternalStore, spec: &QuerySpec, outer: Option<&Row>) -> Result<Vec<Vec<Value>>, ExecutionError> {
        let scanned = self.scan(tables, &spec.from, outer)?;

        let mut rows = Vec::with_capacity(scanned.len());
        for row in scanned {
            let keep = match &spec.where_clause {
                Some(predicate) => self.eval_predicate3(tables, predicate, &row)?.is_true(),
                None => true,
            };
            if keep {
                rows.push(row);
            }
        }

        if !spec.sort_specifications.is_empty() {
            // stable sort
            rows.sort_by(|a, b| {
                for k in &spec.sort_specifications {
                    let av = Eval::eval_expression(&k.expression, a);
                    let bv = Eval::eval_expression(&k.expression, b);
                    let ord = Helpers::cmp_json_for_sort(&av, &bv, k.ascending);
                    if !ord.is_eq() { return ord; }
                }
                std::cmp::Ordering::Equal
            });
        }

        let start = spec.offset.unwrap_or(0).max(0) as usize;
        let mut end = rows.len();
        if let Some(lim) = spec.limit { end = (start + lim.max(0) as usize).min(rows.len()); }
        let rows = rows.get(start..end).unwrap_or(&[]);

        let columns: Vec<_> = spec.select_clause().column_selections().collect();
        Ok(rows.iter()
            .map(|row| columns.iter()
                .filter_map(|s| s.expression())
                .map(|e| Eval::eval_expression(e, row))
                .collect())
            .collect())
    }

    fn scan(&self, tables: &InternalStore, table: &TableReference, outer: Option<&Row>) -> Result<Vec<Row>, ExecutionError> {
        let wanted = self.usage.and_then(|u| u.columns_of(&table.alias));
        let stored = tables.rows(&table.table)
            .ok_or_else(|| ExecutionError::UnknownTable(table.table.clone()))?;
        trace!(table = %table.table, alias = %table.alias, rows = stored.len(), "scan");

        Ok(stored.iter()
            .map(|source| {
                let mut row = outer.cloned().unwrap_or_default();
                // prefix keys with the SQL alias to match qualified columns
                match wanted {
                    Some(columns) => {
                        for column in columns {
                            let value = source.get(column).cloned().unwrap_or(Value::Null);
                            row.insert(format!("{}.{}", table.alias, column), value);
                        }
                    }
                    None => {
                        for (column, value) in source {
                            row.insert(format!("{}.{}", table.alias, column), value.clone());
                        }
                    }
                }
                row
            })
            .collect())
    }

    fn eval_predicate3(&self, tables: &InternalStore, predicate: &Predicate, row: &Row) -> Result<Truth, ExecutionError> {
        let truth = match predicate {
            Predicate::And(v) => {
                let mut acc = Truth::True;
                for p in v {
                    acc = acc.and(self.eval_predicate3(tables, p, row)?);
                }
                acc
            }
            Predicate::Or(v) => {
                let mut acc = Truth::False;
                for p in v {
                    acc = acc.or(self.eval_predicate3(tables, p, row)?);
                }
                acc
            }
            Predicate::Not(p) => self.eval_predicate3(tables, p, row)?.not(),
            Predicate::Compare { left, op, right } => {
                let l = Eval::eval_expression(left, row);
                let r = Eval::eval_expression(right, row);
                Eval::compare3(&l, *op, &r)
            }
            Predicate::IsNull { expr, negated } => {
                let t = Truth::from(Eval::eval_expression(expr, row).is_null());
                if *negated { t.not() } else { t }
            }
            Predicate::Like { expr, pattern, negated } => {
                let t = Eval::like3(&Eval::eval_expression(expr, row), &Eval::eval_expression(pattern, row));
                if *negated { t.not() } else { t }
            }
            Predicate::Exists { query, negated } => {
                let t = Truth::from(!self.run_query_spec(tables, query, Some(row))?.is_empty());
                if *negated { t.not() } else { t }
            }
            Predicate::InSubQuery { expr, query, negated } => {
                let v = Eval::eval_expression(expr, row);
                let candidates = self.run_query_spec(tables, query, Some(row))?;
                let t = Self::in_values(&v, candidates.iter().filter_map(|r| r.first()));
                if *negated { t.not() } else { t }
            }
            Predicate::Const3(t) => *t,
        };
        Ok(truth)
    }

    fn in_values<'v>(value: &Value, candidates: impl Iterator<Item = &'v Value>) -> Truth {
        let mut seen_any = false;
        let mut has_null = false;
        for candidate in candidates {
            seen_any = true;
            if candidate.is_null() { has_null = true; continue; }
            if Eval::value_equal(value, candidate) { return Truth::True; }
        }
        if !seen_any { Truth::False } else if has_null || value.is_null() { Truth::Unknown } else { Truth::False }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        produce::{ActiveCell, ProcessingState, QuerySpecProcessingState},
        sql_ast::{Clause, ComparisonOperator, Expression, Literal, SortSpecification},
        types::{TypeConfiguration, ValueKind},
    };

    fn store() -> Store {
        let store = Store::new_store();
        store.load_from_json("EMP", json!([
            { "id": 1, "first_name": "Ana", "salary": 26789, "dept": 10 },
            { "id": 2, "first_name": "Bo", "salary": 1000, "dept": 20 },
            { "id": 3, "first_name": "Cy", "salary": null, "dept": 10 },
        ])).unwrap();
        store.load_from_json("DEPT", json!([{ "id": 10, "name": "R&D" }])).unwrap();
        store
    }

    fn col(alias: &str, column: &str) -> Expression {
        Expression::column(alias, column, ValueKind::Int)
    }

    /// A block selecting `columns` from `table` through the projection resolver.
    fn block(id: usize, table: &str, alias: &str, columns: &[&str]) -> QuerySpec {
        let clause = ActiveCell::new(Clause::Select);
        let observer = ActiveCell::new(None);
        let selections = ActiveCell::new(None);
        let state = ProcessingState::new(None, &clause, &observer);
        let mut st = QuerySpecProcessingState::new(QuerySpec::new(id, TableReference::new(table, alias)), state, &selections);
        let types = TypeConfiguration::default();
        for c in columns {
            st.resolve_sql_selection(&col(alias, c), ValueKind::Int, &types);
        }
        st.into_query_spec()
    }

    #[test]
    fn filters_sorts_and_pages() {
        let store = store();
        let mut spec = block(0, "EMP", "e1_0", &["id", "salary"]);
        spec.sort_specifications = vec![SortSpecification { expression: col("e1_0", "salary"), ascending: false }];
        spec.offset = Some(1);
        spec.limit = Some(5);

        let rows = AstExecutor::new(&store, None).execute_select(&spec).unwrap();
        // 26789, 1000, null (nulls last) minus the first
        assert_eq!(rows, vec![vec![json!(2), json!(1000)], vec![json!(3), Value::Null]]);
    }

    #[test]
    fn unknown_where_drops_the_row() {
        let store = store();
        let mut spec = block(0, "EMP", "e1_0", &["id"]);
        spec.where_clause = Some(Predicate::Compare {
            left: col("e1_0", "salary"),
            op: ComparisonOperator::GtEq,
            right: Expression::Literal(Literal::Int(0)),
        });
        let rows = AstExecutor::new(&store, None).execute_select(&spec).unwrap();
        assert_eq!(rows, vec![vec![json!(1)], vec![json!(2)]]);
    }

    #[test]
    fn pruned_scan_only_sees_used_columns() {
        let store = store();
        let spec = block(0, "EMP", "e1_0", &["id"]);
        let mut usage = ColumnUsage::default();
        usage.record(&col("e1_0", "id"));

        let executor = AstExecutor::new(&store, Some(&usage));
        let scanned = executor.scan(&store.read_tables().unwrap(), &spec.from, None).unwrap();
        assert_eq!(scanned[0].keys().collect::<Vec<_>>(), vec!["e1_0.id"]);
    }

    #[test]
    fn correlated_exists_reads_the_outer_row() {
        let store = store();
        let mut sub = block(1, "DEPT", "d2_0", &["id"]);
        sub.where_clause = Some(Predicate::Compare {
            left: col("d2_0", "id"),
            op: ComparisonOperator::Eq,
            right: col("e1_0", "dept"),
        });
        let mut spec = block(0, "EMP", "e1_0", &["id"]);
        spec.where_clause = Some(Predicate::Exists { query: Box::new(sub), negated: false });

        let rows = AstExecutor::new(&store, None).execute_select(&spec).unwrap();
        assert_eq!(rows, vec![vec![json!(1)], vec![json!(3)]]);
    }

    #[test]
    fn in_sub_query_uses_three_valued_logic() {
        let v = [json!(1), Value::Null];
        assert_eq!(AstExecutor::in_values(&json!(1), v.iter()), Truth::True);
        assert_eq!(AstExecutor::in_values(&json!(2), v.iter()), Truth::Unknown);
        assert_eq!(AstExecutor::in_values(&Value::Null, [].iter()), Truth::False);
    }

    #[test]
    fn delete_removes_only_matching_rows() {
        let store = store();
        let statement = DeleteStatement {
            target: TableReference::new("EMP", "e1_0"),
            restriction: Some(Predicate::Compare {
                left: col("e1_0", "dept"),
                op: ComparisonOperator::Eq,
                right: Expression::Literal(Literal::Int(10)),
            }),
        };
        assert_eq!(AstExecutor::new(&store, None).execute_delete(&statement).unwrap(), 2);
        assert_eq!(store.rows("EMP").unwrap().len(), 1);
    }

    #[test]
    fn concurrent_deletes_remove_exactly_their_rows() {
        let store = Store::new_store();
        let rows: Vec<Value> = (0..64).map(|id| json!({ "id": id })).collect();
        store.load_from_json("T", Value::Array(rows)).unwrap();

        let delete_id = |id: i64| DeleteStatement {
            target: TableReference::new("T", "t1_0"),
            restriction: Some(Predicate::Compare {
                left: col("t1_0", "id"),
                op: ComparisonOperator::Eq,
                right: Expression::Literal(Literal::Int(id)),
            }),
        };

        // every even id goes, each from its own thread
        let removed: Vec<usize> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..32)
                .map(|k| {
                    let store = &store;
                    let statement = delete_id(k * 2);
                    scope.spawn(move || AstExecutor::new(store, None).execute_delete(&statement).unwrap())
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(removed.iter().all(|&n| n == 1));
        let left: Vec<Value> = store.rows("T").unwrap().into_iter().map(|r| r["id"].clone()).collect();
        let odd: Vec<Value> = (0..32).map(|k| json!(k * 2 + 1)).collect();
        assert_eq!(left, odd);
    }

    #[test]
    fn delete_sub_query_reads_the_locked_store() {
        let store = store();
        let mut sub = block(1, "DEPT", "d2_0", &["id"]);
        sub.where_clause = Some(Predicate::Compare {
            left: col("d2_0", "id"),
            op: ComparisonOperator::Eq,
            right: col("e1_0", "dept"),
        });
        let statement = DeleteStatement {
            target: TableReference::new("EMP", "e1_0"),
            restriction: Some(Predicate::Exists { query: Box::new(sub), negated: false }),
        };
        assert_eq!(AstExecutor::new(&store, None).execute_delete(&statement).unwrap(), 2);
        let left: Vec<Value> = store.rows("EMP").unwrap().into_iter().map(|r| r["id"].clone()).collect();
        assert_eq!(left, vec![json!(2)]);
    }

    #[test]
    fn unknown_table_surfaces() {
        let store = store();
        let spec = block(0, "NOPE", "n1_0", &["id"]);
        assert_eq!(
            AstExecutor::new(&store, None).execute_select(&spec),
            Err(ExecutionError::UnknownTable("NOPE".into()))
        );
    }
}
