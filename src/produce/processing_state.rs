use std::rc::Rc;

use crate::{produce::ActiveCell, sql_ast::{Clause, Expression, SqlSelection}};

/// Callback told about every expression built while compiling.
pub type ExpressionObserver = Rc<dyn Fn(&Expression)>;

/// Callback told about every newly created select-list slot.
pub type SelectionObserver = Rc<dyn Fn(&SqlSelection)>;

/// The region of the SQL AST currently being built.
///
/// Exposes which clause is active and who wants to hear about resolved
/// expressions. Both are read through their cells at call time. `parent` links
/// to the enclosing block while a sub-query is compiled and is only ever read.
#[derive(Clone, Copy)]
pub struct ProcessingState<'a> {
    current_clause: &'a ActiveCell<Clause>,
    expression_observer: &'a ActiveCell<Option<ExpressionObserver>>,
    parent: Option<&'a ProcessingState<'a>>,
}

impl<'a> ProcessingState<'a> {
    pub fn new(
        parent: Option<&'a ProcessingState<'a>>,
        current_clause: &'a ActiveCell<Clause>,
        expression_observer: &'a ActiveCell<Option<ExpressionObserver>>,
    ) -> Self {
        Self { current_clause, expression_observer, parent }
    }

    pub fn current_clause(&self) -> Clause {
        self.current_clause.get()
    }

    pub fn notify_resolved(&self, expression: &Expression) {
        if let Some(observer) = self.expression_observer.get() {
            observer(expression);
        }
    }

    pub fn parent(&self) -> Option<&'a ProcessingState<'a>> {
        self.parent
    }

    /// Number of enclosing blocks.
    pub fn depth(&self) -> usize {
        self.parent.map_or(0, |p| p.depth() + 1)
    }
}

impl std::fmt::Debug for ProcessingState<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessingState")
            .field("current_clause", &self.current_clause())
            .field("depth", &self.depth())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::types::ValueKind;

    #[test]
    fn clause_is_read_at_call_time() {
        let clause = ActiveCell::new(Clause::Irrelevant);
        let observer = ActiveCell::new(None);
        let state = ProcessingState::new(None, &clause, &observer);

        assert_eq!(state.current_clause(), Clause::Irrelevant);
        {
            let _g = clause.swap(Clause::Where);
            assert_eq!(state.current_clause(), Clause::Where);
        }
        assert_eq!(state.current_clause(), Clause::Irrelevant);
    }

    #[test]
    fn notifying_without_observer_is_a_no_op() {
        let clause = ActiveCell::new(Clause::Select);
        let observer = ActiveCell::new(None);
        let state = ProcessingState::new(None, &clause, &observer);
        state.notify_resolved(&Expression::column("p1_0", "age", ValueKind::Int));
    }

    #[test]
    fn notifies_the_observer_installed_at_call_time() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let clause = ActiveCell::new(Clause::Select);
        let observer: ActiveCell<Option<ExpressionObserver>> = ActiveCell::new(None);
        let state = ProcessingState::new(None, &clause, &observer);

        let sink = Rc::clone(&seen);
        let _g = observer.swap(Some(Rc::new(move |e: &Expression| sink.borrow_mut().push(e.to_string()))));
        state.notify_resolved(&Expression::column("p1_0", "age", ValueKind::Int));

        assert_eq!(*seen.borrow(), vec!["p1_0.age".to_string()]);
    }

    #[test]
    fn child_sees_parent_clause_and_depth() {
        let observer = ActiveCell::new(None);
        let outer_clause = ActiveCell::new(Clause::Where);
        let outer = ProcessingState::new(None, &outer_clause, &observer);
        let inner_clause = ActiveCell::new(Clause::Select);
        let inner = ProcessingState::new(Some(&outer), &inner_clause, &observer);

        assert_eq!(inner.depth(), 1);
        assert_eq!(inner.current_clause(), Clause::Select);
        assert_eq!(inner.parent().map(|p| p.current_clause()), Some(Clause::Where));
    }
}
