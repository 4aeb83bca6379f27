use std::fmt;

/// The part of a statement currently being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Clause {
    Select,
    From,
    Where,
    OrderBy,
    Limit,
    Delete,
    #[default]
    Irrelevant,
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Clause::Select => "SELECT",
            Clause::From => "FROM",
            Clause::Where => "WHERE",
            Clause::OrderBy => "ORDER BY",
            Clause::Limit => "LIMIT",
            Clause::Delete => "DELETE",
            Clause::Irrelevant => "-",
        };
        f.write_str(name)
    }
}
