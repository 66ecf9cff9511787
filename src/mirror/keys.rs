use std::fmt;

/// How a mirrored table is keyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryKey {
    Simple(&'static str),
    Compound(&'static [&'static str]),
}

impl PrimaryKey {
    pub fn columns(&self) -> &[&'static str] {
        match self {
            PrimaryKey::Simple(column) => std::slice::from_ref(column),
            PrimaryKey::Compound(columns) => columns,
        }
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns().iter().any(|c| *c == column)
    }
}

/// Normalized key of one row.
///
/// Compound keys keep their parts apart, so `(tone, formal)` and
/// `(style, formal)` never compare equal and a `|` inside a code cannot
/// collide with another key. `Display` renders the `type|code` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RowKey {
    Simple(String),
    Compound(Vec<String>),
}

impl RowKey {
    pub fn simple(code: impl Into<String>) -> Self {
        RowKey::Simple(code.into())
    }

    pub fn compound<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RowKey::Compound(parts.into_iter().map(Into::into).collect())
    }

    pub fn parts(&self) -> &[String] {
        match self {
            RowKey::Simple(code) => std::slice::from_ref(code),
            RowKey::Compound(parts) => parts,
        }
    }

    /// Whether this key has the arity of `pk`.
    pub fn fits(&self, pk: PrimaryKey) -> bool {
        match (self, pk) {
            (RowKey::Simple(_), PrimaryKey::Simple(_)) => true,
            (RowKey::Compound(parts), PrimaryKey::Compound(columns)) => {
                parts.len() == columns.len()
            }
            _ => false,
        }
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowKey::Simple(code) => f.write_str(code),
            RowKey::Compound(parts) => f.write_str(&parts.join("|")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn compound_keys_differ_by_type() {
        let tone = RowKey::compound(["tone", "formal"]);
        let style = RowKey::compound(["style", "formal"]);
        assert_ne!(tone, style);

        let set: HashSet<RowKey> = [tone.clone(), style].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert_eq!(tone.to_string(), "tone|formal");
    }

    #[test]
    fn separator_inside_code_does_not_collide() {
        let a = RowKey::compound(["tone", "a|b"]);
        let b = RowKey::compound(["tone|a", "b"]);
        assert_ne!(a, b);
    }

    #[test]
    fn arity_check() {
        const PAIR: PrimaryKey = PrimaryKey::Compound(&["type", "code"]);
        assert!(RowKey::simple("x").fits(PrimaryKey::Simple("code")));
        assert!(!RowKey::simple("x").fits(PAIR));
        assert!(RowKey::compound(["tone", "x"]).fits(PAIR));
        assert!(!RowKey::compound(["tone"]).fits(PAIR));
        assert_eq!(PAIR.columns(), ["type", "code"]);
        assert!(PAIR.contains("type"));
        assert!(!PAIR.contains("name"));
    }
}
