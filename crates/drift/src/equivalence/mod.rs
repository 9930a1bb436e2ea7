//! Column type equivalence.
//!
//! Catalogs report the same type under several spellings: a column created as
//! `varchar` comes back as `character varying`, `float8` as `double precision`,
//! and so on. [`TypeEquivalence`] decides whether a reported type matches the
//! type a table definition expects, using a table of *type families*.
//!
//! Type names are compared after normalization (see [`normalize_type_name`]):
//! lowercased, whitespace collapsed, parenthesized modifiers dropped. Two names
//! are equivalent if they normalize to the same string or belong to the same
//! family. Anything else, including spellings no family knows about, is a
//! mismatch.
//!
//! ```
//! use drift::TypeEquivalence;
//!
//! let types = TypeEquivalence::postgres();
//! assert!(types.is_equivalent("character varying", "text"));
//! assert!(types.is_equivalent("varchar(255)", "text"));
//! assert!(!types.is_equivalent("integer", "text"));
//! ```

use crate::{Error, Result};
use drift_config::{Config, TypeFamily};
use indexmap::IndexMap;

/// Built-in PostgreSQL type families: canonical name, then other spellings.
const POSTGRES_FAMILIES: &[(&str, &[&str])] = &[
    ("text", &["varchar", "character varying"]),
    ("character", &["char", "bpchar"]),
    ("smallint", &["int2"]),
    ("integer", &["int", "int4", "serial", "serial4"]),
    ("bigint", &["int8", "bigserial", "serial8"]),
    ("real", &["float4"]),
    // Bare `float` is left out: `float(p)` is `real` for p <= 24, and
    // modifiers are dropped before lookup.
    ("double precision", &["double", "float8"]),
    ("numeric", &["decimal"]),
    ("boolean", &["bool"]),
    ("timestamp", &["timestamp without time zone"]),
    ("timestamptz", &["timestamp with time zone"]),
    ("time", &["time without time zone"]),
    ("timetz", &["time with time zone"]),
    ("date", &[]),
    ("bytea", &[]),
    ("uuid", &[]),
    ("json", &[]),
    ("jsonb", &[]),
];

/// The built-in PostgreSQL type families.
pub fn postgres_families() -> Vec<TypeFamily> {
    POSTGRES_FAMILIES
        .iter()
        .map(|(canonical, spellings)| TypeFamily::new(*canonical, spellings.iter().copied()))
        .collect()
}

/// Normalize a type name for comparison.
///
/// Lowercases, drops parenthesized modifiers (`varchar(255)`, `numeric(10, 2)`,
/// `timestamp(6) without time zone`) and collapses whitespace.
pub fn normalize_type_name(name: &str) -> String {
    let mut stripped = String::with_capacity(name.len());
    let mut depth = 0usize;

    for c in name.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth > 0 => {}
            _ => stripped.push(c),
        }
    }

    stripped
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Decides whether an actual column type matches an expected one.
#[derive(Debug, Clone)]
pub struct TypeEquivalence {
    /// Families with normalized names, canonical names unique
    families: Vec<TypeFamily>,
    /// Normalized spelling (canonical names included) to family index
    index: IndexMap<String, usize>,
}

/// A spelling claimed by two families.
struct Conflict {
    spelling: String,
    first: usize,
    second: usize,
}

impl TypeEquivalence {
    /// Classifier for the built-in PostgreSQL families.
    pub fn postgres() -> Self {
        let (types, conflicts) = Self::collect(postgres_families());
        debug_assert!(
            conflicts.is_empty(),
            "built-in type families claim the same spelling twice"
        );
        types
    }

    /// Build a classifier from a list of families.
    ///
    /// Families sharing a canonical name are merged. Fails if one spelling
    /// ends up in two different families.
    pub fn new(families: impl IntoIterator<Item = TypeFamily>) -> Result<Self> {
        let (types, conflicts) = Self::collect(families);

        match conflicts.into_iter().next() {
            Some(conflict) => Err(Error::ConflictingTypeFamily {
                spelling: conflict.spelling,
                first: types.families[conflict.first].canonical.clone(),
                second: types.families[conflict.second].canonical.clone(),
            }),
            None => Ok(types),
        }
    }

    /// Build a classifier from configuration: the built-in families (unless
    /// disabled) extended with the configured ones.
    pub fn from_config(config: &Config) -> Result<Self> {
        let base = if config.use_builtin_families() {
            postgres_families()
        } else {
            Vec::new()
        };

        Self::new(base.into_iter().chain(config.type_families.iter().cloned()))
    }

    fn collect(families: impl IntoIterator<Item = TypeFamily>) -> (Self, Vec<Conflict>) {
        let mut merged: Vec<TypeFamily> = Vec::new();

        for family in families {
            let canonical = normalize_type_name(&family.canonical);
            let position = match merged.iter().position(|f| f.canonical == canonical) {
                Some(position) => position,
                None => {
                    merged.push(TypeFamily::new(canonical.clone(), Vec::<String>::new()));
                    merged.len() - 1
                }
            };

            let target = &mut merged[position];
            for spelling in &family.spellings {
                let spelling = normalize_type_name(spelling);
                if spelling != canonical && !target.spellings.contains(&spelling) {
                    target.spellings.push(spelling);
                }
            }
        }

        let mut index: IndexMap<String, usize> = IndexMap::new();
        let mut conflicts = Vec::new();

        for (i, family) in merged.iter().enumerate() {
            for spelling in std::iter::once(&family.canonical).chain(&family.spellings) {
                match index.get(spelling) {
                    Some(&first) if first != i => conflicts.push(Conflict {
                        spelling: spelling.clone(),
                        first,
                        second: i,
                    }),
                    Some(_) => {}
                    None => {
                        index.insert(spelling.clone(), i);
                    }
                }
            }
        }

        (
            Self {
                families: merged,
                index,
            },
            conflicts,
        )
    }

    /// Returns true if `actual` (as reported by a catalog) is the same type as
    /// `expected` (as written in a table definition).
    pub fn is_equivalent(&self, actual: &str, expected: &str) -> bool {
        let actual = normalize_type_name(actual);
        let expected = normalize_type_name(expected);

        if actual == expected {
            return true;
        }

        match (self.index.get(&actual), self.index.get(&expected)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Canonical name of the family `type_name` belongs to, if any.
    pub fn canonical_name(&self, type_name: &str) -> Option<&str> {
        let family = *self.index.get(&normalize_type_name(type_name))?;
        Some(self.families[family].canonical.as_str())
    }

    /// The known families, normalized and merged.
    pub fn families(&self) -> &[TypeFamily] {
        &self.families
    }
}

impl Default for TypeEquivalence {
    fn default() -> Self {
        Self::postgres()
    }
}
