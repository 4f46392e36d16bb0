//! Canonical migration list, applied in order and recorded in `_migrations`.

/// A named migration: `(name, sql)`.
pub type Migration = (&'static str, &'static str);

pub const MIGRATIONS: &[Migration] = &[
    (
        "0001_schema",
        include_str!("../../migrations/0001_schema.sql"),
    ),
    (
        "0002_companions_library",
        include_str!("../../migrations/0002_companions_library.sql"),
    ),
];
