//! SQL schema for the strain catalog.
//!
//! Applied by the schema guard on every run. Re-applying against an up-to-date
//! database is a no-op thanks to `IF NOT EXISTS`.

/// Per-connection settings; executed as soon as a connection opens.
pub const PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
";

/// Full structural DDL.
pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS strain (
    strain_id    INTEGER PRIMARY KEY AUTOINCREMENT,
    reference_id INTEGER NOT NULL UNIQUE CHECK (reference_id > 0),
    name         TEXT    NOT NULL,
    race         TEXT    NOT NULL DEFAULT '',
    created_at   TEXT    NOT NULL,   -- RFC 3339 UTC
    updated_at   TEXT    NOT NULL
);

-- Interned: one row per distinct flavor name, shared by all strains.
CREATE TABLE IF NOT EXISTS flavor (
    flavor_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    name       TEXT    NOT NULL UNIQUE,
    created_at TEXT    NOT NULL
);

-- Interned: one row per distinct (name, category) pair.
CREATE TABLE IF NOT EXISTS effect (
    effect_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    name       TEXT    NOT NULL,
    category   TEXT    NOT NULL CHECK (category IN ('positive', 'negative', 'medical')),
    created_at TEXT    NOT NULL,
    UNIQUE (name, category)
);

-- Junctions. Rows here are the only thing reconciliation ever deletes.
CREATE TABLE IF NOT EXISTS strain_flavors (
    strain_id INTEGER NOT NULL REFERENCES strain(strain_id),
    flavor_id INTEGER NOT NULL REFERENCES flavor(flavor_id),
    PRIMARY KEY (strain_id, flavor_id)
);

CREATE TABLE IF NOT EXISTS strain_effects (
    strain_id INTEGER NOT NULL REFERENCES strain(strain_id),
    effect_id INTEGER NOT NULL REFERENCES effect(effect_id),
    PRIMARY KEY (strain_id, effect_id)
);

-- Exactly one logical row; replaced on each forward migration.
CREATE TABLE IF NOT EXISTS database_ver (
    id         INTEGER PRIMARY KEY CHECK (id = 1),
    iteration  INTEGER NOT NULL,
    applied_by TEXT    NOT NULL,
    applied_at TEXT    NOT NULL
);

CREATE INDEX IF NOT EXISTS strain_name_idx           ON strain(name);
CREATE INDEX IF NOT EXISTS strain_race_idx           ON strain(race);
CREATE INDEX IF NOT EXISTS strain_flavors_flavor_idx ON strain_flavors(flavor_id);
CREATE INDEX IF NOT EXISTS strain_effects_effect_idx ON strain_effects(effect_id);
";
