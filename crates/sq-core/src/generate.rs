//! Baseline migration generation

use crate::error::CoreResult;
use chrono::NaiveDateTime;
use minijinja::{context, Environment};

/// Timestamp format used in the up-migration header
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Command shown in the header for regenerating the baseline
const REGENERATE_COMMAND: &str = "pgsquash";

const UP_HEADER_TEMPLATE: &str = "\
-- Consolidated initial schema for {{ project_name }}
-- Generated: {{ generated_at }}
-- This migration consolidates all previous migrations into a single baseline
--
-- To regenerate: {{ regenerate_command }}

";

/// Rollback for the baseline. Object discovery happens when the script runs,
/// so it does not depend on the dump it was generated next to.
pub const DOWN_MIGRATION: &str = "\
-- Rollback consolidated initial schema
--
-- This drops all objects in the public schema

DO $$
DECLARE
    r RECORD;
BEGIN
    -- Drop all materialized views
    FOR r IN (SELECT matviewname FROM pg_matviews WHERE schemaname = 'public')
    LOOP
        EXECUTE 'DROP MATERIALIZED VIEW IF EXISTS ' || quote_ident(r.matviewname) || ' CASCADE';
    END LOOP;

    -- Drop all views
    FOR r IN (SELECT viewname FROM pg_views WHERE schemaname = 'public')
    LOOP
        EXECUTE 'DROP VIEW IF EXISTS ' || quote_ident(r.viewname) || ' CASCADE';
    END LOOP;

    -- Drop all tables
    FOR r IN (SELECT tablename FROM pg_tables WHERE schemaname = 'public')
    LOOP
        EXECUTE 'DROP TABLE IF EXISTS ' || quote_ident(r.tablename) || ' CASCADE';
    END LOOP;

    -- Drop all functions, with argument types so overloads are distinguished
    FOR r IN (SELECT proname, oidvectortypes(proargtypes) as argtypes
              FROM pg_proc INNER JOIN pg_namespace ON pg_proc.pronamespace = pg_namespace.oid
              WHERE pg_namespace.nspname = 'public')
    LOOP
        EXECUTE 'DROP FUNCTION IF EXISTS ' || quote_ident(r.proname) || '(' || r.argtypes || ') CASCADE';
    END LOOP;
END $$;
";

/// Contents of the generated up/down migration files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationPair {
    /// Header plus cleaned schema
    pub up: String,

    /// Static rollback script
    pub down: String,
}

impl MigrationPair {
    /// Build the pair from an already-cleaned schema dump
    pub fn build(
        project_name: &str,
        cleaned_schema: &str,
        generated_at: NaiveDateTime,
    ) -> CoreResult<Self> {
        let header = render_up_header(project_name, generated_at)?;
        Ok(Self {
            up: header + cleaned_schema,
            down: DOWN_MIGRATION.to_string(),
        })
    }

    /// First `limit` lines of the up-migration
    pub fn up_preview(&self, limit: usize) -> String {
        self.up.split('\n').take(limit).collect::<Vec<_>>().join("\n")
    }
}

/// Render the comment block placed before the schema
pub fn render_up_header(project_name: &str, generated_at: NaiveDateTime) -> CoreResult<String> {
    let mut env = Environment::new();
    // The blank line separating header and schema is part of the template
    env.set_keep_trailing_newline(true);

    let rendered = env.render_str(
        UP_HEADER_TEMPLATE,
        context! {
            project_name => project_name,
            generated_at => generated_at.format(TIMESTAMP_FORMAT).to_string(),
            regenerate_command => REGENERATE_COMMAND,
        },
    )?;
    Ok(rendered)
}

#[cfg(test)]
#[path = "generate_test.rs"]
mod tests;
