//! Line filter for `pg_dump --schema-only` output.
//!
//! A dump is cleaned in two independent passes: every line is checked
//! against an ordered list of skip rules, then runs of blank lines among the
//! survivors are collapsed to a single blank line.

use regex::Regex;

/// A named predicate over a single dump line
#[derive(Debug, Clone)]
pub struct SkipRule {
    name: &'static str,
    pattern: Regex,
}

impl SkipRule {
    fn new(name: &'static str, pattern: &str) -> Self {
        Self {
            name,
            // Patterns are fixed literals or regex::escape output
            pattern: Regex::new(pattern).expect("valid skip rule regex"),
        }
    }

    /// Rule identifier
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether this rule drops `line`
    pub fn matches(&self, line: &str) -> bool {
        self.pattern.is_match(line)
    }
}

/// Cleans schema dumps for use as a baseline migration
#[derive(Debug, Clone)]
pub struct DumpCleaner {
    rules: Vec<SkipRule>,
}

impl DumpCleaner {
    /// Build the standard rule set, excluding lines that mention `tracking_table`
    pub fn new(tracking_table: &str) -> Self {
        let rules = vec![
            SkipRule::new("session-set", r"^SET "),
            SkipRule::new("catalog-set-config", r"^SELECT pg_catalog\.set_config"),
            SkipRule::new("tracking-table", &regex::escape(tracking_table)),
            SkipRule::new("sql-comment", r"^--"),
        ];
        Self { rules }
    }

    /// The rules in the order they are evaluated
    pub fn rules(&self) -> &[SkipRule] {
        &self.rules
    }

    /// Name of the first rule that drops `line`, if any
    pub fn skip_reason(&self, line: &str) -> Option<&'static str> {
        self.rules
            .iter()
            .find(|rule| rule.matches(line))
            .map(SkipRule::name)
    }

    /// Filter a raw dump and collapse blank runs
    pub fn clean(&self, dump: &str) -> String {
        let kept = dump.split('\n').filter(|line| self.skip_reason(line).is_none());
        let collapsed = collapse_blank_runs(kept);
        log::debug!(
            "Cleaned dump: {} of {} lines kept",
            collapsed.len(),
            dump.split('\n').count()
        );
        collapsed.join("\n")
    }
}

/// Drop every blank line that directly follows another blank line
fn collapse_blank_runs<'a>(lines: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut out = Vec::new();
    let mut prev_blank = false;
    for line in lines {
        let blank = line.trim().is_empty();
        if blank && prev_blank {
            continue;
        }
        out.push(line);
        prev_blank = blank;
    }
    out
}

#[cfg(test)]
#[path = "clean_test.rs"]
mod tests;
