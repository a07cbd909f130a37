// src/pipeline/template.rs

//! Placeholder substitution in command text.
//!
//! | Placeholder      | Value                                   |
//! |------------------|-----------------------------------------|
//! | `${BACKUP_ID}`   | run id                                  |
//! | `${TEMP_DIR}`    | workspace path                          |
//! | `${BACKUP_NAME}` | the unexpanded string being processed   |
//!
//! Expansion is one left-to-right scan. Inserted values are never scanned
//! again, so `${BACKUP_NAME}` yields the original text verbatim and the
//! result does not depend on any key ordering. Unknown `${...}` tokens are
//! left alone. There is no escape syntax.

use std::path::Path;

use crate::pipeline::id::RunId;

pub const BACKUP_ID: &str = "${BACKUP_ID}";
pub const TEMP_DIR: &str = "${TEMP_DIR}";
pub const BACKUP_NAME: &str = "${BACKUP_NAME}";

/// Run-scoped values available to templates.
#[derive(Debug, Clone, Copy)]
pub struct TemplateVars<'a> {
    pub run_id: &'a str,
    pub temp_dir: &'a str,
}

/// Expand every command into a new vector. The input is left untouched.
pub fn expand_commands(commands: &[String], run_id: &RunId, workspace: &Path) -> Vec<String> {
    let temp_dir = workspace.to_string_lossy();
    let vars = TemplateVars {
        run_id: run_id.as_str(),
        temp_dir: &temp_dir,
    };
    commands.iter().map(|cmd| expand(cmd, &vars)).collect()
}

/// Expand the placeholders in a single string.
pub fn expand(original: &str, vars: &TemplateVars<'_>) -> String {
    let mut out = String::with_capacity(original.len());
    let mut rest = original;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let candidate = &rest[start..];

        let matched = [
            (BACKUP_ID, vars.run_id),
            (TEMP_DIR, vars.temp_dir),
            (BACKUP_NAME, original),
        ]
        .into_iter()
        .find(|(token, _)| candidate.starts_with(token));

        match matched {
            Some((token, value)) => {
                out.push_str(value);
                rest = &candidate[token.len()..];
            }
            None => {
                out.push_str("${");
                rest = &candidate[2..];
            }
        }
    }

    out.push_str(rest);
    out
}
