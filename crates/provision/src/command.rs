//! `puppet apply` command assembly
//!
//! Pure string building: nothing in here talks to the guest. The result is a
//! single shell command for the executor, correct for the guest's shell
//! family (sh or PowerShell).

use std::collections::BTreeMap;

use crate::config::Config;
use crate::shell::quote;
use crate::types::{ModulePathMapping, Platform, ResolvedBinary, ResolvedMode, ResolvedPlan, join_guest};

/// Everything that goes into one `puppet apply` invocation.
#[derive(Debug, Clone)]
pub struct ApplyCommand<'a> {
    pub binary: &'a ResolvedBinary,
    pub mode: &'a ResolvedMode,
    pub module_paths: &'a [ModulePathMapping],
    pub hiera_guest_path: Option<&'a str>,
    pub facter: &'a BTreeMap<String, String>,
    pub environment_variables: &'a BTreeMap<String, String>,
    pub options: &'a [String],
    pub working_directory: Option<&'a str>,
    pub platform: Platform,
    /// Whether the output ends up on a terminal that renders colors
    pub color: bool,
}

impl<'a> ApplyCommand<'a> {
    /// Collect the inputs from a config and its resolved plan.
    pub fn from_plan(
        config: &'a Config,
        plan: &'a ResolvedPlan,
        binary: &'a ResolvedBinary,
        platform: Platform,
        color: bool,
    ) -> Self {
        Self {
            binary,
            mode: &plan.mode,
            module_paths: &plan.module_paths,
            hiera_guest_path: plan.hiera_guest_path.as_deref(),
            facter: &config.facter,
            environment_variables: &config.environment_variables,
            options: &config.options,
            working_directory: config.working_directory.as_deref(),
            platform,
            color,
        }
    }

    /// Flags and positional arguments passed after `apply`.
    pub fn flags(&self) -> Vec<String> {
        let mut flags: Vec<String> = self.options.to_vec();

        if !self.module_paths.is_empty() {
            let mut paths: Vec<&str> = self
                .module_paths
                .iter()
                .map(|m| m.guest_path.as_str())
                .collect();
            paths.push(self.platform.default_module_path());
            flags.push(format!(
                "--modulepath {}",
                quote(self.platform, &paths.join(self.platform.path_list_separator()))
            ));
        }

        if let Some(hiera) = self.hiera_guest_path {
            flags.push(format!("--hiera_config={hiera}"));
        }

        if !self.color {
            flags.push("--color=false".to_string());
        }

        flags.push("--detailed-exitcodes".to_string());

        match self.mode {
            ResolvedMode::Environment { dir, name } => {
                flags.push(join_guest(&join_guest(dir, name), "manifests"));
                flags.push(format!("--environment {name}"));
            }
            ResolvedMode::Manifest { dir, file } => {
                flags.push(format!("--manifestdir {dir}"));
                flags.push(join_guest(dir, file));
            }
        }

        flags
    }

    /// The full command line, including environment prefixes and `cd`.
    pub fn build(&self) -> String {
        let invocation = self.binary.invocation();
        let flags = self.flags().join(" ");

        let parts = [
            render_environment_variables(self.environment_variables, self.platform),
            render_facts(self.facter, self.platform),
            Some(invocation),
            Some("apply".to_string()),
            Some(flags),
        ];
        let command = parts
            .into_iter()
            .flatten()
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        let command = match self.working_directory {
            Some(dir) => change_directory(dir, &command, self.platform),
            None => command,
        };

        // powershell.exe exits 0 after a failed native command unless told otherwise
        match self.platform {
            Platform::Posix => command,
            Platform::Windows => format!("{command}; exit $LASTEXITCODE"),
        }
    }
}

/// Render facts as `FACTER_<name>` assignments, or `None` when there are none.
pub fn render_facts(facter: &BTreeMap<String, String>, platform: Platform) -> Option<String> {
    if facter.is_empty() {
        return None;
    }

    let facts: Vec<String> = facter
        .iter()
        .map(|(key, value)| match platform {
            Platform::Posix => format!("FACTER_{key}={}", quote(platform, value)),
            Platform::Windows => format!("$env:FACTER_{key}={};", quote(platform, value)),
        })
        .collect();
    Some(facts.join(" "))
}

/// Render extra environment variables, or `None` when there are none.
pub fn render_environment_variables(
    vars: &BTreeMap<String, String>,
    platform: Platform,
) -> Option<String> {
    if vars.is_empty() {
        return None;
    }

    let assignments: Vec<String> = vars
        .iter()
        .map(|(key, value)| match platform {
            Platform::Posix => format!("{key}=\"{}\"", posix_double_quote_escape(value)),
            Platform::Windows => format!("$env:{key}={};", quote(platform, value)),
        })
        .collect();
    Some(assignments.join(" "))
}

/// Run `command` only if changing into `dir` succeeded.
pub fn change_directory(dir: &str, command: &str, platform: Platform) -> String {
    match platform {
        Platform::Posix => format!("cd {} && {command}", quote(platform, dir)),
        Platform::Windows => format!(
            "cd {}; if ($?) {{ {command} }} else {{ exit 1 }}",
            quote(platform, dir)
        ),
    }
}

/// Escape the characters sh still interprets inside double quotes.
fn posix_double_quote_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
