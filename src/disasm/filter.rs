//! Suppresses instructions of excluded functions in a disassembly listing

use serde::{Deserialize, Serialize};

/// Runtime support routines that are not worth fusing
pub const DEFAULT_EXCLUDED_FUNCTIONS: &[&str] = &[
    "exit",
    "register_fini",
    "frame_dummy",
    "stdio_exit_handler",
    "cleanup_stdio",
    "global_stdio_init.part.0",
];

/// Which functions to drop
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FunctionFilterConfig {
    /// Exact function names
    pub excluded_functions: Vec<String>,
    /// Functions whose name starts with this are dropped too
    pub excluded_prefix: Option<String>,
}

impl Default for FunctionFilterConfig {
    fn default() -> Self {
        Self {
            excluded_functions: DEFAULT_EXCLUDED_FUNCTIONS.iter().map(|f| f.to_string()).collect(),
            excluded_prefix: Some("_".to_string()),
        }
    }
}

/// Linear scan over listing lines
///
/// A label line (`00010074 <main>:`) switches the filter on or off for all
/// lines up to the next label.
pub struct FunctionFilter<'a> {
    config: &'a FunctionFilterConfig,
    in_excluded: bool,
}

impl<'a> FunctionFilter<'a> {
    pub fn new(config: &'a FunctionFilterConfig) -> Self {
        Self {
            config,
            in_excluded: false,
        }
    }

    /// Feed the next line; returns whether it belongs to an excluded function
    pub fn suppresses(&mut self, line: &str) -> bool {
        if let Some(name) = label_name(line) {
            self.in_excluded = self.is_excluded(name);
        }
        self.in_excluded
    }

    pub fn is_excluded(&self, name: &str) -> bool {
        self.config.excluded_functions.iter().any(|f| f == name)
            || self
                .config
                .excluded_prefix
                .as_deref()
                .is_some_and(|prefix| !prefix.is_empty() && name.starts_with(prefix))
    }
}

/// Function name of a `<addr> <name>:` label line
fn label_name(line: &str) -> Option<&str> {
    let mut parts = line.split_whitespace();
    let (Some(_address), Some(label), None) = (parts.next(), parts.next(), parts.next()) else {
        return None;
    };
    label.strip_prefix('<')?.strip_suffix(">:")
}
