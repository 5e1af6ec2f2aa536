//! Display metadata for node palettes.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::{WorkflowError, WorkflowResult};

static HEX_COLOR: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^#(?:[0-9a-fA-F]{3}){1,2}$").ok());

const PALETTE: [&str; 19] = [
    "#007BFF", "#28A745", "#FFC107", "#DC3545", "#6F42C1", "#FD7E14", "#20C997",
    "#E83E8C", "#17A2B8", "#6610F2", "#8CC63F", "#FF00FF", "#FFD700", "#FF7F50",
    "#40E0D0", "#00BFFF", "#FF5522", "#FA8072", "#8A2BE2",
];

/// Short label and color shown for a node in an editor.
///
/// Purely cosmetic: nothing in the runtime depends on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct VisualTag {
    acronym: String,
    color: String,
}

impl VisualTag {
    /// Creates a tag, checking that `color` is a `#rgb` or `#rrggbb` hex code.
    pub fn new(acronym: impl Into<String>, color: impl Into<String>) -> WorkflowResult<Self> {
        let acronym = acronym.into();
        let color = color.into();

        if acronym.trim().is_empty() {
            return Err(WorkflowError::InvalidVisualTag("acronym is empty".into()));
        }
        let valid_color = HEX_COLOR.as_ref().is_some_and(|re| re.is_match(&color));
        if !valid_color {
            return Err(WorkflowError::InvalidVisualTag(format!(
                "`{color}` is not a hex color"
            )));
        }

        Ok(Self { acronym, color })
    }

    /// Derives the default tag of a node from its snake_case name.
    ///
    /// The acronym is the upper-cased first letter of every `_`-separated
    /// word. The color is picked from a fixed palette by hashing the name,
    /// so it is stable across runs.
    pub fn default_for(name: &str) -> Self {
        let acronym: String = name
            .split('_')
            .filter_map(|word| word.chars().next())
            .collect::<String>()
            .to_uppercase();

        let digest = Sha256::digest(name.as_bytes());
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        let index = u64::from_be_bytes(prefix) % PALETTE.len() as u64;

        Self {
            acronym,
            color: PALETTE[index as usize].to_owned(),
        }
    }

    /// Returns the acronym.
    pub fn acronym(&self) -> &str {
        &self.acronym
    }

    /// Returns the hex color.
    pub fn color(&self) -> &str {
        &self.color
    }
}
