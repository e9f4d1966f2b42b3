// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::descriptor::FieldFlags;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Which subset of fields a save writes.
///
/// # Example
/// ```
/// use neurograph_schema::{FieldFlags, SelectionMode};
///
/// let state = FieldFlags { state: true, ..FieldFlags::default() };
/// assert!(SelectionMode::StateOnly.selects(&state));
/// assert!(!SelectionMode::InitOnly.selects(&state));
/// assert_eq!("state".parse::<SelectionMode>().unwrap(), SelectionMode::StateOnly);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// Every persistent field
    #[default]
    All,
    /// Mutable simulation state only
    StateOnly,
    /// Initial conditions only
    InitOnly,
}

impl SelectionMode {
    pub fn selects(&self, flags: &FieldFlags) -> bool {
        let not_skipped = !flags.skip || flags.init;
        match self {
            SelectionMode::All => (flags.persist || flags.state || flags.init) && not_skipped,
            SelectionMode::StateOnly => flags.state && not_skipped,
            SelectionMode::InitOnly => flags.init,
        }
    }
}

impl Display for SelectionMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SelectionMode::All => "all",
            SelectionMode::StateOnly => "state_only",
            SelectionMode::InitOnly => "init_only",
        };
        write!(f, "{name}")
    }
}

impl FromStr for SelectionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(SelectionMode::All),
            "state" | "state_only" => Ok(SelectionMode::StateOnly),
            "init" | "init_only" => Ok(SelectionMode::InitOnly),
            other => Err(format!(
                "Invalid selection mode '{other}'. Must be one of: all, state_only, init_only"
            )),
        }
    }
}
