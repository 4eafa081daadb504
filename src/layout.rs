// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Per-type field layout table.
//!
//! Records expose `priority`, `weight` and `target` as a view over their RDATA
//! text. Which of those a type has, and where they sit in the RDATA, is looked
//! up here by type mnemonic instead of being matched on in the converter. New
//! types are supported by inserting a layout; the conversion loop itself does
//! not change.
//!
//! Exposed fields always occupy the leading RDATA tokens in the fixed order
//! priority, weight, target.

use std::collections::BTreeMap;

/// Which structured fields a record type exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldLayout {
    /// First RDATA token is a 16-bit priority/preference
    pub priority: bool,
    /// Next RDATA token is a 16-bit weight
    pub weight: bool,
    /// Next RDATA token is a domain-name target
    pub target: bool,
    /// The target stays embedded in `value` and is not exposed as `target`
    pub target_in_value: bool,
}

impl FieldLayout {
    /// Type with no structured fields (A, TXT, CAA, ...)
    pub const NONE: Self = Self {
        priority: false,
        weight: false,
        target: false,
        target_in_value: false,
    };

    /// Preference followed by exchange name, target not exposed (MX)
    pub const PRIORITY: Self = Self {
        priority: true,
        ..Self::NONE
    };

    /// Single target name (CNAME, DNAME)
    pub const TARGET: Self = Self {
        target: true,
        ..Self::NONE
    };

    /// Priority then target name (SVCB, HTTPS)
    pub const PRIORITY_TARGET: Self = Self {
        priority: true,
        target: true,
        ..Self::NONE
    };

    /// Priority, weight, port, target; target left inside `value` (SRV)
    pub const SERVICE: Self = Self {
        priority: true,
        weight: true,
        target: false,
        target_in_value: true,
    };

    /// True if `target` is surfaced as a structured field.
    #[must_use]
    pub const fn exposes_target(&self) -> bool {
        self.target && !self.target_in_value
    }

    /// True if the type has no structured fields at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        !self.priority && !self.weight && !self.exposes_target()
    }
}

/// Mnemonic → layout table consulted by both conversion directions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLayouts {
    table: BTreeMap<String, FieldLayout>,
}

impl Default for FieldLayouts {
    fn default() -> Self {
        let mut layouts = Self::empty();
        layouts.insert("MX", FieldLayout::PRIORITY);
        layouts.insert("SRV", FieldLayout::SERVICE);
        layouts.insert("SVCB", FieldLayout::PRIORITY_TARGET);
        layouts.insert("HTTPS", FieldLayout::PRIORITY_TARGET);
        layouts.insert("CNAME", FieldLayout::TARGET);
        layouts.insert("DNAME", FieldLayout::TARGET);
        layouts
    }
}

impl FieldLayouts {
    /// Table with no entries; every type resolves to [`FieldLayout::NONE`].
    #[must_use]
    pub fn empty() -> Self {
        Self {
            table: BTreeMap::new(),
        }
    }

    /// Layout for a type mnemonic (case-insensitive).
    #[must_use]
    pub fn get(&self, mnemonic: &str) -> FieldLayout {
        self.table
            .get(&mnemonic.to_ascii_uppercase())
            .copied()
            .unwrap_or(FieldLayout::NONE)
    }

    /// Register or replace the layout for a mnemonic, returning the previous one.
    pub fn insert(&mut self, mnemonic: &str, layout: FieldLayout) -> Option<FieldLayout> {
        self.table.insert(mnemonic.to_ascii_uppercase(), layout)
    }

    #[must_use]
    pub fn with(mut self, mnemonic: &str, layout: FieldLayout) -> Self {
        self.insert(mnemonic, layout);
        self
    }
}

#[cfg(test)]
#[path = "layout_tests.rs"]
mod layout_tests;
