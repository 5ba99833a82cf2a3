//! Header-to-role resolution.
//!
//! Incoming files name their columns inconsistently ("Valor COP",
//! "valor_cop", "PRESUPUESTO COP", ...), so roles are assigned by
//! case-insensitive keyword matching over the header row. The rule table is
//! an explicit ordered list: each header is tested against the rules top to
//! bottom and claims the first role whose rule matches and that no earlier
//! header already claimed. A header claims at most one role, and a role is
//! never reassigned once claimed.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The closed set of semantic roles a column can fill, in rule priority
/// order. Priority matters: "Valor_SMMLV" contains "valor" but must reach
/// the UnitValue rule, which only works because the MonetaryValue rule also
/// requires "cop".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    Identifier,
    SequenceNumber,
    CounterpartyName,
    Description,
    MonetaryValue,
    UnitValue,
    ClassificationCodes,
}

impl Role {
    pub const COUNT: usize = 7;
    pub const ALL: [Role; Role::COUNT] = [
        Role::Identifier,
        Role::SequenceNumber,
        Role::CounterpartyName,
        Role::Description,
        Role::MonetaryValue,
        Role::UnitValue,
        Role::ClassificationCodes,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Role::Identifier => "identifier",
            Role::SequenceNumber => "sequence_number",
            Role::CounterpartyName => "counterparty_name",
            Role::Description => "description",
            Role::MonetaryValue => "monetary_value",
            Role::UnitValue => "unit_value",
            Role::ClassificationCodes => "classification_codes",
        }
    }

    /// Column position this role occupies in the reference export layout,
    /// used by [`ResolveMode::PositionalFallback`].
    fn default_position(self) -> usize {
        match self {
            Role::Identifier => 0,
            Role::SequenceNumber => 1,
            Role::CounterpartyName => 4,
            Role::Description => 5,
            Role::UnitValue => 6,
            Role::MonetaryValue => 7,
            Role::ClassificationCodes => 9,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// What to do with roles no header keyword matched: fail with the missing
/// role names, or fall back to the reference layout positions. Callers pick
/// explicitly; there is no implicit default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    Strict,
    PositionalFallback,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("No column found for role(s): {}", role_list(.missing))]
pub struct ResolveError {
    pub missing: Vec<Role>,
}

fn role_list(roles: &[Role]) -> String {
    roles
        .iter()
        .map(|role| role.label())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Resolved role-to-column association for one loaded table. Built once per
/// table and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleMapping {
    pub identifier: String,
    pub sequence_number: String,
    pub counterparty_name: String,
    pub description: String,
    pub monetary_value: String,
    pub unit_value: String,
    pub classification_codes: String,
}

impl RoleMapping {
    pub fn column(&self, role: Role) -> &str {
        match role {
            Role::Identifier => &self.identifier,
            Role::SequenceNumber => &self.sequence_number,
            Role::CounterpartyName => &self.counterparty_name,
            Role::Description => &self.description,
            Role::MonetaryValue => &self.monetary_value,
            Role::UnitValue => &self.unit_value,
            Role::ClassificationCodes => &self.classification_codes,
        }
    }

    pub fn entries(&self) -> [(Role, &str); Role::COUNT] {
        Role::ALL.map(|role| (role, self.column(role)))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file =
            File::create(path).with_context(|| format!("Creating mapping file {path:?}"))?;
        serde_json::to_writer_pretty(file, self).context("Writing role mapping JSON")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening mapping file {path:?}"))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).context("Parsing role mapping JSON")
    }
}

/// Keyword rules in priority order. Substring tests run against the
/// lowercased header. The bare "id" test is deliberately kept as-is even
/// though headers like "Validado" also contain it; the rule order and the
/// first-claim policy are locked down by tests below.
const RULES: [(Role, fn(&str) -> bool); Role::COUNT] = [
    (Role::Identifier, |h| h.contains("id")),
    (Role::SequenceNumber, |h| h.contains("consecutivo")),
    (Role::CounterpartyName, |h| h.contains("contratante")),
    (Role::Description, |h| h.contains("objeto")),
    (Role::MonetaryValue, |h| {
        (h.contains("valor") || h.contains("presupuesto")) && h.contains("cop")
    }),
    (Role::UnitValue, |h| h.contains("smmlv")),
    (Role::ClassificationCodes, |h| {
        h.contains("codigos") || h.contains("unspsc")
    }),
];

pub fn resolve(headers: &[String], mode: ResolveMode) -> Result<RoleMapping, ResolveError> {
    let mut assigned: Vec<Option<String>> = vec![None; Role::COUNT];

    for header in headers {
        let lowered = header.to_lowercase();
        for (role, matches) in RULES {
            let slot = &mut assigned[role as usize];
            // A header whose rule matched an already-claimed role falls
            // through to the remaining rules.
            if slot.is_none() && matches(&lowered) {
                *slot = Some(header.clone());
                break;
            }
        }
    }

    if mode == ResolveMode::PositionalFallback {
        for role in Role::ALL {
            let slot = &mut assigned[role as usize];
            if slot.is_none() {
                if let Some(header) = headers.get(role.default_position()) {
                    *slot = Some(header.clone());
                }
            }
        }
    }

    let missing: Vec<Role> = Role::ALL
        .into_iter()
        .filter(|role| assigned[*role as usize].is_none())
        .collect();
    if !missing.is_empty() {
        return Err(ResolveError { missing });
    }

    let mut take = |role: Role| assigned[role as usize].take().unwrap_or_default();
    Ok(RoleMapping {
        identifier: take(Role::Identifier),
        sequence_number: take(Role::SequenceNumber),
        counterparty_name: take(Role::CounterpartyName),
        description: take(Role::Description),
        monetary_value: take(Role::MonetaryValue),
        unit_value: take(Role::UnitValue),
        classification_codes: take(Role::ClassificationCodes),
    })
}
