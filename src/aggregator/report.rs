//! Per-version group report.
//!
//! Groups are broken down by the class and method named in their pattern,
//! the way a developer triages a release: which classes crash, and in
//! which methods. Patterns that cannot be decomposed (raw addresses) are
//! listed separately.

use crate::parser::pattern::decompose_pattern;
use crate::parser::schema::{Group, GroupId};
use crate::utils::config::SCHEMA_VERSION;
use chrono::Utc;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Group overview for one application version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupReport {
    /// Report schema version
    pub version: String,

    pub bundle_identifier: String,
    pub affected_version: String,

    /// Sum of group amounts plus ungrouped crashes
    pub total_crashes: u64,

    /// Crashes of this version without a signature
    pub ungrouped: u32,

    /// Decomposed groups, by class name (`None` for plain functions)
    pub classes: Vec<ClassSummary>,

    /// Groups whose pattern has no recognizable frame
    pub unknown: Vec<GroupEntry>,

    /// ISO 8601 timestamp
    pub generated_at: String,
}

/// All groups crashing inside one class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSummary {
    pub class: Option<String>,
    pub amount: u64,
    pub methods: Vec<MethodSummary>,
}

/// All groups crashing inside one method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodSummary {
    pub method: String,
    pub amount: u64,
    pub groups: Vec<GroupEntry>,
}

/// One group as shown in a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupEntry {
    pub group_id: GroupId,
    pub pattern: String,

    /// `file:line` of the crashing frame, if known
    pub location: Option<String>,

    pub amount: u32,
    pub latest_timestamp: Option<String>,
    pub fix_version: String,
    pub description: String,
}

impl GroupEntry {
    fn from_group(group: &Group, location: Option<String>) -> Self {
        Self {
            group_id: group.id,
            pattern: group.pattern.clone(),
            location,
            amount: group.amount,
            latest_timestamp: group.latest_timestamp.map(|ts| ts.to_rfc3339()),
            fix_version: group.fix_version.clone(),
            description: group.description.clone(),
        }
    }
}

impl GroupReport {
    /// Number of groups in the report
    pub fn group_count(&self) -> usize {
        let decomposed: usize = self
            .classes
            .iter()
            .flat_map(|class| class.methods.iter())
            .map(|method| method.groups.len())
            .sum();
        decomposed + self.unknown.len()
    }
}

/// Build the report for one application version
///
/// **Public** - used by the groups command
///
/// # Arguments
/// * `bundle_identifier` - Application the groups belong to
/// * `affected_version` - Version the groups belong to
/// * `groups` - All groups of that version
/// * `ungrouped` - Number of crashes without a group
///
/// # Returns
/// Report with classes sorted by crash count (descending), then name.
/// Groups with no remaining members are omitted.
pub fn build_group_report(
    bundle_identifier: &str,
    affected_version: &str,
    groups: &[Group],
    ungrouped: u32,
) -> GroupReport {
    let mut by_class: BTreeMap<Option<String>, BTreeMap<String, Vec<GroupEntry>>> = BTreeMap::new();
    let mut unknown = Vec::new();

    // Groups emptied by regrouping are left out entirely
    for group in groups.iter().filter(|group| group.amount > 0) {
        match decompose_pattern(&group.pattern) {
            Some(parts) => by_class
                .entry(parts.class)
                .or_default()
                .entry(parts.method)
                .or_default()
                .push(GroupEntry::from_group(group, Some(parts.location))),
            None => unknown.push(GroupEntry::from_group(group, None)),
        }
    }

    let mut classes: Vec<ClassSummary> = by_class
        .into_iter()
        .map(|(class, methods)| {
            let mut methods: Vec<MethodSummary> = methods
                .into_iter()
                .map(|(method, mut groups)| {
                    groups.sort_by(|a, b| b.amount.cmp(&a.amount));
                    MethodSummary {
                        amount: groups.iter().map(|g| g.amount as u64).sum(),
                        method,
                        groups,
                    }
                })
                .collect();
            methods.sort_by(|a, b| b.amount.cmp(&a.amount));

            ClassSummary {
                amount: methods.iter().map(|m| m.amount).sum(),
                class,
                methods,
            }
        })
        .collect();
    classes.sort_by(|a, b| b.amount.cmp(&a.amount));
    unknown.sort_by(|a, b| b.amount.cmp(&a.amount));

    let grouped: u64 = groups.iter().map(|g| g.amount as u64).sum();

    debug!(
        "Report for {} {}: {} classes, {} unknown groups, {} ungrouped",
        bundle_identifier,
        affected_version,
        classes.len(),
        unknown.len(),
        ungrouped
    );

    GroupReport {
        version: SCHEMA_VERSION.to_string(),
        bundle_identifier: bundle_identifier.to_string(),
        affected_version: affected_version.to_string(),
        total_crashes: grouped + ungrouped as u64,
        ungrouped,
        classes,
        unknown,
        generated_at: Utc::now().to_rfc3339(),
    }
}
