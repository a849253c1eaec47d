// file: src/detection/anomaly.rs
// description: duplicate-name and duplicate-content detection over an inventory
// reference: https://docs.rs/regex

use crate::config::AnomalyConfig;
use crate::error::{MonitorError, Result};
use crate::models::{
    AnomalyReport, DuplicateContentGroup, DuplicateNameGroup, FileRecord, FileVersion,
    IdenticalFile,
};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

lazy_static! {
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").expect("WHITESPACE_RUN regex is valid");
}

/// Maps file names to the logical document they are a version of.
#[derive(Debug, Clone)]
pub struct NamePolicy {
    patterns: Vec<Regex>,
    case_insensitive: bool,
}

impl NamePolicy {
    pub fn new(patterns: &[String], case_insensitive: bool) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| {
                    MonitorError::Config(format!("invalid version suffix pattern {:?}: {}", p, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            patterns,
            case_insensitive,
        })
    }

    pub fn from_config(config: &AnomalyConfig) -> Result<Self> {
        Self::new(&config.version_suffix_patterns, config.case_insensitive)
    }

    pub fn normalize(&self, name: &str) -> String {
        let mut normalized = name.to_string();
        for pattern in &self.patterns {
            normalized = pattern.replace_all(&normalized, "").into_owned();
        }

        let normalized = WHITESPACE_RUN.replace_all(normalized.trim(), " ").into_owned();

        if self.case_insensitive {
            normalized.to_lowercase()
        } else {
            normalized
        }
    }
}

pub struct AnomalyDetector {
    policy: NamePolicy,
}

impl AnomalyDetector {
    pub fn new(policy: NamePolicy) -> Self {
        Self { policy }
    }

    pub fn from_config(config: &AnomalyConfig) -> Result<Self> {
        Ok(Self::new(NamePolicy::from_config(config)?))
    }

    pub fn policy(&self) -> &NamePolicy {
        &self.policy
    }

    pub fn detect(&self, inventory: &[FileRecord]) -> AnomalyReport {
        let by_name = group_in_order(inventory.iter(), |record| {
            Some(self.policy.normalize(&record.name))
        });
        let by_fingerprint = group_in_order(inventory.iter(), |record| {
            record
                .has_readable_fingerprint()
                .then(|| record.fingerprint.clone())
        });

        let duplicate_by_name = by_name
            .into_iter()
            .filter(|(_, members)| members.len() > 1)
            .map(|(normalized_name, members)| name_group(normalized_name, members))
            .collect();

        let duplicate_by_fingerprint = by_fingerprint
            .into_iter()
            .filter(|(_, members)| members.len() > 1)
            .map(|(fingerprint, members)| DuplicateContentGroup {
                fingerprint,
                count: members.len(),
                files: members
                    .into_iter()
                    .map(|record| IdenticalFile {
                        name: record.name.clone(),
                        path: record.path.clone(),
                        link: record.link.clone(),
                        modified_at: record.modified_at,
                        size_kb: record.size_kb,
                    })
                    .collect(),
            })
            .collect();

        AnomalyReport::new(duplicate_by_name, duplicate_by_fingerprint, inventory.len())
    }
}

/// Groups by key, keeping groups in order of first appearance.
fn group_in_order<'a, I, F>(records: I, key_of: F) -> Vec<(String, Vec<&'a FileRecord>)>
where
    I: Iterator<Item = &'a FileRecord>,
    F: Fn(&FileRecord) -> Option<String>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<&'a FileRecord>)> = Vec::new();

    for record in records {
        let Some(key) = key_of(record) else {
            continue;
        };

        match index.get(&key) {
            Some(&position) => groups[position].1.push(record),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push((key, vec![record]));
            }
        }
    }

    groups
}

fn name_group(normalized_name: String, mut members: Vec<&FileRecord>) -> DuplicateNameGroup {
    // stable sort keeps inventory order between equal timestamps
    members.sort_by(|a, b| b.modified_at.cmp(&a.modified_at));

    let versions = members
        .iter()
        .enumerate()
        .map(|(position, record)| FileVersion {
            name: record.name.clone(),
            file_type: record.file_type.clone(),
            path: record.path.clone(),
            link: record.link.clone(),
            modified_at: record.modified_at,
            size_kb: record.size_kb,
            state: record.state,
            is_current_version: position == 0,
        })
        .collect();

    DuplicateNameGroup {
        normalized_name,
        count: members.len(),
        versions,
    }
}
