use std::collections::HashSet;

use serde::Serialize;

/// Partition of the names validated on each platform during one cycle.
/// Buckets are disjoint, deduplicated and sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub both: Vec<String>,
    pub only_greenhouse: Vec<String>,
    pub only_lever: Vec<String>,
}

impl Classification {
    pub fn total(&self) -> usize {
        self.both.len() + self.only_greenhouse.len() + self.only_lever.len()
    }
}

/// Splits validated names into "on both", "Greenhouse only" and "Lever only".
pub fn classify(greenhouse: &[String], lever: &[String]) -> Classification {
    let greenhouse: HashSet<&str> = greenhouse.iter().map(String::as_str).collect();
    let lever: HashSet<&str> = lever.iter().map(String::as_str).collect();

    Classification {
        both: sorted(greenhouse.intersection(&lever)),
        only_greenhouse: sorted(greenhouse.difference(&lever)),
        only_lever: sorted(lever.difference(&greenhouse)),
    }
}

fn sorted<'a, 'b: 'a>(names: impl Iterator<Item = &'a &'b str>) -> Vec<String> {
    let mut out: Vec<String> = names.map(|s| s.to_string()).collect();
    out.sort();
    out
}
