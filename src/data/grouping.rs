//! Parent/child grouping of monitored URLs.
//!
//! Targets are grouped by hierarchical URL prefix: `http://x.com/a` is a
//! child of `http://x.com`. Grouping is recomputed from the flat list on
//! every refresh.

use serde::{Deserialize, Serialize};

/// One monitored URL as listed by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorTarget {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub interval_seconds: u32,
    #[serde(default)]
    pub is_active: bool,
}

/// A top-level target and the targets nested under its URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetGroup {
    pub parent: MonitorTarget,
    pub children: Vec<MonitorTarget>,
}

impl TargetGroup {
    /// Ids of the parent and all children, parent first.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.parent.id.as_str()).chain(self.children.iter().map(|c| c.id.as_str()))
    }
}

/// Partition `targets` into groups.
///
/// Shorter URLs are visited first, so each target is claimed by the shortest
/// unclaimed URL it extends with a `/`. Targets of equal length keep their
/// input order. Every target appears in exactly one group.
pub fn group_targets(targets: &[MonitorTarget]) -> Vec<TargetGroup> {
    let mut sorted: Vec<&MonitorTarget> = targets.iter().collect();
    sorted.sort_by_key(|t| t.url.len());

    let mut claimed = vec![false; sorted.len()];
    let mut groups = Vec::new();

    for (i, parent) in sorted.iter().enumerate() {
        if claimed[i] {
            continue;
        }
        claimed[i] = true;

        let prefix = format!("{}/", parent.url);
        let mut children = Vec::new();
        for (j, candidate) in sorted.iter().enumerate() {
            if j == i || claimed[j] {
                continue;
            }
            if candidate.url.starts_with(&prefix) {
                claimed[j] = true;
                children.push((*candidate).clone());
            }
        }

        groups.push(TargetGroup {
            parent: (*parent).clone(),
            children,
        });
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(id: &str, url: &str) -> MonitorTarget {
        MonitorTarget {
            id: id.to_string(),
            url: url.to_string(),
            interval_seconds: 5,
            is_active: true,
        }
    }

    fn ids(group: &TargetGroup) -> Vec<&str> {
        group.ids().collect()
    }

    #[test]
    fn groups_nested_paths_under_shortest_parent() {
        let targets = vec![
            target("C", "http://x.com/a/b"),
            target("D", "http://y.com"),
            target("A", "http://x.com"),
            target("B", "http://x.com/a"),
        ];
        let groups = group_targets(&targets);

        assert_eq!(groups.len(), 2);
        assert_eq!(ids(&groups[0]), vec!["A", "B", "C"]);
        assert_eq!(ids(&groups[1]), vec!["D"]);
    }

    #[test]
    fn bare_prefix_without_slash_is_not_a_child() {
        let targets = vec![target("A", "http://x.com"), target("B", "http://x.com.evil")];
        let groups = group_targets(&targets);
        assert_eq!(groups.len(), 2);
        assert!(groups.iter().all(|g| g.children.is_empty()));
    }

    #[test]
    fn duplicate_urls_stay_separate() {
        let targets = vec![target("A", "http://x.com"), target("B", "http://x.com")];
        let groups = group_targets(&targets);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].parent.id, "A");
    }

    #[test]
    fn every_target_lands_in_one_group() {
        let targets = vec![
            target("1", "https://api.io"),
            target("2", "https://api.io/v1"),
            target("3", "https://api.io/v1/users"),
            target("4", "https://cdn.io/x"),
            target("5", "https://cdn.io/x/y"),
            target("6", "https://other.io"),
        ];
        let groups = group_targets(&targets);
        let mut seen: Vec<&str> = groups.iter().flat_map(|g| g.ids()).collect();
        seen.sort_unstable();
        assert_eq!(seen, vec!["1", "2", "3", "4", "5", "6"]);
        assert_eq!(groups.len(), 3);
    }

    #[test]
    fn empty_list_has_no_groups() {
        assert!(group_targets(&[]).is_empty());
    }

    #[test]
    fn target_list_parses_api_field_names() {
        let json = r#"{"id":"m1","url":"http://x.com","intervalSeconds":30,"isActive":true}"#;
        let parsed: MonitorTarget = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.interval_seconds, 30);
        assert!(parsed.is_active);
    }
}
