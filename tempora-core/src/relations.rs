//! Coreference clusters and relative-value groupings derived from the
//! live entry set.

use std::collections::{BTreeMap, HashMap};

use crate::model::AnnotationEntry;
use crate::value;

/// Fixed palette cycled over distinct group keys, in first-seen order.
pub const GROUP_PALETTE: [&str; 6] = [
    "hsl(357, 37%, 42%)",
    "hsl(357, 43%, 57%)",
    "hsl(357, 83%, 74%)",
    "hsl(357, 28%, 54%)",
    "hsl(357, 35%, 69%)",
    "hsl(355, 31%, 41%)",
];

/// Groupings recomputed after every registry mutation.
#[derive(Debug, Clone, Default)]
pub struct RelationIndex {
    /// Event id -> the cluster key it belongs to (inverted coreference
    /// mapping).
    pub cluster_of: HashMap<usize, usize>,
    /// Non-representative cluster members, hidden from primary
    /// rendering but preserved through serialization.
    pub invisible: Vec<usize>,
    /// Distinct grouping keys in first-seen entry order; the main
    /// timeline key `""` always comes first.
    pub group_order: Vec<String>,
    /// Group key -> palette color. The main timeline has no color.
    pub group_colors: HashMap<String, String>,
}

impl RelationIndex {
    pub fn color_of(&self, key: &str) -> Option<&str> {
        self.group_colors.get(key).map(|s| s.as_str())
    }

    pub fn is_hidden(&self, id: usize) -> bool {
        self.invisible.contains(&id)
    }
}

/// Invert a coreference-cluster mapping: member id -> cluster key.
/// Cluster keys are stored as strings in the record format; keys that
/// do not parse as event ids are skipped.
pub fn invert_clusters(clusters: &BTreeMap<String, Vec<usize>>) -> HashMap<usize, usize> {
    let mut map = HashMap::new();
    for (key, members) in clusters {
        if let Ok(key) = key.parse::<usize>() {
            for &member in members {
                map.insert(member, key);
            }
        }
    }
    map
}

/// Event ids hidden by coreference: every cluster member except the
/// representative (the lowest id among the key and its members),
/// restricted to ids that are actual events.
pub fn invisible_events(
    clusters: &BTreeMap<String, Vec<usize>>,
    event_ids: &[usize],
) -> Vec<usize> {
    let mut hidden = Vec::new();
    for (key, members) in clusters {
        let key = match key.parse::<usize>() {
            Ok(k) => k,
            Err(_) => continue,
        };
        let representative = members.iter().copied().fold(key, usize::min);
        for &id in members.iter().chain(std::iter::once(&key)) {
            if id != representative && event_ids.contains(&id) && !hidden.contains(&id) {
                hidden.push(id);
            }
        }
    }
    hidden.sort_unstable();
    hidden
}

/// Deterministic grouping of entries by their relative-value raw
/// string. Returns the distinct keys in first-seen order (main group
/// `""` first, always present) and the per-key color assignment.
pub fn group_assignment(
    entries: impl IntoIterator<Item = impl AsRef<str>>,
) -> (Vec<String>, HashMap<String, String>) {
    let mut order = vec![String::new()];
    let mut colors = HashMap::from([(String::new(), String::new())]);
    let mut next_color = 0usize;
    for key in entries {
        let key = key.as_ref();
        if !colors.contains_key(key) {
            order.push(key.to_string());
            colors.insert(
                key.to_string(),
                GROUP_PALETTE[next_color % GROUP_PALETTE.len()].to_string(),
            );
            next_color += 1;
        }
    }
    (order, colors)
}

/// Normalize a coreference target field: the first number typed wins,
/// and pointing an event at itself clears the link.
pub fn normalize_coref(own_id: usize, raw: &str) -> String {
    match value::extract_numbers(raw).first() {
        Some(&n) => {
            let target = value::format_number(n);
            if target == own_id.to_string() {
                String::new()
            } else {
                target
            }
        }
        None => String::new(),
    }
}

/// Build the full index for the active document.
pub fn compute(
    clusters: &BTreeMap<String, Vec<usize>>,
    entries: &[&AnnotationEntry],
) -> RelationIndex {
    let cluster_of = invert_clusters(clusters);
    let event_ids: Vec<usize> = entries.iter().map(|e| e.id).collect();
    let invisible = invisible_events(clusters, &event_ids);
    let (group_order, group_colors) =
        group_assignment(entries.iter().map(|e| e.relative.as_str()));
    RelationIndex {
        cluster_of,
        invisible,
        group_order,
        group_colors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LabelType, TokenSpan};

    fn clusters(pairs: &[(&str, &[usize])]) -> BTreeMap<String, Vec<usize>> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_vec()))
            .collect()
    }

    #[test]
    fn test_invert_clusters() {
        let map = invert_clusters(&clusters(&[("2", &[2, 5]), ("9", &[11])]));
        assert_eq!(map.get(&5), Some(&2));
        assert_eq!(map.get(&2), Some(&2));
        assert_eq!(map.get(&11), Some(&9));
        assert_eq!(map.get(&9), None);
    }

    #[test]
    fn test_invisible_events_hides_non_representatives() {
        // Cluster {2: [2, 5]} keeps 2 visible and hides 5.
        let hidden = invisible_events(&clusters(&[("2", &[2, 5])]), &[2, 5, 8]);
        assert_eq!(hidden, vec![5]);
    }

    #[test]
    fn test_representative_is_minimum_member() {
        // The stored key loses to a smaller member id.
        let hidden = invisible_events(&clusters(&[("7", &[3, 7])]), &[3, 7]);
        assert_eq!(hidden, vec![7]);
    }

    #[test]
    fn test_group_assignment_first_seen_order() {
        let (order, colors) =
            group_assignment(["", "2>", "", "<1", "2>", "5"].iter().copied());
        assert_eq!(order, vec!["", "2>", "<1", "5"]);
        assert_eq!(colors[""], "");
        assert_eq!(colors["2>"], GROUP_PALETTE[0]);
        assert_eq!(colors["<1"], GROUP_PALETTE[1]);
        assert_eq!(colors["5"], GROUP_PALETTE[2]);
    }

    #[test]
    fn test_palette_cycles() {
        let keys: Vec<String> = (0..8).map(|i| format!("{}>", i)).collect();
        let (_, colors) = group_assignment(keys.iter().map(|s| s.as_str()));
        assert_eq!(colors["6>"], GROUP_PALETTE[0]);
        assert_eq!(colors["7>"], GROUP_PALETTE[1]);
    }

    #[test]
    fn test_normalize_coref() {
        assert_eq!(normalize_coref(4, "7"), "7");
        assert_eq!(normalize_coref(4, "event 7 maybe"), "7");
        // Self-reference clears the link.
        assert_eq!(normalize_coref(4, "4"), "");
        assert_eq!(normalize_coref(4, "none"), "");
    }

    #[test]
    fn test_compute_ties_it_together() {
        let mut a = crate::model::AnnotationEntry::new(TokenSpan::new(2, 2), LabelType::Begin);
        a.relative = "2>".to_string();
        let b = crate::model::AnnotationEntry::new(TokenSpan::new(5, 5), LabelType::Begin);
        let index = compute(&clusters(&[("2", &[2, 5])]), &[&a, &b]);
        assert!(index.is_hidden(5));
        assert!(!index.is_hidden(2));
        assert_eq!(index.group_order, vec!["", "2>"]);
        assert_eq!(index.color_of("2>"), Some(GROUP_PALETTE[0]));
    }
}
