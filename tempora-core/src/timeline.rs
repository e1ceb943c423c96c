//! Timeline layout engine.
//!
//! Turns the live entry set into positioned bar/point descriptors. The
//! engine performs no drawing: the rendering surface consumes the
//! descriptors and reports gestures back by entry id.

use std::collections::HashMap;

use crate::model::{AnnotationEntry, LabelType};
use crate::relations::RelationIndex;
use crate::value::{self, Value};

/// Horizontal band reserved for drawable coordinates, in percent.
const BAND_LOW: f64 = 5.0;
const BAND_SPAN: f64 = 90.0;

/// Separator between merged tooltip texts.
const MERGE_SEPARATOR: &str = " <...> ";

/// The single affine transform mapping a value into the 5-95% band of
/// a group whose extent is `[min, max]`.
pub fn position(min: f64, max: f64, v: f64) -> f64 {
    BAND_SPAN / (max - min) * (v - min) + BAND_LOW
}

/// Color bucket for an element; the rendering surface maps these to
/// actual styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorClass {
    /// Bounded narrative events (begin/continuation, irrealis bars).
    Narrative,
    /// The three unbounded label types.
    Unbounded,
    /// Auxiliary elements derived from a factuality qualifier.
    Factuality,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Bar,
    Point,
}

/// One positioned element of a group timeline.
#[derive(Debug, Clone)]
pub struct Element {
    pub kind: ElementKind,
    /// Left edge in percent of the timeline width.
    pub left: f64,
    /// Width in percent; zero for points.
    pub width: f64,
    pub color: ColorClass,
    pub tooltip: String,
    /// Start token index of the source entry.
    pub source_id: usize,
    /// Collision-avoidance flag: render this point on the raised row.
    pub raised: bool,
    /// Interior tick positions for fully unbounded bars.
    pub ticks: Vec<f64>,
    pub from_factuality: bool,
}

/// Layout of one group: its numeric extent and the positioned
/// elements, points first.
#[derive(Debug, Clone)]
pub struct GroupLayout {
    pub min: f64,
    pub max: f64,
    pub elements: Vec<Element>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerDirection {
    Before,
    After,
}

/// A nested-timeline marker placed on the main timeline at its group
/// key's own coordinate, carrying the group's recursively computed
/// layout for an on-demand popover.
#[derive(Debug, Clone)]
pub struct GroupMarker {
    pub key: String,
    pub left: f64,
    pub direction: MarkerDirection,
    pub color: String,
    pub raised: bool,
    pub layout: GroupLayout,
}

#[derive(Debug, Clone)]
pub struct TimelineLayout {
    pub main: GroupLayout,
    pub markers: Vec<GroupMarker>,
}

/// Flattened view of one entry as the layout engine sees it.
#[derive(Debug, Clone)]
pub struct Item {
    pub id: usize,
    pub label: LabelType,
    pub time_raw: String,
    pub numbers: Vec<f64>,
    pub factuality: String,
    pub fact_numbers: Vec<f64>,
    pub relative_raw: String,
    pub text: String,
    pub from_factuality: bool,
}

impl Item {
    pub fn from_entry(entry: &AnnotationEntry, text: String) -> Self {
        Self {
            id: entry.id,
            label: entry.label,
            time_raw: entry.time.clone(),
            numbers: value::extract_numbers(&entry.time),
            factuality: entry.factuality.clone(),
            fact_numbers: value::extract_numbers(&entry.factuality),
            relative_raw: entry.relative.clone(),
            text,
            from_factuality: false,
        }
    }

    /// A bounded entry whose value collapses to a single coordinate is
    /// drawn as a point; everything else is a bar.
    fn is_point(&self) -> bool {
        matches!(self.label, LabelType::Begin | LabelType::Continuation)
            && (self.numbers.len() == 1
                || (self.numbers.len() == 2 && self.numbers[0] == self.numbers[1]))
    }

    fn tooltip_head(&self) -> String {
        if self.from_factuality {
            format!("[Factuality] {} {}", self.factuality, self.text)
        } else {
            format!(
                "{} {} {} {}",
                self.label.glyph(),
                self.time_raw,
                self.factuality,
                self.text
            )
        }
    }

    fn has_marked_time(&self) -> bool {
        self.time_raw
            .chars()
            .any(|c| "!@#$%^&*".contains(c))
    }

    /// Auxiliary element spawned by a numeric factuality qualifier.
    fn factuality_item(&self) -> Option<Item> {
        if self.from_factuality || self.factuality.is_empty() || self.fact_numbers.is_empty() {
            return None;
        }
        Some(Item {
            id: self.id,
            label: LabelType::Begin,
            time_raw: self.time_raw.clone(),
            numbers: self.fact_numbers.clone(),
            factuality: self.factuality.clone(),
            fact_numbers: Vec::new(),
            relative_raw: self.relative_raw.clone(),
            text: self.text.clone(),
            from_factuality: true,
        })
    }
}

/// Two elements in the same list merge into one when they repeat the
/// same annotation on different tokens: identical label, identical
/// marker-suffixed time value, identical factuality.
fn merges(a: &Item, b: &Item) -> bool {
    (a.label == b.label
        && a.has_marked_time()
        && a.time_raw == b.time_raw
        && a.factuality == b.factuality)
        || (a.from_factuality
            && b.from_factuality
            && a.label == b.label
            && a.factuality == b.factuality)
}

/// Deduplicate a point or bar list: the first item of each merge group
/// survives with the other covered texts folded into its tooltip.
fn dedup(items: &[Item]) -> Vec<(Item, String)> {
    let mut kept: Vec<(Item, String)> = Vec::new();
    let mut skipped = vec![false; items.len()];
    for i in 0..items.len() {
        if skipped[i] {
            continue;
        }
        let mut tooltip = items[i].tooltip_head();
        for j in (i + 1)..items.len() {
            if !skipped[j] && merges(&items[i], &items[j]) {
                skipped[j] = true;
                tooltip.push_str(MERGE_SEPARATOR);
                tooltip.push_str(&items[j].text);
            }
        }
        kept.push((items[i].clone(), tooltip));
    }
    kept
}

/// Lay out one group of items.
pub fn layout_group(items: &[Item]) -> GroupLayout {
    let mut points: Vec<Item> = Vec::new();
    let mut bars: Vec<Item> = Vec::new();
    for item in items {
        if item.is_point() {
            points.push(item.clone());
        } else {
            bars.push(item.clone());
        }
    }

    // Numeric extent over every value in the group, factuality
    // qualifiers included.
    let mut all: Vec<f64> = Vec::new();
    for item in points.iter().chain(bars.iter()) {
        all.extend(&item.numbers);
        all.extend(&item.fact_numbers);
    }
    let (min, mut max) = match all
        .iter()
        .fold(None::<(f64, f64)>, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        }) {
        Some(extent) => extent,
        None => (0.0, 1.0),
    };
    if min == max {
        max = min + 1.0;
    }

    // A numeric factuality qualifier adds its own element: a pair of
    // numbers becomes a bar, a single number a point.
    let aux: Vec<Item> = points
        .iter()
        .chain(bars.iter())
        .filter_map(|item| item.factuality_item())
        .collect();
    for item in aux {
        if item.numbers.len() > 1 {
            bars.push(item);
        } else {
            points.push(item);
        }
    }

    let mut elements = Vec::new();

    // Points first, with the collision-avoidance stagger: consecutive
    // points landing on the same coordinate alternate rows.
    let mut prev: Option<(f64, bool)> = None;
    for (item, tooltip) in dedup(&points) {
        let v = match item.numbers.first() {
            Some(&v) => v,
            None => continue,
        };
        let raised = match prev {
            Some((pv, praised)) if pv == v => !praised,
            _ => false,
        };
        prev = Some((v, raised));
        elements.push(Element {
            kind: ElementKind::Point,
            left: position(min, max, v),
            width: 0.0,
            color: if item.from_factuality {
                ColorClass::Factuality
            } else {
                ColorClass::Narrative
            },
            tooltip,
            source_id: item.id,
            raised,
            ticks: Vec::new(),
            from_factuality: item.from_factuality,
        });
    }

    for (item, tooltip) in dedup(&bars) {
        let mut ticks = Vec::new();
        let geometry = match item.label {
            LabelType::Begin | LabelType::Continuation => match item.numbers.as_slice() {
                [] => None,
                [a] => Some((position(min, max, *a), position(min, max, *a))),
                [a, b, ..] => Some((position(min, max, *a), position(min, max, *b))),
            },
            LabelType::UnboundedBoth => {
                ticks = item
                    .numbers
                    .iter()
                    .map(|&v| position(min, max, v))
                    .collect();
                Some((0.0, 100.0))
            }
            LabelType::UnboundedRight => item
                .numbers
                .first()
                .map(|&a| (position(min, max, a), 100.0)),
            LabelType::UnboundedLeft => item
                .numbers
                .last()
                .map(|&b| (0.0, position(min, max, b))),
            // An irrealis bar is positioned by its branch value's own
            // numeric pair; without one it contributes nothing.
            LabelType::Irrealis => match value::parse_relative(&item.relative_raw).value {
                Value::Range(a, b) => Some((position(min, max, a), position(min, max, b))),
                _ => None,
            },
            LabelType::RelativeAfter | LabelType::RelativeBefore => None,
        };
        let (left, right) = match geometry {
            Some(g) => g,
            None => continue,
        };
        elements.push(Element {
            kind: ElementKind::Bar,
            left,
            width: right - left,
            color: if item.from_factuality {
                ColorClass::Factuality
            } else if item.label.is_unbounded() {
                ColorClass::Unbounded
            } else {
                ColorClass::Narrative
            },
            tooltip,
            source_id: item.id,
            raised: false,
            ticks,
            from_factuality: item.from_factuality,
        });
    }

    GroupLayout { min, max, elements }
}

/// Lay out the whole document: the main timeline plus one marker per
/// nested group, in first-seen group order.
pub fn layout_timeline(items: &[Item], index: &RelationIndex) -> TimelineLayout {
    let mut grouped: HashMap<&str, Vec<Item>> = HashMap::new();
    for item in items {
        grouped
            .entry(item.relative_raw.as_str())
            .or_default()
            .push(item.clone());
    }

    let main = layout_group(grouped.get("").map(Vec::as_slice).unwrap_or(&[]));

    let mut markers = Vec::new();
    let mut prev: Option<(f64, bool)> = None;
    for key in index.group_order.iter().filter(|k| !k.is_empty()) {
        let group_items = match grouped.get(key.as_str()) {
            Some(items) => items,
            None => continue,
        };
        let coord = match value::parse_relative(key).value.first() {
            Some(v) => v.clamp(main.min, main.max),
            None => continue,
        };
        let raised = match prev {
            Some((pv, praised)) if pv == coord => !praised,
            _ => false,
        };
        prev = Some((coord, raised));
        markers.push(GroupMarker {
            key: key.clone(),
            left: position(main.min, main.max, coord),
            direction: if key.contains('<') {
                MarkerDirection::Before
            } else {
                MarkerDirection::After
            },
            color: index.color_of(key).unwrap_or_default().to_string(),
            raised,
            layout: layout_group(group_items),
        });
    }

    TimelineLayout { main, markers }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TokenSpan;
    use crate::relations;

    fn item(id: usize, label: LabelType, time: &str, relative: &str, fact: &str, text: &str) -> Item {
        let mut entry = AnnotationEntry::new(TokenSpan::new(id, id), label);
        entry.time = time.to_string();
        entry.relative = relative.to_string();
        entry.factuality = fact.to_string();
        Item::from_entry(&entry, text.to_string())
    }

    #[test]
    fn test_position_mapping_monotonic_in_band() {
        let (min, max) = (1.0, 9.0);
        let values = [1.0, 2.5, 4.0, 9.0];
        let mut last = f64::MIN;
        for v in values {
            let p = position(min, max, v);
            assert!(p >= 5.0 && p <= 95.0, "{} out of band", p);
            assert!(p >= last);
            last = p;
        }
        assert_eq!(position(min, max, min), 5.0);
        assert_eq!(position(min, max, max), 95.0);
    }

    #[test]
    fn test_degenerate_extent_bumps_max() {
        let layout = layout_group(&[item(0, LabelType::Begin, "3", "", "", "x")]);
        assert_eq!(layout.min, 3.0);
        assert_eq!(layout.max, 4.0);
        assert_eq!(layout.elements.len(), 1);
        assert_eq!(layout.elements[0].left, 5.0);
    }

    #[test]
    fn test_empty_group_has_unit_extent() {
        let layout = layout_group(&[]);
        assert_eq!((layout.min, layout.max), (0.0, 1.0));
        assert!(layout.elements.is_empty());
    }

    #[test]
    fn test_point_vs_bar_classification() {
        let layout = layout_group(&[
            item(0, LabelType::Begin, "1", "", "", "a"),
            item(1, LabelType::Begin, "2:2", "", "", "b"),
            item(2, LabelType::Begin, "1:3", "", "", "c"),
        ]);
        let points: Vec<_> = layout
            .elements
            .iter()
            .filter(|e| e.kind == ElementKind::Point)
            .collect();
        let bars: Vec<_> = layout
            .elements
            .iter()
            .filter(|e| e.kind == ElementKind::Bar)
            .collect();
        // A collapsed range counts as a point.
        assert_eq!(points.len(), 2);
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].left, 5.0);
        assert_eq!(bars[0].width, 90.0);
    }

    #[test]
    fn test_unbounded_geometry() {
        let layout = layout_group(&[
            item(0, LabelType::Begin, "1:4", "", "", "a"),
            item(1, LabelType::UnboundedBoth, "2:3", "", "", "b"),
            item(2, LabelType::UnboundedRight, "2", "", "", "c"),
            item(3, LabelType::UnboundedLeft, "1:3", "", "", "d"),
        ]);
        let bars: Vec<_> = layout
            .elements
            .iter()
            .filter(|e| e.kind == ElementKind::Bar)
            .collect();
        assert_eq!(bars.len(), 4);
        // Fully open: the whole strip, with interior ticks.
        let both = bars.iter().find(|b| b.source_id == 1).unwrap();
        assert_eq!((both.left, both.width), (0.0, 100.0));
        assert_eq!(both.ticks.len(), 2);
        // Open right: runs to 100.
        let right = bars.iter().find(|b| b.source_id == 2).unwrap();
        assert_eq!(right.left, position(1.0, 4.0, 2.0));
        assert_eq!(right.left + right.width, 100.0);
        // Open left: starts at 0 and ends at its last value.
        let left = bars.iter().find(|b| b.source_id == 3).unwrap();
        assert_eq!(left.left, 0.0);
        assert_eq!(left.width, position(1.0, 4.0, 3.0));
    }

    #[test]
    fn test_irrealis_uses_branch_pair_or_nothing() {
        let layout = layout_group(&[
            item(0, LabelType::Begin, "1:5", "", "", "a"),
            item(1, LabelType::Irrealis, ":", "2:3", "", "b"),
            item(2, LabelType::Irrealis, ":", "", "", "c"),
        ]);
        let bars: Vec<_> = layout
            .elements
            .iter()
            .filter(|e| e.kind == ElementKind::Bar)
            .collect();
        // The branchless irrealis entry contributes nothing.
        assert_eq!(bars.len(), 2);
        let irr = bars.iter().find(|b| b.source_id == 1).unwrap();
        assert_eq!(irr.left, position(1.0, 5.0, 2.0));
    }

    #[test]
    fn test_dedup_merges_suffixed_repeats() {
        let layout = layout_group(&[
            item(0, LabelType::Begin, "2!", "", "", "first words"),
            item(4, LabelType::Begin, "2!", "", "", "second words"),
            item(8, LabelType::Begin, "2", "", "", "unsuffixed"),
        ]);
        let points: Vec<_> = layout
            .elements
            .iter()
            .filter(|e| e.kind == ElementKind::Point)
            .collect();
        // The two suffixed repeats merge; the plain one stays separate.
        assert_eq!(points.len(), 2);
        let merged = points.iter().find(|p| p.source_id == 0).unwrap();
        assert!(merged.tooltip.contains("first words"));
        assert!(merged.tooltip.contains(" <...> second words"));
    }

    #[test]
    fn test_point_collision_stagger() {
        let layout = layout_group(&[
            item(0, LabelType::Begin, "2", "", "", "a"),
            item(1, LabelType::Begin, "2", "", "", "b"),
            item(2, LabelType::Begin, "2", "", "", "c"),
            item(3, LabelType::Begin, "3", "", "", "d"),
        ]);
        let raised: Vec<bool> = layout
            .elements
            .iter()
            .filter(|e| e.kind == ElementKind::Point)
            .map(|e| e.raised)
            .collect();
        assert_eq!(raised, vec![false, true, false, false]);
    }

    #[test]
    fn test_factuality_qualifier_spawns_aux_elements() {
        let layout = layout_group(&[
            item(0, LabelType::Begin, "1:4", "", "m2", "a"),
            item(1, LabelType::Begin, "2:3", "", "1:3", "b"),
        ]);
        let aux: Vec<_> = layout
            .elements
            .iter()
            .filter(|e| e.from_factuality)
            .collect();
        assert_eq!(aux.len(), 2);
        let point = aux.iter().find(|e| e.kind == ElementKind::Point).unwrap();
        assert_eq!(point.color, ColorClass::Factuality);
        assert_eq!(point.left, position(1.0, 4.0, 2.0));
        let bar = aux.iter().find(|e| e.kind == ElementKind::Bar).unwrap();
        assert!(bar.tooltip.starts_with("[Factuality]"));
    }

    #[test]
    fn test_nested_groups_get_markers() {
        let items = vec![
            item(0, LabelType::Begin, "1", "", "", "a"),
            item(2, LabelType::Begin, "4", "", "", "b"),
            item(4, LabelType::Begin, "1", "2>", "", "c"),
            item(6, LabelType::Begin, "2", "<1", "", "d"),
        ];
        let entries_like: Vec<&str> = items.iter().map(|i| i.relative_raw.as_str()).collect();
        let (group_order, group_colors) = relations::group_assignment(entries_like);
        let index = RelationIndex {
            group_order,
            group_colors,
            ..Default::default()
        };
        let layout = layout_timeline(&items, &index);
        assert_eq!(layout.main.elements.len(), 2);
        assert_eq!(layout.markers.len(), 2);

        let after = &layout.markers[0];
        assert_eq!(after.key, "2>");
        assert_eq!(after.direction, MarkerDirection::After);
        assert_eq!(after.left, position(1.0, 4.0, 2.0));
        assert_eq!(after.layout.elements.len(), 1);
        assert_eq!(after.color, relations::GROUP_PALETTE[0]);

        let before = &layout.markers[1];
        assert_eq!(before.direction, MarkerDirection::Before);
        // Marker coordinates clamp to the main extent.
        assert_eq!(before.left, position(1.0, 4.0, 1.0));
    }
}
