//! Relationship search over the metadata forest.
//!
//! The resolver does not recurse over live handles. It first flattens the
//! forest into an id-indexed adjacency index (children per parent, parent
//! per id, type per id) with a visited guard, then runs three independent
//! traversals over that index: downstream (matching descendants, any
//! depth), upstream (nearest matching ancestor) and sideways (matching
//! siblings, walking ancestors until some level has one). They are tried
//! in that priority order.

use std::collections::{HashMap, HashSet};

use ndx_error::Result;

use crate::entity::{Entity, Named};
use crate::file::NdxFile;
use crate::section::Section;

/// Id-indexed adjacency view of the whole metadata forest.
struct SectionIndex {
    /// Parent id per section id; absent for forest roots.
    parent: HashMap<String, String>,
    /// Child ids per section id, in creation order.
    children: HashMap<String, Vec<String>>,
    /// Type tag per section id.
    types: HashMap<String, String>,
    /// Live handle per section id, for materializing results.
    handles: HashMap<String, Section>,
}

impl SectionIndex {
    fn build(file: &NdxFile) -> Result<Self> {
        let mut index = Self {
            parent: HashMap::new(),
            children: HashMap::new(),
            types: HashMap::new(),
            handles: HashMap::new(),
        };
        let mut visited = HashSet::new();
        let mut stack: Vec<(Option<String>, Section)> = file
            .sections()?
            .into_iter()
            .rev()
            .map(|s| (None, s))
            .collect();
        while let Some((parent, section)) = stack.pop() {
            let id = section.id()?;
            if !visited.insert(id.clone()) {
                continue;
            }
            if let Some(parent) = parent {
                index
                    .children
                    .entry(parent.clone())
                    .or_default()
                    .push(id.clone());
                index.parent.insert(id.clone(), parent);
            }
            index.types.insert(id.clone(), section.type_name()?);
            for child in section.sections()?.into_iter().rev() {
                stack.push((Some(id.clone()), child));
            }
            index.handles.insert(id, section);
        }
        Ok(index)
    }

    fn matches(&self, id: &str, type_name: &str) -> bool {
        self.types.get(id).is_some_and(|t| t == type_name)
    }

    fn children_of(&self, id: &str) -> &[String] {
        self.children.get(id).map_or(&[], Vec::as_slice)
    }

    /// Matching descendants of `root`, pre-order, excluding `root` itself.
    /// A `max_depth` of 0 means unbounded.
    fn downstream(&self, root: &str, type_name: &str, max_depth: usize) -> Vec<String> {
        let mut out = Vec::new();
        self.downstream_into(root, type_name, 1, max_depth, &mut out);
        out
    }

    fn downstream_into(
        &self,
        node: &str,
        type_name: &str,
        level: usize,
        max_depth: usize,
        out: &mut Vec<String>,
    ) {
        if max_depth > 0 && level > max_depth {
            return;
        }
        for child in self.children_of(node) {
            if self.matches(child, type_name) {
                out.push(child.clone());
            }
            self.downstream_into(child, type_name, level + 1, max_depth, out);
        }
    }

    /// The nearest matching ancestor of `from`, if any.
    fn upstream(&self, from: &str, type_name: &str) -> Option<String> {
        let mut current = self.parent.get(from);
        while let Some(ancestor) = current {
            if self.matches(ancestor, type_name) {
                return Some(ancestor.clone());
            }
            current = self.parent.get(ancestor);
        }
        None
    }

    /// Matching siblings of `from`, walking up one ancestor level at a time
    /// until some level yields a non-empty result. Depth 1 only at each
    /// level; the probing node itself never matches.
    fn sideways(&self, from: &str, type_name: &str) -> Vec<String> {
        let mut current = from;
        while let Some(parent) = self.parent.get(current) {
            let matches: Vec<String> = self
                .children_of(parent)
                .iter()
                .filter(|id| id.as_str() != current && self.matches(id, type_name))
                .cloned()
                .collect();
            if !matches.is_empty() {
                return matches;
            }
            current = parent;
        }
        Vec::new()
    }

    fn materialize(&self, ids: Vec<String>) -> Vec<Section> {
        ids.into_iter()
            .filter_map(|id| self.handles.get(&id).cloned())
            .collect()
    }
}

/// First non-empty tier of downstream, upstream, sideways.
pub(crate) fn related_sections(section: &Section, type_name: &str) -> Result<Vec<Section>> {
    let index = SectionIndex::build(section.file())?;
    let own_id = section.id()?;

    let down = index.downstream(&own_id, type_name, 0);
    if !down.is_empty() {
        return Ok(index.materialize(down));
    }
    if let Some(ancestor) = index.upstream(&own_id, type_name) {
        return Ok(index.materialize(vec![ancestor]));
    }
    Ok(index.materialize(index.sideways(&own_id, type_name)))
}

/// Whether any tier would yield a result.
pub(crate) fn has_related_section(section: &Section, type_name: &str) -> Result<bool> {
    let index = SectionIndex::build(section.file())?;
    let own_id = section.id()?;
    Ok(!index.downstream(&own_id, type_name, 0).is_empty()
        || index.upstream(&own_id, type_name).is_some()
        || !index.sideways(&own_id, type_name).is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Context;

    /// R(type=A) -> C1(type=B) -> G(type=C), and C2(type=C) sibling of C1.
    fn fixture() -> (NdxFile, Section, Section, Section, Section) {
        let file =
            NdxFile::in_memory_with_context(Context::deterministic(5, 1_700_000_000)).unwrap();
        let r = file.create_section("R", "A").unwrap();
        let c1 = r.add_section("C1", "B").unwrap();
        let g = c1.add_section("G", "C").unwrap();
        let c2 = r.add_section("C2", "C").unwrap();
        (file, r, c1, g, c2)
    }

    fn ids(sections: &[Section]) -> Vec<String> {
        sections.iter().map(|s| s.id().unwrap()).collect()
    }

    #[test]
    fn index_captures_the_forest_shape() {
        let (file, r, c1, g, c2) = fixture();
        let index = SectionIndex::build(&file).unwrap();

        let r_id = r.id().unwrap();
        assert_eq!(index.parent.get(&r_id), None);
        assert_eq!(index.parent.get(&g.id().unwrap()), Some(&c1.id().unwrap()));
        assert_eq!(
            index.children_of(&r_id),
            &[c1.id().unwrap(), c2.id().unwrap()]
        );
        assert_eq!(index.types.get(&c2.id().unwrap()).unwrap(), "C");
    }

    #[test]
    fn downstream_respects_max_depth() {
        let (file, r, _c1, g, c2) = fixture();
        let index = SectionIndex::build(&file).unwrap();
        let r_id = r.id().unwrap();

        assert_eq!(
            index.downstream(&r_id, "C", 0),
            vec![g.id().unwrap(), c2.id().unwrap()]
        );
        // Depth 1 cuts the grandchild off.
        assert_eq!(index.downstream(&r_id, "C", 1), vec![c2.id().unwrap()]);
    }

    #[test]
    fn downstream_wins_and_collects_all_matching_descendants() {
        let (_file, r, _c1, g, c2) = fixture();
        let related = r.get_related_sections("C").unwrap();
        // Pre-order over R's subtree: G (under C1) before C2.
        assert_eq!(ids(&related), vec![g.id().unwrap(), c2.id().unwrap()]);
    }

    #[test]
    fn upstream_returns_nearest_matching_ancestor() {
        let (_file, r, c1, g, _c2) = fixture();
        let related = c1.get_related_sections("A").unwrap();
        assert_eq!(ids(&related), vec![r.id().unwrap()]);

        // From the grandchild the same ancestor is found two levels up.
        let related = g.get_related_sections("A").unwrap();
        assert_eq!(ids(&related), vec![r.id().unwrap()]);
    }

    #[test]
    fn downstream_beats_sideways_when_a_descendant_matches() {
        let (_file, _r, c1, g, _c2) = fixture();
        // C1 has both a type-C descendant (G) and a type-C sibling (C2);
        // the descendant tier wins.
        let related = c1.get_related_sections("C").unwrap();
        assert_eq!(ids(&related), vec![g.id().unwrap()]);
    }

    #[test]
    fn sideways_finds_siblings_when_nothing_below_or_above() {
        let (_file, r, _c1, _g, c2) = fixture();
        // A childless sibling of C1/C2: no descendants, no type-C
        // ancestor, so only the direct-sibling level can match.
        let d = r.add_section("D", "B").unwrap();
        let related = d.get_related_sections("C").unwrap();
        assert_eq!(ids(&related), vec![c2.id().unwrap()]);
    }

    #[test]
    fn sideways_recurses_to_ancestor_siblings() {
        let (_file, _r, _c1, g, c2) = fixture();
        // G has no descendants and no type-C ancestor; its direct sibling
        // level is empty, so the search climbs to C1's siblings.
        let related = g.get_related_sections("C").unwrap();
        assert_eq!(ids(&related), vec![c2.id().unwrap()]);
    }

    #[test]
    fn sideways_never_matches_the_probing_node() {
        let (_file, _r, _c1, _g, c2) = fixture();
        // C2 is itself type C: its only sibling is C1 (type B), and no
        // ancestor level has another type-C child, so nothing is related.
        let related = c2.get_related_sections("C").unwrap();
        assert!(related.is_empty());
    }

    #[test]
    fn no_match_anywhere_is_empty() {
        let (_file, r, _c1, _g, _c2) = fixture();
        assert!(r.get_related_sections("Z").unwrap().is_empty());
        assert!(!r.has_related_section("Z").unwrap());
    }

    #[test]
    fn has_related_matches_list_form() {
        let (_file, r, c1, g, c2) = fixture();
        for (section, type_name) in [
            (&r, "C"),
            (&c1, "A"),
            (&c1, "C"),
            (&g, "C"),
            (&g, "A"),
            (&c2, "B"),
        ] {
            assert!(section.has_related_section(type_name).unwrap());
            assert!(!section.get_related_sections(type_name).unwrap().is_empty());
        }
        assert!(!c2.has_related_section("C").unwrap());
    }
}
