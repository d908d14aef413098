//! Persistent spatial index mapping grid points to values.
//!
//! The structure is loosely based on a k-d tree: leaves hold direct entries
//! until they overflow, at which point they bisect their area down the middle
//! of its longer axis. Bisecting at the midpoint rather than a median is a
//! deliberate simplification; occupants tend to clump, so the tree is rarely
//! balanced, but the pruned queries stay correct either way.
//!
//! Updates copy only the path from the root to the affected leaf and share
//! every other subtree with the previous value, so taking a snapshot per
//! simulation step costs O(depth) rather than O(entries).

use std::rc::Rc;
use std::slice;

use shamble_core::{Area, Point};
use thiserror::Error;

/// Maximum number of direct entries a leaf holds before it splits. A split
/// node whose children shrink back to this total collapses into a leaf.
const LEAF_MAX: usize = 10;

/// Errors raised by strict tree accessors and constructors.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    /// A strict lookup or removal referenced an unoccupied point.
    #[error("no entry at {0}")]
    NotFound(Point),
    /// A build entry lay outside the declared tree area.
    #[error("point {0} lies outside the tree area")]
    OutOfArea(Point),
}

/// Persistent map from [`Point`] to `V` over a fixed [`Area`].
#[derive(Clone, Debug)]
pub struct SpaceTree<V> {
    area: Area,
    root: Rc<Node<V>>,
}

impl<V: Clone> SpaceTree<V> {
    /// Builds a tree over the given area containing the given entries.
    ///
    /// Fails with [`TreeError::OutOfArea`] if any entry's point falls outside
    /// the area.
    pub fn build(
        area: Area,
        entries: impl IntoIterator<Item = (Point, V)>,
    ) -> Result<Self, TreeError> {
        let mut tree = Self::empty(area);
        for (point, value) in entries {
            if !area.contains(point) {
                return Err(TreeError::OutOfArea(point));
            }
            tree = tree.set(point, value);
        }
        Ok(tree)
    }

    /// Creates an empty tree over the given area.
    #[must_use]
    pub fn empty(area: Area) -> Self {
        Self {
            area,
            root: Rc::new(Node::Leaf {
                area,
                entries: Vec::new(),
            }),
        }
    }

    /// Area the tree indexes.
    #[must_use]
    pub const fn area(&self) -> Area {
        self.area
    }

    /// Number of entries stored in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.root.len()
    }

    /// Reports whether the tree holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the value stored at the given point, if any.
    #[must_use]
    pub fn get(&self, point: Point) -> Option<&V> {
        self.root.get(point)
    }

    /// Reports whether the given point holds an entry.
    #[must_use]
    pub fn contains_point(&self, point: Point) -> bool {
        self.get(point).is_some()
    }

    /// Returns the value stored at the given point, failing when absent.
    pub fn require(&self, point: Point) -> Result<&V, TreeError> {
        self.get(point).ok_or(TreeError::NotFound(point))
    }

    /// Returns a new tree with the given value stored at the given point,
    /// replacing any prior entry there.
    ///
    /// The point must lie within the tree's area; the roster layer guards
    /// this before delegating here.
    #[must_use]
    pub fn set(&self, point: Point, value: V) -> Self {
        debug_assert!(self.area.contains(point), "set out of tree area");
        Self {
            area: self.area,
            root: self.root.with_entry(point, value),
        }
    }

    /// Returns a new tree with the entry at the given point removed.
    ///
    /// Fails with [`TreeError::NotFound`] when the point holds no entry.
    pub fn unset(&self, point: Point) -> Result<Self, TreeError> {
        Ok(Self {
            area: self.area,
            root: self.root.without_entry(point)?,
        })
    }

    /// Iterates over every entry, in no particular order.
    #[must_use]
    pub fn items(&self) -> Entries<'_, V> {
        Entries {
            stack: vec![self.root.as_ref()],
            pending: [].iter(),
        }
    }

    /// All entries whose point lies within the given area.
    ///
    /// Subtrees whose area does not intersect the query are pruned without
    /// descent.
    #[must_use]
    pub fn items_in(&self, area: &Area) -> Vec<(Point, &V)> {
        let mut found = Vec::new();
        self.root.collect_in(area, &mut found);
        found
    }

    /// Returns the entry nearest to `origin` by Euclidean distance for which
    /// the predicate holds, excluding an entry at `origin` itself.
    ///
    /// When several matching entries are equidistant, the one reached first
    /// by the traversal wins; the traversal is deterministic for a given
    /// tree shape but the choice is otherwise unspecified.
    #[must_use]
    pub fn nearest_to<F>(&self, origin: Point, predicate: F) -> Option<(Point, &V)>
    where
        F: Fn(&V) -> bool,
    {
        self.root.nearest_to(origin, &predicate, f64::INFINITY)
    }
}

impl<V: Clone + PartialEq> PartialEq for SpaceTree<V> {
    /// Content equality: two trees are equal when they index the same area
    /// and hold the same entries, regardless of node structure.
    fn eq(&self, other: &Self) -> bool {
        if self.area != other.area || self.len() != other.len() {
            return false;
        }
        let mut left: Vec<(Point, &V)> = self.items().collect();
        let mut right: Vec<(Point, &V)> = other.items().collect();
        left.sort_by_key(|(point, _)| *point);
        right.sort_by_key(|(point, _)| *point);
        left == right
    }
}

/// Iterator over every entry of a [`SpaceTree`].
#[derive(Debug)]
pub struct Entries<'a, V> {
    stack: Vec<&'a Node<V>>,
    pending: slice::Iter<'a, (Point, V)>,
}

impl<'a, V> Iterator for Entries<'a, V> {
    type Item = (Point, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((point, value)) = self.pending.next() {
                return Some((*point, value));
            }
            match self.stack.pop()? {
                Node::Leaf { entries, .. } => self.pending = entries.iter(),
                Node::Split { lower, upper, .. } => {
                    self.stack.push(lower);
                    self.stack.push(upper);
                }
            }
        }
    }
}

/// Half-plane test routing points to a split node's lower or upper child.
#[derive(Clone, Copy, Debug)]
enum Split {
    /// Lower child holds points with `x` strictly below the midpoint.
    Column(i32),
    /// Lower child holds points with `y` strictly below the midpoint.
    Row(i32),
}

impl Split {
    fn lower_side(self, point: Point) -> bool {
        match self {
            Split::Column(mid) => point.x() < mid,
            Split::Row(mid) => point.y() < mid,
        }
    }
}

#[derive(Debug)]
enum Node<V> {
    Leaf {
        area: Area,
        entries: Vec<(Point, V)>,
    },
    Split {
        area: Area,
        split: Split,
        lower: Rc<Node<V>>,
        upper: Rc<Node<V>>,
    },
}

impl<V: Clone> Node<V> {
    fn area(&self) -> Area {
        match self {
            Node::Leaf { area, .. } | Node::Split { area, .. } => *area,
        }
    }

    fn len(&self) -> usize {
        match self {
            Node::Leaf { entries, .. } => entries.len(),
            Node::Split { lower, upper, .. } => lower.len() + upper.len(),
        }
    }

    fn get(&self, point: Point) -> Option<&V> {
        match self {
            Node::Leaf { entries, .. } => entries
                .iter()
                .find(|(entry_point, _)| *entry_point == point)
                .map(|(_, value)| value),
            Node::Split {
                split,
                lower,
                upper,
                ..
            } => {
                if split.lower_side(point) {
                    lower.get(point)
                } else {
                    upper.get(point)
                }
            }
        }
    }

    fn with_entry(&self, point: Point, value: V) -> Rc<Node<V>> {
        match self {
            Node::Leaf { area, entries } => {
                if let Some(index) = entries.iter().position(|(p, _)| *p == point) {
                    let mut entries = entries.clone();
                    entries[index] = (point, value);
                    return Rc::new(Node::Leaf {
                        area: *area,
                        entries,
                    });
                }

                if entries.len() < LEAF_MAX {
                    let mut entries = entries.clone();
                    entries.push((point, value));
                    return Rc::new(Node::Leaf {
                        area: *area,
                        entries,
                    });
                }

                // Full leaf: bisect the longer axis and retry the insert.
                split_leaf(*area, entries).with_entry(point, value)
            }
            Node::Split {
                area,
                split,
                lower,
                upper,
            } => {
                if split.lower_side(point) {
                    Rc::new(Node::Split {
                        area: *area,
                        split: *split,
                        lower: lower.with_entry(point, value),
                        upper: Rc::clone(upper),
                    })
                } else {
                    Rc::new(Node::Split {
                        area: *area,
                        split: *split,
                        lower: Rc::clone(lower),
                        upper: upper.with_entry(point, value),
                    })
                }
            }
        }
    }

    fn without_entry(&self, point: Point) -> Result<Rc<Node<V>>, TreeError> {
        match self {
            Node::Leaf { area, entries } => {
                let index = entries
                    .iter()
                    .position(|(p, _)| *p == point)
                    .ok_or(TreeError::NotFound(point))?;
                let mut entries = entries.clone();
                let _ = entries.remove(index);
                Ok(Rc::new(Node::Leaf {
                    area: *area,
                    entries,
                }))
            }
            Node::Split {
                area,
                split,
                lower,
                upper,
            } => {
                let (lower, upper) = if split.lower_side(point) {
                    (lower.without_entry(point)?, Rc::clone(upper))
                } else {
                    (Rc::clone(lower), upper.without_entry(point)?)
                };

                if lower.len() + upper.len() <= LEAF_MAX {
                    let mut entries = Vec::with_capacity(lower.len() + upper.len());
                    lower.collect_all(&mut entries);
                    upper.collect_all(&mut entries);
                    Ok(Rc::new(Node::Leaf {
                        area: *area,
                        entries,
                    }))
                } else {
                    Ok(Rc::new(Node::Split {
                        area: *area,
                        split: *split,
                        lower,
                        upper,
                    }))
                }
            }
        }
    }

    fn collect_all(&self, out: &mut Vec<(Point, V)>) {
        match self {
            Node::Leaf { entries, .. } => out.extend(entries.iter().cloned()),
            Node::Split { lower, upper, .. } => {
                lower.collect_all(out);
                upper.collect_all(out);
            }
        }
    }

    fn collect_in<'a>(&'a self, query: &Area, out: &mut Vec<(Point, &'a V)>) {
        if self.area().intersect(query).is_empty() {
            return;
        }
        match self {
            Node::Leaf { entries, .. } => {
                for (point, value) in entries {
                    if query.contains(*point) {
                        out.push((*point, value));
                    }
                }
            }
            Node::Split { lower, upper, .. } => {
                lower.collect_in(query, out);
                upper.collect_in(query, out);
            }
        }
    }

    fn nearest_to<'a, F>(
        &'a self,
        origin: Point,
        predicate: &F,
        mut threshold: f64,
    ) -> Option<(Point, &'a V)>
    where
        F: Fn(&V) -> bool,
    {
        if self.area().distance_from(origin) > threshold {
            return None;
        }

        match self {
            Node::Leaf { entries, .. } => {
                let mut best = None;
                for (point, value) in entries {
                    if *point == origin || !predicate(value) {
                        continue;
                    }
                    let distance = (*point - origin).distance();
                    if distance < threshold {
                        threshold = distance;
                        best = Some((*point, value));
                    }
                }
                best
            }
            Node::Split {
                split,
                lower,
                upper,
                ..
            } => {
                // Descend the side holding the origin first so its result can
                // prune the sibling.
                let (first, second) = if split.lower_side(origin) {
                    (lower, upper)
                } else {
                    (upper, lower)
                };

                let mut best = None;
                for child in [first, second] {
                    if let Some((point, value)) = child.nearest_to(origin, predicate, threshold) {
                        threshold = (point - origin).distance();
                        best = Some((point, value));
                    }
                }
                best
            }
        }
    }
}

fn split_leaf<V: Clone>(area: Area, entries: &[(Point, V)]) -> Rc<Node<V>> {
    let (split, lower_area, upper_area) = if area.width() >= area.height() {
        let mid = (area.lower().x() + area.upper().x()).div_euclid(2);
        (
            Split::Column(mid),
            Area::new(area.lower(), Point::new(mid, area.upper().y())),
            Area::new(Point::new(mid, area.lower().y()), area.upper()),
        )
    } else {
        let mid = (area.lower().y() + area.upper().y()).div_euclid(2);
        (
            Split::Row(mid),
            Area::new(area.lower(), Point::new(area.upper().x(), mid)),
            Area::new(Point::new(area.lower().x(), mid), area.upper()),
        )
    };

    let (lower_entries, upper_entries): (Vec<_>, Vec<_>) = entries
        .iter()
        .cloned()
        .partition(|(point, _)| split.lower_side(*point));

    Rc::new(Node::Split {
        area,
        split,
        lower: Rc::new(Node::Leaf {
            area: lower_area,
            entries: lower_entries,
        }),
        upper: Rc::new(Node::Leaf {
            area: upper_area,
            entries: upper_entries,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area(width: i32, height: i32) -> Area {
        Area::new(Point::new(0, 0), Point::new(width, height))
    }

    // Deterministic point scatter for the larger property-style checks.
    fn scattered_points(area: Area, count: usize) -> Vec<Point> {
        let mut state: u64 = 0x9e37_79b9_7f4a_7c15;
        let mut points = Vec::new();
        while points.len() < count {
            state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
            let x = area.lower().x() + ((state >> 33) % area.width() as u64) as i32;
            state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
            let y = area.lower().y() + ((state >> 33) % area.height() as u64) as i32;
            let point = Point::new(x, y);
            if !points.contains(&point) {
                points.push(point);
            }
        }
        points
    }

    #[test]
    fn empty_tree_has_no_entries() {
        let tree: SpaceTree<u32> = SpaceTree::empty(area(10, 10));
        assert!(tree.is_empty());
        assert_eq!(tree.get(Point::new(3, 3)), None);
        assert_eq!(
            tree.require(Point::new(3, 3)),
            Err(TreeError::NotFound(Point::new(3, 3)))
        );
        assert_eq!(tree.nearest_to(Point::new(3, 3), |_| true), None);
    }

    #[test]
    fn build_rejects_out_of_area_entries() {
        let result = SpaceTree::build(area(4, 4), vec![(Point::new(4, 0), 1u32)]);
        assert_eq!(result.unwrap_err(), TreeError::OutOfArea(Point::new(4, 0)));
    }

    #[test]
    fn set_then_get_returns_value() {
        let tree = SpaceTree::empty(area(10, 10)).set(Point::new(2, 7), "a");
        assert_eq!(tree.get(Point::new(2, 7)), Some(&"a"));
        assert!(tree.contains_point(Point::new(2, 7)));
        assert_eq!(tree.get(Point::new(7, 2)), None);
    }

    #[test]
    fn set_replaces_existing_entry() {
        let tree = SpaceTree::empty(area(10, 10))
            .set(Point::new(1, 1), "old")
            .set(Point::new(1, 1), "new");
        assert_eq!(tree.get(Point::new(1, 1)), Some(&"new"));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn set_does_not_disturb_other_points() {
        let base = SpaceTree::build(
            area(20, 20),
            scattered_points(area(20, 20), 30)
                .into_iter()
                .map(|p| (p, p.x())),
        )
        .expect("build");

        let probe = Point::new(0, 0);
        let updated = base.set(probe, 99);
        for (point, value) in base.items() {
            if point != probe {
                assert_eq!(updated.get(point), Some(value));
            }
        }
        assert_eq!(updated.get(probe), Some(&99));
    }

    #[test]
    fn unset_restores_previous_content() {
        let base = SpaceTree::build(
            area(16, 16),
            scattered_points(area(16, 16), 25)
                .into_iter()
                .map(|p| (p, ())),
        )
        .expect("build");

        let probe = Point::new(15, 15);
        assert!(!base.contains_point(probe));
        let round_tripped = base.set(probe, ()).unset(probe).expect("unset");
        assert_eq!(round_tripped, base);
    }

    #[test]
    fn unset_missing_point_fails() {
        let tree: SpaceTree<u32> = SpaceTree::empty(area(5, 5));
        assert_eq!(
            tree.unset(Point::new(1, 1)).unwrap_err(),
            TreeError::NotFound(Point::new(1, 1))
        );
    }

    #[test]
    fn overflowing_leaf_splits_and_keeps_every_entry() {
        let points = scattered_points(area(32, 32), 40);
        let mut tree = SpaceTree::empty(area(32, 32));
        for (index, point) in points.iter().enumerate() {
            tree = tree.set(*point, index);
        }

        assert_eq!(tree.len(), points.len());
        for (index, point) in points.iter().enumerate() {
            assert_eq!(tree.get(*point), Some(&index));
        }
    }

    #[test]
    fn items_emits_each_entry_exactly_once() {
        let points = scattered_points(area(32, 32), 35);
        let tree =
            SpaceTree::build(area(32, 32), points.iter().map(|p| (*p, ()))).expect("build");

        let mut seen: Vec<Point> = tree.items().map(|(point, _)| point).collect();
        seen.sort();
        let mut expected = points.clone();
        expected.sort();
        assert_eq!(seen, expected);
    }

    #[test]
    fn items_in_matches_linear_scan() {
        let points = scattered_points(area(40, 40), 60);
        let tree =
            SpaceTree::build(area(40, 40), points.iter().map(|p| (*p, ()))).expect("build");
        let query = Area::new(Point::new(5, 10), Point::new(25, 30));

        let mut found: Vec<Point> = tree.items_in(&query).into_iter().map(|(p, _)| p).collect();
        found.sort();
        let mut expected: Vec<Point> = points
            .iter()
            .copied()
            .filter(|p| query.contains(*p))
            .collect();
        expected.sort();
        assert_eq!(found, expected);
    }

    #[test]
    fn nearest_matches_linear_scan() {
        let points = scattered_points(area(48, 48), 80);
        let tree =
            SpaceTree::build(area(48, 48), points.iter().map(|p| (*p, ()))).expect("build");

        for origin in scattered_points(area(48, 48), 20) {
            let (found, _) = tree
                .nearest_to(origin, |_| true)
                .expect("tree has entries away from any origin");
            let best = points
                .iter()
                .filter(|p| **p != origin)
                .map(|p| (*p - origin).distance())
                .fold(f64::INFINITY, f64::min);
            assert_eq!((found - origin).distance(), best);
        }
    }

    #[test]
    fn nearest_excludes_the_origin_itself() {
        let origin = Point::new(3, 3);
        let tree = SpaceTree::build(area(8, 8), vec![(origin, ())]).expect("build");
        assert_eq!(tree.nearest_to(origin, |_| true), None);
    }

    #[test]
    fn nearest_honours_the_predicate() {
        let tree = SpaceTree::build(
            area(10, 10),
            vec![(Point::new(1, 0), "near"), (Point::new(5, 0), "far")],
        )
        .expect("build");

        let (point, value) = tree
            .nearest_to(Point::new(0, 0), |value| *value == "far")
            .expect("predicate match exists");
        assert_eq!(point, Point::new(5, 0));
        assert_eq!(*value, "far");
    }

    #[test]
    fn removal_collapses_split_nodes() {
        let points = scattered_points(area(32, 32), 12);
        let mut tree =
            SpaceTree::build(area(32, 32), points.iter().map(|p| (*p, ()))).expect("build");

        // Down to two entries; the tree must still answer queries correctly
        // whatever its internal shape.
        for point in &points[2..] {
            tree = tree.unset(*point).expect("unset");
        }
        assert_eq!(tree.len(), 2);
        assert!(tree.contains_point(points[0]));
        assert!(tree.contains_point(points[1]));
        let expected =
            SpaceTree::build(area(32, 32), points[..2].iter().map(|p| (*p, ()))).expect("build");
        assert_eq!(tree, expected);
    }

    #[test]
    fn snapshots_are_independent() {
        let before = SpaceTree::build(area(16, 16), vec![(Point::new(2, 2), "a")]).expect("build");
        let after = before.set(Point::new(3, 3), "b");

        assert_eq!(before.len(), 1);
        assert_eq!(after.len(), 2);
        assert_eq!(before.get(Point::new(3, 3)), None);
        assert_eq!(after.get(Point::new(2, 2)), Some(&"a"));
    }
}
