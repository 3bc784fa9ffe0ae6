use std::collections::VecDeque;

use super::error::{LayoutError, Result};

/// Axis along which a row's items sit side by side. Alternates down the chain,
/// starting from `Vertical` at the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Horizontal,
    Vertical,
}

impl Direction {
    pub fn flip(self) -> Self {
        match self {
            Direction::Horizontal => Direction::Vertical,
            Direction::Vertical => Direction::Horizontal,
        }
    }
}

/// Size of a container in weight units (areas), not pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Extent {
    /// Side the row's items are laid along
    pub edge: f64,
    /// Side the row is cut from
    pub cross: f64,
}

impl Extent {
    pub fn area(self) -> f64 {
        self.edge * self.cross
    }
}

/// Index into the row arena of a `TreeMap`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowId(pub(crate) u32);

impl RowId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One strip of the partition.
#[derive(Debug, Clone, PartialEq)]
pub struct Row<T> {
    pub direction: Direction,
    /// Items of this row, heaviest first
    pub nodes: Vec<T>,
    pub edge_length: f64,
    pub cross_edge_length: f64,
    /// Container this row was cut from
    pub container: Extent,
    /// Row laid out in the space left after this one
    pub child: Option<RowId>,
}

impl<T> Row<T> {
    fn open(direction: Direction, container: Extent) -> Self {
        Self {
            direction,
            nodes: Vec::new(),
            edge_length: 0.0,
            cross_edge_length: 0.0,
            container,
            child: None,
        }
    }

    /// Area covered by this row.
    pub fn area(&self) -> f64 {
        self.edge_length * self.cross_edge_length
    }

    /// The empty row occupying whatever this row leaves of its container.
    fn remainder(&self) -> Row<T> {
        Row::open(
            self.direction.flip(),
            Extent {
                edge: (self.container.cross - self.cross_edge_length).max(0.0),
                cross: self.container.edge,
            },
        )
    }
}

/// Result of a layout: a chain of rows stored in a flat arena, in chain order.
///
/// The last row of a non-empty layout always holds exactly one item, the
/// synthetic rest item built by the caller's factory.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeMap<T> {
    rows: Vec<Row<T>>,
    root: Extent,
    rest: Option<RowId>,
}

impl<T> TreeMap<T> {
    fn empty() -> Self {
        Self {
            rows: vec![Row::open(Direction::Vertical, Extent::default())],
            root: Extent::default(),
            rest: None,
        }
    }

    pub fn root(&self) -> &Row<T> {
        &self.rows[0]
    }

    /// Row with the given id, or `None` if the id belongs to another map.
    pub fn get(&self, id: RowId) -> Option<&Row<T>> {
        self.rows.get(id.index())
    }

    /// Extent of the square root container.
    pub fn root_extent(&self) -> Extent {
        self.root
    }

    /// Number of rows in the chain, including the rest row.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when nothing was laid out (empty input).
    pub fn is_empty(&self) -> bool {
        self.rest.is_none()
    }

    /// Walk the chain from the root along `child` links.
    pub fn rows(&self) -> Rows<'_, T> {
        Rows {
            map: self,
            current: Some(RowId(0)),
        }
    }

    pub fn rest_row(&self) -> Option<&Row<T>> {
        self.rest.and_then(|id| self.get(id))
    }

    pub fn rest_item(&self) -> Option<&T> {
        self.rest_row().and_then(|row| row.nodes.first())
    }

    pub fn is_rest(&self, id: RowId) -> bool {
        self.rest == Some(id)
    }

    /// Caller items that made it into a real row, in layout order.
    pub fn placed_items(&self) -> impl Iterator<Item = &T> + '_ {
        self.rows()
            .filter(|(id, _)| !self.is_rest(*id))
            .flat_map(|(_, row)| row.nodes.iter())
    }
}

/// Iterator over the rows of a `TreeMap`.
pub struct Rows<'a, T> {
    map: &'a TreeMap<T>,
    current: Option<RowId>,
}

impl<'a, T> Iterator for Rows<'a, T> {
    type Item = (RowId, &'a Row<T>);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        let row = self.map.get(id)?;
        self.current = row.child;
        Some((id, row))
    }
}

/// Candidate row being grown by the greedy pass.
struct PendingRow<T> {
    weights: Vec<f64>,
    items: Vec<T>,
    sum: f64,
}

impl<T> PendingRow<T> {
    fn new() -> Self {
        Self {
            weights: Vec::new(),
            items: Vec::new(),
            sum: 0.0,
        }
    }

    fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether appending an item of weight `w` keeps the row at least as square.
    /// Ties extend the row.
    fn accepts(&mut self, w: f64, edge: f64) -> bool {
        let current = worst(&self.weights, self.sum, edge);
        self.weights.push(w);
        let extended = worst(&self.weights, self.sum + w, edge);
        self.weights.pop();
        current >= extended
    }

    fn push(&mut self, w: f64, item: T) {
        self.weights.push(w);
        self.items.push(item);
        self.sum += w;
    }

    fn take(&mut self) -> (Vec<f64>, Vec<T>, f64) {
        let sum = std::mem::replace(&mut self.sum, 0.0);
        (
            std::mem::take(&mut self.weights),
            std::mem::take(&mut self.items),
            sum,
        )
    }
}

/// Squarified treemap layout (Bruls, Huizing, van Wijk 2000).
///
/// Items are laid out in a square container of side `ceil(sqrt(total))`, one
/// larger when the total is a perfect square, so there is always slack left
/// for a trailing rest item. `rest` receives the rest weight (slack plus the
/// weight of anything left unplaced) and the unplaced items themselves.
///
/// `interrupt` sees every real row once its extents are final, along with the
/// root extent; returning `false` stops the layout and hands that row's items,
/// and all items after it, to `rest`. The rest row then takes that row's slot.
///
/// Zero-weight items are never laid out and always end up in `rest`. Negative
/// or non-finite weights are rejected.
pub fn squarify<T, W, I, R>(
    items: impl IntoIterator<Item = T>,
    weight: W,
    mut interrupt: I,
    rest: R,
) -> Result<TreeMap<T>>
where
    W: Fn(&T) -> f64,
    I: FnMut(&Row<T>, Extent) -> bool,
    R: FnOnce(f64, Vec<T>) -> T,
{
    let mut weighted = Vec::new();
    for (index, item) in items.into_iter().enumerate() {
        let w = weight(&item);
        if !w.is_finite() || w < 0.0 {
            return Err(LayoutError::InvalidWeight { index, weight: w });
        }
        weighted.push((w, item));
    }

    if weighted.is_empty() {
        return Ok(TreeMap::empty());
    }
    check_capacity(weighted.len())?;

    // Stable, so equal weights keep the caller's order
    weighted.sort_by(|a, b| b.0.total_cmp(&a.0));

    let children_sum: f64 = weighted.iter().map(|(w, _)| w).sum();
    if !children_sum.is_finite() {
        return Err(LayoutError::TotalOverflow);
    }
    let root_edge = root_edge_length(children_sum);
    let root = Extent {
        edge: root_edge,
        cross: root_edge,
    };

    let positive = weighted.partition_point(|(w, _)| *w > 0.0);
    let weightless = weighted.split_off(positive);
    let mut remaining: VecDeque<(f64, T)> = weighted.into();

    tracing::debug!(
        "Squarify: {} items ({} weightless), total weight {:.3}, root edge {}",
        remaining.len() + weightless.len(),
        weightless.len(),
        children_sum,
        root_edge
    );

    let mut rows = vec![Row::open(Direction::Vertical, root)];
    let mut pending = PendingRow::new();
    let mut unplaced: Vec<(f64, T)> = Vec::new();

    loop {
        let current = rows.len() - 1;
        let edge = rows[current].container.edge;

        if let Some(w) = remaining.front().map(|(w, _)| *w) {
            if pending.accepts(w, edge) {
                if let Some((w, item)) = remaining.pop_front() {
                    pending.push(w, item);
                }
                continue;
            }
        }

        // Only reachable with an empty row when there was nothing to place
        if pending.is_empty() {
            break;
        }

        let (weights, nodes, sum) = pending.take();
        {
            let row = &mut rows[current];
            row.nodes = nodes;
            row.edge_length = row.container.edge;
            row.cross_edge_length = if row.container.edge > 0.0 {
                sum / row.container.edge
            } else {
                row.container.cross
            };
            tracing::trace!(
                "Row {}: {:?}, {} items, {:.3} x {:.3} in {:.3} x {:.3}",
                current,
                row.direction,
                row.nodes.len(),
                row.edge_length,
                row.cross_edge_length,
                row.container.edge,
                row.container.cross
            );
        }

        if !interrupt(&rows[current], root) {
            let row = &mut rows[current];
            let nodes = std::mem::take(&mut row.nodes);
            row.edge_length = 0.0;
            row.cross_edge_length = 0.0;
            unplaced.extend(weights.into_iter().zip(nodes));
            unplaced.extend(remaining.drain(..));
            tracing::debug!(
                "Squarify interrupted at row {}, {} items left unplaced",
                current,
                unplaced.len()
            );
            break;
        }

        let next = rows[current].remainder();
        rows[current].child = Some(RowId(rows.len() as u32));
        rows.push(next);

        if remaining.is_empty() {
            break;
        }
    }

    unplaced.extend(weightless);
    let unplaced_weight: f64 = unplaced.iter().map(|(w, _)| w).sum();
    let rest_weight = unplaced_weight + root_edge * root_edge - children_sum;
    let rest_item = rest(
        rest_weight,
        unplaced.into_iter().map(|(_, item)| item).collect(),
    );

    // The rest row swallows whatever is left of its container
    let last = rows.len() - 1;
    let row = &mut rows[last];
    row.nodes = vec![rest_item];
    row.edge_length = row.container.edge;
    row.cross_edge_length = row.container.cross;

    Ok(TreeMap {
        rows,
        root,
        rest: Some(RowId(last as u32)),
    })
}

/// Every item may end up in a row of its own, plus the rest row; row ids must
/// stay within `u32`.
fn check_capacity(count: usize) -> Result<()> {
    if count >= u32::MAX as usize {
        return Err(LayoutError::TooManyItems { count });
    }
    Ok(())
}

/// Side of the square root container for a given total weight.
pub fn root_edge_length(total: f64) -> f64 {
    let side = total.sqrt();
    if side.fract() == 0.0 {
        side + 1.0
    } else {
        side.ceil()
    }
}

/// Worst aspect ratio of a row sorted heaviest first, laid along `edge`.
fn worst(weights: &[f64], sum: f64, edge: f64) -> f64 {
    let (Some(&max), Some(&min)) = (weights.first(), weights.last()) else {
        return f64::INFINITY;
    };
    let edge_sq = edge * edge;
    let sum_sq = sum * sum;
    f64::max((edge_sq * max) / sum_sq, sum_sq / (edge_sq * min))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: usize,
        w: f64,
        hidden: Vec<usize>,
    }

    const REST_ID: usize = usize::MAX;

    fn items(weights: &[f64]) -> Vec<Item> {
        weights
            .iter()
            .enumerate()
            .map(|(id, &w)| Item {
                id,
                w,
                hidden: Vec::new(),
            })
            .collect()
    }

    fn rest(w: f64, unplaced: Vec<Item>) -> Item {
        Item {
            id: REST_ID,
            w,
            hidden: unplaced.iter().map(|i| i.id).collect(),
        }
    }

    fn layout(weights: &[f64]) -> TreeMap<Item> {
        squarify(items(weights), |i| i.w, |_, _| true, rest).unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9 * a.abs().max(b.abs()).max(1.0)
    }

    #[test]
    fn worst_ratio_matches_hand_computed_values() {
        assert_eq!(worst(&[], 0.0, 4.0), f64::INFINITY);
        assert!(close(worst(&[4.0], 4.0, 4.0), 4.0));
        assert!(close(worst(&[4.0, 3.0], 7.0, 4.0), 64.0 / 49.0));
        assert!(close(worst(&[4.0, 3.0, 2.0], 9.0, 4.0), 81.0 / 32.0));
        assert!(close(worst(&[2.0], 2.0, 2.25), 2.53125));
        assert!(close(worst(&[2.0, 1.0], 3.0, 2.25), 9.0 / 5.0625));
    }

    #[test]
    fn four_items_pack_into_two_rows_and_a_rest() {
        let map = layout(&[4.0, 3.0, 2.0, 1.0]);
        assert_eq!(map.root_extent(), Extent { edge: 4.0, cross: 4.0 });

        let rows: Vec<_> = map.rows().map(|(_, r)| r).collect();
        assert_eq!(rows.len(), 3);

        let ids = |row: &Row<Item>| row.nodes.iter().map(|i| i.id).collect::<Vec<_>>();
        assert_eq!(rows[0].direction, Direction::Vertical);
        assert_eq!(ids(rows[0]), vec![0, 1]);
        assert!(close(rows[0].edge_length, 4.0));
        assert!(close(rows[0].cross_edge_length, 1.75));

        assert_eq!(rows[1].direction, Direction::Horizontal);
        assert_eq!(ids(rows[1]), vec![2, 3]);
        assert_eq!(rows[1].container, Extent { edge: 2.25, cross: 4.0 });
        assert!(close(rows[1].cross_edge_length, 3.0 / 2.25));

        assert_eq!(rows[2].direction, Direction::Vertical);
        let rest_item = map.rest_item().unwrap();
        assert_eq!(rest_item.id, REST_ID);
        assert!(close(rest_item.w, 6.0));
        assert!(rest_item.hidden.is_empty());
        assert!(close(rows[2].area(), 6.0));
        assert!(rows[2].child.is_none());
    }

    #[test]
    fn perfect_square_total_reserves_room_for_rest() {
        let map = layout(&[9.0]);
        assert_eq!(map.root_extent().edge, 4.0);
        assert!(close(map.rest_item().unwrap().w, 7.0));

        let map = layout(&[4.0, 3.0, 2.0]);
        assert_eq!(map.root_extent().edge, 4.0);
        assert!(close(map.rest_item().unwrap().w, 7.0));
    }

    #[test]
    fn empty_input_has_no_rest_row() {
        let mut rest_called = false;
        let map = squarify(
            Vec::<Item>::new(),
            |i| i.w,
            |_, _| true,
            |w, unplaced| {
                rest_called = true;
                rest(w, unplaced)
            },
        )
        .unwrap();

        assert!(!rest_called);
        assert!(map.is_empty());
        assert_eq!(map.len(), 1);
        assert!(map.rest_item().is_none());
        let root = map.root();
        assert_eq!(root.direction, Direction::Vertical);
        assert!(root.nodes.is_empty());
        assert_eq!(root.edge_length, 0.0);
        assert_eq!(root.cross_edge_length, 0.0);
        assert!(root.child.is_none());
    }

    #[test]
    fn zero_total_weight_yields_single_rest_row() {
        let map = layout(&[0.0, 0.0]);
        assert_eq!(map.len(), 1);
        assert_eq!(map.root_extent().edge, 1.0);
        let rest_item = map.rest_item().unwrap();
        assert!(close(rest_item.w, 1.0));
        assert_eq!(rest_item.hidden, vec![0, 1]);
        assert!(close(map.root().area(), 1.0));
    }

    #[test]
    fn weightless_items_go_to_rest() {
        let map = layout(&[5.0, 0.0, 3.0]);
        let placed: Vec<_> = map.placed_items().map(|i| i.id).collect();
        assert_eq!(placed, vec![0, 2]);
        assert_eq!(map.rest_item().unwrap().hidden, vec![1]);
    }

    #[test]
    fn invalid_weights_are_rejected() {
        for bad in [-1.0, f64::NAN, f64::INFINITY] {
            let err = squarify(items(&[1.0, bad]), |i| i.w, |_, _| true, rest).unwrap_err();
            match err {
                LayoutError::InvalidWeight { index, .. } => assert_eq!(index, 1),
                other => panic!("expected invalid weight, got {:?}", other),
            }
        }
    }

    #[test]
    fn overflowing_total_weight_is_rejected() {
        let err = squarify(items(&[1e308, 1e308, 1.0]), |i| i.w, |_, _| true, rest).unwrap_err();
        assert!(matches!(err, LayoutError::TotalOverflow));
    }

    #[test]
    fn row_ids_stay_within_u32() {
        assert!(check_capacity(1_000).is_ok());
        assert!(check_capacity(u32::MAX as usize - 1).is_ok());
        assert!(matches!(
            check_capacity(u32::MAX as usize),
            Err(LayoutError::TooManyItems { .. })
        ));
    }

    #[test]
    fn foreign_row_id_is_not_found() {
        let small = layout(&[1.0]);
        let large = layout(&[4.0, 3.0, 2.0, 1.0]);
        let (last, _) = large.rows().last().unwrap();
        assert!(large.get(last).is_some());
        assert!(small.get(last).is_none());
    }

    #[test]
    fn interrupt_on_second_row_hands_remaining_items_to_rest() {
        let mut calls = 0;
        let map = squarify(
            items(&[4.0, 3.0, 2.0, 1.0]),
            |i| i.w,
            |_, _| {
                calls += 1;
                calls < 2
            },
            rest,
        )
        .unwrap();

        assert_eq!(calls, 2);
        assert_eq!(map.len(), 2);
        let rest_row = map.rest_row().unwrap();
        assert_eq!(rest_row.direction, Direction::Horizontal);
        assert_eq!(rest_row.container, Extent { edge: 2.25, cross: 4.0 });
        let rest_item = map.rest_item().unwrap();
        assert_eq!(rest_item.hidden, vec![2, 3]);
        assert!(close(rest_item.w, 9.0));
        assert!(close(rest_row.area(), 9.0));
    }

    #[test]
    fn interrupt_on_first_row_turns_root_into_rest() {
        let map = squarify(items(&[4.0, 3.0, 2.0, 1.0]), |i| i.w, |_, _| false, rest).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.placed_items().count(), 0);
        let rest_item = map.rest_item().unwrap();
        assert_eq!(rest_item.hidden, vec![0, 1, 2, 3]);
        assert!(close(rest_item.w, 16.0));
    }

    #[test]
    fn interrupt_is_not_consulted_for_rest_row() {
        let mut seen = Vec::new();
        let map = squarify(
            items(&[4.0, 3.0, 2.0, 1.0]),
            |i| i.w,
            |row: &Row<Item>, root| {
                assert_eq!(root, Extent { edge: 4.0, cross: 4.0 });
                seen.push(row.nodes.iter().map(|i| i.id).collect::<Vec<_>>());
                true
            },
            rest,
        )
        .unwrap();
        assert_eq!(seen, vec![vec![0, 1], vec![2, 3]]);
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn equal_weights_keep_caller_order() {
        let map = layout(&[1.0, 1.0, 1.0, 1.0, 1.0]);
        let placed: Vec<_> = map.placed_items().map(|i| i.id).collect();
        assert_eq!(placed, vec![0, 1, 2, 3, 4]);
    }

    fn weights() -> impl Strategy<Value = Vec<f64>> {
        prop::collection::vec(0.0f64..1000.0, 1..40)
    }

    proptest! {
        #[test]
        fn node_weights_sum_to_root_area(ws in weights()) {
            let map = layout(&ws);
            let edge = root_edge_length(ws.iter().sum());
            let total: f64 = map
                .rows()
                .flat_map(|(_, row)| row.nodes.iter())
                .map(|i| i.w)
                .sum();
            prop_assert!(close(total, edge * edge));
            let rest_row = map.rest_row().unwrap();
            prop_assert!((rest_row.area() - map.rest_item().unwrap().w).abs() < 1e-6 * edge * edge);
        }

        #[test]
        fn directions_alternate_and_rows_are_sorted(ws in weights()) {
            let map = layout(&ws);
            let rows: Vec<_> = map.rows().map(|(_, r)| r).collect();
            prop_assert_eq!(rows[0].direction, Direction::Vertical);
            for pair in rows.windows(2) {
                prop_assert_ne!(pair[0].direction, pair[1].direction);
            }
            for row in &rows {
                for pair in row.nodes.windows(2) {
                    prop_assert!(pair[0].w >= pair[1].w);
                }
            }
            prop_assert_eq!(map.rows().count(), map.len());
            prop_assert!(rows.last().unwrap().child.is_none());
        }

        #[test]
        fn interrupt_never_loses_items(ws in weights(), stop_at in 1usize..6) {
            let mut calls = 0;
            let map = squarify(
                items(&ws),
                |i| i.w,
                |_, _| {
                    calls += 1;
                    calls < stop_at
                },
                rest,
            )
            .unwrap();

            let mut ids: Vec<usize> = map.placed_items().map(|i| i.id).collect();
            ids.extend(map.rest_item().unwrap().hidden.iter().copied());
            ids.sort_unstable();
            prop_assert_eq!(ids, (0..ws.len()).collect::<Vec<_>>());
            prop_assert!(map.len() <= stop_at);
        }

        #[test]
        fn layout_is_deterministic(ws in weights()) {
            prop_assert_eq!(layout(&ws), layout(&ws));
        }
    }
}
