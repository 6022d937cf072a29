use std::{
    cmp::Ordering,
    collections::BinaryHeap,
    fmt::{Debug, Display},
    ops::Add,
};

use log::debug;

/// Represents an absolute cost value, i.e. the accumulated cost of reaching a node
pub trait Cost: Copy + Clone + Default + Add<Output = Self> + PartialOrd + Debug + 'static {
    /// Total order used by the priority queue
    fn cost_cmp(&self, other: &Self) -> Ordering;
}

impl Cost for usize {
    fn cost_cmp(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

impl Cost for f64 {
    fn cost_cmp(&self, other: &Self) -> Ordering {
        self.total_cmp(other)
    }
}

/// Supertrait that collects all the requirements on the NodeReference values
/// Must be copy, comparable and not references (hence 'static)
pub trait NodeReference: Copy + Eq + Debug + 'static {}

pub trait MapTrait {
    /// The type that can be used to reference nodes in the map
    type Reference: NodeReference;

    /// The type that the map uses for storage
    type Storage<T: Default + Copy + 'static>: MapStorage<T, Reference = Self::Reference>;

    /// The cost of a single move between two neighbors
    type Cost: Cost;

    /// Check if the provided node reference is inside the map
    fn is_valid(&self, node: Self::Reference) -> bool;

    /// Return an iterator over the neighbors of the provided node and the cost required to go there
    fn neighbors_of(
        &self,
        node: Self::Reference,
    ) -> impl Iterator<Item = (Self::Reference, Self::Cost)>;

    /// Create a storage for values of type T
    fn create_storage<T: Default + Copy + 'static>(&self) -> Self::Storage<T>;
}

pub trait MapStorage<T> {
    type Reference: NodeReference;

    fn is_valid(&self, node: Self::Reference) -> bool;
    fn get(&self, node: Self::Reference) -> T;
    fn get_mut(&mut self, node: Self::Reference) -> &mut T;
}

/// The objects that we store in the priority queue
#[derive(Debug)]
struct ToVisit<C: Cost, R: Eq> {
    cost: C,
    point: R,
}

impl<C: Cost, R: Eq> Ord for ToVisit<C, R> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cost.cost_cmp(&other.cost).reverse() // reverse for BinaryHeap to be a min-heap
    }
}

impl<C: Cost, R: Eq> PartialOrd for ToVisit<C, R> {
    fn partial_cmp(&self, other: &ToVisit<C, R>) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<C: Cost, R: Eq> PartialEq for ToVisit<C, R> {
    fn eq(&self, other: &ToVisit<C, R>) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<C: Cost, R: Eq> Eq for ToVisit<C, R> {}

/// Best known cost of a node and the node it was reached from
#[derive(Clone, Copy, Debug)]
pub struct VisitedItem<C, R> {
    pub cost: C,
    pub from: Option<R>,
}

#[derive(Clone, Copy, Debug)]
pub struct Visited<C, R>(Option<VisitedItem<C, R>>);

impl<C: Copy, R: Copy> Visited<C, R> {
    pub fn item(&self) -> Option<VisitedItem<C, R>> {
        self.0
    }
}

impl<C, R> Default for Visited<C, R> {
    fn default() -> Self {
        Visited(None)
    }
}
impl<C: Display, R> Display for Visited<C, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Some(item) => write!(f, "{:5.1} ", item.cost),
            None => write!(f, "{:>5} ", "."),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct PathResult<C, R> {
    pub path: Vec<R>,
    pub start: R,
    pub goal: R,
    pub total_cost: C,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PathFinderState<C, R> {
    Computing,
    NoPathFound,
    PathFound(PathResult<C, R>),
}

impl<C, R> PathFinderState<C, R> {
    pub fn is_done(&self) -> bool {
        !matches!(self, PathFinderState::Computing)
    }
}

/// Dijkstra search over a [`MapTrait`], either run to completion with
/// [`PathFinder::finish`] or advanced one queue pop at a time with [`PathFinder::step`].
///
/// The queue has no decrease-key: a node is pushed again whenever its cost improves and
/// the outdated entries are skipped when they come out of the heap.
pub struct PathFinder<M: MapTrait> {
    start: M::Reference,
    goal: M::Reference,
    visited: M::Storage<Visited<M::Cost, M::Reference>>,
    visit_list: BinaryHeap<ToVisit<M::Cost, M::Reference>>,
    state: PathFinderState<M::Cost, M::Reference>,
    expanded: usize,
}

impl<M: MapTrait> PathFinder<M> {
    pub fn new(map: &M, start: M::Reference, goal: M::Reference) -> Self {
        let mut visited = map.create_storage::<Visited<M::Cost, M::Reference>>();
        let mut visit_list = BinaryHeap::new();
        let mut state = PathFinderState::Computing;

        if map.is_valid(start) && map.is_valid(goal) {
            *visited.get_mut(start) = Visited(Some(VisitedItem {
                cost: Default::default(),
                from: None,
            }));
            visit_list.push(ToVisit {
                cost: Default::default(),
                point: start,
            });
        } else {
            state = PathFinderState::NoPathFound;
        }

        Self {
            start,
            goal,
            visited,
            visit_list,
            state,
            expanded: 0,
        }
    }

    pub fn finish(
        mut self,
        map: &M,
    ) -> (
        PathFinderState<M::Cost, M::Reference>,
        M::Storage<Visited<M::Cost, M::Reference>>,
    ) {
        loop {
            match self.step(map) {
                PathFinderState::Computing => {}
                s => return (s, self.visited),
            }
        }
    }

    pub fn step(&mut self, map: &M) -> PathFinderState<M::Cost, M::Reference> {
        if self.state.is_done() {
            return self.state.clone();
        }

        let Some(visit) = self.visit_list.pop() else {
            debug!(
                "no path from {:?} to {:?}, expanded {} nodes",
                self.start, self.goal, self.expanded
            );
            self.state = PathFinderState::NoPathFound;
            return self.state.clone();
        };

        // a cheaper way to this node was recorded after this entry was queued
        if let Some(best) = self.visited.get(visit.point).item() {
            if visit.cost.cost_cmp(&best.cost) == Ordering::Greater {
                return self.state.clone();
            }
        }

        self.expanded += 1;

        if visit.point == self.goal {
            let path = self.backtrack();
            debug!(
                "path found from {:?} to {:?}: cost={:?}, {} steps, expanded {} nodes",
                self.start,
                self.goal,
                visit.cost,
                path.len() - 1,
                self.expanded
            );

            self.state = PathFinderState::PathFound(PathResult {
                path,
                total_cost: visit.cost,
                start: self.start,
                goal: self.goal,
            });

            return self.state.clone();
        }

        for (point, move_cost) in map.neighbors_of(visit.point) {
            let cost = visit.cost + move_cost;
            let improves = match self.visited.get(point).item() {
                Some(known) => cost.cost_cmp(&known.cost) == Ordering::Less,
                None => true,
            };

            if improves {
                *self.visited.get_mut(point) = Visited(Some(VisitedItem {
                    cost,
                    from: Some(visit.point),
                }));
                self.visit_list.push(ToVisit { cost, point });
            }
        }

        self.state.clone()
    }

    /// Walk the predecessor links from the goal back to the start
    fn backtrack(&self) -> Vec<M::Reference> {
        let mut path = vec![self.goal];
        let mut current = self.goal;

        loop {
            match self.visited.get(current).item() {
                Some(VisitedItem { from: None, .. }) => break,
                Some(VisitedItem {
                    from: Some(from), ..
                }) => {
                    path.push(from);
                    current = from;
                }
                None => unreachable!("backtracking led to a node that was never reached"),
            }
        }

        path.reverse();
        path
    }

    pub fn state(&self) -> &PathFinderState<M::Cost, M::Reference> {
        &self.state
    }

    pub fn get_visited(&self) -> &M::Storage<Visited<M::Cost, M::Reference>> {
        &self.visited
    }

    /// Number of queue entries that were expanded so far (stale entries excluded)
    pub fn expanded(&self) -> usize {
        self.expanded
    }

    pub fn start(&self) -> M::Reference {
        self.start
    }

    pub fn goal(&self) -> M::Reference {
        self.goal
    }
}
