//! A* shortest-path search over a tile grid.
//!
//! The search is 4-directional with uniform step cost and a Manhattan
//! heuristic, which is admissible and consistent here, so the first
//! time the goal leaves the open set the path is optimal. Blocked
//! start or goal cells are substituted by the nearest walkable tile
//! (breadth-first, layer by layer) before searching.
//!
//! There is no error channel: an unreachable goal, a degenerate grid,
//! or an exhausted fallback all come back as an empty [`Path`], which
//! callers treat as "stay put and re-evaluate next tick".

use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};

use crate::grid::{Position, TileGrid};

/// Route from the step *after* the start cell up to and including the
/// goal cell. Empty when start equals goal or no route exists.
pub type Path = Vec<Position>;

/// Search-internal node. Lives in a per-invocation arena and is
/// discarded after reconstruction; parents are arena indices, never
/// shared across frames.
#[derive(Clone, Copy)]
struct PathNode {
    position: Position,
    g: u32,
    parent: Option<usize>,
}

/// Open-set entry ordered by `f`, ties broken by discovery order.
#[derive(Clone, Copy, PartialEq, Eq)]
struct OpenEntry {
    f: u32,
    seq: u32,
    node: usize,
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the max-heap pops the lowest f first.
        other
            .f
            .cmp(&self.f)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Finds the shortest path between two tiles.
///
/// Coordinates are clamped into bounds first; a blocked start or goal
/// is replaced by its closest walkable tile. Returns an empty path
/// when there is nothing to do or nothing that can be done.
pub fn find_path(grid: &dyn TileGrid, start: Position, goal: Position) -> Path {
    let dims = grid.dimensions();
    if dims.area() == 0 {
        return Path::new();
    }
    let Some(start) = closest_walkable(grid, dims.clamp(start)) else {
        return Path::new();
    };
    let Some(goal) = closest_walkable(grid, dims.clamp(goal)) else {
        return Path::new();
    };
    if start == goal {
        return Path::new();
    }

    let width = dims.width as usize;
    let cells = width * dims.height as usize;
    let index = |p: Position| p.y as usize * width + p.x as usize;

    let mut g_score = vec![u32::MAX; cells];
    let mut closed = vec![false; cells];
    let mut arena = vec![PathNode {
        position: start,
        g: 0,
        parent: None,
    }];
    let mut open = BinaryHeap::new();
    let mut seq = 0u32;

    g_score[index(start)] = 0;
    open.push(OpenEntry {
        f: start.manhattan(goal),
        seq,
        node: 0,
    });

    while let Some(entry) = open.pop() {
        let current = arena[entry.node];
        // Stale duplicates for an already-expanded cell are skipped
        // lazily instead of being removed from the heap.
        if closed[index(current.position)] {
            continue;
        }
        if current.position == goal {
            return reconstruct(&arena, entry.node, start);
        }
        closed[index(current.position)] = true;

        for next in current.position.neighbors() {
            if grid.is_blocked(next) {
                continue;
            }
            let next_index = index(next);
            if closed[next_index] {
                continue;
            }
            let tentative = current.g + 1;
            if tentative < g_score[next_index] {
                g_score[next_index] = tentative;
                arena.push(PathNode {
                    position: next,
                    g: tentative,
                    parent: Some(entry.node),
                });
                seq += 1;
                open.push(OpenEntry {
                    f: tentative + next.manhattan(goal),
                    seq,
                    node: arena.len() - 1,
                });
            }
        }
    }

    Path::new()
}

fn reconstruct(arena: &[PathNode], node: usize, start: Position) -> Path {
    let mut path = Path::new();
    let mut cursor = Some(node);
    while let Some(i) = cursor {
        let entry = &arena[i];
        if entry.position != start {
            path.push(entry.position);
        }
        cursor = entry.parent;
    }
    path.reverse();
    path
}

/// Nearest walkable tile to `from`, searching outward layer by layer
/// in the four cardinal directions. `None` when the whole grid is
/// blocked, which callers must tolerate indefinitely.
pub fn closest_walkable(grid: &dyn TileGrid, from: Position) -> Option<Position> {
    if grid.is_walkable(from) {
        return Some(from);
    }
    let dims = grid.dimensions();
    if dims.area() == 0 || !dims.contains(from) {
        return None;
    }

    let width = dims.width as usize;
    let index = |p: Position| p.y as usize * width + p.x as usize;
    let mut visited = vec![false; width * dims.height as usize];
    let mut queue = VecDeque::new();

    visited[index(from)] = true;
    queue.push_back(from);

    while let Some(current) = queue.pop_front() {
        for next in current.neighbors() {
            if !dims.contains(next) || visited[index(next)] {
                continue;
            }
            if grid.is_walkable(next) {
                return Some(next);
            }
            visited[index(next)] = true;
            queue.push_back(next);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{CollisionView, FlagGrid};

    fn open_grid(width: u32, height: u32) -> FlagGrid {
        FlagGrid::new(width, height)
    }

    #[test]
    fn open_grid_path_length_is_manhattan_distance() {
        let grid = open_grid(5, 5);
        let view = CollisionView::new(&grid, None);
        let path = find_path(&view, Position::new(0, 0), Position::new(4, 4));
        assert_eq!(path.len(), 8);
        assert_eq!(path.last(), Some(&Position::new(4, 4)));
    }

    #[test]
    fn path_distance_to_goal_strictly_decreases() {
        let grid = open_grid(5, 5);
        let view = CollisionView::new(&grid, None);
        let goal = Position::new(4, 4);
        let path = find_path(&view, Position::new(0, 0), goal);
        let mut distance = Position::new(0, 0).manhattan(goal);
        for step in path {
            let next = step.manhattan(goal);
            assert!(next < distance, "distance must shrink every step");
            distance = next;
        }
        assert_eq!(distance, 0);
    }

    #[test]
    fn start_equals_goal_returns_empty() {
        let grid = open_grid(5, 5);
        let view = CollisionView::new(&grid, None);
        assert!(find_path(&view, Position::new(2, 2), Position::new(2, 2)).is_empty());
    }

    #[test]
    fn fully_blocked_grid_returns_empty() {
        let grid = FlagGrid::parse(&["###", "###", "###"]).unwrap();
        let view = CollisionView::new(&grid, None);
        assert!(find_path(&view, Position::new(0, 0), Position::new(2, 2)).is_empty());
    }

    #[test]
    fn zero_size_grid_returns_empty() {
        let grid = open_grid(0, 0);
        let view = CollisionView::new(&grid, None);
        assert!(find_path(&view, Position::ORIGIN, Position::new(3, 3)).is_empty());
    }

    #[test]
    fn out_of_bounds_coordinates_are_clamped() {
        let grid = open_grid(4, 4);
        let view = CollisionView::new(&grid, None);
        let path = find_path(&view, Position::new(-2, -2), Position::new(9, 0));
        // Clamped to (0,0) -> (3,0).
        assert_eq!(path.len(), 3);
        assert_eq!(path.last(), Some(&Position::new(3, 0)));
    }

    #[test]
    fn blocked_row_forces_detour_through_gap() {
        // Row y=2 fully blocked except (4,2).
        let grid = FlagGrid::parse(&[
            ".....", //
            ".....", //
            "####.", //
            ".....", //
            ".....",
        ])
        .unwrap();
        let view = CollisionView::new(&grid, None);
        let path = find_path(&view, Position::new(0, 0), Position::new(0, 4));
        assert!(!path.is_empty());
        assert!(path.contains(&Position::new(4, 2)), "path must use the gap");
        assert_eq!(path.last(), Some(&Position::new(0, 4)));
    }

    #[test]
    fn blocked_start_substitutes_closest_walkable() {
        let grid = FlagGrid::parse(&["##.", "###", "###"]).unwrap();
        let view = CollisionView::new(&grid, None);
        assert_eq!(
            closest_walkable(&view, Position::new(1, 2)),
            Some(Position::new(2, 2))
        );
    }

    #[test]
    fn closest_walkable_exhausts_without_panic() {
        let grid = FlagGrid::parse(&["##", "##"]).unwrap();
        let view = CollisionView::new(&grid, None);
        assert_eq!(closest_walkable(&view, Position::new(0, 0)), None);
    }

    #[test]
    fn blocked_goal_routes_to_substitute() {
        let grid = FlagGrid::parse(&["..#", "...", "..."]).unwrap();
        let view = CollisionView::new(&grid, None);
        // Goal (2,2) is blocked; its closest walkable neighbor absorbs
        // the request and the search still succeeds.
        let path = find_path(&view, Position::new(0, 0), Position::new(2, 2));
        assert!(!path.is_empty());
        let end = *path.last().unwrap();
        assert!(view.is_walkable(end));
        assert_eq!(end.manhattan(Position::new(2, 2)), 1);
    }

    #[test]
    fn unreachable_goal_returns_empty() {
        let grid = FlagGrid::parse(&["..#.", "..#.", "..#.", "..#."]).unwrap();
        let view = CollisionView::new(&grid, None);
        assert!(find_path(&view, Position::new(0, 0), Position::new(3, 3)).is_empty());
    }
}
