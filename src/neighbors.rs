/*
 * Neighborhood Module
 *
 * Rebuilds every fish's neighbor list from scratch each tick: "other
 * swimming fish closer than the perception radius". Two backends give the
 * same answer:
 * - brute force, O(n²), fine for tens to low hundreds of fish
 * - a uniform 3D grid with cells at least as wide as the perception radius,
 *   so only the 27 surrounding cells need checking
 *
 * Lists are in ascending index order, which keeps force summation order
 * independent of the backend.
 */

use glam::Vec3;

use crate::bounds::WorldBounds;
use crate::fish::Fish;
use crate::params::NeighborBackend;

/// Upper bound on grid cells. Tiny radii widen the cells instead; a cell is
/// never narrower than the query radius.
pub const MAX_CELLS: usize = 1 << 18;

pub struct SpatialGrid {
    pub cell_size: f32,
    radius: f32,
    origin: Vec3,
    extent: Vec3,
    dims: [usize; 3],
    cells: Vec<Vec<usize>>,
}

fn grid_dims(extent: Vec3, cell_size: f32) -> [usize; 3] {
    [
        ((extent.x / cell_size).ceil().min(MAX_CELLS as f32) as usize).max(1),
        ((extent.y / cell_size).ceil().min(MAX_CELLS as f32) as usize).max(1),
        ((extent.z / cell_size).ceil().min(MAX_CELLS as f32) as usize).max(1),
    ]
}

impl SpatialGrid {
    pub fn new(radius: f32, bounds: &WorldBounds) -> Self {
        let radius = radius.max(f32::EPSILON);
        let extent = bounds.max() - bounds.min();
        let mut cell_size = radius;
        let mut dims = grid_dims(extent, cell_size);
        while dims.iter().map(|&d| d as u128).product::<u128>() > MAX_CELLS as u128 {
            cell_size *= 2.0;
            dims = grid_dims(extent, cell_size);
        }

        Self {
            cell_size,
            radius,
            origin: bounds.min(),
            extent,
            dims,
            cells: vec![Vec::new(); dims[0] * dims[1] * dims[2]],
        }
    }

    /// Whether this grid was built for the given query radius and bounds.
    pub fn matches(&self, radius: f32, bounds: &WorldBounds) -> bool {
        (self.radius - radius.max(f32::EPSILON)).abs() <= f32::EPSILON
            && self.origin == bounds.min()
            && self.extent == bounds.max() - bounds.min()
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    // Convert world coordinates to integer cell coordinates, clamped to the grid
    #[inline]
    fn cell_coords(&self, position: Vec3) -> [usize; 3] {
        let relative = (position - self.origin) / self.cell_size;
        [
            (relative.x.max(0.0) as usize).min(self.dims[0] - 1),
            (relative.y.max(0.0) as usize).min(self.dims[1] - 1),
            (relative.z.max(0.0) as usize).min(self.dims[2] - 1),
        ]
    }

    #[inline]
    fn cell_index(&self, [x, y, z]: [usize; 3]) -> usize {
        (z * self.dims[1] + y) * self.dims[0] + x
    }

    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
    }

    pub fn insert(&mut self, index: usize, position: Vec3) {
        let cell = self.cell_index(self.cell_coords(position));
        self.cells[cell].push(index);
    }

    /// Indices stored in the cell containing `position` and its 26 neighbors.
    pub fn nearby(&self, position: Vec3, out: &mut Vec<usize>) {
        let center = self.cell_coords(position);
        for z in center[2].saturating_sub(1)..=(center[2] + 1).min(self.dims[2] - 1) {
            for y in center[1].saturating_sub(1)..=(center[1] + 1).min(self.dims[1] - 1) {
                for x in center[0].saturating_sub(1)..=(center[0] + 1).min(self.dims[0] - 1) {
                    out.extend_from_slice(&self.cells[self.cell_index([x, y, z])]);
                }
            }
        }
    }
}

/// Reusable neighbor lists for the whole school.
pub struct Neighborhood {
    lists: Vec<Vec<usize>>,
    grid: Option<SpatialGrid>,
    scratch: Vec<usize>,
}

impl Default for Neighborhood {
    fn default() -> Self {
        Self::new()
    }
}

impl Neighborhood {
    pub fn new() -> Self {
        Self {
            lists: Vec::new(),
            grid: None,
            scratch: Vec::new(),
        }
    }

    pub fn of(&self, index: usize) -> &[usize] {
        self.lists.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total directed neighbor links found by the last rebuild.
    pub fn link_count(&self) -> usize {
        self.lists.iter().map(Vec::len).sum()
    }

    pub fn clear(&mut self) {
        self.lists.clear();
    }

    pub fn rebuild(
        &mut self,
        school: &[Fish],
        radius: f32,
        backend: NeighborBackend,
        bounds: &WorldBounds,
    ) {
        self.lists.resize_with(school.len(), Vec::new);
        self.lists.truncate(school.len());
        for list in &mut self.lists {
            list.clear();
        }

        match backend {
            NeighborBackend::BruteForce => self.rebuild_brute_force(school, radius),
            NeighborBackend::Grid => self.rebuild_with_grid(school, radius, bounds),
        }
    }

    fn rebuild_brute_force(&mut self, school: &[Fish], radius: f32) {
        let radius_sq = radius * radius;
        for (i, fish) in school.iter().enumerate() {
            if !fish.is_active() {
                continue;
            }
            for (j, other) in school.iter().enumerate() {
                if i == j || !other.is_active() {
                    continue;
                }
                if fish.position.distance_squared(other.position) < radius_sq {
                    self.lists[i].push(j);
                }
            }
        }
    }

    fn rebuild_with_grid(&mut self, school: &[Fish], radius: f32, bounds: &WorldBounds) {
        if !self.grid.as_ref().map_or(false, |grid| grid.matches(radius, bounds)) {
            self.grid = Some(SpatialGrid::new(radius, bounds));
        }
        let grid = match self.grid.as_mut() {
            Some(grid) => grid,
            None => return,
        };
        grid.clear();
        for (i, fish) in school.iter().enumerate() {
            if fish.is_active() {
                grid.insert(i, fish.position);
            }
        }

        let radius_sq = radius * radius;
        for (i, fish) in school.iter().enumerate() {
            if !fish.is_active() {
                continue;
            }
            self.scratch.clear();
            grid.nearby(fish.position, &mut self.scratch);
            self.scratch.sort_unstable();

            let list = &mut self.lists[i];
            for &j in &self.scratch {
                if j != i && fish.position.distance_squared(school[j].position) < radius_sq {
                    list.push(j);
                }
            }
        }
    }
}
