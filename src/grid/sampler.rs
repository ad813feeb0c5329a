//! Uniform draws of free cells without replacement.

use rand::seq::index;
use rand::Rng;

use super::error::GridError;
use super::index::Cell;
use super::map::GridMap;

/// Draws `k` distinct free cells from a single lane's map.
///
/// The picks carry no particular order.
pub fn select_unoccupied_lane<R: Rng + ?Sized>(
    map: &GridMap,
    lane: usize,
    k: usize,
    rng: &mut R,
) -> Result<Vec<Cell>, GridError> {
    let free = map.free_cells();
    if free.len() < k {
        return Err(GridError::InsufficientFreeCells {
            lane,
            available: free.len(),
            required: k,
        });
    }
    Ok(index::sample(rng, free.len(), k)
        .iter()
        .map(|i| free[i])
        .collect())
}

/// Draws `k` distinct free cells independently for every lane.
///
/// Fails on the first lane that has fewer than `k` free cells; that is a
/// configuration problem (too many objects for the grid) and is not retried.
pub fn select_unoccupied<R: Rng + ?Sized>(
    maps: &[GridMap],
    k: usize,
    rng: &mut R,
) -> Result<Vec<Vec<Cell>>, GridError> {
    maps.iter()
        .enumerate()
        .map(|(lane, map)| select_unoccupied_lane(map, lane, k, rng))
        .collect()
}
