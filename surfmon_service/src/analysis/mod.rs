/// Data organization for the surf monitoring service.
///
/// Turns the extractor's flat list of wave cells into the fixed day/period
/// structure the rest of the service works with.
///
/// Submodules:
/// - `grid`: places cells on the 7×3 grid and evaluates each slot.

pub mod grid;
