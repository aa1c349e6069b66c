/// Deciding when conditions deserve attention.
///
/// Submodules:
/// - `criteria`: favorability profiles and per-slot evaluation.
/// - `cooldown`: gating how often checks may run.

pub mod cooldown;
pub mod criteria;
