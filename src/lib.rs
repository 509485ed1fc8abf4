#![warn(clippy::all)]
#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

mod catenary;
mod envelope;
mod errors;
mod geometry;
mod rig;
mod terrain;

pub use catenary::Catenary;
pub use envelope::{EnvelopeMap, EnvelopeScanner, NullObserver, ScanConfig, ScanObserver};
pub use errors::{
    CableError, ConfigError, EquilibriumError, RigError, ScanError, TerrainError,
};
pub use geometry::{
    barycentric, force, plan_distance, plan_magnitude, plane_point, point, triangle_contains,
    Force, PlanePoint, Point,
};
pub use rig::{Equilibrium, TriCableRig};
pub use terrain::{FlatTerrain, RasterTerrain, TerrainQuery};
