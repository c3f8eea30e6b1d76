//! Data-driven content for the biomass engine.
//!
//! Substances, species and extra drops are declared in RON, JSON or TOML
//! files and resolved into a [`biomass_core::registry::SpeciesRegistryBuilder`].

pub mod loader;
pub mod schema;

pub use loader::{DataLoadError, load_species_data, load_species_registry};
