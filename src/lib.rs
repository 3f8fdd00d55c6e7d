//! Layout and interaction engine for pangenome schematics.
//!
//! Components arrive from a [`provider::DataProvider`], the
//! [`engine::SchematicEngine`] turns them into pixel geometry and keeps the
//! hover/selection state that decides how each link is painted.

pub mod appearance;
pub mod color;
pub mod config;
pub mod engine;
pub mod error;
pub mod interaction;
pub mod layout;
pub mod model;
pub mod provider;
pub mod rows;

pub use config::{ConfigField, ConfigStore, DisplayConfig};
pub use engine::{DispatchError, Reaction, SchematicEngine};
pub use error::{Result, SchematicError};
