//! Front-end core of the dataset recommender.
//!
//! Uploads datasets to the recommendation service, lets the user pick model
//! columns and an algorithm, compiles the model remotely and queries it. All
//! state transitions live here so they can be tested off the browser; the Yew
//! binary only renders [`workbench::AppState`] and forwards events.

pub mod browser;
pub mod compile;
pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod import;
pub mod manifest;
pub mod model;
pub mod recommend;
pub mod selection;
pub mod sequence;
pub mod session;
pub mod utils;
pub mod visuals;
pub mod workbench;

#[cfg(test)]
mod testing;

pub use error::{AppError, AppResult, ValidationError};
pub use gateway::{BackendGateway, DatasetFile};
pub use manifest::{ColumnManifest, ColumnRef};
pub use model::{Algorithm, ModelConfiguration, SystemType};
pub use workbench::{AppState, Notice, NoticeKind, Workbench};
