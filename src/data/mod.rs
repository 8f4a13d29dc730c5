//! Input data: review rows, the offering catalog, and their loaders.

pub mod json;
pub mod loader;
pub mod offerings;
pub mod reviews;

pub use loader::Dataset;
pub use offerings::{Offering, OfferingCatalog};
pub use reviews::{CourseKey, Dimension, Review, ReviewSelector, ReviewStore, TermFilter};
