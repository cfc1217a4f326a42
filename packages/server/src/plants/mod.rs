//! Plant records, the name-keyed image cache and suggestion fill.
//!
//! The cache is the only piece with a correctness contract: for a given
//! normalized name there is at most one record, a record with an image is
//! served without touching the generator, and concurrent misses converge on
//! a single stored image.

pub mod cache;
pub mod error;
pub mod generator;
pub mod images;
pub mod locks;
pub mod openai;
pub mod prompt;
pub mod store;
pub mod suggest;

pub use cache::{ImageSource, PlantCacheService, PlantImage, normalize_name};
pub use error::PlantError;
pub use generator::{ContentGenerator, GeneratedImage, GenerationError};
pub use images::ImageStore;
pub use store::{NewPlant, PlantChanges, PlantDetails, PlantStore, StoreError};
pub use suggest::{ImagePolicy, PlantSuggestion, SuggestionService};
