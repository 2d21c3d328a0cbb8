//! Family tree explorer: graph building, deterministic layouts, the viewport
//! controller, search and the canvas component tying them together.

mod component;
pub mod graph;
mod handle;
pub mod layout;
pub mod normalize;
mod render;
pub mod roster;
pub mod scale;
pub mod search;
mod state;
pub mod types;
pub mod viewport;

pub use component::FamilyTreeCanvas;
pub use handle::TreeHandle;
pub use layout::{LayoutConfig, LayoutMode};
pub use roster::Roster;
pub use search::{SearchCriteria, SearchIndex, SearchMatch, SearchOutcome};
pub use types::{FamilyData, Individual};
pub use viewport::ViewportConfig;
