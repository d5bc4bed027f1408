//! Output generation: JSON snapshots and the dashboard.
//!
//! # Submodules
//!
//! - [`json`]: Reads and writes the JSON snapshots that chain the stages together
//! - [`dashboard`]: Projects final posts into the flat `dashboard.json` view
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── recent_stories.json   # every fetched story
//! ├── top_stories.json      # best story per source, hand-off to the rewrite stage
//! ├── final_posts.json      # generated posts
//! ├── dashboard.json        # reporting view
//! └── images/
//!     └── <Headline>.png
//! ```

pub mod dashboard;
pub mod json;
