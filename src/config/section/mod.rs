//! Configuration section definitions.
//!
//! Each module corresponds to a section in `includer.toml`:
//!
//! | Module     | TOML Section   | Purpose                                 |
//! |------------|----------------|-----------------------------------------|
//! | `build`    | `[build]`      | Output dir, fragment dirs, fetch mode   |
//! | `include`  | `[include]`    | Marker names, timeout, base detection   |
//! | `site`     | `[site]`       | Site URL and root directory             |

pub mod build;
mod include;
pub mod site;

pub use build::BuildSectionConfig;
pub use include::IncludeConfig;
pub use site::SiteSectionConfig;
