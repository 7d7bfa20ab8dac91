//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module     | Commands handled                    |
//! |------------|-------------------------------------|
//! | `serve`    | `Serve`                             |
//! | `project`  | `Init`                              |
//! | `sections` | `Sections` (local store)            |
//! | `remote`   | `Remote`, `Queue`                   |
//! | `config`   | `Config`                            |

pub mod config;
pub mod project;
pub mod remote;
pub mod sections;
pub mod serve;

pub use config::cmd_config;
pub use project::cmd_init;
pub use remote::{cmd_queue, cmd_remote};
pub use sections::cmd_sections;
pub use serve::cmd_serve;
