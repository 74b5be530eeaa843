//! CLI command implementations.
//!
//! | Module   | Commands handled |
//! |----------|------------------|
//! | `serve`  | `Serve`          |
//! | `browse` | `Browse`         |

pub mod browse;
pub mod serve;

pub use browse::cmd_browse;
pub use serve::cmd_serve;
