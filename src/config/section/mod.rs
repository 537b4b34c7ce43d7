//! Configuration section definitions.
//!
//! Each module corresponds to a section in `livepack.toml`:
//!
//! | Module      | TOML Section    | Purpose                                  |
//! |-------------|-----------------|------------------------------------------|
//! | `build`     | `[build]`       | Entry points, target, injection, defines |
//! | `externals` | `[externals]`   | Specifiers bound to runtime globals      |
//! | `serve`     | `[serve]`       | Development server                       |
//! | `editor`    | `[editor]`      | Click-to-source command                  |

mod build;
mod editor;
mod externals;
mod serve;

pub use build::{BuildConfig, InjectStrategy};
pub use editor::EditorConfig;
pub use externals::{default_externals, merge_externals};
pub use serve::ServeConfig;
