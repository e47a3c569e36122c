//! Packaging driver for generated protobuf code.
//!
//! Runs `buf generate` for a target language, turns the generated tree into
//! an installable package, and optionally hands it to the language's
//! packaging tool.
//!
//! - **Profiles** - Built-in `python` and `js` targets, overridable from `proton-pack.toml`
//! - **Driver** - `clean`, `build`, and `publish` for one target
//! - **Process** - Tool invocation behind a [`ToolRunner`] trait
//! - **Preflight** - Packaging tool detection before `publish`
//!
//! # Layout produced by `build` (python)
//!
//! ```text
//! python/dist/
//!     ├── __init__.py
//!     ├── pyproject.toml      (from python/scripts/pyproject.template.toml)
//!     ├── README.md           (from python/README.md)
//!     ├── LICENSE             (from LICENSE)
//!     └── raystack/
//!         ├── __init__.py
//!         └── compass/v1beta1/
//!             ├── __init__.py
//!             └── service_pb2.py
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use proton_pack::{Driver, Profile};
//!
//! let driver = Driver::new(std::env::current_dir()?, Profile::python());
//! driver.build(Some("3f2a9c1"))?;
//! ```

pub mod config;
pub mod error;
pub mod lock;
pub mod logging;
pub mod package;
pub mod preflight;
pub mod process;

pub use config::{PackConfig, Profile};
pub use error::PackError;
pub use package::{BuildReport, Driver};
pub use process::{Capture, Invocation, SystemRunner, ToolOutcome, ToolRunner};
