//! Server configuration
//!
//! Settings are loaded from `xmlsense.toml` in the workspace root:
//!
//! ```toml
//! [format]
//! tabSize = 4
//! splitAttributes = true
//! preserveSpace = ["pre", "programlisting"]
//!
//! [files]
//! dtdExtensions = ["dtd", "ent", "mod"]
//! ```
//!
//! The client may replace the `[format]` section at runtime with a
//! `workspace/didChangeConfiguration` notification carrying
//! `{"xml": {"format": {...}}}`.

mod settings;


pub use settings::{ConfigError, FileSettings, Settings, CONFIG_FILE_NAME};
