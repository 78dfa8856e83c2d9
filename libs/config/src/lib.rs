//! # Groundlink Configuration
//!
//! Everything a process needs before the first byte is decoded:
//!
//! - **Dictionaries**: TOML message definitions turned into [`MessageSchema`]s
//! - **Link settings**: identity, wire version and signing key for one link
//! - **Logging**: tracing subscriber initialisation
//!
//! ## Usage
//!
//! ```rust
//! use groundlink_config::{load_registry, GroundlinkConfig};
//!
//! let config = GroundlinkConfig::from_toml_str(
//!     r#"
//! [link]
//! system_id = 255
//! component_id = 190
//! "#,
//! )?;
//! let registry = load_registry(&config.link)?;
//! assert!(registry.contains(0)); // HEARTBEAT from the bundled dictionary
//!
//! let ctx = config.link.header_context();
//! assert_eq!(ctx.system_id(), 255);
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! [`MessageSchema`]: groundlink_types::MessageSchema

pub mod dictionary;
pub mod link;
pub mod logging;
pub mod registry;

pub use dictionary::{Dictionary, FieldDefinition, MessageDefinition};
pub use link::{GroundlinkConfig, LinkSettings, LoggingSettings, WireVersion, ENV_PREFIX};
pub use logging::{init_tracing, init_tracing_with};
pub use registry::load_registry;
