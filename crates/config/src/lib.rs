//! Configuration and style documents for binilla.
//!
//! Both are ordinary binilla documents: a signature and little-endian version
//! header followed by a body laid out by a descriptor, parsed by the same
//! codec as user files and saved through the same pipeline.
//!
//! - **Config** (`CFG!`): editor settings, backup policy, window geometry,
//!   recent paths, documents to reopen and hotkey bindings. Read into an
//!   [`AppConfig`].
//! - **Style** (`STY!`): widths, paddings, colors and fonts. Read into a
//!   [`Style`]. Purely presentational; a missing or unreadable style file
//!   loads the defaults.
//!
//! Older versions are upgraded on load through [`config_format`] and
//! [`style_format`], which register one descriptor per version and the
//! upgraders between them.

pub mod error;
mod layout;
mod settings;
mod style;
mod view;

pub use error::{ConfigError, Result};
pub use layout::{
	CONFIG_SIGNATURE, CONFIG_VERSION, STYLE_SIGNATURE, STYLE_VERSION, config_descriptor, config_format, style_descriptor,
	style_format,
};
pub use settings::{AppConfig, EditorSettings, RestoreEntry, WindowGeometry, load_config, save_config};
pub use style::{Font, Padding, Rgb, Style, Widths, load_style, save_style};
