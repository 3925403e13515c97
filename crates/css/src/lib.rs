pub mod color;
pub mod inject;
pub mod syntax;
pub mod values;

// Re-exports so other crates can just use `css::...` nicely.
pub use color::{Rgb, relative_luminance};
pub use inject::{StyleHandle, inject_css, remove_css};
pub use syntax::{Declaration, custom_property, parse_declarations};
pub use values::parse_color;
