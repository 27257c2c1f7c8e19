//! Jinja templates for model prompts and server-rendered pages.
//!
//! Templates live in `templates/` at the crate root and are embedded at
//! compile time. Names ending in `.html` are HTML-escaped, prompt templates
//! (`.jinja`) are not.
//!
//! ```ignore
//! use minijinja::context;
//! use crate::shared::templates::render_template;
//!
//! let html = render_template("pages/login.html", context! { error => "Invalid email or password." })?;
//! ```

pub mod engine;

pub use engine::{render_template, TemplateError};
