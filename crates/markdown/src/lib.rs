//! Markdown rendering for article bodies.
//!
//! Wraps `pulldown-cmark` with three event-stream passes of our own:
//! heading `id` anchors, image rewriting through an [`ImageResolver`], and a
//! final pass that copies the code-fence language class onto the `<pre>`
//! element so the client-side highlighter can find it.

mod escape;
pub mod images;
mod render;

pub use images::{ImageResolver, canonical_image_path, is_absolute_url, looks_like_image_id};
pub use render::{reconcile_code_classes, render_markdown};
