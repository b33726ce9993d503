//! Helpers for translating configured entries and stylesheet references into manifest URLs.
//!
//! Filtering external references, translating filesystem paths to public URLs, lexical path
//! normalisation and wildcard expansion live in separate submodules so each can be tested on
//! its own. Both the path resolver and the stylesheet scanner build on them.

mod filters;
mod normalize;
mod public_url;
mod wildcard;

pub use filters::{has_network_location, is_external_asset, is_inline_data};
pub use normalize::{absolute_path, normalize_path};
pub use public_url::{append_query, collapse_slashes, from_public_url, split_query, to_public_url};
pub use wildcard::{expand_pattern, has_wildcards};
