//! Input parsing for pasted share text.
//!
//! Users paste whatever the source app put on the clipboard: a sentence of
//! promotional text with a short link somewhere inside it. This module pulls
//! the link out.
//!
//! # Example
//!
//! ```
//! use linkgrab_core::parser::extract_share_link;
//!
//! let link = extract_share_link("【小红书】https://xhslink.com/a/XyZ9，复制本条信息");
//! assert_eq!(link.url, "https://xhslink.com/a/XyZ9");
//! ```

mod error;
mod url;

pub use error::{MAX_INPUT_PREVIEW, ParseError};
pub use url::{ShareLink, extract_share_link};
