//! # Sharing
//!
//! Anonymous, time-bounded download links.

pub mod issuer;
pub mod token;

pub use issuer::{ResolvedShare, ShareLinkIssuer};
pub use token::{generate_share_token, SHARE_TOKEN_LEN};
