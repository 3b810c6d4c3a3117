//! Streak image parsing functionality

mod comment_parser;
mod header_parser;
mod pixel_parser;

// Re-export the parsing functions
pub use comment_parser::parse_comment;
pub use header_parser::parse_header;
pub use pixel_parser::parse_image_data;
