mod client;

pub use client::{extract_content, PageClient, PageSource};
