//! Retrieval-augmented question answering over a local document index,
//! served over HTTP and backed by the YandexGPT foundation-models API.

pub mod api;
pub mod application;
pub mod domain;
pub mod infrastructure;

#[cfg(test)]
pub(crate) mod testing;
