// Adapters layer: concrete implementations of the domain ports over HTTP.

pub mod http;
pub mod menu_page;
pub mod openai;
pub mod slack;
pub mod webhook;
