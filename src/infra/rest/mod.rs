mod client;

pub use client::RestMetroApi;
