//! Client-side core for a fictional metro network: line/station browsing,
//! debounced station search, trip planning, incident status, and map
//! feature synthesis. Route computation and persistence live in the remote
//! service consumed through [`services::metro_api::MetroApi`].

pub mod error;
pub mod fetch;
pub mod geo;
pub mod infra;
pub mod interchange;
pub mod model;
pub mod network;
pub mod planner;
pub mod poll;
pub mod search;
pub mod services;
pub mod status;
