pub mod metro_api;
