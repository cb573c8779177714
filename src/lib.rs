pub mod app;
pub mod config;
pub mod error;
pub mod favorite;
pub mod genre;
pub mod home;
pub mod image_store;
pub mod image_url;
pub mod models;
pub mod poster;
pub mod record_store;
pub mod tmdb;
