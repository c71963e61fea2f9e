pub mod app;
pub mod format;
pub mod models;
pub mod observe;
pub mod pager;
pub mod prefs;
pub mod repository;
pub mod screens;
pub mod store;
pub mod tmdb;
pub mod viewmodel;
