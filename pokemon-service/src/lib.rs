pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod services;
pub mod startup;
