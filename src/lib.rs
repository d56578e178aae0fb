pub mod auth;
pub mod backend;
pub mod callups;
pub mod config;
pub mod db;
pub mod forms;
pub mod http_client;
pub mod memory;
pub mod model;
pub mod persist;
pub mod provider;
pub mod rest;
pub mod rows;
pub mod state;
pub mod stats;
pub mod storage;
