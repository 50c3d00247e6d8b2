// src/core/handler/mod.rs

pub mod command_router;
