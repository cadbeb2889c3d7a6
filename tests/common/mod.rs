#![allow(dead_code)]

pub mod app;
pub mod face;
pub mod http;
