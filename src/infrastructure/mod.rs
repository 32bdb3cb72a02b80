//! Infrastructure layer - Storage backends, sampling and services

pub mod experiment;
pub mod logging;
pub mod services;
pub mod storage;
