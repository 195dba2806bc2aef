// Application layer - Use cases and data-access traits
pub mod chart_service;
pub mod collector;
pub mod news_source;
pub mod price_repository;
pub mod streaming_service;
