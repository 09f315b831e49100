pub mod content_service;
pub mod corpus_service;
pub mod resize_service;
