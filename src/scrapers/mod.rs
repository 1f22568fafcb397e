pub mod dome_rest;

pub use dome_rest::DomeRestClient;
