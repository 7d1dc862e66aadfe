pub mod capture;
pub mod controller;
pub mod credential;
pub mod error;
pub mod fingerprint;
pub mod frame;
pub mod preprocess;
pub mod scanner;
pub mod session;
