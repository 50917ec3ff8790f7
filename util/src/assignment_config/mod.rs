pub mod assignment_config;

pub use assignment_config::AssignmentConfig;
