pub mod factory;
pub mod podman;
pub mod services;
