mod traits;

pub use traits::ContainerRuntime;
