pub mod remote_generator;

pub use remote_generator::RemoteImageGenerator;
