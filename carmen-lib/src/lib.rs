pub mod checksum;
pub mod command;
pub mod constants;
pub mod device;
pub mod error;
pub mod frame;
pub mod measurement;
pub mod transport;
pub mod typeplate;

// Re-export the Carmen struct for easy access
pub use device::Carmen;
pub use error::CarmenError;
pub use measurement::Measurement;
pub use typeplate::Typeplate;
