//! Directory implementations.

pub mod cache_file;

#[cfg(feature = "mock")]
pub mod mock;

#[cfg(feature = "aws")]
pub mod dynamodb;

/// Registers all compiled directories with the factory.
///
/// This is called automatically by [`crate::init`].
pub fn register_all() {
    cache_file::register();

    #[cfg(feature = "mock")]
    mock::register();

    #[cfg(feature = "aws")]
    dynamodb::register();
}
