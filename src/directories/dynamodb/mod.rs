//! DynamoDB account directory.
//!
//! Accounts live in a table whose items carry `id` (number), `name`
//! (string), `role` (string, list or string set) and `region` (list, string
//! set or string). Lookups scan the table with a projection over those four
//! attributes and a filter on `name`.
//!
//! # Requirements
//!
//! - The context's source profile must be able to `dynamodb:Scan` the table
//!
//! # Example
//!
//! ```no_run
//! use letme::directory::{DirectoryConfig, DirectoryType};
//! use letme::factory;
//!
//! #[tokio::main]
//! async fn main() -> letme::Result<()> {
//!     let config = DirectoryConfig::new(DirectoryType::DynamoDb)
//!         .with_table("letme-accounts")
//!         .with_source_profile("default")
//!         .with_source_region("eu-west-1");
//!
//!     let mut directory = factory::new_directory(config)?;
//!     directory.init().await?;
//!
//!     if let Some(account) = directory.lookup("prod-readonly").await? {
//!         println!("{} assumes {:?}", account.name, account.role_chain);
//!     }
//!
//!     Ok(())
//! }
//! ```

mod directory;

pub use directory::{item_to_record, DynamoDbDirectory};

/// Registers the DynamoDB directory with the factory.
pub fn register() {
    crate::factory::register_directory("dynamodb", |cfg| Ok(Box::new(DynamoDbDirectory::new(cfg))));
}
