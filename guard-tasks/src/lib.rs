//! # Guard Tasks
//!
//! Background work for region commands.
//!
//! ## Overview
//!
//! The guard-tasks crate handles:
//! - **Supervisor**: Spawns jobs with a concurrency limit and a timeout, lists
//!   what is running and cancels on request
//! - **Domain Resolution**: Turns `name`, unique id and `g:group` input into a
//!   [`Domain`](guard_regions::Domain) through a [`ProfileService`]
//! - **Retries**: Exponential backoff for transient profile service failures
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use guard_tasks::{DomainResolver, LocatorPolicy, MemoryProfileService, Supervisor};
//!
//! async fn add_members() -> guard_tasks::TaskResult<()> {
//!     let supervisor = Supervisor::default();
//!     let resolver = DomainResolver::new(Arc::new(MemoryProfileService::new()))
//!         .with_policy(LocatorPolicy::UuidAndName);
//!
//!     let handle = supervisor.submit("Adding members to town", None, async move {
//!         resolver.resolve(&["Alice", "g:builders"]).await
//!     });
//!     let domain = handle.join().await?;
//!     println!("{}", domain.to_user_string());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod profile;
pub mod resolver;
pub mod retry;
pub mod supervisor;

// Re-export main types for convenience
pub use error::{TaskError, TaskResult};
pub use profile::{MemoryProfileService, Profile, ProfileError, ProfileService};
pub use resolver::{DomainResolver, DomainToken, LocatorPolicy};
pub use retry::{retry, retry_if, RetryConfig};
pub use supervisor::{Supervisor, SupervisorConfig, TaskHandle, TaskInfo};
