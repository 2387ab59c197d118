//! autopatch-inventory: where hosts and groups come from.
//!
//! The rest of the orchestrator only sees the [`InventoryProvider`] trait.
//! Two providers ship here:
//!
//! - **`AnsibleInventory`**: parses `ansible-inventory --list` output
//! - **`StaticInventory`**: in-memory hosts and groups, built fluently
//!
//! [`Topology`] partitions a provider's hosts into named clusters (groups
//! whose name carries the cluster suffix) and standalone hosts.
//!
//! # Architecture
//!
//! ```text
//! InventoryProvider
//!   ├── all_hosts / host_vars / hosts_in_group / group_names
//!   └── Topology::classify(provider, "_cluster")
//!         ├── clusters:   name → sorted members
//!         └── standalone: all − ∪ members
//! ```

pub mod ansible;
pub mod error;
pub mod memory;
pub mod provider;
pub mod summary;
pub mod topology;

pub use ansible::AnsibleInventory;
pub use error::{InventoryError, InventoryResult};
pub use memory::StaticInventory;
pub use provider::{CLUSTER_SUFFIX, InventoryProvider};
pub use summary::InventorySummary;
pub use topology::Topology;
