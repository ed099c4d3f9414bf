//! Cart data model, lifecycle state machine, and the
//! checkout algorithm.
//!
//! Structure:
//! - [`cart`]: the `Cart`/`LineItem` entities and their invariants
//! - [`store`]: the persistence contract (`CartStore`) + in-memory impl
//! - [`service`]: `CartService`, the operations exposed to the API layer
//! - [`error`]: the distinct domain error kinds

pub mod cart;
pub mod error;
pub mod service;
pub mod store;

pub use cart::{Cart, CartStatus, LineItem, RemovedUnit};
pub use error::{CartError, CartResult};
pub use service::CartService;
pub use store::{CartStore, InMemoryCartStore, StoreError};
