//! Storage abstraction layer for Bookline.
//!
//! Defines the store traits the domain services depend on and ships an
//! in-memory backend whose multi-write operations apply atomically.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{Result, StorageError};
pub use memory::MemoryStore;
pub use traits::{
    AvailabilityStore, BookingStore, DynAvailabilityStore, DynBookingStore, DynIdentityStore,
    DynMessageStore, IdentityStore, MessageStore,
};
