/// Database model definitions.
pub mod models;
/// Typed access to the room key layout.
pub mod room;
/// Key-value backends holding room records.
pub mod room_store;
/// Storage abstraction layer for store failures.
pub mod storage;
