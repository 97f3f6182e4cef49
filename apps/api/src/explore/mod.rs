// "Liked You" discovery: who liked a user, who liked them and is still waiting
// on a reply, how many, and recording like/pass decisions.
// Reads go cache → store; writes go to the store only.

pub mod cache;
pub mod cursor;
pub mod handlers;
pub mod service;
pub mod store;

#[cfg(test)]
pub mod testing;
