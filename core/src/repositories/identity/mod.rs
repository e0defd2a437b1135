pub mod directory;

pub use directory::IdentityDirectory;

#[cfg(test)]
pub mod mock;
#[cfg(test)]
pub use mock::MockIdentityDirectory;
