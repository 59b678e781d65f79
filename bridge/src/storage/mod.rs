//! Local storage: layout, device identity, settings

pub mod identity;
pub mod layout;
pub mod settings;
