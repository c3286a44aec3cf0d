pub mod filesystem;

pub use filesystem::FilesystemObjectStore;
