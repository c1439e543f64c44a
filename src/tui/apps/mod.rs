pub mod loading;
pub mod reader;

pub use loading::LoadingApp;
pub use reader::ReaderApp;
