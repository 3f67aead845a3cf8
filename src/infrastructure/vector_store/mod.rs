mod local;

pub use local::LocalVectorStore;
