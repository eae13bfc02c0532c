mod cache;
mod table;

pub use cache::MemoryDistributedCache;
pub use table::MemoryContentTable;
