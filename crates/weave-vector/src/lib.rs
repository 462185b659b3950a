pub mod chunk;
pub mod in_memory;
pub mod traits;

pub use chunk::{build_chunks, stable_hash_u32, Chunk, ChunkKind};
pub use in_memory::InMemoryVectorStore;
pub use traits::{collection_name, ChunkPayload, SearchHit, VectorStore};
