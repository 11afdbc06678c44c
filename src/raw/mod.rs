mod arena;
mod handle;
mod node;
mod raw_bplustree;
mod validate;

pub(crate) use handle::Handle;
pub(crate) use node::Capacity;
pub(crate) use raw_bplustree::RawBPlusTree;
