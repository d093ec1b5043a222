pub mod category;
pub mod cluster_id;
pub mod features;
pub mod label_context;
