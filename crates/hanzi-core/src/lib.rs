pub mod corpus;
pub mod decoder;
pub mod evaluate;
pub mod settings;
pub mod store;
pub mod text;
pub mod trainer;
pub mod unicode;
