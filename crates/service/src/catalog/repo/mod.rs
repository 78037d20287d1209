pub mod seaorm;

pub use seaorm::{SeaOrmCategoryRepository, SeaOrmProductRepository};
