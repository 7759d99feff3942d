pub mod authors;
pub mod posts;

pub mod prelude {
    pub use super::authors::Entity as Authors;
    pub use super::posts::Entity as Posts;
}
