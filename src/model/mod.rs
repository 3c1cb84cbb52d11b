pub mod card;
pub mod issue;
