pub mod crypto;
pub mod health;
pub mod llm;
