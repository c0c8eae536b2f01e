pub mod context;
pub mod emitter;

pub use context::TranslationContext;
pub use emitter::Emitter;
