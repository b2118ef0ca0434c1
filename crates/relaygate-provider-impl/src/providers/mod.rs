mod codestral;
mod cohere;
mod gemini;
mod groq;

pub use codestral::CodestralProvider;
pub use cohere::CohereProvider;
pub use gemini::GeminiProvider;
pub use groq::GroqProvider;
