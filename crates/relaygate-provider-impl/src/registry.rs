use std::sync::Arc;

use relaygate_provider_core::ProviderRegistry;

use crate::providers::{CodestralProvider, CohereProvider, GeminiProvider, GroqProvider};

pub fn register_builtin_providers(registry: &mut ProviderRegistry) {
    registry.register(Arc::new(GeminiProvider::new()));
    registry.register(Arc::new(CodestralProvider::new()));
    registry.register(Arc::new(CohereProvider::new()));
    registry.register(Arc::new(GroqProvider::new()));
}
