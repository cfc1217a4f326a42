use std::sync::Arc;

use crate::config::AppConfig;
use crate::plants::{
    ContentGenerator, ImageStore, PlantCacheService, PlantStore, SuggestionService,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn PlantStore>,
    pub generator: Arc<dyn ContentGenerator>,
    pub images: ImageStore,
    pub plants: PlantCacheService,
    pub suggestions: Arc<SuggestionService>,
}

impl AppState {
    /// Wire the services around one store, generator and image store.
    pub fn new(
        config: AppConfig,
        store: Arc<dyn PlantStore>,
        generator: Arc<dyn ContentGenerator>,
        images: ImageStore,
    ) -> Self {
        let plants = PlantCacheService::new(store.clone(), generator.clone(), images.clone());
        let policy = crate::plants::ImagePolicy::from_config(&config.suggest);
        let suggestions = Arc::new(SuggestionService::new(generator.clone(), policy));
        Self {
            config: Arc::new(config),
            store,
            generator,
            images,
            plants,
            suggestions,
        }
    }
}
