use crate::pipeline::WeatherPipeline;

pub struct AppState {
    pub pipeline: WeatherPipeline,
}
