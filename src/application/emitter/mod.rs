pub mod create_api_key;
pub mod create_emitter;
pub mod create_series;
pub mod deactivate_series;
pub mod get_dashboard;
pub mod list_series;

pub use create_api_key::{CreateApiKeyCommand, CreateApiKeyResponse, CreateApiKeyUseCase};
pub use create_emitter::{CreateEmitterCommand, CreateEmitterResponse, CreateEmitterUseCase};
pub use create_series::{CreateSeriesCommand, CreateSeriesUseCase, SeriesDto};
pub use deactivate_series::{
  DeactivateSeriesCommand, DeactivateSeriesResponse, DeactivateSeriesUseCase,
};
pub use get_dashboard::{
  DashboardResponse, DashboardTotals, GetDashboardCommand, GetDashboardUseCase,
};
pub use list_series::{ListSeriesCommand, ListSeriesResponse, ListSeriesUseCase, PageInfo};
