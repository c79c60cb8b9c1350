//! 路由共享状态

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;

use super::health::HealthIndicator;
use crate::application::authorization::PermissionAggregator;
use crate::application::context::{ContextTracker, IdentityLoader};
use crate::application::login::AuthService;
use crate::domain::{OrgUnitDirectory, TokenIssuer};

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub token_issuer: Arc<dyn TokenIssuer>,
    pub identity_loader: Arc<dyn IdentityLoader>,
    pub permissions: Arc<PermissionAggregator>,
    pub org_units: Arc<dyn OrgUnitDirectory>,
    /// 活跃的请求身份上下文
    pub contexts: ContextTracker,
    pub health_indicators: Vec<Arc<dyn HealthIndicator>>,
    pub metrics: Option<PrometheusHandle>,
}
