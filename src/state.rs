use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    config::Config,
    grading::ShortAnswerEvaluator,
    services::{
        notifier::Notifier, payment_provider::PaymentProvider, renderer::CertificateRenderer,
    },
    store::DynStore,
};

#[derive(Clone)]
pub struct AppState {
    pub store: DynStore,
    pub notifier: Arc<dyn Notifier>,
    pub payments: Arc<dyn PaymentProvider>,
    pub renderer: Arc<CertificateRenderer>,
    pub evaluator: Arc<dyn ShortAnswerEvaluator>,
    pub config: Config,
}

impl FromRef<AppState> for DynStore {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
