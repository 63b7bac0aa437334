pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use crate::config::Config;
use crate::database::change_feed::ChangeFeed;
use crate::database::Stores;
use crate::services::{
    notchpay_service::NotchPayService, payment_gateway::PaymentGateway,
    payment_service::PaymentService, quiz_service::QuizService,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub quiz_service: QuizService,
    pub payment_service: PaymentService,
    pub change_feed: ChangeFeed,
}

impl AppState {
    pub fn new(config: Config, stores: Stores) -> Self {
        let gateway = Arc::new(NotchPayService::new(
            config.notchpay_base_url.clone(),
            config.notchpay_public_key.clone(),
        ));
        Self::with_gateway(config, stores, gateway)
    }

    pub fn with_gateway(config: Config, stores: Stores, gateway: Arc<dyn PaymentGateway>) -> Self {
        let quiz_service = QuizService::new(stores.quiz.clone(), stores.questions.clone());
        let payment_service = PaymentService::new(
            stores.payments.clone(),
            gateway,
            stores.feed.clone(),
            config.payment_currency.clone(),
            config.payment_callback_url.clone(),
        );

        Self {
            config,
            quiz_service,
            payment_service,
            change_feed: stores.feed,
        }
    }
}
